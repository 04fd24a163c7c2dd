// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/lib.rs - 库主文件
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

pub mod config;
pub mod decision;
pub mod frame;
pub mod input;
pub mod ocr;
pub mod output;
pub mod task;
pub mod utils;

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}

/// 把 URL 的路径部分解码为文件系统路径
///
/// `Url::path` 保留百分号编码，含空格或非 ASCII 字符的目录需要先解码。
pub fn url_path(url: &url::Url) -> std::path::PathBuf {
  match urlencoding::decode(url.path()) {
    Ok(path) => std::path::PathBuf::from(path.into_owned()),
    Err(e) => {
      tracing::warn!("URL 路径 {} 解码失败，按原样使用: {}", url.path(), e);
      std::path::PathBuf::from(url.path())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::Path;
  use url::Url;

  #[test]
  fn test_url_path_is_decoded() {
    let url = Url::parse("soccernet:///data/my%20data/足球?split=test").unwrap();
    assert_eq!(url_path(&url), Path::new("/data/my data/足球"));
  }

  #[test]
  fn test_plain_url_path_is_unchanged() {
    let url = Url::parse("mmocr-pred:///data/preds").unwrap();
    assert_eq!(url_path(&url), Path::new("/data/preds"));
  }
}
