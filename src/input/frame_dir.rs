// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/input/frame_dir.rs - 单个帧目录输入
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

use std::path::PathBuf;

use tracing::error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{GroundTruth, InputError, VideoRecord, list_frames},
};

/// 把一个目录中的全部帧当作一段视频
///
/// `frames:///path/to/dir?label=10`，未给出 `label` 时标注为未知。
#[derive(Debug)]
pub struct FrameDirectoryInput {
  directory: PathBuf,
  ground_truth: GroundTruth,
}

impl FromUrlWithScheme for FrameDirectoryInput {
  const SCHEME: &'static str = "frames";
}

impl FromUrl for FrameDirectoryInput {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(InputError::SchemeMismatch(url.scheme().to_string()));
    }

    let directory = crate::url_path(url);
    let ground_truth = match url.query_pairs().find(|(k, _)| k == "label") {
      Some((_, label)) => GroundTruth::parse_label(&video_id_of(&directory), &label)?,
      None => GroundTruth::Unknown,
    };

    Ok(Self {
      directory,
      ground_truth,
    })
  }
}

fn video_id_of(directory: &std::path::Path) -> String {
  directory
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_else(|| "0".to_string())
}

impl IntoIterator for FrameDirectoryInput {
  type Item = Result<VideoRecord, InputError>;
  type IntoIter = std::option::IntoIter<Self::Item>;

  fn into_iter(self) -> Self::IntoIter {
    let record = list_frames(&self.directory).map(|frames| VideoRecord {
      video_id: video_id_of(&self.directory),
      frames,
      ground_truth: self.ground_truth,
    });
    Some(record).into_iter()
  }
}
