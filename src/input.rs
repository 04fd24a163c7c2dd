// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/input.rs - 视频记录输入
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

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::{FromUrl, FromUrlWithScheme};

mod frame_dir;
mod soccernet;

pub use self::frame_dir::FrameDirectoryInput;
pub use self::soccernet::{SoccerNetInput, SoccerNetIter};

const FRAME_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

#[derive(Error, Debug)]
pub enum InputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误 {0}: {1}")]
  IoError(PathBuf, std::io::Error),
  #[error("标注文件解析错误 {0}: {1}")]
  AnnotationError(PathBuf, serde_json::Error),
  #[error("视频 {video_id} 的标注值无效: {value}")]
  MalformedGroundTruth { video_id: String, value: String },
  #[error("视频 {0} 缺少标注")]
  MissingGroundTruth(String),
}

/// 视频的真实球衣号码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundTruth {
  Number(u32),
  /// 无可见号码，数据集中记为 -1
  Unknown,
}

impl GroundTruth {
  /// 解析标注值：非负整数、`-1` 或 `"unknown"`，其他值均视为错误
  pub fn from_json(video_id: &str, value: &serde_json::Value) -> Result<Self, InputError> {
    let malformed = || InputError::MalformedGroundTruth {
      video_id: video_id.to_string(),
      value: value.to_string(),
    };
    match value {
      serde_json::Value::Number(n) => match n.as_i64() {
        Some(-1) => Ok(GroundTruth::Unknown),
        Some(v) => u32::try_from(v).map(GroundTruth::Number).map_err(|_| malformed()),
        None => Err(malformed()),
      },
      serde_json::Value::String(s) if s.eq_ignore_ascii_case("unknown") => Ok(GroundTruth::Unknown),
      _ => Err(malformed()),
    }
  }

  pub fn parse_label(video_id: &str, label: &str) -> Result<Self, InputError> {
    let value = label
      .parse::<i64>()
      .map(serde_json::Value::from)
      .unwrap_or_else(|_| serde_json::Value::from(label));
    Self::from_json(video_id, &value)
  }

  pub fn as_i64(&self) -> i64 {
    match self {
      GroundTruth::Number(n) => *n as i64,
      GroundTruth::Unknown => -1,
    }
  }
}

impl fmt::Display for GroundTruth {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_i64())
  }
}

impl Serialize for GroundTruth {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(self.as_i64())
  }
}

/// 一段视频（球员轨迹）的输入单元
#[derive(Debug, Clone)]
pub struct VideoRecord {
  pub video_id: String,
  pub frames: Vec<PathBuf>,
  pub ground_truth: GroundTruth,
}

/// 列出目录中的帧文件，按文件名末尾的帧号排序
pub(crate) fn list_frames(directory: &Path) -> Result<Vec<PathBuf>, InputError> {
  let entries =
    std::fs::read_dir(directory).map_err(|e| InputError::IoError(directory.to_path_buf(), e))?;

  let mut frames = Vec::new();
  for entry in entries {
    let path = entry
      .map_err(|e| InputError::IoError(directory.to_path_buf(), e))?
      .path();
    let is_frame = path
      .extension()
      .and_then(|ext| ext.to_str())
      .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
      .unwrap_or(false);
    if is_frame && path.is_file() {
      frames.push(path);
    }
  }

  frames.sort_by_cached_key(|path| frame_sort_key(path));
  Ok(frames)
}

// 文件名形如 `<轨迹号>_<帧号>.jpg`，没有帧号的排在最后
fn frame_sort_key(path: &Path) -> (u64, String) {
  let stem = path
    .file_stem()
    .and_then(|s| s.to_str())
    .unwrap_or_default()
    .to_string();
  let number = stem
    .rsplit(['_', '-'])
    .next()
    .and_then(|tail| tail.parse::<u64>().ok())
    .unwrap_or(u64::MAX);
  (number, stem)
}

#[derive(Debug)]
pub enum InputWrapper {
  SoccerNet(SoccerNetInput),
  FrameDirectory(FrameDirectoryInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      SoccerNetInput::SCHEME => Ok(InputWrapper::SoccerNet(SoccerNetInput::from_url(url)?)),
      FrameDirectoryInput::SCHEME => Ok(InputWrapper::FrameDirectory(
        FrameDirectoryInput::from_url(url)?,
      )),
      other => Err(InputError::SchemeMismatch(other.to_string())),
    }
  }
}

impl InputWrapper {
  pub fn len(&self) -> usize {
    match self {
      InputWrapper::SoccerNet(input) => input.len(),
      InputWrapper::FrameDirectory(_) => 1,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl IntoIterator for InputWrapper {
  type Item = Result<VideoRecord, InputError>;
  type IntoIter = InputWrapperIter;

  fn into_iter(self) -> Self::IntoIter {
    match self {
      InputWrapper::SoccerNet(input) => InputWrapperIter::SoccerNet(input.into_iter()),
      InputWrapper::FrameDirectory(input) => InputWrapperIter::FrameDirectory(input.into_iter()),
    }
  }
}

pub enum InputWrapperIter {
  SoccerNet(SoccerNetIter),
  FrameDirectory(std::option::IntoIter<Result<VideoRecord, InputError>>),
}

impl Iterator for InputWrapperIter {
  type Item = Result<VideoRecord, InputError>;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      InputWrapperIter::SoccerNet(iter) => iter.next(),
      InputWrapperIter::FrameDirectory(iter) => iter.next(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use tempfile::TempDir;

  #[test]
  fn test_ground_truth_values() {
    assert_eq!(GroundTruth::from_json("0", &json!(10)).unwrap(), GroundTruth::Number(10));
    assert_eq!(GroundTruth::from_json("0", &json!(0)).unwrap(), GroundTruth::Number(0));
    assert_eq!(GroundTruth::from_json("0", &json!(-1)).unwrap(), GroundTruth::Unknown);
    assert_eq!(GroundTruth::from_json("0", &json!("unknown")).unwrap(), GroundTruth::Unknown);
  }

  #[test]
  fn test_ground_truth_malformed() {
    for value in [json!(-2), json!(3.5), json!("ten"), json!(null), json!([1])] {
      let result = GroundTruth::from_json("7", &value);
      assert!(
        matches!(result, Err(InputError::MalformedGroundTruth { ref video_id, .. }) if video_id == "7"),
        "{value} 应被拒绝"
      );
    }
  }

  #[test]
  fn test_parse_label() {
    assert_eq!(GroundTruth::parse_label("x", "23").unwrap(), GroundTruth::Number(23));
    assert_eq!(GroundTruth::parse_label("x", "-1").unwrap(), GroundTruth::Unknown);
    assert_eq!(GroundTruth::parse_label("x", "unknown").unwrap(), GroundTruth::Unknown);
    assert!(GroundTruth::parse_label("x", "12a").is_err());
  }

  #[test]
  fn test_list_frames_orders_by_frame_number() {
    let dir = TempDir::new().unwrap();
    for name in ["3_10.jpg", "3_2.jpg", "3_1.JPG", "notes.txt", "3_100.png"] {
      std::fs::write(dir.path().join(name), b"").unwrap();
    }
    std::fs::create_dir(dir.path().join("nested.jpg")).unwrap();

    let frames = list_frames(dir.path()).unwrap();
    let names: Vec<_> = frames
      .iter()
      .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
      .collect();
    assert_eq!(names, ["3_1.JPG", "3_2.jpg", "3_10.jpg", "3_100.png"]);
  }

  #[test]
  fn test_input_wrapper_scheme_mismatch() {
    let url = url::Url::parse("rtsp://camera/stream").unwrap();
    assert!(matches!(
      InputWrapper::from_url(&url),
      Err(InputError::SchemeMismatch(ref s)) if s == "rtsp"
    ));
  }
}
