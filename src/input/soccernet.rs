// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/input/soccernet.rs - SoccerNet 球衣号码数据集读取
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

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  input::{GroundTruth, InputError, VideoRecord, list_frames},
};

const DEFAULT_SPLIT: &str = "test";

/// SoccerNet 数据集的一个划分
///
/// 目录结构：
/// - `<root>/<split>/images/<video_id>/*.jpg`
/// - `<root>/<split>/<split>_gt.json`，内容为 `{"<video_id>": <号码或 -1>}`
#[derive(Debug)]
pub struct SoccerNetInput {
  images: PathBuf,
  videos: Vec<(String, GroundTruth)>,
}

impl FromUrlWithScheme for SoccerNetInput {
  const SCHEME: &'static str = "soccernet";
}

impl FromUrl for SoccerNetInput {
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

    let split = url
      .query_pairs()
      .find(|(k, _)| k == "split")
      .map(|(_, v)| v.into_owned())
      .unwrap_or_else(|| DEFAULT_SPLIT.to_string());

    Self::open(&crate::url_path(url), &split)
  }
}

impl SoccerNetInput {
  pub fn open(root: &Path, split: &str) -> Result<Self, InputError> {
    let split_dir = root.join(split);
    let gt_path = split_dir.join(format!("{split}_gt.json"));
    info!("读取标注文件: {}", gt_path.display());

    let content =
      std::fs::read_to_string(&gt_path).map_err(|e| InputError::IoError(gt_path.clone(), e))?;
    let raw: BTreeMap<String, serde_json::Value> =
      serde_json::from_str(&content).map_err(|e| InputError::AnnotationError(gt_path.clone(), e))?;

    let mut videos = raw
      .iter()
      .map(|(video_id, value)| {
        GroundTruth::from_json(video_id, value).map(|gt| (video_id.clone(), gt))
      })
      .collect::<Result<Vec<_>, InputError>>()?;
    videos.sort_by_cached_key(|(video_id, _)| video_sort_key(video_id));

    let images = split_dir.join("images");
    if !images.is_dir() {
      return Err(InputError::IoError(
        images,
        std::io::Error::new(std::io::ErrorKind::NotFound, "缺少 images 目录"),
      ));
    }

    // 只在 images 中出现却没有标注的视频无法计分
    let entries = std::fs::read_dir(&images).map_err(|e| InputError::IoError(images.clone(), e))?;
    for entry in entries {
      let entry = entry.map_err(|e| InputError::IoError(images.clone(), e))?;
      if !entry.path().is_dir() {
        continue;
      }
      let name = entry.file_name().to_string_lossy().into_owned();
      if !raw.contains_key(&name) {
        return Err(InputError::MissingGroundTruth(name));
      }
    }

    info!("划分 {} 共 {} 个视频", split, videos.len());
    Ok(Self { images, videos })
  }

  pub fn len(&self) -> usize {
    self.videos.len()
  }

  pub fn is_empty(&self) -> bool {
    self.videos.is_empty()
  }
}

// 视频编号按数值排序，非数字编号按字典序排在之后
fn video_sort_key(video_id: &str) -> (u64, String) {
  (video_id.parse().unwrap_or(u64::MAX), video_id.to_string())
}

impl IntoIterator for SoccerNetInput {
  type Item = Result<VideoRecord, InputError>;
  type IntoIter = SoccerNetIter;

  fn into_iter(self) -> Self::IntoIter {
    SoccerNetIter {
      images: self.images,
      videos: self.videos.into_iter(),
    }
  }
}

pub struct SoccerNetIter {
  images: PathBuf,
  videos: std::vec::IntoIter<(String, GroundTruth)>,
}

impl Iterator for SoccerNetIter {
  type Item = Result<VideoRecord, InputError>;

  fn next(&mut self) -> Option<Self::Item> {
    let (video_id, ground_truth) = self.videos.next()?;
    let directory = self.images.join(&video_id);
    let record = list_frames(&directory).map(|frames| {
      debug!("视频 {} 共 {} 帧", video_id, frames.len());
      VideoRecord {
        video_id,
        frames,
        ground_truth,
      }
    });
    Some(record)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    self.videos.size_hint()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn make_dataset(gt: &str, videos: &[(&str, &[&str])]) -> TempDir {
    let root = TempDir::new().unwrap();
    let split = root.path().join("test");
    std::fs::create_dir_all(split.join("images")).unwrap();
    std::fs::write(split.join("test_gt.json"), gt).unwrap();
    for (video_id, frames) in videos {
      let dir = split.join("images").join(video_id);
      std::fs::create_dir_all(&dir).unwrap();
      for frame in frames.iter() {
        std::fs::write(dir.join(frame), b"").unwrap();
      }
    }
    root
  }

  #[test]
  fn test_iterates_in_numeric_order() {
    let root = make_dataset(
      r#"{"10": 4, "2": -1, "1": 23}"#,
      &[
        ("1", &["1_2.jpg", "1_1.jpg"]),
        ("2", &["2_1.jpg"]),
        ("10", &["10_1.jpg", "10_3.jpg", "10_2.jpg"]),
      ],
    );

    let input = SoccerNetInput::open(root.path(), "test").unwrap();
    assert_eq!(input.len(), 3);

    let records: Vec<VideoRecord> = input.into_iter().map(|r| r.unwrap()).collect();
    let ids: Vec<_> = records.iter().map(|r| r.video_id.as_str()).collect();
    assert_eq!(ids, ["1", "2", "10"]);
    assert_eq!(records[0].ground_truth, GroundTruth::Number(23));
    assert_eq!(records[1].ground_truth, GroundTruth::Unknown);
    assert_eq!(records[2].ground_truth, GroundTruth::Number(4));

    let last: Vec<_> = records[2]
      .frames
      .iter()
      .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
      .collect();
    assert_eq!(last, ["10_1.jpg", "10_2.jpg", "10_3.jpg"]);
  }

  #[test]
  fn test_malformed_ground_truth_is_reported() {
    let root = make_dataset(r#"{"0": "seven"}"#, &[("0", &["0_1.jpg"])]);
    let result = SoccerNetInput::open(root.path(), "test");
    assert!(matches!(result, Err(InputError::MalformedGroundTruth { .. })));
  }

  #[test]
  fn test_video_without_ground_truth() {
    let root = make_dataset(r#"{"0": 5}"#, &[("0", &["0_1.jpg"]), ("1", &["1_1.jpg"])]);
    let result = SoccerNetInput::open(root.path(), "test");
    assert!(matches!(result, Err(InputError::MissingGroundTruth(ref id)) if id == "1"));
  }

  #[test]
  fn test_missing_video_directory_surfaces_on_iteration() {
    let root = make_dataset(r#"{"0": 5, "1": 6}"#, &[("0", &["0_1.jpg"])]);
    let mut iter = SoccerNetInput::open(root.path(), "test").unwrap().into_iter();
    assert!(iter.next().unwrap().is_ok());
    assert!(matches!(iter.next(), Some(Err(InputError::IoError(_, _)))));
    assert!(iter.next().is_none());
  }

  #[test]
  fn test_from_url_reads_split() {
    let root = make_dataset(r#"{"0": 5}"#, &[("0", &["0_1.jpg"])]);
    let url = Url::parse(&format!("soccernet://{}?split=test", root.path().display())).unwrap();
    let input = SoccerNetInput::from_url(&url).unwrap();
    assert_eq!(input.len(), 1);
  }

  #[test]
  fn test_from_url_with_space_in_root() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("my data");
    let images = root.join("test").join("images").join("0");
    std::fs::create_dir_all(&images).unwrap();
    std::fs::write(images.join("0_1.jpg"), b"").unwrap();
    std::fs::write(root.join("test").join("test_gt.json"), r#"{"0": 8}"#).unwrap();

    let url = Url::parse(&format!("soccernet://{}?split=test", root.display())).unwrap();
    assert!(url.path().contains("my%20data"));
    let records: Vec<VideoRecord> = SoccerNetInput::from_url(&url)
      .unwrap()
      .into_iter()
      .map(|r| r.unwrap())
      .collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].ground_truth, GroundTruth::Number(8));
    assert!(records[0].frames[0].starts_with(&root));
  }
}
