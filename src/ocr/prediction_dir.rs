// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/ocr/prediction_dir.rs - 读取预先导出的 MMOCR 推理结果
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

use std::path::{Path, PathBuf};

use tracing::{debug, error};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  ocr::{FramePrediction, OcrError, OcrService, PredictOptions, RawFramePrediction},
};

/// 从目录读取 MMOCR 推理器 `save_pred` 导出的逐帧 JSON
///
/// 对帧 `<images>/<video_id>/<stem>.jpg`，依次查找
/// `<dir>/<video_id>/<stem>.json` 与 `<dir>/<stem>.json`。
#[derive(Debug)]
pub struct PredictionDirOcr {
  directory: PathBuf,
}

impl FromUrlWithScheme for PredictionDirOcr {
  const SCHEME: &'static str = "mmocr-pred";
}

impl FromUrl for PredictionDirOcr {
  type Error = OcrError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(OcrError::SchemeMismatch(url.scheme().to_string()));
    }
    Ok(Self::new(crate::url_path(url)))
  }
}

impl PredictionDirOcr {
  pub fn new(directory: impl Into<PathBuf>) -> Self {
    Self {
      directory: directory.into(),
    }
  }

  fn prediction_path(&self, frame: &Path) -> Result<PathBuf, OcrError> {
    let not_found = || {
      OcrError::IoError(
        frame.to_path_buf(),
        std::io::Error::new(std::io::ErrorKind::NotFound, "找不到对应的推理结果"),
      )
    };
    let stem = frame.file_stem().ok_or_else(not_found)?;
    let file_name = Path::new(stem).with_extension("json");

    let nested = frame
      .parent()
      .and_then(|parent| parent.file_name())
      .map(|video_id| self.directory.join(video_id).join(&file_name));
    let flat = self.directory.join(&file_name);

    nested
      .into_iter()
      .chain(std::iter::once(flat))
      .find(|candidate| candidate.is_file())
      .ok_or_else(not_found)
  }

  fn read_prediction(&self, frame: &Path) -> Result<FramePrediction, OcrError> {
    let path = self.prediction_path(frame)?;
    debug!("读取推理结果: {}", path.display());
    let content = std::fs::read_to_string(&path).map_err(|e| OcrError::IoError(path.clone(), e))?;
    let raw: RawFramePrediction = serde_json::from_str(&content)
      .map_err(|e| OcrError::ParseError(path.display().to_string(), e))?;
    Ok(raw.into_prediction())
  }
}

impl OcrService for PredictionDirOcr {
  type Error = OcrError;

  fn predict(
    &self,
    frames: &[PathBuf],
    _options: &PredictOptions,
  ) -> Result<Vec<FramePrediction>, Self::Error> {
    frames.iter().map(|frame| self.read_prediction(frame)).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  const PRED: &str = r#"{"det_scores": [0.8], "rec_scores": [0.97], "rec_texts": ["7"], "det_polygons": [[1, 1, 9, 1, 9, 9, 1, 9]]}"#;

  #[test]
  fn test_nested_then_flat_lookup() {
    let preds = TempDir::new().unwrap();
    std::fs::create_dir(preds.path().join("12")).unwrap();
    std::fs::write(preds.path().join("12").join("12_1.json"), PRED).unwrap();
    std::fs::write(preds.path().join("12_2.json"), r#"{"det_scores": [], "rec_scores": [], "rec_texts": []}"#).unwrap();

    let ocr = PredictionDirOcr::new(preds.path());
    let frames = vec![
      PathBuf::from("/data/test/images/12/12_1.jpg"),
      PathBuf::from("/data/test/images/12/12_2.jpg"),
    ];
    let predictions = ocr.predict(&frames, &PredictOptions::default()).unwrap();

    assert_eq!(predictions.len(), 2);
    assert_eq!(predictions[0].detections[0].text, "7");
    assert!(predictions[1].is_empty());
  }

  #[test]
  fn test_missing_prediction_is_an_error() {
    let preds = TempDir::new().unwrap();
    let ocr = PredictionDirOcr::new(preds.path());
    let frames = vec![PathBuf::from("/data/test/images/3/3_1.jpg")];
    assert!(matches!(
      ocr.predict(&frames, &PredictOptions::default()),
      Err(OcrError::IoError(_, _))
    ));
  }

  #[test]
  fn test_invalid_json_is_an_error() {
    let preds = TempDir::new().unwrap();
    std::fs::write(preds.path().join("3_1.json"), "{ not json").unwrap();
    let ocr = PredictionDirOcr::new(preds.path());
    let frames = vec![PathBuf::from("3_1.jpg")];
    assert!(matches!(
      ocr.predict(&frames, &PredictOptions::default()),
      Err(OcrError::ParseError(_, _))
    ));
  }

  #[test]
  fn test_from_url_with_space_in_directory() {
    let preds = TempDir::new().unwrap();
    let dir = preds.path().join("mmocr preds");
    std::fs::create_dir(&dir).unwrap();
    std::fs::write(dir.join("5_1.json"), PRED).unwrap();

    let url = Url::parse(&format!("mmocr-pred://{}", dir.display())).unwrap();
    let ocr = PredictionDirOcr::from_url(&url).unwrap();
    let predictions = ocr
      .predict(&[PathBuf::from("5_1.jpg")], &PredictOptions::default())
      .unwrap();
    assert_eq!(predictions[0].detections[0].text, "7");
  }
}
