// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/ocr.rs - OCR 推理服务接口
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

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme};

mod command;
mod prediction_dir;

pub use self::command::CommandOcr;
pub use self::prediction_dir::PredictionDirOcr;

/// 两阶段（检测 + 识别）OCR 推理服务
///
/// 对每个非退化视频只调用一次，返回值与输入帧一一对应且顺序一致。
pub trait OcrService {
  type Error;

  fn predict(
    &self,
    frames: &[PathBuf],
    options: &PredictOptions,
  ) -> Result<Vec<FramePrediction>, Self::Error>;
}

impl<T: OcrService + ?Sized> OcrService for &T {
  type Error = T::Error;

  fn predict(
    &self,
    frames: &[PathBuf],
    options: &PredictOptions,
  ) -> Result<Vec<FramePrediction>, Self::Error> {
    (**self).predict(frames, options)
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PredictOptions {
  pub seed: u64,
}

#[derive(Error, Debug)]
pub enum OcrError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误 {0}: {1}")]
  IoError(PathBuf, std::io::Error),
  #[error("推理结果解析错误 {0}: {1}")]
  ParseError(String, serde_json::Error),
  #[error("推理程序 {program} 退出异常 ({status}): {stderr}")]
  CommandFailed {
    program: String,
    status: std::process::ExitStatus,
    stderr: String,
  },
  #[error("推理结果数量不匹配: 输入 {expected} 帧, 返回 {actual} 个结果")]
  CountMismatch { expected: usize, actual: usize },
}

/// 单个文本检测结果
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
  pub det_score: f32,
  pub rec_score: f32,
  pub text: String,
  /// 检测多边形，像素坐标 `[x1, y1, x2, y2, ...]`，可能为空
  pub polygon: Vec<f32>,
}

impl Detection {
  pub fn new(det_score: f32, rec_score: f32, text: impl Into<String>) -> Self {
    Self {
      det_score,
      rec_score,
      text: text.into(),
      polygon: Vec::new(),
    }
  }

  pub fn with_polygon(mut self, polygon: Vec<f32>) -> Self {
    self.polygon = polygon;
    self
  }
}

/// 单帧的推理结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FramePrediction {
  pub detections: Vec<Detection>,
}

impl FramePrediction {
  pub fn new(detections: Vec<Detection>) -> Self {
    Self { detections }
  }

  pub fn is_empty(&self) -> bool {
    self.detections.is_empty()
  }
}

/// MMOCR 推理器的单帧输出，各字段为平行列表
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFramePrediction {
  #[serde(default)]
  pub det_scores: Vec<f32>,
  #[serde(default)]
  pub rec_scores: Vec<f32>,
  #[serde(default)]
  pub rec_texts: Vec<String>,
  #[serde(default)]
  pub det_polygons: Vec<Vec<f32>>,
}

impl RawFramePrediction {
  /// 按位置合并平行列表，长度不一致时截断到最短的一个
  pub fn into_prediction(self) -> FramePrediction {
    let Self {
      det_scores,
      rec_scores,
      rec_texts,
      det_polygons,
    } = self;

    let len = det_scores.len().min(rec_scores.len()).min(rec_texts.len());
    if det_scores.len() != len || rec_scores.len() != len || rec_texts.len() != len {
      warn!(
        "推理结果列表长度不一致: det {}, rec {}, text {}，截断为 {}",
        det_scores.len(),
        rec_scores.len(),
        rec_texts.len(),
        len
      );
    }

    let mut polygons = det_polygons.into_iter();
    let detections = det_scores
      .into_iter()
      .zip(rec_scores)
      .zip(rec_texts)
      .map(|((det_score, rec_score), text)| {
        Detection::new(det_score, rec_score, text).with_polygon(polygons.next().unwrap_or_default())
      })
      .collect();

    FramePrediction::new(detections)
  }
}

pub enum OcrWrapper {
  PredictionDir(PredictionDirOcr),
  Command(CommandOcr),
}

impl FromUrl for OcrWrapper {
  type Error = OcrError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      PredictionDirOcr::SCHEME => Ok(OcrWrapper::PredictionDir(PredictionDirOcr::from_url(url)?)),
      CommandOcr::SCHEME => Ok(OcrWrapper::Command(CommandOcr::from_url(url)?)),
      other => Err(OcrError::SchemeMismatch(other.to_string())),
    }
  }
}

impl OcrService for OcrWrapper {
  type Error = OcrError;

  fn predict(
    &self,
    frames: &[PathBuf],
    options: &PredictOptions,
  ) -> Result<Vec<FramePrediction>, Self::Error> {
    match self {
      OcrWrapper::PredictionDir(ocr) => ocr.predict(frames, options),
      OcrWrapper::Command(ocr) => ocr.predict(frames, options),
    }
  }
}
