// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/decision.rs - 单个视频的号码决策
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
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  config::DecisionConfig,
  frame::FrameProbe,
  input::{GroundTruth, VideoRecord},
  ocr::{OcrService, PredictOptions},
  output::{Render, VideoFrame},
};

pub mod filter;
pub mod normalize;
pub mod prefilter;
pub mod score;
pub mod vote;

use self::filter::ConfidenceFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum DecisionError {
  #[error("读取帧 {path} 失败: {source}")]
  FrameRead { path: PathBuf, source: BoxError },
  #[error("视频 {video_id} 的 OCR 推理失败: {source}")]
  OcrServiceFailure { video_id: String, source: BoxError },
  #[error("视频 {video_id} 的推理结果数量不匹配: 输入 {expected} 帧, 返回 {actual} 个结果")]
  PredictionCount {
    video_id: String,
    expected: usize,
    actual: usize,
  },
}

/// 预测的号码，或没有可信预测（记为 -1）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prediction {
  Number(u32),
  NoConfident,
}

impl Prediction {
  pub fn as_i64(&self) -> i64 {
    match self {
      Prediction::Number(n) => *n as i64,
      Prediction::NoConfident => -1,
    }
  }
}

impl From<Option<u32>> for Prediction {
  fn from(value: Option<u32>) -> Self {
    value.map_or(Prediction::NoConfident, Prediction::Number)
  }
}

impl fmt::Display for Prediction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_i64())
  }
}

impl Serialize for Prediction {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(self.as_i64())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  /// 帧尺寸过小，未调用 OCR
  Degenerate,
  /// 至少一个候选通过过滤，取众数
  Voted,
  /// 没有候选通过过滤
  NoConfidentNumber,
}

/// 单个视频的最终决策，创建后不再修改
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
  pub video_id: String,
  pub predicted: Prediction,
  pub ground_truth: GroundTruth,
  pub is_correct: bool,
  pub outcome: Outcome,
  /// 展平后的候选数量
  pub candidates: usize,
  /// 通过过滤的号码，参与投票的多重集合
  pub confident_numbers: Vec<u32>,
}

impl Decision {
  fn new(video: &VideoRecord, outcome: Outcome, candidates: usize, confident_numbers: Vec<u32>) -> Self {
    let predicted = match outcome {
      Outcome::Degenerate => Prediction::NoConfident,
      _ => Prediction::from(vote::majority(&confident_numbers)),
    };
    Self {
      video_id: video.video_id.clone(),
      predicted,
      ground_truth: video.ground_truth,
      is_correct: score::is_correct(predicted, video.ground_truth),
      outcome,
      candidates,
      confident_numbers,
    }
  }
}

/// 对单个视频给出决策
pub trait Decide {
  fn decide(&self, video: &VideoRecord) -> Result<Decision, DecisionError>;
}

impl<T: Decide + ?Sized> Decide for &T {
  fn decide(&self, video: &VideoRecord) -> Result<Decision, DecisionError> {
    (**self).decide(video)
  }
}

/// 决策引擎：预过滤 → OCR → 展平 → 置信度过滤 → 投票 → 计分
pub struct DecisionEngine<P, S, V> {
  config: DecisionConfig,
  filter: ConfidenceFilter,
  probe: P,
  ocr: S,
  render: V,
}

impl<P, S, V> DecisionEngine<P, S, V> {
  pub fn new(config: DecisionConfig, probe: P, ocr: S, render: V) -> Self {
    let filter = ConfidenceFilter::new(config.det_threshold(), config.rec_threshold());
    Self {
      config,
      filter,
      probe,
      ocr,
      render,
    }
  }

  pub fn config(&self) -> &DecisionConfig {
    &self.config
  }

  pub fn render(&self) -> &V {
    &self.render
  }

  pub fn into_render(self) -> V {
    self.render
  }
}

impl<P, S, V, PE, SE, VE> Decide for DecisionEngine<P, S, V>
where
  PE: std::error::Error + Send + Sync + 'static,
  SE: std::error::Error + Send + Sync + 'static,
  VE: std::fmt::Display,
  P: FrameProbe<Error = PE>,
  S: OcrService<Error = SE>,
  V: Render<VideoFrame, crate::ocr::FramePrediction, Error = VE>,
{
  fn decide(&self, video: &VideoRecord) -> Result<Decision, DecisionError> {
    let frames = match self.config.max_frames() {
      Some(limit) if limit < video.frames.len() => &video.frames[..limit],
      _ => &video.frames[..],
    };

    let mut shapes = Vec::with_capacity(frames.len());
    for path in frames {
      let shape = self.probe.probe(path).map_err(|e| DecisionError::FrameRead {
        path: path.clone(),
        source: Box::new(e),
      })?;
      shapes.push(shape);
    }

    if prefilter::is_degenerate(&shapes, self.config.min_resolution()) {
      info!(
        "视频 {}: 最大边长 {} 小于 {}，按足球特写处理",
        video.video_id,
        prefilter::max_side(&shapes),
        self.config.min_resolution()
      );
      return Ok(Decision::new(video, Outcome::Degenerate, 0, Vec::new()));
    }

    let options = PredictOptions {
      seed: self.config.seed(),
    };
    let now = std::time::Instant::now();
    let predictions =
      self
        .ocr
        .predict(frames, &options)
        .map_err(|e| DecisionError::OcrServiceFailure {
          video_id: video.video_id.clone(),
          source: Box::new(e),
        })?;
    debug!("视频 {} 推理完成，耗时: {:.2?}", video.video_id, now.elapsed());

    if predictions.len() != frames.len() {
      return Err(DecisionError::PredictionCount {
        video_id: video.video_id.clone(),
        expected: frames.len(),
        actual: predictions.len(),
      });
    }

    if self.config.save_vis() {
      for (path, prediction) in frames.iter().zip(&predictions) {
        if !normalize::has_detection_over(prediction, self.config.det_threshold()) {
          continue;
        }
        let frame = VideoFrame::new(&video.video_id, path);
        if let Err(e) = self.render.render_result(&frame, prediction) {
          warn!("保存可视化 {} 失败: {}", path.display(), e);
        }
      }
    }

    let candidates = normalize::flatten(&predictions);
    for candidate in &candidates {
      debug!(
        "({:.4}, {:.4}, {:?})",
        candidate.det_score, candidate.rec_score, candidate.text
      );
    }

    let confident_numbers = self.filter.apply(&candidates);
    let outcome = if confident_numbers.is_empty() {
      Outcome::NoConfidentNumber
    } else {
      Outcome::Voted
    };

    Ok(Decision::new(video, outcome, candidates.len(), confident_numbers))
  }
}
