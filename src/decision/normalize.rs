// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/decision/normalize.rs - 推理结果展平
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

use serde::Serialize;

use crate::ocr::FramePrediction;

/// 展平后的 (检测置信度, 识别置信度, 识别文本) 三元组
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
  pub det_score: f32,
  pub rec_score: f32,
  pub text: String,
}

impl Candidate {
  pub fn new(det_score: f32, rec_score: f32, text: impl Into<String>) -> Self {
    Self {
      det_score,
      rec_score,
      text: text.into(),
    }
  }
}

/// 先按帧顺序、再按帧内检测顺序展平，不做任何过滤
pub fn flatten(predictions: &[FramePrediction]) -> Vec<Candidate> {
  predictions
    .iter()
    .flat_map(|prediction| prediction.detections.iter())
    .map(|d| Candidate::new(d.det_score, d.rec_score, d.text.clone()))
    .collect()
}

/// 帧中是否有检测置信度不低于阈值的结果，用于决定是否保存可视化
pub fn has_detection_over(prediction: &FramePrediction, det_threshold: f32) -> bool {
  prediction
    .detections
    .iter()
    .any(|d| d.det_score >= det_threshold)
}
