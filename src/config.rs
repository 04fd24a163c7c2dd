// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/config.rs - 决策运行配置
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

pub const DEFAULT_DET_THRESHOLD: f32 = 0.6;
pub const DEFAULT_REC_THRESHOLD: f32 = 0.9;
pub const DEFAULT_MIN_RESOLUTION: u32 = 50;
pub const DEFAULT_SEED: u64 = 123;

/// 决策引擎的运行配置，构造后不可变
///
/// 阈值比较均为严格大于：置信度恰好等于阈值的检测会被丢弃。
#[derive(Debug, Clone, Serialize)]
pub struct DecisionConfig {
  det_threshold: f32,
  rec_threshold: f32,
  min_resolution: u32,
  max_frames: Option<usize>,
  save_vis: bool,
  seed: u64,
}

impl Default for DecisionConfig {
  fn default() -> Self {
    Self {
      det_threshold: DEFAULT_DET_THRESHOLD,
      rec_threshold: DEFAULT_REC_THRESHOLD,
      min_resolution: DEFAULT_MIN_RESOLUTION,
      max_frames: None,
      save_vis: false,
      seed: DEFAULT_SEED,
    }
  }
}

impl DecisionConfig {
  pub fn with_thresholds(mut self, det_threshold: f32, rec_threshold: f32) -> Self {
    self.det_threshold = det_threshold;
    self.rec_threshold = rec_threshold;
    self
  }

  pub fn with_min_resolution(mut self, min_resolution: u32) -> Self {
    self.min_resolution = min_resolution;
    self
  }

  /// 每个视频最多送入 OCR 的帧数，`None` 表示不限制
  pub fn with_max_frames(mut self, max_frames: Option<usize>) -> Self {
    self.max_frames = max_frames;
    self
  }

  pub fn with_save_vis(mut self, save_vis: bool) -> Self {
    self.save_vis = save_vis;
    self
  }

  pub fn with_seed(mut self, seed: u64) -> Self {
    self.seed = seed;
    self
  }

  pub fn det_threshold(&self) -> f32 {
    self.det_threshold
  }

  pub fn rec_threshold(&self) -> f32 {
    self.rec_threshold
  }

  pub fn min_resolution(&self) -> u32 {
    self.min_resolution
  }

  pub fn max_frames(&self) -> Option<usize> {
    self.max_frames
  }

  pub fn save_vis(&self) -> bool {
    self.save_vis
  }

  pub fn seed(&self) -> u64 {
    self.seed
  }
}
