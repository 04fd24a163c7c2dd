// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/decision/filter.rs - 置信度过滤
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

use tracing::debug;

use crate::decision::normalize::Candidate;

/// 按两个置信度阈值和纯数字规则筛选候选号码
///
/// 两个比较都是严格大于：`det_score > det_threshold` 且
/// `rec_score > rec_threshold`。文本必须是一个或多个 ASCII 数字，
/// 不允许符号、小数点或空白。不满足条件的候选直接丢弃。
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceFilter {
  det_threshold: f32,
  rec_threshold: f32,
}

impl ConfidenceFilter {
  pub fn new(det_threshold: f32, rec_threshold: f32) -> Self {
    Self {
      det_threshold,
      rec_threshold,
    }
  }

  /// 通过筛选时返回对应的号码
  pub fn accept(&self, candidate: &Candidate) -> Option<u32> {
    // NaN 分数或阈值在这里被拒绝
    if !(candidate.det_score > self.det_threshold && candidate.rec_score > self.rec_threshold) {
      return None;
    }
    if !is_decimal(&candidate.text) {
      return None;
    }
    match candidate.text.parse::<u32>() {
      Ok(number) => Some(number),
      Err(e) => {
        debug!("号码 {} 超出范围，丢弃: {}", candidate.text, e);
        None
      }
    }
  }

  pub fn apply(&self, candidates: &[Candidate]) -> Vec<u32> {
    candidates.iter().filter_map(|c| self.accept(c)).collect()
  }
}

fn is_decimal(text: &str) -> bool {
  !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}
