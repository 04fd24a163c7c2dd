// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/decision/score.rs - 正确性判断与准确率统计
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

use serde::Serialize;

use crate::decision::{Decision, Prediction};
use crate::input::GroundTruth;

/// 号码完全相等才算正确；无可信预测只与未知标注匹配
pub fn is_correct(predicted: Prediction, ground_truth: GroundTruth) -> bool {
  match (predicted, ground_truth) {
    (Prediction::Number(p), GroundTruth::Number(g)) => p == g,
    (Prediction::NoConfident, GroundTruth::Unknown) => true,
    _ => false,
  }
}

/// 已处理视频的正确数与总数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Scoreboard {
  correct: usize,
  total: usize,
}

impl Scoreboard {
  pub fn record(&mut self, decision: &Decision) {
    self.total += 1;
    if decision.is_correct {
      self.correct += 1;
    }
  }

  pub fn correct(&self) -> usize {
    self.correct
  }

  pub fn total(&self) -> usize {
    self.total
  }

  /// 没有处理任何视频时返回 `None`
  pub fn accuracy(&self) -> Option<f64> {
    (self.total > 0).then(|| self.correct as f64 / self.total as f64)
  }
}

impl fmt::Display for Scoreboard {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.accuracy() {
      // `{:?}` 保证整数比率也带小数点，如 `4/4 = 1.0`
      Some(accuracy) => write!(f, "{}/{} = {:?}", self.correct, self.total, accuracy),
      None => write!(f, "0/0 = n/a"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::decision::Outcome;

  fn decision(predicted: Prediction, ground_truth: GroundTruth) -> Decision {
    Decision {
      video_id: "0".to_string(),
      predicted,
      ground_truth,
      is_correct: is_correct(predicted, ground_truth),
      outcome: Outcome::Voted,
      candidates: 0,
      confident_numbers: Vec::new(),
    }
  }

  #[test]
  fn test_exact_number_match() {
    assert!(is_correct(Prediction::Number(10), GroundTruth::Number(10)));
    assert!(!is_correct(Prediction::Number(10), GroundTruth::Number(1)));
    assert!(!is_correct(Prediction::Number(10), GroundTruth::Unknown));
  }

  #[test]
  fn test_sentinel_matches_only_unknown() {
    assert!(is_correct(Prediction::NoConfident, GroundTruth::Unknown));
    assert!(!is_correct(Prediction::NoConfident, GroundTruth::Number(0)));
  }

  #[test]
  fn test_accuracy_is_exact_ratio() {
    let mut board = Scoreboard::default();
    assert_eq!(board.accuracy(), None);
    assert_eq!(board.to_string(), "0/0 = n/a");

    board.record(&decision(Prediction::Number(4), GroundTruth::Number(4)));
    board.record(&decision(Prediction::Number(5), GroundTruth::Number(4)));
    board.record(&decision(Prediction::NoConfident, GroundTruth::Unknown));

    assert_eq!((board.correct(), board.total()), (2, 3));
    assert_eq!(board.accuracy(), Some(2.0 / 3.0));
    assert_eq!(board.to_string(), "2/3 = 0.6666666666666666");
  }

  #[test]
  fn test_whole_ratios_keep_decimal_point() {
    let mut board = Scoreboard::default();
    for _ in 0..4 {
      board.record(&decision(Prediction::Number(4), GroundTruth::Number(4)));
    }
    assert_eq!(board.to_string(), "4/4 = 1.0");

    let mut missed = Scoreboard::default();
    missed.record(&decision(Prediction::Number(5), GroundTruth::Number(4)));
    assert_eq!(missed.to_string(), "0/1 = 0.0");
  }
}
