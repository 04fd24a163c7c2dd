// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/ocr/command.rs - 调用外部推理程序
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
use std::process::Command;

use serde::Deserialize;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  ocr::{FramePrediction, OcrError, OcrService, PredictOptions, RawFramePrediction},
};

#[derive(Debug, Deserialize)]
struct CommandOutput {
  predictions: Vec<RawFramePrediction>,
}

/// 每个视频启动一次外部推理程序
///
/// 调用形式为 `<program> [args...] --seed <seed> <frame>...`，程序需在标准输出
/// 打印 `{"predictions": [...]}`，每帧一项，字段与 MMOCR 推理器输出相同。
#[derive(Debug)]
pub struct CommandOcr {
  program: PathBuf,
  args: Vec<String>,
}

impl FromUrlWithScheme for CommandOcr {
  const SCHEME: &'static str = "exec";
}

impl FromUrl for CommandOcr {
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

    let args: Vec<String> = url
      .query_pairs()
      .filter(|(k, _)| k == "arg")
      .map(|(_, v)| v.into_owned())
      .collect();

    Ok(Self::new(crate::url_path(url)).with_args(args))
  }
}

impl CommandOcr {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
    }
  }

  pub fn with_args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args = args.into_iter().map(Into::into).collect();
    self
  }
}

impl OcrService for CommandOcr {
  type Error = OcrError;

  fn predict(
    &self,
    frames: &[PathBuf],
    options: &PredictOptions,
  ) -> Result<Vec<FramePrediction>, Self::Error> {
    let program = self.program.display().to_string();
    info!("调用推理程序 {}，共 {} 帧", program, frames.len());

    let now = std::time::Instant::now();
    let output = Command::new(&self.program)
      .args(&self.args)
      .arg("--seed")
      .arg(options.seed.to_string())
      .args(frames)
      .output()
      .map_err(|e| OcrError::IoError(self.program.clone(), e))?;
    debug!("推理程序完成，耗时: {:.2?}", now.elapsed());

    if !output.status.success() {
      return Err(OcrError::CommandFailed {
        program,
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }

    let parsed: CommandOutput =
      serde_json::from_slice(&output.stdout).map_err(|e| OcrError::ParseError(program, e))?;
    if parsed.predictions.len() != frames.len() {
      return Err(OcrError::CountMismatch {
        expected: frames.len(),
        actual: parsed.predictions.len(),
      });
    }

    Ok(
      parsed
        .predictions
        .into_iter()
        .map(RawFramePrediction::into_prediction)
        .collect(),
    )
  }
}

#[cfg(all(test, unix))]
mod tests {
  use super::*;

  fn frames(n: usize) -> Vec<PathBuf> {
    (1..=n).map(|i| PathBuf::from(format!("5_{i}.jpg"))).collect()
  }

  // `sh -c` 把 `--seed` 作为 $0，种子作为 $1，帧路径从 $2 开始
  const ONE_PER_FRAME: &str = r#"n=$(($# - 1)); printf '{"predictions": ['; i=0; while [ $i -lt $n ]; do if [ $i -gt 0 ]; then printf ','; fi; printf '{"det_scores":[0.9],"rec_scores":[0.95],"rec_texts":["8"]}'; i=$((i+1)); done; printf ']}'"#;

  #[test]
  fn test_one_prediction_per_frame() {
    let ocr = CommandOcr::new("/bin/sh").with_args(["-c", ONE_PER_FRAME]);
    let predictions = ocr.predict(&frames(3), &PredictOptions { seed: 1 }).unwrap();
    assert_eq!(predictions.len(), 3);
    assert!(predictions.iter().all(|p| p.detections[0].text == "8"));
  }

  #[test]
  fn test_seed_is_forwarded() {
    let script = r#"printf '{"predictions":[{"det_scores":[0.9],"rec_scores":[0.9],"rec_texts":["%s"]}]}' "$1""#;
    let ocr = CommandOcr::new("/bin/sh").with_args(["-c", script]);
    let predictions = ocr.predict(&frames(1), &PredictOptions { seed: 42 }).unwrap();
    assert_eq!(predictions[0].detections[0].text, "42");
  }

  #[test]
  fn test_failed_command() {
    let ocr = CommandOcr::new("/bin/sh").with_args(["-c", "echo boom >&2; exit 3"]);
    let result = ocr.predict(&frames(1), &PredictOptions::default());
    assert!(matches!(result, Err(OcrError::CommandFailed { ref stderr, .. }) if stderr == "boom"));
  }

  #[test]
  fn test_count_mismatch() {
    let ocr = CommandOcr::new("/bin/sh").with_args(["-c", r#"printf '{"predictions": []}'"#]);
    let result = ocr.predict(&frames(2), &PredictOptions::default());
    assert!(matches!(
      result,
      Err(OcrError::CountMismatch {
        expected: 2,
        actual: 0
      })
    ));
  }

  #[test]
  fn test_missing_program() {
    let ocr = CommandOcr::new("/nonexistent/haoma-infer");
    let result = ocr.predict(&frames(1), &PredictOptions::default());
    assert!(matches!(result, Err(OcrError::IoError(_, _))));
  }

  #[test]
  fn test_from_url_collects_args() {
    let url = Url::parse("exec:///usr/bin/python3?arg=infer.py&arg=--det&arg=dbnetpp").unwrap();
    let ocr = CommandOcr::from_url(&url).unwrap();
    assert_eq!(ocr.program, PathBuf::from("/usr/bin/python3"));
    assert_eq!(ocr.args, ["infer.py", "--det", "dbnetpp"]);
  }

  #[test]
  fn test_from_url_decodes_program_path() {
    let url = Url::parse("exec:///opt/ocr%20tools/run?arg=--gpu").unwrap();
    let ocr = CommandOcr::from_url(&url).unwrap();
    assert_eq!(ocr.program, PathBuf::from("/opt/ocr tools/run"));
  }
}
