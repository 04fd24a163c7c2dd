// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/output/result_record.rs - 决策结果记录
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

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use tracing::info;

use crate::{
  decision::{Decision, score::Scoreboard},
  output::{OutputError, Record},
};

#[derive(Serialize)]
struct DecisionLine<'a> {
  index: usize,
  #[serde(flatten)]
  decision: &'a Decision,
}

#[derive(Serialize)]
struct SummaryLine {
  correct: usize,
  total: usize,
  accuracy: Option<f64>,
  completed: bool,
}

/// 每个决策写一行 JSON，最后写一行汇总
pub struct JsonLinesRecord {
  path: PathBuf,
  writer: Mutex<BufWriter<File>>,
}

impl JsonLinesRecord {
  pub fn create(path: impl AsRef<Path>) -> Result<Self, OutputError> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent).map_err(|e| OutputError::RecordError(path.clone(), e))?;
      }
    }
    let file = File::create(&path).map_err(|e| OutputError::RecordError(path.clone(), e))?;
    info!("结果记录文件: {}", path.display());
    Ok(Self {
      path,
      writer: Mutex::new(BufWriter::new(file)),
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn write_line<T: Serialize>(&self, line: &T) -> Result<(), OutputError> {
    let json = serde_json::to_string(line)?;
    let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
    writeln!(writer, "{json}")
      .and_then(|_| writer.flush())
      .map_err(|e| OutputError::RecordError(self.path.clone(), e))
  }
}

impl Record for JsonLinesRecord {
  type Error = OutputError;

  fn record_decision(&self, index: usize, decision: &Decision) -> Result<(), Self::Error> {
    self.write_line(&DecisionLine { index, decision })
  }

  fn record_summary(&self, scoreboard: &Scoreboard, completed: bool) -> Result<(), Self::Error> {
    self.write_line(&SummaryLine {
      correct: scoreboard.correct(),
      total: scoreboard.total(),
      accuracy: scoreboard.accuracy(),
      completed,
    })
  }
}

/// 只依赖日志输出，不落盘
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRecord;

impl Record for NoRecord {
  type Error = std::convert::Infallible;

  fn record_decision(&self, _index: usize, _decision: &Decision) -> Result<(), Self::Error> {
    Ok(())
  }

  fn record_summary(&self, _scoreboard: &Scoreboard, _completed: bool) -> Result<(), Self::Error> {
    Ok(())
  }
}
