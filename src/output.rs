// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/output.rs - 输出定义
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

use thiserror::Error;

use crate::decision::{Decision, score::Scoreboard};

/// 诊断输出：把单帧的推理结果渲染出来，不影响决策
pub trait Render<Frame, Output>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

/// 结果记录：逐视频的决策与最终汇总
pub trait Record {
  type Error;
  fn record_decision(&self, index: usize, decision: &Decision) -> Result<(), Self::Error>;
  fn record_summary(&self, scoreboard: &Scoreboard, completed: bool) -> Result<(), Self::Error>;
}

impl<T: Record> Record for &T {
  type Error = T::Error;

  fn record_decision(&self, index: usize, decision: &Decision) -> Result<(), Self::Error> {
    (**self).record_decision(index, decision)
  }

  fn record_summary(&self, scoreboard: &Scoreboard, completed: bool) -> Result<(), Self::Error> {
    (**self).record_summary(scoreboard, completed)
  }
}

/// 属于某个视频的一帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
  pub video_id: String,
  pub path: PathBuf,
}

impl VideoFrame {
  pub fn new(video_id: &str, path: &Path) -> Self {
    Self {
      video_id: video_id.to_string(),
      path: path.to_path_buf(),
    }
  }

  /// 以视频编号为子目录、原帧文件名为文件名，避免不同视频间重名
  pub fn output_path(&self, directory: &Path) -> PathBuf {
    let file_name = self
      .path
      .file_name()
      .map(|name| name.to_os_string())
      .unwrap_or_else(|| "frame.png".into());
    directory.join(&self.video_id).join(file_name)
  }
}

#[cfg(feature = "visualization")]
pub mod draw;

#[cfg(feature = "visualization")]
mod directory_record;
#[cfg(feature = "visualization")]
pub use self::directory_record::{
  DirectoryRecordOutput, DirectoryRecordOutputError, DrawWrapper, load_font,
};

mod result_record;
pub use self::result_record::{JsonLinesRecord, NoRecord};

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("结果记录错误 {0}: {1}")]
  RecordError(PathBuf, std::io::Error),
  #[error("结果序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
}

/// 不做任何渲染
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRender;

impl<F, O> Render<F, O> for NoRender {
  type Error = std::convert::Infallible;

  fn render_result(&self, _frame: &F, _result: &O) -> Result<(), Self::Error> {
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_output_path_is_namespaced_by_video() {
    let frame = VideoFrame::new("17", Path::new("/data/test/images/17/17_3.jpg"));
    assert_eq!(
      frame.output_path(Path::new("/out/vis")),
      PathBuf::from("/out/vis/17/17_3.jpg")
    );
  }
}
