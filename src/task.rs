// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/task.rs - 评估任务
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

use std::sync::mpsc::Receiver;
use std::{thread, time::Duration};
use tracing::{debug, error, info, warn};

use crate::{
  decision::{Decide, Decision, score::Scoreboard},
  input::{InputError, VideoRecord},
  output::Record,
};

pub trait Task<I, M, O>: Sized {
  type Output;
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error>;
}

fn log_decision(index: usize, decision: &Decision) {
  info!(
    "视频: {} ({}), 预测: {}, 真实值: {}, 正确?: {}",
    index, decision.video_id, decision.predicted, decision.ground_truth, decision.is_correct
  );
  debug!("视频 {} 通过过滤的号码: {:?}", index, decision.confident_numbers);
}

/// 只处理输入中的第一个视频
pub struct OneShotTask;

impl<I, M, O, RE> Task<I, M, O> for OneShotTask
where
  RE: std::error::Error + Sync + Send + 'static,
  I: IntoIterator<Item = Result<VideoRecord, InputError>>,
  M: Decide,
  O: Record<Error = RE>,
{
  type Output = Decision;
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error> {
    info!("开始任务...");
    let video = input
      .into_iter()
      .next()
      .ok_or_else(|| anyhow::anyhow!("没有输入视频"))??;
    info!("视频 {} 共 {} 帧，开始决策...", video.video_id, video.frames.len());

    let now = std::time::Instant::now();
    let decision = model.decide(&video)?;
    info!("决策完成，耗时: {:.2?}", now.elapsed());
    log_decision(0, &decision);

    let mut scoreboard = Scoreboard::default();
    scoreboard.record(&decision);
    output.record_decision(0, &decision)?;
    output.record_summary(&scoreboard, true)?;

    Ok(decision)
  }
}

/// 依次处理全部视频并统计准确率
///
/// 任一视频的推理失败都会终止整个任务；终止或中断前已处理的视频
/// 仍会给出部分准确率。
#[derive(Default, Debug)]
pub struct EvaluationTask {
  video_number: Option<usize>,
  interruptible: bool,
  stop: Option<Receiver<()>>,
}

impl EvaluationTask {
  pub fn with_video_number(mut self, video_number: Option<usize>) -> Self {
    self.video_number = video_number;
    self
  }

  /// 安装 Ctrl-C 处理函数，收到信号后处理完当前视频即停止
  pub fn with_interrupt(mut self, interruptible: bool) -> Self {
    self.interruptible = interruptible;
    self
  }

  /// 使用外部的停止信号代替 Ctrl-C
  pub fn with_stop_signal(mut self, stop: Receiver<()>) -> Self {
    self.stop = Some(stop);
    self
  }

  fn install_interrupt() -> anyhow::Result<Receiver<()>> {
    let (tx, rx) = std::sync::mpsc::channel();

    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;

    Ok(rx)
  }
}

impl<I, M, O, RE> Task<I, M, O> for EvaluationTask
where
  RE: std::error::Error + Sync + Send + 'static,
  I: IntoIterator<Item = Result<VideoRecord, InputError>>,
  M: Decide,
  O: Record<Error = RE>,
{
  type Output = Scoreboard;
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error> {
    info!("开始评估...");
    let interrupt = match self.stop {
      Some(stop) => Some(stop),
      None if self.interruptible => Some(Self::install_interrupt()?),
      None => None,
    };

    let mut scoreboard = Scoreboard::default();
    for (index, video) in input.into_iter().enumerate() {
      if self.video_number.map(|n| index >= n).unwrap_or(false) {
        info!("达到指定视频数 {}, 退出任务循环", index);
        break;
      }

      let result = video
        .map_err(anyhow::Error::from)
        .and_then(|video| model.decide(&video).map_err(anyhow::Error::from));
      let decision = match result {
        Ok(decision) => decision,
        Err(e) => {
          error!("视频 {} 处理失败，终止任务: {:#}", index, e);
          error!("终止前准确率: {}", scoreboard);
          output.record_summary(&scoreboard, false)?;
          return Err(e);
        }
      };

      scoreboard.record(&decision);
      log_decision(index, &decision);
      output.record_decision(index, &decision)?;

      if interrupt.as_ref().is_some_and(|rx| rx.try_recv().is_ok()) {
        warn!("中断信号接收，已处理 {} 个视频", scoreboard.total());
        warn!("部分准确率: {}", scoreboard);
        output.record_summary(&scoreboard, false)?;
        return Ok(scoreboard);
      }
    }

    info!("最终准确率: {}", scoreboard);
    output.record_summary(&scoreboard, true)?;
    Ok(scoreboard)
  }
}
