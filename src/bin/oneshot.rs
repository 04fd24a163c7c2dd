// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/bin/oneshot.rs - 单个轨迹决策
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

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use haoma::{
  FromUrl,
  config::{self, DecisionConfig},
  decision::DecisionEngine,
  frame::ImageHeaderProbe,
  input::InputWrapper,
  ocr::OcrWrapper,
  output::{NoRecord, NoRender},
  task::{OneShotTask, Task},
  utils,
};

/// 对单个轨迹目录给出球衣号码
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 轨迹帧目录，如 `frames:///data/tracklets/17?label=10`
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// OCR 推理服务
  #[arg(long, value_name = "OCR")]
  pub ocr: Url,
  #[arg(long, default_value_t = config::DEFAULT_DET_THRESHOLD)]
  pub det_threshold: f32,
  #[arg(long, default_value_t = config::DEFAULT_REC_THRESHOLD)]
  pub rec_threshold: f32,
  #[arg(long, default_value_t = config::DEFAULT_MIN_RESOLUTION)]
  pub min_resolution: u32,
  #[arg(long)]
  pub max_frames: Option<usize>,
  #[arg(long, default_value_t = config::DEFAULT_SEED)]
  pub seed: u64,
}

fn main() -> Result<()> {
  utils::init_tracing(None)?;

  let args = Args::parse();

  info!("输入来源: {}", args.input);
  info!("OCR 服务: {}", args.ocr);

  let config = DecisionConfig::default()
    .with_thresholds(args.det_threshold, args.rec_threshold)
    .with_min_resolution(args.min_resolution)
    .with_max_frames(args.max_frames)
    .with_seed(args.seed);

  let input = InputWrapper::from_url(&args.input)?;
  let ocr = OcrWrapper::from_url(&args.ocr)?;
  let engine = DecisionEngine::new(config, ImageHeaderProbe, ocr, NoRender);

  let decision = OneShotTask.run_task(input, &engine, NoRecord)?;
  println!("{}", serde_json::to_string_pretty(&decision)?);

  Ok(())
}
