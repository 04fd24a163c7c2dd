// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/bin/evaluate.rs - 数据集评估
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

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use haoma::{
  FromUrl,
  config::{self, DecisionConfig},
  decision::{DecisionEngine, score::Scoreboard},
  frame::ImageHeaderProbe,
  input::InputWrapper,
  ocr::{FramePrediction, OcrWrapper},
  output::{JsonLinesRecord, NoRender, Render, VideoFrame},
  task::{EvaluationTask, Task},
  utils,
};

/// Haoma 评估参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 数据集来源，如 `soccernet:///data/SoccerNet/jersey-2023?split=test`
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// OCR 推理服务，如 `mmocr-pred:///data/preds` 或 `exec:///usr/bin/ocr?arg=--gpu`
  #[arg(long, value_name = "OCR")]
  pub ocr: Url,
  /// 检测置信度阈值（严格大于）
  #[arg(long, default_value_t = config::DEFAULT_DET_THRESHOLD)]
  pub det_threshold: f32,
  /// 识别置信度阈值（严格大于）
  #[arg(long, default_value_t = config::DEFAULT_REC_THRESHOLD)]
  pub rec_threshold: f32,
  /// 最长边低于该值的视频直接判为无可信号码
  #[arg(long, default_value_t = config::DEFAULT_MIN_RESOLUTION)]
  pub min_resolution: u32,
  /// 每个视频最多使用的帧数
  #[arg(long)]
  pub max_frames: Option<usize>,
  /// 最多评估的视频数
  #[arg(long)]
  pub max_videos: Option<usize>,
  /// 传给 OCR 服务的随机种子
  #[arg(long, default_value_t = config::DEFAULT_SEED)]
  pub seed: u64,
  /// 输出目录，每次运行在其中新建子目录
  #[arg(long, value_name = "DIR", default_value = "./outputs")]
  pub output_dir: PathBuf,
  /// 保存检测框可视化图像
  #[arg(long)]
  pub save_vis: bool,
  /// 可视化标签使用的字体文件
  #[arg(long, value_name = "FONT")]
  pub font: Option<PathBuf>,
  /// 可视化输出，如 `folder:///out/vis?font=/path/font.ttf&record`；
  /// 未给出时写入运行目录下的 `vis`
  #[arg(long, value_name = "OUTPUT")]
  pub vis: Option<Url>,
}

fn evaluate<V, VE>(
  args: &Args,
  config: DecisionConfig,
  render: V,
  run_dir: &Path,
) -> Result<(Scoreboard, V)>
where
  VE: std::fmt::Display,
  V: Render<VideoFrame, FramePrediction, Error = VE>,
{
  let input = InputWrapper::from_url(&args.input)?;
  info!("共 {} 个视频", input.len());
  let ocr = OcrWrapper::from_url(&args.ocr)?;
  let record = JsonLinesRecord::create(run_dir.join("results.jsonl"))?;

  let engine = DecisionEngine::new(config, ImageHeaderProbe, ocr, render);
  let scoreboard = EvaluationTask::default()
    .with_video_number(args.max_videos)
    .with_interrupt(true)
    .run_task(input, &engine, &record)?;

  Ok((scoreboard, engine.into_render()))
}

#[cfg(feature = "visualization")]
fn run(args: &Args, config: DecisionConfig, run_dir: &Path) -> Result<Scoreboard> {
  use haoma::output::{DirectoryRecordOutput, DrawWrapper, draw::Draw, load_font};

  if !config.save_vis() {
    return evaluate(args, config, NoRender, run_dir).map(|(board, _)| board);
  }

  let vis = match &args.vis {
    Some(url) => {
      info!("可视化输出: {}", url);
      DirectoryRecordOutput::from_url(url)?
    }
    None => {
      let font = args.font.as_deref().map(load_font).transpose()?;
      let draw = DrawWrapper::Draw(Box::new(Draw::new(font, config.det_threshold())));
      DirectoryRecordOutput::spawn(run_dir.join("vis"), draw)?
    }
  };
  let (scoreboard, mut vis) = evaluate(args, config, vis, run_dir)?;
  vis.finish();
  Ok(scoreboard)
}

#[cfg(not(feature = "visualization"))]
fn run(args: &Args, config: DecisionConfig, run_dir: &Path) -> Result<Scoreboard> {
  if config.save_vis() {
    tracing::warn!("未启用 visualization 特性，忽略 --save-vis");
  }
  evaluate(args, config, NoRender, run_dir).map(|(board, _)| board)
}

fn main() -> Result<()> {
  let args = Args::parse();

  let run_dir = utils::run_dir(&args.output_dir)?;
  utils::init_tracing(Some(&run_dir.join("output.log")))?;

  info!("运行目录: {}", run_dir.display());
  info!("输入来源: {}", args.input);
  info!("OCR 服务: {}", args.ocr);

  let config = DecisionConfig::default()
    .with_thresholds(args.det_threshold, args.rec_threshold)
    .with_min_resolution(args.min_resolution)
    .with_max_frames(args.max_frames)
    .with_save_vis(args.save_vis)
    .with_seed(args.seed);
  info!("配置: {}", serde_json::to_string(&config)?);

  let scoreboard = run(&args, config, &run_dir)?;
  println!("Accuracy: {}", scoreboard);

  Ok(())
}
