// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/utils.rs - 运行目录与日志初始化
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
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const JOB_ID_ENV: &str = "SLURM_JOB_ID";

/// 运行目录名，集群作业下使用作业号，否则使用启动时间
pub fn run_name(job_id: Option<&str>) -> String {
  match job_id.map(str::trim).filter(|id| !id.is_empty()) {
    Some(id) => format!("haoma-{id}"),
    None => format!("haoma-{}", chrono::Local::now().format("%Y%m%d-%H%M%S")),
  }
}

/// 创建 `<output_dir>/haoma-<作业号或时间戳>`
pub fn run_dir(output_dir: &Path) -> std::io::Result<PathBuf> {
  let job_id = std::env::var(JOB_ID_ENV).ok();
  let dir = output_dir.join(run_name(job_id.as_deref()));
  std::fs::create_dir_all(&dir)?;
  Ok(dir)
}

/// 终端日志由 `RUST_LOG` 控制（默认 info），文件日志固定记录 debug 级别
pub fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
  let stderr = tracing_subscriber::fmt::layer()
    .with_writer(std::io::stderr)
    .with_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    );

  let file = match log_file {
    Some(path) => {
      let file = File::create(path)?;
      Some(
        tracing_subscriber::fmt::layer()
          .with_writer(Mutex::new(file))
          .with_ansi(false)
          .with_filter(LevelFilter::DEBUG),
      )
    }
    None => None,
  };

  tracing_subscriber::registry()
    .with(stderr)
    .with(file)
    .try_init()?;
  Ok(())
}
