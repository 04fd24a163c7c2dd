// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/frame.rs - 帧尺寸读取
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

use image::ImageReader;
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug)]
pub enum FrameError {
  #[error("无法打开帧文件 {0}: {1}")]
  IoError(PathBuf, std::io::Error),
  #[error("无法解析帧文件 {0}: {1}")]
  ImageError(PathBuf, image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameShape {
  pub width: u32,
  pub height: u32,
}

impl FrameShape {
  pub fn new(width: u32, height: u32) -> Self {
    Self { width, height }
  }

  pub fn max_side(&self) -> u32 {
    self.width.max(self.height)
  }
}

/// 读取帧的尺寸
pub trait FrameProbe {
  type Error;
  fn probe(&self, path: &Path) -> Result<FrameShape, Self::Error>;
}

/// 只解析图像文件头来获取尺寸，不解码像素
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageHeaderProbe;

impl FrameProbe for ImageHeaderProbe {
  type Error = FrameError;

  fn probe(&self, path: &Path) -> Result<FrameShape, Self::Error> {
    let reader = ImageReader::open(path)
      .map_err(|e| FrameError::IoError(path.to_path_buf(), e))?
      .with_guessed_format()
      .map_err(|e| FrameError::IoError(path.to_path_buf(), e))?;
    let (width, height) = reader
      .into_dimensions()
      .map_err(|e| FrameError::ImageError(path.to_path_buf(), e))?;
    trace!("帧 {} 尺寸: {}x{}", path.display(), width, height);
    Ok(FrameShape::new(width, height))
  }
}
