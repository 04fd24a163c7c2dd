// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/output/directory_record.rs - 可视化目录记录输出
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
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use ab_glyph::FontArc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  ocr::FramePrediction,
  output::{
    Render, VideoFrame,
    draw::{Draw, Record},
  },
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("字体文件无效: {0}")]
  InvalidFont(String),
  #[error("可视化线程已退出")]
  WorkerGone,
}

pub enum DrawWrapper {
  Draw(Box<Draw>),
  Record(Box<Draw>, Record),
}

impl DrawWrapper {
  pub fn save_result(
    &self,
    source: &Path,
    target: &Path,
    prediction: &FramePrediction,
  ) -> Result<(), DirectoryRecordOutputError> {
    let mut image = image::open(source)?.to_rgb8();
    match self {
      DrawWrapper::Draw(draw) => {
        draw.draw_prediction(&mut image, prediction);
        image.save(target)?;
      }
      DrawWrapper::Record(draw, record) => {
        draw.draw_prediction(&mut image, prediction);
        image.save(target)?;
        record.record(prediction, target)?;
      }
    };

    Ok(())
  }
}

struct Job {
  source: PathBuf,
  target: PathBuf,
  prediction: FramePrediction,
}

/// 在后台线程中把超过检测阈值的帧画好并保存
///
/// 文件保存在 `<directory>/<video_id>/<原帧文件名>`。渲染请求只入队不等待，
/// 写入失败只记日志。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  sender: Option<Sender<Job>>,
  worker: Option<JoinHandle<usize>>,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  /// `folder:///out/vis?det_threshold=0.6&font=/path/font.ttf&record`
  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let mut det_threshold = crate::config::DEFAULT_DET_THRESHOLD;
    let mut font = None;
    let mut record = false;
    for (k, v) in uri.query_pairs() {
      match &*k {
        "det_threshold" => {
          det_threshold = v.parse().unwrap_or_else(|_| {
            warn!("无效的 det_threshold: {}，使用默认值", v);
            det_threshold
          })
        }
        "font" => font = Some(load_font(Path::new(&*v))?),
        "record" => record = true,
        _ => {}
      }
    }

    let draw = Box::new(Draw::new(font, det_threshold));
    let wrapper = if record {
      DrawWrapper::Record(draw, Record)
    } else {
      DrawWrapper::Draw(draw)
    };
    Self::spawn(crate::url_path(uri), wrapper)
  }
}

pub fn load_font(path: &Path) -> Result<FontArc, DirectoryRecordOutputError> {
  let data = std::fs::read(path)?;
  FontArc::try_from_vec(data)
    .map_err(|e| DirectoryRecordOutputError::InvalidFont(format!("{}: {}", path.display(), e)))
}

impl DirectoryRecordOutput {
  pub fn spawn(directory: PathBuf, draw: DrawWrapper) -> Result<Self, DirectoryRecordOutputError> {
    std::fs::create_dir_all(&directory)?;
    let (sender, receiver) = mpsc::channel::<Job>();

    let worker = thread::Builder::new()
      .name("haoma-vis".to_string())
      .spawn(move || {
        let mut saved = 0usize;
        for job in receiver {
          if let Some(parent) = job.target.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
              warn!("创建目录 {} 失败: {}", parent.display(), e);
              continue;
            }
          }
          match draw.save_result(&job.source, &job.target, &job.prediction) {
            Ok(()) => {
              debug!("保存可视化 {}", job.target.display());
              saved += 1;
            }
            Err(e) => warn!("保存可视化 {} 失败: {}", job.target.display(), e),
          }
        }
        saved
      })?;

    info!("可视化输出目录: {}", directory.display());
    Ok(Self {
      directory,
      sender: Some(sender),
      worker: Some(worker),
    })
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  /// 等待队列中的图像全部写完，返回成功保存的数量
  pub fn finish(&mut self) -> usize {
    drop(self.sender.take());
    match self.worker.take().map(JoinHandle::join) {
      Some(Ok(saved)) => {
        info!("可视化保存完成，共 {} 张", saved);
        saved
      }
      Some(Err(_)) => {
        error!("可视化线程异常退出");
        0
      }
      None => 0,
    }
  }
}

impl Drop for DirectoryRecordOutput {
  fn drop(&mut self) {
    if self.worker.is_some() {
      self.finish();
    }
  }
}

impl Render<VideoFrame, FramePrediction> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &VideoFrame, result: &FramePrediction) -> Result<(), Self::Error> {
    let sender = self
      .sender
      .as_ref()
      .ok_or(DirectoryRecordOutputError::WorkerGone)?;
    sender
      .send(Job {
        source: frame.path.clone(),
        target: frame.output_path(&self.directory),
        prediction: result.clone(),
      })
      .map_err(|_| DirectoryRecordOutputError::WorkerGone)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ocr::Detection;
  use image::RgbImage;
  use tempfile::TempDir;

  #[test]
  fn test_frames_saved_per_video() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let source = input.path().join("4_2.png");
    RgbImage::new(16, 16).save(&source).unwrap();

    let url = Url::parse(&format!("folder://{}?record", output.path().display())).unwrap();
    let mut vis = DirectoryRecordOutput::from_url(&url).unwrap();
    let prediction = FramePrediction::new(vec![
      Detection::new(0.9, 0.95, "4").with_polygon(vec![1.0, 1.0, 10.0, 1.0, 10.0, 10.0]),
    ]);
    vis
      .render_result(&VideoFrame::new("4", &source), &prediction)
      .unwrap();
    assert_eq!(vis.finish(), 1);

    assert!(output.path().join("4").join("4_2.png").is_file());
    assert!(output.path().join("4").join("4_2.txt").is_file());
  }

  #[test]
  fn test_unreadable_frame_is_logged_not_raised() {
    let output = TempDir::new().unwrap();
    let mut vis =
      DirectoryRecordOutput::spawn(output.path().to_path_buf(), DrawWrapper::Draw(Box::new(Draw::new(None, 0.6))))
        .unwrap();
    let frame = VideoFrame::new("1", Path::new("/nonexistent/1_1.jpg"));
    assert!(vis.render_result(&frame, &FramePrediction::default()).is_ok());
    assert_eq!(vis.finish(), 0);
  }

  #[test]
  fn test_render_after_finish_fails() {
    let output = TempDir::new().unwrap();
    let mut vis =
      DirectoryRecordOutput::spawn(output.path().to_path_buf(), DrawWrapper::Draw(Box::new(Draw::new(None, 0.6))))
        .unwrap();
    vis.finish();
    let frame = VideoFrame::new("1", Path::new("1_1.jpg"));
    assert!(matches!(
      vis.render_result(&frame, &FramePrediction::default()),
      Err(DirectoryRecordOutputError::WorkerGone)
    ));
  }

  #[test]
  fn test_missing_font_is_an_error() {
    let output = TempDir::new().unwrap();
    let url = Url::parse(&format!(
      "folder://{}?font=/nonexistent/font.ttf",
      output.path().display()
    ))
    .unwrap();
    assert!(matches!(
      DirectoryRecordOutput::from_url(&url),
      Err(DirectoryRecordOutputError::IoError(_))
    ));
  }

  #[test]
  fn test_folder_url_with_space() {
    let output = TempDir::new().unwrap();
    let target = output.path().join("vis out");
    let url = Url::parse(&format!("folder://{}", target.display())).unwrap();
    let vis = DirectoryRecordOutput::from_url(&url).unwrap();
    assert_eq!(vis.directory(), target.as_path());
    assert!(target.is_dir());
  }
}
