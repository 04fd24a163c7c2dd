// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/output/draw.rs - 文本检测结果可视化
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

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut, draw_text_mut};

use crate::ocr::{Detection, FramePrediction};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 12.0;
const LABEL_TEXT_HEIGHT: i32 = 14;
const LABEL_CHAR_WIDTH: f32 = 7.0; // 每字符平均宽度（粗略估计）
const POLYGON_COLOR: [u8; 3] = [0, 0, 255]; // 蓝色
const CONFIDENT_COLOR: [u8; 3] = [0, 200, 0]; // 绿色

pub struct Draw {
  font: Option<FontArc>,
  font_size: f32,
  det_threshold: f32,
}

impl Draw {
  /// 没有字体时只画多边形，不写标签
  pub fn new(font: Option<FontArc>, det_threshold: f32) -> Self {
    Self {
      font,
      font_size: LABEL_FONT_SIZE,
      det_threshold,
    }
  }

  pub fn draw_prediction(&self, image: &mut RgbImage, prediction: &FramePrediction) {
    for detection in prediction.detections.iter() {
      let color = if detection.det_score >= self.det_threshold {
        CONFIDENT_COLOR
      } else {
        POLYGON_COLOR
      };
      self.draw_polygon(image, &detection.polygon, color);
      if let Some(font) = &self.font {
        self.draw_label(image, detection, color, font);
      }
    }
  }

  // 多边形为像素坐标 [x1, y1, x2, y2, ...]，首尾自动闭合
  fn draw_polygon(&self, image: &mut RgbImage, polygon: &[f32], color: [u8; 3]) {
    let points: Vec<(f32, f32)> = polygon
      .chunks_exact(2)
      .map(|xy| (xy[0], xy[1]))
      .collect();
    if points.len() < 2 {
      return;
    }

    for i in 0..points.len() {
      let start = points[i];
      let end = points[(i + 1) % points.len()];
      draw_line_segment_mut(image, start, end, Rgb(color));
    }
  }

  fn draw_label(&self, image: &mut RgbImage, detection: &Detection, color: [u8; 3], font: &FontArc) {
    let (w, h) = (image.width() as i32, image.height() as i32);
    if w == 0 || h == 0 {
      return;
    }

    let label = format!("{} {:.2}/{:.2}", detection.text, detection.det_score, detection.rec_score);

    // 标签放在多边形左上角上方，没有多边形时放在图像左上角
    let (x_min, y_min) = detection
      .polygon
      .chunks_exact(2)
      .fold(None, |acc: Option<(f32, f32)>, xy| match acc {
        Some((x, y)) => Some((x.min(xy[0]), y.min(xy[1]))),
        None => Some((xy[0], xy[1])),
      })
      .unwrap_or((0.0, 0.0));

    let text_width = (label.chars().count() as f32 * LABEL_CHAR_WIDTH) as i32;
    let label_x = (x_min.floor() as i32).clamp(0, w - 1);
    let label_y = (y_min.floor() as i32 - LABEL_TEXT_HEIGHT).clamp(0, h - 1);
    let label_width = text_width.min(w - label_x).max(0) as u32;
    let label_height = LABEL_TEXT_HEIGHT.min(h - label_y).max(0) as u32;

    if label_width > 0 && label_height > 0 {
      let rect = imageproc::rect::Rect::at(label_x, label_y).of_size(label_width, label_height);
      draw_filled_rect_mut(image, rect, Rgb(color));
      draw_text_mut(
        image,
        Rgb([255u8, 255u8, 255u8]),
        label_x,
        label_y,
        PxScale::from(self.font_size),
        font,
        &label,
      );
    }
  }
}

/// 以文本形式记录检测结果，每行 `text, det_score, rec_score`
pub struct Record;

impl Record {
  pub fn record(&self, prediction: &FramePrediction, path: &std::path::Path) -> Result<(), std::io::Error> {
    let records: Vec<String> = prediction
      .detections
      .iter()
      .map(|d| format!("{}, {:.4}, {:.4}", d.text, d.det_score, d.rec_score))
      .collect();
    std::fs::write(path.with_extension("txt"), records.join("\n"))?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_polygon_is_drawn_in_confident_color() {
    let mut image = RgbImage::new(20, 20);
    let prediction = FramePrediction::new(vec![
      Detection::new(0.9, 0.9, "7").with_polygon(vec![2.0, 2.0, 12.0, 2.0, 12.0, 12.0, 2.0, 12.0]),
    ]);
    Draw::new(None, 0.6).draw_prediction(&mut image, &prediction);

    assert_eq!(image.get_pixel(7, 2), &Rgb(CONFIDENT_COLOR));
    assert_eq!(image.get_pixel(2, 7), &Rgb(CONFIDENT_COLOR));
    assert_eq!(image.get_pixel(7, 7), &Rgb([0, 0, 0]));
  }

  #[test]
  fn test_degenerate_polygons_are_ignored() {
    let mut image = RgbImage::new(8, 8);
    let prediction = FramePrediction::new(vec![
      Detection::new(0.9, 0.9, "1"),
      Detection::new(0.9, 0.9, "2").with_polygon(vec![1.0, 1.0, 3.0]),
    ]);
    Draw::new(None, 0.6).draw_prediction(&mut image, &prediction);
    assert!(image.pixels().all(|p| *p == Rgb([0, 0, 0])));
  }

  #[test]
  fn test_record_sidecar() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("3_1.jpg");
    let prediction = FramePrediction::new(vec![Detection::new(0.75, 0.5, "12")]);
    Record.record(&prediction, &path).unwrap();
    let content = std::fs::read_to_string(dir.path().join("3_1.txt")).unwrap();
    assert_eq!(content, "12, 0.7500, 0.5000");
  }
}
