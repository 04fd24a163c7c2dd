// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/decision/prefilter.rs - 退化视频预过滤
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

use crate::frame::FrameShape;

/// 所有帧中最长边的最大值，没有帧时为 0
pub fn max_side(shapes: &[FrameShape]) -> u32 {
  shapes.iter().map(FrameShape::max_side).max().unwrap_or(0)
}

/// 最长边小于 `min_resolution` 的视频视为退化视频（通常是足球特写），
/// 不可能包含可读的号码。这是启发式判断，允许误判。
pub fn is_degenerate(shapes: &[FrameShape], min_resolution: u32) -> bool {
  max_side(shapes) < min_resolution
}
