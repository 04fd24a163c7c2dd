// 该文件是 Haoma （球衣号码） 项目的一部分。
// src/decision/vote.rs - 多数投票
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

use std::collections::BTreeMap;

/// 取众数；出现次数相同时取最小的号码，空集合返回 `None`
pub fn majority(numbers: &[u32]) -> Option<u32> {
  let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
  for &number in numbers {
    *counts.entry(number).or_default() += 1;
  }

  // 升序遍历，只有严格更多才替换，平票时保留较小者
  let mut best: Option<(u32, usize)> = None;
  for (number, count) in counts {
    if best.is_none_or(|(_, best_count)| count > best_count) {
      best = Some((number, count));
    }
  }
  best.map(|(number, _)| number)
}
