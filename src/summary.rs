// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// src/summary.rs - 检测结果汇总
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 RainCity Hazard 项目组

//! 每个类别只保留置信度最高的一条检测记录。
//!
//! 输出顺序为类别首次出现的顺序，置信度保留三位小数。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 置信度保留的小数位数
pub const CONFIDENCE_DECIMALS: i32 = 3;

/// 单个类别的汇总记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardSummary {
  pub label: String,
  pub confidence: f64,
}

/// 四舍五入到 [`CONFIDENCE_DECIMALS`] 位小数
pub fn round_confidence(confidence: f64) -> f64 {
  let scale = 10f64.powi(CONFIDENCE_DECIMALS);
  (confidence * scale).round() / scale
}

/// 流式汇总器，按类别做最大值归约
#[derive(Debug, Default, Clone)]
pub struct Summarizer {
  entries: Vec<HazardSummary>,
  index: HashMap<String, usize>,
}

impl Summarizer {
  pub fn new() -> Self {
    Self::default()
  }

  /// 记录一条检测结果。
  ///
  /// 只有新置信度严格大于已保存的（已舍入的）置信度时才替换，
  /// 相等时保留先出现的记录。
  pub fn observe(&mut self, label: &str, confidence: f64) {
    match self.index.get(label) {
      Some(&idx) => {
        let entry = &mut self.entries[idx];
        if confidence > entry.confidence {
          entry.confidence = round_confidence(confidence);
        }
      }
      None => {
        self.index.insert(label.to_string(), self.entries.len());
        self.entries.push(HazardSummary {
          label: label.to_string(),
          confidence: round_confidence(confidence),
        });
      }
    }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn finish(self) -> Vec<HazardSummary> {
    self.entries
  }
}

impl<S: AsRef<str>> Extend<(S, f64)> for Summarizer {
  fn extend<I: IntoIterator<Item = (S, f64)>>(&mut self, iter: I) {
    for (label, confidence) in iter {
      self.observe(label.as_ref(), confidence);
    }
  }
}

/// 对一次推理的全部检测结果做汇总
pub fn summarize<I, S>(detections: I) -> Vec<HazardSummary>
where
  I: IntoIterator<Item = (S, f64)>,
  S: AsRef<str>,
{
  let mut summarizer = Summarizer::new();
  summarizer.extend(detections);
  summarizer.finish()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(label: &str, confidence: f64) -> HazardSummary {
    HazardSummary {
      label: label.to_string(),
      confidence,
    }
  }

  #[test]
  fn empty_input_gives_empty_output() {
    let out = summarize(Vec::<(&str, f64)>::new());
    assert!(out.is_empty());
  }

  #[test]
  fn single_detection_passes_through() {
    let out = summarize([("pothole", 0.91)]);
    assert_eq!(out, vec![entry("pothole", 0.91)]);
  }

  #[test]
  fn keeps_maximum_per_label() {
    let out = summarize([("crack", 0.40), ("crack", 0.85), ("crack", 0.60)]);
    assert_eq!(out, vec![entry("crack", 0.85)]);
  }

  #[test]
  fn ties_keep_a_single_entry() {
    let out = summarize([("hole", 0.50), ("hole", 0.50)]);
    assert_eq!(out, vec![entry("hole", 0.5)]);
  }

  #[test]
  fn distinct_labels_in_first_seen_order() {
    let out = summarize([("crack", 0.3), ("pothole", 0.9)]);
    assert_eq!(out, vec![entry("crack", 0.3), entry("pothole", 0.9)]);

    let out = summarize([("pothole", 0.2), ("crack", 0.3), ("pothole", 0.9)]);
    assert_eq!(out, vec![entry("pothole", 0.9), entry("crack", 0.3)]);
  }

  #[test]
  fn rounds_to_three_decimals() {
    let out = summarize([("debris", 0.123456)]);
    assert_eq!(out, vec![entry("debris", 0.123)]);
  }

  #[test]
  fn accepts_zero_and_negative_scores() {
    let out = summarize([("cone", 0.0), ("cone", -0.5), ("tree", -1.25)]);
    assert_eq!(out, vec![entry("cone", 0.0), entry("tree", -1.25)]);
  }

  #[test]
  fn compares_against_rounded_value() {
    // 0.8502 > 0.85 替换，但舍入后不变
    let out = summarize([("crack", 0.8504), ("crack", 0.8502)]);
    assert_eq!(out, vec![entry("crack", 0.85)]);

    // 0.8499 < 0.85 不替换
    let mut summarizer = Summarizer::new();
    summarizer.observe("crack", 0.8496);
    summarizer.observe("crack", 0.8499);
    assert_eq!(summarizer.finish(), vec![entry("crack", 0.85)]);
  }

  #[test]
  fn nan_never_replaces_stored_value() {
    let out = summarize([("crack", 0.7), ("crack", f64::NAN), ("cone", 0.2)]);
    assert_eq!(out, vec![entry("crack", 0.7), entry("cone", 0.2)]);

    // 首次出现的 NaN 原样保留
    let out = summarize([("crack", f64::NAN), ("crack", 0.9)]);
    assert_eq!(out.len(), 1);
    assert!(out[0].confidence.is_nan());
  }

  #[test]
  fn f32_scores_round_cleanly() {
    let out = summarize([("pothole", 0.91f32 as f64)]);
    assert_eq!(out, vec![entry("pothole", 0.91)]);
  }

  #[test]
  fn streaming_matches_batch() {
    let input = [("a", 0.1), ("b", 0.7), ("a", 0.4), ("c", 0.2), ("b", 0.3)];
    let mut summarizer = Summarizer::new();
    for (label, confidence) in input {
      summarizer.observe(label, confidence);
    }
    assert_eq!(summarizer.len(), 3);
    assert_eq!(summarizer.finish(), summarize(input));
  }

  #[test]
  fn output_is_per_label_maximum() {
    // 线性同余生成器，保证用例可复现
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    let mut next = || {
      state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
      state >> 33
    };

    let labels = ["crack", "pothole", "debris", "cone", "tree"];
    for _ in 0..50 {
      let len = (next() % 40) as usize;
      let input: Vec<(&str, f64)> = (0..len)
        .map(|_| {
          let label = labels[(next() % labels.len() as u64) as usize];
          let confidence = (next() % 1_000_000) as f64 / 1_000_000.0;
          (label, confidence)
        })
        .collect();

      let out = summarize(input.iter().copied());
      let distinct: std::collections::HashSet<_> = input.iter().map(|(l, _)| *l).collect();
      assert_eq!(out.len(), distinct.len());

      for summary in &out {
        let max = input
          .iter()
          .filter(|(l, _)| *l == summary.label)
          .map(|(_, c)| *c)
          .fold(f64::MIN, f64::max);
        assert!(
          (summary.confidence - max).abs() <= 0.0005 + f64::EPSILON,
          "{}: {} vs {}",
          summary.label,
          summary.confidence,
          max
        );
      }
    }
  }
}
