// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// src/assess.rs - 隐患评分
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

use serde::{Deserialize, Serialize};

use crate::summary::HazardSummary;

const PERSON_LAYING_SCORE: f64 = 80.0;
const ACCIDENT_SCORE: f64 = 100.0;
const FALLEN_TREE_SCORE: f64 = 60.0;
const CONES_SCORE: f64 = 10.0;
const DEBRIS_SCORE: f64 = 5.0;
const PEDESTRIAN_SCORE: f64 = 0.5;

/// 根据类别名称推断出的路况标记与综合评分
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HazardAssessment {
  pub person_laying: bool,
  pub accident: bool,
  pub fallen_tree: bool,
  pub cones: bool,
  pub debris_items: u32,
  pub pedestrians: u32,
  pub score: f64,
}

/// 按类别名称关键字（不区分大小写）汇总隐患
pub fn assess(detections: &[HazardSummary]) -> HazardAssessment {
  let mut assessment = HazardAssessment::default();

  for detection in detections {
    let label = detection.label.to_lowercase();
    let is_person = label.contains("person");
    let is_laying = label.contains("lay");

    if is_person && is_laying {
      assessment.person_laying = true;
    }
    if is_person && !is_laying {
      assessment.pedestrians += 1;
    }
    if label.contains("cone") {
      assessment.cones = true;
    }
    if label.contains("debris") {
      assessment.debris_items += 1;
    }
    if label.contains("tree") {
      assessment.fallen_tree = true;
    }
    if ["crash", "accident", "wreck"].iter().any(|k| label.contains(k)) {
      assessment.accident = true;
    }
  }

  assessment.score = score(&assessment);
  assessment
}

fn score(a: &HazardAssessment) -> f64 {
  let mut score = 0.0;
  if a.person_laying {
    score += PERSON_LAYING_SCORE;
  }
  if a.accident {
    score += ACCIDENT_SCORE;
  }
  if a.fallen_tree {
    score += FALLEN_TREE_SCORE;
  }
  if a.cones {
    score += CONES_SCORE;
  }
  score += a.debris_items as f64 * DEBRIS_SCORE;
  score += a.pedestrians as f64 * PEDESTRIAN_SCORE;
  score
}
