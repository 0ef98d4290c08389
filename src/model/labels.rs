// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// src/model/labels.rs - 类别名称表
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

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::model::{ClassId, ClassLabel, DetectResult};

#[derive(Error, Debug)]
pub enum LabelError {
  #[error("无法读取类别文件 {0}: {1}")]
  IoError(String, std::io::Error),
  #[error("类别文件格式错误: {0}")]
  ParseError(#[from] toml::de::Error),
  #[error("类别文件中没有任何类别")]
  Empty,
}

/// 类别索引到名称的映射，TOML 格式：
///
/// ```toml
/// names = ["pothole", "crack"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LabelMap {
  names: Vec<String>,
}

impl LabelMap {
  pub fn new(names: Vec<String>) -> Self {
    Self { names }
  }

  pub fn from_toml_str(content: &str) -> Result<Self, LabelError> {
    let map: LabelMap = toml::from_str(content)?;
    if map.names.is_empty() {
      return Err(LabelError::Empty);
    }
    Ok(map)
  }

  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LabelError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
      .map_err(|e| LabelError::IoError(path.display().to_string(), e))?;
    let map = Self::from_toml_str(&content)?;
    info!("加载类别文件: {} ({} 个类别)", path.display(), map.len());
    Ok(map)
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  /// 未登记的索引回退为 `class-<id>`
  pub fn label(&self, id: ClassId) -> ClassLabel {
    let name = self
      .names
      .get(id.0 as usize)
      .cloned()
      .unwrap_or_else(|| format!("class-{}", id.0));
    ClassLabel { id, name }
  }

  pub fn resolve(&self, result: DetectResult<ClassId>) -> DetectResult<ClassLabel> {
    result.map_kind(|id| self.label(id))
  }
}
