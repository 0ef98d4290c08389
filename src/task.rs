// 该文件是 RainCity Hazard （雨城路况） 项目的一部分。
// src/task.rs - 推理任务
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

use image::RgbImage;
use tracing::info;

use crate::{
  detector::{HazardDetector, HazardRecord, HazardReport},
  frame::ModelFrame,
  model::{ClassId, DetectResult, Model},
  output::Render,
};

pub trait Task<I, D, O>: Sized {
  type Output;
  type Error;
  fn run_task(self, input: I, detector: D, output: O) -> Result<Self::Output, Self::Error>;
}

/// 读取一张图像，推理并输出一次
pub struct OneShotTask;

impl<
  'a,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = RgbImage>,
  M: Model<Input = ModelFrame, Output = DetectResult<ClassId>>,
  O: Render<RgbImage, HazardReport, Error = RE>,
> Task<I, &'a HazardDetector<M>, O> for OneShotTask
where
  M::Error: std::error::Error + Send + Sync + 'static,
{
  type Output = HazardRecord;
  type Error = anyhow::Error;

  fn run_task(
    self,
    mut input: I,
    detector: &'a HazardDetector<M>,
    output: O,
  ) -> Result<Self::Output, Self::Error> {
    info!("开始任务...");
    let image = input.next().ok_or_else(|| anyhow::anyhow!("没有输入图像"))?;
    info!("输入图像获取成功，开始推理...");
    let report = detector.detect_hazards(&image)?;
    output.render_result(&image, &report)?;
    info!("渲染完成");

    Ok(report.to_record())
  }
}
