//! 参照カウンタで管理して、参照がすべて破棄された際に
//! GraphicsPipelineの破棄の処理まで行うGraphicsPipelineHandleを定義する。

use anyhow::{anyhow, Result};
use ash::vk;
use std::{fmt::Debug, ops::Deref, sync::Arc};

struct GraphicsPipelineHandleData {
    device: crate::DeviceHandle,
    // pipelineより先に破棄されないように保持する
    _pipeline_layout: crate::PipelineLayoutHandle,
    _render_pass: crate::RenderPassHandle,
    graphics_pipeline: vk::Pipeline,
}
impl GraphicsPipelineHandleData {
    fn new(
        device: crate::DeviceHandle,
        pipeline_layout: crate::PipelineLayoutHandle,
        render_pass: crate::RenderPassHandle,
        graphics_pipeline_create_info: &vk::GraphicsPipelineCreateInfo,
    ) -> Result<Self> {
        // create graphics pipeline
        let graphics_pipelines = unsafe {
            ash::Device::create_graphics_pipelines(
                &device,
                vk::PipelineCache::null(),
                std::slice::from_ref(graphics_pipeline_create_info),
                None,
            )
        };
        let graphics_pipeline = match graphics_pipelines {
            Ok(pipelines) => pipelines.into_iter().next(),
            Err((pipelines, result)) => {
                // 作成途中のpipelineがあれば破棄しておく
                for pipeline in pipelines.into_iter().filter(|p| *p != vk::Pipeline::null()) {
                    unsafe { device.destroy_pipeline(pipeline, None) };
                }
                return Err(anyhow!("Failed to create graphics pipeline: {}", result));
            }
        };
        let graphics_pipeline = graphics_pipeline
            .ok_or_else(|| anyhow!("Failed to create graphics pipeline: no pipeline returned"))?;

        Ok(Self {
            device,
            _pipeline_layout: pipeline_layout,
            _render_pass: render_pass,
            graphics_pipeline,
        })
    }
}
impl Drop for GraphicsPipelineHandleData {
    fn drop(&mut self) {
        unsafe {
            // graphics pipelineの破棄
            self.device.destroy_pipeline(self.graphics_pipeline, None);
        }
        log::debug!("Graphics pipeline destroyed");
    }
}

/// Graphics用のvk::Pipelineを参照カウントで管理するためのハンドル
#[derive(Clone)]
pub struct GraphicsPipelineHandle {
    data: Arc<GraphicsPipelineHandleData>,
}
impl GraphicsPipelineHandle {
    pub(crate) fn new(
        device_handle: crate::DeviceHandle,
        pipeline_layout_handle: crate::PipelineLayoutHandle,
        render_pass_handle: crate::RenderPassHandle,
        graphics_pipeline_create_info: &vk::GraphicsPipelineCreateInfo,
    ) -> Result<Self> {
        let data = GraphicsPipelineHandleData::new(
            device_handle,
            pipeline_layout_handle,
            render_pass_handle,
            graphics_pipeline_create_info,
        )?;
        Ok(Self {
            data: Arc::new(data),
        })
    }
}

// Debugトレイトの実装
impl Debug for GraphicsPipelineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsPipelineHandle").finish()
    }
}

// GraphicsPipelineHandleはvk::PipelineにDerefする
impl Deref for GraphicsPipelineHandle {
    type Target = vk::Pipeline;
    fn deref(&self) -> &Self::Target {
        &self.data.graphics_pipeline
    }
}
