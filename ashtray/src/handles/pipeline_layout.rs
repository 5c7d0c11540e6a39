//! 参照カウンタで管理して、参照がすべて破棄された際に
//! PipelineLayoutの破棄の処理まで行うPipelineLayoutHandleを定義する。

use anyhow::{Context, Result};
use ash::vk;
use std::{fmt::Debug, ops::Deref, sync::Arc};

struct PipelineLayoutHandleData {
    device: crate::DeviceHandle,
    pipeline_layout: vk::PipelineLayout,
}
impl PipelineLayoutHandleData {
    fn new(
        device: crate::DeviceHandle,
        pipeline_layout_create_info: &vk::PipelineLayoutCreateInfo,
    ) -> Result<Self> {
        // create pipeline layout
        let pipeline_layout = unsafe {
            ash::Device::create_pipeline_layout(&device, pipeline_layout_create_info, None)
                .context("Failed to create pipeline layout")?
        };

        Ok(Self {
            device,
            pipeline_layout,
        })
    }
}
impl Drop for PipelineLayoutHandleData {
    fn drop(&mut self) {
        unsafe {
            // pipeline layoutの破棄
            self.device
                .destroy_pipeline_layout(self.pipeline_layout, None);
        }
    }
}

/// vk::PipelineLayoutを参照カウントで管理するためのハンドル
#[derive(Clone)]
pub struct PipelineLayoutHandle {
    data: Arc<PipelineLayoutHandleData>,
}
impl PipelineLayoutHandle {
    pub(crate) fn new(
        device_handle: crate::DeviceHandle,
        pipeline_layout_create_info: &vk::PipelineLayoutCreateInfo,
    ) -> Result<Self> {
        let data = PipelineLayoutHandleData::new(device_handle, pipeline_layout_create_info)?;
        Ok(Self {
            data: Arc::new(data),
        })
    }
}

// Debugトレイトの実装
impl Debug for PipelineLayoutHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineLayoutHandle").finish()
    }
}

// PipelineLayoutHandleはvk::PipelineLayoutにDerefする
impl Deref for PipelineLayoutHandle {
    type Target = vk::PipelineLayout;
    fn deref(&self) -> &Self::Target {
        &self.data.pipeline_layout
    }
}
