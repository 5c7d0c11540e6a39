//! 参照カウンタで管理して、参照がすべて破棄された際に
//! RenderPassの破棄の処理まで行うRenderPassHandleを定義する。

use anyhow::{Context, Result};
use ash::vk;
use std::{fmt::Debug, ops::Deref, sync::Arc};

struct RenderPassHandleData {
    device: crate::DeviceHandle,
    render_pass: vk::RenderPass,
}
impl RenderPassHandleData {
    fn new(
        device: crate::DeviceHandle,
        render_pass_create_info: &vk::RenderPassCreateInfo,
    ) -> Result<Self> {
        // create render pass
        let render_pass = unsafe {
            ash::Device::create_render_pass(&device, render_pass_create_info, None)
                .context("Failed to create render pass")?
        };

        Ok(Self {
            device,
            render_pass,
        })
    }
}
impl Drop for RenderPassHandleData {
    fn drop(&mut self) {
        unsafe {
            // render passの破棄
            self.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

/// vk::RenderPassを参照カウントで管理するためのハンドル
#[derive(Clone)]
pub struct RenderPassHandle {
    data: Arc<RenderPassHandleData>,
}
impl RenderPassHandle {
    pub(crate) fn new(
        device_handle: crate::DeviceHandle,
        render_pass_create_info: &vk::RenderPassCreateInfo,
    ) -> Result<Self> {
        let data = RenderPassHandleData::new(device_handle, render_pass_create_info)?;
        Ok(Self {
            data: Arc::new(data),
        })
    }
}

// Debugトレイトの実装
impl Debug for RenderPassHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPassHandle").finish()
    }
}

// RenderPassHandleはvk::RenderPassにDerefする
impl Deref for RenderPassHandle {
    type Target = vk::RenderPass;
    fn deref(&self) -> &Self::Target {
        &self.data.render_pass
    }
}
