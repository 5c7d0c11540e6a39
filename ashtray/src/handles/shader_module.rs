//! 参照カウンタで管理して、参照がすべて破棄された際に
//! ShaderModuleの破棄の処理まで行うShaderModuleHandleを定義する。

use anyhow::{Context, Result};
use ash::vk;
use std::{fmt::Debug, ops::Deref, sync::Arc};

struct ShaderModuleHandleData {
    device: crate::DeviceHandle,
    shader_module: vk::ShaderModule,
}
impl ShaderModuleHandleData {
    fn new(
        device: crate::DeviceHandle,
        shader_module_create_info: &vk::ShaderModuleCreateInfo,
    ) -> Result<Self> {
        // create shader module
        let shader_module = unsafe {
            ash::Device::create_shader_module(&device, shader_module_create_info, None)
                .context("Failed to create shader module")?
        };

        Ok(Self {
            device,
            shader_module,
        })
    }
}
impl Drop for ShaderModuleHandleData {
    fn drop(&mut self) {
        unsafe {
            // shader moduleの破棄
            self.device.destroy_shader_module(self.shader_module, None);
        }
    }
}

/// vk::ShaderModuleを参照カウントで管理するためのハンドル。
/// pipelineの作成が終われば不要なので、作成後すぐにdropしてよい。
#[derive(Clone)]
pub struct ShaderModuleHandle {
    data: Arc<ShaderModuleHandleData>,
}
impl ShaderModuleHandle {
    pub(crate) fn new(
        device_handle: crate::DeviceHandle,
        shader_module_create_info: &vk::ShaderModuleCreateInfo,
    ) -> Result<Self> {
        let data = ShaderModuleHandleData::new(device_handle, shader_module_create_info)?;
        Ok(Self {
            data: Arc::new(data),
        })
    }
}

// Debugトレイトの実装
impl Debug for ShaderModuleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderModuleHandle").finish()
    }
}

// ShaderModuleHandleはvk::ShaderModuleにDerefする
impl Deref for ShaderModuleHandle {
    type Target = vk::ShaderModule;
    fn deref(&self) -> &Self::Target {
        &self.data.shader_module
    }
}
