//! 参照カウンタで管理して、参照がすべて破棄された際に
//! Deviceの破棄の処理まで行うDeviceHandleを定義する。

use anyhow::{Context, Result};
use ash::{extensions::khr::Swapchain, vk};
use std::{fmt::Debug, ops::Deref, sync::Arc};

struct DeviceHandleData {
    // deviceより先にinstanceが破棄されないように保持する
    _instance: crate::InstanceHandle,
    device: ash::Device,
    swapchain_loader: Swapchain,
}
impl DeviceHandleData {
    fn new(
        instance: crate::InstanceHandle,
        physical_device: vk::PhysicalDevice,
        device_create_info: &vk::DeviceCreateInfo,
    ) -> Result<Self> {
        // create device
        let device = unsafe {
            ash::Instance::create_device(&instance, physical_device, device_create_info, None)
                .context("Failed to create logical device")?
        };

        // swapchain loader
        let swapchain_loader = Swapchain::new(&instance, &device);

        Ok(Self {
            _instance: instance,
            device,
            swapchain_loader,
        })
    }
}
impl Drop for DeviceHandleData {
    fn drop(&mut self) {
        unsafe {
            if let Err(err) = self.device.device_wait_idle() {
                log::warn!("Failed to wait device idle before destroy: {}", err);
            }

            // Deviceの破棄
            self.device.destroy_device(None);
        }
        log::debug!("Device destroyed");
    }
}

/// ash::Deviceを参照カウントで管理するためのハンドル
#[derive(Clone)]
pub struct DeviceHandle {
    data: Arc<DeviceHandleData>,
}
impl DeviceHandle {
    pub(crate) fn new(
        instance_handle: crate::InstanceHandle,
        physical_device: vk::PhysicalDevice,
        device_create_info: &vk::DeviceCreateInfo,
    ) -> Result<Self> {
        let data = DeviceHandleData::new(instance_handle, physical_device, device_create_info)?;
        Ok(Self {
            data: Arc::new(data),
        })
    }

    // create系

    /// Swapchainを作成する
    pub fn create_swapchain(
        &self,
        surface: &crate::SurfaceHandle,
        swapchain_create_info: &vk::SwapchainCreateInfoKHR,
    ) -> Result<crate::SwapchainHandle> {
        crate::SwapchainHandle::new(self.clone(), surface.clone(), swapchain_create_info)
    }

    /// Swapchainのimageに対するImageViewを作成する
    pub fn create_image_view(
        &self,
        swapchain: &crate::SwapchainHandle,
        image_view_create_info: &vk::ImageViewCreateInfo,
    ) -> Result<crate::ImageViewHandle> {
        crate::ImageViewHandle::new(self.clone(), swapchain.clone(), image_view_create_info)
    }

    /// ShaderModuleを作成する
    pub fn create_shader_module(
        &self,
        shader_module_create_info: &vk::ShaderModuleCreateInfo,
    ) -> Result<crate::ShaderModuleHandle> {
        crate::ShaderModuleHandle::new(self.clone(), shader_module_create_info)
    }

    /// RenderPassを作成する
    pub fn create_render_pass(
        &self,
        render_pass_create_info: &vk::RenderPassCreateInfo,
    ) -> Result<crate::RenderPassHandle> {
        crate::RenderPassHandle::new(self.clone(), render_pass_create_info)
    }

    /// PipelineLayoutを作成する
    pub fn create_pipeline_layout(
        &self,
        pipeline_layout_create_info: &vk::PipelineLayoutCreateInfo,
    ) -> Result<crate::PipelineLayoutHandle> {
        crate::PipelineLayoutHandle::new(self.clone(), pipeline_layout_create_info)
    }

    /// Graphics Pipelineを作成する
    pub fn create_graphics_pipeline(
        &self,
        pipeline_layout: &crate::PipelineLayoutHandle,
        render_pass: &crate::RenderPassHandle,
        create_info: &vk::GraphicsPipelineCreateInfo,
    ) -> Result<crate::GraphicsPipelineHandle> {
        crate::GraphicsPipelineHandle::new(
            self.clone(),
            pipeline_layout.clone(),
            render_pass.clone(),
            create_info,
        )
    }

    // deviceの各関数

    /// Queueを取得する
    pub fn get_device_queue(&self, queue_family_index: u32, queue_index: u32) -> vk::Queue {
        unsafe {
            self.data
                .device
                .get_device_queue(queue_family_index, queue_index)
        }
    }

    /// Swapchainのimageを取得する。
    /// imageはpresentation engineが所有しているので破棄しない。
    pub fn get_swapchain_images(
        &self,
        swapchain: &crate::SwapchainHandle,
    ) -> Result<Vec<vk::Image>> {
        let images = unsafe {
            self.data
                .swapchain_loader
                .get_swapchain_images(**swapchain)
                .context("Failed to get swapchain images")?
        };
        Ok(images)
    }

    // raw

    /// Swapchainのloaderを取得する
    pub(crate) fn swapchain_loader(&self) -> &Swapchain {
        &self.data.swapchain_loader
    }
}

// Debugトレイトの実装
impl Debug for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle").finish()
    }
}

// DeviceHandleはash::DeviceにDerefする
impl Deref for DeviceHandle {
    type Target = ash::Device;
    fn deref(&self) -> &Self::Target {
        &self.data.device
    }
}
