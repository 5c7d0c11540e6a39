//! ashtrayのHandleを使ったDriverの実装

use anyhow::Result;
use ash::vk;
use ashtray::{
    utils::{self, PhysicalDeviceInfo, QueueIndices, SwapchainDesc},
    DeviceHandle, GraphicsPipelineHandle, ImageViewHandle, InstanceDesc, InstanceHandle,
    PipelineLayoutHandle, RenderPassHandle, ShaderModuleHandle, SurfaceHandle, SwapchainHandle,
};
use raw_window_handle::{
    HasRawDisplayHandle, HasRawWindowHandle, RawDisplayHandle, RawWindowHandle,
};
use std::ffi::CString;

/// windowに対してVulkanのオブジェクトを作成するDriver
pub struct VulkanDriver {
    raw_display_handle: RawDisplayHandle,
    raw_window_handle: RawWindowHandle,
}
impl VulkanDriver {
    /// windowのraw handleを保持する。
    /// 作成したsurfaceよりwindowが長く生きている必要がある。
    pub fn new(window: &(impl HasRawDisplayHandle + HasRawWindowHandle)) -> Self {
        Self {
            raw_display_handle: window.raw_display_handle(),
            raw_window_handle: window.raw_window_handle(),
        }
    }
}

impl crate::Driver for VulkanDriver {
    type Instance = InstanceHandle;
    type Surface = SurfaceHandle;
    type Device = DeviceHandle;
    type Swapchain = SwapchainHandle;
    type ImageView = ImageViewHandle;
    type ShaderModule = ShaderModuleHandle;
    type RenderPass = RenderPassHandle;
    type PipelineLayout = PipelineLayoutHandle;
    type Pipeline = GraphicsPipelineHandle;

    fn create_instance(&self, desc: &InstanceDesc) -> Result<InstanceHandle> {
        InstanceHandle::new(self.raw_display_handle, desc)
    }

    fn create_surface(&self, instance: &InstanceHandle) -> Result<SurfaceHandle> {
        instance.create_surface(self.raw_display_handle, self.raw_window_handle)
    }

    fn physical_devices(
        &self,
        instance: &InstanceHandle,
        surface: &SurfaceHandle,
    ) -> Result<Vec<PhysicalDeviceInfo>> {
        utils::query_physical_devices(instance, surface)
    }

    fn create_device(
        &self,
        instance: &InstanceHandle,
        physical_device: &PhysicalDeviceInfo,
        queue_indices: &QueueIndices,
        extensions: &[CString],
        layers: &[CString],
    ) -> Result<DeviceHandle> {
        utils::create_device(
            instance,
            physical_device.physical_device,
            queue_indices,
            extensions,
            layers,
        )
    }

    fn get_device_queue(&self, device: &DeviceHandle, queue_family_index: u32) -> vk::Queue {
        device.get_device_queue(queue_family_index, 0)
    }

    fn create_swapchain(
        &self,
        device: &DeviceHandle,
        surface: &SurfaceHandle,
        desc: &SwapchainDesc,
    ) -> Result<SwapchainHandle> {
        utils::create_swapchain(device, surface, desc)
    }

    fn get_swapchain_images(
        &self,
        device: &DeviceHandle,
        swapchain: &SwapchainHandle,
    ) -> Result<Vec<vk::Image>> {
        device.get_swapchain_images(swapchain)
    }

    fn create_image_view(
        &self,
        device: &DeviceHandle,
        swapchain: &SwapchainHandle,
        image: vk::Image,
        format: vk::Format,
    ) -> Result<ImageViewHandle> {
        utils::create_swapchain_image_view(device, swapchain, image, format)
    }

    fn create_render_pass(
        &self,
        device: &DeviceHandle,
        format: vk::Format,
    ) -> Result<RenderPassHandle> {
        utils::create_render_pass(device, format)
    }

    fn create_shader_module(
        &self,
        device: &DeviceHandle,
        code: &[u32],
    ) -> Result<ShaderModuleHandle> {
        utils::create_shader_module(device, code)
    }

    fn create_pipeline_layout(&self, device: &DeviceHandle) -> Result<PipelineLayoutHandle> {
        utils::create_empty_pipeline_layout(device)
    }

    fn create_graphics_pipeline(
        &self,
        device: &DeviceHandle,
        pipeline_layout: &PipelineLayoutHandle,
        render_pass: &RenderPassHandle,
        vertex_shader: &ShaderModuleHandle,
        fragment_shader: &ShaderModuleHandle,
    ) -> Result<GraphicsPipelineHandle> {
        utils::create_graphics_pipeline(
            device,
            pipeline_layout,
            render_pass,
            vertex_shader,
            fragment_shader,
        )
    }
}
