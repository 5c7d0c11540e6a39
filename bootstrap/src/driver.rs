//! GraphicsContextが使うGPU APIの各ステップを抽象化したtrait。
//!
//! 実際のVulkanの実装は`crate::vulkan::VulkanDriver`。
//! 作成した各オブジェクトはdropされた時点で破棄される型であることを期待している。

use anyhow::Result;
use ash::vk;
use ashtray::utils::{PhysicalDeviceInfo, QueueIndices, SwapchainDesc};
use std::ffi::CString;

/// GraphicsContextの構築に必要なGPU APIの操作
pub trait Driver {
    /// Instance
    type Instance;
    /// Surface
    type Surface;
    /// 論理Device
    type Device;
    /// Swapchain
    type Swapchain;
    /// Swapchainのimageに対するImageView
    type ImageView;
    /// ShaderModule
    type ShaderModule;
    /// RenderPass
    type RenderPass;
    /// PipelineLayout
    type PipelineLayout;
    /// Graphics Pipeline
    type Pipeline;

    /// instanceを作成する。validationが有効ならdebug messengerも作成する。
    fn create_instance(&self, desc: &ashtray::InstanceDesc) -> Result<Self::Instance>;

    /// windowのsurfaceを作成する
    fn create_surface(&self, instance: &Self::Instance) -> Result<Self::Surface>;

    /// physical deviceの一覧と、選択に必要な情報を取得する
    fn physical_devices(
        &self,
        instance: &Self::Instance,
        surface: &Self::Surface,
    ) -> Result<Vec<PhysicalDeviceInfo>>;

    /// 論理deviceを作成する
    fn create_device(
        &self,
        instance: &Self::Instance,
        physical_device: &PhysicalDeviceInfo,
        queue_indices: &QueueIndices,
        extensions: &[CString],
        layers: &[CString],
    ) -> Result<Self::Device>;

    /// QueueFamilyの0番目のQueueを取得する
    fn get_device_queue(&self, device: &Self::Device, queue_family_index: u32) -> vk::Queue;

    /// swapchainを作成する
    fn create_swapchain(
        &self,
        device: &Self::Device,
        surface: &Self::Surface,
        desc: &SwapchainDesc,
    ) -> Result<Self::Swapchain>;

    /// swapchainのimageを取得する
    fn get_swapchain_images(
        &self,
        device: &Self::Device,
        swapchain: &Self::Swapchain,
    ) -> Result<Vec<vk::Image>>;

    /// swapchainのimageに対するimage viewを作成する
    fn create_image_view(
        &self,
        device: &Self::Device,
        swapchain: &Self::Swapchain,
        image: vk::Image,
        format: vk::Format,
    ) -> Result<Self::ImageView>;

    /// color attachmentを1つ持つrender passを作成する
    fn create_render_pass(
        &self,
        device: &Self::Device,
        format: vk::Format,
    ) -> Result<Self::RenderPass>;

    /// SPIR-Vのwordの列からshader moduleを作成する
    fn create_shader_module(
        &self,
        device: &Self::Device,
        code: &[u32],
    ) -> Result<Self::ShaderModule>;

    /// 空のpipeline layoutを作成する
    fn create_pipeline_layout(&self, device: &Self::Device) -> Result<Self::PipelineLayout>;

    /// graphics pipelineを作成する
    fn create_graphics_pipeline(
        &self,
        device: &Self::Device,
        pipeline_layout: &Self::PipelineLayout,
        render_pass: &Self::RenderPass,
        vertex_shader: &Self::ShaderModule,
        fragment_shader: &Self::ShaderModule,
    ) -> Result<Self::Pipeline>;
}
