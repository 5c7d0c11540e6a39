//! Vulkanの各Objectを参照カウンタで管理して、参照がすべて破棄された際に
//! 自動で各種destroy処理を行うようにしたラッパーの構造体の各種Handleを用意している。
//!
//! 参照カウントには`std::sync::Arc`を使い、中身の構造体の`Drop`でdestroy処理を行う。

mod instance;
pub use instance::{InstanceDesc, InstanceHandle, VULKAN_LOG_TARGET};
mod surface;
pub use surface::SurfaceHandle;
mod device;
pub use device::DeviceHandle;
mod swapchain;
pub use swapchain::SwapchainHandle;
mod image_view;
pub use image_view::ImageViewHandle;
mod shader_module;
pub use shader_module::ShaderModuleHandle;
mod render_pass;
pub use render_pass::RenderPassHandle;
mod pipeline_layout;
pub use pipeline_layout::PipelineLayoutHandle;
mod graphics_pipeline;
pub use graphics_pipeline::GraphicsPipelineHandle;
