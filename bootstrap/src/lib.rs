//! windowを開いて、Vulkanで描画を始めるまでに必要なオブジェクト一式を作成するライブラリ。
//!
//! Instance → Surface → PhysicalDevice → Device → Swapchain → ImageView → RenderPass → Pipeline
//! の順に作成し、破棄はその逆順に行う。
//! GPU APIの呼び出しは`Driver`トレイト越しに行うので、GraphicsContextはVulkanなしでもテストできる。

pub mod app;
pub mod config;
pub mod context;
pub mod driver;
pub mod logging;
pub mod vulkan;

pub use config::BootstrapConfig;
pub use context::GraphicsContext;
pub use driver::Driver;
pub use logging::{init_logging, LoggingConfig};
pub use vulkan::VulkanDriver;
