//! windowに描画するためのVulkanのオブジェクト一式を作成して保持するGraphicsContext。
//!
//! 作成はInstanceからPipelineまで一方向に進み、途中で失敗した場合は
//! それまでに作成したオブジェクトがdropされて破棄される。
//! GraphicsContextをdropすると作成と逆の順番で破棄される。

use crate::{BootstrapConfig, Driver};
use anyhow::{Context as _, Result};
use ash::vk;
use ashtray::utils::{self, PhysicalDeviceInfo, QueueHandle, QueueHandles, SwapchainDesc};

// 作成と逆の順番で破棄するためのimage viewのリスト
struct ImageViews<V>(Vec<V>);
impl<V> Drop for ImageViews<V> {
    fn drop(&mut self) {
        while self.0.pop().is_some() {}
    }
}

/// 作成済みのVulkanのオブジェクト一式
pub struct GraphicsContext<D: Driver> {
    // フィールドはdropされる順番に並べている
    pipeline: D::Pipeline,
    pipeline_layout: D::PipelineLayout,
    render_pass: D::RenderPass,
    image_views: ImageViews<D::ImageView>,
    swapchain_images: Vec<vk::Image>,
    swapchain_format: vk::Format,
    swapchain_extent: vk::Extent2D,
    swapchain: D::Swapchain,
    queues: QueueHandles,
    device: D::Device,
    physical_device: PhysicalDeviceInfo,
    surface: D::Surface,
    instance: D::Instance,
}

impl<D: Driver> GraphicsContext<D> {
    /// InstanceからGraphics Pipelineまでを順番に作成する
    pub fn new(
        driver: &D,
        config: &BootstrapConfig,
        framebuffer_size: vk::Extent2D,
    ) -> Result<Self> {
        log::info!("Creating instance");
        let instance = driver.create_instance(&config.instance_desc()?)?;

        let surface = driver.create_surface(&instance)?;

        log::info!("Selecting physical device");
        let device_extensions = config.device_extensions()?;
        log::debug!("Required device extensions: {:?}", device_extensions);
        let physical_devices = driver.physical_devices(&instance, &surface)?;
        let physical_device =
            utils::select_physical_device(&physical_devices, &device_extensions)?.clone();
        let queue_indices = utils::find_queue_families(&physical_device.queue_families)
            .complete()
            .context("Failed to find graphics and present queue families")?;

        log::info!("Creating logical device");
        let device = driver.create_device(
            &instance,
            &physical_device,
            &queue_indices,
            &device_extensions,
            &config.device_layers()?,
        )?;
        let queues = QueueHandles {
            graphics: QueueHandle {
                queue: driver.get_device_queue(&device, queue_indices.graphics_index),
                family_index: queue_indices.graphics_index,
                index: 0,
            },
            present: QueueHandle {
                queue: driver.get_device_queue(&device, queue_indices.present_index),
                family_index: queue_indices.present_index,
                index: 0,
            },
        };

        log::info!("Creating swapchain");
        let swapchain_desc = SwapchainDesc::negotiate(
            &physical_device.swapchain_support,
            &queue_indices,
            framebuffer_size,
        )?;
        let swapchain = driver.create_swapchain(&device, &surface, &swapchain_desc)?;
        let swapchain_images = driver.get_swapchain_images(&device, &swapchain)?;
        utils::validate_swapchain_images(&swapchain_images)?;
        let swapchain_format = swapchain_desc.surface_format.format;

        let mut image_views = ImageViews(Vec::with_capacity(swapchain_images.len()));
        for &image in swapchain_images.iter() {
            image_views.0.push(driver.create_image_view(
                &device,
                &swapchain,
                image,
                swapchain_format,
            )?);
        }
        log::debug!("Created {} swapchain image views", image_views.0.len());

        log::info!("Creating render pass and graphics pipeline");
        let render_pass = driver.create_render_pass(&device, swapchain_format)?;
        let (pipeline_layout, pipeline) =
            create_pipeline(driver, &device, &render_pass, config)?;

        log::info!("Graphics context initialized");
        Ok(Self {
            pipeline,
            pipeline_layout,
            render_pass,
            image_views,
            swapchain_images,
            swapchain_format,
            swapchain_extent: swapchain_desc.extent,
            swapchain,
            queues,
            device,
            physical_device,
            surface,
            instance,
        })
    }

    pub fn instance(&self) -> &D::Instance {
        &self.instance
    }

    pub fn surface(&self) -> &D::Surface {
        &self.surface
    }

    /// 選択されたphysical device
    pub fn physical_device(&self) -> &PhysicalDeviceInfo {
        &self.physical_device
    }

    pub fn device(&self) -> &D::Device {
        &self.device
    }

    pub fn queues(&self) -> &QueueHandles {
        &self.queues
    }

    pub fn swapchain(&self) -> &D::Swapchain {
        &self.swapchain
    }

    /// swapchainのimage。presentation engineが所有している。
    pub fn swapchain_images(&self) -> &[vk::Image] {
        &self.swapchain_images
    }

    pub fn swapchain_format(&self) -> vk::Format {
        self.swapchain_format
    }

    pub fn swapchain_extent(&self) -> vk::Extent2D {
        self.swapchain_extent
    }

    /// swapchainのimageと同じ順番のimage view
    pub fn image_views(&self) -> &[D::ImageView] {
        &self.image_views.0
    }

    pub fn render_pass(&self) -> &D::RenderPass {
        &self.render_pass
    }

    pub fn pipeline_layout(&self) -> &D::PipelineLayout {
        &self.pipeline_layout
    }

    pub fn pipeline(&self) -> &D::Pipeline {
        &self.pipeline
    }
}

impl<D: Driver> Drop for GraphicsContext<D> {
    fn drop(&mut self) {
        log::info!("Destroying graphics context");
    }
}

// shader moduleはpipelineの作成後すぐに破棄される
fn create_pipeline<D: Driver>(
    driver: &D,
    device: &D::Device,
    render_pass: &D::RenderPass,
    config: &BootstrapConfig,
) -> Result<(D::PipelineLayout, D::Pipeline)> {
    let vertex_code = utils::read_spirv_file(&config.vertex_shader_path)?;
    let fragment_code = utils::read_spirv_file(&config.fragment_shader_path)?;

    let vertex_shader = driver.create_shader_module(device, &vertex_code)?;
    let fragment_shader = driver.create_shader_module(device, &fragment_code)?;
    let pipeline_layout = driver.create_pipeline_layout(device)?;
    let pipeline = driver.create_graphics_pipeline(
        device,
        &pipeline_layout,
        render_pass,
        &vertex_shader,
        &fragment_shader,
    )?;

    Ok((pipeline_layout, pipeline))
}
