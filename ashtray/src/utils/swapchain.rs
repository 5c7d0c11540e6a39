use anyhow::{bail, Context, Result};
use ash::vk;

/// 優先して選ぶsurfaceのformat
pub const PREFERRED_SURFACE_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_SRGB,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

/// surfaceに対するswapchainのサポート状況
#[derive(Debug, Clone, Default)]
pub struct SwapchainSupport {
    /// surfaceのcapabilities
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// サポートされているformatの一覧
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// サポートされているpresent modeの一覧
    pub present_modes: Vec<vk::PresentModeKHR>,
}
impl SwapchainSupport {
    /// formatとpresent modeが最低1つずつあればswapchainを作成できる
    pub fn is_complete(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// physical deviceのsurfaceに対するswapchainのサポート状況を取得する関数
pub fn query_swapchain_support(
    surface: &crate::SurfaceHandle,
    physical_device: vk::PhysicalDevice,
) -> Result<SwapchainSupport> {
    Ok(SwapchainSupport {
        capabilities: surface.get_physical_device_surface_capabilities(physical_device)?,
        formats: surface.get_physical_device_surface_formats(physical_device)?,
        present_modes: surface.get_physical_device_surface_present_modes(physical_device)?,
    })
}

/// B8G8R8A8_SRGBかつSRGB_NONLINEARのformatがあればそれを選ぶ。
/// なければ最初のformatを選ぶ。
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Result<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|format| {
            format.format == PREFERRED_SURFACE_FORMAT.format
                && format.color_space == PREFERRED_SURFACE_FORMAT.color_space
        })
        .or_else(|| formats.first())
        .copied()
        .context("No surface formats available")
}

/// MAILBOXがあればそれを選び、なければFIFOを選ぶ。
/// FIFOはすべての実装でサポートされている。
pub fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// swapchainのextentを決める関数。
/// current_extentの幅がu32::MAXの場合はsurfaceの大きさをswapchain側で決められるので、
/// framebufferの大きさを許される範囲に収めて使う。
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    framebuffer_size: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    let min = capabilities.min_image_extent;
    let max = capabilities.max_image_extent;
    vk::Extent2D {
        width: framebuffer_size.width.max(min.width).min(max.width),
        height: framebuffer_size.height.max(min.height).min(max.height),
    }
}

/// 最小枚数より1枚多くする。max_image_countが0の場合は上限なし。
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let image_count = capabilities.min_image_count.saturating_add(1);
    if capabilities.max_image_count > 0 && image_count > capabilities.max_image_count {
        capabilities.max_image_count
    } else {
        image_count
    }
}

/// swapchainの作成に必要なパラメータ
#[derive(Debug, Clone)]
pub struct SwapchainDesc {
    /// imageのformat
    pub surface_format: vk::SurfaceFormatKHR,
    /// present mode
    pub present_mode: vk::PresentModeKHR,
    /// imageの大きさ
    pub extent: vk::Extent2D,
    /// 要求するimageの枚数
    pub image_count: u32,
    /// surfaceのcurrent_transform
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    /// graphicsとpresentのQueueFamilyが違う場合は両方のindexが入る
    pub queue_family_indices: Vec<u32>,
}
impl SwapchainDesc {
    /// サポート状況とframebufferの大きさからswapchainのパラメータを決める
    pub fn negotiate(
        support: &SwapchainSupport,
        queue_indices: &crate::utils::QueueIndices,
        framebuffer_size: vk::Extent2D,
    ) -> Result<Self> {
        let surface_format = choose_surface_format(&support.formats)?;
        let present_mode = choose_present_mode(&support.present_modes);
        let extent = choose_extent(&support.capabilities, framebuffer_size);
        let image_count = choose_image_count(&support.capabilities);

        let queue_family_indices = if queue_indices.graphics_index != queue_indices.present_index
        {
            vec![queue_indices.graphics_index, queue_indices.present_index]
        } else {
            vec![]
        };

        log::debug!(
            "Swapchain: {:?} {:?} {}x{} images: {}",
            surface_format.format,
            present_mode,
            extent.width,
            extent.height,
            image_count
        );

        Ok(Self {
            surface_format,
            present_mode,
            extent,
            image_count,
            pre_transform: support.capabilities.current_transform,
            queue_family_indices,
        })
    }

    /// QueueFamilyが分かれている場合はCONCURRENTで共有する
    pub fn sharing_mode(&self) -> vk::SharingMode {
        if self.queue_family_indices.is_empty() {
            vk::SharingMode::EXCLUSIVE
        } else {
            vk::SharingMode::CONCURRENT
        }
    }
}

/// swapchainを作成する関数
pub fn create_swapchain(
    device: &crate::DeviceHandle,
    surface: &crate::SurfaceHandle,
    desc: &SwapchainDesc,
) -> Result<crate::SwapchainHandle> {
    let swapchain_create_info = vk::SwapchainCreateInfoKHR::builder()
        .surface(**surface)
        .min_image_count(desc.image_count)
        .image_format(desc.surface_format.format)
        .image_color_space(desc.surface_format.color_space)
        .image_extent(desc.extent)
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(desc.sharing_mode())
        .queue_family_indices(&desc.queue_family_indices)
        .pre_transform(desc.pre_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(desc.present_mode)
        .clipped(true)
        .old_swapchain(vk::SwapchainKHR::null());

    device.create_swapchain(surface, &swapchain_create_info)
}

/// swapchainから取得したimageが使えるか確認する関数
pub fn validate_swapchain_images(images: &[vk::Image]) -> Result<()> {
    if images.is_empty() {
        bail!("Swapchain returned no images");
    }
    if images.iter().any(|image| *image == vk::Image::null()) {
        bail!("Swapchain returned a null image");
    }
    Ok(())
}

/// swapchainのimageに対するimage viewのcreate info
pub fn swapchain_image_view_create_info(
    image: vk::Image,
    format: vk::Format,
) -> vk::ImageViewCreateInfo {
    vk::ImageViewCreateInfo::builder()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(
            vk::ImageSubresourceRange::builder()
                .aspect_mask(vk::ImageAspectFlags::COLOR)
                .base_mip_level(0)
                .level_count(1)
                .base_array_layer(0)
                .layer_count(1)
                .build(),
        )
        .build()
}

/// swapchainのimageに対するimage viewを作成する関数
pub fn create_swapchain_image_view(
    device: &crate::DeviceHandle,
    swapchain: &crate::SwapchainHandle,
    image: vk::Image,
    format: vk::Format,
) -> Result<crate::ImageViewHandle> {
    let create_info = swapchain_image_view_create_info(image, format);
    device.create_image_view(swapchain, &create_info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::QueueIndices;
    use ash::vk::Handle;

    fn format(format: vk::Format, color_space: vk::ColorSpaceKHR) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space,
        }
    }

    fn capabilities(
        current: (u32, u32),
        min: (u32, u32),
        max: (u32, u32),
    ) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            current_extent: vk::Extent2D {
                width: current.0,
                height: current.1,
            },
            min_image_extent: vk::Extent2D {
                width: min.0,
                height: min.1,
            },
            max_image_extent: vk::Extent2D {
                width: max.0,
                height: max.1,
            },
            current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
            ..Default::default()
        }
    }

    #[test]
    fn preferred_surface_format_is_chosen_when_present() {
        let formats = [
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn first_surface_format_is_the_fallback() {
        let formats = [
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::DISPLAY_P3_NONLINEAR_EXT),
        ];
        let chosen = choose_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::R8G8B8A8_UNORM);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn empty_surface_formats_are_an_error() {
        let err = choose_surface_format(&[]).unwrap_err();
        assert_eq!(err.to_string(), "No surface formats available");
    }

    #[test]
    fn mailbox_is_preferred_over_fifo() {
        assert_eq!(
            choose_present_mode(&[vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX]),
            vk::PresentModeKHR::MAILBOX
        );
        assert_eq!(
            choose_present_mode(&[vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::FIFO]),
            vk::PresentModeKHR::FIFO
        );
        assert_eq!(choose_present_mode(&[]), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn current_extent_is_used_when_fixed() {
        let caps = capabilities((1024, 768), (1, 1), (4096, 4096));
        let extent = choose_extent(
            &caps,
            vk::Extent2D {
                width: 800,
                height: 600,
            },
        );
        assert_eq!((extent.width, extent.height), (1024, 768));
    }

    #[test]
    fn framebuffer_size_is_clamped_when_extent_is_free() {
        let caps = capabilities((u32::MAX, u32::MAX), (100, 100), (4096, 4096));
        let inside = vk::Extent2D {
            width: 800,
            height: 600,
        };
        let extent = choose_extent(&caps, inside);
        assert_eq!((extent.width, extent.height), (800, 600));

        let too_large = vk::Extent2D {
            width: 8000,
            height: 50,
        };
        let extent = choose_extent(&caps, too_large);
        assert_eq!((extent.width, extent.height), (4096, 100));
    }

    #[test]
    fn image_count_is_one_more_than_minimum() {
        let mut caps = capabilities((800, 600), (1, 1), (800, 600));
        assert_eq!(choose_image_count(&caps), 3);

        caps.max_image_count = 3;
        assert_eq!(choose_image_count(&caps), 3);

        caps.max_image_count = 2;
        assert_eq!(choose_image_count(&caps), 2);
    }

    #[test]
    fn image_count_does_not_overflow() {
        let mut caps = capabilities((800, 600), (1, 1), (800, 600));
        caps.min_image_count = u32::MAX;
        assert_eq!(choose_image_count(&caps), u32::MAX);

        caps.max_image_count = 4;
        assert_eq!(choose_image_count(&caps), 4);
    }

    #[test]
    fn shared_queue_family_uses_exclusive_mode() {
        let support = SwapchainSupport {
            capabilities: capabilities((800, 600), (1, 1), (800, 600)),
            formats: vec![PREFERRED_SURFACE_FORMAT],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        let indices = QueueIndices {
            graphics_index: 0,
            present_index: 0,
        };
        let desc = SwapchainDesc::negotiate(
            &support,
            &indices,
            vk::Extent2D {
                width: 800,
                height: 600,
            },
        )
        .unwrap();
        assert_eq!(desc.sharing_mode(), vk::SharingMode::EXCLUSIVE);
        assert!(desc.queue_family_indices.is_empty());
        assert_eq!(desc.pre_transform, vk::SurfaceTransformFlagsKHR::IDENTITY);
        assert_eq!(desc.image_count, 3);
    }

    #[test]
    fn separate_queue_families_use_concurrent_mode() {
        let support = SwapchainSupport {
            capabilities: capabilities((800, 600), (1, 1), (800, 600)),
            formats: vec![PREFERRED_SURFACE_FORMAT],
            present_modes: vec![vk::PresentModeKHR::MAILBOX],
        };
        let indices = QueueIndices {
            graphics_index: 0,
            present_index: 2,
        };
        let desc = SwapchainDesc::negotiate(
            &support,
            &indices,
            vk::Extent2D {
                width: 800,
                height: 600,
            },
        )
        .unwrap();
        assert_eq!(desc.sharing_mode(), vk::SharingMode::CONCURRENT);
        assert_eq!(desc.queue_family_indices, vec![0, 2]);
        assert_eq!(desc.present_mode, vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn negotiation_fails_without_formats() {
        let support = SwapchainSupport {
            capabilities: capabilities((800, 600), (1, 1), (800, 600)),
            formats: vec![],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        let indices = QueueIndices {
            graphics_index: 0,
            present_index: 0,
        };
        assert!(SwapchainDesc::negotiate(&support, &indices, vk::Extent2D::default()).is_err());
    }

    #[test]
    fn swapchain_support_needs_formats_and_present_modes() {
        let mut support = SwapchainSupport {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![PREFERRED_SURFACE_FORMAT],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(support.is_complete());
        support.present_modes.clear();
        assert!(!support.is_complete());
        support.present_modes.push(vk::PresentModeKHR::FIFO);
        support.formats.clear();
        assert!(!support.is_complete());
    }

    #[test]
    fn swapchain_images_must_be_present_and_non_null() {
        let images = [vk::Image::from_raw(1), vk::Image::from_raw(2)];
        assert!(validate_swapchain_images(&images).is_ok());
        assert_eq!(
            validate_swapchain_images(&[]).unwrap_err().to_string(),
            "Swapchain returned no images"
        );
        assert_eq!(
            validate_swapchain_images(&[vk::Image::from_raw(1), vk::Image::null()])
                .unwrap_err()
                .to_string(),
            "Swapchain returned a null image"
        );
    }

    #[test]
    fn image_view_covers_one_color_layer() {
        let info =
            swapchain_image_view_create_info(vk::Image::from_raw(7), vk::Format::B8G8R8A8_SRGB);
        assert_eq!(info.image, vk::Image::from_raw(7));
        assert_eq!(info.view_type, vk::ImageViewType::TYPE_2D);
        assert_eq!(info.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(info.components.r, vk::ComponentSwizzle::IDENTITY);
        assert_eq!(info.components.a, vk::ComponentSwizzle::IDENTITY);
        assert_eq!(info.subresource_range.aspect_mask, vk::ImageAspectFlags::COLOR);
        assert_eq!(info.subresource_range.level_count, 1);
        assert_eq!(info.subresource_range.layer_count, 1);
    }
}
