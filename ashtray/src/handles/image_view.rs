//! 参照カウンタで管理して、参照がすべて破棄された際に
//! ImageViewの破棄の処理まで行うImageViewHandleを定義する。

use anyhow::{Context, Result};
use ash::vk;
use std::{fmt::Debug, ops::Deref, sync::Arc};

struct ImageViewHandleData {
    device: crate::DeviceHandle,
    // imageの持ち主のswapchainを保持する
    _swapchain: crate::SwapchainHandle,
    image_view: vk::ImageView,
}
impl ImageViewHandleData {
    fn new(
        device: crate::DeviceHandle,
        swapchain: crate::SwapchainHandle,
        image_view_create_info: &vk::ImageViewCreateInfo,
    ) -> Result<Self> {
        // create image view
        let image_view = unsafe {
            ash::Device::create_image_view(&device, image_view_create_info, None)
                .context("Failed to create image view")?
        };

        Ok(Self {
            device,
            _swapchain: swapchain,
            image_view,
        })
    }
}
impl Drop for ImageViewHandleData {
    fn drop(&mut self) {
        unsafe {
            // image viewの破棄
            self.device.destroy_image_view(self.image_view, None);
        }
    }
}

/// vk::ImageViewを参照カウントで管理するためのハンドル
#[derive(Clone)]
pub struct ImageViewHandle {
    data: Arc<ImageViewHandleData>,
}
impl ImageViewHandle {
    pub(crate) fn new(
        device_handle: crate::DeviceHandle,
        swapchain_handle: crate::SwapchainHandle,
        image_view_create_info: &vk::ImageViewCreateInfo,
    ) -> Result<Self> {
        let data =
            ImageViewHandleData::new(device_handle, swapchain_handle, image_view_create_info)?;
        Ok(Self {
            data: Arc::new(data),
        })
    }
}

// Debugトレイトの実装
impl Debug for ImageViewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageViewHandle").finish()
    }
}

// ImageViewHandleはvk::ImageViewにDerefする
impl Deref for ImageViewHandle {
    type Target = vk::ImageView;
    fn deref(&self) -> &Self::Target {
        &self.data.image_view
    }
}
