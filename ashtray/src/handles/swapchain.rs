//! 参照カウンタで管理して、参照がすべて破棄された際に
//! Swapchainの破棄の処理まで行うSwapchainHandleを定義する。

use anyhow::{Context, Result};
use ash::vk;
use std::{fmt::Debug, ops::Deref, sync::Arc};

struct SwapchainHandleData {
    device: crate::DeviceHandle,
    // swapchainより先にsurfaceが破棄されないように保持する
    _surface: crate::SurfaceHandle,
    swapchain: vk::SwapchainKHR,
}
impl SwapchainHandleData {
    fn new(
        device: crate::DeviceHandle,
        surface: crate::SurfaceHandle,
        swapchain_create_info: &vk::SwapchainCreateInfoKHR,
    ) -> Result<Self> {
        // create swapchain
        let swapchain = unsafe {
            device
                .swapchain_loader()
                .create_swapchain(swapchain_create_info, None)
                .context("Failed to create swapchain")?
        };

        Ok(Self {
            device,
            _surface: surface,
            swapchain,
        })
    }
}
impl Drop for SwapchainHandleData {
    fn drop(&mut self) {
        unsafe {
            // swapchainの破棄
            self.device
                .swapchain_loader()
                .destroy_swapchain(self.swapchain, None);
        }
        log::debug!("Swapchain destroyed");
    }
}

/// vk::SwapchainKHRを参照カウントで管理するためのハンドル
#[derive(Clone)]
pub struct SwapchainHandle {
    data: Arc<SwapchainHandleData>,
}
impl SwapchainHandle {
    pub(crate) fn new(
        device_handle: crate::DeviceHandle,
        surface_handle: crate::SurfaceHandle,
        swapchain_create_info: &vk::SwapchainCreateInfoKHR,
    ) -> Result<Self> {
        let data = SwapchainHandleData::new(device_handle, surface_handle, swapchain_create_info)?;
        Ok(Self {
            data: Arc::new(data),
        })
    }
}

// Debugトレイトの実装
impl Debug for SwapchainHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapchainHandle").finish()
    }
}

// SwapchainHandleはvk::SwapchainKHRにDerefする
impl Deref for SwapchainHandle {
    type Target = vk::SwapchainKHR;
    fn deref(&self) -> &Self::Target {
        &self.data.swapchain
    }
}
