//! 参照カウンタで管理して、参照がすべて破棄された際に
//! Surfaceの破棄の処理まで行うSurfaceHandleを定義する。

use anyhow::{Context, Result};
use ash::{extensions::khr::Surface, vk};
use std::{fmt::Debug, ops::Deref, sync::Arc};

struct SurfaceHandleData {
    // surfaceより先にinstanceが破棄されないように保持する
    _instance: crate::InstanceHandle,
    surface_loader: Surface,
    surface: vk::SurfaceKHR,
}
impl SurfaceHandleData {
    fn new(
        instance_handle: crate::InstanceHandle,
        raw_display_handle: raw_window_handle::RawDisplayHandle,
        raw_window_handle: raw_window_handle::RawWindowHandle,
    ) -> Result<Self> {
        // surfaceの作成
        let (surface_loader, surface) = unsafe {
            let surface_loader = Surface::new(instance_handle.entry(), &instance_handle);
            let surface = ash_window::create_surface(
                instance_handle.entry(),
                &instance_handle,
                raw_display_handle,
                raw_window_handle,
                None,
            )
            .context("Failed to create window surface")?;
            (surface_loader, surface)
        };

        Ok(Self {
            _instance: instance_handle,
            surface_loader,
            surface,
        })
    }
}
impl Drop for SurfaceHandleData {
    fn drop(&mut self) {
        unsafe {
            // Surfaceの破棄
            self.surface_loader.destroy_surface(self.surface, None);
        }
        log::debug!("Surface destroyed");
    }
}

/// vk::SurfaceKHRを参照カウントで管理するためのハンドル
#[derive(Clone)]
pub struct SurfaceHandle {
    data: Arc<SurfaceHandleData>,
}
impl SurfaceHandle {
    pub(crate) fn new(
        instance_handle: crate::InstanceHandle,
        raw_display_handle: raw_window_handle::RawDisplayHandle,
        raw_window_handle: raw_window_handle::RawWindowHandle,
    ) -> Result<Self> {
        let data = SurfaceHandleData::new(instance_handle, raw_display_handle, raw_window_handle)?;
        Ok(Self {
            data: Arc::new(data),
        })
    }

    // surfaceの関数

    /// PhysicalDeviceのQueueFamilyがSurfaceへのpresentをサポートしているか確認する
    pub fn get_physical_device_surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
    ) -> Result<bool> {
        let supported = unsafe {
            self.data
                .surface_loader
                .get_physical_device_surface_support(
                    physical_device,
                    queue_family_index,
                    self.data.surface,
                )
                .context("Failed to get physical device surface support")?
        };
        Ok(supported)
    }

    /// PhysicalDeviceのSurfaceのCapabilitiesを取得する
    pub fn get_physical_device_surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<vk::SurfaceCapabilitiesKHR> {
        let capabilities = unsafe {
            self.data
                .surface_loader
                .get_physical_device_surface_capabilities(physical_device, self.data.surface)
                .context("Failed to get physical device surface capabilities")?
        };
        Ok(capabilities)
    }

    /// PhysicalDeviceのSurfaceのFormatsを取得する
    pub fn get_physical_device_surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::SurfaceFormatKHR>> {
        let formats = unsafe {
            self.data
                .surface_loader
                .get_physical_device_surface_formats(physical_device, self.data.surface)
                .context("Failed to get physical device surface formats")?
        };
        Ok(formats)
    }

    /// PhysicalDeviceのSurfaceのPresentModesを取得する
    pub fn get_physical_device_surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::PresentModeKHR>> {
        let present_modes = unsafe {
            self.data
                .surface_loader
                .get_physical_device_surface_present_modes(physical_device, self.data.surface)
                .context("Failed to get physical device surface present modes")?
        };
        Ok(present_modes)
    }
}

// Debugトレイトの実装
impl Debug for SurfaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceHandle").finish()
    }
}

// SurfaceHandleはvk::SurfaceKHRにDerefする
impl Deref for SurfaceHandle {
    type Target = vk::SurfaceKHR;
    fn deref(&self) -> &Self::Target {
        &self.data.surface
    }
}
