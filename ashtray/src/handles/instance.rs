//! 参照カウンタで管理して、参照がすべて破棄された際に
//! Instanceの破棄の処理まで行うInstanceHandleを定義する。

use anyhow::{bail, Context, Result};
use ash::{extensions::ext::DebugUtils, vk};
use std::{
    ffi::{CStr, CString},
    fmt::Debug,
    ops::Deref,
    sync::Arc,
};

/// debug utilsのメッセージを出力する際のlogのtarget
pub const VULKAN_LOG_TARGET: &str = "vulkan";

// debug utilsのseverityをlogのLevelに対応させる
fn severity_to_level(message_severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> log::Level {
    if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::Level::Error
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        log::Level::Warn
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        log::Level::Info
    } else {
        log::Level::Trace
    }
}

// debug utilsのmessage typeを表示用の文字列にする
fn message_type_label(message_types: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    match message_types {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL => "[GENERAL]",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "[PERFORMANCE]",
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "[VALIDATION]",
        _ => "[UNKNOWN]",
    }
}

// debug utilsのコールバック関数
// メッセージはすべてlogに流す。Vulkanの呼び出しは中断させない。
unsafe extern "system" fn vulkan_debug_utils_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_types: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let message = if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
        std::borrow::Cow::Borrowed("")
    } else {
        CStr::from_ptr((*p_callback_data).p_message).to_string_lossy()
    };
    log::log!(
        target: VULKAN_LOG_TARGET,
        severity_to_level(message_severity),
        "{}{}",
        message_type_label(message_types),
        message
    );

    vk::FALSE
}

// debug messengerの作成情報。
// instanceの作成時のpush_nextとdebug messengerの作成の両方で使う。
fn debug_utils_messenger_create_info() -> vk::DebugUtilsMessengerCreateInfoEXT {
    vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .flags(vk::DebugUtilsMessengerCreateFlagsEXT::empty())
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(vulkan_debug_utils_callback))
        .build()
}

// 要求されたlayerのうち、利用可能なlayerに含まれていないものを返す
fn missing_layers<'a>(available: &[CString], requested: &'a [CString]) -> Vec<&'a CStr> {
    requested
        .iter()
        .filter(|layer| !available.contains(layer))
        .map(|layer| layer.as_c_str())
        .collect()
}

// windowの要求するextensionに、追加のextensionとdebug utilsを足したリストを作る
fn required_instance_extensions(window_extensions: &[&CStr], desc: &InstanceDesc) -> Vec<CString> {
    let mut extensions: Vec<CString> = window_extensions.iter().map(|&e| e.to_owned()).collect();
    extensions.extend(desc.extensions.iter().cloned());
    if desc.enable_validation {
        extensions.push(DebugUtils::name().to_owned());
    }
    let mut unique = Vec::with_capacity(extensions.len());
    for extension in extensions {
        if !unique.contains(&extension) {
            unique.push(extension);
        }
    }
    unique
}

/// Instanceの作成に必要な情報
#[derive(Debug, Clone, Default)]
pub struct InstanceDesc {
    /// アプリケーション名
    pub application_name: CString,
    /// エンジン名
    pub engine_name: CString,
    /// windowの要求するもの以外に有効にするinstance extension
    pub extensions: Vec<CString>,
    /// validationが有効なときに有効にするlayer
    pub validation_layers: Vec<CString>,
    /// validation layerとdebug messengerを有効にするか
    pub enable_validation: bool,
}
impl InstanceDesc {
    /// 実際に有効にするlayerのリスト。validationが無効なら空になる。
    pub fn enabled_layers(&self) -> &[CString] {
        if self.enable_validation {
            &self.validation_layers
        } else {
            &[]
        }
    }
}

// VK_EXT_debug_utilsのloaderとmessenger。
// loaderの関数ポインタはinstance作成時に一度だけ読み込み、instanceと一緒に保持する。
struct DebugMessenger {
    loader: DebugUtils,
    messenger: vk::DebugUtilsMessengerEXT,
}
impl DebugMessenger {
    fn new(entry: &ash::Entry, instance: &ash::Instance) -> Result<Self> {
        let loader = DebugUtils::new(entry, instance);
        let messenger = unsafe {
            loader
                .create_debug_utils_messenger(&debug_utils_messenger_create_info(), None)
                .context("Failed to setup debug messenger")?
        };
        Ok(Self { loader, messenger })
    }
}
impl Debug for DebugMessenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugMessenger").finish()
    }
}

struct InstanceHandleData {
    entry: ash::Entry,
    instance: ash::Instance,
    debug_messenger: Option<DebugMessenger>,
}
impl InstanceHandleData {
    fn new(
        raw_display_handle: raw_window_handle::RawDisplayHandle,
        desc: &InstanceDesc,
    ) -> Result<Self> {
        let entry = unsafe { ash::Entry::load().context("Failed to load Vulkan library")? };

        // validation layerの確認
        if desc.enable_validation {
            let available = unsafe { entry.enumerate_instance_layer_properties()? }
                .iter()
                .map(|layer| unsafe { CStr::from_ptr(layer.layer_name.as_ptr()).to_owned() })
                .collect::<Vec<_>>();
            let missing = missing_layers(&available, &desc.validation_layers);
            if !missing.is_empty() {
                bail!(
                    "Validation layers requested, but not available: {:?}",
                    missing
                );
            }
        }

        // extensionの一覧
        let window_extensions = ash_window::enumerate_required_extensions(raw_display_handle)
            .context("Failed to query required window extensions")?
            .iter()
            .map(|&extension| unsafe { CStr::from_ptr(extension) })
            .collect::<Vec<_>>();
        let extensions = required_instance_extensions(&window_extensions, desc);
        log::info!("Instance extension count: {}", extensions.len());
        for extension in extensions.iter() {
            log::info!("Instance extension: {:?}", extension);
        }
        let extension_names = extensions.iter().map(|e| e.as_ptr()).collect::<Vec<_>>();
        let layer_names = desc
            .enabled_layers()
            .iter()
            .map(|l| l.as_ptr())
            .collect::<Vec<_>>();

        // instanceの作成
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&desc.application_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(&desc.engine_name)
            .engine_version(vk::make_api_version(0, 1, 0, 0))
            .api_version(vk::API_VERSION_1_0);
        let mut debug_utils_messenger_create_info = debug_utils_messenger_create_info();
        let instance_create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_names)
            .enabled_layer_names(&layer_names);
        // instanceの作成中のメッセージも拾うためにpush_nextする
        let instance_create_info = if desc.enable_validation {
            instance_create_info.push_next(&mut debug_utils_messenger_create_info)
        } else {
            instance_create_info
        };
        let instance = unsafe {
            entry
                .create_instance(&instance_create_info, None)
                .context("Failed to create instance")?
        };

        // ここから先で失敗した場合はdropでinstanceが破棄される
        let mut data = Self {
            entry,
            instance,
            debug_messenger: None,
        };

        // setup debug utils
        if desc.enable_validation {
            data.debug_messenger = Some(DebugMessenger::new(&data.entry, &data.instance)?);
        }

        Ok(data)
    }
}
impl Drop for InstanceHandleData {
    fn drop(&mut self) {
        unsafe {
            // debug utilsの破棄
            if let Some(debug_messenger) = self.debug_messenger.take() {
                debug_messenger
                    .loader
                    .destroy_debug_utils_messenger(debug_messenger.messenger, None);
            }

            // instanceの破棄
            self.instance.destroy_instance(None);
        }
        log::debug!("Instance destroyed");
    }
}

/// ash::Instanceを参照カウントで管理するためのハンドル
#[derive(Clone)]
pub struct InstanceHandle {
    data: Arc<InstanceHandleData>,
}
impl InstanceHandle {
    /// Instanceを作成する。
    /// validationが有効な場合はdebug messengerも作成する。
    pub fn new(
        raw_display_handle: raw_window_handle::RawDisplayHandle,
        desc: &InstanceDesc,
    ) -> Result<Self> {
        let data = InstanceHandleData::new(raw_display_handle, desc)?;
        Ok(Self {
            data: Arc::new(data),
        })
    }

    // create系

    /// windowのSurfaceを作成する
    pub fn create_surface(
        &self,
        raw_display_handle: raw_window_handle::RawDisplayHandle,
        raw_window_handle: raw_window_handle::RawWindowHandle,
    ) -> Result<crate::SurfaceHandle> {
        crate::SurfaceHandle::new(self.clone(), raw_display_handle, raw_window_handle)
    }

    /// Deviceを作成する
    pub fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        device_create_info: &vk::DeviceCreateInfo,
    ) -> Result<crate::DeviceHandle> {
        crate::DeviceHandle::new(self.clone(), physical_device, device_create_info)
    }

    // instanceの各関数

    /// PhysicalDeviceを列挙する
    pub fn enumerate_physical_devices(&self) -> Result<Vec<vk::PhysicalDevice>> {
        let physical_devices = unsafe {
            self.data
                .instance
                .enumerate_physical_devices()
                .context("Failed to enumerate physical devices")?
        };
        Ok(physical_devices)
    }

    /// PhysicalDeviceのQueueFamilyのプロパティを取得する
    pub fn get_physical_device_queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties> {
        unsafe {
            self.data
                .instance
                .get_physical_device_queue_family_properties(physical_device)
        }
    }

    // raw

    /// ash::Entryを取得する
    pub fn entry(&self) -> &ash::Entry {
        &self.data.entry
    }
}

// Debugトレイトの実装
impl Debug for InstanceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceHandle")
            .field("debug_messenger", &self.data.debug_messenger)
            .finish()
    }
}

// InstanceHandleはash::InstanceにDerefする
impl Deref for InstanceHandle {
    type Target = ash::Instance;
    fn deref(&self) -> &Self::Target {
        &self.data.instance
    }
}
