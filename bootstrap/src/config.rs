//! アプリケーションの設定。
//! ウィンドウの大きさやvalidation layer、拡張の一覧は定数ではなくここで渡す。

use anyhow::{Context, Result};
use ash::extensions::khr::Swapchain;
use std::{ffi::CString, path::PathBuf};

/// 標準のvalidation layer
pub const KHRONOS_VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// GraphicsContextの作成に必要な設定
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// ウィンドウのタイトル
    pub window_title: String,
    /// ウィンドウの幅
    pub width: u32,
    /// ウィンドウの高さ
    pub height: u32,
    /// VkApplicationInfoに渡すアプリケーション名
    pub application_name: String,
    /// VkApplicationInfoに渡すエンジン名
    pub engine_name: String,
    /// validation layerとdebug messengerを有効にするか
    pub enable_validation: bool,
    /// 有効にするvalidation layerの名前
    pub validation_layers: Vec<String>,
    /// windowに必要なもの以外に追加で有効にするinstance拡張
    pub instance_extensions: Vec<String>,
    /// physical deviceに要求するdevice拡張
    pub device_extensions: Vec<String>,
    /// vertex shaderのSPIR-Vのパス
    pub vertex_shader_path: PathBuf,
    /// fragment shaderのSPIR-Vのパス
    pub fragment_shader_path: PathBuf,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            window_title: "Schwag".to_string(),
            width: 800,
            height: 600,
            application_name: "Schwag".to_string(),
            engine_name: "No Engine".to_string(),
            enable_validation: cfg!(debug_assertions),
            validation_layers: vec![KHRONOS_VALIDATION_LAYER.to_string()],
            instance_extensions: vec![],
            device_extensions: vec![Swapchain::name().to_string_lossy().into_owned()],
            vertex_shader_path: PathBuf::from("shaders/vert.spv"),
            fragment_shader_path: PathBuf::from("shaders/frag.spv"),
        }
    }
}

fn to_c_strings(names: &[String]) -> Result<Vec<CString>> {
    names
        .iter()
        .map(|name| {
            CString::new(name.as_str()).with_context(|| format!("Invalid name: {:?}", name))
        })
        .collect()
}

impl BootstrapConfig {
    /// instanceの作成に使う記述
    pub fn instance_desc(&self) -> Result<ashtray::InstanceDesc> {
        Ok(ashtray::InstanceDesc {
            application_name: CString::new(self.application_name.as_str())?,
            engine_name: CString::new(self.engine_name.as_str())?,
            extensions: to_c_strings(&self.instance_extensions)?,
            validation_layers: to_c_strings(&self.validation_layers)?,
            enable_validation: self.enable_validation,
        })
    }

    /// 要求するdevice拡張。swapchainの拡張は常に含まれる。
    pub fn device_extensions(&self) -> Result<Vec<CString>> {
        Ok(ashtray::utils::get_required_device_extensions(
            &to_c_strings(&self.device_extensions)?,
        ))
    }

    /// deviceに設定するlayer。validationが無効なら空。
    pub fn device_layers(&self) -> Result<Vec<CString>> {
        if self.enable_validation {
            to_c_strings(&self.validation_layers)
        } else {
            Ok(vec![])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_open_an_800_by_600_window() {
        let config = BootstrapConfig::default();
        assert_eq!(config.window_title, "Schwag");
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.enable_validation, cfg!(debug_assertions));
        assert_eq!(config.vertex_shader_path, PathBuf::from("shaders/vert.spv"));
        assert_eq!(config.fragment_shader_path, PathBuf::from("shaders/frag.spv"));
    }

    #[test]
    fn swapchain_extension_is_always_required() {
        let config = BootstrapConfig {
            device_extensions: vec![],
            ..Default::default()
        };
        assert_eq!(
            config.device_extensions().unwrap(),
            vec![Swapchain::name().to_owned()]
        );

        let config = BootstrapConfig::default();
        assert_eq!(config.device_extensions().unwrap().len(), 1);
    }

    #[test]
    fn device_layers_follow_validation_flag() {
        let mut config = BootstrapConfig {
            enable_validation: true,
            ..Default::default()
        };
        assert_eq!(
            config.device_layers().unwrap(),
            vec![CString::new(KHRONOS_VALIDATION_LAYER).unwrap()]
        );
        config.enable_validation = false;
        assert!(config.device_layers().unwrap().is_empty());
    }

    #[test]
    fn instance_desc_carries_names_and_layers() {
        let config = BootstrapConfig {
            application_name: "Test App".to_string(),
            instance_extensions: vec!["VK_KHR_get_surface_capabilities2".to_string()],
            enable_validation: true,
            ..Default::default()
        };
        let desc = config.instance_desc().unwrap();
        assert_eq!(desc.application_name, CString::new("Test App").unwrap());
        assert_eq!(desc.extensions.len(), 1);
        assert!(desc.enable_validation);
        assert_eq!(desc.enabled_layers().len(), 1);
    }

    #[test]
    fn interior_nul_is_rejected() {
        let config = BootstrapConfig {
            validation_layers: vec!["bad\0layer".to_string()],
            ..Default::default()
        };
        assert!(config.instance_desc().is_err());
    }
}
