use anyhow::{bail, Result};
use ash::{extensions::khr::Swapchain, vk};
use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    ffi::{CStr, CString},
};

/// discrete GPUに加算されるスコア
pub const DISCRETE_GPU_BONUS: u32 = 1000;

/// 必要なdevice拡張のリストを取得する関数。
/// swapchainの拡張は常に含まれる。
pub fn get_required_device_extensions(required_device_extensions: &[CString]) -> Vec<CString> {
    let mut extensions = vec![Swapchain::name().to_owned()];
    for extension in required_device_extensions {
        if !extensions.contains(extension) {
            extensions.push(extension.to_owned());
        }
    }
    extensions
}

/// QueueFamilyの情報
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueFamilyInfo {
    /// QueueFamilyのサポートするQueueの種類
    pub queue_flags: vk::QueueFlags,
    /// Surfaceへのpresentをサポートしているか
    pub present_support: bool,
}

/// physical deviceの選択に使う情報をまとめた構造体
#[derive(Debug, Clone)]
pub struct PhysicalDeviceInfo {
    /// 対象のphysical device
    pub physical_device: vk::PhysicalDevice,
    /// デバイス名
    pub name: String,
    /// デバイスの種類
    pub device_type: vk::PhysicalDeviceType,
    /// 2D imageの最大サイズ
    pub max_image_dimension_2d: u32,
    /// geometry shaderをサポートしているか
    pub geometry_shader: bool,
    /// QueueFamilyの一覧
    pub queue_families: Vec<QueueFamilyInfo>,
    /// サポートしているdevice拡張の名前
    pub extensions: Vec<CString>,
    /// surfaceに対するswapchainのサポート状況
    pub swapchain_support: crate::utils::SwapchainSupport,
}

/// physical deviceの情報を取得する関数
pub fn query_physical_device(
    instance: &crate::InstanceHandle,
    surface: &crate::SurfaceHandle,
    physical_device: vk::PhysicalDevice,
) -> Result<PhysicalDeviceInfo> {
    let properties = unsafe { instance.get_physical_device_properties(physical_device) };
    let features = unsafe { instance.get_physical_device_features(physical_device) };
    let name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
        .to_string_lossy()
        .into_owned();

    // QueueFamilyとpresentのサポート
    let mut queue_families = vec![];
    for (i, queue_family) in instance
        .get_physical_device_queue_family_properties(physical_device)
        .iter()
        .enumerate()
    {
        let present_support =
            surface.get_physical_device_surface_support(physical_device, i as u32)?;
        queue_families.push(QueueFamilyInfo {
            queue_flags: queue_family.queue_flags,
            present_support,
        });
    }

    // デバイス拡張
    let extensions = unsafe { instance.enumerate_device_extension_properties(physical_device)? }
        .iter()
        .map(|extension| unsafe { CStr::from_ptr(extension.extension_name.as_ptr()).to_owned() })
        .collect::<Vec<_>>();

    let swapchain_support = crate::utils::query_swapchain_support(surface, physical_device)?;

    Ok(PhysicalDeviceInfo {
        physical_device,
        name,
        device_type: properties.device_type,
        max_image_dimension_2d: properties.limits.max_image_dimension2_d,
        geometry_shader: features.geometry_shader == vk::TRUE,
        queue_families,
        extensions,
        swapchain_support,
    })
}

/// instanceのすべてのphysical deviceの情報を取得する関数
pub fn query_physical_devices(
    instance: &crate::InstanceHandle,
    surface: &crate::SurfaceHandle,
) -> Result<Vec<PhysicalDeviceInfo>> {
    instance
        .enumerate_physical_devices()?
        .into_iter()
        .map(|physical_device| query_physical_device(instance, surface, physical_device))
        .collect()
}

/// physical deviceのスコアを計算する関数。
/// geometry shaderをサポートしていないdeviceは0になる。
pub fn rate_physical_device(info: &PhysicalDeviceInfo) -> u32 {
    if !info.geometry_shader {
        return 0;
    }

    // 扱えるテクスチャの大きさが大きいほど良い
    let mut score = info.max_image_dimension_2d;
    if info.device_type == vk::PhysicalDeviceType::DISCRETE_GPU {
        score = score.saturating_add(DISCRETE_GPU_BONUS);
    }
    score
}

/// 必要なdevice拡張をすべてサポートしているか確認する関数
pub fn check_device_extension_support(
    available_extensions: &[CString],
    required_extensions: &[CString],
) -> bool {
    let mut required = required_extensions.iter().collect::<HashSet<_>>();
    for extension in available_extensions {
        if required.remove(extension) {
            log::debug!("Found required extension: {:?}", extension);
        }
    }
    required.is_empty()
}

/// 各種QueueFamilyのindexを探した結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    /// GraphicsをサポートするQueueFamilyのindex
    pub graphics_family: Option<u32>,
    /// PresentをサポートするQueueFamilyのindex
    pub present_family: Option<u32>,
}
impl QueueFamilyIndices {
    /// GraphicsとPresentの両方が見つかっているか
    pub fn is_complete(&self) -> bool {
        self.graphics_family.is_some() && self.present_family.is_some()
    }

    /// 両方見つかっていればQueueIndicesにする
    pub fn complete(&self) -> Option<QueueIndices> {
        Some(QueueIndices {
            graphics_index: self.graphics_family?,
            present_index: self.present_family?,
        })
    }
}

/// QueueFamilyの一覧からGraphicsとPresentのQueueFamilyを探す関数。
/// 両方見つかった時点で探すのをやめる。
pub fn find_queue_families(queue_families: &[QueueFamilyInfo]) -> QueueFamilyIndices {
    let mut indices = QueueFamilyIndices::default();
    for (i, queue_family) in queue_families.iter().enumerate() {
        if queue_family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            indices.graphics_family = Some(i as u32);
        }
        if queue_family.present_support {
            indices.present_family = Some(i as u32);
        }
        if indices.is_complete() {
            break;
        }
    }
    indices
}

/// physical deviceがこのアプリケーションで使えるか確認する関数。
/// swapchainのサポートは拡張がある場合のみ確認する。
pub fn is_device_suitable(info: &PhysicalDeviceInfo, required_extensions: &[CString]) -> bool {
    let indices = find_queue_families(&info.queue_families);
    let extensions_supported =
        check_device_extension_support(&info.extensions, required_extensions);
    let swapchain_adequate = extensions_supported && info.swapchain_support.is_complete();

    indices.is_complete() && extensions_supported && swapchain_adequate
}

/// 適当なphysical deviceを選択する関数。
/// スコアの高い順に候補を見ていき、最初に条件を満たしたdeviceを選ぶ。
/// スコアが0のdeviceは選ばない。
pub fn select_physical_device<'a>(
    physical_devices: &'a [PhysicalDeviceInfo],
    required_extensions: &[CString],
) -> Result<&'a PhysicalDeviceInfo> {
    if physical_devices.is_empty() {
        bail!("Failed to find GPUs with Vulkan support");
    }

    // スコアでソートされる
    let mut candidates: BTreeMap<u32, Vec<&PhysicalDeviceInfo>> = BTreeMap::new();
    for info in physical_devices {
        let score = rate_physical_device(info);
        log::debug!("Physical device: {} >> {}", info.name, score);
        candidates.entry(score).or_default().push(info);
    }

    let selected = candidates
        .iter()
        .rev()
        .filter(|(&score, _)| score > 0)
        .flat_map(|(_, infos)| infos.iter().copied())
        .find(|info| is_device_suitable(info, required_extensions));

    match selected {
        Some(info) => {
            log::info!("Selected physical device: {}", info.name);
            Ok(info)
        }
        None => bail!("Failed to find a suitable GPU"),
    }
}

/// 各種Queueのindexを格納する構造体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueIndices {
    /// Graphics Queueのindex
    pub graphics_index: u32,
    /// Present Queueのindex
    pub present_index: u32,
}
impl QueueIndices {
    /// 重複を除いたQueueFamilyのindex
    pub fn unique_families(&self) -> BTreeSet<u32> {
        [self.graphics_index, self.present_index].into_iter().collect()
    }
}

/// deviceを作成する関数。
/// QueueFamilyごとにQueueを1つ作る。
pub fn create_device(
    instance: &crate::InstanceHandle,
    physical_device: vk::PhysicalDevice,
    queue_indices: &QueueIndices,
    required_device_extensions: &[CString],
    enabled_layers: &[CString],
) -> Result<crate::DeviceHandle> {
    // queue create info
    let queue_priorities = [1.0_f32];
    let queue_create_infos = queue_indices
        .unique_families()
        .into_iter()
        .map(|queue_family| {
            vk::DeviceQueueCreateInfo::builder()
                .queue_family_index(queue_family)
                .queue_priorities(&queue_priorities)
                .build()
        })
        .collect::<Vec<_>>();

    // physical device features
    let physical_device_features = vk::PhysicalDeviceFeatures::builder().build();

    // enable extension names
    let enable_extension_names = required_device_extensions
        .iter()
        .map(|s| s.as_ptr())
        .collect::<Vec<_>>();
    let enable_layer_names = enabled_layers
        .iter()
        .map(|s| s.as_ptr())
        .collect::<Vec<_>>();

    // device create info
    let device_create_info = vk::DeviceCreateInfo::builder()
        .queue_create_infos(&queue_create_infos)
        .enabled_features(&physical_device_features)
        .enabled_extension_names(&enable_extension_names)
        .enabled_layer_names(&enable_layer_names);

    // create device
    instance.create_device(physical_device, &device_create_info)
}

/// Queueとそのindexを格納する構造体
#[derive(Debug, Clone, Copy)]
pub struct QueueHandle {
    /// Queue
    pub queue: vk::Queue,
    /// QueueFamilyのindex
    pub family_index: u32,
    /// QueueFamily内のindex
    pub index: u32,
}

/// 各種QueueのQueueHandleを格納する構造体
#[derive(Debug, Clone, Copy)]
pub struct QueueHandles {
    /// Graphics Queue
    pub graphics: QueueHandle,
    /// Present Queue
    pub present: QueueHandle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::SwapchainSupport;
    use ash::vk::Handle;

    fn graphics_and_present() -> QueueFamilyInfo {
        QueueFamilyInfo {
            queue_flags: vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER,
            present_support: true,
        }
    }

    fn device(
        raw: u64,
        device_type: vk::PhysicalDeviceType,
        max_image_dimension_2d: u32,
    ) -> PhysicalDeviceInfo {
        PhysicalDeviceInfo {
            physical_device: vk::PhysicalDevice::from_raw(raw),
            name: format!("device {}", raw),
            device_type,
            max_image_dimension_2d,
            geometry_shader: true,
            queue_families: vec![graphics_and_present()],
            extensions: vec![Swapchain::name().to_owned()],
            swapchain_support: SwapchainSupport {
                capabilities: vk::SurfaceCapabilitiesKHR::default(),
                formats: vec![vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                }],
                present_modes: vec![vk::PresentModeKHR::FIFO],
            },
        }
    }

    fn required() -> Vec<CString> {
        get_required_device_extensions(&[])
    }

    #[test]
    fn required_extensions_always_contain_swapchain() {
        let extra = CString::new("VK_KHR_maintenance1").unwrap();
        let extensions = get_required_device_extensions(&[
            extra.clone(),
            Swapchain::name().to_owned(),
        ]);
        assert_eq!(extensions, vec![Swapchain::name().to_owned(), extra]);
    }

    #[test]
    fn device_without_geometry_shader_scores_zero() {
        let mut info = device(1, vk::PhysicalDeviceType::DISCRETE_GPU, 16384);
        info.geometry_shader = false;
        assert_eq!(rate_physical_device(&info), 0);
    }

    #[test]
    fn score_grows_with_image_dimension() {
        let small = device(1, vk::PhysicalDeviceType::INTEGRATED_GPU, 4096);
        let large = device(2, vk::PhysicalDeviceType::INTEGRATED_GPU, 8192);
        assert!(rate_physical_device(&large) > rate_physical_device(&small));

        let small = device(3, vk::PhysicalDeviceType::DISCRETE_GPU, 4096);
        let large = device(4, vk::PhysicalDeviceType::DISCRETE_GPU, 8192);
        assert!(rate_physical_device(&large) > rate_physical_device(&small));
    }

    #[test]
    fn discrete_bonus_outranks_equal_or_lower_limit() {
        for dimension in [0, 1, 4096, 16384] {
            let discrete = device(1, vk::PhysicalDeviceType::DISCRETE_GPU, dimension);
            let integrated = device(2, vk::PhysicalDeviceType::INTEGRATED_GPU, dimension);
            assert!(rate_physical_device(&discrete) > rate_physical_device(&integrated));
            assert_eq!(
                rate_physical_device(&discrete),
                dimension + DISCRETE_GPU_BONUS
            );
        }
    }

    #[test]
    fn selection_fails_without_geometry_shader_support() {
        let mut devices = vec![
            device(1, vk::PhysicalDeviceType::DISCRETE_GPU, 16384),
            device(2, vk::PhysicalDeviceType::INTEGRATED_GPU, 8192),
        ];
        for info in devices.iter_mut() {
            info.geometry_shader = false;
            assert!(is_device_suitable(info, &required()));
        }
        assert!(select_physical_device(&devices, &required()).is_err());
    }

    #[test]
    fn selection_fails_without_devices() {
        let err = select_physical_device(&[], &required()).unwrap_err();
        assert!(err.to_string().contains("Vulkan support"));
    }

    #[test]
    fn highest_score_wins() {
        let devices = vec![
            device(1, vk::PhysicalDeviceType::INTEGRATED_GPU, 16384),
            device(2, vk::PhysicalDeviceType::DISCRETE_GPU, 16384),
            device(3, vk::PhysicalDeviceType::CPU, 2048),
        ];
        let selected = select_physical_device(&devices, &required()).unwrap();
        assert_eq!(selected.physical_device, vk::PhysicalDevice::from_raw(2));
    }

    #[test]
    fn unsuitable_top_candidate_falls_through_to_next() {
        let mut best = device(1, vk::PhysicalDeviceType::DISCRETE_GPU, 16384);
        best.extensions.clear();
        let mut second = device(2, vk::PhysicalDeviceType::DISCRETE_GPU, 8192);
        second.swapchain_support.present_modes.clear();
        let third = device(3, vk::PhysicalDeviceType::INTEGRATED_GPU, 4096);

        let devices = vec![best, second, third];
        let selected = select_physical_device(&devices, &required()).unwrap();
        assert_eq!(selected.physical_device, vk::PhysicalDevice::from_raw(3));
    }

    #[test]
    fn equal_scores_keep_enumeration_order() {
        let devices = vec![
            device(1, vk::PhysicalDeviceType::DISCRETE_GPU, 8192),
            device(2, vk::PhysicalDeviceType::DISCRETE_GPU, 8192),
        ];
        let selected = select_physical_device(&devices, &required()).unwrap();
        assert_eq!(selected.physical_device, vk::PhysicalDevice::from_raw(1));
    }

    #[test]
    fn queue_families_may_share_an_index() {
        let indices = find_queue_families(&[graphics_and_present()]);
        assert_eq!(
            indices.complete(),
            Some(QueueIndices {
                graphics_index: 0,
                present_index: 0,
            })
        );
        assert_eq!(indices.complete().unwrap().unique_families().len(), 1);
    }

    #[test]
    fn queue_families_are_found_separately() {
        let families = [
            QueueFamilyInfo {
                queue_flags: vk::QueueFlags::TRANSFER,
                present_support: false,
            },
            QueueFamilyInfo {
                queue_flags: vk::QueueFlags::GRAPHICS,
                present_support: false,
            },
            QueueFamilyInfo {
                queue_flags: vk::QueueFlags::COMPUTE,
                present_support: true,
            },
        ];
        let indices = find_queue_families(&families);
        assert_eq!(indices.graphics_family, Some(1));
        assert_eq!(indices.present_family, Some(2));
        let queue_indices = indices.complete().unwrap();
        assert_eq!(
            queue_indices.unique_families().into_iter().collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn missing_present_family_is_incomplete() {
        let indices = find_queue_families(&[QueueFamilyInfo {
            queue_flags: vk::QueueFlags::GRAPHICS,
            present_support: false,
        }]);
        assert!(!indices.is_complete());
        assert_eq!(indices.complete(), None);

        let mut info = device(1, vk::PhysicalDeviceType::DISCRETE_GPU, 1);
        info.queue_families[0].present_support = false;
        assert!(!is_device_suitable(&info, &required()));
    }

    #[test]
    fn extension_support_requires_every_extension() {
        let swapchain = Swapchain::name().to_owned();
        let extra = CString::new("VK_KHR_maintenance1").unwrap();
        assert!(check_device_extension_support(
            &[extra.clone(), swapchain.clone()],
            &[swapchain.clone()]
        ));
        assert!(!check_device_extension_support(
            &[swapchain.clone()],
            &[swapchain, extra]
        ));
    }
}
