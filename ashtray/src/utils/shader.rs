use anyhow::{bail, Context, Result};
use ash::vk;
use std::path::Path;

/// SPIR-Vのmagic number
pub const SPIRV_MAGIC_NUMBER: u32 = 0x0723_0203;

/// SPIR-Vのbytesをu32のwordの列に変換する関数。
/// 先頭のbyteでendiannessを判定する。
pub fn spirv_words(bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.is_empty() {
        bail!("SPIR-V code is empty");
    }
    if bytes.len() % 4 != 0 {
        bail!("SPIR-V code size {} is not a multiple of 4", bytes.len());
    }

    let from_bytes: fn([u8; 4]) -> u32 = match bytes[0] {
        0x03 => u32::from_le_bytes,
        0x07 => u32::from_be_bytes,
        _ => bail!("Unknown endianness of SPIR-V code"),
    };
    let words = bytes
        .chunks_exact(4)
        .map(|x| from_bytes([x[0], x[1], x[2], x[3]]))
        .collect::<Vec<u32>>();

    if words[0] != SPIRV_MAGIC_NUMBER {
        bail!("Invalid SPIR-V magic number: {:#010x}", words[0]);
    }
    Ok(words)
}

/// SPIR-Vのファイルを読み込んでwordの列にする関数
pub fn read_spirv_file(path: impl AsRef<Path>) -> Result<Vec<u32>> {
    let path = path.as_ref();
    let bytes =
        std::fs::read(path).with_context(|| format!("Could not open file {}", path.display()))?;
    log::debug!("Loaded shader {} ({} bytes)", path.display(), bytes.len());
    spirv_words(&bytes).with_context(|| format!("Invalid SPIR-V file {}", path.display()))
}

/// wordの列を与えてShaderModuleを作成するヘルパー関数
pub fn create_shader_module(
    device: &crate::DeviceHandle,
    words: &[u32],
) -> Result<crate::ShaderModuleHandle> {
    let create_info = vk::ShaderModuleCreateInfo::builder().code(words);
    device.create_shader_module(&create_info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn module_bytes(little_endian: bool) -> Vec<u8> {
        [SPIRV_MAGIC_NUMBER, 0x0001_0000, 0, 8, 0]
            .iter()
            .flat_map(|word| {
                if little_endian {
                    word.to_le_bytes()
                } else {
                    word.to_be_bytes()
                }
            })
            .collect()
    }

    #[test]
    fn little_and_big_endian_modules_decode_to_same_words() {
        let little = spirv_words(&module_bytes(true)).unwrap();
        let big = spirv_words(&module_bytes(false)).unwrap();
        assert_eq!(little, big);
        assert_eq!(little[0], SPIRV_MAGIC_NUMBER);
        assert_eq!(little.len(), 5);
    }

    #[test]
    fn truncated_code_is_rejected() {
        let mut bytes = module_bytes(true);
        bytes.pop();
        assert!(spirv_words(&bytes).is_err());
        assert!(spirv_words(&[]).is_err());
    }

    #[test]
    fn non_spirv_bytes_are_rejected() {
        assert!(spirv_words(b"#version 450").is_err());
        assert!(spirv_words(&[0x03, 0, 0, 0]).is_err());
    }

    #[test]
    fn shader_file_is_read_as_words() {
        let path = std::env::temp_dir().join(format!("ashtray-shader-{}.spv", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&module_bytes(true)).unwrap();
        drop(file);

        let words = read_spirv_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(words[0], SPIRV_MAGIC_NUMBER);
    }

    #[test]
    fn missing_shader_file_names_the_path() {
        let path = std::env::temp_dir().join("ashtray-missing-shader.spv");
        let err = read_spirv_file(&path).unwrap_err();
        assert!(err.to_string().starts_with("Could not open file"));
        assert!(err.to_string().contains("ashtray-missing-shader.spv"));
    }
}
