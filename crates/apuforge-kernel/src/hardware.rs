//! Hardware profiles for AMD APU hosts.
//!
//! A profile pins the engine build flavour (ROCm or Vulkan), the environment
//! the engine needs on that build, and the inference flags every service on
//! the host starts with.

use crate::error::RegistryKind;
use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Engine build flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildKind {
    /// HIP build against ROCm
    Rocm,
    /// Vulkan compute build (RADV)
    Vulkan,
}

impl BuildKind {
    /// Build directory under the engine root.
    pub fn build_dir(self) -> &'static str {
        match self {
            Self::Rocm => "build-rocm",
            Self::Vulkan => "build-vulkan",
        }
    }
}

impl std::fmt::Display for BuildKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rocm => write!(f, "ROCm"),
            Self::Vulkan => write!(f, "Vulkan"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareProfile {
    pub name: String,
    pub gpu_arch: Option<String>,
    /// Unified memory the GPU can address, in GiB.
    pub vram_total_gb: u32,
    /// Estimate left for model weights and KV cache after the OS.
    pub vram_available_gb: u32,
    pub build: BuildKind,
    pub env: BTreeMap<String, String>,
    /// Flags prepended to every service's engine flags.
    pub default_flags: Vec<String>,
    pub gpu_layers: u32,
}

fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn flags(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub(crate) fn builtin_profiles() -> Registry<HardwareProfile> {
    let rocm_env = [
        ("HSA_OVERRIDE_GFX_VERSION", "11.5.1"),
        ("HSA_ENABLE_SDMA", "0"),
        ("GGML_CUDA_ENABLE_UNIFIED_MEMORY", "1"),
    ];
    let mut hipblaslt_env = env(&rocm_env);
    hipblaslt_env.insert("ROCBLAS_USE_HIPBLASLT".to_string(), "1".to_string());

    Registry::new(RegistryKind::HardwareProfile)
        .with(
            "rocm-gfx1151",
            HardwareProfile {
                name: "Strix Halo (ROCm, gfx1151)".to_string(),
                gpu_arch: Some("gfx1151".to_string()),
                vram_total_gb: 128,
                vram_available_gb: 120,
                build: BuildKind::Rocm,
                env: env(&rocm_env),
                default_flags: flags(&["--flash-attn", "on", "--no-mmap"]),
                gpu_layers: 999,
            },
        )
        .with(
            "rocm-gfx1151-hipblaslt",
            HardwareProfile {
                name: "Strix Halo (ROCm, gfx1151, hipBLASLt)".to_string(),
                gpu_arch: Some("gfx1151".to_string()),
                vram_total_gb: 128,
                vram_available_gb: 120,
                build: BuildKind::Rocm,
                env: hipblaslt_env,
                default_flags: flags(&["--flash-attn", "on", "--no-mmap"]),
                gpu_layers: 999,
            },
        )
        .with(
            "vulkan-radv",
            HardwareProfile {
                name: "Strix Halo (Vulkan, RADV)".to_string(),
                gpu_arch: None,
                vram_total_gb: 128,
                vram_available_gb: 120,
                build: BuildKind::Vulkan,
                env: env(&[("AMD_VULKAN_ICD", "RADV")]),
                default_flags: flags(&["--flash-attn", "on", "--no-mmap", "--mlock"]),
                gpu_layers: 999,
            },
        )
}
