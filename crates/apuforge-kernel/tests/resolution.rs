//! End-to-end resolution from an overrides file.

use apuforge_kernel::{
    BuildKind, ConfigurationError, PortOwner, Registries, ServiceKind, load_overrides,
};
use std::fs;
use tempfile::TempDir;

#[test]
fn overrides_file_resolves_to_expected_bindings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("apuforge.toml");
    fs::write(
        &path,
        r#"
hardware_profile = "vulkan-radv"

[paths]
models_root = "/data/models"

[services.chat]
model = "devstral2-123b"
context_size = 262144

[services.reranking]
enable = false
"#,
    )
    .unwrap();

    let overrides = load_overrides(Some(&path), None).unwrap();
    let active = Registries::shared().resolve(&overrides).unwrap();

    assert_eq!(active.hardware().build, BuildKind::Vulkan);
    assert_eq!(active.runtime_library_dir(), None);
    let kinds: Vec<ServiceKind> = active.enabled_services().iter().map(|b| b.kind()).collect();
    assert_eq!(kinds, vec![ServiceKind::Chat, ServiceKind::Embedding]);

    let chat = active.binding(ServiceKind::Chat);
    assert_eq!(chat.context_size(), 262_144);
    assert_eq!(
        active.model_path(chat).to_string_lossy(),
        "/data/models/devstral2-123b/Devstral-2-123B-Instruct-2512-Q4_K_M-00001-of-00002.gguf"
    );
}

#[test]
fn port_collision_from_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("apuforge.yaml");
    fs::write(&path, "services:\n  embedding:\n    port: 8000\n").unwrap();

    let overrides = load_overrides(Some(&path), None).unwrap();
    let err = Registries::shared().resolve(&overrides).unwrap_err();
    assert_eq!(
        err,
        ConfigurationError::PortCollision {
            port: 8000,
            first: PortOwner::Service(ServiceKind::Chat),
            second: PortOwner::Service(ServiceKind::Embedding),
        }
    );
    assert!(err.hint().contains("embedding service"));
}

#[test]
fn resolution_is_deterministic() {
    let overrides = load_overrides(None, None).unwrap();
    let a = Registries::shared().resolve(&overrides).unwrap();
    let b = Registries::builtin().resolve(&overrides).unwrap();
    assert_eq!(a, b);
}
