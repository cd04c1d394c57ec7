//! Overrides loading across formats and layers.

use super::*;
use crate::service::ServiceKind;
use std::fs;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn detects_supported_formats() {
    assert_eq!(detect_format(Path::new("a.toml")).unwrap(), FileFormat::Toml);
    assert_eq!(detect_format(Path::new("a.yaml")).unwrap(), FileFormat::Yaml);
    assert_eq!(detect_format(Path::new("a.YML")).unwrap(), FileFormat::Yaml);
    assert_eq!(detect_format(Path::new("a.json")).unwrap(), FileFormat::Json);
    assert!(matches!(
        detect_format(Path::new("a.ini")),
        Err(OverridesError::UnsupportedFormat(_))
    ));
    assert!(detect_format(Path::new("apuforge")).is_err());
}

#[test]
fn no_sources_yield_defaults() {
    let overrides = load_overrides(None, None).unwrap();
    assert_eq!(overrides, Overrides::default());
}

#[test]
fn partial_toml_keeps_other_defaults() {
    let toml = r#"
hardware_profile = "vulkan-radv"

[services.reranking]
enable = false

[services.chat]
model = "qwen3-coder-30b"
context_size = 131072
"#;
    let overrides = from_str(toml, FileFormat::Toml).unwrap();
    assert_eq!(overrides.hardware_profile, "vulkan-radv");
    assert!(!overrides.services.reranking.enable);
    assert!(overrides.services.embedding.enable);
    assert_eq!(overrides.services.chat.model.as_deref(), Some("qwen3-coder-30b"));
    assert_eq!(overrides.services.chat.context_size, Some(131_072));
    assert_eq!(overrides.gateway.listen_port, 4000);
}

#[test]
fn yaml_file_loads_paths_and_gateway() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "apuforge.yaml",
        r#"
paths:
  models_root: /data/models
gateway:
  listen_port: 4100
  timeouts:
    chat: 900
services:
  embedding:
    port: 8101
    extra_aliases: [my-embedder]
"#,
    );
    let overrides = load_overrides(Some(&path), None).unwrap();
    assert_eq!(overrides.paths.models_root, PathBuf::from("/data/models"));
    assert_eq!(overrides.paths.engine_root, PathBuf::from("/opt/llama.cpp"));
    assert_eq!(overrides.gateway.listen_port, 4100);
    assert_eq!(overrides.gateway.timeouts.chat, 900);
    assert_eq!(overrides.gateway.timeouts.health, 5);
    assert_eq!(overrides.services.embedding.port, Some(8101));
    assert_eq!(overrides.services.embedding.extra_aliases, vec!["my-embedder"]);
}

#[test]
fn json_file_loads() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "apuforge.json",
        r#"{ "services": { "chat": { "model": "gpt-oss-120b" } } }"#,
    );
    let overrides = load_overrides(Some(&path), None).unwrap();
    assert_eq!(overrides.services.get(ServiceKind::Chat).model.as_deref(), Some("gpt-oss-120b"));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let err = load_overrides(Some(&path), None).unwrap_err();
    assert!(matches!(err, OverridesError::Io { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn wrong_type_is_a_deserialize_error() {
    let err = from_str("[gateway]\nlisten_port = \"not-a-port\"\n", FileFormat::Toml).unwrap_err();
    assert!(matches!(err, OverridesError::Deserialize(_)));
}

#[test]
fn misspelled_top_level_key_is_rejected() {
    let err = from_str("hardware_profle = \"vulkan-radv\"\n", FileFormat::Toml).unwrap_err();
    match err {
        OverridesError::Deserialize(msg) => assert!(msg.contains("hardware_profle"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn misspelled_service_table_is_rejected() {
    let err = from_str("[services.rerank]\nenable = false\n", FileFormat::Toml).unwrap_err();
    match err {
        OverridesError::Deserialize(msg) => assert!(msg.contains("rerank"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn misspelled_nested_keys_are_rejected() {
    let yaml = "gateway:\n  listen_prot: 4100\n";
    assert!(matches!(
        from_str(yaml, FileFormat::Yaml),
        Err(OverridesError::Deserialize(_))
    ));

    let json = r#"{"services": {"chat": {"context": 8192}}}"#;
    assert!(matches!(
        from_str(json, FileFormat::Json),
        Err(OverridesError::Deserialize(_))
    ));
}

#[test]
fn braced_and_bare_variables_are_substituted() {
    unsafe {
        std::env::set_var("APUFORGE_TEST_MODELS_DIR", "/mnt/gguf");
        std::env::set_var("APUFORGE_TEST_KEY", "sk-test");
    }
    let out = substitute_env_vars("root: ${APUFORGE_TEST_MODELS_DIR}, key: $APUFORGE_TEST_KEY").unwrap();
    assert_eq!(out, "root: /mnt/gguf, key: sk-test");
    unsafe {
        std::env::remove_var("APUFORGE_TEST_MODELS_DIR");
        std::env::remove_var("APUFORGE_TEST_KEY");
    }
}

#[test]
fn unset_variables_are_left_verbatim() {
    let out = substitute_env_vars("x: ${APUFORGE_TEST_DEFINITELY_UNSET}").unwrap();
    assert_eq!(out, "x: ${APUFORGE_TEST_DEFINITELY_UNSET}");
}

#[test]
fn substitution_applies_inside_files() {
    unsafe {
        std::env::set_var("APUFORGE_TEST_ENGINE_ROOT", "/home/op/llama.cpp");
    }
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "apuforge.toml",
        "[paths]\nengine_root = \"${APUFORGE_TEST_ENGINE_ROOT}\"\n",
    );
    let overrides = load_overrides(Some(&path), None).unwrap();
    assert_eq!(overrides.paths.engine_root, PathBuf::from("/home/op/llama.cpp"));
    unsafe {
        std::env::remove_var("APUFORGE_TEST_ENGINE_ROOT");
    }
}

#[test]
fn environment_overrides_file_values() {
    unsafe {
        std::env::set_var("APFTESTENV__GATEWAY__LISTEN_PORT", "4200");
        std::env::set_var("APFTESTENV__HARDWARE_PROFILE", "rocm-gfx1151-hipblaslt");
    }
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "apuforge.toml",
        "hardware_profile = \"vulkan-radv\"\n[gateway]\nlisten_port = 4100\n",
    );
    let overrides = load_overrides(Some(&path), Some("APFTESTENV")).unwrap();
    assert_eq!(overrides.gateway.listen_port, 4200);
    assert_eq!(overrides.hardware_profile, "rocm-gfx1151-hipblaslt");
    unsafe {
        std::env::remove_var("APFTESTENV__GATEWAY__LISTEN_PORT");
        std::env::remove_var("APFTESTENV__HARDWARE_PROFILE");
    }
}

#[test]
fn discover_prefers_toml() {
    let dir = TempDir::new().unwrap();
    assert!(discover(dir.path()).is_none());
    write(&dir, "apuforge.json", "{}");
    write(&dir, "apuforge.toml", "");
    assert_eq!(discover(dir.path()), Some(dir.path().join("apuforge.toml")));
}
