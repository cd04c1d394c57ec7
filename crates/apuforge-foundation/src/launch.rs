//! Launch-parameter files (`llama-<svc>.env`).
//!
//! Flat `KEY=value` lines read by the unit's `EnvironmentFile=` and by
//! `apuforge serve`. `EXTRA_FLAGS` lists profile defaults first, then the
//! endpoint flags, without deduplication.

use crate::GENERATED_HEADER;
use crate::error::GenerateError;
use apuforge_kernel::{ActiveConfiguration, ServiceBinding, ServiceKind};

/// Ordered launch parameters for one service.
pub fn parameters(active: &ActiveConfiguration, binding: &ServiceBinding) -> Vec<(&'static str, String)> {
    vec![
        ("LLAMA_BIN", active.engine_binary().display().to_string()),
        ("MODEL_PATH", active.model_path(binding).display().to_string()),
        ("HOST", active.gateway().service_host.clone()),
        ("PORT", binding.port().to_string()),
        ("CTX_SIZE", binding.context_size().to_string()),
        ("N_GPU_LAYERS", active.hardware().gpu_layers.to_string()),
        ("EXTRA_FLAGS", active.extra_flags(binding).join(" ")),
    ]
}

pub fn render(active: &ActiveConfiguration, kind: ServiceKind) -> Result<String, GenerateError> {
    let binding = active.binding(kind);
    if !binding.enabled() {
        return Err(GenerateError::ServiceDisabled(kind));
    }

    let mut out = format!(
        "# {GENERATED_HEADER}\n# {} service: {} ({})\n",
        kind,
        binding.model().display_name,
        binding.model_key()
    );
    for (key, value) in parameters(active, binding) {
        out.push_str(key);
        out.push('=');
        out.push_str(&value);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apuforge_kernel::{Overrides, Registries};

    fn lines(doc: &str) -> Vec<&str> {
        doc.lines().filter(|l| !l.starts_with('#')).collect()
    }

    #[test]
    fn full_context_devstral() {
        let overrides = Overrides::default()
            .with_model(ServiceKind::Chat, "devstral2-123b")
            .with_context(ServiceKind::Chat, 262_144);
        let active = Registries::builtin().resolve(&overrides).unwrap();
        let doc = render(&active, ServiceKind::Chat).unwrap();

        assert!(doc.contains("\nCTX_SIZE=262144\n"));
        assert!(doc.contains(
            "\nMODEL_PATH=/srv/llm/models/devstral2-123b/Devstral-2-123B-Instruct-2512-Q4_K_M-00001-of-00002.gguf\n"
        ));
    }

    #[test]
    fn keys_appear_in_fixed_order() {
        let active = Registries::builtin().resolve(&Overrides::default()).unwrap();
        let doc = render(&active, ServiceKind::Embedding).unwrap();
        let keys: Vec<&str> = lines(&doc)
            .iter()
            .filter_map(|l| l.split_once('=').map(|(k, _)| k))
            .collect();
        assert_eq!(
            keys,
            vec!["LLAMA_BIN", "MODEL_PATH", "HOST", "PORT", "CTX_SIZE", "N_GPU_LAYERS", "EXTRA_FLAGS"]
        );
    }

    #[test]
    fn extra_flags_keep_profile_defaults_first() {
        let active = Registries::builtin().resolve(&Overrides::default()).unwrap();
        let doc = render(&active, ServiceKind::Embedding).unwrap();
        assert!(doc.contains(
            "\nEXTRA_FLAGS=--flash-attn on --no-mmap --embeddings --parallel 4 --pooling last\n"
        ));
        assert!(doc.contains("\nLLAMA_BIN=/opt/llama.cpp/build-rocm/bin/llama-server\n"));
        assert!(doc.contains("\nN_GPU_LAYERS=999\n"));
    }

    #[test]
    fn disabled_service_is_not_rendered() {
        let overrides = Overrides::default().disable(ServiceKind::Chat);
        let active = Registries::builtin().resolve(&overrides).unwrap();
        assert!(render(&active, ServiceKind::Chat).is_err());
    }
}
