//! `apuforge serve`

use crate::error::EnvironmentError;
use crate::utils::port_available;
use crate::utils::process::Invocation;
use apuforge_foundation::launch;
use apuforge_kernel::{ActiveConfiguration, Overrides, ServiceKind};
use colored::Colorize;
use std::path::PathBuf;

/// Context-size argument: a named preset or an explicit token count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextChoice {
    Small,
    Medium,
    Large,
    Max,
    Tokens(u32),
}

impl ContextChoice {
    pub fn parse(s: &str) -> Result<Self, EnvironmentError> {
        match s.to_ascii_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            "max" => Ok(Self::Max),
            other => other
                .parse::<u32>()
                .map(Self::Tokens)
                .map_err(|_| EnvironmentError::InvalidContext(s.to_string())),
        }
    }

    /// Token count; `Max` needs the model's window.
    pub fn tokens(self, model_max: u32) -> u32 {
        match self {
            Self::Small => 8_192,
            Self::Medium => 32_768,
            Self::Large => 131_072,
            Self::Max => model_max,
            Self::Tokens(n) => n,
        }
    }
}

/// Per-invocation choices layered on top of the resolved overrides.
#[derive(Debug, Default)]
pub struct ServeOptions {
    pub model: Option<String>,
    pub ctx: Option<String>,
    pub model_file: Option<PathBuf>,
    pub flags: Vec<String>,
    pub dry_run: bool,
}

/// Apply `--model` and `--ctx` to the overrides so the resolver validates
/// them like any other selection.
pub fn apply(
    mut overrides: Overrides,
    kind: ServiceKind,
    opts: &ServeOptions,
    resolve: impl Fn(&Overrides) -> anyhow::Result<ActiveConfiguration>,
) -> anyhow::Result<ActiveConfiguration> {
    let service = overrides.services.get_mut(kind);
    service.enable = true;
    if let Some(model) = &opts.model {
        service.model = Some(model.clone());
    }

    let choice = opts.ctx.as_deref().map(ContextChoice::parse).transpose()?;
    match choice {
        None => resolve(&overrides),
        Some(choice) => {
            // The model window is only known after the model is resolved.
            let active = resolve(&overrides)?;
            let max = active.binding(kind).model().context_max;
            overrides.services.get_mut(kind).context_size = Some(choice.tokens(max));
            resolve(&overrides)
        }
    }
}

/// Engine command line for one service.
pub fn invocation(
    active: &ActiveConfiguration,
    kind: ServiceKind,
    opts: &ServeOptions,
) -> Result<Invocation, EnvironmentError> {
    let binding = active.binding(kind);
    let params = launch::parameters(active, binding);
    let get = |key: &str| {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    };

    let model_path = match &opts.model_file {
        Some(path) => path.display().to_string(),
        None => get("MODEL_PATH"),
    };

    let mut args = vec![
        "-m".to_string(),
        model_path,
        "--host".to_string(),
        get("HOST"),
        "--port".to_string(),
        get("PORT"),
        "-c".to_string(),
        get("CTX_SIZE"),
        "-ngl".to_string(),
        get("N_GPU_LAYERS"),
    ];
    args.extend(active.extra_flags(binding));
    args.extend(opts.flags.iter().cloned());

    let mut inv = Invocation::new(get("LLAMA_BIN"), args);
    for (key, value) in &active.hardware().env {
        inv = inv.with_env(key.clone(), value.clone());
    }
    if let Some(lib) = active.runtime_library_dir() {
        let mut value = lib.display().to_string();
        if let Ok(existing) = std::env::var("LD_LIBRARY_PATH") {
            if !existing.is_empty() {
                value = format!("{value}:{existing}");
            }
        }
        inv = inv.with_env("LD_LIBRARY_PATH", value);
    }
    Ok(inv)
}

/// Binary, model file and port must all be usable before the engine starts.
pub fn preflight(
    active: &ActiveConfiguration,
    kind: ServiceKind,
    opts: &ServeOptions,
) -> Result<(), EnvironmentError> {
    let binary = active.engine_binary();
    if !binary.is_file() {
        return Err(EnvironmentError::MissingBinary(binary));
    }

    let binding = active.binding(kind);
    let model = opts
        .model_file
        .clone()
        .unwrap_or_else(|| active.model_path(binding));
    if !model.is_file() {
        return Err(EnvironmentError::MissingModelFile(model));
    }

    let host = &active.gateway().service_host;
    if !port_available(host, binding.port()) {
        return Err(EnvironmentError::PortInUse {
            host: host.clone(),
            port: binding.port(),
        });
    }
    Ok(())
}

pub fn run(active: &ActiveConfiguration, kind: ServiceKind, opts: &ServeOptions) -> anyhow::Result<()> {
    preflight(active, kind, opts)?;
    let binding = active.binding(kind);
    println!(
        "{} Starting {} service: {} on port {} (context {})",
        "→".green(),
        kind,
        binding.model_key().cyan(),
        binding.port(),
        binding.context_size()
    );
    invocation(active, kind, opts)?.execute(opts.dry_run)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use apuforge_kernel::{ConfigurationError, Registries};

    fn resolver(o: &Overrides) -> anyhow::Result<ActiveConfiguration> {
        Ok(Registries::builtin().resolve(o)?)
    }

    #[test]
    fn presets_map_to_token_counts() {
        assert_eq!(ContextChoice::parse("small").unwrap().tokens(0), 8_192);
        assert_eq!(ContextChoice::parse("Medium").unwrap().tokens(0), 32_768);
        assert_eq!(ContextChoice::parse("large").unwrap().tokens(0), 131_072);
        assert_eq!(ContextChoice::parse("max").unwrap().tokens(262_144), 262_144);
        assert_eq!(ContextChoice::parse("65536").unwrap().tokens(0), 65_536);
        assert!(ContextChoice::parse("huge").is_err());
    }

    #[test]
    fn max_context_uses_the_selected_model_window() {
        let opts = ServeOptions {
            model: Some("devstral2-123b".to_string()),
            ctx: Some("max".to_string()),
            ..ServeOptions::default()
        };
        let active = apply(Overrides::default(), ServiceKind::Chat, &opts, resolver).unwrap();
        assert_eq!(active.binding(ServiceKind::Chat).context_size(), 262_144);
    }

    #[test]
    fn oversized_context_is_rejected_by_the_resolver() {
        let opts = ServeOptions {
            model: Some("nomic-embed-v1.5".to_string()),
            ctx: Some("large".to_string()),
            ..ServeOptions::default()
        };
        let err = apply(Overrides::default(), ServiceKind::Embedding, &opts, resolver).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigurationError>(),
            Some(ConfigurationError::InvalidContextSize { .. })
        ));
    }

    #[test]
    fn serving_a_disabled_service_enables_it() {
        let overrides = Overrides::default().disable(ServiceKind::Reranking);
        let active = apply(overrides, ServiceKind::Reranking, &ServeOptions::default(), resolver).unwrap();
        assert!(active.is_enabled(ServiceKind::Reranking));
    }

    #[test]
    fn invocation_mirrors_launch_parameters() {
        let active = Registries::builtin().resolve(&Overrides::default()).unwrap();
        let opts = ServeOptions {
            flags: vec!["--top-k".to_string(), "40".to_string()],
            ..ServeOptions::default()
        };
        let inv = invocation(&active, ServiceKind::Embedding, &opts).unwrap();
        assert_eq!(inv.program, "/opt/llama.cpp/build-rocm/bin/llama-server");
        assert_eq!(&inv.args[..2], &["-m", "/srv/llm/models/qwen3-embedding-8b/Qwen3-Embedding-8B-Q8_0.gguf"]);
        assert!(inv.args.windows(2).any(|w| w == ["--port", "8001"]));
        assert_eq!(&inv.args[inv.args.len() - 2..], &["--top-k", "40"]);
        assert!(inv.env.iter().any(|(k, v)| k == "HSA_OVERRIDE_GFX_VERSION" && v == "11.5.1"));
        assert!(inv.env.iter().any(|(k, v)| k == "LD_LIBRARY_PATH" && v.starts_with("/opt/rocm/lib")));
    }

    #[test]
    fn explicit_model_file_replaces_catalog_path() {
        let active = Registries::builtin().resolve(&Overrides::default()).unwrap();
        let opts = ServeOptions {
            model_file: Some(PathBuf::from("/tmp/custom.gguf")),
            ..ServeOptions::default()
        };
        let inv = invocation(&active, ServiceKind::Chat, &opts).unwrap();
        assert_eq!(inv.args[1], "/tmp/custom.gguf");
    }

    #[test]
    fn preflight_reports_missing_binary_first() {
        let mut overrides = Overrides::default();
        overrides.paths.engine_root = PathBuf::from("/nonexistent/llama.cpp");
        let active = Registries::builtin().resolve(&overrides).unwrap();
        let err = preflight(&active, ServiceKind::Chat, &ServeOptions::default()).unwrap_err();
        assert!(matches!(err, EnvironmentError::MissingBinary(_)));
    }
}
