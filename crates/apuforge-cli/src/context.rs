//! Overrides assembly and resolution shared by every command

use crate::cli::GlobalArgs;
use apuforge_kernel::config::{ENV_PREFIX, discover};
use apuforge_kernel::{ActiveConfiguration, Overrides, Registries, load_overrides};
use std::path::PathBuf;
use tracing::debug;

/// Layer defaults, the overrides file, `APUFORGE__*` variables and
/// command-line flags, in that order.
pub fn overrides(globals: &GlobalArgs) -> anyhow::Result<Overrides> {
    let file = match &globals.config {
        Some(path) => Some(path.clone()),
        None => std::env::current_dir().ok().and_then(|dir| discover(&dir)),
    };
    if let Some(path) = &file {
        debug!(path = %path.display(), "using overrides file");
    }

    let mut overrides = load_overrides(file.as_deref(), Some(ENV_PREFIX))?;
    apply_flags(&mut overrides, globals);
    Ok(overrides)
}

fn apply_flags(overrides: &mut Overrides, globals: &GlobalArgs) {
    if let Some(profile) = &globals.profile {
        overrides.hardware_profile = profile.clone();
    }
    for kind in &globals.disable {
        overrides.services.get_mut(*kind).enable = false;
    }
    for (kind, key) in &globals.models {
        overrides.services.get_mut(*kind).model = Some(key.clone());
    }

    let paths = &mut overrides.paths;
    let roots: [(&Option<PathBuf>, &mut PathBuf); 4] = [
        (&globals.models_root, &mut paths.models_root),
        (&globals.engine_root, &mut paths.engine_root),
        (&globals.runtime_root, &mut paths.runtime_root),
        (&globals.output, &mut paths.output_dir),
    ];
    for (flag, target) in roots {
        if let Some(value) = flag {
            *target = value.clone();
        }
    }
}

/// Resolve `overrides` against the built-in registries.
pub fn resolve(overrides: &Overrides) -> anyhow::Result<ActiveConfiguration> {
    let active = Registries::shared().resolve(overrides)?;
    debug!(
        profile = active.profile_key(),
        services = active.enabled_services().len(),
        "configuration resolved"
    );
    Ok(active)
}

pub fn active(globals: &GlobalArgs) -> anyhow::Result<ActiveConfiguration> {
    resolve(&overrides(globals)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apuforge_kernel::ServiceKind;

    #[test]
    fn flags_override_file_values() {
        let globals = GlobalArgs {
            profile: Some("vulkan-radv".to_string()),
            disable: vec![ServiceKind::Embedding],
            models: vec![(ServiceKind::Chat, "glm-4.5-air".to_string())],
            models_root: Some(PathBuf::from("/models")),
            output: Some(PathBuf::from("out")),
            ..GlobalArgs::default()
        };
        let mut overrides = Overrides::default();
        apply_flags(&mut overrides, &globals);

        assert_eq!(overrides.hardware_profile, "vulkan-radv");
        assert!(!overrides.services.embedding.enable);
        assert_eq!(overrides.services.chat.model.as_deref(), Some("glm-4.5-air"));
        assert_eq!(overrides.paths.models_root, PathBuf::from("/models"));
        assert_eq!(overrides.paths.output_dir, PathBuf::from("out"));
        assert_eq!(overrides.paths.engine_root, PathBuf::from("/opt/llama.cpp"));
    }
}
