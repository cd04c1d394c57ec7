//! Overrides loading
//!
//! Operators describe their host in a single overrides file (TOML, YAML or
//! JSON). Values are layered in this order, later layers winning:
//!
//! - built-in defaults ([`Overrides::default`])
//! - the overrides file, after `${VAR}` / `$VAR` substitution
//! - `APUFORGE__*` environment variables, `__` separating nested keys
//!   (e.g. `APUFORGE__GATEWAY__LISTEN_PORT=4100`)

use crate::resolve::Overrides;
use config::{Config as Cfg, Environment, File, FileFormat};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default environment prefix for overrides.
pub const ENV_PREFIX: &str = "APUFORGE";

/// File names probed by [`discover`], in priority order.
pub const DEFAULT_FILE_NAMES: [&str; 4] =
    ["apuforge.toml", "apuforge.yaml", "apuforge.yml", "apuforge.json"];

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum OverridesError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported overrides format: {0}")]
    UnsupportedFormat(String),

    #[error("Overrides parsing error: {0}")]
    Parse(String),

    #[error("Overrides deserialization error: {0}")]
    Deserialize(String),
}

pub type OverridesResult<T> = Result<T, OverridesError>;

/// Detect the overrides format from a file extension.
pub fn detect_format(path: &Path) -> OverridesResult<FileFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| OverridesError::UnsupportedFormat("no file extension".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        _ => Err(OverridesError::UnsupportedFormat(ext.to_string())),
    }
}

/// Replace `${VAR}` and `$VAR` with their environment values. Unset
/// variables are left as written.
pub fn substitute_env_vars(content: &str) -> OverridesResult<String> {
    let braced = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| OverridesError::Parse(e.to_string()))?;
    let bare = Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b")
        .map_err(|e| OverridesError::Parse(e.to_string()))?;

    let result = braced.replace_all(content, env_value).into_owned();
    Ok(bare.replace_all(&result, env_value).into_owned())
}

fn env_value(caps: &regex::Captures<'_>) -> String {
    std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
}

/// Parse overrides from a string in an explicit format.
pub fn from_str(content: &str, format: FileFormat) -> OverridesResult<Overrides> {
    let substituted = substitute_env_vars(content)?;
    Cfg::builder()
        .add_source(File::from_str(&substituted, format))
        .build()
        .map_err(|e| OverridesError::Parse(e.to_string()))?
        .try_deserialize()
        .map_err(|e| OverridesError::Deserialize(e.to_string()))
}

/// Load overrides from an optional file plus prefixed environment variables.
///
/// With neither a file nor matching variables this yields
/// [`Overrides::default`].
pub fn load_overrides(path: Option<&Path>, env_prefix: Option<&str>) -> OverridesResult<Overrides> {
    let mut builder = Cfg::builder();

    if let Some(path) = path {
        let format = detect_format(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| OverridesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let substituted = substitute_env_vars(&content)?;
        builder = builder.add_source(File::from_str(&substituted, format));
        debug!(path = %path.display(), "loaded overrides file");
    }

    if let Some(prefix) = env_prefix {
        builder = builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );
    }

    builder
        .build()
        .map_err(|e| OverridesError::Parse(e.to_string()))?
        .try_deserialize()
        .map_err(|e| OverridesError::Deserialize(e.to_string()))
}

/// First default-named overrides file present in `dir`.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    DEFAULT_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests;
