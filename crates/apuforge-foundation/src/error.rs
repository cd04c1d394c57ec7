//! Generation and write errors.

use apuforge_kernel::ServiceKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerateError {
    #[error("the {0} service is disabled; nothing to render")]
    ServiceDisabled(ServiceKind),

    #[error("no service is enabled")]
    NoEnabledServices,

    #[error("failed to serialize document: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors raised while landing an artifact set on disk.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to atomically persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),
}
