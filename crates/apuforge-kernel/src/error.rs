//! Configuration error taxonomy.
//!
//! Every variant is fatal to generation. Nothing is clamped or corrected:
//! the first violated invariant is reported together with enough context
//! for the operator to fix the input.

use crate::service::ServiceKind;
use thiserror::Error;

/// Which registry (or key space) a lookup was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    ChatModel,
    EmbeddingModel,
    RerankingModel,
    HardwareProfile,
    Endpoint,
    Service,
}

impl std::fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ChatModel => "chat model",
            Self::EmbeddingModel => "embedding model",
            Self::RerankingModel => "reranking model",
            Self::HardwareProfile => "hardware profile",
            Self::Endpoint => "endpoint",
            Self::Service => "service kind",
        };
        f.write_str(name)
    }
}

/// Something that listens on a TCP port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortOwner {
    GatewayListener,
    GatewayAdmin,
    Service(ServiceKind),
}

impl std::fmt::Display for PortOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GatewayListener => f.write_str("gateway listener"),
            Self::GatewayAdmin => f.write_str("gateway admin"),
            Self::Service(kind) => write!(f, "{kind} service"),
        }
    }
}

/// An invalid or inconsistent active configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("unknown {kind} '{key}' (valid: {})", .valid.join(", "))]
    UnknownKey {
        kind: RegistryKind,
        key: String,
        valid: Vec<String>,
    },

    #[error("context size {requested} for the {service} service exceeds the maximum {max} of model '{model}'")]
    InvalidContextSize {
        service: ServiceKind,
        model: String,
        requested: u32,
        max: u32,
    },

    #[error("alias '{alias}' resolves to both the {first} and {second} services")]
    AliasCollision {
        alias: String,
        first: ServiceKind,
        second: ServiceKind,
    },

    #[error("port {port} is claimed by both the {first} and the {second}")]
    PortCollision {
        port: u16,
        first: PortOwner,
        second: PortOwner,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigurationError {
    /// Operator-facing remediation for this error.
    pub fn hint(&self) -> String {
        match self {
            Self::UnknownKey { valid, .. } => format!("choose one of: {}", valid.join(", ")),
            Self::InvalidContextSize { max, .. } => {
                format!("set context_size to at most {max} or pick a model with a larger window")
            }
            Self::AliasCollision { alias, second, .. } => {
                format!("remove '{alias}' from the {second} service's extra_aliases")
            }
            Self::PortCollision { second, .. } => {
                format!("give the {second} a port that no other listener uses")
            }
            Self::Invalid(_) => "fix the value named above and re-run".to_string(),
        }
    }
}
