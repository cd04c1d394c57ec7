//! Service kinds served by the stack.

use crate::error::{ConfigurationError, RegistryKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The three inference services a host can run side by side.
///
/// Ordering is significant: generators iterate services in declaration
/// order, which keeps every rendered document stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Chat,
    Embedding,
    Reranking,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 3] = [Self::Chat, Self::Embedding, Self::Reranking];

    /// Short name used in file, unit and cluster names.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Embedding => "embed",
            Self::Reranking => "rerank",
        }
    }

    /// Canonical lowercase name (`chat`, `embedding`, `reranking`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Embedding => "embedding",
            Self::Reranking => "reranking",
        }
    }

    /// Upstream cluster name in the reverse-proxy document.
    pub fn cluster_name(self) -> String {
        format!("llama_{}", self.slug())
    }

    /// Process-supervisor unit file name.
    pub fn unit_name(self) -> String {
        format!("llama-{}.service", self.slug())
    }

    /// Launch-parameter file name.
    pub fn env_file_name(self) -> String {
        format!("llama-{}.env", self.slug())
    }

    pub(crate) fn model_registry(self) -> RegistryKind {
        match self {
            Self::Chat => RegistryKind::ChatModel,
            Self::Embedding => RegistryKind::EmbeddingModel,
            Self::Reranking => RegistryKind::RerankingModel,
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chat" | "completion" | "completions" => Ok(Self::Chat),
            "embedding" | "embeddings" | "embed" => Ok(Self::Embedding),
            "reranking" | "rerank" | "reranker" => Ok(Self::Reranking),
            other => Err(ConfigurationError::UnknownKey {
                kind: RegistryKind::Service,
                key: other.to_string(),
                valid: Self::ALL.iter().map(|k| k.as_str().to_string()).collect(),
            }),
        }
    }
}
