//! Model catalog.
//!
//! Paths are relative to the models root chosen at resolution time, so the
//! catalog stays host-independent.

use crate::error::{ConfigurationError, RegistryKind};
use crate::registry::Registry;
use crate::service::ServiceKind;
use serde::{Deserialize, Serialize};

/// A quantized GGUF model the engine can serve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub display_name: String,
    /// GGUF file (first shard for split models), relative to the models root.
    pub file: String,
    pub size_gb: f64,
    pub context_max: u32,
    pub context_default: u32,
    pub quantization: String,
    pub benchmark_score: Option<f64>,
    pub notes: Option<String>,
}

impl ModelDefinition {
    fn new(
        display_name: &str,
        file: &str,
        size_gb: f64,
        context_max: u32,
        context_default: u32,
        quantization: &str,
    ) -> Self {
        Self {
            display_name: display_name.to_string(),
            file: file.to_string(),
            size_gb,
            context_max,
            context_default,
            quantization: quantization.to_string(),
            benchmark_score: None,
            notes: None,
        }
    }

    fn score(mut self, score: f64) -> Self {
        self.benchmark_score = Some(score);
        self
    }

    fn note(mut self, note: &str) -> Self {
        self.notes = Some(note.to_string());
        self
    }
}

/// Models grouped by the service kind they can back.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    chat: Registry<ModelDefinition>,
    embedding: Registry<ModelDefinition>,
    reranking: Registry<ModelDefinition>,
}

impl ModelCatalog {
    pub fn new(
        chat: Registry<ModelDefinition>,
        embedding: Registry<ModelDefinition>,
        reranking: Registry<ModelDefinition>,
    ) -> Self {
        Self {
            chat,
            embedding,
            reranking,
        }
    }

    pub fn for_kind(&self, kind: ServiceKind) -> &Registry<ModelDefinition> {
        match kind {
            ServiceKind::Chat => &self.chat,
            ServiceKind::Embedding => &self.embedding,
            ServiceKind::Reranking => &self.reranking,
        }
    }

    pub fn get(&self, kind: ServiceKind, key: &str) -> Result<&ModelDefinition, ConfigurationError> {
        self.for_kind(kind).get(key)
    }

    /// Catalog key selected when no override names a model.
    pub fn default_key(kind: ServiceKind) -> &'static str {
        match kind {
            ServiceKind::Chat => "devstral2-123b",
            ServiceKind::Embedding => "qwen3-embedding-8b",
            ServiceKind::Reranking => "qwen3-reranker-4b",
        }
    }

    pub fn builtin() -> Self {
        let chat = Registry::new(RegistryKind::ChatModel)
            .with(
                "devstral2-123b",
                ModelDefinition::new(
                    "Devstral 2 123B",
                    "devstral2-123b/Devstral-2-123B-Instruct-2512-Q4_K_M-00001-of-00002.gguf",
                    74.9,
                    262_144,
                    65_536,
                    "Q4_K_M",
                )
                .score(72.2)
                .note("dense agentic coding model"),
            )
            .with(
                "qwen3-coder-30b",
                ModelDefinition::new(
                    "Qwen3 Coder 30B A3B",
                    "qwen3-coder-30b/Qwen3-Coder-30B-A3B-Instruct-Q8_0.gguf",
                    32.5,
                    262_144,
                    131_072,
                    "Q8_0",
                )
                .note("MoE, 3B active parameters"),
            )
            .with(
                "gpt-oss-120b",
                ModelDefinition::new(
                    "gpt-oss 120B",
                    "gpt-oss-120b/gpt-oss-120b-mxfp4-00001-of-00003.gguf",
                    63.4,
                    131_072,
                    131_072,
                    "MXFP4",
                ),
            )
            .with(
                "glm-4.5-air",
                ModelDefinition::new(
                    "GLM 4.5 Air",
                    "glm-4.5-air/GLM-4.5-Air-Q4_K_M-00001-of-00002.gguf",
                    72.9,
                    131_072,
                    65_536,
                    "Q4_K_M",
                ),
            );

        let embedding = Registry::new(RegistryKind::EmbeddingModel)
            .with(
                "qwen3-embedding-8b",
                ModelDefinition::new(
                    "Qwen3 Embedding 8B",
                    "qwen3-embedding-8b/Qwen3-Embedding-8B-Q8_0.gguf",
                    8.0,
                    40_960,
                    8_192,
                    "Q8_0",
                ),
            )
            .with(
                "nomic-embed-v1.5",
                ModelDefinition::new(
                    "Nomic Embed Text v1.5",
                    "nomic-embed-v1.5/nomic-embed-text-v1.5.f16.gguf",
                    0.27,
                    8_192,
                    8_192,
                    "F16",
                ),
            );

        let reranking = Registry::new(RegistryKind::RerankingModel)
            .with(
                "qwen3-reranker-4b",
                ModelDefinition::new(
                    "Qwen3 Reranker 4B",
                    "qwen3-reranker-4b/Qwen3-Reranker-4B-Q8_0.gguf",
                    4.3,
                    40_960,
                    8_192,
                    "Q8_0",
                ),
            )
            .with(
                "bge-reranker-v2-m3",
                ModelDefinition::new(
                    "BGE Reranker v2 M3",
                    "bge-reranker-v2-m3/bge-reranker-v2-m3-Q8_0.gguf",
                    0.6,
                    8_192,
                    8_192,
                    "Q8_0",
                ),
            );

        Self::new(chat, embedding, reranking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_exist_in_catalog() {
        let catalog = ModelCatalog::builtin();
        for kind in ServiceKind::ALL {
            assert!(catalog.get(kind, ModelCatalog::default_key(kind)).is_ok());
        }
    }

    #[test]
    fn default_context_fits_every_model() {
        let catalog = ModelCatalog::builtin();
        for kind in ServiceKind::ALL {
            for (key, model) in catalog.for_kind(kind).iter() {
                assert!(
                    model.context_default <= model.context_max,
                    "{key}: default context exceeds max"
                );
            }
        }
    }

    #[test]
    fn devstral_has_full_context_window() {
        let catalog = ModelCatalog::builtin();
        let model = catalog.get(ServiceKind::Chat, "devstral2-123b").unwrap();
        assert_eq!(model.context_max, 262_144);
    }

    #[test]
    fn lookup_is_scoped_by_kind() {
        let catalog = ModelCatalog::builtin();
        let err = catalog
            .get(ServiceKind::Embedding, "devstral2-123b")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::UnknownKey {
                kind: RegistryKind::EmbeddingModel,
                ..
            }
        ));
    }
}
