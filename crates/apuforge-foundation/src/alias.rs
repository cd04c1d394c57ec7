//! LiteLLM alias routing (`litellm.yaml`).
//!
//! Dispatches on the request's `model` field instead of its path: one
//! `model_list` entry per alias of every enabled service.

use crate::GENERATED_HEADER;
use crate::error::GenerateError;
use apuforge_kernel::{ActiveConfiguration, ServiceKind};
use serde::Serialize;

pub const FILE_NAME: &str = "litellm.yaml";

/// One alias bound to a service upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub alias: String,
    pub service: ServiceKind,
    /// OpenAI-compatible base URL of the service.
    pub api_base: String,
}

/// Alias entries for all enabled services, in service then alias order.
pub fn alias_entries(active: &ActiveConfiguration) -> Vec<AliasEntry> {
    active
        .enabled_services()
        .into_iter()
        .flat_map(|binding| {
            let api_base = format!("http://{}/v1", active.upstream_address(binding));
            binding
                .aliases()
                .into_iter()
                .map(move |alias| AliasEntry {
                    alias: alias.to_string(),
                    service: binding.kind(),
                    api_base: api_base.clone(),
                })
        })
        .collect()
}

#[derive(Serialize)]
struct LiteLlmConfig {
    model_list: Vec<ModelEntry>,
    litellm_settings: Settings,
}

#[derive(Serialize)]
struct ModelEntry {
    model_name: String,
    litellm_params: Params,
    model_info: ModelInfo,
}

#[derive(Serialize)]
struct Params {
    model: String,
    api_base: String,
    api_key: String,
}

#[derive(Serialize)]
struct ModelInfo {
    mode: &'static str,
}

#[derive(Serialize)]
struct Settings {
    drop_params: bool,
    request_timeout: u64,
}

fn mode(kind: ServiceKind) -> &'static str {
    match kind {
        ServiceKind::Chat => "chat",
        ServiceKind::Embedding => "embedding",
        ServiceKind::Reranking => "rerank",
    }
}

pub fn render(active: &ActiveConfiguration) -> Result<String, GenerateError> {
    let gateway = active.gateway();
    let model_list = alias_entries(active)
        .into_iter()
        .map(|entry| {
            let upstream_model = active.binding(entry.service).model_key().to_string();
            ModelEntry {
                model_name: entry.alias,
                litellm_params: Params {
                    model: format!("openai/{upstream_model}"),
                    api_base: entry.api_base,
                    api_key: gateway.api_key.clone(),
                },
                model_info: ModelInfo {
                    mode: mode(entry.service),
                },
            }
        })
        .collect();

    let doc = LiteLlmConfig {
        model_list,
        litellm_settings: Settings {
            drop_params: true,
            request_timeout: gateway.timeouts.chat,
        },
    };
    let body = serde_yaml::to_string(&doc)?;
    Ok(format!("# {GENERATED_HEADER}\n{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use apuforge_kernel::{Overrides, Registries};
    use serde_yaml::Value;

    #[test]
    fn every_alias_maps_to_its_service_port() {
        let active = Registries::builtin().resolve(&Overrides::default()).unwrap();
        let doc: Value = serde_yaml::from_str(&render(&active).unwrap()).unwrap();
        let list = doc["model_list"].as_sequence().unwrap();

        let expected: usize = active
            .enabled_services()
            .iter()
            .map(|b| b.aliases().len())
            .sum();
        assert_eq!(list.len(), expected);

        let gpt4o = list
            .iter()
            .find(|e| e["model_name"].as_str() == Some("gpt-4o"))
            .unwrap();
        assert_eq!(
            gpt4o["litellm_params"]["api_base"].as_str(),
            Some("http://127.0.0.1:8000/v1")
        );
        assert_eq!(gpt4o["litellm_params"]["model"].as_str(), Some("openai/devstral2-123b"));
        assert_eq!(gpt4o["litellm_params"]["api_key"].as_str(), Some("sk-local-no-key"));
    }

    #[test]
    fn disabled_service_aliases_are_absent() {
        let overrides = Overrides::default().disable(ServiceKind::Embedding);
        let active = Registries::builtin().resolve(&overrides).unwrap();
        let entries = alias_entries(&active);
        assert!(entries.iter().all(|e| e.service != ServiceKind::Embedding));
        assert!(!render(&active).unwrap().contains("text-embedding-3-small"));
    }

    #[test]
    fn extra_aliases_follow_builtin_ones() {
        let overrides = Overrides::default().with_alias(ServiceKind::Reranking, "my-reranker");
        let active = Registries::builtin().resolve(&overrides).unwrap();
        let rerank: Vec<String> = alias_entries(&active)
            .into_iter()
            .filter(|e| e.service == ServiceKind::Reranking)
            .map(|e| e.alias)
            .collect();
        assert_eq!(
            rerank,
            vec!["qwen3-reranker-4b", "rerank-english-v3.0", "rerank-multilingual-v3.0", "my-reranker"]
        );
    }
}
