//! Endpoint registry: one listening service definition per service kind.

use crate::error::RegistryKind;
use crate::registry::Registry;
use crate::service::ServiceKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDefinition {
    pub port: u16,
    pub mode: ServiceKind,
    /// Concurrent decoding slots (`--parallel`).
    pub parallel: u32,
    /// OpenAI-compatible model names clients may request.
    pub aliases: Vec<String>,
    pub flags: Vec<String>,
}

impl EndpointDefinition {
    /// Engine flags for this endpoint: mode switch, slot count, then the
    /// endpoint's own flags.
    pub fn engine_flags(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.flags.len() + 3);
        match self.mode {
            ServiceKind::Chat => {}
            ServiceKind::Embedding => out.push("--embeddings".to_string()),
            ServiceKind::Reranking => out.push("--reranking".to_string()),
        }
        out.push("--parallel".to_string());
        out.push(self.parallel.to_string());
        out.extend(self.flags.iter().cloned());
        out
    }

    /// Same endpoint listening on another port.
    pub fn with_port(&self, port: u16) -> Self {
        Self {
            port,
            ..self.clone()
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub(crate) fn builtin_endpoints() -> Registry<EndpointDefinition> {
    Registry::new(RegistryKind::Endpoint)
        .with(
            ServiceKind::Chat.as_str(),
            EndpointDefinition {
                port: 8000,
                mode: ServiceKind::Chat,
                parallel: 2,
                aliases: strings(&["gpt-4o", "gpt-4o-mini", "gpt-4", "gpt-3.5-turbo"]),
                flags: strings(&["--jinja", "--cache-reuse", "256"]),
            },
        )
        .with(
            ServiceKind::Embedding.as_str(),
            EndpointDefinition {
                port: 8001,
                mode: ServiceKind::Embedding,
                parallel: 4,
                aliases: strings(&[
                    "text-embedding-3-small",
                    "text-embedding-3-large",
                    "text-embedding-ada-002",
                ]),
                flags: strings(&["--pooling", "last"]),
            },
        )
        .with(
            ServiceKind::Reranking.as_str(),
            EndpointDefinition {
                port: 8002,
                mode: ServiceKind::Reranking,
                parallel: 2,
                aliases: strings(&["rerank-english-v3.0", "rerank-multilingual-v3.0"]),
                flags: Vec::new(),
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_flags_start_with_mode_switch() {
        let endpoints = builtin_endpoints();
        let embed = endpoints.get("embedding").unwrap();
        assert_eq!(
            embed.engine_flags(),
            vec!["--embeddings", "--parallel", "4", "--pooling", "last"]
        );

        let rerank = endpoints.get("reranking").unwrap();
        assert_eq!(rerank.engine_flags(), vec!["--reranking", "--parallel", "2"]);
    }

    #[test]
    fn chat_has_no_mode_switch() {
        let endpoints = builtin_endpoints();
        let chat = endpoints.get("chat").unwrap();
        assert_eq!(chat.engine_flags()[0], "--parallel");
    }

    #[test]
    fn with_port_leaves_original_untouched() {
        let endpoints = builtin_endpoints();
        let chat = endpoints.get("chat").unwrap();
        let moved = chat.with_port(9000);
        assert_eq!(moved.port, 9000);
        assert_eq!(chat.port, 8000);
        assert_eq!(moved.aliases, chat.aliases);
    }

    #[test]
    fn builtin_ports_are_distinct() {
        let endpoints = builtin_endpoints();
        let mut ports: Vec<u16> = endpoints.iter().map(|(_, e)| e.port).collect();
        ports.sort_unstable();
        ports.dedup();
        assert_eq!(ports.len(), endpoints.len());
    }
}
