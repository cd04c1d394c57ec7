//! Rendered artifacts and the full artifact set.

use crate::error::GenerateError;
use crate::{alias, docs, launch, routing, unit};
use apuforge_kernel::{ActiveConfiguration, ServiceKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The five document kinds derived from an active configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Per-service `KEY=value` launch parameters
    Launch,
    /// Per-service systemd unit
    Unit,
    /// Envoy path-prefix routing
    Routing,
    /// LiteLLM alias routing
    Aliases,
    /// Markdown summary
    Docs,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        Self::Launch,
        Self::Unit,
        Self::Routing,
        Self::Aliases,
        Self::Docs,
    ];

    /// Whether one document is rendered per enabled service.
    pub fn per_service(self) -> bool {
        matches!(self, Self::Launch | Self::Unit)
    }

    /// Output file name. Per-service kinds require `service`.
    pub fn file_name(self, service: Option<ServiceKind>) -> String {
        match (self, service) {
            (Self::Launch, Some(kind)) => kind.env_file_name(),
            (Self::Unit, Some(kind)) => kind.unit_name(),
            (Self::Launch, None) => "llama.env".to_string(),
            (Self::Unit, None) => "llama.service".to_string(),
            (Self::Routing, _) => routing::FILE_NAME.to_string(),
            (Self::Aliases, _) => alias::FILE_NAME.to_string(),
            (Self::Docs, _) => docs::FILE_NAME.to_string(),
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Launch => "launch",
            Self::Unit => "unit",
            Self::Routing => "routing",
            Self::Aliases => "aliases",
            Self::Docs => "docs",
        };
        f.write_str(name)
    }
}

/// A rendered document and the file name it is written under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub service: Option<ServiceKind>,
    pub file_name: String,
    pub contents: String,
}

impl Artifact {
    fn new(kind: ArtifactKind, service: Option<ServiceKind>, contents: String) -> Self {
        Self {
            kind,
            service,
            file_name: kind.file_name(service),
            contents,
        }
    }
}

/// Every artifact for one active configuration, in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    artifacts: Vec<Artifact>,
}

impl ArtifactSet {
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter()
    }

    pub fn get(&self, file_name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.file_name == file_name)
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.artifacts.iter().map(|a| a.file_name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl<'a> IntoIterator for &'a ArtifactSet {
    type Item = &'a Artifact;
    type IntoIter = std::slice::Iter<'a, Artifact>;

    fn into_iter(self) -> Self::IntoIter {
        self.artifacts.iter()
    }
}

/// Render one artifact. `service` is required for per-service kinds and
/// ignored otherwise.
pub fn render_artifact(
    active: &ActiveConfiguration,
    kind: ArtifactKind,
    service: Option<ServiceKind>,
) -> Result<Artifact, GenerateError> {
    let service = match (kind.per_service(), service) {
        (false, _) => None,
        (true, Some(service)) => Some(service),
        (true, None) => Some(
            active
                .primary_service()
                .ok_or(GenerateError::NoEnabledServices)?
                .kind(),
        ),
    };

    let contents = match (kind, service) {
        (ArtifactKind::Launch, Some(service)) => launch::render(active, service)?,
        (ArtifactKind::Unit, Some(service)) => unit::render(active, service)?,
        (ArtifactKind::Routing, _) => routing::render(active)?,
        (ArtifactKind::Aliases, _) => alias::render(active)?,
        (ArtifactKind::Docs, _) => docs::render(active),
        (ArtifactKind::Launch | ArtifactKind::Unit, None) => {
            return Err(GenerateError::NoEnabledServices);
        }
    };
    Ok(Artifact::new(kind, service, contents))
}

/// Render the full artifact set: launch file and unit per enabled service,
/// then routing, aliases and docs.
pub fn generate_all(active: &ActiveConfiguration) -> Result<ArtifactSet, GenerateError> {
    let mut artifacts = Vec::new();
    for binding in active.enabled_services() {
        let kind = binding.kind();
        artifacts.push(render_artifact(active, ArtifactKind::Launch, Some(kind))?);
        artifacts.push(render_artifact(active, ArtifactKind::Unit, Some(kind))?);
    }
    for kind in [ArtifactKind::Routing, ArtifactKind::Aliases, ArtifactKind::Docs] {
        artifacts.push(render_artifact(active, kind, None)?);
    }

    debug!(count = artifacts.len(), profile = active.profile_key(), "rendered artifact set");
    Ok(ArtifactSet { artifacts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use apuforge_kernel::{Overrides, Registries};

    #[test]
    fn full_set_order_is_stable() {
        let active = Registries::builtin().resolve(&Overrides::default()).unwrap();
        let set = generate_all(&active).unwrap();
        assert_eq!(
            set.file_names(),
            vec![
                "llama-chat.env",
                "llama-chat.service",
                "llama-embed.env",
                "llama-embed.service",
                "llama-rerank.env",
                "llama-rerank.service",
                "envoy.yaml",
                "litellm.yaml",
                "README.md",
            ]
        );
    }

    #[test]
    fn disabled_service_has_no_per_service_artifacts() {
        let overrides = Overrides::default().disable(ServiceKind::Embedding);
        let active = Registries::builtin().resolve(&overrides).unwrap();
        let set = generate_all(&active).unwrap();
        assert_eq!(set.len(), 7);
        assert!(set.get("llama-embed.env").is_none());
        assert!(set.get("llama-embed.service").is_none());
    }

    #[test]
    fn render_artifact_rejects_disabled_service() {
        let overrides = Overrides::default().disable(ServiceKind::Reranking);
        let active = Registries::builtin().resolve(&overrides).unwrap();
        let err = render_artifact(&active, ArtifactKind::Unit, Some(ServiceKind::Reranking))
            .unwrap_err();
        assert!(matches!(err, GenerateError::ServiceDisabled(ServiceKind::Reranking)));
    }

    #[test]
    fn per_service_render_defaults_to_primary() {
        let active = Registries::builtin().resolve(&Overrides::default()).unwrap();
        let artifact = render_artifact(&active, ArtifactKind::Launch, None).unwrap();
        assert_eq!(artifact.file_name, "llama-chat.env");
        assert_eq!(artifact.service, Some(ServiceKind::Chat));
    }
}
