//! Active configuration resolution.
//!
//! `resolve` is a pure function of the registries and the caller's
//! overrides. Validation runs in a fixed order and stops at the first
//! violation: registry keys, context sizes, alias shape, alias
//! collisions, port collisions.

use crate::active::{ActiveConfiguration, GatewaySettings, PathSettings, ServiceBinding};
use crate::error::{ConfigurationError, PortOwner};
use crate::model::ModelCatalog;
use crate::registry::Registries;
use crate::service::ServiceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Caller-supplied choices for one service kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceOverrides {
    pub enable: bool,
    /// Catalog key; `None` selects the catalog default for the kind.
    pub model: Option<String>,
    pub context_size: Option<u32>,
    pub port: Option<u16>,
    pub extra_aliases: Vec<String>,
}

impl Default for ServiceOverrides {
    fn default() -> Self {
        Self {
            enable: true,
            model: None,
            context_size: None,
            port: None,
            extra_aliases: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceOverridesSet {
    pub chat: ServiceOverrides,
    pub embedding: ServiceOverrides,
    pub reranking: ServiceOverrides,
}

impl ServiceOverridesSet {
    pub fn get(&self, kind: ServiceKind) -> &ServiceOverrides {
        match kind {
            ServiceKind::Chat => &self.chat,
            ServiceKind::Embedding => &self.embedding,
            ServiceKind::Reranking => &self.reranking,
        }
    }

    pub fn get_mut(&mut self, kind: ServiceKind) -> &mut ServiceOverrides {
        match kind {
            ServiceKind::Chat => &mut self.chat,
            ServiceKind::Embedding => &mut self.embedding,
            ServiceKind::Reranking => &mut self.reranking,
        }
    }
}

/// Everything a caller may choose. Missing fields fall back to defaults,
/// so partial override files deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Overrides {
    pub hardware_profile: String,
    pub paths: PathSettings,
    pub gateway: GatewaySettings,
    pub services: ServiceOverridesSet,
}

impl Default for Overrides {
    fn default() -> Self {
        Self {
            hardware_profile: "rocm-gfx1151".to_string(),
            paths: PathSettings::default(),
            gateway: GatewaySettings::default(),
            services: ServiceOverridesSet::default(),
        }
    }
}

impl Overrides {
    pub fn with_profile(mut self, key: impl Into<String>) -> Self {
        self.hardware_profile = key.into();
        self
    }

    pub fn with_model(mut self, kind: ServiceKind, key: impl Into<String>) -> Self {
        self.services.get_mut(kind).model = Some(key.into());
        self
    }

    pub fn with_context(mut self, kind: ServiceKind, context_size: u32) -> Self {
        self.services.get_mut(kind).context_size = Some(context_size);
        self
    }

    pub fn with_port(mut self, kind: ServiceKind, port: u16) -> Self {
        self.services.get_mut(kind).port = Some(port);
        self
    }

    pub fn with_alias(mut self, kind: ServiceKind, alias: impl Into<String>) -> Self {
        self.services.get_mut(kind).extra_aliases.push(alias.into());
        self
    }

    pub fn enable(mut self, kind: ServiceKind) -> Self {
        self.services.get_mut(kind).enable = true;
        self
    }

    pub fn disable(mut self, kind: ServiceKind) -> Self {
        self.services.get_mut(kind).enable = false;
        self
    }
}

/// Build an [`ActiveConfiguration`] from `registries` and `overrides`.
pub fn resolve(
    registries: &Registries,
    overrides: &Overrides,
) -> Result<ActiveConfiguration, ConfigurationError> {
    let hardware = registries.hardware.get(&overrides.hardware_profile)?.clone();

    let mut bindings = Vec::with_capacity(ServiceKind::ALL.len());
    for kind in ServiceKind::ALL {
        bindings.push(bind_service(registries, kind, overrides.services.get(kind))?);
    }

    for binding in &bindings {
        check_context(binding)?;
    }
    for binding in &bindings {
        check_alias_shape(binding)?;
    }
    check_gateway(&overrides.gateway)?;

    let enabled: Vec<&ServiceBinding> = bindings.iter().filter(|b| b.enabled()).collect();
    if enabled.is_empty() {
        return Err(ConfigurationError::Invalid(
            "at least one service must be enabled".to_string(),
        ));
    }
    check_alias_collisions(&enabled)?;
    check_port_collisions(&overrides.gateway, &enabled)?;

    let bindings: [ServiceBinding; 3] = bindings
        .try_into()
        .map_err(|_| ConfigurationError::Invalid("expected one binding per service".into()))?;

    debug!(
        profile = %overrides.hardware_profile,
        enabled = enabled_count(&bindings),
        "resolved active configuration"
    );

    Ok(ActiveConfiguration::new(
        overrides.hardware_profile.clone(),
        hardware,
        bindings,
        overrides.gateway.clone(),
        overrides.paths.clone(),
    ))
}

fn enabled_count(bindings: &[ServiceBinding]) -> usize {
    bindings.iter().filter(|b| b.enabled()).count()
}

fn bind_service(
    registries: &Registries,
    kind: ServiceKind,
    svc: &ServiceOverrides,
) -> Result<ServiceBinding, ConfigurationError> {
    let key = svc
        .model
        .clone()
        .unwrap_or_else(|| ModelCatalog::default_key(kind).to_string());
    let model = registries.models.get(kind, &key)?.clone();

    let endpoint = registries.endpoint(kind)?;
    let endpoint = match svc.port {
        Some(port) => endpoint.with_port(port),
        None => endpoint.clone(),
    };

    Ok(ServiceBinding::new(
        kind,
        svc.enable,
        key,
        model,
        endpoint,
        svc.context_size,
        svc.extra_aliases.clone(),
    ))
}

fn check_context(binding: &ServiceBinding) -> Result<(), ConfigurationError> {
    let requested = binding.context_size();
    if requested == 0 {
        return Err(ConfigurationError::Invalid(format!(
            "context size for the {} service must be greater than zero",
            binding.kind()
        )));
    }
    let max = binding.model().context_max;
    if requested > max {
        return Err(ConfigurationError::InvalidContextSize {
            service: binding.kind(),
            model: binding.model_key().to_string(),
            requested,
            max,
        });
    }
    Ok(())
}

fn check_alias_shape(binding: &ServiceBinding) -> Result<(), ConfigurationError> {
    for alias in binding.aliases() {
        if alias.is_empty() || alias.chars().any(is_forbidden_alias_char) {
            return Err(ConfigurationError::Invalid(format!(
                "alias '{alias}' of the {} service must be non-empty and contain no whitespace, control characters, quotes or '|'",
                binding.kind()
            )));
        }
    }
    Ok(())
}

/// Aliases land in YAML scalars and markdown table cells unescaped.
fn is_forbidden_alias_char(c: char) -> bool {
    c.is_whitespace() || c.is_control() || matches!(c, '|' | '"' | '\'' | '`')
}

fn check_gateway(gateway: &GatewaySettings) -> Result<(), ConfigurationError> {
    let t = &gateway.timeouts;
    let timeouts = [
        ("chat", t.chat),
        ("completions", t.completions),
        ("embeddings", t.embeddings),
        ("rerank", t.rerank),
        ("models", t.models),
        ("health", t.health),
    ];
    for (route, secs) in timeouts {
        if secs == 0 {
            return Err(ConfigurationError::Invalid(format!(
                "gateway timeout for the {route} route must be greater than zero"
            )));
        }
    }
    Ok(())
}

fn check_alias_collisions(enabled: &[&ServiceBinding]) -> Result<(), ConfigurationError> {
    let mut owners: BTreeMap<&str, ServiceKind> = BTreeMap::new();
    for binding in enabled {
        for alias in binding.aliases() {
            if let Some(first) = owners.insert(alias, binding.kind()) {
                return Err(ConfigurationError::AliasCollision {
                    alias: alias.to_string(),
                    first,
                    second: binding.kind(),
                });
            }
        }
    }
    Ok(())
}

fn check_port_collisions(
    gateway: &GatewaySettings,
    enabled: &[&ServiceBinding],
) -> Result<(), ConfigurationError> {
    let mut owners: BTreeMap<u16, PortOwner> = BTreeMap::new();
    let claims = [
        (gateway.listen_port, PortOwner::GatewayListener),
        (gateway.admin_port, PortOwner::GatewayAdmin),
    ]
    .into_iter()
    .chain(
        enabled
            .iter()
            .map(|b| (b.port(), PortOwner::Service(b.kind()))),
    );

    for (port, owner) in claims {
        if port == 0 {
            return Err(ConfigurationError::Invalid(format!("the {owner} has port 0")));
        }
        if let Some(first) = owners.insert(port, owner) {
            return Err(ConfigurationError::PortCollision {
                port,
                first,
                second: owner,
            });
        }
    }
    Ok(())
}
