//! Keyed, read-only registries.
//!
//! Registries are populated once and never mutated afterwards. Lookups
//! hand out shared references; a miss yields
//! [`ConfigurationError::UnknownKey`] carrying every valid key.

use crate::endpoint::{self, EndpointDefinition};
use crate::error::{ConfigurationError, RegistryKind};
use crate::hardware::{self, HardwareProfile};
use crate::model::ModelCatalog;
use crate::resolve::{self, Overrides};
use crate::active::ActiveConfiguration;
use crate::service::ServiceKind;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// An ordered map of definitions keyed by name.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    kind: RegistryKind,
    entries: BTreeMap<String, T>,
}

impl<T> Registry<T> {
    pub fn new(kind: RegistryKind) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    /// Add an entry while building the registry.
    pub fn with(mut self, key: impl Into<String>, value: T) -> Self {
        self.entries.insert(key.into(), value);
        self
    }

    pub fn kind(&self) -> RegistryKind {
        self.kind
    }

    pub fn get(&self, key: &str) -> Result<&T, ConfigurationError> {
        self.entries
            .get(key)
            .ok_or_else(|| ConfigurationError::UnknownKey {
                kind: self.kind,
                key: key.to_string(),
                valid: self.keys().into_iter().map(str::to_string).collect(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The three registries the resolver reads from.
#[derive(Debug, Clone)]
pub struct Registries {
    pub models: ModelCatalog,
    pub hardware: Registry<HardwareProfile>,
    pub endpoints: Registry<EndpointDefinition>,
}

impl Registries {
    /// Build the registries shipped with apuforge.
    pub fn builtin() -> Self {
        Self {
            models: ModelCatalog::builtin(),
            hardware: hardware::builtin_profiles(),
            endpoints: endpoint::builtin_endpoints(),
        }
    }

    /// Process-wide instance of [`Registries::builtin`], built on first use.
    pub fn shared() -> &'static Registries {
        static SHARED: OnceLock<Registries> = OnceLock::new();
        SHARED.get_or_init(Registries::builtin)
    }

    pub fn endpoint(&self, kind: ServiceKind) -> Result<&EndpointDefinition, ConfigurationError> {
        self.endpoints.get(kind.as_str())
    }

    /// Resolve `overrides` against these registries.
    pub fn resolve(&self, overrides: &Overrides) -> Result<ActiveConfiguration, ConfigurationError> {
        resolve::resolve(self, overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_miss_reports_valid_keys() {
        let registry = Registry::new(RegistryKind::HardwareProfile)
            .with("b", 2)
            .with("a", 1);
        let err = registry.get("c").unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownKey {
                kind: RegistryKind::HardwareProfile,
                key: "c".to_string(),
                valid: vec!["a".to_string(), "b".to_string()],
            }
        );
    }

    #[test]
    fn keys_are_sorted() {
        let registry = Registry::new(RegistryKind::Endpoint)
            .with("zeta", ())
            .with("alpha", ());
        assert_eq!(registry.keys(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn builtin_has_an_endpoint_per_service() {
        let registries = Registries::builtin();
        for kind in ServiceKind::ALL {
            let endpoint = registries.endpoint(kind).unwrap();
            assert_eq!(endpoint.mode, kind);
        }
    }

    #[test]
    fn shared_registries_are_built_once() {
        let a = Registries::shared() as *const Registries;
        let b = Registries::shared() as *const Registries;
        assert_eq!(a, b);
    }
}
