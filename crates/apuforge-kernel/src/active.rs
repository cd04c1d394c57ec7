//! The resolved, immutable active configuration.
//!
//! An [`ActiveConfiguration`] is only produced by [`crate::resolve`], so
//! every value of this type has passed validation. Generators take it by
//! shared reference and never see a half-valid state.

use crate::endpoint::EndpointDefinition;
use crate::hardware::HardwareProfile;
use crate::model::ModelDefinition;
use crate::service::ServiceKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Filesystem locations the generated artifacts point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathSettings {
    /// Root directory holding the GGUF model folders.
    pub models_root: PathBuf,
    /// llama.cpp checkout; binaries live in `<root>/<build-dir>/bin`.
    pub engine_root: PathBuf,
    /// ROCm installation (ignored by Vulkan profiles).
    pub runtime_root: PathBuf,
    /// Where `apuforge generate` writes artifacts.
    pub output_dir: PathBuf,
    /// Where the launch-parameter files are installed on the host.
    pub config_root: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            models_root: PathBuf::from("/srv/llm/models"),
            engine_root: PathBuf::from("/opt/llama.cpp"),
            runtime_root: PathBuf::from("/opt/rocm"),
            output_dir: PathBuf::from("generated"),
            config_root: PathBuf::from("/etc/apuforge"),
        }
    }
}

/// Per-route upstream timeouts, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouteTimeouts {
    pub chat: u64,
    pub completions: u64,
    pub embeddings: u64,
    pub rerank: u64,
    pub models: u64,
    pub health: u64,
}

impl Default for RouteTimeouts {
    fn default() -> Self {
        Self {
            chat: 600,
            completions: 600,
            embeddings: 120,
            rerank: 120,
            models: 10,
            health: 5,
        }
    }
}

/// Reverse-proxy gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewaySettings {
    pub bind_address: String,
    pub listen_port: u16,
    pub admin_port: u16,
    /// Address the inference services bind to; the gateway dials it.
    pub service_host: String,
    /// Credential the alias-routing proxy presents upstream.
    pub api_key: String,
    pub timeouts: RouteTimeouts,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            listen_port: 4000,
            admin_port: 9901,
            service_host: "127.0.0.1".to_string(),
            api_key: "sk-local-no-key".to_string(),
            timeouts: RouteTimeouts::default(),
        }
    }
}

/// One service kind bound to a model and an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceBinding {
    kind: ServiceKind,
    enabled: bool,
    model_key: String,
    model: ModelDefinition,
    endpoint: EndpointDefinition,
    context_override: Option<u32>,
    extra_aliases: Vec<String>,
}

impl ServiceBinding {
    pub(crate) fn new(
        kind: ServiceKind,
        enabled: bool,
        model_key: String,
        model: ModelDefinition,
        endpoint: EndpointDefinition,
        context_override: Option<u32>,
        extra_aliases: Vec<String>,
    ) -> Self {
        Self {
            kind,
            enabled,
            model_key,
            model,
            endpoint,
            context_override,
            extra_aliases,
        }
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn model_key(&self) -> &str {
        &self.model_key
    }

    pub fn model(&self) -> &ModelDefinition {
        &self.model
    }

    pub fn endpoint(&self) -> &EndpointDefinition {
        &self.endpoint
    }

    pub fn port(&self) -> u16 {
        self.endpoint.port
    }

    pub fn context_override(&self) -> Option<u32> {
        self.context_override
    }

    /// Effective context size: the override if given, else the model default.
    pub fn context_size(&self) -> u32 {
        self.context_override.unwrap_or(self.model.context_default)
    }

    pub fn extra_aliases(&self) -> &[String] {
        &self.extra_aliases
    }

    /// Every request-facing name routed to this service: catalog key,
    /// endpoint aliases, then extra aliases.
    pub fn aliases(&self) -> Vec<&str> {
        std::iter::once(self.model_key.as_str())
            .chain(self.endpoint.aliases.iter().map(String::as_str))
            .chain(self.extra_aliases.iter().map(String::as_str))
            .collect()
    }
}

/// Root value every generator reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveConfiguration {
    profile_key: String,
    hardware: HardwareProfile,
    bindings: [ServiceBinding; 3],
    gateway: GatewaySettings,
    paths: PathSettings,
}

impl ActiveConfiguration {
    pub(crate) fn new(
        profile_key: String,
        hardware: HardwareProfile,
        bindings: [ServiceBinding; 3],
        gateway: GatewaySettings,
        paths: PathSettings,
    ) -> Self {
        Self {
            profile_key,
            hardware,
            bindings,
            gateway,
            paths,
        }
    }

    pub fn profile_key(&self) -> &str {
        &self.profile_key
    }

    pub fn hardware(&self) -> &HardwareProfile {
        &self.hardware
    }

    pub fn gateway(&self) -> &GatewaySettings {
        &self.gateway
    }

    pub fn paths(&self) -> &PathSettings {
        &self.paths
    }

    pub fn binding(&self, kind: ServiceKind) -> &ServiceBinding {
        match kind {
            ServiceKind::Chat => &self.bindings[0],
            ServiceKind::Embedding => &self.bindings[1],
            ServiceKind::Reranking => &self.bindings[2],
        }
    }

    /// All bindings, enabled or not, in service order.
    pub fn bindings(&self) -> &[ServiceBinding] {
        &self.bindings
    }

    /// Enabled bindings in service order. Generators map over this list.
    pub fn enabled_services(&self) -> Vec<&ServiceBinding> {
        self.bindings.iter().filter(|b| b.enabled).collect()
    }

    pub fn is_enabled(&self, kind: ServiceKind) -> bool {
        self.binding(kind).enabled
    }

    /// Service that takes model listing, health and unmatched paths: chat
    /// when enabled, otherwise the first enabled service.
    pub fn primary_service(&self) -> Option<&ServiceBinding> {
        let chat = self.binding(ServiceKind::Chat);
        if chat.enabled {
            Some(chat)
        } else {
            self.bindings.iter().find(|b| b.enabled)
        }
    }

    /// Absolute path of a binding's model file.
    pub fn model_path(&self, binding: &ServiceBinding) -> PathBuf {
        self.paths.models_root.join(&binding.model.file)
    }

    /// Inference server binary for the active profile's build flavour.
    pub fn engine_binary(&self) -> PathBuf {
        self.paths
            .engine_root
            .join(self.hardware.build.build_dir())
            .join("bin")
            .join("llama-server")
    }

    /// Installed location of a service's launch-parameter file.
    pub fn launch_file_path(&self, kind: ServiceKind) -> PathBuf {
        self.paths.config_root.join(kind.env_file_name())
    }

    /// Upstream address the gateway dials for a binding.
    pub fn upstream_address(&self, binding: &ServiceBinding) -> String {
        format!("{}:{}", self.gateway.service_host, binding.port())
    }

    /// Profile defaults followed by endpoint flags. Duplicates are kept so
    /// endpoint flags come last.
    pub fn extra_flags(&self, binding: &ServiceBinding) -> Vec<String> {
        self.hardware
            .default_flags
            .iter()
            .cloned()
            .chain(binding.endpoint.engine_flags())
            .collect()
    }

    /// Library directory prepended to `LD_LIBRARY_PATH` for ROCm builds.
    pub fn runtime_library_dir(&self) -> Option<PathBuf> {
        match self.hardware.build {
            crate::hardware::BuildKind::Rocm => Some(self.paths.runtime_root.join("lib")),
            crate::hardware::BuildKind::Vulkan => None,
        }
    }
}
