//! # apuforge-kernel
//!
//! Single source of truth for a local llama.cpp inference stack on AMD APUs.
//!
//! The kernel owns three static registries (models, hardware profiles,
//! endpoints) and the resolver that binds one selection from each into an
//! immutable [`ActiveConfiguration`]. Every artifact generator downstream
//! reads only that value.
//!
//! ## Quick Start
//!
//! ```rust
//! use apuforge_kernel::{Overrides, Registries, ServiceKind};
//!
//! let registries = Registries::builtin();
//! let overrides = Overrides::default().disable(ServiceKind::Reranking);
//! let active = registries.resolve(&overrides).unwrap();
//!
//! assert_eq!(active.enabled_services().len(), 2);
//! ```
//!
//! Switching a model or profile is just another `resolve` call with
//! different [`Overrides`]; nothing is patched in place.

pub mod active;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod hardware;
pub mod model;
pub mod registry;
pub mod resolve;
pub mod service;

pub use active::{ActiveConfiguration, GatewaySettings, PathSettings, RouteTimeouts, ServiceBinding};
pub use config::{OverridesError, load_overrides};
pub use endpoint::EndpointDefinition;
pub use error::{ConfigurationError, PortOwner, RegistryKind};
pub use hardware::{BuildKind, HardwareProfile};
pub use model::{ModelCatalog, ModelDefinition};
pub use registry::{Registries, Registry};
pub use resolve::{Overrides, ServiceOverrides, ServiceOverridesSet, resolve};
pub use service::ServiceKind;
