//! # apuforge-foundation
//!
//! Artifact generators over a resolved
//! [`ActiveConfiguration`](apuforge_kernel::ActiveConfiguration), and the
//! writer that lands them on disk.
//!
//! Every generator is a pure function of the active configuration. Running
//! them twice on the same value yields byte-identical documents.
//!
//! ```rust
//! use apuforge_foundation::generate_all;
//! use apuforge_kernel::{Overrides, Registries};
//!
//! let active = Registries::builtin().resolve(&Overrides::default()).unwrap();
//! let set = generate_all(&active).unwrap();
//! assert!(set.get("envoy.yaml").is_some());
//! ```

pub mod alias;
pub mod artifact;
pub mod docs;
pub mod error;
pub mod launch;
pub mod routing;
pub mod unit;
pub mod writer;

pub use artifact::{Artifact, ArtifactKind, ArtifactSet, generate_all, render_artifact};
pub use error::{GenerateError, WriteError};
pub use writer::{ArtifactWriter, DriftReport, MANIFEST_FILE, WriteReport};

/// Header line placed at the top of every generated text document.
pub(crate) const GENERATED_HEADER: &str = "Generated by apuforge. Do not edit; re-run `apuforge generate`.";
