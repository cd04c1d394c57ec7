//! `apuforge render`

use crate::cli::ArtifactArg;
use apuforge_foundation::{ArtifactKind, render_artifact};
use apuforge_kernel::{ActiveConfiguration, ServiceKind};

impl From<ArtifactArg> for ArtifactKind {
    fn from(arg: ArtifactArg) -> Self {
        match arg {
            ArtifactArg::Launch => Self::Launch,
            ArtifactArg::Unit => Self::Unit,
            ArtifactArg::Routing => Self::Routing,
            ArtifactArg::Aliases => Self::Aliases,
            ArtifactArg::Docs => Self::Docs,
        }
    }
}

/// Print one artifact to stdout, unchanged from what `generate` writes.
pub fn run(
    active: &ActiveConfiguration,
    artifact: ArtifactArg,
    service: Option<ServiceKind>,
) -> anyhow::Result<()> {
    let artifact = render_artifact(active, artifact.into(), service)?;
    print!("{}", artifact.contents);
    Ok(())
}
