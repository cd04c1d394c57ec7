//! `apuforge list`

use crate::cli::ListTarget;
use crate::output::Table;
use apuforge_kernel::{ModelCatalog, Registries, ServiceKind};

pub fn run(registries: &Registries, what: ListTarget, kind: Option<ServiceKind>) -> anyhow::Result<()> {
    let table = match what {
        ListTarget::Models => models(&registries.models, kind),
        ListTarget::Profiles => profiles(registries),
        ListTarget::Endpoints => endpoints(registries),
    };
    println!("{table}");
    Ok(())
}

fn models(catalog: &ModelCatalog, kind: Option<ServiceKind>) -> Table {
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => ServiceKind::ALL.to_vec(),
    };

    let mut table = Table::builder().headers(&[
        "Key", "Service", "Name", "Quant", "Size (GB)", "Context max", "Context default", "Score",
    ]);
    for kind in kinds {
        let default_key = ModelCatalog::default_key(kind);
        for (key, model) in catalog.for_kind(kind).iter() {
            let label = if key == default_key {
                format!("{key} (default)")
            } else {
                key.to_string()
            };
            table = table.row(&[
                label,
                kind.to_string(),
                model.display_name.clone(),
                model.quantization.clone(),
                format!("{:.1}", model.size_gb),
                model.context_max.to_string(),
                model.context_default.to_string(),
                model
                    .benchmark_score
                    .map(|s| format!("{s:.1}"))
                    .unwrap_or_else(|| "-".to_string()),
            ]);
        }
    }
    table.build()
}

fn profiles(registries: &Registries) -> Table {
    let mut table = Table::builder().headers(&["Key", "Name", "Build", "GPU arch", "Memory (GiB)", "Flags"]);
    for (key, profile) in registries.hardware.iter() {
        table = table.row(&[
            key.to_string(),
            profile.name.clone(),
            profile.build.to_string(),
            profile.gpu_arch.clone().unwrap_or_else(|| "-".to_string()),
            format!("{}/{}", profile.vram_available_gb, profile.vram_total_gb),
            profile.default_flags.join(" "),
        ]);
    }
    table.build()
}

fn endpoints(registries: &Registries) -> Table {
    let mut table = Table::builder().headers(&["Service", "Port", "Slots", "Engine flags", "Aliases"]);
    for kind in ServiceKind::ALL {
        if let Ok(endpoint) = registries.endpoint(kind) {
            table = table.row(&[
                kind.to_string(),
                endpoint.port.to_string(),
                endpoint.parallel.to_string(),
                endpoint.engine_flags().join(" "),
                endpoint.aliases.join(", "),
            ]);
        }
    }
    table.build()
}
