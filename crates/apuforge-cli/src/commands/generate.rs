//! `apuforge generate`, `show` and `validate`

use apuforge_foundation::{ArtifactWriter, generate_all};
use apuforge_kernel::ActiveConfiguration;
use colored::Colorize;
use crate::output::Table;

/// Render every artifact and write (or, with `check`, diff) the output
/// directory.
pub fn run(active: &ActiveConfiguration, check: bool) -> anyhow::Result<()> {
    let set = generate_all(active)?;
    let writer = ArtifactWriter::new(&active.paths().output_dir);

    if check {
        let drift = writer.check(&set)?;
        if drift.is_clean() {
            println!(
                "{} {} is up to date ({} artifacts)",
                "✓".green(),
                writer.dir().display(),
                set.len()
            );
            return Ok(());
        }
        for name in &drift.missing {
            println!("  {} {name}", "missing".red());
        }
        for name in &drift.changed {
            println!("  {} {name}", "changed".yellow());
        }
        for name in &drift.stale {
            println!("  {} {name}", "stale".yellow());
        }
        anyhow::bail!(
            "{} differs from the active configuration; run `apuforge generate`",
            writer.dir().display()
        );
    }

    println!("{} Generating artifacts into {}", "→".green(), writer.dir().display());
    let report = writer.write(&set)?;
    for name in &report.written {
        println!("  {} {name}", "wrote".green());
    }
    for name in &report.unchanged {
        println!("  {} {name}", "unchanged".dimmed());
    }
    for name in &report.pruned {
        println!("  {} {name}", "removed".yellow());
    }
    println!(
        "{} {} written, {} unchanged, {} removed",
        "✓".green(),
        report.written.len(),
        report.unchanged.len(),
        report.pruned.len()
    );
    Ok(())
}

/// Print the resolved configuration.
pub fn show(active: &ActiveConfiguration, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(active)?);
        return Ok(());
    }

    let hw = active.hardware();
    println!("{} Active configuration", "→".green());
    println!("  Profile: {} ({})", active.profile_key().cyan(), hw.name);
    println!("  Build: {} ({})", hw.build, active.engine_binary().display());
    println!(
        "  Gateway: {}:{} (admin {})",
        active.gateway().bind_address,
        active.gateway().listen_port,
        active.gateway().admin_port
    );
    println!();

    let mut table = Table::builder().headers(&["Service", "Status", "Model", "Port", "Context", "Aliases"]);
    for b in active.bindings() {
        let row = [
            b.kind().to_string(),
            if b.enabled() { "enabled" } else { "disabled" }.to_string(),
            b.model_key().to_string(),
            b.port().to_string(),
            b.context_size().to_string(),
            b.aliases().join(", "),
        ];
        table = if b.enabled() {
            table.highlighted_row(comfy_table::Color::Green, &row)
        } else {
            table.row(&row)
        };
    }
    println!("{}", table.build());
    Ok(())
}

/// Resolve only. Success means every invariant holds.
pub fn validate(active: &ActiveConfiguration) {
    println!(
        "{} configuration is valid: profile {}, {} of 3 services enabled",
        "✓".green(),
        active.profile_key(),
        active.enabled_services().len()
    );
}
