//! Markdown summary of the active configuration (`README.md`).
//!
//! A projection only: every value shown comes from the
//! [`ActiveConfiguration`]. Disabled services are listed in the services
//! table with a marker and skipped everywhere else.

use crate::GENERATED_HEADER;
use crate::alias::alias_entries;
use crate::routing::route_rules;
use apuforge_kernel::{ActiveConfiguration, ServiceBinding, ServiceKind};
use comfy_table::presets::ASCII_MARKDOWN;
use comfy_table::{ContentArrangement, Table};
use std::fmt::Write as _;

pub const FILE_NAME: &str = "README.md";

pub const DISABLED_MARKER: &str = "disabled";
pub const ENABLED_MARKER: &str = "enabled";

fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(ASCII_MARKDOWN)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(headers.to_vec());
    table
}

fn services_table(active: &ActiveConfiguration) -> Table {
    let mut t = table(&["Service", "Status", "Model", "Quantization", "Port", "Context", "Unit"]);
    for b in active.bindings() {
        let status = if b.enabled() { ENABLED_MARKER } else { DISABLED_MARKER };
        t.add_row(vec![
            b.kind().to_string(),
            status.to_string(),
            format!("{} ({})", b.model().display_name, b.model_key()),
            b.model().quantization.clone(),
            b.port().to_string(),
            b.context_size().to_string(),
            b.kind().unit_name(),
        ]);
    }
    t
}

fn paths_table(active: &ActiveConfiguration) -> Table {
    let p = active.paths();
    let mut t = table(&["Setting", "Path"]);
    let rows = [
        ("Models root", p.models_root.display().to_string()),
        ("Engine root", p.engine_root.display().to_string()),
        ("Engine binary", active.engine_binary().display().to_string()),
        ("Runtime root", p.runtime_root.display().to_string()),
        ("Launch files", p.config_root.display().to_string()),
        ("Generated output", p.output_dir.display().to_string()),
    ];
    for (name, value) in rows {
        t.add_row(vec![name.to_string(), value]);
    }
    t
}

fn quick_start(out: &mut String, active: &ActiveConfiguration, binding: &ServiceBinding) {
    let gw = active.gateway();
    let base = format!("http://localhost:{}", gw.listen_port);
    let alias = binding
        .aliases()
        .into_iter()
        .next()
        .unwrap_or(binding.model_key())
        .to_string();

    let examples = match binding.kind() {
        ServiceKind::Chat => vec![
            (
                "Chat completion",
                "/v1/chat/completions",
                format!(r#"{{"model": "{alias}", "messages": [{{"role": "user", "content": "Hello"}}]}}"#),
            ),
            (
                "Completion (legacy)",
                "/v1/completions",
                format!(r#"{{"model": "{alias}", "prompt": "Once upon a time", "max_tokens": 32}}"#),
            ),
        ],
        ServiceKind::Embedding => vec![(
            "Embeddings",
            "/v1/embeddings",
            format!(r#"{{"model": "{alias}", "input": "The quick brown fox"}}"#),
        )],
        ServiceKind::Reranking => vec![(
            "Rerank",
            "/v1/rerank",
            format!(
                r#"{{"model": "{alias}", "query": "What is a GPU?", "documents": ["A GPU is a processor.", "Bananas are yellow."]}}"#
            ),
        )],
    };

    for (title, path, body) in examples {
        let _ = writeln!(out, "### {title}\n");
        let _ = writeln!(out, "```bash");
        let _ = writeln!(out, "curl -s {base}{path} \\");
        let _ = writeln!(out, "  -H 'Content-Type: application/json' \\");
        let _ = writeln!(out, "  -d '{body}'");
        let _ = writeln!(out, "```\n");
    }
}

pub fn render(active: &ActiveConfiguration) -> String {
    let hw = active.hardware();
    let gw = active.gateway();
    let mut out = String::new();

    let _ = writeln!(out, "<!-- {GENERATED_HEADER} -->\n");
    let _ = writeln!(out, "# Local LLM stack\n");

    let _ = writeln!(out, "## Hardware profile\n");
    let _ = writeln!(out, "- Profile: `{}` ({})", active.profile_key(), hw.name);
    let _ = writeln!(out, "- Build: {} (`{}`)", hw.build, hw.build.build_dir());
    if let Some(arch) = &hw.gpu_arch {
        let _ = writeln!(out, "- GPU architecture: {arch}");
    }
    let _ = writeln!(
        out,
        "- Memory: {} GiB unified, {} GiB available for models",
        hw.vram_total_gb, hw.vram_available_gb
    );
    let _ = writeln!(out, "- GPU layers: {}", hw.gpu_layers);
    let _ = writeln!(out, "- Default flags: `{}`", hw.default_flags.join(" "));
    for (key, value) in &hw.env {
        let _ = writeln!(out, "- `{key}={value}`");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Services\n");
    let _ = writeln!(out, "{}\n", services_table(active));

    let _ = writeln!(out, "## Paths\n");
    let _ = writeln!(out, "{}\n", paths_table(active));

    let _ = writeln!(out, "## Gateway routes\n");
    let _ = writeln!(
        out,
        "Listening on `{}:{}`, admin on port {}.\n",
        gw.bind_address, gw.listen_port, gw.admin_port
    );
    let mut routes = table(&["Prefix", "Upstream", "Address", "Timeout"]);
    // Resolution guarantees an enabled service, so the rule list is never empty.
    for rule in route_rules(active).unwrap_or_default() {
        routes.add_row(vec![
            format!("`{}`", rule.prefix),
            rule.service.cluster_name(),
            active.upstream_address(active.binding(rule.service)),
            format!("{}s", rule.timeout_secs),
        ]);
    }
    let _ = writeln!(out, "{routes}\n");

    let _ = writeln!(out, "## Aliases\n");
    let mut aliases = table(&["Alias", "Service", "Upstream"]);
    for entry in alias_entries(active) {
        aliases.add_row(vec![entry.alias, entry.service.to_string(), entry.api_base]);
    }
    let _ = writeln!(out, "{aliases}\n");

    let _ = writeln!(out, "## Quick Start\n");
    for binding in active.enabled_services() {
        quick_start(&mut out, active, binding);
    }
    let _ = writeln!(out, "### Health\n");
    let _ = writeln!(out, "```bash");
    let _ = writeln!(out, "curl -s http://localhost:{}/health", gw.listen_port);
    let _ = writeln!(out, "curl -s http://localhost:{}/v1/models", gw.listen_port);
    let _ = writeln!(out, "```");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use apuforge_kernel::{Overrides, Registries};

    fn section<'a>(doc: &'a str, heading: &str) -> &'a str {
        let start = doc.find(heading).unwrap();
        let rest = &doc[start + heading.len()..];
        match rest.find("\n## ") {
            Some(end) => &rest[..end],
            None => rest,
        }
    }

    #[test]
    fn disabled_service_is_marked_and_left_out_of_quick_start() {
        let overrides = Overrides::default().disable(ServiceKind::Reranking);
        let active = Registries::builtin().resolve(&overrides).unwrap();
        let doc = render(&active);

        let services = section(&doc, "## Services");
        let rerank_row = services
            .lines()
            .find(|l| l.contains("reranking"))
            .unwrap();
        assert!(rerank_row.contains(DISABLED_MARKER));

        let quick = section(&doc, "## Quick Start");
        assert!(!quick.contains("/v1/rerank"));
        assert!(!quick.contains("Rerank"));
        assert!(quick.contains("/v1/chat/completions"));
        assert!(quick.contains("/v1/embeddings"));
        assert!(quick.contains("### Completion (legacy)"));
        assert!(quick.contains("curl -s http://localhost:4000/v1/completions"));
        assert!(quick.contains(r#""prompt": "Once upon a time""#));
    }

    #[test]
    fn legacy_completion_example_follows_chat() {
        let overrides = Overrides::default().disable(ServiceKind::Chat);
        let active = Registries::builtin().resolve(&overrides).unwrap();
        let quick = section(&render(&active), "## Quick Start").to_string();
        assert!(!quick.contains("/v1/completions"));
        assert!(!quick.contains("Completion (legacy)"));
        assert!(!quick.contains("/v1/chat/completions"));
        assert!(quick.contains("/v1/embeddings"));
    }

    #[test]
    fn disabled_service_is_absent_from_routes_and_aliases() {
        let overrides = Overrides::default().disable(ServiceKind::Embedding);
        let active = Registries::builtin().resolve(&overrides).unwrap();
        let doc = render(&active);
        assert!(!section(&doc, "## Gateway routes").contains("llama_embed"));
        assert!(!section(&doc, "## Aliases").contains("text-embedding-3-small"));
    }

    #[test]
    fn values_come_from_the_active_configuration() {
        let mut overrides = Overrides::default().with_context(ServiceKind::Chat, 131_072);
        overrides.gateway.listen_port = 4100;
        let active = Registries::builtin().resolve(&overrides).unwrap();
        let doc = render(&active);
        assert!(doc.contains("131072"));
        assert!(doc.contains("http://localhost:4100/v1/chat/completions"));
        assert!(doc.contains("HSA_OVERRIDE_GFX_VERSION=11.5.1"));
        assert!(doc.contains("/srv/llm/models"));
    }
}
