//! `apuforge doctor`

use crate::context;
use crate::cli::GlobalArgs;
use crate::utils::{command_exists, port_available};
use apuforge_kernel::{ActiveConfiguration, BuildKind};
use colored::Colorize;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DoctorSeverity {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Serialize)]
pub struct DoctorCheck {
    pub id: String,
    pub title: String,
    pub severity: DoctorSeverity,
    pub details: String,
    pub recommendation: Option<String>,
}

impl DoctorCheck {
    fn pass(id: impl Into<String>, title: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            severity: DoctorSeverity::Pass,
            details: details.into(),
            recommendation: None,
        }
    }

    fn problem(
        severity: DoctorSeverity,
        id: impl Into<String>,
        title: impl Into<String>,
        details: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            severity,
            details: details.into(),
            recommendation: Some(recommendation.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DoctorSummary {
    pub passed: usize,
    pub warnings: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
pub struct DoctorReport {
    pub profile: Option<String>,
    pub strict: bool,
    pub summary: DoctorSummary,
    pub checks: Vec<DoctorCheck>,
}

pub fn run(globals: &GlobalArgs, strict: bool, json: bool) -> anyhow::Result<()> {
    let report = build_report(globals, strict);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if strict && report.summary.failed > 0 {
        anyhow::bail!(
            "doctor strict mode failed with {} failing checks",
            report.summary.failed
        );
    }
    Ok(())
}

fn build_report(globals: &GlobalArgs, strict: bool) -> DoctorReport {
    let mut checks = vec![];

    let active = match context::active(globals) {
        Ok(active) => {
            checks.push(DoctorCheck::pass(
                "configuration",
                "Active configuration resolves",
                format!(
                    "Profile {} with {} enabled services.",
                    active.profile_key(),
                    active.enabled_services().len()
                ),
            ));
            Some(active)
        }
        Err(e) => {
            checks.push(DoctorCheck::problem(
                DoctorSeverity::Fail,
                "configuration",
                "Active configuration resolves",
                e.to_string(),
                "Run `apuforge validate` and fix the overrides file.",
            ));
            None
        }
    };

    if let Some(active) = &active {
        checks.push(check_engine_binary(active));
        checks.extend(check_model_files(active));
        checks.extend(check_ports(active));
        checks.push(check_runtime_libraries(active));
    }
    checks.extend(check_tools(active.as_ref().map(|a| a.hardware().build)));

    let summary = summarize_checks(&checks);
    DoctorReport {
        profile: active.map(|a| a.profile_key().to_string()),
        strict,
        summary,
        checks,
    }
}

fn check_engine_binary(active: &ActiveConfiguration) -> DoctorCheck {
    let binary = active.engine_binary();
    if binary.is_file() {
        DoctorCheck::pass(
            "engine-binary",
            "Inference engine binary",
            format!("Found {}", binary.display()),
        )
    } else {
        DoctorCheck::problem(
            DoctorSeverity::Fail,
            "engine-binary",
            "Inference engine binary",
            format!("Missing {}", binary.display()),
            "Run `apuforge build` or pass --engine-root.",
        )
    }
}

fn check_model_files(active: &ActiveConfiguration) -> Vec<DoctorCheck> {
    active
        .enabled_services()
        .into_iter()
        .map(|binding| {
            let id = format!("model-{}", binding.kind().slug());
            let title = format!("Model file for {}", binding.kind());
            let path = active.model_path(binding);
            if path.is_file() {
                DoctorCheck::pass(id, title, format!("Found {}", path.display()))
            } else {
                DoctorCheck::problem(
                    DoctorSeverity::Fail,
                    id,
                    title,
                    format!("Missing {} ({})", path.display(), binding.model_key()),
                    "Download the model into the models root or pass --models-root.",
                )
            }
        })
        .collect()
}

fn check_ports(active: &ActiveConfiguration) -> Vec<DoctorCheck> {
    let gw = active.gateway();
    let mut probes = vec![
        ("gateway".to_string(), gw.bind_address.clone(), gw.listen_port),
        ("gateway-admin".to_string(), gw.service_host.clone(), gw.admin_port),
    ];
    for binding in active.enabled_services() {
        probes.push((
            binding.kind().slug().to_string(),
            gw.service_host.clone(),
            binding.port(),
        ));
    }

    probes
        .into_iter()
        .map(|(name, host, port)| {
            let id = format!("port-{name}");
            let title = format!("Port {port} ({name})");
            if port_available(&host, port) {
                DoctorCheck::pass(id, title, format!("{host}:{port} is free."))
            } else {
                DoctorCheck::problem(
                    DoctorSeverity::Warn,
                    id,
                    title,
                    format!("{host}:{port} is already bound."),
                    "Fine if the stack is already running; otherwise stop the listener or change the port.",
                )
            }
        })
        .collect()
}

fn check_runtime_libraries(active: &ActiveConfiguration) -> DoctorCheck {
    match active.runtime_library_dir() {
        None => DoctorCheck::pass(
            "runtime-libraries",
            "GPU runtime libraries",
            "Vulkan build; no ROCm libraries needed.",
        ),
        Some(dir) if dir.is_dir() => DoctorCheck::pass(
            "runtime-libraries",
            "GPU runtime libraries",
            format!("Found {}", dir.display()),
        ),
        Some(dir) => DoctorCheck::problem(
            DoctorSeverity::Warn,
            "runtime-libraries",
            "GPU runtime libraries",
            format!("{} does not exist.", dir.display()),
            "Install ROCm or pass --runtime-root.",
        ),
    }
}

fn tool_list(build: Option<BuildKind>) -> Vec<&'static str> {
    let mut tools = vec!["cmake", "systemctl", "envoy"];
    match build {
        Some(BuildKind::Rocm) => tools.push("rocm-smi"),
        Some(BuildKind::Vulkan) => tools.push("vulkaninfo"),
        None => {}
    }
    tools
}

fn check_tools(build: Option<BuildKind>) -> Vec<DoctorCheck> {
    tool_list(build)
        .into_iter()
        .map(|tool| {
            let id = format!("tool-{tool}");
            let title = format!("Tool `{tool}`");
            if command_exists(tool) {
                DoctorCheck::pass(id, title, format!("`{tool}` is available on PATH."))
            } else {
                DoctorCheck::problem(
                    DoctorSeverity::Warn,
                    id,
                    title,
                    format!("`{tool}` not found on PATH."),
                    format!("Install `{tool}` if you use the commands that need it."),
                )
            }
        })
        .collect()
}

fn summarize_checks(checks: &[DoctorCheck]) -> DoctorSummary {
    let count = |severity| checks.iter().filter(|c| c.severity == severity).count();
    DoctorSummary {
        passed: count(DoctorSeverity::Pass),
        warnings: count(DoctorSeverity::Warn),
        failed: count(DoctorSeverity::Fail),
    }
}

fn print_report(report: &DoctorReport) {
    println!("{} apuforge Doctor Report", "→".green());
    if let Some(profile) = &report.profile {
        println!("  Profile: {}", profile.cyan());
    }
    println!(
        "  Strict mode: {}",
        if report.strict { "on" } else { "off" }
    );
    println!();

    for check in &report.checks {
        let (icon, colorized_title) = match check.severity {
            DoctorSeverity::Pass => ("✓".green(), check.title.green()),
            DoctorSeverity::Warn => ("!".yellow(), check.title.yellow()),
            DoctorSeverity::Fail => ("✗".red(), check.title.red()),
        };

        println!("{} {} [{}]", icon, colorized_title, check.id);
        println!("    {}", check.details);
        if let Some(recommendation) = &check.recommendation {
            println!("    Recommendation: {}", recommendation);
        }
    }

    println!();
    println!(
        "Summary: {} passed, {} warnings, {} failed",
        report.summary.passed.to_string().green(),
        report.summary.warnings.to_string().yellow(),
        report.summary.failed.to_string().red()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use apuforge_kernel::{Overrides, Registries, ServiceKind};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn rocm_profile_probes_rocm_smi() {
        assert!(tool_list(Some(BuildKind::Rocm)).contains(&"rocm-smi"));
        assert!(tool_list(Some(BuildKind::Vulkan)).contains(&"vulkaninfo"));
        assert_eq!(tool_list(None).len(), 3);
    }

    #[test]
    fn model_checks_cover_only_enabled_services() {
        let dir = tempdir().unwrap();
        let mut overrides = Overrides::default().disable(ServiceKind::Reranking);
        overrides.paths.models_root = dir.path().to_path_buf();
        let active = Registries::builtin().resolve(&overrides).unwrap();

        let chat = active.model_path(active.binding(ServiceKind::Chat));
        fs::create_dir_all(chat.parent().unwrap()).unwrap();
        fs::write(&chat, b"gguf").unwrap();

        let checks = check_model_files(&active);
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].severity, DoctorSeverity::Pass);
        assert_eq!(checks[1].severity, DoctorSeverity::Fail);
        assert!(checks[1].recommendation.is_some());
    }

    #[test]
    fn summary_counts_each_severity() {
        let checks = vec![
            DoctorCheck::pass("a", "A", "ok"),
            DoctorCheck::problem(DoctorSeverity::Warn, "b", "B", "meh", "fix"),
            DoctorCheck::problem(DoctorSeverity::Fail, "c", "C", "bad", "fix"),
            DoctorCheck::problem(DoctorSeverity::Fail, "d", "D", "bad", "fix"),
        ];
        let summary = summarize_checks(&checks);
        assert_eq!((summary.passed, summary.warnings, summary.failed), (1, 1, 2));
    }
}
