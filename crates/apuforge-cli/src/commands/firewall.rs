//! `apuforge firewall`

use crate::cli::FirewallAction;
use crate::error::EnvironmentError;
use crate::utils::command_exists;
use crate::utils::process::Invocation;
use apuforge_kernel::ActiveConfiguration;
use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirewallBackend {
    Ufw,
    Firewalld,
    Iptables,
}

impl FirewallBackend {
    /// Probe order.
    pub const ALL: [FirewallBackend; 3] = [Self::Ufw, Self::Firewalld, Self::Iptables];

    pub fn binary(self) -> &'static str {
        match self {
            Self::Ufw => "ufw",
            Self::Firewalld => "firewall-cmd",
            Self::Iptables => "iptables",
        }
    }

    /// First backend whose binary `exists` reports present.
    pub fn detect(exists: impl Fn(&str) -> bool) -> Option<Self> {
        Self::ALL.into_iter().find(|b| exists(b.binary()))
    }
}

impl std::fmt::Display for FirewallBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.binary())
    }
}

/// Commands that apply `action` to `port`/tcp on `backend`.
pub fn plan(backend: FirewallBackend, action: FirewallAction, port: u16) -> Vec<Invocation> {
    let spec = format!("{port}/tcp");
    let port_str = port.to_string();
    let add_port = format!("--add-port={spec}");
    let remove_port = format!("--remove-port={spec}");
    match (backend, action) {
        (FirewallBackend::Ufw, FirewallAction::Enable) => {
            vec![Invocation::new("ufw", ["allow", spec.as_str()])]
        }
        (FirewallBackend::Ufw, FirewallAction::Disable) => {
            vec![Invocation::new("ufw", ["delete", "allow", spec.as_str()])]
        }
        (FirewallBackend::Ufw, FirewallAction::Status) => {
            vec![Invocation::new("ufw", ["status", "verbose"])]
        }
        (FirewallBackend::Firewalld, FirewallAction::Enable) => vec![
            Invocation::new("firewall-cmd", ["--permanent", add_port.as_str()]),
            Invocation::new("firewall-cmd", ["--reload"]),
        ],
        (FirewallBackend::Firewalld, FirewallAction::Disable) => vec![
            Invocation::new("firewall-cmd", ["--permanent", remove_port.as_str()]),
            Invocation::new("firewall-cmd", ["--reload"]),
        ],
        (FirewallBackend::Firewalld, FirewallAction::Status) => {
            vec![Invocation::new("firewall-cmd", ["--list-ports"])]
        }
        (FirewallBackend::Iptables, FirewallAction::Enable) => vec![Invocation::new(
            "iptables",
            ["-I", "INPUT", "-p", "tcp", "--dport", port_str.as_str(), "-j", "ACCEPT"],
        )],
        (FirewallBackend::Iptables, FirewallAction::Disable) => vec![Invocation::new(
            "iptables",
            ["-D", "INPUT", "-p", "tcp", "--dport", port_str.as_str(), "-j", "ACCEPT"],
        )],
        (FirewallBackend::Iptables, FirewallAction::Status) => {
            vec![Invocation::new("iptables", ["-L", "INPUT", "-n", "--line-numbers"])]
        }
    }
}

pub fn run(active: &ActiveConfiguration, action: FirewallAction, dry_run: bool) -> anyhow::Result<()> {
    let backend = FirewallBackend::detect(command_exists).ok_or(EnvironmentError::NoFirewallBackend)?;
    let port = active.gateway().listen_port;
    println!(
        "{} Firewall backend: {} (gateway port {})",
        "→".green(),
        backend.to_string().cyan(),
        port
    );
    for step in plan(backend, action, port) {
        step.execute(dry_run)?;
    }
    Ok(())
}
