use std::path::PathBuf;

/// Host preconditions that stop a command before it starts anything.
#[derive(thiserror::Error, Debug)]
pub enum EnvironmentError {
    #[error("required tool `{0}` was not found on PATH")]
    MissingTool(String),

    #[error("inference engine binary not found: {}", .0.display())]
    MissingBinary(PathBuf),

    #[error("model file not found: {}", .0.display())]
    MissingModelFile(PathBuf),

    #[error("engine source tree not found: {}", .0.display())]
    MissingSourceTree(PathBuf),

    #[error("port {port} on {host} is already in use")]
    PortInUse { host: String, port: u16 },

    #[error("no supported firewall backend found (tried ufw, firewall-cmd, iptables)")]
    NoFirewallBackend,

    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: String },

    #[error("invalid context size '{0}' (use small, medium, large, max or a token count)")]
    InvalidContext(String),
}

impl EnvironmentError {
    /// Corrective suggestion shown under the error.
    pub fn hint(&self) -> String {
        match self {
            Self::MissingTool(tool) => format!("install `{tool}` and make sure it is on PATH"),
            Self::MissingBinary(_) => "run `apuforge build` or pass --engine-root".to_string(),
            Self::MissingModelFile(_) => {
                "download the model or pass --models-root / --model-file".to_string()
            }
            Self::MissingSourceTree(_) => {
                "clone llama.cpp there or pass --engine-root".to_string()
            }
            Self::PortInUse { port, .. } => {
                format!("stop the process listening on {port} or change the port in the overrides file")
            }
            Self::NoFirewallBackend => "install ufw or firewalld, or open the port manually".to_string(),
            Self::CommandFailed { .. } => "re-run with --verbose for the full command output".to_string(),
            Self::InvalidContext(_) => "for example --ctx large or --ctx 65536".to_string(),
        }
    }
}
