//! External command execution

use crate::error::EnvironmentError;
use colored::Colorize;
use std::process::Command;
use tracing::info;

/// A command line kept as plain strings so it can be printed or run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new<S: Into<String>>(program: impl Into<String>, args: impl IntoIterator<Item = S>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Shell-style rendering for display.
    pub fn display(&self) -> String {
        let env = self
            .env
            .iter()
            .map(|(k, v)| format!("{k}={}", quote(v)));
        let argv = std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote);
        env.chain(argv).collect::<Vec<_>>().join(" ")
    }

    /// Run to completion, inheriting stdio.
    pub fn run(&self) -> Result<(), EnvironmentError> {
        info!(command = %self.display(), "running");
        let status = Command::new(&self.program)
            .args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .status()
            .map_err(|_| EnvironmentError::MissingTool(self.program.clone()))?;

        if status.success() {
            Ok(())
        } else {
            Err(EnvironmentError::CommandFailed {
                command: self.display(),
                status: status.to_string(),
            })
        }
    }

    /// Print in dry-run mode, or run.
    pub fn execute(&self, dry_run: bool) -> Result<(), EnvironmentError> {
        if dry_run {
            println!("{} {}", "$".dimmed(), self.display());
            Ok(())
        } else {
            self.run()
        }
    }
}

fn quote(s: &str) -> String {
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c))
    {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
