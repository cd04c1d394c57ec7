//! systemd units (`llama-<svc>.service`).

use crate::GENERATED_HEADER;
use crate::error::GenerateError;
use apuforge_kernel::{ActiveConfiguration, ServiceKind};
use std::fmt::Write as _;

/// Restart attempts allowed inside [`START_LIMIT_INTERVAL_SECS`].
pub const START_LIMIT_BURST: u32 = 3;
pub const START_LIMIT_INTERVAL_SECS: u32 = 60;
pub const RESTART_SEC: u32 = 5;
pub const LIMIT_NOFILE: u32 = 65_536;

// `$$` is systemd's escape for a literal `$`; the shell then expands the
// variables loaded from the EnvironmentFile. EXTRA_FLAGS is left unquoted
// so it splits into separate arguments.
const EXEC_START: &str = r#"/bin/sh -c 'exec "$${LLAMA_BIN}" -m "$${MODEL_PATH}" --host "$${HOST}" --port "$${PORT}" -c "$${CTX_SIZE}" -ngl "$${N_GPU_LAYERS}" $${EXTRA_FLAGS}'"#;

pub fn render(active: &ActiveConfiguration, kind: ServiceKind) -> Result<String, GenerateError> {
    let binding = active.binding(kind);
    if !binding.enabled() {
        return Err(GenerateError::ServiceDisabled(kind));
    }

    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "# {GENERATED_HEADER}");
    let _ = writeln!(out, "[Unit]");
    let _ = writeln!(
        out,
        "Description=llama.cpp {} service ({})",
        kind,
        binding.model().display_name
    );
    let _ = writeln!(out, "After=network-online.target");
    let _ = writeln!(out, "Wants=network-online.target");
    let _ = writeln!(out, "StartLimitIntervalSec={START_LIMIT_INTERVAL_SECS}");
    let _ = writeln!(out, "StartLimitBurst={START_LIMIT_BURST}");
    let _ = writeln!(out);

    let _ = writeln!(out, "[Service]");
    let _ = writeln!(out, "Type=simple");
    let _ = writeln!(
        out,
        "EnvironmentFile={}",
        active.launch_file_path(kind).display()
    );
    for (key, value) in &active.hardware().env {
        let _ = writeln!(out, "Environment=\"{key}={value}\"");
    }
    if let Some(lib) = active.runtime_library_dir() {
        let _ = writeln!(out, "Environment=\"LD_LIBRARY_PATH={}\"", lib.display());
    }
    let _ = writeln!(out, "ExecStart={EXEC_START}");
    let _ = writeln!(out, "Restart=on-failure");
    let _ = writeln!(out, "RestartSec={RESTART_SEC}");
    let _ = writeln!(out, "LimitNOFILE={LIMIT_NOFILE}");
    let _ = writeln!(out, "LimitMEMLOCK=infinity");
    let _ = writeln!(out);

    let _ = writeln!(out, "[Install]");
    let _ = writeln!(out, "WantedBy=multi-user.target");
    Ok(out)
}
