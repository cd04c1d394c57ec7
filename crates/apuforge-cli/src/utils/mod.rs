//! Shared host probes for the CLI

pub mod process;

use std::ffi::OsStr;
use std::net::TcpListener;

/// Whether `binary` is an executable file on PATH.
pub fn command_exists(binary: &str) -> bool {
    command_exists_in_path(binary, std::env::var_os("PATH").as_deref())
}

pub fn command_exists_in_path(binary: &str, path_var: Option<&OsStr>) -> bool {
    let Some(path_var) = path_var else {
        return false;
    };
    std::env::split_paths(path_var).any(|dir| dir.join(binary).is_file())
}

/// Whether a TCP listener can bind `host:port` right now.
pub fn port_available(host: &str, port: u16) -> bool {
    TcpListener::bind((host, port)).is_ok()
}
