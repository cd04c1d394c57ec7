//! CLI command implementations

pub mod bench;
pub mod build;
pub mod doctor;
pub mod firewall;
pub mod generate;
pub mod list;
pub mod render;
pub mod serve;
