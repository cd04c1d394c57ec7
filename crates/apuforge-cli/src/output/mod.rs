//! Output formatting for CLI commands

mod table;

pub use table::Table;
