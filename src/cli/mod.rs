//! Command-line interface
//!
//! Argument definitions, output formatting and one handler per command.

mod commands;
pub mod handlers;
pub mod output;

pub use commands::{Cli, Commands, ExportFormat};
pub use output::OutputFormatter;
