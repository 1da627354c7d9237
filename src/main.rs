//! lost-found - Lost-and-found ticket intake and tracking
//!
//! This is the main entry point for the lost-found CLI application.
//! It handles command-line argument parsing and dispatches to the appropriate
//! command handlers.

use clap::Parser;
use lost_found::cli::handlers::{
    HandlerContext, SubmitParams, handle_comment_command, handle_delete_command,
    handle_export_command, handle_import_command, handle_list_command, handle_reopen_command,
    handle_show_command, handle_status_command, handle_submit_command,
};
use lost_found::cli::{Cli, Commands, OutputFormatter};
use lost_found::error::{LostFoundError, Result};
use std::process;
use tracing_subscriber::EnvFilter;

/// Main entry point for the lost-found CLI
///
/// Parses command-line arguments and executes the requested command.
/// Handles errors gracefully and provides helpful error messages to users.
fn main() {
    let cli = Cli::parse();

    let formatter = OutputFormatter::new(cli.json, cli.no_color);

    if let Err(e) = run(cli, &formatter) {
        handle_error(&e, &formatter);
        process::exit(1);
    }
}

/// Set up logging: `--verbose` forces debug, otherwise `RUST_LOG` or warn
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run the CLI application with the parsed arguments
fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    init_tracing(cli.verbose);

    let ctx = HandlerContext::new(cli.config.as_deref(), cli.data.as_deref())?;
    dispatch_command(cli.command, ctx, formatter)
}

fn dispatch_command(command: Commands, ctx: HandlerContext, formatter: &OutputFormatter) -> Result<()> {
    match command {
        Commands::Submit {
            items,
            name,
            contact,
            no_notify,
        } => handle_submit_command(
            SubmitParams {
                items,
                name,
                contact,
                no_notify,
            },
            ctx,
            formatter,
        ),
        Commands::List { status, open } => {
            handle_list_command(status.as_deref(), open, &ctx, formatter)
        },
        Commands::Show { ticket } => handle_show_command(&ticket, &ctx, formatter),
        Commands::Status { ticket, status } => {
            handle_status_command(&ticket, &status, &ctx, formatter)
        },
        Commands::Comment { ticket, text, item } => {
            handle_comment_command(&ticket, &text, item, &ctx, formatter)
        },
        Commands::Reopen { ticket, status } => {
            handle_reopen_command(&ticket, &status, &ctx, formatter)
        },
        Commands::Delete { ticket } => handle_delete_command(&ticket, &ctx, formatter),
        Commands::Export { format, output } => {
            handle_export_command(format, output.as_deref(), &ctx, formatter)
        },
        Commands::Import { file, dry_run } => {
            handle_import_command(&file, dry_run, &ctx, formatter)
        },
        #[cfg(feature = "api")]
        Commands::Serve { host, port } => {
            lost_found::cli::handlers::handle_serve_command(host, port, ctx, formatter)
        },
    }
}

fn handle_error(error: &LostFoundError, formatter: &OutputFormatter) {
    formatter.error(&error.user_message());

    let suggestions = error.suggestions();
    if !suggestions.is_empty() {
        formatter.info("\nSuggestions:");
        for suggestion in &suggestions {
            formatter.info(&format!("  • {suggestion}"));
        }
    }

    if formatter.is_json() {
        let _ = formatter.json(&serde_json::json!({
            "status": "error",
            "error": error.to_string(),
            "kind": error.kind().as_str(),
            "suggestions": suggestions,
            "recoverable": error.is_recoverable(),
            "is_config_error": error.is_config_error(),
        }));
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        eprintln!("\nDebug information:");
        eprintln!("{error:?}");
    }
}
