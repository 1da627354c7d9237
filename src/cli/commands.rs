use clap::{Parser, Subcommand, ValueEnum};

/// Lost-and-found ticket intake and tracking
#[derive(Parser, Debug)]
#[command(name = "lost-found")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./lost-found.toml when present)
    #[arg(long, global = true, env = "LOST_FOUND_CONFIG")]
    pub config: Option<String>,

    /// Ticket data file, overriding `storage.path`
    #[arg(long, global = true)]
    pub data: Option<String>,

    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit a new lost item report
    Submit {
        /// Item as `NAME` or `NAME:DESCRIPTION`; repeat for several items
        #[arg(short, long = "item", required = true)]
        items: Vec<String>,

        /// Name of the person reporting the loss
        #[arg(short, long)]
        name: Option<String>,

        /// Email or phone number for follow-up
        #[arg(short, long)]
        contact: Option<String>,

        /// Do not send the tracking notification
        #[arg(long)]
        no_notify: bool,
    },

    /// List tickets, oldest first
    List {
        /// Only tickets with this status
        #[arg(short, long)]
        status: Option<String>,

        /// Hide closed tickets
        #[arg(long)]
        open: bool,
    },

    /// Show one ticket with its comments
    Show {
        /// Ticket UUID, `#12` or `12`
        ticket: String,
    },

    /// Change a ticket's status
    Status {
        ticket: String,

        /// Submitted, Searching, Located or Closed
        status: String,
    },

    /// Append a staff comment
    Comment {
        ticket: String,

        text: String,

        /// Attach to the Nth item (1-based) instead of the ticket
        #[arg(short, long)]
        item: Option<usize>,
    },

    /// Reopen a closed ticket
    Reopen {
        ticket: String,

        /// Status to reopen into
        #[arg(short, long, default_value = "Searching")]
        status: String,
    },

    /// Delete a ticket permanently
    Delete {
        ticket: String,
    },

    /// Export all tickets
    Export {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Import tickets from the previous kiosk server's tickets.json
    Import {
        file: String,

        /// Show what would be imported without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Run the HTTP API
    #[cfg(feature = "api")]
    Serve {
        /// Listen address, overriding `server.host`
        #[arg(long)]
        host: Option<String>,

        /// Listen port, overriding `server.port`
        #[arg(short, long)]
        port: Option<u16>,
    },
}

/// Export output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Yaml,
    Csv,
}
