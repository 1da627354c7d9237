//! Terminal output for the CLI
//!
//! Human-readable messages go through `colored`; with `--json` every handler
//! prints a single JSON document on stdout instead.

use crate::core::{Status, Ticket};
use crate::error::Result;
use colored::Colorize;
use serde::Serialize;

/// Formats command results for the terminal or as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormatter {
    json: bool,
    no_color: bool,
}

impl OutputFormatter {
    #[must_use]
    pub fn new(json: bool, no_color: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { json, no_color }
    }

    #[must_use]
    pub const fn is_json(&self) -> bool {
        self.json
    }

    pub fn success(&self, message: &str) {
        if !self.json {
            println!("{}", self.paint(message, |m| m.green().to_string()));
        }
    }

    pub fn info(&self, message: &str) {
        if !self.json {
            println!("{message}");
        }
    }

    pub fn warning(&self, message: &str) {
        if !self.json {
            eprintln!("{}", self.paint(message, |m| m.yellow().to_string()));
        }
    }

    /// Errors always go to stderr, even in JSON mode
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.paint(&format!("Error: {message}"), |m| m.red().bold().to_string()));
    }

    /// Print any serializable value as pretty JSON
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print a JSON value, used by the error printer
    pub fn json(&self, value: &serde_json::Value) -> Result<()> {
        self.print_json(value)
    }

    /// One-line summary used by `list`
    pub fn ticket_line(&self, ticket: &Ticket) -> String {
        let items = ticket
            .items
            .iter()
            .map(|item| item.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let reporter = ticket.reporter_name.as_deref().unwrap_or("-");
        format!(
            "{:>6}  {}  {:<16}  {}",
            ticket.display_ref(),
            self.status_label(ticket.status),
            reporter,
            items
        )
    }

    /// Status name colored by lifecycle stage
    pub fn status_label(&self, status: Status) -> String {
        let label = format!("{:<10}", status.as_str());
        self.paint(&label, |m| match status {
            Status::Submitted => m.cyan().to_string(),
            Status::Searching => m.yellow().to_string(),
            Status::Located => m.green().to_string(),
            Status::Closed => m.dimmed().to_string(),
        })
    }

    fn paint(&self, message: &str, style: impl Fn(&str) -> String) -> String {
        if self.no_color {
            message.to_string()
        } else {
            style(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Item, TicketBuilder};

    #[test]
    fn test_ticket_line_without_color() {
        let formatter = OutputFormatter::new(false, true);
        let ticket = TicketBuilder::new()
            .sequence_number(7)
            .reporter_name("Alice")
            .item(Item::new("Wallet", None))
            .item(Item::new("Keys", None))
            .build();

        let line = formatter.ticket_line(&ticket);
        assert!(line.starts_with("    #7  Submitted"));
        assert!(line.ends_with("Wallet, Keys"));
    }
}
