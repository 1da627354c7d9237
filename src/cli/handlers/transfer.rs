//! Export and import handlers

use super::common::HandlerContext;
use crate::cli::commands::ExportFormat;
use crate::cli::output::OutputFormatter;
use crate::core::Ticket;
use crate::error::{LostFoundError, Result};
use crate::storage::legacy::{self, LegacyImport};
use chrono::Utc;
use std::fs;

/// Serialize tickets in an export format
pub fn export_tickets(tickets: &[Ticket], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(tickets)?),
        ExportFormat::Yaml => Ok(serde_yaml::to_string(tickets)?),
        ExportFormat::Csv => export_csv(tickets),
    }
}

fn export_csv(tickets: &[Ticket]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "id",
        "sequence",
        "status",
        "reporter",
        "contact",
        "items",
        "comments",
        "created_at",
    ])?;

    for ticket in tickets {
        let items = ticket
            .items
            .iter()
            .map(|item| match &item.description {
                Some(description) => format!("{} ({description})", item.name),
                None => item.name.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ");
        writer.write_record([
            ticket.id.to_string(),
            ticket.sequence_number.map(|n| n.to_string()).unwrap_or_default(),
            ticket.status.to_string(),
            ticket.reporter_name.clone().unwrap_or_default(),
            ticket.contact.clone().unwrap_or_default(),
            items,
            ticket.comment_count().to_string(),
            ticket.created_at.to_rfc3339(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| LostFoundError::custom(format!("Failed to finish CSV: {e}")))?;
    String::from_utf8(bytes).map_err(|e| LostFoundError::custom(format!("Invalid UTF-8 in CSV: {e}")))
}

/// Handle the export command
pub fn handle_export_command(
    format: ExportFormat,
    output: Option<&str>,
    ctx: &HandlerContext,
    formatter: &OutputFormatter,
) -> Result<()> {
    let tickets = ctx.store.list();
    let content = export_tickets(&tickets, format)?;

    match output {
        Some(path) => {
            fs::write(path, &content)?;
            if formatter.is_json() {
                formatter.print_json(&serde_json::json!({
                    "status": "success",
                    "exported": tickets.len(),
                    "output": path,
                }))?;
            } else {
                formatter.success(&format!("Exported {} ticket(s) to {path}", tickets.len()));
            }
        },
        None => print!("{content}"),
    }
    Ok(())
}

/// Parse an import file: this tool's own JSON export, or the legacy format
fn parse_import(content: &str) -> Result<LegacyImport> {
    if let Ok(tickets) = serde_json::from_str::<Vec<Ticket>>(content) {
        return Ok(LegacyImport {
            tickets,
            ..LegacyImport::default()
        });
    }
    legacy::convert(content, Utc::now())
}

/// Handle the import command
pub fn handle_import_command(
    file: &str,
    dry_run: bool,
    ctx: &HandlerContext,
    formatter: &OutputFormatter,
) -> Result<()> {
    let content = fs::read_to_string(file)?;
    let LegacyImport {
        tickets,
        skipped,
        warnings,
    } = parse_import(&content)?;

    for reason in &skipped {
        formatter.warning(&format!("Skipped {reason}"));
    }
    for warning in &warnings {
        formatter.warning(warning);
    }

    if dry_run {
        if formatter.is_json() {
            return formatter.print_json(&serde_json::json!({
                "status": "dry_run",
                "would_import": tickets.len(),
                "skipped": skipped,
                "warnings": warnings,
            }));
        }
        formatter.info(&format!("Would import {} ticket(s)", tickets.len()));
        for ticket in &tickets {
            formatter.info(&formatter.ticket_line(ticket));
        }
        return Ok(());
    }

    let imported = ctx.store.import(tickets)?;
    if formatter.is_json() {
        return formatter.print_json(&serde_json::json!({
            "status": "success",
            "imported": imported.len(),
            "skipped": skipped,
            "warnings": warnings,
        }));
    }
    formatter.success(&format!("Imported {} ticket(s)", imported.len()));
    Ok(())
}
