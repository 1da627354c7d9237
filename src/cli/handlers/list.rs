use super::common::{HandlerContext, parse_status_filter, print_ticket};
use crate::cli::output::OutputFormatter;
use crate::core::{Status, Ticket};
use crate::error::Result;

/// Handle the list command
pub fn handle_list_command(
    status: Option<&str>,
    open_only: bool,
    ctx: &HandlerContext,
    formatter: &OutputFormatter,
) -> Result<()> {
    let status = parse_status_filter(status)?;
    let tickets = filter_tickets(ctx.store.list(), status, open_only);

    if formatter.is_json() {
        return formatter.print_json(&serde_json::json!({
            "tickets": tickets,
            "count": tickets.len(),
        }));
    }

    if tickets.is_empty() {
        formatter.info("No tickets found");
        return Ok(());
    }

    formatter.info(&format!(
        "{:>6}  {:<10}  {:<16}  {}",
        "#", "STATUS", "REPORTER", "ITEMS"
    ));
    for ticket in &tickets {
        formatter.info(&formatter.ticket_line(ticket));
    }
    formatter.info(&format!("\n{} ticket(s)", tickets.len()));
    Ok(())
}

/// Handle the show command
pub fn handle_show_command(
    reference: &str,
    ctx: &HandlerContext,
    formatter: &OutputFormatter,
) -> Result<()> {
    let ticket = ctx.resolve(reference)?;
    print_ticket(&ticket, formatter)
}

fn filter_tickets(tickets: Vec<Ticket>, status: Option<Status>, open_only: bool) -> Vec<Ticket> {
    tickets
        .into_iter()
        .filter(|t| status.is_none_or(|s| t.status == s))
        .filter(|t| !open_only || !t.status.is_terminal())
        .collect()
}
