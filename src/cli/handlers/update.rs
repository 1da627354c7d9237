//! Staff-side mutation commands: status, comment, reopen, delete

use super::common::{HandlerContext, item_index};
use crate::cli::output::OutputFormatter;
use crate::core::Status;
use crate::error::Result;

/// Handle the status command
pub fn handle_status_command(
    reference: &str,
    status: &str,
    ctx: &HandlerContext,
    formatter: &OutputFormatter,
) -> Result<()> {
    let ticket = ctx.resolve(reference)?;
    let previous = ticket.status;
    let updated = ctx.store.update_status(&ticket.id, status)?;

    if formatter.is_json() {
        return formatter.print_json(&updated);
    }
    if previous == updated.status {
        formatter.info(&format!(
            "Ticket {} is already {}",
            updated.display_ref(),
            updated.status
        ));
    } else {
        formatter.success(&format!(
            "Ticket {}: {previous} -> {}",
            updated.display_ref(),
            updated.status
        ));
    }
    Ok(())
}

/// Handle the comment command; `item` is the 1-based item position
pub fn handle_comment_command(
    reference: &str,
    text: &str,
    item: Option<usize>,
    ctx: &HandlerContext,
    formatter: &OutputFormatter,
) -> Result<()> {
    let index = item_index(item)?;
    let ticket = ctx.resolve(reference)?;
    let updated = ctx.store.add_comment(&ticket.id, text, index)?;

    if formatter.is_json() {
        return formatter.print_json(&updated);
    }
    match index {
        Some(i) => formatter.success(&format!(
            "Comment added to {} on ticket {}",
            updated.items[i].name,
            updated.display_ref()
        )),
        None => formatter.success(&format!("Comment added to ticket {}", updated.display_ref())),
    }
    Ok(())
}

/// Handle the reopen command
pub fn handle_reopen_command(
    reference: &str,
    status: &str,
    ctx: &HandlerContext,
    formatter: &OutputFormatter,
) -> Result<()> {
    let status: Status = status.parse()?;
    let ticket = ctx.resolve(reference)?;
    let reopened = ctx.store.reopen(&ticket.id, status)?;

    if formatter.is_json() {
        return formatter.print_json(&reopened);
    }
    formatter.success(&format!(
        "Reopened ticket {} as {}",
        reopened.display_ref(),
        reopened.status
    ));
    Ok(())
}

/// Handle the delete command
pub fn handle_delete_command(
    reference: &str,
    ctx: &HandlerContext,
    formatter: &OutputFormatter,
) -> Result<()> {
    let ticket = ctx.resolve(reference)?;
    ctx.store.delete(&ticket.id)?;

    if formatter.is_json() {
        return formatter.print_json(&serde_json::json!({
            "status": "success",
            "deleted": ticket.id,
        }));
    }
    formatter.success(&format!("Deleted ticket {}", ticket.display_ref()));
    if ticket.comment_count() > 0 {
        formatter.warning(&format!(
            "{} comment(s) were removed with it",
            ticket.comment_count()
        ));
    }
    Ok(())
}

