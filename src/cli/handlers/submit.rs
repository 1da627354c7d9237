//! Intake command handler
//!
//! Creates the ticket and, unless told otherwise, runs the notification
//! dispatcher over the store's created-ticket feed until the store is
//! closed, so the tracking message goes out before the process exits.

use super::common::HandlerContext;
use crate::cli::output::OutputFormatter;
use crate::core::{NewItem, NewTicket, Ticket};
use crate::error::Result;
use crate::notify::DispatchStats;

/// Parameters for the submit command
pub struct SubmitParams {
    pub items: Vec<String>,
    pub name: Option<String>,
    pub contact: Option<String>,
    pub no_notify: bool,
}

impl SubmitParams {
    fn into_draft(self) -> NewTicket {
        let items = self.items.iter().map(|spec| NewItem::parse_spec(spec)).collect();
        let mut draft = NewTicket::new(items);
        draft.reporter_name = self.name;
        draft.contact = self.contact;
        draft
    }
}

/// Handle the submit command
pub fn handle_submit_command(
    params: SubmitParams,
    ctx: HandlerContext,
    formatter: &OutputFormatter,
) -> Result<()> {
    let notifier = if params.no_notify { None } else { ctx.notifier()? };
    let HandlerContext { store, .. } = ctx;
    let draft = params.into_draft();

    let Some(notifier) = notifier else {
        let ticket = store.create(draft)?;
        return report(&ticket, None, None, formatter);
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let locator = notifier.locator().clone();
    let pending = {
        let _guard = runtime.enter();
        notifier.spawn(store.subscribe_created())
    };

    let ticket = store.create(draft)?;
    drop(store);

    let stats = runtime.block_on(pending).unwrap_or_else(|e| {
        tracing::error!(error = %e, "notification task failed");
        DispatchStats::default()
    });
    let url = locator.locate(&ticket).url;
    report(&ticket, Some(url), Some(stats), formatter)
}

fn report(
    ticket: &Ticket,
    tracking_url: Option<String>,
    stats: Option<DispatchStats>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let notified = stats.is_some_and(|s| s.delivered > 0);

    if formatter.is_json() {
        return formatter.print_json(&serde_json::json!({
            "status": "success",
            "ticket": ticket,
            "trackingUrl": tracking_url,
            "notified": notified,
        }));
    }

    formatter.success(&format!("Created ticket {}", ticket.display_ref()));
    formatter.info(&format!("ID: {}", ticket.id));
    if let Some(url) = tracking_url {
        formatter.info(&format!("Tracking link: {url}"));
    }
    match stats {
        Some(s) if s.delivered > 0 => formatter.info("Tracking notification sent"),
        Some(s) if s.failed > 0 => formatter.warning("Tracking notification could not be delivered"),
        Some(_) => formatter.info("No email contact, no notification sent"),
        None => {},
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_into_draft() {
        let draft = SubmitParams {
            items: vec!["Wallet:brown leather".to_string(), "Keys".to_string()],
            name: Some("Alice".to_string()),
            contact: None,
            no_notify: true,
        }
        .into_draft();

        assert_eq!(draft.items.len(), 2);
        assert_eq!(draft.items[0].description.as_deref(), Some("brown leather"));
        assert_eq!(draft.reporter_name.as_deref(), Some("Alice"));
    }
}
