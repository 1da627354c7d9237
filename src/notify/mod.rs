//! Notification dispatcher
//!
//! Follows the store's created-ticket feed, builds the tracking locator for
//! each new ticket, renders the message and hands it to a [`Mailer`]. Runs on
//! its own task with its own retry policy; the store never waits for it and
//! never learns whether delivery succeeded. The feed is unbounded, so a slow
//! mailer delays notifications but never loses them.

mod mailer;

pub use mailer::{LogMailer, Mailer, Notification, OutboxMailer};

use crate::config::{MailerKind, NotificationConfig};
use crate::core::Ticket;
use crate::error::{LostFoundError, Result};
use crate::templates::TemplateRenderer;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap_or_else(|e| panic!("email pattern: {e}"))
});

/// Whether a contact string is an email address
#[must_use]
pub fn is_email(contact: &str) -> bool {
    EMAIL.is_match(contact.trim())
}

/// Externally shareable reference to a ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingLocator {
    pub url: String,
    pub code: String,
}

/// Builds tracking locators against the externally reachable base address
#[derive(Debug, Clone)]
pub struct LocatorBuilder {
    base_url: String,
}

impl LocatorBuilder {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn locate(&self, ticket: &Ticket) -> TrackingLocator {
        TrackingLocator {
            url: format!("{}/track/{}", self.base_url, ticket.id),
            code: ticket.display_ref(),
        }
    }
}

/// Delivery attempts and the pause between them
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure
    pub backoff: Duration,
}

impl RetryPolicy {
    fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

/// What happened to one ticket's notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered { attempts: u32 },
    /// No email contact to deliver to
    Skipped,
    Failed { attempts: u32, error: String },
}

/// Totals reported when the dispatcher stops
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DispatchStats {
    fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Delivered { .. } => self.delivered += 1,
            DispatchOutcome::Skipped => self.skipped += 1,
            DispatchOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Turns created tickets into delivered tracking messages
pub struct NotificationDispatcher {
    locator: LocatorBuilder,
    renderer: TemplateRenderer,
    mailer: Arc<dyn Mailer>,
    from_address: String,
    retry: RetryPolicy,
}

impl NotificationDispatcher {
    pub fn new(
        locator: LocatorBuilder,
        renderer: TemplateRenderer,
        mailer: Arc<dyn Mailer>,
        from_address: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            locator,
            renderer,
            mailer,
            from_address: from_address.into(),
            retry,
        }
    }

    /// Build a dispatcher from the `notification` configuration section
    pub fn from_config(config: &NotificationConfig) -> Result<Self> {
        let renderer = match &config.template_dir {
            Some(dir) => TemplateRenderer::with_overrides(dir)?,
            None => TemplateRenderer::new()?,
        };
        let mailer: Arc<dyn Mailer> = match config.mailer {
            MailerKind::Log => Arc::new(LogMailer),
            MailerKind::Outbox => {
                let dir = config.outbox_dir.clone().ok_or_else(|| {
                    LostFoundError::Config(
                        "notification.outbox_dir is required for the outbox mailer".to_string(),
                    )
                })?;
                Arc::new(OutboxMailer::new(dir))
            },
        };

        Ok(Self::new(
            LocatorBuilder::new(&config.base_url),
            renderer,
            mailer,
            &config.from_address,
            RetryPolicy {
                max_attempts: config.max_attempts.max(1),
                backoff: Duration::from_millis(config.retry_backoff_ms),
            },
        ))
    }

    #[must_use]
    pub const fn locator(&self) -> &LocatorBuilder {
        &self.locator
    }

    /// Render the message for `ticket`, or `None` when it has no email contact
    pub fn prepare(&self, ticket: &Ticket) -> Result<Option<Notification>> {
        let Some(to) = ticket.contact.as_deref().filter(|c| is_email(c)) else {
            return Ok(None);
        };

        let locator = self.locator.locate(ticket);
        let message = self
            .renderer
            .render_created(ticket, &locator.url, &locator.code)?;

        Ok(Some(Notification {
            ticket_id: ticket.id.clone(),
            to: to.trim().to_string(),
            from: self.from_address.clone(),
            subject: message.subject,
            text: message.text,
            html: message.html,
            tracking_url: locator.url,
        }))
    }

    /// Prepare and deliver one ticket's notification, retrying failures
    pub async fn dispatch(&self, ticket: &Ticket) -> DispatchOutcome {
        let notification = match self.prepare(ticket) {
            Ok(Some(notification)) => notification,
            Ok(None) => {
                tracing::info!(id = %ticket.id, "no email contact, notification skipped");
                return DispatchOutcome::Skipped;
            },
            Err(e) => {
                tracing::error!(id = %ticket.id, error = %e, "could not render notification");
                return DispatchOutcome::Failed {
                    attempts: 0,
                    error: e.to_string(),
                };
            },
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.deliver(&notification).await {
                Ok(()) => return DispatchOutcome::Delivered { attempts: attempt },
                Err(e) if attempt >= self.retry.max_attempts => {
                    tracing::error!(
                        id = %ticket.id,
                        attempts = attempt,
                        error = %e,
                        "giving up on notification"
                    );
                    return DispatchOutcome::Failed {
                        attempts: attempt,
                        error: e.to_string(),
                    };
                },
                Err(e) => {
                    let delay = self.retry.delay_after(attempt);
                    tracing::warn!(
                        id = %ticket.id,
                        attempt,
                        retry_in = ?delay,
                        error = %e,
                        "notification delivery failed"
                    );
                    tokio::time::sleep(delay).await;
                },
            }
        }
    }

    async fn deliver(&self, notification: &Notification) -> Result<()> {
        let mailer = Arc::clone(&self.mailer);
        let notification = notification.clone();
        tokio::task::spawn_blocking(move || mailer.deliver(&notification))
            .await
            .map_err(|e| LostFoundError::Delivery(format!("mailer task failed: {e}")))?
    }

    /// Dispatch every created ticket until the store goes away
    ///
    /// Pass [`TicketStore::subscribe_created`](crate::storage::TicketStore::subscribe_created).
    /// Tickets still queued when the store is dropped are dispatched before
    /// the task finishes.
    pub fn spawn(self, mut created: mpsc::UnboundedReceiver<Ticket>) -> JoinHandle<DispatchStats> {
        tokio::spawn(async move {
            let mut stats = DispatchStats::default();
            while let Some(ticket) = created.recv().await {
                let outcome = self.dispatch(&ticket).await;
                stats.record(&outcome);
            }
            tracing::debug!(?stats, "notification dispatcher stopped");
            stats
        })
    }
}
