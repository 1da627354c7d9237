//! Delivery seams for rendered notifications
//!
//! Real email transport is out of scope; deployments plug one in behind
//! [`Mailer`]. The built-in mailers log the message or spool it to disk.

use crate::core::TicketId;
use crate::error::{LostFoundError, Result};
use chrono::Utc;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub ticket_id: TicketId,
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub tracking_url: String,
}

/// Delivers notifications
#[cfg_attr(test, mockall::automock)]
pub trait Mailer: Send + Sync {
    fn deliver(&self, notification: &Notification) -> Result<()>;
}

/// Writes notifications to the log instead of sending them
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn deliver(&self, notification: &Notification) -> Result<()> {
        tracing::info!(
            to = %notification.to,
            subject = %notification.subject,
            tracking_url = %notification.tracking_url,
            "notification ready"
        );
        tracing::debug!(body = %notification.text, "notification body");
        Ok(())
    }
}

/// Spools each notification as a JSON file for an external sender to pick up
#[derive(Debug, Clone)]
pub struct OutboxMailer {
    dir: PathBuf,
}

impl OutboxMailer {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Mailer for OutboxMailer {
    fn deliver(&self, notification: &Notification) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let name = format!(
            "{}-{}.json",
            Utc::now().format("%Y%m%dT%H%M%S%.6f"),
            notification.ticket_id.short()
        );

        let mut temp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(temp.as_file_mut(), notification)?;
        temp.as_file_mut().write_all(b"\n")?;
        temp.persist(self.dir.join(&name))
            .map_err(|e| LostFoundError::Delivery(format!("spool {name}: {}", e.error)))?;

        tracing::info!(to = %notification.to, file = %name, "notification spooled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn notification() -> Notification {
        Notification {
            ticket_id: TicketId::new(),
            to: "alice@example.com".to_string(),
            from: "desk@example.com".to_string(),
            subject: "Lost & Found ticket #1 created".to_string(),
            text: "Track it here".to_string(),
            html: "<p>Track it here</p>".to_string(),
            tracking_url: "https://desk.example/track/1".to_string(),
        }
    }

    #[test]
    fn test_outbox_spools_json() {
        let dir = TempDir::new().unwrap();
        let outbox = dir.path().join("outbox");
        OutboxMailer::new(&outbox).deliver(&notification()).unwrap();

        let files: Vec<_> = std::fs::read_dir(&outbox).unwrap().collect();
        assert_eq!(files.len(), 1);
        let content = std::fs::read_to_string(files[0].as_ref().unwrap().path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["to"], "alice@example.com");
        assert_eq!(value["trackingUrl"], "https://desk.example/track/1");
    }

    #[test]
    fn test_log_mailer_accepts() {
        assert!(LogMailer.deliver(&notification()).is_ok());
    }
}
