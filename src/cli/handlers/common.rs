use crate::cli::output::OutputFormatter;
use crate::config::{Config, StorageBackend};
use crate::core::{Status, Ticket};
use crate::error::{LostFoundError, Result};
use crate::notify::NotificationDispatcher;
use crate::storage::{FileStorage, MemoryStorage, Persistence, TicketRepository, TicketStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Common context for all handler operations
pub struct HandlerContext {
    pub config: Config,
    pub store: TicketStore,
}

impl HandlerContext {
    /// Load configuration and open the configured store
    ///
    /// `data_file` overrides `storage.path` and forces the file backend.
    pub fn new(config_path: Option<&str>, data_file: Option<&str>) -> Result<Self> {
        let mut config = Config::load(config_path.map(Path::new))?;
        if let Some(data_file) = data_file {
            config.storage.backend = StorageBackend::File;
            config.storage.path = Some(PathBuf::from(data_file));
        }

        let store = open_store(&config)?;
        Ok(Self { config, store })
    }

    /// Dispatcher for tracking notifications, if enabled
    pub fn notifier(&self) -> Result<Option<NotificationDispatcher>> {
        if !self.config.notification.enabled {
            return Ok(None);
        }
        NotificationDispatcher::from_config(&self.config.notification).map(Some)
    }

    /// Resolve a ticket reference (UUID, `#12` or `12`)
    pub fn resolve(&self, reference: &str) -> Result<Ticket> {
        self.store.resolve(reference)
    }
}

/// Open the store described by `config`
pub fn open_store(config: &Config) -> Result<TicketStore> {
    let backend: Arc<dyn Persistence> = match config.storage.backend {
        StorageBackend::File => Arc::new(FileStorage::open(
            config.storage.data_file(),
            config.storage.lock_timeout(),
        )?),
        StorageBackend::Memory => {
            tracing::warn!("memory backend selected, tickets will not survive this process");
            Arc::new(MemoryStorage::new())
        },
    };
    TicketStore::open(backend, config.store_options())
}

/// Parse an optional status filter
pub fn parse_status_filter(status: Option<&str>) -> Result<Option<Status>> {
    status.map(str::parse::<Status>).transpose()
}

/// Convert a 1-based item position from the command line
pub fn item_index(position: Option<usize>) -> Result<Option<usize>> {
    match position {
        Some(0) => Err(LostFoundError::Validation(
            "Item positions start at 1".to_string(),
        )),
        Some(n) => Ok(Some(n - 1)),
        None => Ok(None),
    }
}

/// Print a ticket in full, or as JSON
pub fn print_ticket(ticket: &Ticket, formatter: &OutputFormatter) -> Result<()> {
    if formatter.is_json() {
        return formatter.print_json(ticket);
    }

    formatter.info(&format!("Ticket {}  ({})", ticket.display_ref(), ticket.id));
    formatter.info(&format!("Status:   {}", formatter.status_label(ticket.status).trim_end()));
    formatter.info(&format!(
        "Reporter: {}",
        ticket.reporter_name.as_deref().unwrap_or("-")
    ));
    formatter.info(&format!("Contact:  {}", ticket.contact.as_deref().unwrap_or("-")));
    formatter.info(&format!(
        "Created:  {}",
        ticket.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    formatter.info("\nItems:");
    for (position, item) in ticket.items.iter().enumerate() {
        match &item.description {
            Some(description) => {
                formatter.info(&format!("  {}. {} ({description})", position + 1, item.name));
            },
            None => formatter.info(&format!("  {}. {}", position + 1, item.name)),
        }
        for comment in &item.comments {
            formatter.info(&format!(
                "       [{}] {}",
                comment.timestamp.format("%Y-%m-%d %H:%M"),
                comment.text
            ));
        }
    }

    if !ticket.comments.is_empty() {
        formatter.info("\nComments:");
        for comment in &ticket.comments {
            formatter.info(&format!(
                "  [{}] {}",
                comment.timestamp.format("%Y-%m-%d %H:%M"),
                comment.text
            ));
        }
    }

    Ok(())
}
