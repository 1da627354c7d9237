//! Error types for lost-found
//!
//! Every fallible operation in the crate returns [`Result`]. Each error maps to
//! an [`ErrorKind`], which is what outer surfaces (CLI, HTTP API) dispatch on.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for lost-found operations
pub type Result<T> = std::result::Result<T, LostFoundError>;

/// Coarse classification of errors, stable across variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input from the caller
    Validation,
    /// Unknown ticket identifier
    NotFound,
    /// Item index outside the ticket's item list
    IndexOutOfRange,
    /// Status label outside the enum, or a forbidden transition
    InvalidTransition,
    /// The durability layer failed; the operation was rolled back
    Persistence,
    /// Persisted data exists but cannot be read
    CorruptState,
    /// Invalid configuration
    Config,
    /// Notification rendering or delivery failed
    Notification,
}

impl ErrorKind {
    /// HTTP status code used by the API surface
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Validation | Self::IndexOutOfRange | Self::InvalidTransition => 400,
            Self::Persistence | Self::CorruptState | Self::Config | Self::Notification => 500,
        }
    }

    /// Short label for logs and JSON output
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::IndexOutOfRange => "index_out_of_range",
            Self::InvalidTransition => "invalid_transition",
            Self::Persistence => "persistence",
            Self::CorruptState => "corrupt_state",
            Self::Config => "config",
            Self::Notification => "notification",
        }
    }
}

/// Main error type for lost-found
#[derive(Error, Debug)]
pub enum LostFoundError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Ticket not found: {id}")]
    TicketNotFound { id: String },

    #[error("Item index {index} is out of range for ticket {id} ({len} items)")]
    ItemIndexOutOfRange { id: String, index: usize, len: usize },

    #[error("Unknown status '{value}'. Must be one of: Submitted, Searching, Located, Closed")]
    UnknownStatus { value: String },

    #[error("Ticket {id} cannot move from {from} to {to}")]
    ForbiddenTransition {
        id: String,
        from: String,
        to: String,
    },

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Flush did not complete within {0:?}")]
    FlushTimeout(Duration),

    #[error("Data file {path} is locked by another process")]
    LockContention { path: PathBuf },

    #[error("Corrupt state in {path}: {message}")]
    CorruptState { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("{0}")]
    Custom(String),
}

impl LostFoundError {
    /// Create a custom error with a message
    pub fn custom<S: Into<String>>(msg: S) -> Self {
        Self::Custom(msg.into())
    }

    /// Shorthand for a missing ticket
    pub fn not_found(id: impl ToString) -> Self {
        Self::TicketNotFound { id: id.to_string() }
    }

    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::TicketNotFound { .. } => ErrorKind::NotFound,
            Self::ItemIndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            Self::UnknownStatus { .. } | Self::ForbiddenTransition { .. } => {
                ErrorKind::InvalidTransition
            },
            Self::Persistence(_)
            | Self::FlushTimeout(_)
            | Self::LockContention { .. }
            | Self::Io(_)
            | Self::SerializationError(_)
            | Self::Custom(_) => ErrorKind::Persistence,
            Self::CorruptState { .. } => ErrorKind::CorruptState,
            Self::Config(_) => ErrorKind::Config,
            Self::Template(_) | Self::Delivery(_) => ErrorKind::Notification,
        }
    }

    /// Check if the caller can recover by correcting input or retrying
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self.kind(), ErrorKind::CorruptState | ErrorKind::Config)
    }

    /// Check if this is a configuration error
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Config)
    }

    /// User-facing message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::CorruptState { path, .. } => format!(
                "Refusing to start: {} exists but could not be read",
                path.display()
            ),
            _ => self.to_string(),
        }
    }

    /// Suggestions for fixing the error
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::TicketNotFound { .. } => vec![
                "Run 'lost-found list' to see all tickets".to_string(),
                "Tickets can be referenced by UUID or by their #number".to_string(),
            ],
            Self::UnknownStatus { .. } => {
                vec!["Valid statuses: submitted, searching, located, closed".to_string()]
            },
            Self::ForbiddenTransition { .. } => {
                vec!["Use 'lost-found reopen <ticket>' to reopen a closed ticket".to_string()]
            },
            Self::ItemIndexOutOfRange { .. } => {
                vec!["Run 'lost-found show <ticket>' to see its items".to_string()]
            },
            Self::LockContention { .. } => vec![
                "Another lost-found process owns the data file".to_string(),
                "Stop it or point this one at a different --data path".to_string(),
            ],
            Self::CorruptState { path, .. } => vec![
                format!("Inspect or restore {} from backup", path.display()),
                "A legacy kiosk file can be converted with 'lost-found import'".to_string(),
            ],
            Self::Config(_) => vec!["Check lost-found.toml and LOST_FOUND_* variables".to_string()],
            _ => vec![],
        }
    }
}

impl From<config::ConfigError> for LostFoundError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for LostFoundError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Custom(format!("YAML error: {err}"))
    }
}

impl From<csv::Error> for LostFoundError {
    fn from(err: csv::Error) -> Self {
        Self::Custom(format!("CSV error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(LostFoundError::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(
            LostFoundError::Validation("empty".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            LostFoundError::UnknownStatus {
                value: "Lost".into()
            }
            .kind(),
            ErrorKind::InvalidTransition
        );
        assert_eq!(
            LostFoundError::FlushTimeout(Duration::from_millis(5)).kind(),
            ErrorKind::Persistence
        );
        assert_eq!(
            LostFoundError::Io(std::io::Error::other("disk")).kind(),
            ErrorKind::Persistence
        );
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorKind::NotFound.http_status(), 404);
        assert_eq!(ErrorKind::Validation.http_status(), 400);
        assert_eq!(ErrorKind::InvalidTransition.http_status(), 400);
        assert_eq!(ErrorKind::Persistence.http_status(), 500);
    }

    #[test]
    fn test_corrupt_state_is_fatal() {
        let err = LostFoundError::CorruptState {
            path: PathBuf::from("tickets.json"),
            message: "expected value".into(),
        };
        assert!(!err.is_recoverable());
        assert!(err.user_message().contains("Refusing to start"));
        assert!(!err.suggestions().is_empty());
    }
}
