use crate::error::{LostFoundError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque ticket identifier
///
/// Always a random v4 UUID, so identifiers stay collision-free for the
/// lifetime of a collection even across deletes and restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Generate a fresh identifier
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from the canonical UUID text form
    pub fn parse_str(s: &str) -> std::result::Result<Self, uuid::Error> {
        Uuid::parse_str(s.trim()).map(Self)
    }

    /// First eight hex characters, for compact display
    #[must_use]
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ticket status
///
/// `Closed` is terminal: the routine update path cannot leave it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Status {
    #[default]
    Submitted,
    Searching,
    Located,
    Closed,
}

impl Status {
    /// Every status, in lifecycle order
    pub const ALL: [Self; 4] = [Self::Submitted, Self::Searching, Self::Located, Self::Closed];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Searching => "Searching",
            Self::Located => "Located",
            Self::Closed => "Closed",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = LostFoundError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "submitted" => Ok(Self::Submitted),
            "searching" => Ok(Self::Searching),
            "located" => Ok(Self::Located),
            "closed" => Ok(Self::Closed),
            _ => Err(LostFoundError::UnknownStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// A single append-only comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Comment {
    /// Create a comment stamped with the current time
    ///
    /// Fails if the text is blank.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(LostFoundError::Validation(
                "Comment text cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            text,
            timestamp: Utc::now(),
        })
    }
}

/// One physical object described within a ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Item {
    #[must_use]
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
            comments: Vec::new(),
        }
    }
}

/// A lost-and-found report tracked through its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    pub items: Vec<Item>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    /// Finalize a validated draft into a fresh `Submitted` ticket
    #[must_use]
    pub fn from_draft(draft: NewTicket, sequence_number: Option<u64>) -> Self {
        Self {
            id: TicketId::new(),
            sequence_number,
            reporter_name: draft.reporter_name,
            contact: draft.contact,
            items: draft
                .items
                .into_iter()
                .map(|item| Item::new(item.name, item.description))
                .collect(),
            status: Status::Submitted,
            comments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Human-friendly reference: `#<sequence>` when assigned, else the short id
    #[must_use]
    pub fn display_ref(&self) -> String {
        self.sequence_number
            .map_or_else(|| self.id.short(), |n| format!("#{n}"))
    }

    /// Total comments across the ticket and all of its items
    #[must_use]
    pub fn comment_count(&self) -> usize {
        self.comments.len() + self.items.iter().map(|i| i.comments.len()).sum::<usize>()
    }
}

/// Item as submitted at intake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewItem {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Parse the CLI form `NAME[:DESCRIPTION]`
    #[must_use]
    pub fn parse_spec(spec: &str) -> Self {
        match spec.split_once(':') {
            Some((name, description)) => Self::new(name).with_description(description),
            None => Self::new(spec),
        }
    }
}

/// Intake request for a new ticket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    #[serde(default, alias = "name")]
    pub reporter_name: Option<String>,
    #[serde(default, alias = "email")]
    pub contact: Option<String>,
    #[serde(default)]
    pub items: Vec<NewItem>,
}

impl NewTicket {
    #[must_use]
    pub fn new(items: Vec<NewItem>) -> Self {
        Self {
            reporter_name: None,
            contact: None,
            items,
        }
    }

    #[must_use]
    pub fn reporter(mut self, name: impl Into<String>) -> Self {
        self.reporter_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    /// Normalize and validate the request
    ///
    /// Text fields are trimmed and blank optional fields become `None`.
    /// Rows with a blank item name are dropped; the request fails when no
    /// named item remains.
    pub fn validate(self) -> Result<Self> {
        if self.items.is_empty() {
            return Err(LostFoundError::Validation(
                "A ticket needs at least one item".to_string(),
            ));
        }

        let items: Vec<NewItem> = self
            .items
            .into_iter()
            .filter_map(|item| {
                let name = item.name.trim().to_string();
                (!name.is_empty()).then(|| NewItem {
                    name,
                    description: non_blank(item.description),
                })
            })
            .collect();

        if items.is_empty() {
            return Err(LostFoundError::Validation(
                "Every item is missing a name".to_string(),
            ));
        }

        Ok(Self {
            reporter_name: non_blank(self.reporter_name),
            contact: non_blank(self.contact),
            items,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
