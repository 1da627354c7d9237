use super::{Comment, Item, Status, Ticket, TicketId};
use chrono::{DateTime, Utc};

/// Builder for creating Ticket instances
///
/// Used when records come from somewhere other than intake, such as legacy
/// imports and fixtures. Intake goes through [`Ticket::from_draft`].
#[derive(Default)]
pub struct TicketBuilder {
    id: Option<TicketId>,
    sequence_number: Option<u64>,
    reporter_name: Option<String>,
    contact: Option<String>,
    items: Vec<Item>,
    status: Option<Status>,
    comments: Vec<Comment>,
    created_at: Option<DateTime<Utc>>,
}

impl TicketBuilder {
    /// Create a new ticket builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ticket ID
    #[must_use]
    pub fn id(mut self, id: TicketId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the display sequence number
    #[must_use]
    pub const fn sequence_number(mut self, sequence_number: u64) -> Self {
        self.sequence_number = Some(sequence_number);
        self
    }

    /// Set the reporter name
    #[must_use]
    pub fn reporter_name(mut self, name: impl Into<String>) -> Self {
        self.reporter_name = Some(name.into());
        self
    }

    /// Set the contact (email or phone)
    #[must_use]
    pub fn contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    /// Add a single item
    #[must_use]
    pub fn item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// Replace the items
    #[must_use]
    pub fn items(mut self, items: Vec<Item>) -> Self {
        self.items = items;
        self
    }

    /// Set the status
    #[must_use]
    pub const fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Add a ticket-level comment
    #[must_use]
    pub fn comment(mut self, comment: Comment) -> Self {
        self.comments.push(comment);
        self
    }

    /// Set `created_at` timestamp
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Build the ticket
    pub fn build(self) -> Ticket {
        Ticket {
            id: self.id.unwrap_or_default(),
            sequence_number: self.sequence_number,
            reporter_name: self.reporter_name,
            contact: self.contact,
            items: self.items,
            status: self.status.unwrap_or_default(),
            comments: self.comments,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}
