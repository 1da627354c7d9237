use super::store::TicketStore;
use crate::core::{NewTicket, Status, Ticket, TicketId};
use crate::error::{LostFoundError, Result};

/// Repository trait for ticket operations
///
/// This is the contract outer surfaces (CLI, HTTP API) program against, so a
/// different store implementation can be dropped in behind them.
pub trait TicketRepository: Send + Sync {
    /// Intakes a new ticket
    fn create(&self, new_ticket: NewTicket) -> Result<Ticket>;

    /// Loads a ticket by ID
    fn get(&self, id: &TicketId) -> Result<Ticket>;

    /// Loads a ticket by its display number
    fn find_by_sequence(&self, sequence: u64) -> Result<Ticket>;

    /// Snapshot of all tickets, oldest first
    fn list(&self) -> Vec<Ticket>;

    /// Changes status from a status label
    fn update_status(&self, id: &TicketId, status: &str) -> Result<Ticket>;

    /// Moves a closed ticket back to an open status
    fn reopen(&self, id: &TicketId, status: Status) -> Result<Ticket>;

    /// Appends a comment to the ticket or to one of its items
    fn add_comment(&self, id: &TicketId, text: &str, item: Option<usize>) -> Result<Ticket>;

    /// Deletes a ticket by ID
    fn delete(&self, id: &TicketId) -> Result<()>;

    /// Resolves a user-supplied reference: a UUID, `#12` or `12`
    fn resolve(&self, reference: &str) -> Result<Ticket> {
        let reference = reference.trim();
        if let Ok(id) = TicketId::parse_str(reference) {
            return self.get(&id);
        }
        match reference.trim_start_matches('#').parse::<u64>() {
            Ok(sequence) => self.find_by_sequence(sequence),
            Err(_) => Err(LostFoundError::not_found(reference)),
        }
    }

    /// Checks if a ticket exists by ID
    fn exists(&self, id: &TicketId) -> bool {
        self.get(id).is_ok()
    }

    /// Finds tickets matching a predicate
    fn find<F>(&self, predicate: F) -> Vec<Ticket>
    where
        F: Fn(&Ticket) -> bool,
        Self: Sized,
    {
        self.list().into_iter().filter(predicate).collect()
    }

    /// Counts tickets matching a predicate
    fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Ticket) -> bool,
        Self: Sized,
    {
        self.list().iter().filter(|t| predicate(t)).count()
    }
}

impl TicketRepository for TicketStore {
    fn create(&self, new_ticket: NewTicket) -> Result<Ticket> {
        Self::create(self, new_ticket)
    }

    fn get(&self, id: &TicketId) -> Result<Ticket> {
        Self::get(self, id)
    }

    fn find_by_sequence(&self, sequence: u64) -> Result<Ticket> {
        Self::find_by_sequence(self, sequence)
    }

    fn list(&self) -> Vec<Ticket> {
        Self::list(self)
    }

    fn update_status(&self, id: &TicketId, status: &str) -> Result<Ticket> {
        Self::update_status(self, id, status)
    }

    fn reopen(&self, id: &TicketId, status: Status) -> Result<Ticket> {
        Self::reopen(self, id, status)
    }

    fn add_comment(&self, id: &TicketId, text: &str, item: Option<usize>) -> Result<Ticket> {
        Self::add_comment(self, id, text, item)
    }

    fn delete(&self, id: &TicketId) -> Result<()> {
        Self::delete(self, id)
    }
}
