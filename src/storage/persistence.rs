use crate::core::Ticket;
use crate::error::{LostFoundError, Result};
use std::time::Instant;

/// Everything a backend persists in one write
///
/// `high_water` is the highest sequence number ever issued. It is stored
/// next to the collection so a deleted ticket's number is not handed out
/// again after a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub tickets: Vec<Ticket>,
    pub high_water: u64,
}

impl Snapshot {
    /// Build a snapshot, raising `high_water` to cover every stored ticket
    #[must_use]
    pub fn new(tickets: Vec<Ticket>, high_water: u64) -> Self {
        let high_water = tickets
            .iter()
            .filter_map(|t| t.sequence_number)
            .fold(high_water, u64::max);
        Self {
            tickets,
            high_water,
        }
    }
}

/// Durable materialization of the ticket collection
///
/// `load` is the sole source of truth at startup and `flush` the sole
/// durability boundary. A flush writes the whole collection together with
/// the sequence high-water mark and must be all-or-nothing from the point
/// of view of an external reader.
#[cfg_attr(test, mockall::automock)]
pub trait Persistence: Send + Sync {
    /// Loads the persisted collection
    ///
    /// Returns an empty snapshot when no prior state exists and
    /// `CorruptState` when state exists but cannot be parsed.
    fn load(&self) -> Result<Snapshot>;

    /// Durably replaces the persisted collection and high-water mark
    fn flush(&self, tickets: &[Ticket], high_water: u64) -> Result<()>;

    /// Like [`Persistence::flush`], but must not commit once `deadline` passed
    ///
    /// Backends that can check the deadline right before their commit point
    /// should override this.
    fn flush_before(&self, tickets: &[Ticket], high_water: u64, deadline: Instant) -> Result<()> {
        if Instant::now() >= deadline {
            return Err(LostFoundError::Persistence(
                "flush deadline passed before write started".to_string(),
            ));
        }
        self.flush(tickets, high_water)
    }

    /// Short description for logs
    fn describe(&self) -> String;
}
