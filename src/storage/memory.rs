use super::persistence::{Persistence, Snapshot};
use crate::core::Ticket;
use crate::error::{LostFoundError, Result};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory persistence adapter
///
/// Keeps the last flushed collection so `load` returns it, but nothing
/// survives the process. Flush failures can be injected for tests of the
/// store's rollback behavior.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    snapshot: Mutex<Snapshot>,
    fail_flushes: AtomicBool,
    flush_count: AtomicUsize,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing collection, as if it had been flushed before
    #[must_use]
    pub fn with_tickets(tickets: Vec<Ticket>) -> Self {
        Self {
            snapshot: Mutex::new(Snapshot::new(tickets, 0)),
            ..Self::default()
        }
    }

    /// Make every following flush fail until reset
    pub fn set_fail_flushes(&self, fail: bool) {
        self.fail_flushes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful flushes so far
    pub fn flush_count(&self) -> usize {
        self.flush_count.load(Ordering::SeqCst)
    }

    /// Copy of the last flushed collection
    pub fn snapshot(&self) -> Vec<Ticket> {
        self.stored().tickets.clone()
    }

    /// High-water mark of the last flush
    pub fn high_water(&self) -> u64 {
        self.stored().high_water
    }

    fn stored(&self) -> std::sync::MutexGuard<'_, Snapshot> {
        self.snapshot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Persistence for MemoryStorage {
    fn load(&self) -> Result<Snapshot> {
        Ok(self.stored().clone())
    }

    fn flush(&self, tickets: &[Ticket], high_water: u64) -> Result<()> {
        if self.fail_flushes.load(Ordering::SeqCst) {
            return Err(LostFoundError::Persistence(
                "injected flush failure".to_string(),
            ));
        }
        *self.stored() = Snapshot {
            tickets: tickets.to_vec(),
            high_water,
        };
        self.flush_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
