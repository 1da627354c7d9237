//! Test utilities for lost-found
//!
//! This module provides common test fixtures and utilities to reduce
//! duplication in test code across the codebase.

#![cfg(test)]

use crate::core::{NewItem, NewTicket, Status, Ticket};
use crate::error::{LostFoundError, Result};
use crate::storage::{
    FileStorage, MemoryStorage, Persistence, Snapshot, StoreOptions, TicketStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Store over an inspectable in-memory backend
pub struct TestStore {
    pub backend: Arc<MemoryStorage>,
    pub store: TicketStore,
}

impl TestStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::with_options(StoreOptions::default())
    }

    pub fn with_options(options: StoreOptions) -> Self {
        let backend = Arc::new(MemoryStorage::new());
        let store = TicketStore::open(backend.clone(), options).expect("Failed to open store");
        Self { backend, store }
    }

    /// Create a store with three tickets: submitted, located and closed
    pub fn with_sample_tickets() -> Self {
        let fixture = Self::new();
        let tickets = [
            (NewItem::new("Wallet"), Status::Submitted),
            (NewItem::new("Umbrella"), Status::Located),
            (NewItem::new("Keys"), Status::Closed),
        ];

        for (item, status) in tickets {
            let ticket = fixture
                .store
                .create(NewTicket::new(vec![item]))
                .expect("Failed to create ticket");
            fixture
                .store
                .set_status(&ticket.id, status)
                .expect("Failed to set status");
        }

        fixture
    }
}

/// Temporary directory holding a file-backed store
pub struct TestProject {
    pub temp_dir: TempDir,
    pub data_file: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_file = temp_dir.path().join("tickets.json");
        Self {
            temp_dir,
            data_file,
        }
    }

    /// Open a store over the project's data file
    pub fn open_store(&self) -> TicketStore {
        let storage = FileStorage::open(&self.data_file, Duration::from_millis(200))
            .expect("Failed to open file storage");
        TicketStore::open(Arc::new(storage), StoreOptions::default())
            .expect("Failed to open store")
    }
}

/// Memory backend whose flushes take a configurable time
///
/// Like the file backend, it refuses to commit once the flush deadline has
/// passed.
pub struct SlowStorage {
    inner: MemoryStorage,
    delay_ms: AtomicU64,
}

impl SlowStorage {
    pub fn new(delay: Duration) -> Self {
        let storage = Self {
            inner: MemoryStorage::new(),
            delay_ms: AtomicU64::new(0),
        };
        storage.set_delay(delay);
        storage
    }

    pub fn set_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.delay_ms.store(millis, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }

    fn pause(&self) {
        thread::sleep(Duration::from_millis(self.delay_ms.load(Ordering::SeqCst)));
    }
}

impl Persistence for SlowStorage {
    fn load(&self) -> Result<Snapshot> {
        self.inner.load()
    }

    fn flush(&self, tickets: &[Ticket], high_water: u64) -> Result<()> {
        self.pause();
        self.inner.flush(tickets, high_water)
    }

    fn flush_before(&self, tickets: &[Ticket], high_water: u64, deadline: Instant) -> Result<()> {
        self.pause();
        if Instant::now() >= deadline {
            return Err(LostFoundError::Persistence("flush finished late".to_string()));
        }
        self.inner.flush(tickets, high_water)
    }

    fn describe(&self) -> String {
        "slow-memory".to_string()
    }
}

/// The kiosk's canonical example report
pub fn wallet_report() -> NewTicket {
    NewTicket::new(vec![NewItem::new("Wallet").with_description("brown leather")])
        .reporter("Alice")
        .contact("alice@example.com")
}

/// Assert that two tickets carry the same record data
pub fn assert_tickets_equal(left: &Ticket, right: &Ticket) {
    assert_eq!(left.id, right.id, "Ticket IDs don't match");
    assert_eq!(
        left.sequence_number, right.sequence_number,
        "Sequence numbers don't match"
    );
    assert_eq!(left.status, right.status, "Ticket statuses don't match");
    assert_eq!(left.items, right.items, "Ticket items don't match");
    assert_eq!(left.comments, right.comments, "Ticket comments don't match");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_tickets() {
        let fixture = TestStore::with_sample_tickets();
        let statuses: Vec<_> = fixture.store.list().iter().map(|t| t.status).collect();
        assert_eq!(
            statuses,
            vec![Status::Submitted, Status::Located, Status::Closed]
        );
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let project = TestProject::new();
        let created = {
            let store = project.open_store();
            let ticket = store.create(wallet_report()).unwrap();
            store.add_comment(&ticket.id, "checked lobby", Some(0)).unwrap()
        };

        let reopened = project.open_store();
        assert_tickets_equal(&reopened.get(&created.id).unwrap(), &created);
    }
}
