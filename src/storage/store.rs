//! The ticket store
//!
//! Owns the authoritative collection. Every mutation runs under the write
//! lock: it builds the next collection, flushes it through the persistence
//! adapter and only then swaps it in, so memory and durable state either
//! both reflect a change or neither does. Readers clone from an immutable
//! snapshot under the read lock.

use super::flush::Flusher;
use super::memory::MemoryStorage;
use super::persistence::{Persistence, Snapshot};
use crate::core::{Comment, NewTicket, Status, Ticket, TicketId};
use crate::error::{LostFoundError, Result};
use crate::events::{CommentScope, EventBus, StoreEvent};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Deployment choices for a [`TicketStore`]
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    /// Upper bound for a single flush; `None` flushes inline without a bound
    pub flush_timeout: Option<Duration>,
    /// Let the routine status update move a ticket out of `Closed`
    pub allow_reopen_on_update: bool,
    /// Events buffered per subscriber before it starts lagging
    pub event_capacity: Option<usize>,
}

struct StoreState {
    tickets: Arc<Vec<Ticket>>,
    high_water: u64,
}

impl StoreState {
    fn position(&self, id: &TicketId) -> Result<usize> {
        self.tickets
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| LostFoundError::not_found(id))
    }
}

/// Concurrency-safe owner of the ticket collection
pub struct TicketStore {
    state: RwLock<StoreState>,
    flusher: Flusher,
    events: EventBus,
    options: StoreOptions,
}

impl std::fmt::Debug for TicketStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketStore")
            .field("backend", &self.flusher.backend().describe())
            .field("tickets", &self.len())
            .field("options", &self.options)
            .finish()
    }
}

impl TicketStore {
    /// Open a store over `backend`, loading its persisted collection
    ///
    /// Fails with `CorruptState` instead of starting empty when the backend
    /// holds data it cannot read. Sequence numbers continue after the
    /// persisted high-water mark, so numbers of deleted tickets stay retired.
    pub fn open(backend: Arc<dyn Persistence>, options: StoreOptions) -> Result<Self> {
        let Snapshot {
            mut tickets,
            high_water,
        } = backend.load()?;
        sort_by_creation(&mut tickets);
        let high_water = tickets
            .iter()
            .filter_map(|t| t.sequence_number)
            .fold(high_water, u64::max);

        tracing::info!(
            backend = %backend.describe(),
            count = tickets.len(),
            high_water,
            "ticket store opened"
        );

        let events = options
            .event_capacity
            .map_or_else(EventBus::default, EventBus::new);
        let flusher = Flusher::new(backend, options.flush_timeout)?;

        Ok(Self {
            state: RwLock::new(StoreState {
                tickets: Arc::new(tickets),
                high_water,
            }),
            flusher,
            events,
            options,
        })
    }

    /// A store whose state does not survive the process
    pub fn in_memory() -> Result<Self> {
        Self::open(Arc::new(MemoryStorage::new()), StoreOptions::default())
    }

    /// Receive events for every durable mutation from now on
    ///
    /// The feed is bounded; a subscriber that falls behind skips events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Receive every ticket created from now on, without loss
    ///
    /// The channel closes once the store is dropped.
    pub fn subscribe_created(&self) -> mpsc::UnboundedReceiver<Ticket> {
        self.events.subscribe_created()
    }

    /// Number of tickets currently held
    pub fn len(&self) -> usize {
        self.read_state().tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Intake a new ticket
    pub fn create(&self, new_ticket: NewTicket) -> Result<Ticket> {
        let draft = new_ticket.validate()?;

        let ticket = {
            let mut state = self.write_state();
            let sequence = state.high_water + 1;
            let mut ticket = Ticket::from_draft(draft, Some(sequence));
            while state.tickets.iter().any(|t| t.id == ticket.id) {
                ticket.id = TicketId::new();
            }

            let mut next = Vec::with_capacity(state.tickets.len() + 1);
            next.extend(state.tickets.iter().cloned());
            next.push(ticket.clone());
            let next = Arc::new(next);

            self.flusher.flush(&next, sequence)?;
            state.tickets = next;
            state.high_water = sequence;
            ticket
        };

        self.events.publish(StoreEvent::TicketCreated {
            ticket: ticket.clone(),
        });
        Ok(ticket)
    }

    /// Look up a ticket by id
    pub fn get(&self, id: &TicketId) -> Result<Ticket> {
        let state = self.read_state();
        state
            .tickets
            .iter()
            .find(|t| &t.id == id)
            .cloned()
            .ok_or_else(|| LostFoundError::not_found(id))
    }

    /// Look up a ticket by its display number
    pub fn find_by_sequence(&self, sequence: u64) -> Result<Ticket> {
        let state = self.read_state();
        state
            .tickets
            .iter()
            .find(|t| t.sequence_number == Some(sequence))
            .cloned()
            .ok_or_else(|| LostFoundError::not_found(format!("#{sequence}")))
    }

    /// Snapshot of all tickets, oldest first
    pub fn list(&self) -> Vec<Ticket> {
        let snapshot = Arc::clone(&self.read_state().tickets);
        let mut tickets = snapshot.as_ref().clone();
        sort_by_creation(&mut tickets);
        tickets
    }

    /// Change status from a label such as `"Located"`
    ///
    /// Unknown labels fail with `UnknownStatus` before the ticket is touched.
    pub fn update_status(&self, id: &TicketId, status: &str) -> Result<Ticket> {
        let status: Status = status.parse()?;
        self.set_status(id, status)
    }

    /// Change status through the routine update path
    ///
    /// Leaving `Closed` is rejected unless the store was opened with
    /// `allow_reopen_on_update`; use [`TicketStore::reopen`] otherwise.
    pub fn set_status(&self, id: &TicketId, status: Status) -> Result<Ticket> {
        let allow_reopen = self.options.allow_reopen_on_update;
        let (before, after) = self.mutate(id, |ticket| {
            if ticket.status.is_terminal() && status != ticket.status && !allow_reopen {
                return Err(forbidden(ticket, status));
            }
            ticket.status = status;
            Ok(())
        })?;

        self.publish_status_change(&before, &after);
        Ok(after)
    }

    /// Explicitly move a closed ticket back to an open status
    pub fn reopen(&self, id: &TicketId, status: Status) -> Result<Ticket> {
        let (before, after) = self.mutate(id, |ticket| {
            if !ticket.status.is_terminal() || status.is_terminal() {
                return Err(forbidden(ticket, status));
            }
            ticket.status = status;
            Ok(())
        })?;

        self.publish_status_change(&before, &after);
        Ok(after)
    }

    /// Append a comment to the ticket, or to one of its items (0-based)
    pub fn add_comment(&self, id: &TicketId, text: &str, item: Option<usize>) -> Result<Ticket> {
        let comment = Comment::new(text)?;
        let (_, after) = self.mutate(id, |ticket| {
            match item {
                Some(index) => {
                    let len = ticket.items.len();
                    let target = ticket.items.get_mut(index).ok_or_else(|| {
                        LostFoundError::ItemIndexOutOfRange {
                            id: ticket.id.to_string(),
                            index,
                            len,
                        }
                    })?;
                    target.comments.push(comment);
                },
                None => ticket.comments.push(comment),
            }
            Ok(())
        })?;

        self.events.publish(StoreEvent::CommentAdded {
            ticket_id: after.id.clone(),
            scope: item.map_or(CommentScope::Ticket, CommentScope::Item),
        });
        Ok(after)
    }

    /// Remove a ticket for good; its id is never handed out again
    pub fn delete(&self, id: &TicketId) -> Result<()> {
        {
            let mut state = self.write_state();
            let index = state.position(id)?;
            let mut next = state.tickets.as_ref().clone();
            next.remove(index);
            let next = Arc::new(next);

            self.flusher.flush(&next, state.high_water)?;
            state.tickets = next;
        }

        self.events.publish(StoreEvent::TicketDeleted {
            ticket_id: id.clone(),
        });
        Ok(())
    }

    /// Merge externally converted tickets in one durable step
    ///
    /// Imported tickets keep their sequence number unless it is already
    /// taken, in which case they get the next free one. No events are
    /// published, so imports never trigger notifications.
    pub fn import(&self, tickets: Vec<Ticket>) -> Result<Vec<Ticket>> {
        if let Some(empty) = tickets.iter().find(|t| t.items.is_empty()) {
            return Err(LostFoundError::Validation(format!(
                "Imported ticket {} has no items",
                empty.id
            )));
        }

        let mut state = self.write_state();
        let mut taken: HashSet<u64> = state
            .tickets
            .iter()
            .filter_map(|t| t.sequence_number)
            .collect();
        let mut high_water = tickets
            .iter()
            .filter_map(|t| t.sequence_number)
            .fold(state.high_water, u64::max);

        let mut next = state.tickets.as_ref().clone();
        let mut imported = Vec::with_capacity(tickets.len());
        for mut ticket in tickets {
            while next.iter().any(|t| t.id == ticket.id) {
                ticket.id = TicketId::new();
            }
            let sequence = match ticket.sequence_number {
                Some(n) if taken.insert(n) => n,
                _ => {
                    high_water += 1;
                    taken.insert(high_water);
                    high_water
                },
            };
            ticket.sequence_number = Some(sequence);
            next.push(ticket.clone());
            imported.push(ticket);
        }
        sort_by_creation(&mut next);
        let next = Arc::new(next);

        self.flusher.flush(&next, high_water)?;
        state.tickets = next;
        state.high_water = high_water;

        tracing::info!(count = imported.len(), "imported tickets");
        Ok(imported)
    }

    /// Apply `change` to one ticket and commit it durably
    ///
    /// Returns the ticket before and after. A change that leaves the ticket
    /// untouched is not flushed.
    fn mutate<F>(&self, id: &TicketId, change: F) -> Result<(Ticket, Ticket)>
    where
        F: FnOnce(&mut Ticket) -> Result<()>,
    {
        let mut state = self.write_state();
        let index = state.position(id)?;
        let before = state.tickets[index].clone();
        let mut after = before.clone();
        change(&mut after)?;

        if after == before {
            return Ok((before, after));
        }

        let mut next = state.tickets.as_ref().clone();
        next[index] = after.clone();
        let next = Arc::new(next);

        self.flusher.flush(&next, state.high_water)?;
        state.tickets = next;
        Ok((before, after))
    }

    fn publish_status_change(&self, before: &Ticket, after: &Ticket) {
        if before.status != after.status {
            self.events.publish(StoreEvent::StatusChanged {
                ticket_id: after.id.clone(),
                old_status: before.status,
                new_status: after.status,
            });
        }
    }

    // Commit is a single assignment after a successful flush, so a panic
    // while holding the lock cannot leave partial state behind.
    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn forbidden(ticket: &Ticket, to: Status) -> LostFoundError {
    LostFoundError::ForbiddenTransition {
        id: ticket.id.to_string(),
        from: ticket.status.to_string(),
        to: to.to_string(),
    }
}

fn sort_by_creation(tickets: &mut [Ticket]) {
    tickets.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then(a.sequence_number.cmp(&b.sequence_number))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Item, NewItem, TicketBuilder};
    use crate::storage::persistence::MockPersistence;
    use crate::test_utils::{wallet_report, SlowStorage, TestProject, TestStore};
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_create_then_get() {
        let store = TicketStore::in_memory().unwrap();
        let created = store.create(wallet_report()).unwrap();

        let loaded = store.get(&created.id).unwrap();
        assert_eq!(loaded.status, Status::Submitted);
        assert!(loaded.comments.is_empty());
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.sequence_number, Some(1));
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        let fixture = TestStore::new();
        let err = fixture.store.create(NewTicket::new(vec![])).unwrap_err();
        assert!(matches!(err, LostFoundError::Validation(_)));
        assert_eq!(fixture.backend.flush_count(), 0);
    }

    #[test]
    fn test_wallet_scenario() {
        let store = TicketStore::in_memory().unwrap();
        let ticket = store
            .create(NewTicket::new(vec![NewItem::new("Wallet")]).reporter("Alice"))
            .unwrap();
        assert_eq!(ticket.items.len(), 1);
        assert_eq!(ticket.status, Status::Submitted);

        store.update_status(&ticket.id, "Located").unwrap();
        assert_eq!(store.get(&ticket.id).unwrap().status, Status::Located);

        store.delete(&ticket.id).unwrap();
        assert!(matches!(
            store.get(&ticket.id),
            Err(LostFoundError::TicketNotFound { .. })
        ));
    }

    #[test]
    fn test_delete_is_final() {
        let store = TicketStore::in_memory().unwrap();
        let first = store.create(wallet_report()).unwrap();
        store.delete(&first.id).unwrap();
        let second = store.create(wallet_report()).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(second.sequence_number, Some(2));
        assert!(store.list().iter().all(|t| t.id != first.id));
        assert!(matches!(
            store.delete(&first.id),
            Err(LostFoundError::TicketNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_status_leaves_ticket_unchanged() {
        let fixture = TestStore::new();
        let ticket = fixture.store.create(wallet_report()).unwrap();
        let flushes = fixture.backend.flush_count();

        let err = fixture.store.update_status(&ticket.id, "Lost").unwrap_err();
        assert!(matches!(err, LostFoundError::UnknownStatus { .. }));
        assert_eq!(fixture.store.get(&ticket.id).unwrap().status, Status::Submitted);
        assert_eq!(fixture.backend.flush_count(), flushes);
    }

    #[test]
    fn test_update_status_unknown_ticket() {
        let store = TicketStore::in_memory().unwrap();
        let err = store.update_status(&TicketId::new(), "Searching").unwrap_err();
        assert!(matches!(err, LostFoundError::TicketNotFound { .. }));
    }

    #[test]
    fn test_closed_ticket_requires_reopen() {
        let store = TicketStore::in_memory().unwrap();
        let ticket = store.create(wallet_report()).unwrap();
        store.set_status(&ticket.id, Status::Closed).unwrap();

        let err = store.set_status(&ticket.id, Status::Searching).unwrap_err();
        assert!(matches!(err, LostFoundError::ForbiddenTransition { .. }));
        assert_eq!(store.get(&ticket.id).unwrap().status, Status::Closed);

        // Closing again is a no-op, not a transition.
        assert!(store.set_status(&ticket.id, Status::Closed).is_ok());

        let reopened = store.reopen(&ticket.id, Status::Searching).unwrap();
        assert_eq!(reopened.status, Status::Searching);
    }

    #[test]
    fn test_reopen_requires_closed_ticket() {
        let store = TicketStore::in_memory().unwrap();
        let ticket = store.create(wallet_report()).unwrap();

        assert!(matches!(
            store.reopen(&ticket.id, Status::Searching),
            Err(LostFoundError::ForbiddenTransition { .. })
        ));
        store.set_status(&ticket.id, Status::Closed).unwrap();
        assert!(matches!(
            store.reopen(&ticket.id, Status::Closed),
            Err(LostFoundError::ForbiddenTransition { .. })
        ));
    }

    #[test]
    fn test_reopen_on_update_override() {
        let options = StoreOptions {
            allow_reopen_on_update: true,
            ..StoreOptions::default()
        };
        let store = TicketStore::open(Arc::new(MemoryStorage::new()), options).unwrap();
        let ticket = store.create(wallet_report()).unwrap();
        store.set_status(&ticket.id, Status::Closed).unwrap();

        let ticket = store.update_status(&ticket.id, "submitted").unwrap();
        assert_eq!(ticket.status, Status::Submitted);
    }

    #[test]
    fn test_comments_are_append_only() {
        let store = TicketStore::in_memory().unwrap();
        let ticket = store.create(wallet_report()).unwrap();

        let texts = ["checked lobby", "checked cafe", "found at security"];
        let mut previous: Vec<Comment> = Vec::new();
        for text in texts {
            let updated = store.add_comment(&ticket.id, text, None).unwrap();
            assert_eq!(&updated.comments[..previous.len()], previous.as_slice());
            previous = updated.comments;
        }

        let stored = store.get(&ticket.id).unwrap();
        let stored_texts: Vec<_> = stored.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(stored_texts, texts);
    }

    #[test]
    fn test_item_comments() {
        let store = TicketStore::in_memory().unwrap();
        let ticket = store
            .create(NewTicket::new(vec![NewItem::new("Wallet"), NewItem::new("Keys")]))
            .unwrap();

        let updated = store.add_comment(&ticket.id, "keys at desk", Some(1)).unwrap();
        assert_eq!(updated.items[1].comments.len(), 1);
        assert!(updated.items[0].comments.is_empty());
        assert!(updated.comments.is_empty());

        let err = store.add_comment(&ticket.id, "nope", Some(2)).unwrap_err();
        assert!(matches!(
            err,
            LostFoundError::ItemIndexOutOfRange { index: 2, len: 2, .. }
        ));
    }

    #[test]
    fn test_blank_comment_rejected() {
        let store = TicketStore::in_memory().unwrap();
        let ticket = store.create(wallet_report()).unwrap();
        assert!(matches!(
            store.add_comment(&ticket.id, "   ", None),
            Err(LostFoundError::Validation(_))
        ));
    }

    #[test]
    fn test_failed_flush_rolls_back_every_mutation() {
        let fixture = TestStore::new();
        let ticket = fixture.store.create(wallet_report()).unwrap();
        fixture.backend.set_fail_flushes(true);

        assert!(fixture.store.create(wallet_report()).is_err());
        assert!(fixture.store.update_status(&ticket.id, "Located").is_err());
        assert!(fixture.store.add_comment(&ticket.id, "hello", None).is_err());
        assert!(fixture.store.delete(&ticket.id).is_err());

        let after = fixture.store.get(&ticket.id).unwrap();
        assert_eq!(after, ticket);
        assert_eq!(fixture.store.len(), 1);
        assert_eq!(fixture.backend.snapshot(), vec![ticket]);

        fixture.backend.set_fail_flushes(false);
        let next = fixture.store.create(wallet_report()).unwrap();
        assert_eq!(next.sequence_number, Some(2));
    }

    #[test]
    fn test_flush_error_kind() {
        let mut backend = MockPersistence::new();
        backend.expect_load().returning(|| Ok(Snapshot::default()));
        backend
            .expect_flush()
            .times(1)
            .returning(|_, _| Err(LostFoundError::Persistence("disk full".to_string())));
        backend.expect_describe().returning(|| "mock".to_string());

        let store = TicketStore::open(Arc::new(backend), StoreOptions::default()).unwrap();
        let err = store.create(wallet_report()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Persistence);
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_state_refuses_to_open() {
        let mut backend = MockPersistence::new();
        backend.expect_load().returning(|| {
            Err(LostFoundError::CorruptState {
                path: "tickets.json".into(),
                message: "expected value".to_string(),
            })
        });

        let result = TicketStore::open(Arc::new(backend), StoreOptions::default());
        assert!(matches!(result, Err(LostFoundError::CorruptState { .. })));
    }

    #[test]
    fn test_open_resumes_sequence_and_order() {
        let older = TicketBuilder::new()
            .sequence_number(4)
            .item(Item::new("Scarf", None))
            .created_at(chrono::Utc::now() - chrono::Duration::hours(2))
            .build();
        let newer = TicketBuilder::new()
            .sequence_number(9)
            .item(Item::new("Phone", None))
            .created_at(chrono::Utc::now() - chrono::Duration::hours(1))
            .build();
        let backend = Arc::new(MemoryStorage::with_tickets(vec![newer.clone(), older.clone()]));

        let store = TicketStore::open(backend, StoreOptions::default()).unwrap();
        let listed: Vec<_> = store.list().into_iter().map(|t| t.id).collect();
        assert_eq!(listed, vec![older.id, newer.id]);

        let created = store.create(wallet_report()).unwrap();
        assert_eq!(created.sequence_number, Some(10));
        assert_eq!(store.find_by_sequence(4).unwrap().items[0].name, "Scarf");
    }

    #[test]
    fn test_deleted_number_is_not_reissued_after_restart() {
        let project = TestProject::new();
        {
            let store = project.open_store();
            store.create(wallet_report()).unwrap();
            let second = store.create(wallet_report()).unwrap();
            assert_eq!(second.sequence_number, Some(2));
            store.delete(&second.id).unwrap();
        }

        let store = project.open_store();
        let next = store.create(wallet_report()).unwrap();
        assert_eq!(next.sequence_number, Some(3));
        assert!(store.find_by_sequence(2).is_err());
    }

    #[test]
    fn test_open_prefers_persisted_high_water() {
        let mut backend = MockPersistence::new();
        backend.expect_load().returning(|| {
            Ok(Snapshot {
                tickets: vec![TicketBuilder::new()
                    .sequence_number(2)
                    .item(Item::new("Scarf", None))
                    .build()],
                high_water: 7,
            })
        });
        backend
            .expect_flush()
            .withf(|tickets, high_water| tickets.len() == 2 && *high_water == 8)
            .times(1)
            .returning(|_, _| Ok(()));
        backend.expect_describe().returning(|| "mock".to_string());

        let store = TicketStore::open(Arc::new(backend), StoreOptions::default()).unwrap();
        let created = store.create(wallet_report()).unwrap();
        assert_eq!(created.sequence_number, Some(8));
    }

    #[test]
    fn test_flush_timeout_leaves_store_untouched() {
        let backend = Arc::new(SlowStorage::new(Duration::from_millis(300)));
        let options = StoreOptions {
            flush_timeout: Some(Duration::from_millis(50)),
            ..StoreOptions::default()
        };
        let store = TicketStore::open(backend.clone(), options).unwrap();
        let mut created = store.subscribe_created();

        let err = store.create(wallet_report()).unwrap_err();
        assert!(matches!(err, LostFoundError::FlushTimeout(_)));
        assert!(store.is_empty());
        assert!(created.try_recv().is_err());

        // Let the worker finish the late write, which it must refuse to commit.
        backend.set_delay(Duration::ZERO);
        thread::sleep(Duration::from_millis(400));
        assert_eq!(backend.inner().flush_count(), 0);

        let next = store.create(wallet_report()).unwrap();
        assert_eq!(next.sequence_number, Some(1));
        assert_eq!(store.len(), 1);
        assert_eq!(backend.inner().high_water(), 1);
    }

    #[test]
    fn test_delete_keeps_high_water_durable() {
        let fixture = TestStore::new();
        let first = fixture.store.create(wallet_report()).unwrap();
        let second = fixture.store.create(wallet_report()).unwrap();
        fixture.store.delete(&second.id).unwrap();
        fixture.store.delete(&first.id).unwrap();

        assert!(fixture.backend.snapshot().is_empty());
        assert_eq!(fixture.backend.high_water(), 2);
    }

    #[test]
    fn test_concurrent_creates_have_unique_ids() {
        let fixture = TestStore::new();
        let store = &fixture.store;

        let created: Vec<Ticket> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        (0..25)
                            .map(|_| store.create(wallet_report()).unwrap())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });

        let ids: HashSet<_> = created.iter().map(|t| t.id.clone()).collect();
        let sequences: HashSet<_> = created.iter().map(|t| t.sequence_number).collect();
        assert_eq!(ids.len(), 200);
        assert_eq!(sequences.len(), 200);
        assert_eq!(store.len(), 200);
        assert_eq!(fixture.backend.snapshot().len(), 200);
    }

    #[test]
    fn test_concurrent_comments_are_not_lost() {
        let store = TicketStore::in_memory().unwrap();
        let ticket = store.create(wallet_report()).unwrap();

        thread::scope(|scope| {
            for worker in 0..4 {
                let store = &store;
                let id = ticket.id.clone();
                scope.spawn(move || {
                    for n in 0..10 {
                        store
                            .add_comment(&id, &format!("worker {worker} note {n}"), None)
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(store.get(&ticket.id).unwrap().comments.len(), 40);
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let store = TicketStore::in_memory().unwrap();
        store.create(wallet_report()).unwrap();
        let snapshot = store.list();
        store.create(wallet_report()).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn test_events_follow_mutations() {
        let store = TicketStore::in_memory().unwrap();
        let mut events = store.subscribe();

        let ticket = store.create(wallet_report()).unwrap();
        store.update_status(&ticket.id, "Searching").unwrap();
        store.add_comment(&ticket.id, "on it", Some(0)).unwrap();
        store.delete(&ticket.id).unwrap();

        assert!(matches!(events.try_recv(), Ok(StoreEvent::TicketCreated { .. })));
        assert!(matches!(
            events.try_recv(),
            Ok(StoreEvent::StatusChanged {
                old_status: Status::Submitted,
                new_status: Status::Searching,
                ..
            })
        ));
        assert!(matches!(
            events.try_recv(),
            Ok(StoreEvent::CommentAdded {
                scope: CommentScope::Item(0),
                ..
            })
        ));
        assert!(matches!(events.try_recv(), Ok(StoreEvent::TicketDeleted { .. })));
    }

    #[test]
    fn test_import_renumbers_collisions() {
        let store = TicketStore::in_memory().unwrap();
        let existing = store.create(wallet_report()).unwrap();
        let mut events = store.subscribe();

        let incoming = vec![
            TicketBuilder::new()
                .sequence_number(1)
                .item(Item::new("Scarf", None))
                .build(),
            TicketBuilder::new()
                .sequence_number(5)
                .item(Item::new("Phone", None))
                .build(),
        ];
        let imported = store.import(incoming).unwrap();

        assert_eq!(imported[0].sequence_number, Some(6));
        assert_eq!(imported[1].sequence_number, Some(5));
        assert_eq!(store.find_by_sequence(1).unwrap().id, existing.id);
        assert_eq!(store.create(wallet_report()).unwrap().sequence_number, Some(7));
        assert!(matches!(events.try_recv(), Ok(StoreEvent::TicketCreated { .. })));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_failed_create_publishes_nothing() {
        let fixture = TestStore::new();
        let mut events = fixture.store.subscribe();
        fixture.backend.set_fail_flushes(true);

        assert!(fixture.store.create(wallet_report()).is_err());
        assert!(events.try_recv().is_err());
    }
}
