//! Store events
//!
//! The store publishes an event after every durable mutation, once its lock
//! has been released. Subscribers run on their own and can never block or
//! fail the mutation that produced the event.
//!
//! The broadcast feed is bounded and drops events for subscribers that fall
//! behind. Consumers that must see every new ticket, such as the
//! notification dispatcher, take the unbounded created-ticket feed instead.

use crate::core::{Status, Ticket, TicketId};
use std::sync::{Mutex, PoisonError};
use tokio::sync::{broadcast, mpsc};

const DEFAULT_CAPACITY: usize = 256;

/// Where a comment was appended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentScope {
    Ticket,
    Item(usize),
}

/// Event published by the ticket store
#[derive(Debug, Clone)]
pub enum StoreEvent {
    TicketCreated {
        ticket: Ticket,
    },
    StatusChanged {
        ticket_id: TicketId,
        old_status: Status,
        new_status: Status,
    },
    CommentAdded {
        ticket_id: TicketId,
        scope: CommentScope,
    },
    TicketDeleted {
        ticket_id: TicketId,
    },
}

/// Fan-out of store events to any number of subscribers
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
    created: Mutex<Vec<mpsc::UnboundedSender<Ticket>>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.sender.receiver_count())
            .field("created_feeds", &self.created_feeds().len())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per slow subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            created: Mutex::new(Vec::new()),
        }
    }

    /// Get an event receiver
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Get a lossless receiver of newly created tickets
    ///
    /// Closes when the bus is dropped.
    pub fn subscribe_created(&self) -> mpsc::UnboundedReceiver<Ticket> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.created_feeds().push(sender);
        receiver
    }

    /// Publish an event; having no subscribers is not an error
    pub fn publish(&self, event: StoreEvent) {
        match &event {
            StoreEvent::TicketCreated { ticket } => {
                tracing::info!(id = %ticket.id, reference = %ticket.display_ref(), "ticket created");
                self.created_feeds()
                    .retain(|feed| feed.send(ticket.clone()).is_ok());
            },
            StoreEvent::StatusChanged {
                ticket_id,
                old_status,
                new_status,
            } => {
                tracing::info!(id = %ticket_id, from = %old_status, to = %new_status, "status changed");
            },
            StoreEvent::CommentAdded { ticket_id, scope } => {
                tracing::info!(id = %ticket_id, ?scope, "comment added");
            },
            StoreEvent::TicketDeleted { ticket_id } => {
                tracing::info!(id = %ticket_id, "ticket deleted");
            },
        }
        let _ = self.sender.send(event);
    }

    fn created_feeds(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<Ticket>>> {
        self.created.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
