//! Ticket store and persistence adapters
//!
//! [`TicketStore`] owns the collection; [`Persistence`] is the load/flush
//! contract it writes through, implemented by [`FileStorage`] (JSON file,
//! atomic replace, advisory lock) and [`MemoryStorage`].

mod file;
mod flush;
pub mod legacy;
mod lock;
mod memory;
mod persistence;
mod repository;
mod store;

pub use file::FileStorage;
pub use lock::StoreLock;
pub use memory::MemoryStorage;
pub use persistence::{Persistence, Snapshot};
pub use repository::TicketRepository;
pub use store::{StoreOptions, TicketStore};
