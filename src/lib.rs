//! lost-found - Lost-and-found ticket intake and tracking
//!
//! This crate provides the record-keeping core of a kiosk or front-desk
//! lost-and-found service:
//! - A concurrency-safe ticket store with durable, atomic persistence
//! - A strict status lifecycle with an explicit reopen path
//! - Append-only staff comments on tickets and individual items
//! - Tracking notifications rendered from templates and delivered off the request path
//! - A CLI and an optional HTTP API over the same store

// Allow missing error documentation for internal implementations
#![allow(clippy::missing_errors_doc)]
// Allow some pedantic lints that don't improve code quality
#![allow(clippy::option_if_let_else)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::single_match_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::indexing_slicing)]

//! # Durability
//!
//! Every mutation is flushed before it becomes visible. If the flush fails
//! or exceeds its time bound, the in-memory collection is left exactly as it
//! was and the caller gets the error. The file backend replaces its data
//! file atomically and holds an advisory lock so two processes never share it.
//!
//! # Example
//!
//! ```rust,ignore
//! use lost_found::core::{NewItem, NewTicket};
//! use lost_found::storage::TicketStore;
//!
//! let store = TicketStore::in_memory()?;
//! let ticket = store.create(
//!     NewTicket::new(vec![NewItem::new("Wallet").with_description("brown leather")])
//!         .reporter("Alice")
//!         .contact("alice@example.com"),
//! )?;
//! store.update_status(&ticket.id, "Searching")?;
//! store.add_comment(&ticket.id, "Checked lobby", Some(0))?;
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod notify;
pub mod storage;
pub mod templates;

#[cfg(feature = "api")]
pub mod api;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{LostFoundError, Result};
