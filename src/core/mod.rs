//! Record model: tickets, items, comments and their validation

mod builders;
mod ticket;

pub use builders::TicketBuilder;
pub use ticket::{Comment, Item, NewItem, NewTicket, Status, Ticket, TicketId};
