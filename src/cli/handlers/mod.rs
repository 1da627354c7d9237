//! Command handlers
//!
//! Each handler receives an opened [`HandlerContext`] and the output
//! formatter, performs one store operation and prints the result.

mod common;
mod list;
#[cfg(feature = "api")]
mod serve;
mod submit;
mod transfer;
mod update;

pub use common::{HandlerContext, open_store, print_ticket};
pub use list::{handle_list_command, handle_show_command};
#[cfg(feature = "api")]
pub use serve::handle_serve_command;
pub use submit::{SubmitParams, handle_submit_command};
pub use transfer::{export_tickets, handle_export_command, handle_import_command};
pub use update::{
    handle_comment_command, handle_delete_command, handle_reopen_command, handle_status_command,
};
