//! Wire types exchanged between the relay and the bot.
//!
//! This crate provides:
//! - `ExecutionRequest` and the identity/room types nested inside it
//! - Decomposition of the compound `command` and `reply_to` identifiers
//! - `ExecutionResponse`, the result sent back once a command has run

mod error;
mod request;
mod response;

pub use error::{MessageError, MessageResult};
pub use request::{ChatRoom, ChatUser, ChatUserId, CogUser, ExecutionRequest, Room};
pub use response::ExecutionResponse;
