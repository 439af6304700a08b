//! Shared types for patch messages.

mod atom;
mod message;

pub use atom::Atom;
pub use message::{Channel, Event, Message, MessageError, Outbound};
