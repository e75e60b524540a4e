//! Connection-facing layer: client messages in, room events out.

pub mod hub;
pub mod protocol;
pub mod session;

pub use hub::{ConnectionHub, EventSink};
pub use session::Session;
