//! Opsdesk API surface
//!
//! Request/response shapes and WebSocket event types shared with the server.
//! The server implementation itself lives elsewhere; this crate only pins the
//! wire contract the console consumes.

pub mod error;
pub mod events;
pub mod types;

pub use error::ApiError;
pub use events::{Topic, WsEvent};
