//! Opsdesk client library.
//!
//! Keeps paginated, filtered console views (tickets, error logs) consistent
//! against an initial REST page fetch, a pushed stream of change events, and
//! local optimistic edits. The UI layer consumes [`session::ConsoleSession`];
//! rendering, routing, and the server side live elsewhere.

pub mod api_client;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod notifications;
pub mod realtime;
pub mod session;
pub mod sync;
