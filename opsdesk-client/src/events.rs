//! Event types delivered into the session apply loop.

use opsdesk_api::events::{Topic, WsEvent};

/// One unit of work for the single-threaded apply loop.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A frame from a subscription, tagged with the topic and the
    /// subscription generation it belongs to so stale frames can be dropped.
    Ws {
        topic: Topic,
        generation: u64,
        event: Box<WsEvent>,
    },
    /// A REST call failed off-loop.
    ApiError(String),
}
