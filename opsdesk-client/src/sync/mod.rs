//! Realtime filtered-list synchronization engine.
//!
//! A miniature cache-coherence layer over a push/pull hybrid source: REST
//! fetches load whole pages, pushed change events are merged one at a time
//! through the active filter snapshot, and local optimistic edits are deduped
//! against their pushed echoes. All mutation happens on the caller's apply
//! loop; the engine never spawns work of its own besides subscription tasks.

pub mod detail;
pub mod entity;
pub mod page;
pub mod reconcile;
pub mod stats;
pub mod subscription;

pub use detail::{DetailController, DetailState, MessageSource};
pub use entity::SyncEntity;
pub use page::PageState;
pub use reconcile::{apply, Applied};
pub use stats::StatsRefresher;
pub use subscription::{StreamTask, SubscriptionHandle, SubscriptionManager, SubscriptionPhase};

use uuid::Uuid;

/// One change pushed from the server, already narrowed to a single entity
/// type. Delivery is at-least-once; ordering holds per entity id only.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent<E> {
    Inserted(E),
    Updated(E),
    Deleted(Uuid),
}

impl<E> ChangeEvent<E> {
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::Inserted(_) => "insert",
            ChangeEvent::Updated(_) => "update",
            ChangeEvent::Deleted(_) => "delete",
        }
    }
}
