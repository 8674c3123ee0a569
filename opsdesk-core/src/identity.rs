//! Identity types for Opsdesk entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Common behavior for strongly-typed entity ids.
///
/// Ids are UUIDv7: the embedded Unix timestamp makes them naturally
/// sortable by creation time.
pub trait EntityIdType: Copy + Eq + std::hash::Hash + fmt::Display {
    /// Generate a fresh timestamp-sortable id.
    fn now_v7() -> Self;
    /// Wrap an existing UUID.
    fn from_uuid(uuid: Uuid) -> Self;
    /// The underlying UUID.
    fn as_uuid(&self) -> Uuid;
    /// Whether this is the all-zero nil id (invalid for real entities).
    fn is_nil(&self) -> bool {
        self.as_uuid().is_nil()
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl EntityIdType for $name {
            fn now_v7() -> Self {
                Self(Uuid::now_v7())
            }

            fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

entity_id!(
    /// Id of a support ticket.
    TicketId
);
entity_id!(
    /// Id of a message within a ticket thread.
    MessageId
);
entity_id!(
    /// Id of a file attached to a ticket.
    AttachmentId
);
entity_id!(
    /// Id of an error-log entry.
    LogEntryId
);
entity_id!(
    /// Id of a console user (viewer, requester, or assignee).
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sortable_by_creation() {
        let a = TicketId::now_v7();
        let b = TicketId::now_v7();
        assert!(a <= b);
    }

    #[test]
    fn nil_id_detected() {
        let nil = TicketId::from_uuid(Uuid::nil());
        assert!(nil.is_nil());
        assert!(!TicketId::now_v7().is_nil());
    }

    #[test]
    fn id_serializes_transparently() {
        let id = MessageId::now_v7();
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }
}
