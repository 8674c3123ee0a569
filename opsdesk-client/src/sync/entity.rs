//! Entity trait the engine is generic over.

use opsdesk_core::{EntityIdType, LogEntry, Ticket, ViewerScope};
use uuid::Uuid;

/// A server-owned entity the engine can mirror: stable unique id plus a
/// viewer-visibility check for dropping out-of-scope events.
pub trait SyncEntity {
    fn id(&self) -> Uuid;
    fn visible_to(&self, scope: &ViewerScope) -> bool;
}

impl SyncEntity for Ticket {
    fn id(&self) -> Uuid {
        self.ticket_id.as_uuid()
    }

    fn visible_to(&self, scope: &ViewerScope) -> bool {
        scope.can_see_ticket(self)
    }
}

impl SyncEntity for LogEntry {
    fn id(&self) -> Uuid {
        self.entry_id.as_uuid()
    }

    fn visible_to(&self, scope: &ViewerScope) -> bool {
        scope.can_see_log_entry(self)
    }
}
