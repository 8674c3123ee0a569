//! Viewer authorization scope
//!
//! The console never widens what the server already enforces; this scope is
//! used to drop pushed events that fall outside the viewer's visibility so a
//! shared broadcast topic cannot leak rows into a restricted view.

use crate::{LogEntry, Ticket, UserId};
use serde::{Deserialize, Serialize};

/// What the current viewer is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerScope {
    /// Privileged viewers (admins) see all tickets, logs, and aggregates.
    pub is_privileged: bool,
    /// Identity of the viewer, used for owner checks.
    pub viewer_id: Option<UserId>,
}

impl ViewerScope {
    pub fn privileged(viewer_id: UserId) -> Self {
        Self {
            is_privileged: true,
            viewer_id: Some(viewer_id),
        }
    }

    pub fn agent(viewer_id: UserId) -> Self {
        Self {
            is_privileged: false,
            viewer_id: Some(viewer_id),
        }
    }

    /// Non-privileged viewers only see tickets assigned to them.
    pub fn can_see_ticket(&self, ticket: &Ticket) -> bool {
        if self.is_privileged {
            return true;
        }
        match (self.viewer_id, ticket.owner_id) {
            (Some(viewer), Some(owner)) => viewer == owner,
            _ => false,
        }
    }

    /// The error-log feed is privileged-only.
    pub fn can_see_logs(&self) -> bool {
        self.is_privileged
    }

    pub fn can_see_log_entry(&self, _entry: &LogEntry) -> bool {
        self.can_see_logs()
    }
}
