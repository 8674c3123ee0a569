//! WebSocket Event Types
//!
//! Every server-side mutation on a console entity is broadcast to subscribed
//! clients as one of these events. Delivery is at-least-once with ordering
//! guaranteed only per entity id; consumers must dedup by id and tolerate
//! replays.

use opsdesk_core::{
    Attachment, EntityIdType, LogEntry, LogEntryId, Ticket, TicketId, TicketMessage,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription topic key carried on the WebSocket handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// All ticket list mutations.
    Tickets,
    /// Mutations scoped server-side to one ticket's thread.
    TicketDetail(TicketId),
    /// The error-log feed.
    Logs,
}

impl Topic {
    /// Value of the `topic` query parameter on the ws endpoint.
    pub fn as_query_value(&self) -> String {
        match self {
            Topic::Tickets => "tickets".to_string(),
            Topic::TicketDetail(id) => format!("ticket:{}", id.as_uuid()),
            Topic::Logs => "logs".to_string(),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_query_value())
    }
}

/// WebSocket event types for real-time updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WsEvent {
    // ========================================================================
    // TICKET EVENTS
    // ========================================================================
    /// A new ticket was created.
    TicketCreated {
        /// The created ticket
        ticket: Ticket,
    },

    /// An existing ticket was updated (status, priority, assignment, ...).
    TicketUpdated {
        /// The updated ticket
        ticket: Ticket,
    },

    /// A ticket was deleted.
    TicketDeleted {
        /// Id of the deleted ticket
        id: TicketId,
    },

    // ========================================================================
    // DETAIL EVENTS (ticket-scoped topic)
    // ========================================================================
    /// A message was posted to a ticket thread.
    MessagePosted {
        /// The posted message
        message: TicketMessage,
    },

    /// A file was attached to a ticket.
    AttachmentAdded {
        /// The new attachment
        attachment: Attachment,
    },

    // ========================================================================
    // ERROR-LOG EVENTS
    // ========================================================================
    /// A new error-log entry was recorded.
    LogRecorded {
        /// The recorded entry
        entry: LogEntry,
    },

    /// An error-log entry was pruned by retention.
    LogPruned {
        /// Id of the pruned entry
        id: LogEntryId,
    },

    // ========================================================================
    // CONNECTION EVENTS
    // ========================================================================
    /// The subscription is established and events will flow.
    Connected {},

    /// The subscription ended.
    Disconnected {
        /// Reason for disconnection
        reason: String,
    },

    /// A transport-level error occurred.
    Error {
        /// Error message
        message: String,
    },
}

impl WsEvent {
    /// Get the event type as a string for logging/debugging.
    pub fn event_type(&self) -> &'static str {
        match self {
            WsEvent::TicketCreated { .. } => "TicketCreated",
            WsEvent::TicketUpdated { .. } => "TicketUpdated",
            WsEvent::TicketDeleted { .. } => "TicketDeleted",
            WsEvent::MessagePosted { .. } => "MessagePosted",
            WsEvent::AttachmentAdded { .. } => "AttachmentAdded",
            WsEvent::LogRecorded { .. } => "LogRecorded",
            WsEvent::LogPruned { .. } => "LogPruned",
            WsEvent::Connected { .. } => "Connected",
            WsEvent::Disconnected { .. } => "Disconnected",
            WsEvent::Error { .. } => "Error",
        }
    }

    /// Whether this event carries entity data (as opposed to connection
    /// lifecycle signaling).
    pub fn is_entity_event(&self) -> bool {
        !matches!(
            self,
            WsEvent::Connected { .. } | WsEvent::Disconnected { .. } | WsEvent::Error { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_test_utils::fixtures;

    #[test]
    fn test_event_type_names() {
        let event = WsEvent::TicketCreated {
            ticket: fixtures::ticket(),
        };
        assert_eq!(event.event_type(), "TicketCreated");
        let event = WsEvent::LogPruned {
            id: LogEntryId::now_v7(),
        };
        assert_eq!(event.event_type(), "LogPruned");
    }

    #[test]
    fn test_entity_vs_connection_events() {
        let entity_event = WsEvent::LogRecorded {
            entry: fixtures::log_entry(),
        };
        assert!(entity_event.is_entity_event());

        let connection_event = WsEvent::Disconnected {
            reason: "server shutdown".to_string(),
        };
        assert!(!connection_event.is_entity_event());
    }

    #[test]
    fn test_event_serialization() {
        let event = WsEvent::TicketDeleted {
            id: TicketId::now_v7(),
        };
        let json = serde_json::to_string(&event).expect("Failed to serialize");
        assert!(json.contains("\"type\":\"TicketDeleted\""));
        let deserialized: WsEvent = serde_json::from_str(&json).expect("Failed to deserialize");
        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_message_event_round_trip() {
        let event = WsEvent::MessagePosted {
            message: fixtures::ticket_message(TicketId::now_v7()),
        };
        let json = serde_json::to_string(&event).expect("Failed to serialize");
        let deserialized: WsEvent = serde_json::from_str(&json).expect("Failed to deserialize");
        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_topic_query_values() {
        assert_eq!(Topic::Tickets.as_query_value(), "tickets");
        assert_eq!(Topic::Logs.as_query_value(), "logs");
        let id = TicketId::now_v7();
        assert_eq!(
            Topic::TicketDetail(id).as_query_value(),
            format!("ticket:{}", id.as_uuid())
        );
    }
}
