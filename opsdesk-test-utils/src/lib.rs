//! Opsdesk Test Utilities
//!
//! Centralized test infrastructure for the workspace:
//! - Fixture builders for entities with sensible defaults
//! - Proptest strategies for randomized entities

pub mod fixtures {
    use chrono::{Duration, Utc};
    use opsdesk_core::{
        Attachment, AttachmentId, EntityIdType, LogEntry, LogEntryId, LogSeverity, MessageId,
        Platform, Ticket, TicketId, TicketMessage, TicketPriority, TicketStatus, UserId,
    };

    /// An open, normal-priority, unassigned ticket.
    pub fn ticket() -> Ticket {
        let now = Utc::now();
        Ticket {
            ticket_id: TicketId::now_v7(),
            subject: "Cannot reach voicemail".to_string(),
            body: "Voicemail box reports a configuration error".to_string(),
            status: TicketStatus::Open,
            priority: TicketPriority::Normal,
            requester_name: "Sam Okafor".to_string(),
            requester_email: "sam@example.com".to_string(),
            owner_id: None,
            message_count: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn ticket_with_status(status: TicketStatus) -> Ticket {
        Ticket {
            status,
            ..ticket()
        }
    }

    pub fn ticket_owned_by(owner: UserId) -> Ticket {
        Ticket {
            owner_id: Some(owner),
            ..ticket()
        }
    }

    /// A public (non-internal) message on the given ticket.
    pub fn ticket_message(ticket_id: TicketId) -> TicketMessage {
        TicketMessage {
            message_id: MessageId::now_v7(),
            ticket_id,
            author_id: UserId::now_v7(),
            author_name: "Sam Okafor".to_string(),
            body: "Any update on this?".to_string(),
            internal: false,
            sent_at: Utc::now(),
        }
    }

    pub fn attachment(ticket_id: TicketId) -> Attachment {
        Attachment {
            attachment_id: AttachmentId::now_v7(),
            ticket_id,
            file_name: "screenshot.png".to_string(),
            content_type: "image/png".to_string(),
            size_bytes: 48_213,
            uploaded_at: Utc::now(),
        }
    }

    /// An error-severity backend log entry.
    pub fn log_entry() -> LogEntry {
        LogEntry {
            entry_id: LogEntryId::now_v7(),
            severity: LogSeverity::Error,
            platform: Platform::Backend,
            message: "call routing timed out after 30s".to_string(),
            source: "routing.dispatcher".to_string(),
            occurred_at: Utc::now(),
        }
    }

    pub fn log_entry_with(severity: LogSeverity, platform: Platform) -> LogEntry {
        LogEntry {
            severity,
            platform,
            ..log_entry()
        }
    }

    /// A batch of tickets with distinct ids, oldest first.
    pub fn ticket_batch(count: usize) -> Vec<Ticket> {
        let start = Utc::now() - Duration::minutes(count as i64);
        (0..count)
            .map(|i| {
                let at = start + Duration::minutes(i as i64);
                Ticket {
                    subject: format!("Ticket #{i}"),
                    created_at: at,
                    updated_at: at,
                    ..ticket()
                }
            })
            .collect()
    }
}

pub mod strategies {
    use opsdesk_core::{LogSeverity, Platform, Ticket, TicketPriority, TicketStatus};
    use proptest::prelude::*;

    pub fn ticket_status() -> impl Strategy<Value = TicketStatus> {
        prop_oneof![
            Just(TicketStatus::Open),
            Just(TicketStatus::InProgress),
            Just(TicketStatus::Resolved),
            Just(TicketStatus::Closed),
        ]
    }

    pub fn ticket_priority() -> impl Strategy<Value = TicketPriority> {
        prop_oneof![
            Just(TicketPriority::Low),
            Just(TicketPriority::Normal),
            Just(TicketPriority::High),
            Just(TicketPriority::Critical),
        ]
    }

    pub fn log_severity() -> impl Strategy<Value = LogSeverity> {
        prop_oneof![
            Just(LogSeverity::Debug),
            Just(LogSeverity::Info),
            Just(LogSeverity::Warning),
            Just(LogSeverity::Error),
            Just(LogSeverity::Critical),
        ]
    }

    pub fn platform() -> impl Strategy<Value = Platform> {
        prop_oneof![
            Just(Platform::Web),
            Just(Platform::Ios),
            Just(Platform::Android),
            Just(Platform::Backend),
        ]
    }

    /// Random ticket built on the fixture defaults.
    pub fn ticket() -> impl Strategy<Value = Ticket> {
        (ticket_status(), ticket_priority(), "[a-z ]{5,40}").prop_map(
            |(status, priority, subject)| Ticket {
                status,
                priority,
                subject,
                ..crate::fixtures::ticket()
            },
        )
    }
}
