//! Core entity structures
//!
//! Entities are created server-side; the console only mirrors them. Each
//! carries a stable id and an `updated_at` marker that advances on every
//! server-side mutation.

use crate::{
    AttachmentId, LogEntryId, LogSeverity, MessageId, Platform, TicketId, TicketPriority,
    TicketStatus, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};

/// Support ticket - the primary list entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: TicketId,
    pub subject: String,
    pub body: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub requester_name: String,
    pub requester_email: String,
    /// Staff member the ticket is assigned to, if any.
    pub owner_id: Option<UserId>,
    /// Number of messages in the thread, maintained server-side.
    pub message_count: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One message within a ticket thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketMessage {
    pub message_id: MessageId,
    pub ticket_id: TicketId,
    pub author_id: UserId,
    pub author_name: String,
    pub body: String,
    /// Internal notes are visible to staff only.
    pub internal: bool,
    pub sent_at: Timestamp,
}

/// File attached to a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub attachment_id: AttachmentId,
    pub ticket_id: TicketId,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_at: Timestamp,
}

/// Error-log entry - the secondary list entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub entry_id: LogEntryId,
    pub severity: LogSeverity,
    pub platform: Platform,
    pub message: String,
    /// Component or module that emitted the entry.
    pub source: String,
    pub occurred_at: Timestamp,
}
