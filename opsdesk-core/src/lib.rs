//! Opsdesk Core - Entity Types
//!
//! Pure data structures with no I/O. All other crates depend on this.

pub mod entities;
pub mod enums;
pub mod filter;
pub mod identity;
pub mod scope;

pub use entities::{Attachment, LogEntry, Ticket, TicketMessage};
pub use enums::{LogSeverity, ParseEnumError, Platform, TicketPriority, TicketStatus};
pub use filter::{EntityFilter, LogFilter, PagedFilter, TicketFilter};
pub use identity::{
    AttachmentId, EntityIdType, LogEntryId, MessageId, TicketId, Timestamp, UserId,
};
pub use scope::ViewerScope;
