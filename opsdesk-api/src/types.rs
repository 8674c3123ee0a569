//! API Request and Response Types
//!
//! List requests mirror the filter dimensions one-for-one; the server applies
//! the same membership rules the client re-evaluates locally on pushed events.

use opsdesk_core::{
    Attachment, LogEntry, LogFilter, LogSeverity, Platform, Ticket, TicketFilter, TicketMessage,
    TicketPriority, TicketStatus, Timestamp,
};
use serde::{Deserialize, Serialize};

/// Query parameters for the paginated ticket list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListTicketsRequest {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub search: Option<String>,
    pub date_from: Option<Timestamp>,
    pub date_to: Option<Timestamp>,
    pub page: u64,
    pub page_size: usize,
}

impl ListTicketsRequest {
    pub fn from_filter(filter: &TicketFilter, page_size: usize) -> Self {
        Self {
            status: filter.status,
            priority: filter.priority,
            search: filter.search.clone(),
            date_from: filter.date_from,
            date_to: filter.date_to,
            page: filter.page,
            page_size,
        }
    }
}

/// One page of the ticket list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketPageResponse {
    pub tickets: Vec<Ticket>,
    pub total_count: u64,
    pub total_pages: u64,
}

/// Query parameters for the paginated error-log list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListLogsRequest {
    pub severity: Option<LogSeverity>,
    pub platform: Option<Platform>,
    pub search: Option<String>,
    pub date_from: Option<Timestamp>,
    pub date_to: Option<Timestamp>,
    pub page: u64,
    pub page_size: usize,
}

impl ListLogsRequest {
    pub fn from_filter(filter: &LogFilter, page_size: usize) -> Self {
        Self {
            severity: filter.severity,
            platform: filter.platform,
            search: filter.search.clone(),
            date_from: filter.date_from,
            date_to: filter.date_to,
            page: filter.page,
            page_size,
        }
    }
}

/// One page of the error-log list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogPageResponse {
    pub entries: Vec<LogEntry>,
    pub total_count: u64,
    pub total_pages: u64,
}

/// Full detail state for one ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketDetailResponse {
    pub ticket: Ticket,
    pub messages: Vec<TicketMessage>,
    pub attachments: Vec<Attachment>,
}

/// Request to post a message to a ticket thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostMessageRequest {
    pub body: String,
    pub internal: bool,
}

/// Aggregate ticket counters.
///
/// Computed server-side over the whole ticket corpus, independent of any list
/// filter; never derived from a filtered page's `total_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketStatsResponse {
    pub open: u64,
    pub in_progress: u64,
    pub resolved_today: u64,
    pub unassigned: u64,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_request_mirrors_filter() {
        let mut filter = TicketFilter::default();
        filter.set_status(Some(TicketStatus::Open));
        filter.set_search(Some("vpn".to_string()));
        filter.page = 3;
        let request = ListTicketsRequest::from_filter(&filter, 25);
        assert_eq!(request.status, Some(TicketStatus::Open));
        assert_eq!(request.search.as_deref(), Some("vpn"));
        assert_eq!(request.page, 3);
        assert_eq!(request.page_size, 25);
    }
}
