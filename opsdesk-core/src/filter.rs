//! Filter snapshots and membership predicates
//!
//! A filter is an immutable snapshot of the active list dimensions. The
//! predicates are pure: reconciliation evaluates them against the snapshot
//! current at event-processing time, never one captured at subscribe time.
//! An unset dimension is "don't care" and always matches.

use crate::{LogEntry, LogSeverity, Platform, Ticket, TicketPriority, TicketStatus, Timestamp};
use serde::{Deserialize, Serialize};

/// Membership predicate over one entity type.
pub trait EntityFilter<E> {
    fn matches(&self, entity: &E) -> bool;
}

/// Generic access to the page dimension of a filter snapshot.
pub trait PagedFilter {
    fn page(&self) -> u64;
    /// Set the requested page (floored to 1).
    fn set_page(&mut self, page: u64);
}

impl PagedFilter for TicketFilter {
    fn page(&self) -> u64 {
        self.page
    }

    fn set_page(&mut self, page: u64) {
        self.page = page.max(1);
    }
}

impl PagedFilter for LogFilter {
    fn page(&self) -> u64 {
        self.page
    }

    fn set_page(&mut self, page: u64) {
        self.page = page.max(1);
    }
}

/// Active filter dimensions for the ticket list.
///
/// Replacing any non-page dimension resets `page` to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub search: Option<String>,
    pub date_from: Option<Timestamp>,
    pub date_to: Option<Timestamp>,
    pub page: u64,
}

impl Default for TicketFilter {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            search: None,
            date_from: None,
            date_to: None,
            page: 1,
        }
    }
}

impl TicketFilter {
    pub fn set_status(&mut self, status: Option<TicketStatus>) {
        self.status = status;
        self.page = 1;
    }

    pub fn set_priority(&mut self, priority: Option<TicketPriority>) {
        self.priority = priority;
        self.page = 1;
    }

    pub fn set_search(&mut self, search: Option<String>) {
        self.search = search;
        self.page = 1;
    }

    pub fn set_date_range(&mut self, from: Option<Timestamp>, to: Option<Timestamp>) {
        self.date_from = from;
        self.date_to = to;
        self.page = 1;
    }
}

impl EntityFilter<Ticket> for TicketFilter {
    fn matches(&self, ticket: &Ticket) -> bool {
        if let Some(status) = self.status {
            if ticket.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if ticket.priority != priority {
                return false;
            }
        }
        if !search_matches(
            self.search.as_deref(),
            &[
                &ticket.subject,
                &ticket.body,
                &ticket.requester_name,
                &ticket.requester_email,
            ],
        ) {
            return false;
        }
        in_date_range(ticket.created_at, self.date_from, self.date_to)
    }
}

/// Active filter dimensions for the error-log list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogFilter {
    pub severity: Option<LogSeverity>,
    pub platform: Option<Platform>,
    pub search: Option<String>,
    pub date_from: Option<Timestamp>,
    pub date_to: Option<Timestamp>,
    pub page: u64,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self {
            severity: None,
            platform: None,
            search: None,
            date_from: None,
            date_to: None,
            page: 1,
        }
    }
}

impl LogFilter {
    pub fn set_severity(&mut self, severity: Option<LogSeverity>) {
        self.severity = severity;
        self.page = 1;
    }

    pub fn set_platform(&mut self, platform: Option<Platform>) {
        self.platform = platform;
        self.page = 1;
    }

    pub fn set_search(&mut self, search: Option<String>) {
        self.search = search;
        self.page = 1;
    }

    pub fn set_date_range(&mut self, from: Option<Timestamp>, to: Option<Timestamp>) {
        self.date_from = from;
        self.date_to = to;
        self.page = 1;
    }
}

impl EntityFilter<LogEntry> for LogFilter {
    fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(severity) = self.severity {
            if entry.severity != severity {
                return false;
            }
        }
        if let Some(platform) = self.platform {
            if entry.platform != platform {
                return false;
            }
        }
        if !search_matches(self.search.as_deref(), &[&entry.message, &entry.source]) {
            return false;
        }
        in_date_range(entry.occurred_at, self.date_from, self.date_to)
    }
}

/// Case-insensitive substring match across the designated text fields.
/// An absent or blank term matches everything.
fn search_matches(term: Option<&str>, fields: &[&str]) -> bool {
    let term = match term {
        Some(t) if !t.trim().is_empty() => t.trim().to_lowercase(),
        _ => return true,
    };
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
}

/// Inclusive containment; unset bounds are open.
fn in_date_range(at: Timestamp, from: Option<Timestamp>, to: Option<Timestamp>) -> bool {
    if let Some(from) = from {
        if at < from {
            return false;
        }
    }
    if let Some(to) = to {
        if at > to {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntityIdType, LogEntryId, TicketId};
    use chrono::{Duration, Utc};

    fn ticket() -> Ticket {
        Ticket {
            ticket_id: TicketId::now_v7(),
            subject: "Login broken on portal".to_string(),
            body: "Cannot sign in since this morning".to_string(),
            status: TicketStatus::Open,
            priority: TicketPriority::High,
            requester_name: "Dana Reyes".to_string(),
            requester_email: "dana@example.com".to_string(),
            owner_id: None,
            message_count: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(TicketFilter::default().matches(&ticket()));
    }

    #[test]
    fn status_dimension_is_exact() {
        let mut filter = TicketFilter::default();
        filter.set_status(Some(TicketStatus::Resolved));
        assert!(!filter.matches(&ticket()));
        filter.set_status(Some(TicketStatus::Open));
        assert!(filter.matches(&ticket()));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let mut filter = TicketFilter::default();
        filter.set_search(Some("LOGIN".to_string()));
        assert!(filter.matches(&ticket()));
        filter.set_search(Some("dana@".to_string()));
        assert!(filter.matches(&ticket()));
        filter.set_search(Some("billing".to_string()));
        assert!(!filter.matches(&ticket()));
    }

    #[test]
    fn blank_search_is_dont_care() {
        let mut filter = TicketFilter::default();
        filter.set_search(Some("   ".to_string()));
        assert!(filter.matches(&ticket()));
    }

    #[test]
    fn setters_reset_page() {
        let mut filter = TicketFilter::default();
        filter.page = 4;
        filter.set_priority(Some(TicketPriority::Low));
        assert_eq!(filter.page, 1);
        filter.page = 7;
        filter.set_search(None);
        assert_eq!(filter.page, 1);
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(100))]

        /// Search matching never depends on the case of the term.
        #[test]
        fn search_case_never_matters(term in "[a-zA-Z]{1,12}") {
            let mut lower = TicketFilter::default();
            lower.set_search(Some(term.to_lowercase()));
            let mut upper = TicketFilter::default();
            upper.set_search(Some(term.to_uppercase()));
            let t = ticket();
            proptest::prop_assert_eq!(lower.matches(&t), upper.matches(&t));
        }

        /// A degenerate range containing only the entity's own timestamp
        /// always matches; any range strictly before or after never does.
        #[test]
        fn date_range_containment(offset_secs in 1i64..86_400) {
            let t = ticket();
            let mut filter = TicketFilter::default();
            filter.set_date_range(Some(t.created_at), Some(t.created_at));
            proptest::prop_assert!(filter.matches(&t));
            let delta = Duration::seconds(offset_secs);
            filter.set_date_range(Some(t.created_at + delta), None);
            proptest::prop_assert!(!filter.matches(&t));
            filter.set_date_range(None, Some(t.created_at - delta));
            proptest::prop_assert!(!filter.matches(&t));
        }
    }

    #[test]
    fn log_filter_dimensions_combine() {
        let entry = LogEntry {
            entry_id: LogEntryId::now_v7(),
            severity: LogSeverity::Error,
            platform: Platform::Android,
            message: "NullPointerException in sync worker".to_string(),
            source: "sync.worker".to_string(),
            occurred_at: Utc::now(),
        };
        let mut filter = LogFilter::default();
        filter.set_severity(Some(LogSeverity::Error));
        filter.set_platform(Some(Platform::Android));
        filter.set_search(Some("nullpointer".to_string()));
        assert!(filter.matches(&entry));
        filter.set_platform(Some(Platform::Ios));
        assert!(!filter.matches(&entry));
    }
}
