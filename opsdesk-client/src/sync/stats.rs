//! Dashboard aggregates.
//!
//! The counters come from their own endpoint and are never derived from a
//! filtered page's totals. Entity events that mutate list state only mark the
//! aggregates dirty; the caller decides when to issue the refresh fetch.

use crate::sync::reconcile::Applied;
use opsdesk_api::types::TicketStatsResponse;
use opsdesk_core::ViewerScope;

#[derive(Debug, Default)]
pub struct StatsRefresher {
    stats: Option<TicketStatsResponse>,
    dirty: bool,
}

impl StatsRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> Option<&TicketStatsResponse> {
        self.stats.as_ref()
    }

    /// Record the outcome of one applied event. Only mutations mark the
    /// aggregates stale, and only for viewers who can see them at all.
    pub fn note_applied(&mut self, applied: &Applied, scope: &ViewerScope) {
        if scope.is_privileged && applied.mutated() {
            self.dirty = true;
        }
    }

    /// Force a refresh on the next poll, regardless of event traffic.
    pub fn request_refresh(&mut self) {
        self.dirty = true;
    }

    /// Whether the caller should fetch fresh aggregates now. Always false for
    /// viewers without access, whatever the dirty flag says.
    pub fn needs_refresh(&self, scope: &ViewerScope) -> bool {
        scope.is_privileged && (self.dirty || self.stats.is_none())
    }

    pub fn apply(&mut self, stats: TicketStatsResponse) {
        self.stats = Some(stats);
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_core::{EntityIdType, UserId};

    fn stats() -> TicketStatsResponse {
        TicketStatsResponse {
            open: 12,
            in_progress: 4,
            resolved_today: 7,
            unassigned: 3,
            total: 181,
        }
    }

    #[test]
    fn initial_state_needs_fetch_for_privileged_only() {
        let refresher = StatsRefresher::new();
        assert!(refresher.needs_refresh(&ViewerScope::privileged(UserId::now_v7())));
        assert!(!refresher.needs_refresh(&ViewerScope::agent(UserId::now_v7())));
    }

    #[test]
    fn mutation_marks_dirty_and_apply_clears() {
        let scope = ViewerScope::privileged(UserId::now_v7());
        let mut refresher = StatsRefresher::new();
        refresher.apply(stats());
        assert!(!refresher.needs_refresh(&scope));
        refresher.note_applied(&Applied::Inserted, &scope);
        assert!(refresher.needs_refresh(&scope));
        refresher.apply(stats());
        assert!(!refresher.needs_refresh(&scope));
    }

    #[test]
    fn skipped_events_do_not_dirty() {
        let scope = ViewerScope::privileged(UserId::now_v7());
        let mut refresher = StatsRefresher::new();
        refresher.apply(stats());
        refresher.note_applied(&Applied::Skipped, &scope);
        assert!(!refresher.needs_refresh(&scope));
        refresher.note_applied(&Applied::CountOnly, &scope);
        assert!(refresher.needs_refresh(&scope));
    }

    #[test]
    fn unprivileged_never_refreshes() {
        let scope = ViewerScope::agent(UserId::now_v7());
        let mut refresher = StatsRefresher::new();
        refresher.note_applied(&Applied::Inserted, &scope);
        refresher.request_refresh();
        assert!(!refresher.needs_refresh(&scope));
    }
}
