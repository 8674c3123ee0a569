//! Reconciliation: merging one change event into paginated state.
//!
//! Every path returns a valid state; malformed or out-of-scope events are
//! dropped and logged, never propagated as errors. The filter snapshot passed
//! in is whatever is current at processing time, so late events are judged
//! against the live filter rather than the one active at subscribe time.

use crate::sync::entity::SyncEntity;
use crate::sync::page::PageState;
use crate::sync::ChangeEvent;
use opsdesk_core::{EntityFilter, ViewerScope};
use tracing::{debug, warn};

/// Outcome of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Entity added to the visible rows.
    Inserted,
    /// Entity replaced in place.
    Updated,
    /// Entity removed from the visible rows.
    Removed,
    /// Counters adjusted without touching the rows (event for a page other
    /// than the one displayed; inherently approximate).
    CountOnly,
    /// Event dropped: out of scope, filtered out, malformed, or a replay.
    Skipped,
}

impl Applied {
    /// Whether the state changed at all.
    pub fn mutated(&self) -> bool {
        !matches!(self, Applied::Skipped)
    }
}

/// Merge one change event into `state` under the current filter snapshot and
/// viewer scope.
pub fn apply<E, F>(
    state: &mut PageState<E>,
    filter: &F,
    scope: &ViewerScope,
    event: ChangeEvent<E>,
) -> Applied
where
    E: SyncEntity,
    F: EntityFilter<E>,
{
    debug!(kind = event.kind(), "applying change event");
    match event {
        ChangeEvent::Inserted(entity) => apply_insert(state, filter, scope, entity),
        ChangeEvent::Updated(entity) => apply_update(state, filter, scope, entity),
        ChangeEvent::Deleted(id) => apply_delete(state, id),
    }
}

fn apply_insert<E, F>(state: &mut PageState<E>, filter: &F, scope: &ViewerScope, entity: E) -> Applied
where
    E: SyncEntity,
    F: EntityFilter<E>,
{
    let id = entity.id();
    if id.is_nil() {
        warn!("dropping insert event with nil id");
        return Applied::Skipped;
    }
    if !entity.visible_to(scope) {
        debug!(%id, "insert outside viewer scope");
        return Applied::Skipped;
    }
    if !filter.matches(&entity) {
        debug!(%id, "insert does not match active filter");
        return Applied::Skipped;
    }
    // Replay guard: the count delta only applies when the row mutation does.
    if state.contains(id) {
        debug!(%id, "duplicate insert ignored");
        return Applied::Skipped;
    }
    if state.current_page() == 1 {
        state.prepend_capped(entity);
        state.increment_count();
        Applied::Inserted
    } else {
        // Off the first page we cannot know where the row lands; adjust the
        // counters only.
        state.increment_count();
        Applied::CountOnly
    }
}

fn apply_update<E, F>(state: &mut PageState<E>, filter: &F, scope: &ViewerScope, entity: E) -> Applied
where
    E: SyncEntity,
    F: EntityFilter<E>,
{
    let id = entity.id();
    if id.is_nil() {
        warn!("dropping update event with nil id");
        return Applied::Skipped;
    }
    let present = state.contains(id);
    let visible = entity.visible_to(scope) && filter.matches(&entity);
    match (present, visible) {
        (true, true) => {
            state.replace(entity);
            Applied::Updated
        }
        (true, false) => {
            // Transitioned out of the filtered view.
            state.remove(id);
            state.decrement_count();
            Applied::Removed
        }
        (false, true) if state.current_page() == 1 => {
            // Transitioned into visibility; treat as an insert.
            state.prepend_capped(entity);
            state.increment_count();
            Applied::Inserted
        }
        (false, true) => {
            // Not on the displayed page and we never counted it; whether the
            // transition changes the total is unknowable here.
            debug!(%id, "update for entity off the displayed page");
            Applied::Skipped
        }
        (false, false) => Applied::Skipped,
    }
}

fn apply_delete<E: SyncEntity>(state: &mut PageState<E>, id: uuid::Uuid) -> Applied {
    if id.is_nil() {
        warn!("dropping delete event with nil id");
        return Applied::Skipped;
    }
    // Replay guard: only decrement when a row was actually removed.
    if state.remove(id) {
        state.decrement_count();
        Applied::Removed
    } else {
        debug!(%id, "delete for absent entity ignored");
        Applied::Skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_core::{
        EntityIdType, Ticket, TicketFilter, TicketId, TicketStatus, UserId, ViewerScope,
    };
    use opsdesk_test_utils::fixtures;
    use uuid::Uuid;

    fn privileged() -> ViewerScope {
        ViewerScope::privileged(UserId::now_v7())
    }

    fn loaded(tickets: Vec<Ticket>, page_size: usize, page: u64) -> PageState<Ticket> {
        let mut state = PageState::new(page_size);
        let count = tickets.len() as u64;
        state.load_page(tickets, count, 1, page);
        state
    }

    #[test]
    fn insert_prepends_on_first_page() {
        let mut state = loaded(fixtures::ticket_batch(3), 20, 1);
        let fresh = fixtures::ticket();
        let applied = apply(
            &mut state,
            &TicketFilter::default(),
            &privileged(),
            ChangeEvent::Inserted(fresh.clone()),
        );
        assert_eq!(applied, Applied::Inserted);
        assert_eq!(state.len(), 4);
        assert_eq!(state.total_count(), 4);
        assert_eq!(state.items()[0], fresh);
    }

    #[test]
    fn duplicate_insert_is_idempotent() {
        let mut state = loaded(Vec::new(), 20, 1);
        let ticket = fixtures::ticket();
        let first = apply(
            &mut state,
            &TicketFilter::default(),
            &privileged(),
            ChangeEvent::Inserted(ticket.clone()),
        );
        let second = apply(
            &mut state,
            &TicketFilter::default(),
            &privileged(),
            ChangeEvent::Inserted(ticket),
        );
        assert_eq!(first, Applied::Inserted);
        assert_eq!(second, Applied::Skipped);
        assert_eq!(state.len(), 1);
        assert_eq!(state.total_count(), 1);
    }

    #[test]
    fn insert_at_capacity_evicts_last() {
        let batch = fixtures::ticket_batch(3);
        let evicted = batch[2].clone();
        let mut state = loaded(batch, 3, 1);
        let fresh = fixtures::ticket();
        apply(
            &mut state,
            &TicketFilter::default(),
            &privileged(),
            ChangeEvent::Inserted(fresh.clone()),
        );
        assert_eq!(state.len(), 3);
        assert_eq!(state.items()[0], fresh);
        assert!(!state.contains(evicted.ticket_id.as_uuid()));
        assert_eq!(state.total_count(), 4);
    }

    #[test]
    fn insert_off_first_page_adjusts_count_only() {
        let mut state = loaded(fixtures::ticket_batch(3), 3, 2);
        let applied = apply(
            &mut state,
            &TicketFilter::default(),
            &privileged(),
            ChangeEvent::Inserted(fixtures::ticket()),
        );
        assert_eq!(applied, Applied::CountOnly);
        assert_eq!(state.len(), 3);
        assert_eq!(state.total_count(), 4);
    }

    #[test]
    fn filtered_out_insert_is_skipped() {
        let mut state = loaded(Vec::new(), 20, 1);
        let mut filter = TicketFilter::default();
        filter.set_status(Some(TicketStatus::Resolved));
        let applied = apply(
            &mut state,
            &filter,
            &privileged(),
            ChangeEvent::Inserted(fixtures::ticket_with_status(TicketStatus::Open)),
        );
        assert_eq!(applied, Applied::Skipped);
        assert_eq!(state.total_count(), 0);
    }

    #[test]
    fn out_of_scope_insert_is_skipped() {
        let mut state = loaded(Vec::new(), 20, 1);
        let viewer = ViewerScope::agent(UserId::now_v7());
        let foreign = fixtures::ticket_owned_by(UserId::now_v7());
        let applied = apply(
            &mut state,
            &TicketFilter::default(),
            &viewer,
            ChangeEvent::Inserted(foreign),
        );
        assert_eq!(applied, Applied::Skipped);
        assert!(state.is_empty());
    }

    #[test]
    fn update_in_place_keeps_position() {
        let batch = fixtures::ticket_batch(3);
        let mut updated = batch[1].clone();
        updated.subject = "escalated".to_string();
        let mut state = loaded(batch, 20, 1);
        let applied = apply(
            &mut state,
            &TicketFilter::default(),
            &privileged(),
            ChangeEvent::Updated(updated.clone()),
        );
        assert_eq!(applied, Applied::Updated);
        assert_eq!(state.items()[1], updated);
        assert_eq!(state.total_count(), 3);
    }

    #[test]
    fn update_out_of_filter_removes_and_decrements() {
        let batch = fixtures::ticket_batch(3);
        let mut resolved = batch[0].clone();
        resolved.status = TicketStatus::Resolved;
        let mut state = loaded(batch, 20, 1);
        let mut filter = TicketFilter::default();
        filter.set_status(Some(TicketStatus::Open));
        let applied = apply(
            &mut state,
            &filter,
            &privileged(),
            ChangeEvent::Updated(resolved.clone()),
        );
        assert_eq!(applied, Applied::Removed);
        assert_eq!(state.len(), 2);
        assert_eq!(state.total_count(), 2);
        assert!(!state.contains(resolved.ticket_id.as_uuid()));
    }

    #[test]
    fn update_transitioning_into_view_inserts_on_first_page() {
        let mut state = loaded(Vec::new(), 20, 1);
        let mut filter = TicketFilter::default();
        filter.set_status(Some(TicketStatus::InProgress));
        let claimed = fixtures::ticket_with_status(TicketStatus::InProgress);
        let applied = apply(
            &mut state,
            &filter,
            &privileged(),
            ChangeEvent::Updated(claimed.clone()),
        );
        assert_eq!(applied, Applied::Inserted);
        assert_eq!(state.items()[0], claimed);
        assert_eq!(state.total_count(), 1);
    }

    #[test]
    fn delete_removes_and_decrements() {
        let batch = fixtures::ticket_batch(3);
        let victim = batch[1].clone();
        let mut state = loaded(batch, 20, 1);
        let applied = apply(
            &mut state,
            &TicketFilter::default(),
            &privileged(),
            ChangeEvent::Deleted(victim.ticket_id.as_uuid()),
        );
        assert_eq!(applied, Applied::Removed);
        assert_eq!(state.len(), 2);
        assert_eq!(state.total_count(), 2);
    }

    #[test]
    fn delete_of_absent_entity_changes_nothing() {
        let mut state = loaded(fixtures::ticket_batch(3), 20, 1);
        let applied = apply(
            &mut state,
            &TicketFilter::default(),
            &privileged(),
            ChangeEvent::Deleted(TicketId::now_v7().as_uuid()),
        );
        assert_eq!(applied, Applied::Skipped);
        assert_eq!(state.len(), 3);
        assert_eq!(state.total_count(), 3);
    }

    #[test]
    fn nil_id_events_are_dropped() {
        let mut state = loaded(fixtures::ticket_batch(1), 20, 1);
        let mut ghost = fixtures::ticket();
        ghost.ticket_id = TicketId::from_uuid(Uuid::nil());
        for event in [
            ChangeEvent::Inserted(ghost.clone()),
            ChangeEvent::Updated(ghost),
            ChangeEvent::Deleted(Uuid::nil()),
        ] {
            let applied = apply(&mut state, &TicketFilter::default(), &privileged(), event);
            assert_eq!(applied, Applied::Skipped);
        }
        assert_eq!(state.len(), 1);
    }
}
