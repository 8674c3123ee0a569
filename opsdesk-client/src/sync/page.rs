//! Paginated collection state for one list view.
//!
//! Invariants, maintained by every mutator:
//! - `items` holds at most `page_size` entities, unique by id
//! - `total_count` never underflows; `total_pages` never drops below 1
//! - `total_pages == ceil(total_count / page_size)` after every recompute

use crate::sync::entity::SyncEntity;
use opsdesk_core::EntityFilter;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PageState<E> {
    items: Vec<E>,
    total_count: u64,
    total_pages: u64,
    page_size: usize,
    current_page: u64,
}

impl<E: SyncEntity> PageState<E> {
    pub fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            total_pages: 1,
            page_size: page_size.max(1),
            current_page: 1,
        }
    }

    /// Replace the whole state from a REST page response. Duplicate ids in
    /// the payload are dropped (first occurrence wins) and the row list is
    /// capped at `page_size`.
    pub fn load_page(&mut self, items: Vec<E>, total_count: u64, total_pages: u64, page: u64) {
        let mut deduped: Vec<E> = Vec::with_capacity(items.len().min(self.page_size));
        for item in items {
            if deduped.len() == self.page_size {
                break;
            }
            if !deduped.iter().any(|existing| existing.id() == item.id()) {
                deduped.push(item);
            }
        }
        self.items = deduped;
        self.total_count = total_count;
        self.total_pages = total_pages.max(1);
        self.current_page = page.max(1);
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn get(&self, id: Uuid) -> Option<&E> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Insert at the head and evict the tail element if over capacity.
    /// Returns false (untouched) if the id is already present.
    pub(crate) fn prepend_capped(&mut self, entity: E) -> bool {
        if self.contains(entity.id()) {
            return false;
        }
        self.items.insert(0, entity);
        self.items.truncate(self.page_size);
        true
    }

    /// Replace in place, keeping the item's position stable.
    pub(crate) fn replace(&mut self, entity: E) -> bool {
        match self.position(entity.id()) {
            Some(index) => {
                self.items[index] = entity;
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, id: Uuid) -> bool {
        match self.position(id) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn increment_count(&mut self) {
        self.total_count += 1;
        self.recompute_total_pages();
    }

    pub(crate) fn decrement_count(&mut self) {
        self.total_count = self.total_count.saturating_sub(1);
        self.recompute_total_pages();
    }

    pub(crate) fn set_current_page(&mut self, page: u64) {
        self.current_page = page.max(1);
    }

    /// Drop every item the filter no longer admits, adjusting the counters
    /// per removal. Used when the filter snapshot changes so membership is
    /// reflected before any new event arrives.
    pub(crate) fn retain_matching<F: EntityFilter<E>>(&mut self, filter: &F) -> usize {
        let before = self.items.len();
        self.items.retain(|item| filter.matches(item));
        let removed = before - self.items.len();
        for _ in 0..removed {
            self.decrement_count();
        }
        removed
    }

    fn recompute_total_pages(&mut self) {
        let size = self.page_size as u64;
        self.total_pages = (self.total_count.div_ceil(size)).max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdesk_core::{EntityIdType, Ticket, TicketFilter, TicketStatus};
    use opsdesk_test_utils::fixtures;

    fn state_with(items: Vec<Ticket>, page_size: usize) -> PageState<Ticket> {
        let mut state = PageState::new(page_size);
        let count = items.len() as u64;
        state.load_page(items, count, 1, 1);
        state
    }

    #[test]
    fn load_page_dedups_and_caps() {
        let ticket = fixtures::ticket();
        let mut state = PageState::new(2);
        state.load_page(
            vec![ticket.clone(), ticket.clone(), fixtures::ticket(), fixtures::ticket()],
            4,
            2,
            1,
        );
        assert_eq!(state.len(), 2);
        assert_eq!(state.items()[0], ticket);
    }

    #[test]
    fn prepend_evicts_tail_at_capacity() {
        let batch = fixtures::ticket_batch(3);
        let evicted = batch[2].clone();
        let mut state = state_with(batch, 3);
        let fresh = fixtures::ticket();
        assert!(state.prepend_capped(fresh.clone()));
        assert_eq!(state.len(), 3);
        assert_eq!(state.items()[0], fresh);
        assert!(!state.contains(evicted.ticket_id.as_uuid()));
    }

    #[test]
    fn prepend_rejects_duplicate_id() {
        let ticket = fixtures::ticket();
        let mut state = state_with(vec![ticket.clone()], 5);
        assert!(!state.prepend_capped(ticket.clone()));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn replace_keeps_position() {
        let batch = fixtures::ticket_batch(3);
        let mut updated = batch[1].clone();
        updated.subject = "renamed".to_string();
        let mut state = state_with(batch, 5);
        assert!(state.replace(updated.clone()));
        assert_eq!(state.items()[1], updated);
    }

    #[test]
    fn decrement_floors_at_zero_and_one_page() {
        let mut state: PageState<Ticket> = PageState::new(10);
        state.decrement_count();
        assert_eq!(state.total_count(), 0);
        assert_eq!(state.total_pages(), 1);
    }

    #[test]
    fn page_math_is_ceiling() {
        let mut state: PageState<Ticket> = PageState::new(10);
        for _ in 0..11 {
            state.increment_count();
        }
        assert_eq!(state.total_pages(), 2);
    }

    #[test]
    fn retain_matching_prunes_and_adjusts_counts() {
        let mut open = fixtures::ticket_with_status(TicketStatus::Open);
        open.subject = "keep me".to_string();
        let closed = fixtures::ticket_with_status(TicketStatus::Closed);
        let mut state = state_with(vec![open.clone(), closed], 5);
        let mut filter = TicketFilter::default();
        filter.set_status(Some(TicketStatus::Open));
        let removed = state.retain_matching(&filter);
        assert_eq!(removed, 1);
        assert_eq!(state.len(), 1);
        assert_eq!(state.total_count(), 1);
        assert_eq!(state.items()[0], open);
    }
}
