//! Detail pane state: one open ticket thread, kept current against both the
//! detail fetch and the ticket-scoped push topic.
//!
//! Messages are append-only and deduped by id. A locally posted message comes
//! back twice: once as the REST response echo and once as a pushed event; the
//! second arrival is a replace, so the server-pushed copy always wins.

use opsdesk_api::types::TicketDetailResponse;
use opsdesk_core::{Attachment, EntityIdType, Ticket, TicketId, TicketMessage};
use tracing::{debug, warn};

/// Where a message arrived from, for echo deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    /// Echo in the POST response for a message this client just sent.
    RestEcho,
    /// Pushed over the ticket-scoped topic.
    Push,
}

/// Loaded thread for the open ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailState {
    pub ticket: Ticket,
    pub messages: Vec<TicketMessage>,
    pub attachments: Vec<Attachment>,
}

/// Owns the detail pane selection and its staleness guard.
///
/// Every open (and close) bumps the generation; a detail fetch resolves with
/// the generation it was issued under and is discarded if the pane has moved
/// on since.
#[derive(Debug, Default)]
pub struct DetailController {
    selected: Option<TicketId>,
    state: Option<DetailState>,
    generation: u64,
}

impl DetailController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<TicketId> {
        self.selected
    }

    pub fn state(&self) -> Option<&DetailState> {
        self.state.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    /// Select a ticket for the detail pane. Clears any previous state and
    /// returns the generation the caller must tag the fetch with.
    pub fn open(&mut self, id: TicketId) -> u64 {
        self.selected = Some(id);
        self.state = None;
        self.generation += 1;
        self.generation
    }

    pub fn close(&mut self) {
        self.selected = None;
        self.state = None;
        self.generation += 1;
    }

    /// Install a resolved detail fetch. Returns false (and discards) when the
    /// pane was closed or re-targeted while the fetch was in flight.
    pub fn apply_fetch(&mut self, generation: u64, response: TicketDetailResponse) -> bool {
        if generation != self.generation {
            debug!(
                fetched = generation,
                current = self.generation,
                "discarding stale detail fetch"
            );
            return false;
        }
        if self.selected != Some(response.ticket.ticket_id) {
            warn!(ticket_id = %response.ticket.ticket_id.as_uuid(), "detail fetch for a ticket that is not selected");
            return false;
        }
        self.state = Some(DetailState {
            ticket: response.ticket,
            messages: response.messages,
            attachments: response.attachments,
        });
        true
    }

    /// Merge one message into the open thread. Returns true when the thread
    /// changed.
    ///
    /// Pushed copies replace any existing message with the same id; REST
    /// echoes only fill a gap, so a push that raced ahead of the POST
    /// response is never clobbered by the older echo.
    pub fn merge_message(&mut self, message: TicketMessage, source: MessageSource) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if state.ticket.ticket_id != message.ticket_id {
            debug!(ticket_id = %message.ticket_id.as_uuid(), "message for a different ticket ignored");
            return false;
        }
        let existing = state
            .messages
            .iter()
            .position(|m| m.message_id == message.message_id);
        match (existing, source) {
            (Some(index), MessageSource::Push) => {
                state.messages[index] = message;
                true
            }
            (Some(_), MessageSource::RestEcho) => false,
            (None, _) => {
                state.messages.push(message);
                state.ticket.message_count = state.ticket.message_count.saturating_add(1);
                true
            }
        }
    }

    /// Refresh the ticket header from a list-topic update, keeping the loaded
    /// thread.
    pub fn apply_ticket_update(&mut self, ticket: &Ticket) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if state.ticket.ticket_id != ticket.ticket_id {
            return false;
        }
        state.ticket = ticket.clone();
        true
    }

    /// Add an attachment, deduped by id.
    pub fn add_attachment(&mut self, attachment: Attachment) -> bool {
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if state.ticket.ticket_id != attachment.ticket_id {
            return false;
        }
        if state
            .attachments
            .iter()
            .any(|a| a.attachment_id == attachment.attachment_id)
        {
            return false;
        }
        state.attachments.push(attachment);
        true
    }

    /// Close the pane if the deleted ticket is the one on display. Returns
    /// true when the pane was closed.
    pub fn handle_deleted(&mut self, id: TicketId) -> bool {
        if self.selected == Some(id) {
            debug!(ticket_id = %id.as_uuid(), "displayed ticket deleted, closing detail pane");
            self.close();
            true
        } else {
            false
        }
    }
}
