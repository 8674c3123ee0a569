//! Console session: the single apply loop the UI drives.
//!
//! All state mutation funnels through [`ConsoleSession::handle_event`] and
//! the async command methods, so the views only ever change on one task.
//! Subscription frames and fetch results carry the generation they were
//! issued under; anything stale is dropped here before it can touch state.

use crate::api_client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::events::ClientEvent;
use crate::notifications::{Notification, NotificationLevel};
use crate::realtime::spawn_ws_manager;
use crate::sync::{
    apply, Applied, ChangeEvent, DetailController, MessageSource, PageState, StatsRefresher,
    SubscriptionManager, SyncEntity,
};
use opsdesk_api::events::{Topic, WsEvent};
use opsdesk_api::types::{ListLogsRequest, ListTicketsRequest, PostMessageRequest};
use opsdesk_core::{
    EntityFilter, EntityIdType, LogEntry, LogFilter, PagedFilter, Ticket, TicketFilter, TicketId,
    ViewerScope,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// One synchronized list view: page state, live filter snapshot, its
/// subscription, and a staleness guard for in-flight page fetches.
#[derive(Debug)]
pub struct ListView<E, F> {
    page: PageState<E>,
    filter: F,
    subscription: SubscriptionManager,
    fetch_generation: u64,
    loading: bool,
    error: Option<String>,
}

impl<E, F> ListView<E, F>
where
    E: SyncEntity,
    F: EntityFilter<E> + PagedFilter,
{
    fn new(page_size: usize, filter: F) -> Self {
        Self {
            page: PageState::new(page_size),
            filter,
            subscription: SubscriptionManager::new(),
            fetch_generation: 0,
            loading: false,
            error: None,
        }
    }

    pub fn page(&self) -> &PageState<E> {
        &self.page
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn subscription(&self) -> &SubscriptionManager {
        &self.subscription
    }

    /// Whether pushed events are currently flowing into this view.
    pub fn is_live(&self) -> bool {
        self.subscription.is_live()
    }

    /// Mutate the filter, then bring current rows in line with the new
    /// snapshot immediately: page resets to 1 and rows that no longer match
    /// are pruned before any refetch or new event lands.
    fn update_filter(&mut self, mutate: impl FnOnce(&mut F)) {
        mutate(&mut self.filter);
        self.filter.set_page(1);
        self.page.set_current_page(1);
        let pruned = self.page.retain_matching(&self.filter);
        if pruned > 0 {
            debug!(pruned, "filter change pruned stale rows");
        }
    }

    fn set_requested_page(&mut self, page: u64) {
        self.filter.set_page(page);
        self.page.set_current_page(self.filter.page());
    }

    /// Issue a new fetch generation; any earlier in-flight page is now stale.
    fn begin_fetch(&mut self) -> u64 {
        self.fetch_generation += 1;
        self.loading = true;
        self.error = None;
        self.fetch_generation
    }

    /// Install a fetched page unless a newer fetch superseded it.
    fn apply_page(
        &mut self,
        generation: u64,
        items: Vec<E>,
        total_count: u64,
        total_pages: u64,
    ) -> bool {
        if generation != self.fetch_generation {
            debug!(
                fetched = generation,
                current = self.fetch_generation,
                "discarding stale page fetch"
            );
            return false;
        }
        self.loading = false;
        self.page
            .load_page(items, total_count, total_pages, self.filter.page());
        true
    }

    fn fetch_failed(&mut self, generation: u64, message: String) {
        if generation != self.fetch_generation {
            return;
        }
        self.loading = false;
        self.error = Some(message);
    }

    fn apply_event(&mut self, scope: &ViewerScope, event: ChangeEvent<E>) -> Applied {
        apply(&mut self.page, &self.filter, scope, event)
    }
}

/// Top-level state for one console viewer.
pub struct ConsoleSession {
    api: ApiClient,
    scope: ViewerScope,
    page_size: usize,
    events_tx: mpsc::Sender<ClientEvent>,
    tickets: ListView<Ticket, TicketFilter>,
    logs: ListView<LogEntry, LogFilter>,
    detail: DetailController,
    detail_subscription: SubscriptionManager,
    stats: StatsRefresher,
    notifications: Vec<Notification>,
}

impl ConsoleSession {
    /// Build the session and the event channel its subscriptions feed. The
    /// caller owns the receiver and pumps it into [`Self::handle_event`].
    pub fn new(
        config: &ClientConfig,
        scope: ViewerScope,
    ) -> Result<(Self, mpsc::Receiver<ClientEvent>), ClientError> {
        let api = ApiClient::new(config)?;
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let session = Self {
            api,
            scope,
            page_size: config.page_size,
            events_tx,
            tickets: ListView::new(config.page_size, TicketFilter::default()),
            logs: ListView::new(config.page_size, LogFilter::default()),
            detail: DetailController::new(),
            detail_subscription: SubscriptionManager::new(),
            stats: StatsRefresher::new(),
            notifications: Vec::new(),
        };
        Ok((session, events_rx))
    }

    pub fn scope(&self) -> &ViewerScope {
        &self.scope
    }

    pub fn tickets(&self) -> &ListView<Ticket, TicketFilter> {
        &self.tickets
    }

    pub fn logs(&self) -> &ListView<LogEntry, LogFilter> {
        &self.logs
    }

    pub fn detail(&self) -> &DetailController {
        &self.detail
    }

    pub fn stats(&self) -> &StatsRefresher {
        &self.stats
    }

    /// Drain pending notifications for display.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    // ------------------------------------------------------------------
    // Commands (UI-initiated)
    // ------------------------------------------------------------------

    /// Subscribe the ticket list and load its first page.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        let ws = self.api.ws().clone();
        let tx = self.events_tx.clone();
        self.tickets
            .subscription
            .ensure_subscribed(Topic::Tickets, |generation| {
                Box::new(spawn_ws_manager(ws, Topic::Tickets, generation, tx))
            });
        self.refresh_tickets().await
    }

    /// Subscribe the error-log feed and load its first page. Privileged only;
    /// for other viewers this is a no-op with a warning notification.
    pub async fn start_logs(&mut self) -> Result<(), ClientError> {
        if !self.scope.can_see_logs() {
            warn!("log feed requested by unprivileged viewer");
            self.notify(NotificationLevel::Warning, "Error logs require admin access");
            return Ok(());
        }
        let ws = self.api.ws().clone();
        let tx = self.events_tx.clone();
        self.logs
            .subscription
            .ensure_subscribed(Topic::Logs, |generation| {
                Box::new(spawn_ws_manager(ws, Topic::Logs, generation, tx))
            });
        self.refresh_logs().await
    }

    pub async fn refresh_tickets(&mut self) -> Result<(), ClientError> {
        let generation = self.tickets.begin_fetch();
        let request = ListTicketsRequest::from_filter(&self.tickets.filter, self.page_size);
        match self.api.rest().list_tickets(&request).await {
            Ok(page) => {
                self.tickets
                    .apply_page(generation, page.tickets, page.total_count, page.total_pages);
                Ok(())
            }
            Err(err) => {
                self.tickets.fetch_failed(generation, err.to_string());
                self.notify(NotificationLevel::Error, format!("Ticket fetch failed: {err}"));
                Err(err.into())
            }
        }
    }

    pub async fn refresh_logs(&mut self) -> Result<(), ClientError> {
        let generation = self.logs.begin_fetch();
        let request = ListLogsRequest::from_filter(&self.logs.filter, self.page_size);
        match self.api.rest().list_logs(&request).await {
            Ok(page) => {
                self.logs
                    .apply_page(generation, page.entries, page.total_count, page.total_pages);
                Ok(())
            }
            Err(err) => {
                self.logs.fetch_failed(generation, err.to_string());
                self.notify(NotificationLevel::Error, format!("Log fetch failed: {err}"));
                Err(err.into())
            }
        }
    }

    /// Change ticket filter dimensions. Rows failing the new filter are
    /// pruned immediately, then the page is refetched; the subscription stays
    /// up throughout.
    pub async fn set_ticket_filter(
        &mut self,
        mutate: impl FnOnce(&mut TicketFilter),
    ) -> Result<(), ClientError> {
        self.tickets.update_filter(mutate);
        self.refresh_tickets().await
    }

    pub async fn set_log_filter(
        &mut self,
        mutate: impl FnOnce(&mut LogFilter),
    ) -> Result<(), ClientError> {
        self.logs.update_filter(mutate);
        self.refresh_logs().await
    }

    pub async fn set_ticket_page(&mut self, page: u64) -> Result<(), ClientError> {
        self.tickets.set_requested_page(page);
        self.refresh_tickets().await
    }

    pub async fn set_log_page(&mut self, page: u64) -> Result<(), ClientError> {
        self.logs.set_requested_page(page);
        self.refresh_logs().await
    }

    /// Open the detail pane for one ticket: tear down any previous detail
    /// subscription, subscribe the ticket-scoped topic, and load the thread.
    pub async fn open_detail(&mut self, ticket_id: TicketId) -> Result<(), ClientError> {
        let generation = self.detail.open(ticket_id);
        let ws = self.api.ws().clone();
        let tx = self.events_tx.clone();
        let topic = Topic::TicketDetail(ticket_id);
        self.detail_subscription
            .ensure_subscribed(topic, |sub_generation| {
                Box::new(spawn_ws_manager(ws, topic, sub_generation, tx))
            });
        match self.api.rest().get_ticket_detail(ticket_id).await {
            Ok(response) => {
                self.detail.apply_fetch(generation, response);
                Ok(())
            }
            Err(err) => {
                self.notify(
                    NotificationLevel::Error,
                    format!("Could not load ticket: {err}"),
                );
                Err(err.into())
            }
        }
    }

    pub fn close_detail(&mut self) {
        self.detail.close();
        self.detail_subscription.teardown();
    }

    /// Post a message to the open ticket. The response echo is merged
    /// immediately; the pushed copy of the same message replaces it later.
    pub async fn post_message(&mut self, body: String, internal: bool) -> Result<(), ClientError> {
        let Some(ticket_id) = self.detail.selected() else {
            warn!("post_message with no ticket open");
            return Ok(());
        };
        let request = PostMessageRequest { body, internal };
        match self.api.rest().post_message(ticket_id, &request).await {
            Ok(message) => {
                self.detail.merge_message(message, MessageSource::RestEcho);
                self.notify(NotificationLevel::Success, "Message sent");
                Ok(())
            }
            Err(err) => {
                self.notify(NotificationLevel::Error, format!("Message not sent: {err}"));
                Err(err.into())
            }
        }
    }

    /// Mark the aggregates stale regardless of event traffic, so the next
    /// [`Self::refresh_stats_if_needed`] poll refetches them.
    pub fn request_stats_refresh(&mut self) {
        self.stats.request_refresh();
    }

    /// Fetch fresh aggregates when the refresher says they are stale. The
    /// driver loop calls this after handling a batch of events.
    pub async fn refresh_stats_if_needed(&mut self) -> Result<(), ClientError> {
        if !self.stats.needs_refresh(&self.scope) {
            return Ok(());
        }
        match self.api.rest().ticket_stats().await {
            Ok(stats) => {
                self.stats.apply(stats);
                Ok(())
            }
            Err(err) => {
                self.notify(NotificationLevel::Error, format!("Stats fetch failed: {err}"));
                Err(err.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // Apply loop
    // ------------------------------------------------------------------

    /// Merge one event into session state. Pure state mutation; any follow-up
    /// fetches (stats, page reloads) are issued by the driver loop.
    pub fn handle_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::ApiError(message) => {
                self.notify(NotificationLevel::Error, message);
            }
            ClientEvent::Ws {
                topic,
                generation,
                event,
            } => match topic {
                Topic::Tickets => self.handle_ticket_frame(generation, *event),
                Topic::TicketDetail(_) => self.handle_detail_frame(generation, *event),
                Topic::Logs => self.handle_log_frame(generation, *event),
            },
        }
    }

    fn handle_ticket_frame(&mut self, generation: u64, event: WsEvent) {
        if !self.tickets.subscription.is_current(generation) {
            debug!(generation, kind = event.event_type(), "stale ticket frame dropped");
            return;
        }
        match event {
            WsEvent::Connected {} => {
                self.tickets.subscription.mark_connected(generation);
                info!("ticket subscription live");
            }
            WsEvent::Disconnected { reason } => {
                self.tickets.subscription.mark_disconnected(generation);
                self.notify(
                    NotificationLevel::Warning,
                    format!("Ticket stream disconnected: {reason}"),
                );
            }
            WsEvent::Error { message } => {
                self.tickets.subscription.mark_errored(generation);
                self.notify(NotificationLevel::Error, message);
            }
            WsEvent::TicketCreated { ticket } => {
                let applied = self
                    .tickets
                    .apply_event(&self.scope, ChangeEvent::Inserted(ticket));
                self.stats.note_applied(&applied, &self.scope);
            }
            WsEvent::TicketUpdated { ticket } => {
                self.detail.apply_ticket_update(&ticket);
                let applied = self
                    .tickets
                    .apply_event(&self.scope, ChangeEvent::Updated(ticket));
                self.stats.note_applied(&applied, &self.scope);
            }
            WsEvent::TicketDeleted { id } => {
                let applied = self
                    .tickets
                    .apply_event(&self.scope, ChangeEvent::Deleted(id.as_uuid()));
                self.stats.note_applied(&applied, &self.scope);
                if self.detail.handle_deleted(id) {
                    self.detail_subscription.teardown();
                    self.notify(
                        NotificationLevel::Warning,
                        "The ticket you were viewing was deleted",
                    );
                }
            }
            other => {
                debug!(kind = other.event_type(), "event ignored on ticket topic");
            }
        }
    }

    fn handle_detail_frame(&mut self, generation: u64, event: WsEvent) {
        if !self.detail_subscription.is_current(generation) {
            debug!(generation, kind = event.event_type(), "stale detail frame dropped");
            return;
        }
        match event {
            WsEvent::Connected {} => {
                self.detail_subscription.mark_connected(generation);
            }
            WsEvent::Disconnected { reason } => {
                self.detail_subscription.mark_disconnected(generation);
                debug!(%reason, "detail stream disconnected");
            }
            WsEvent::Error { message } => {
                self.detail_subscription.mark_errored(generation);
                self.notify(NotificationLevel::Error, message);
            }
            WsEvent::MessagePosted { message } => {
                self.detail.merge_message(message, MessageSource::Push);
            }
            WsEvent::AttachmentAdded { attachment } => {
                self.detail.add_attachment(attachment);
            }
            WsEvent::TicketUpdated { ticket } => {
                self.detail.apply_ticket_update(&ticket);
            }
            WsEvent::TicketDeleted { id } => {
                if self.detail.handle_deleted(id) {
                    self.detail_subscription.teardown();
                    self.notify(
                        NotificationLevel::Warning,
                        "The ticket you were viewing was deleted",
                    );
                }
            }
            other => {
                debug!(kind = other.event_type(), "event ignored on detail topic");
            }
        }
    }

    fn handle_log_frame(&mut self, generation: u64, event: WsEvent) {
        if !self.logs.subscription.is_current(generation) {
            debug!(generation, kind = event.event_type(), "stale log frame dropped");
            return;
        }
        match event {
            WsEvent::Connected {} => {
                self.logs.subscription.mark_connected(generation);
                info!("log subscription live");
            }
            WsEvent::Disconnected { reason } => {
                self.logs.subscription.mark_disconnected(generation);
                self.notify(
                    NotificationLevel::Warning,
                    format!("Log stream disconnected: {reason}"),
                );
            }
            WsEvent::Error { message } => {
                self.logs.subscription.mark_errored(generation);
                self.notify(NotificationLevel::Error, message);
            }
            WsEvent::LogRecorded { entry } => {
                self.logs
                    .apply_event(&self.scope, ChangeEvent::Inserted(entry));
            }
            WsEvent::LogPruned { id } => {
                self.logs
                    .apply_event(&self.scope, ChangeEvent::Deleted(id.as_uuid()));
            }
            other => {
                debug!(kind = other.event_type(), "event ignored on log topic");
            }
        }
    }

    fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
    }
}
