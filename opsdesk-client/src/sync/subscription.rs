//! Subscription lifecycle: at most one live stream per topic.
//!
//! The manager owns teardown-before-recreate ordering and hands out a
//! monotonically increasing generation with every (re)subscription. Frames
//! and fetch results are tagged with the generation they were issued under;
//! anything carrying a stale generation is dropped at the apply loop.

use opsdesk_api::events::Topic;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Where a subscription is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionPhase {
    Unsubscribed,
    Subscribing,
    Subscribed,
    /// Transport dropped; the stream task is reconnecting on its own.
    Errored,
    /// Torn down deliberately. Terminal until a new subscription replaces it.
    Closed,
}

impl SubscriptionPhase {
    /// Whether events are flowing. This is the UI "live" flag; it only turns
    /// true once a `Connected` frame arrives, not while still handshaking.
    pub fn is_live(&self) -> bool {
        matches!(self, SubscriptionPhase::Subscribed)
    }

    /// Whether a stream task still owns this slot (handshaking counts).
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionPhase::Subscribing | SubscriptionPhase::Subscribed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SubscriptionPhase::Closed)
    }
}

/// Abortable background stream. Abstracted so the manager can be exercised
/// without a runtime.
pub trait StreamTask {
    fn abort(&self);
}

impl<T> StreamTask for JoinHandle<T> {
    fn abort(&self) {
        JoinHandle::abort(self);
    }
}

/// One owned subscription: its topic, the generation it was issued under,
/// and the background task feeding frames into the event channel.
pub struct SubscriptionHandle {
    topic: Topic,
    generation: u64,
    phase: SubscriptionPhase,
    task: Option<Box<dyn StreamTask + Send>>,
}

impl SubscriptionHandle {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> SubscriptionPhase {
        self.phase
    }

    /// Abort the stream task and mark the handle closed. Idempotent.
    fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.phase = SubscriptionPhase::Closed;
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("topic", &self.topic)
            .field("generation", &self.generation)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

/// Enforces "at most one live subscription" for a slot (the list view, or
/// the currently open detail pane).
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    current: Option<SubscriptionHandle>,
    next_generation: u64,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `topic`, tearing down any existing subscription first.
    /// If the current subscription is already live on the same topic this is
    /// a no-op and the existing generation is returned. `spawn` receives the
    /// new generation and must start the stream task for it.
    pub fn ensure_subscribed<S>(&mut self, topic: Topic, spawn: S) -> u64
    where
        S: FnOnce(u64) -> Box<dyn StreamTask + Send>,
    {
        if let Some(current) = &self.current {
            if current.topic == topic && current.phase.is_active() {
                debug!(%topic, generation = current.generation, "subscription already active");
                return current.generation;
            }
        }
        self.teardown();
        self.next_generation += 1;
        let generation = self.next_generation;
        info!(%topic, generation, "subscribing");
        let task = spawn(generation);
        self.current = Some(SubscriptionHandle {
            topic,
            generation,
            phase: SubscriptionPhase::Subscribing,
            task: Some(task),
        });
        generation
    }

    /// Abort and discard the current subscription, if any. Idempotent.
    pub fn teardown(&mut self) {
        if let Some(mut handle) = self.current.take() {
            info!(topic = %handle.topic, generation = handle.generation, "tearing down subscription");
            handle.close();
        }
    }

    /// Whether `generation` identifies the current subscription. Frames and
    /// fetches tagged with any other generation are stale.
    pub fn is_current(&self, generation: u64) -> bool {
        self.current
            .as_ref()
            .is_some_and(|handle| handle.generation == generation)
    }

    /// Whether the current subscription has reported `Connected` and events
    /// are flowing.
    pub fn is_live(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|handle| handle.phase.is_live())
    }

    pub fn phase(&self) -> SubscriptionPhase {
        self.current
            .as_ref()
            .map(|handle| handle.phase)
            .unwrap_or(SubscriptionPhase::Unsubscribed)
    }

    pub fn mark_connected(&mut self, generation: u64) {
        if let Some(handle) = self.handle_for(generation) {
            handle.phase = SubscriptionPhase::Subscribed;
        }
    }

    /// Transport dropped. Not terminal: the stream task keeps reconnecting
    /// and will report Connected again.
    pub fn mark_disconnected(&mut self, generation: u64) {
        if let Some(handle) = self.handle_for(generation) {
            handle.phase = SubscriptionPhase::Errored;
        }
    }

    pub fn mark_errored(&mut self, generation: u64) {
        if let Some(handle) = self.handle_for(generation) {
            handle.phase = SubscriptionPhase::Errored;
        }
    }

    fn handle_for(&mut self, generation: u64) -> Option<&mut SubscriptionHandle> {
        self.current
            .as_mut()
            .filter(|handle| handle.generation == generation)
    }
}
