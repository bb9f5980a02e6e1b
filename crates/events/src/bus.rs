//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`TriageEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` between the registry
//! owner, the commit orchestrator, and any number of listeners.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use cliptriage_core::{
    ChangeObserver, ClipId, CommitPhase, CommitResult, EntryStatus, RegistryChange,
};

// ---------------------------------------------------------------------------
// TriageEvent
// ---------------------------------------------------------------------------

/// Something observable happened in the triage core.
#[derive(Debug, Clone)]
pub enum TriageEvent {
    /// The clip registry applied a change.
    Registry(RegistryChange),
    /// The commit orchestrator entered a new phase.
    CommitPhase(CommitPhase),
    /// One manifest entry reached a terminal status.
    EntryResolved {
        index: usize,
        total: usize,
        clip_id: Option<ClipId>,
        status: EntryStatus,
    },
    /// A commit reached its terminal state.
    CommitFinished(CommitResult),
}

impl TriageEvent {
    /// Dot-separated event name, e.g. `"commit.entry_resolved"`.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Registry(RegistryChange::ClipsAdded(_)) => "registry.clips_added",
            Self::Registry(RegistryChange::ClipsRemoved(_)) => "registry.clips_removed",
            Self::Registry(RegistryChange::ClipUpdated(_)) => "registry.clip_updated",
            Self::Registry(RegistryChange::MetricUpdated(_)) => "registry.metric_updated",
            Self::Registry(RegistryChange::HistoryChanged { .. }) => "registry.history_changed",
            Self::CommitPhase(_) => "commit.phase",
            Self::EntryResolved { .. } => "commit.entry_resolved",
            Self::CommitFinished(_) => "commit.finished",
        }
    }
}

/// Timestamped envelope delivered to subscribers.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub event: TriageEvent,
    pub timestamp: DateTime<Utc>,
}

/// Compact JSON form for logging or forwarding to a UI process.
#[derive(Debug, Serialize)]
struct EnvelopeJson<'a> {
    event_type: &'a str,
    timestamp: DateTime<Utc>,
}

impl Envelope {
    fn new(event: TriageEvent) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
        }
    }

    /// Event name and timestamp as JSON.
    pub fn header_json(&self) -> serde_json::Value {
        serde_json::to_value(EnvelopeJson {
            event_type: self.event.event_type(),
            timestamp: self.timestamp,
        })
        .unwrap_or(serde_json::Value::Null)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published event.
///
/// # Usage
///
/// ```rust
/// use cliptriage_core::CommitPhase;
/// use cliptriage_events::bus::{EventBus, TriageEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(TriageEvent::CommitPhase(CommitPhase::Idle));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<Envelope>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: TriageEvent) {
        tracing::trace!(event_type = event.event_type(), "Publishing event");
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(Envelope::new(event));
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeObserver for EventBus {
    fn on_change(&self, change: &RegistryChange) {
        self.publish(TriageEvent::Registry(change.clone()));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
