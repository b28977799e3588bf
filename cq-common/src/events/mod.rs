//! Event types for the swipe event system
//!
//! Provides the shared event definitions and the EventBus that session
//! observers (terminal renderer, UI bindings, tests) subscribe to.

mod session_types;

pub use session_types::{Direction, MatchMode, SessionState};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Swipe session events
///
/// Emitted by the session controller; observers render from these and from
/// state snapshots, they never mutate session state themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SwipeEvent {
    /// Session moved between lifecycle states
    SessionStateChanged {
        old_state: SessionState,
        new_state: SessionState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Candidate list could not be fetched; session is now Errored
    ///
    /// Triggers:
    /// - UI: show retry affordance
    FetchFailed {
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A new candidate is at the head of the queue
    CandidateShown {
        /// Queue position (cursor) of the candidate
        position: usize,
        /// Normalized identity (empty for placeholder identities)
        identity: String,
        /// Key the renderer should use for this card
        render_key: String,
        /// Name to display on the card
        display_name: String,
        /// Candidates left including this one
        remaining: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A decision was recorded locally and its commit is in flight
    DecisionCommitted {
        position: usize,
        identity: String,
        direction: Direction,
        /// Horizontal offset the decided card animates out to
        exit_offset: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Backend acknowledged a decision
    DecisionConfirmed {
        position: usize,
        identity: String,
        is_match: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Backend reported a mutual match for an earlier decision
    ///
    /// Always refers to the candidate the decision was made on, not the
    /// candidate currently on screen.
    MatchFound {
        identity: String,
        display_name: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A decision failed to persist; the queue keeps moving
    CommitFailed {
        position: usize,
        identity: String,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A candidate arrived without a usable identity
    DataIntegrityWarning {
        position: usize,
        render_key: String,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Text to speak (only emitted when text-to-speech is enabled)
    Announcement {
        text: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SwipeEvent {
    /// Get event type as string (for logging and SSE event names)
    pub fn event_type(&self) -> &str {
        match self {
            SwipeEvent::SessionStateChanged { .. } => "SessionStateChanged",
            SwipeEvent::FetchFailed { .. } => "FetchFailed",
            SwipeEvent::CandidateShown { .. } => "CandidateShown",
            SwipeEvent::DecisionCommitted { .. } => "DecisionCommitted",
            SwipeEvent::DecisionConfirmed { .. } => "DecisionConfirmed",
            SwipeEvent::MatchFound { .. } => "MatchFound",
            SwipeEvent::CommitFailed { .. } => "CommitFailed",
            SwipeEvent::DataIntegrityWarning { .. } => "DataIntegrityWarning",
            SwipeEvent::Announcement { .. } => "Announcement",
        }
    }
}

/// Event distribution bus for one-to-many broadcasting
///
/// Thin wrapper over `tokio::sync::broadcast`. Slow subscribers lag and lose
/// the oldest events; the session itself never waits on observers.
pub struct EventBus {
    tx: broadcast::Sender<SwipeEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    ///
    /// # Examples
    ///
    /// ```
    /// use cq_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SwipeEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: SwipeEvent,
    ) -> Result<usize, broadcast::error::SendError<SwipeEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SwipeEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
