//! Swipe session controller
//!
//! Owns the queue, the cursor (derived from the decision log), the
//! classifier and the commit pipeline for one matching session.
//!
//! **State machine:** `Initializing → Active → Exhausted`, or
//! `Initializing → Errored` when the one-time fetch fails.
//!
//! All mutation happens through `&mut self` on whatever task drives the
//! session. Background commits never touch session state directly: they send
//! a `CommitOutcome` over an mpsc channel and the driver applies it with
//! `drain_outcomes` / `next_outcome`. If the controller is dropped first,
//! late outcomes go nowhere.

use crate::candidate::Candidate;
use crate::classifier::{Classification, DecisionClassifier, IgnoreReason, Intent};
use crate::client::MatchApi;
use crate::commit::{CommitOutcome, CommitPipeline, Decision, DecisionLog, DecisionSummary};
use crate::error::{Error, FetchError, Result};
use crate::feedback::{self, DragFeedback};
use crate::provider;
use chrono::Utc;
use cq_common::config::{ClientConfig, DEFAULT_SWIPE_THRESHOLD};
use cq_common::events::{Direction, EventBus, MatchMode, SessionState, SwipeEvent};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Number of cards a renderer shows at once (head plus the one behind it)
pub const VISIBLE_STACK_DEPTH: usize = 2;

/// Per-session parameters, fixed at construction
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub mode: MatchMode,
    /// Project the person queue is ranked against (person mode only)
    pub related_context_id: Option<String>,
    pub swipe_threshold: f64,
    pub tts_enabled: bool,
}

impl SessionSettings {
    pub fn new(mode: MatchMode) -> Self {
        Self {
            mode,
            related_context_id: None,
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
            tts_enabled: false,
        }
    }

    pub fn with_related_context(mut self, related_context_id: impl Into<String>) -> Self {
        self.related_context_id = Some(related_context_id.into());
        self
    }

    /// Settings for a session built from resolved client configuration
    pub fn from_config(
        config: &ClientConfig,
        mode: MatchMode,
        related_context_id: Option<String>,
    ) -> Self {
        Self {
            mode,
            related_context_id: related_context_id.filter(|id| !id.trim().is_empty()),
            swipe_threshold: config.swipe_threshold,
            tts_enabled: config.tts_enabled,
        }
    }
}

/// One card in the visible stack
#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    pub position: usize,
    pub render_key: String,
    pub identity: String,
    pub display_name: String,
    pub match_score: f64,
    pub skills: Vec<String>,
    /// Head of the queue (the card that receives input)
    pub is_top: bool,
}

/// Read-only view of a session for observers
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub mode: MatchMode,
    pub state: SessionState,
    pub cursor: usize,
    pub total: usize,
    pub visible: Vec<CardView>,
    pub feedback: DragFeedback,
    pub summary: DecisionSummary,
    pub last_error: Option<String>,
}

/// Controller for one swipe session
pub struct SessionController {
    session_id: Uuid,
    settings: SessionSettings,
    api: Arc<dyn MatchApi>,
    events: Arc<EventBus>,
    state: SessionState,
    queue: Vec<Candidate>,
    log: DecisionLog,
    classifier: DecisionClassifier,
    pipeline: CommitPipeline,
    outcomes: mpsc::UnboundedReceiver<CommitOutcome>,
    last_fetch_error: Option<FetchError>,
}

impl SessionController {
    /// Create a session in `Initializing`; call `start` to fetch the queue
    pub fn new(api: Arc<dyn MatchApi>, settings: SessionSettings, events: Arc<EventBus>) -> Self {
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();
        let classifier = DecisionClassifier::new(settings.swipe_threshold);
        let pipeline = CommitPipeline::new(Arc::clone(&api), outcome_tx);

        Self {
            session_id: Uuid::new_v4(),
            settings,
            api,
            events,
            state: SessionState::Initializing,
            queue: Vec::new(),
            log: DecisionLog::new(),
            classifier,
            pipeline,
            outcomes,
            last_fetch_error: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Index of the current head candidate (number of decisions made)
    pub fn cursor(&self) -> usize {
        self.log.len()
    }

    pub fn queue(&self) -> &[Candidate] {
        &self.queue
    }

    pub fn decisions(&self) -> &[Decision] {
        self.log.entries()
    }

    pub fn summary(&self) -> DecisionSummary {
        self.log.summary()
    }

    pub fn last_fetch_error(&self) -> Option<&FetchError> {
        self.last_fetch_error.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SwipeEvent> {
        self.events.subscribe()
    }

    /// Candidate at the head of the queue, if the session is active
    pub fn current_candidate(&self) -> Option<&Candidate> {
        match self.state {
            SessionState::Active => self.queue.get(self.cursor()),
            _ => None,
        }
    }

    fn head_position(&self) -> Option<usize> {
        self.current_candidate().map(|_| self.cursor())
    }

    /// Fetch the candidate queue (once per session)
    ///
    /// # Returns
    /// * `Ok(state)` - `Active`, or `Exhausted` for an empty queue
    /// * `Err(Error::Fetch)` - session is now `Errored`
    /// * `Err(Error::InvalidState)` - session already started
    pub async fn start(&mut self) -> Result<SessionState> {
        if self.state != SessionState::Initializing {
            return Err(Error::InvalidState(format!(
                "Session already started (state: {})",
                self.state
            )));
        }

        info!(
            session_id = %self.session_id,
            mode = %self.settings.mode,
            related_context_id = ?self.settings.related_context_id,
            "Starting swipe session"
        );

        let result = provider::fetch_queue(
            self.api.as_ref(),
            self.settings.mode,
            self.settings.related_context_id.as_deref(),
        )
        .await;

        self.complete_fetch(result)
    }

    /// Apply the result of the queue fetch
    ///
    /// Split from `start` so a driver that fetches on its own can still hand
    /// the queue to the controller.
    pub fn complete_fetch(
        &mut self,
        result: std::result::Result<Vec<Candidate>, FetchError>,
    ) -> Result<SessionState> {
        if self.state != SessionState::Initializing {
            return Err(Error::InvalidState(format!(
                "Queue already loaded (state: {})",
                self.state
            )));
        }

        match result {
            Ok(queue) => {
                self.queue = queue;
                self.report_placeholders();
                self.transition(SessionState::Active);
                if self.queue.is_empty() {
                    self.transition(SessionState::Exhausted);
                } else {
                    self.show_head();
                }
                Ok(self.state)
            }
            Err(e) => {
                error!(session_id = %self.session_id, "Candidate fetch failed: {}", e);
                self.last_fetch_error = Some(e.clone());
                self.events.emit_lossy(SwipeEvent::FetchFailed {
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
                self.transition(SessionState::Errored);
                Err(Error::Fetch(e))
            }
        }
    }

    /// Feed one UI intent through the classifier
    ///
    /// A `Decided` result has already been committed when this returns.
    pub fn handle_intent(&mut self, intent: Intent) -> Classification {
        if self.state != SessionState::Active {
            return Classification::Ignored(IgnoreReason::Inactive);
        }

        let head = self.head_position();
        let classification = self.classifier.classify(intent, head);
        if let Classification::Decided(direction) = classification {
            self.decide(direction);
        }
        classification
    }

    /// Like `handle_intent`, but only if `position` is still the head
    ///
    /// For renderers that tag intents with the card they were raised on.
    pub fn handle_intent_at(&mut self, position: usize, intent: Intent) -> Classification {
        if self.state == SessionState::Active && self.head_position() != Some(position) {
            debug!(position, cursor = self.cursor(), "Dropping stale intent");
            return Classification::Ignored(IgnoreReason::Stale);
        }
        self.handle_intent(intent)
    }

    /// Record a decision for the head candidate and advance
    ///
    /// Returns the decided position, or `None` when there is no head
    /// candidate (not active, or exhausted).
    pub fn decide(&mut self, direction: Direction) -> Option<usize> {
        if self.state != SessionState::Active {
            debug!(state = %self.state, "Ignoring decision outside active session");
            return None;
        }

        let candidate = self.queue.get(self.log.len())?;
        let position = self.pipeline.commit(
            &mut self.log,
            candidate,
            direction,
            self.settings.mode,
            self.settings.related_context_id.as_deref(),
        );

        let identity = candidate.identity().to_string();
        self.classifier.reset();
        info!(
            session_id = %self.session_id,
            position,
            identity = %identity,
            direction = %direction,
            "Decision committed"
        );
        self.events.emit_lossy(SwipeEvent::DecisionCommitted {
            position,
            identity,
            direction,
            exit_offset: feedback::fly_out_offset(direction),
            timestamp: Utc::now(),
        });

        if self.cursor() >= self.queue.len() {
            self.transition(SessionState::Exhausted);
        } else {
            self.show_head();
        }
        Some(position)
    }

    /// Apply every commit outcome that has already arrived
    ///
    /// Returns the number of outcomes applied.
    pub fn drain_outcomes(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.outcomes.try_recv() {
            if self.apply_outcome(outcome) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next commit outcome and apply it
    ///
    /// Returns the settled decision, or `None` right away when nothing is
    /// pending.
    pub async fn next_outcome(&mut self) -> Option<Decision> {
        while self.has_pending() {
            let outcome = self.outcomes.recv().await?;
            let position = outcome.position;
            if self.apply_outcome(outcome) {
                return self.log.get(position).cloned();
            }
        }
        None
    }

    /// Wait until every decision has been confirmed or failed
    pub async fn settle_all(&mut self) -> DecisionSummary {
        while self.next_outcome().await.is_some() {}
        self.log.summary()
    }

    pub fn has_pending(&self) -> bool {
        self.log.pending_count() > 0
    }

    /// Observer view of the session
    pub fn snapshot(&self) -> SessionSnapshot {
        let cursor = self.cursor();
        let visible = match self.state {
            SessionState::Active => self
                .queue
                .iter()
                .enumerate()
                .skip(cursor)
                .take(VISIBLE_STACK_DEPTH)
                .map(|(position, candidate)| CardView {
                    position,
                    render_key: candidate.identity().render_key(position),
                    identity: candidate.identity().to_string(),
                    display_name: candidate.display_name(position),
                    match_score: candidate.match_score(),
                    skills: candidate.skills(self.settings.mode),
                    is_top: position == cursor,
                })
                .collect(),
            _ => Vec::new(),
        };

        SessionSnapshot {
            session_id: self.session_id,
            mode: self.settings.mode,
            state: self.state,
            cursor,
            total: self.queue.len(),
            visible,
            feedback: DragFeedback::from_offset(self.classifier.live_offset()),
            summary: self.log.summary(),
            last_error: self.last_fetch_error.as_ref().map(|e| e.to_string()),
        }
    }

    fn apply_outcome(&mut self, outcome: CommitOutcome) -> bool {
        let new_state = outcome.confirmation_state();
        let CommitOutcome {
            position,
            identity,
            display_name,
            result,
        } = outcome;

        if !self.log.settle(position, &identity, new_state) {
            warn!(
                position,
                identity = %identity,
                "Ignoring outcome with no matching pending decision"
            );
            return false;
        }

        match result {
            Ok(response) => {
                debug!(
                    position,
                    identity = %identity,
                    status = ?response.status,
                    is_match = response.is_match,
                    "Decision confirmed"
                );
                self.events.emit_lossy(SwipeEvent::DecisionConfirmed {
                    position,
                    identity: identity.to_string(),
                    is_match: response.is_match,
                    timestamp: Utc::now(),
                });

                if response.is_match {
                    info!(
                        session_id = %self.session_id,
                        identity = %identity,
                        "It's a match with {}",
                        display_name
                    );
                    self.events.emit_lossy(SwipeEvent::MatchFound {
                        identity: identity.to_string(),
                        display_name,
                        timestamp: Utc::now(),
                    });
                }
            }
            Err(e) => {
                warn!(
                    session_id = %self.session_id,
                    position,
                    identity = %identity,
                    "Swipe commit failed: {}",
                    e
                );
                self.events.emit_lossy(SwipeEvent::CommitFailed {
                    position,
                    identity: identity.to_string(),
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
        true
    }

    fn transition(&mut self, new_state: SessionState) {
        let old_state = self.state;
        if old_state == new_state {
            return;
        }
        self.state = new_state;

        info!(
            session_id = %self.session_id,
            "Session state: {} -> {}",
            old_state,
            new_state
        );
        self.events.emit_lossy(SwipeEvent::SessionStateChanged {
            old_state,
            new_state,
            timestamp: Utc::now(),
        });
    }

    fn show_head(&self) {
        let position = self.cursor();
        let Some(candidate) = self.queue.get(position) else {
            return;
        };

        let display_name = candidate.display_name(position);
        self.events.emit_lossy(SwipeEvent::CandidateShown {
            position,
            identity: candidate.identity().to_string(),
            render_key: candidate.identity().render_key(position),
            display_name: display_name.clone(),
            remaining: self.queue.len() - position,
            timestamp: Utc::now(),
        });

        if self.settings.tts_enabled {
            self.events.emit_lossy(SwipeEvent::Announcement {
                text: format!(
                    "{}. Match score {}.",
                    display_name,
                    candidate.match_score().round()
                ),
                timestamp: Utc::now(),
            });
        }
    }

    fn report_placeholders(&self) {
        for (position, candidate) in self.queue.iter().enumerate() {
            if candidate.identity().is_placeholder() {
                let render_key = candidate.identity().render_key(position);
                warn!(
                    session_id = %self.session_id,
                    position,
                    render_key = %render_key,
                    "Candidate has no usable identity"
                );
                self.events.emit_lossy(SwipeEvent::DataIntegrityWarning {
                    position,
                    render_key,
                    reason: "record has no usable id or _id".to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Key;
    use crate::commit::ConfirmationState;
    use crate::error::CommitError;
    use async_trait::async_trait;
    use cq_common::api::{SwipeRequest, SwipeResponse};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    type SwipeResult = std::result::Result<SwipeResponse, CommitError>;

    /// Backend whose swipe responses are released by the test
    struct ScriptedApi {
        listing: std::result::Result<Vec<Value>, FetchError>,
        gates: Mutex<HashMap<String, oneshot::Receiver<SwipeResult>>>,
        requests: Mutex<Vec<SwipeRequest>>,
    }

    impl ScriptedApi {
        fn new(listing: Vec<Value>) -> Self {
            Self {
                listing: Ok(listing),
                gates: Mutex::new(HashMap::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: FetchError) -> Self {
            Self {
                listing: Err(error),
                gates: Mutex::new(HashMap::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Hold the swipe for `target_id` until the returned sender fires
        fn gate(&self, target_id: &str) -> oneshot::Sender<SwipeResult> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(target_id.to_string(), rx);
            tx
        }

        fn requests(&self) -> Vec<SwipeRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MatchApi for ScriptedApi {
        async fn list_candidates(
            &self,
            _mode: MatchMode,
            _related_context_id: Option<&str>,
        ) -> std::result::Result<Vec<Value>, FetchError> {
            self.listing.clone()
        }

        async fn record_swipe(&self, request: SwipeRequest) -> SwipeResult {
            self.requests.lock().unwrap().push(request.clone());
            let gate = self.gates.lock().unwrap().remove(&request.target_id);
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(CommitError::Network("gate dropped".to_string()))),
                None => Ok(SwipeResponse::default()),
            }
        }
    }

    fn matched() -> SwipeResult {
        Ok(SwipeResponse {
            status: Some("liked".to_string()),
            is_match: true,
        })
    }

    fn people(ids: &[&str]) -> Vec<Value> {
        ids.iter()
            .map(|id| json!({"id": id, "match_score": 50, "username": format!("{}-name", id)}))
            .collect()
    }

    async fn started(api: Arc<ScriptedApi>, settings: SessionSettings) -> SessionController {
        let mut session = SessionController::new(api, settings, Arc::new(EventBus::new(256)));
        session.start().await.unwrap();
        session
    }

    fn drain(rx: &mut broadcast::Receiver<SwipeEvent>) -> Vec<SwipeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_start_activates_with_filtered_queue() {
        let api = Arc::new(ScriptedApi::new(vec![
            json!({"id": "A", "match_score": 5}),
            json!({"id": "B", "match_score": 0}),
            json!({"id": "C", "match_score": 3}),
        ]));
        let session = started(api, SessionSettings::new(MatchMode::Person)).await;

        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.queue().len(), 2);
        assert_eq!(session.current_candidate().unwrap().identity().as_str(), "A");
        assert_eq!(session.cursor(), 0);
    }

    #[tokio::test]
    async fn test_empty_queue_is_immediately_exhausted() {
        let api = Arc::new(ScriptedApi::new(vec![json!({"id": "A", "match_score": 0})]));
        let session = started(api, SessionSettings::new(MatchMode::Project)).await;

        assert_eq!(session.state(), SessionState::Exhausted);
        assert!(session.current_candidate().is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_errors_session() {
        let api = Arc::new(ScriptedApi::failing(FetchError::Network("refused".to_string())));
        let mut session = SessionController::new(
            api,
            SessionSettings::new(MatchMode::Person),
            Arc::new(EventBus::new(16)),
        );
        let mut rx = session.subscribe();

        let result = session.start().await;
        assert!(matches!(result, Err(Error::Fetch(FetchError::Network(_)))));
        assert_eq!(session.state(), SessionState::Errored);
        assert!(session.last_fetch_error().is_some());
        assert_eq!(session.decide(Direction::Accept), None);

        let types: Vec<String> = drain(&mut rx)
            .iter()
            .map(|e| e.event_type().to_string())
            .collect();
        assert_eq!(types, vec!["FetchFailed", "SessionStateChanged"]);
    }

    #[tokio::test]
    async fn test_start_twice_is_invalid() {
        let api = Arc::new(ScriptedApi::new(people(&["u1"])));
        let mut session = started(api, SessionSettings::new(MatchMode::Person)).await;
        assert!(matches!(session.start().await, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_late_match_names_decided_candidate() {
        let api = Arc::new(ScriptedApi::new(people(&["u123", "u456", "u789", "u999"])));
        let gate = api.gate("u123");
        let mut session = started(
            Arc::clone(&api),
            SessionSettings::new(MatchMode::Person).with_related_context("p9"),
        )
        .await;
        let mut rx = session.subscribe();

        assert_eq!(session.decide(Direction::Accept), Some(0));
        assert_eq!(session.decide(Direction::Reject), Some(1));
        assert_eq!(session.decide(Direction::Accept), Some(2));
        assert_eq!(session.cursor(), 3);
        assert_eq!(session.current_candidate().unwrap().identity().as_str(), "u999");

        // The two later commits settle first; the gated one is still pending
        session.next_outcome().await.unwrap();
        session.next_outcome().await.unwrap();
        assert!(session.has_pending());

        gate.send(matched()).unwrap();
        let settled = session.next_outcome().await.unwrap();
        assert_eq!(settled.position, 0);
        assert_eq!(settled.candidate_identity.as_str(), "u123");
        assert_eq!(settled.state, ConfirmationState::Confirmed { is_match: true });

        // Head is unchanged by the late result
        assert_eq!(session.cursor(), 3);
        assert_eq!(session.current_candidate().unwrap().identity().as_str(), "u999");
        let found = drain(&mut rx).into_iter().find_map(|e| match e {
            SwipeEvent::MatchFound { identity, display_name, .. } => Some((identity, display_name)),
            _ => None,
        });
        assert_eq!(found, Some(("u123".to_string(), "u123-name".to_string())));

        let request = api
            .requests()
            .into_iter()
            .find(|r| r.target_id == "u123")
            .unwrap();
        assert_eq!(request.related_id.as_deref(), Some("p9"));
    }

    #[tokio::test]
    async fn test_out_of_order_outcomes_settle_their_own_decisions() {
        let api = Arc::new(ScriptedApi::new(people(&["a", "b", "c"])));
        let gate_a = api.gate("a");
        let gate_b = api.gate("b");
        let mut session = started(Arc::clone(&api), SessionSettings::new(MatchMode::Person)).await;

        session.decide(Direction::Accept);
        session.decide(Direction::Reject);
        assert_eq!(session.cursor(), 2);

        gate_b.send(Err(CommitError::Status { status: 500, body: "boom".to_string() })).unwrap();
        let first = session.next_outcome().await.unwrap();
        assert_eq!(first.position, 1);
        assert_eq!(first.state, ConfirmationState::Failed);

        gate_a.send(matched()).unwrap();
        let second = session.next_outcome().await.unwrap();
        assert_eq!(second.position, 0);
        assert_eq!(second.state, ConfirmationState::Confirmed { is_match: true });

        assert!(!session.has_pending());
        assert_eq!(session.next_outcome().await.map(|d| d.position), None);
    }

    #[tokio::test]
    async fn test_commit_failure_does_not_block_next_decision() {
        let api = Arc::new(ScriptedApi::new(people(&["a", "b"])));
        let gate = api.gate("a");
        let mut session = started(Arc::clone(&api), SessionSettings::new(MatchMode::Person)).await;
        let mut rx = session.subscribe();

        session.decide(Direction::Accept);
        gate.send(Err(CommitError::Network("reset".to_string()))).unwrap();
        session.next_outcome().await;

        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.decide(Direction::Reject), Some(1));
        let summary = session.settle_all().await;
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.confirmed, 1);
        assert_eq!(summary.pending, 0);

        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, SwipeEvent::CommitFailed { position: 0, .. })));
    }

    #[tokio::test]
    async fn test_release_on_last_candidate_exhausts() {
        let api = Arc::new(ScriptedApi::new(people(&["only"])));
        let mut session = started(api, SessionSettings::new(MatchMode::Person)).await;

        assert_eq!(
            session.handle_intent(Intent::GestureReleased(150.0)),
            Classification::Decided(Direction::Accept)
        );
        assert_eq!(session.state(), SessionState::Exhausted);
        assert_eq!(session.cursor(), 1);
        assert_eq!(
            session.handle_intent(Intent::ButtonClicked(Direction::Accept)),
            Classification::Ignored(IgnoreReason::Inactive)
        );
        assert_eq!(session.decisions().len(), 1);
    }

    #[tokio::test]
    async fn test_cursor_always_equals_decision_count() {
        let ids: Vec<String> = (0..6).map(|i| format!("c{}", i)).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let api = Arc::new(ScriptedApi::new(people(&refs)));
        let mut session = started(api, SessionSettings::new(MatchMode::Project)).await;

        let intents = [
            Intent::GestureMoved(40.0),
            Intent::GestureReleased(60.0),
            Intent::KeyPressed { key: Key::ArrowRight, repeat: false },
            Intent::KeyPressed { key: Key::ArrowRight, repeat: true },
            Intent::ButtonClicked(Direction::Reject),
            Intent::GestureReleased(-180.0),
            Intent::KeyPressed { key: Key::Other("x".to_string()), repeat: false },
            Intent::KeyPressed { key: Key::ArrowLeft, repeat: false },
            Intent::ButtonClicked(Direction::Accept),
            Intent::ButtonClicked(Direction::Accept),
        ];
        for intent in intents {
            session.handle_intent(intent);
            assert_eq!(session.cursor(), session.decisions().len());
            assert!(session.cursor() <= session.queue().len());
            for (i, decision) in session.decisions().iter().enumerate() {
                assert_eq!(decision.position, i);
                assert_eq!(&decision.candidate_identity, session.queue()[i].identity());
            }
        }

        assert_eq!(session.state(), SessionState::Exhausted);
        assert_eq!(session.cursor(), 6);
    }

    #[tokio::test]
    async fn test_stale_intent_is_ignored() {
        let api = Arc::new(ScriptedApi::new(people(&["a", "b"])));
        let mut session = started(api, SessionSettings::new(MatchMode::Person)).await;

        session.handle_intent_at(0, Intent::ButtonClicked(Direction::Accept));
        assert_eq!(
            session.handle_intent_at(0, Intent::ButtonClicked(Direction::Accept)),
            Classification::Ignored(IgnoreReason::Stale)
        );
        assert_eq!(session.cursor(), 1);
    }

    #[tokio::test]
    async fn test_placeholder_identity_warns_and_uses_positional_key() {
        let api = Arc::new(ScriptedApi::new(vec![
            json!({"id": "a", "match_score": 3}),
            json!({"match_score": 3, "name": "Nameless"}),
        ]));
        let mut session = SessionController::new(
            api,
            SessionSettings::new(MatchMode::Project),
            Arc::new(EventBus::new(32)),
        );
        let mut rx = session.subscribe();
        session.start().await.unwrap();

        let warnings: Vec<String> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                SwipeEvent::DataIntegrityWarning { render_key, .. } => Some(render_key),
                _ => None,
            })
            .collect();
        assert_eq!(warnings, vec!["card-1"]);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.visible.len(), 2);
        assert!(snapshot.visible[0].is_top);
        assert_eq!(snapshot.visible[1].render_key, "card-1");
        assert_eq!(snapshot.visible[1].display_name, "Nameless");
    }

    #[tokio::test]
    async fn test_snapshot_tracks_drag_and_stack() {
        let api = Arc::new(ScriptedApi::new(people(&["a", "b", "c"])));
        let mut session = started(api, SessionSettings::new(MatchMode::Person)).await;

        session.handle_intent(Intent::GestureMoved(100.0));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.feedback.accept_opacity, 0.5);
        assert_eq!(snapshot.visible.len(), 2);

        session.handle_intent(Intent::GestureReleased(50.0));
        session.decide(Direction::Accept);
        session.decide(Direction::Accept);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.feedback.offset, 0.0);
        assert_eq!(snapshot.visible.len(), 1);
        assert_eq!(snapshot.visible[0].identity, "c");
    }

    #[tokio::test]
    async fn test_direct_decision_clears_drag_of_previous_card() {
        let api = Arc::new(ScriptedApi::new(people(&["a", "b"])));
        let mut session = started(api, SessionSettings::new(MatchMode::Person)).await;

        session.handle_intent(Intent::GestureMoved(120.0));
        assert_eq!(session.snapshot().feedback.offset, 120.0);

        session.decide(Direction::Accept);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.visible[0].identity, "b");
        assert_eq!(snapshot.feedback, DragFeedback::neutral());
    }

    #[tokio::test]
    async fn test_committed_event_carries_exit_offset() {
        let api = Arc::new(ScriptedApi::new(people(&["a", "b"])));
        let mut session = started(api, SessionSettings::new(MatchMode::Person)).await;
        let mut rx = session.subscribe();

        session.handle_intent(Intent::GestureReleased(-140.0));
        session.decide(Direction::Accept);

        let exits: Vec<(Direction, f64)> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                SwipeEvent::DecisionCommitted { direction, exit_offset, .. } => {
                    Some((direction, exit_offset))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            exits,
            vec![(Direction::Reject, -300.0), (Direction::Accept, 300.0)]
        );
    }

    #[tokio::test]
    async fn test_announcements_follow_tts_setting() {
        let api = Arc::new(ScriptedApi::new(people(&["a"])));
        let mut settings = SessionSettings::new(MatchMode::Person);
        settings.tts_enabled = true;
        let mut session = SessionController::new(api, settings, Arc::new(EventBus::new(16)));
        let mut rx = session.subscribe();
        session.start().await.unwrap();

        let texts: Vec<String> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                SwipeEvent::Announcement { text, .. } => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["a-name. Match score 50."]);
    }

    #[tokio::test]
    async fn test_dropped_session_ignores_late_outcomes() {
        let api = Arc::new(ScriptedApi::new(people(&["a"])));
        let gate = api.gate("a");
        let mut session = started(Arc::clone(&api), SessionSettings::new(MatchMode::Person)).await;
        session.decide(Direction::Accept);
        drop(session);

        // The commit task finishes and its send simply fails
        gate.send(matched()).unwrap();
        for _ in 0..100 {
            if !api.requests().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(api.requests().len(), 1);
    }
}
