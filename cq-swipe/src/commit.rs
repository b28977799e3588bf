//! Swipe commit pipeline
//!
//! A commit has two halves:
//! 1. synchronous: append a pending `Decision` to the log (which advances
//!    the cursor, since the cursor is the log length)
//! 2. detached: send the decision to the backend and report a
//!    `CommitOutcome` back over the session's mpsc channel
//!
//! Outcomes may arrive in any order. Each carries the position and identity
//! it was created for, so it settles exactly the decision that produced it.
//! Failed commits are never rolled back or retried.

use crate::candidate::Candidate;
use crate::client::MatchApi;
use crate::error::CommitError;
use crate::identity::Identity;
use chrono::{DateTime, Utc};
use cq_common::api::{SwipeRequest, SwipeResponse};
use cq_common::events::{Direction, MatchMode};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Persistence lifecycle of a decision
///
/// `Pending` moves exactly once, to `Confirmed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ConfirmationState {
    Pending,
    Confirmed { is_match: bool },
    Failed,
}

/// One recorded swipe
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    /// Queue position the decision was made at
    pub position: usize,
    pub candidate_identity: Identity,
    /// Display name captured at decision time (for match notifications)
    pub display_name: String,
    pub direction: Direction,
    pub mode: MatchMode,
    pub related_context_id: Option<String>,
    pub state: ConfirmationState,
    pub created_at: DateTime<Utc>,
}

/// Counts over the decision log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecisionSummary {
    pub total: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub failed: usize,
    pub matches: usize,
}

/// Append-only decision history
///
/// Entry `i` is the decision for queue position `i`; the log length is the
/// session cursor.
#[derive(Debug, Default)]
pub struct DecisionLog {
    entries: Vec<Decision>,
}

impl DecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Decision] {
        &self.entries
    }

    pub fn get(&self, position: usize) -> Option<&Decision> {
        self.entries.get(position)
    }

    fn append(&mut self, decision: Decision) -> usize {
        debug_assert_eq!(decision.position, self.entries.len());
        self.entries.push(decision);
        self.entries.len() - 1
    }

    /// Move a pending decision to its final state
    ///
    /// Returns false (and changes nothing) when no pending decision at
    /// `position` carries `identity`.
    pub fn settle(
        &mut self,
        position: usize,
        identity: &Identity,
        state: ConfirmationState,
    ) -> bool {
        match self.entries.get_mut(position) {
            Some(decision)
                if decision.candidate_identity == *identity
                    && decision.state == ConfirmationState::Pending
                    && state != ConfirmationState::Pending =>
            {
                decision.state = state;
                true
            }
            _ => false,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.state == ConfirmationState::Pending)
            .count()
    }

    pub fn summary(&self) -> DecisionSummary {
        self.entries
            .iter()
            .fold(DecisionSummary::default(), |mut s, d| {
                s.total += 1;
                match d.state {
                    ConfirmationState::Pending => s.pending += 1,
                    ConfirmationState::Confirmed { is_match } => {
                        s.confirmed += 1;
                        if is_match {
                            s.matches += 1;
                        }
                    }
                    ConfirmationState::Failed => s.failed += 1,
                }
                s
            })
    }
}

/// Result of one detached commit, delivered back to the session
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub position: usize,
    pub identity: Identity,
    pub display_name: String,
    pub result: Result<SwipeResponse, CommitError>,
}

impl CommitOutcome {
    /// Final state this outcome settles its decision to
    pub fn confirmation_state(&self) -> ConfirmationState {
        match &self.result {
            Ok(response) => ConfirmationState::Confirmed {
                is_match: response.is_match,
            },
            Err(_) => ConfirmationState::Failed,
        }
    }
}

/// Records decisions and runs their backend commits
pub struct CommitPipeline {
    api: Arc<dyn MatchApi>,
    outcome_tx: mpsc::UnboundedSender<CommitOutcome>,
}

impl CommitPipeline {
    pub fn new(api: Arc<dyn MatchApi>, outcome_tx: mpsc::UnboundedSender<CommitOutcome>) -> Self {
        Self { api, outcome_tx }
    }

    /// Commit a decision for the candidate at the log's next position
    ///
    /// The pending decision is in the log when this returns; the network
    /// call runs on a spawned task. Must be called within a tokio runtime.
    pub fn commit(
        &self,
        log: &mut DecisionLog,
        candidate: &Candidate,
        direction: Direction,
        mode: MatchMode,
        related_context_id: Option<&str>,
    ) -> usize {
        let position = log.len();
        let identity = candidate.identity().clone();
        let display_name = candidate.display_name(position);

        let request = SwipeRequest {
            target_id: identity.to_string(),
            direction: direction.into(),
            target_type: mode.into(),
            related_id: related_context_id.map(str::to_string),
        };

        log.append(Decision {
            position,
            candidate_identity: identity.clone(),
            display_name: display_name.clone(),
            direction,
            mode,
            related_context_id: related_context_id.map(str::to_string),
            state: ConfirmationState::Pending,
            created_at: Utc::now(),
        });

        self.spawn_commit(position, identity, display_name, request);
        position
    }

    fn spawn_commit(
        &self,
        position: usize,
        identity: Identity,
        display_name: String,
        request: SwipeRequest,
    ) {
        let api = Arc::clone(&self.api);
        let outcome_tx = self.outcome_tx.clone();

        tokio::spawn(async move {
            // Inner task so a panicking client still yields an outcome
            let call = tokio::spawn(async move { api.record_swipe(request).await });
            let result = match call.await {
                Ok(result) => result,
                Err(e) => {
                    warn!(position, "Swipe commit task aborted: {}", e);
                    Err(CommitError::Aborted(e.to_string()))
                }
            };

            let outcome = CommitOutcome {
                position,
                identity,
                display_name,
                result,
            };

            if outcome_tx.send(outcome).is_err() {
                debug!(position, "Session dropped before commit completed");
            }
        });
    }
}
