//! # CollabQuest Swipe Engine (cq-swipe)
//!
//! Drives the "swipe to decide" matching flow.
//!
//! **Purpose:** Fetch a queue of candidates once per session, turn drag
//! gestures, button clicks and arrow keys into accept/reject decisions,
//! advance the queue optimistically, and reconcile each decision with the
//! backend in the background (including out-of-band match results).
//!
//! **Architecture:** `SessionController` owns all mutable session state.
//! Commits run as detached tokio tasks and report back over an mpsc channel;
//! observers follow along through the `EventBus` and state snapshots.

pub mod candidate;
pub mod classifier;
pub mod cli;
pub mod client;
pub mod commit;
pub mod error;
pub mod feedback;
pub mod identity;
pub mod provider;
pub mod session;

pub use candidate::Candidate;
pub use classifier::{Classification, DecisionClassifier, IgnoreReason, Intent, Key};
pub use client::{HttpMatchApi, MatchApi};
pub use commit::{CommitOutcome, ConfirmationState, Decision, DecisionLog, DecisionSummary};
pub use error::{CommitError, Error, FetchError, Result};
pub use identity::Identity;
pub use session::{CardView, SessionController, SessionSettings, SessionSnapshot};
