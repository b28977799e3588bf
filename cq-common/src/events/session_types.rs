//! Swipe session type definitions
//!
//! Supporting types for matching sessions and swipe decisions.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Outcome of a single swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Swipe right: interested
    Accept,
    /// Swipe left: pass
    Reject,
}

impl Direction {
    /// Sign of the horizontal offset that resolves to this direction
    pub fn sign(self) -> f64 {
        match self {
            Direction::Accept => 1.0,
            Direction::Reject => -1.0,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Accept => write!(f, "accept"),
            Direction::Reject => write!(f, "reject"),
        }
    }
}

/// What kind of candidate a session swipes on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Recruiting people (optionally for one project)
    Person,
    /// Looking for projects to join
    Project,
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMode::Person => write!(f, "person"),
            MatchMode::Project => write!(f, "project"),
        }
    }
}

impl FromStr for MatchMode {
    type Err = Error;

    /// Accepts both the listing names (`users`, `projects`) and the
    /// singular target names (`user`, `project`, `person`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "users" | "user" | "person" | "people" => Ok(MatchMode::Person),
            "projects" | "project" => Ok(MatchMode::Project),
            other => Err(Error::InvalidInput(format!("Unknown match mode: {}", other))),
        }
    }
}

/// Session lifecycle
///
/// `Initializing → Active → Exhausted`, or `Initializing → Errored` when the
/// candidate fetch fails. `Exhausted` and `Errored` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Initializing,
    Active,
    Exhausted,
    Errored,
}

impl SessionState {
    /// True once the session can no longer change state
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Exhausted | SessionState::Errored)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Initializing => write!(f, "initializing"),
            SessionState::Active => write!(f, "active"),
            SessionState::Exhausted => write!(f, "exhausted"),
            SessionState::Errored => write!(f, "errored"),
        }
    }
}
