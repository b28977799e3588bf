//! Candidate records

use crate::identity::{self, Identity};
use cq_common::api::RawCandidate;
use cq_common::events::MatchMode;
use serde_json::Value;

/// Field carrying the backend's ranking signal
pub const MATCH_SCORE_FIELD: &str = "match_score";

/// A person or project eligible to be swiped on
///
/// The payload is kept as the backend sent it; the engine only reads the
/// score, the identity fields and a few display fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    identity: Identity,
    match_score: f64,
    payload: RawCandidate,
}

impl Candidate {
    /// Build a candidate from a raw record
    ///
    /// Returns `None` when the record is not viable: its match score is
    /// missing, non-numeric, non-finite or not strictly positive.
    pub fn from_record(record: RawCandidate) -> Option<Self> {
        let match_score = record
            .get(MATCH_SCORE_FIELD)
            .and_then(Value::as_f64)
            .filter(|s| s.is_finite() && *s > 0.0)?;

        Some(Self {
            identity: identity::normalize(&record),
            match_score,
            payload: record,
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn match_score(&self) -> f64 {
        self.match_score
    }

    pub fn payload(&self) -> &RawCandidate {
        &self.payload
    }

    /// Name shown on the card and in match notifications
    ///
    /// `username` for people, `name` for projects, falling back to the
    /// identity (or its render key when the identity is a placeholder).
    pub fn display_name(&self, position: usize) -> String {
        ["username", "name"]
            .iter()
            .filter_map(|key| self.payload.get(*key).and_then(Value::as_str))
            .find(|s| !s.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.identity.render_key(position))
    }

    /// Skills listed on the card (`skills` for people, `needed_skills` for projects)
    pub fn skills(&self, mode: MatchMode) -> Vec<String> {
        let key = match mode {
            MatchMode::Person => "skills",
            MatchMode::Project => "needed_skills",
        };
        self.payload
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}
