//! Matching endpoint request/response types
//!
//! Two endpoints are consumed:
//! - `GET /matches/users[?project_id=..]` and `GET /matches/projects` return
//!   an ordered JSON array of raw candidate records
//! - `POST /matches/swipe` records one decision and reports whether it
//!   produced a mutual match

use crate::events::{Direction, MatchMode};
use serde::{Deserialize, Serialize};

/// Candidate listing for person mode
pub const LIST_USERS_PATH: &str = "/matches/users";

/// Candidate listing for project mode
pub const LIST_PROJECTS_PATH: &str = "/matches/projects";

/// Swipe recording endpoint
pub const SWIPE_PATH: &str = "/matches/swipe";

/// Query parameter carrying the related project when recruiting people
pub const RELATED_CONTEXT_QUERY: &str = "project_id";

/// Raw candidate record as returned by the listing endpoints
///
/// Shapes vary by mode and by backend serializer (`id` vs `_id`, plain
/// strings vs `{"$oid": ..}` wrappers), so records stay untyped until the
/// identity normalizer has looked at them.
pub type RawCandidate = serde_json::Map<String, serde_json::Value>;

impl MatchMode {
    /// Listing endpoint path for this mode
    pub fn listing_path(self) -> &'static str {
        match self {
            MatchMode::Person => LIST_USERS_PATH,
            MatchMode::Project => LIST_PROJECTS_PATH,
        }
    }
}

/// Swipe direction as the backend spells it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireDirection {
    Left,
    Right,
}

impl From<Direction> for WireDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Accept => WireDirection::Right,
            Direction::Reject => WireDirection::Left,
        }
    }
}

/// Kind of record a swipe targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    User,
    Project,
}

impl From<MatchMode> for TargetType {
    fn from(mode: MatchMode) -> Self {
        match mode {
            MatchMode::Person => TargetType::User,
            MatchMode::Project => TargetType::Project,
        }
    }
}

/// Body of `POST /matches/swipe`
///
/// # Examples
///
/// ```
/// use cq_common::api::types::{SwipeRequest, TargetType, WireDirection};
///
/// let request = SwipeRequest {
///     target_id: "u123".to_string(),
///     direction: WireDirection::Right,
///     target_type: TargetType::User,
///     related_id: Some("p9".to_string()),
/// };
/// let json = serde_json::to_value(&request).unwrap();
/// assert_eq!(json["type"], "user");
/// assert_eq!(json["direction"], "right");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeRequest {
    /// Normalized identity of the candidate
    pub target_id: String,

    pub direction: WireDirection,

    #[serde(rename = "type")]
    pub target_type: TargetType,

    /// Related context (e.g. the project being recruited for), sent verbatim
    pub related_id: Option<String>,
}

/// Response of `POST /matches/swipe`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeResponse {
    /// Backend status label ("liked", "passed")
    #[serde(default)]
    pub status: Option<String>,

    /// True when the swipe completed a mutual accept
    #[serde(default)]
    pub is_match: bool,
}
