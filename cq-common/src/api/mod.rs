//! Shared HTTP API types for the matching backend
//!
//! Contains ONLY wire types and endpoint constants; the HTTP client lives in
//! the crates that talk to the backend.

pub mod types;

pub use types::{
    RawCandidate, SwipeRequest, SwipeResponse, TargetType, WireDirection, LIST_PROJECTS_PATH,
    LIST_USERS_PATH, RELATED_CONTEXT_QUERY, SWIPE_PATH,
};
