//! # CollabQuest Common Library
//!
//! Shared code for the CollabQuest client crates:
//! - Error types
//! - Client configuration loading
//! - Event types (SwipeEvent enum) and the EventBus
//! - Wire types for the matching endpoints

pub mod api;
pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
