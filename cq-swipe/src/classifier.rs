//! Gesture and input decision classifier
//!
//! Turns UI intents into accept/reject decisions for the candidate at the
//! head of the queue:
//! - drag release beyond the threshold resolves by sign, otherwise the card
//!   springs back to neutral
//! - buttons and arrow keys resolve immediately
//! - key repeats and second triggers for the same queue position are
//!   suppressed

use cq_common::events::Direction;
use std::str::FromStr;

pub use cq_common::config::DEFAULT_SWIPE_THRESHOLD;

/// Keyboard keys the classifier understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Other(String),
}

impl FromStr for Key {
    type Err = std::convert::Infallible;

    /// Parses DOM key names (`ArrowLeft`) and terminal escape sequences
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ArrowLeft" | "Left" | "\u{1b}[D" => Key::ArrowLeft,
            "ArrowRight" | "Right" | "\u{1b}[C" => Key::ArrowRight,
            other => Key::Other(other.to_string()),
        })
    }
}

/// Intent events emitted by the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Live drag offset while the pointer is down
    GestureMoved(f64),
    /// Pointer released with the final horizontal offset
    GestureReleased(f64),
    /// Key pressed; `repeat` is set for auto-repeat events
    KeyPressed { key: Key, repeat: bool },
    /// Accept/reject button clicked
    ButtonClicked(Direction),
}

/// Why an intent produced no decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No candidate at the head of the queue
    NoCandidate,
    /// The head position already resolved a decision, or the key auto-repeated
    Duplicate,
    /// Intent targeted a position that is no longer the head
    Stale,
    /// Key has no mapped direction
    UnmappedKey,
    /// Session is not accepting decisions
    Inactive,
}

/// Result of classifying one intent
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification {
    /// A decision for the head candidate
    Decided(Direction),
    /// Live drag offset updated
    Tracking(f64),
    /// Release within the threshold; offset reset to neutral
    SpringBack,
    Ignored(IgnoreReason),
}

/// Stateful classifier for one session
#[derive(Debug, Clone)]
pub struct DecisionClassifier {
    threshold: f64,
    live_offset: f64,
    last_resolved: Option<usize>,
}

impl DecisionClassifier {
    /// Create a classifier with the given release threshold (distance units)
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.abs(),
            live_offset: 0.0,
            last_resolved: None,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Current drag offset (0.0 when idle)
    pub fn live_offset(&self) -> f64 {
        self.live_offset
    }

    /// Classify an intent against the current head position
    ///
    /// `head` is the cursor when a candidate is present, `None` when the
    /// queue is exhausted.
    pub fn classify(&mut self, intent: Intent, head: Option<usize>) -> Classification {
        let Some(position) = head else {
            self.live_offset = 0.0;
            return Classification::Ignored(IgnoreReason::NoCandidate);
        };

        if self.last_resolved == Some(position) {
            self.live_offset = 0.0;
            return Classification::Ignored(IgnoreReason::Duplicate);
        }

        match intent {
            Intent::GestureMoved(offset) => {
                if offset.is_finite() {
                    self.live_offset = offset;
                }
                Classification::Tracking(self.live_offset)
            }
            Intent::GestureReleased(offset) => {
                self.live_offset = 0.0;
                if offset.is_finite() && offset.abs() > self.threshold {
                    let direction = if offset > 0.0 {
                        Direction::Accept
                    } else {
                        Direction::Reject
                    };
                    self.resolve(position, direction)
                } else {
                    Classification::SpringBack
                }
            }
            Intent::KeyPressed { repeat: true, .. } => {
                Classification::Ignored(IgnoreReason::Duplicate)
            }
            Intent::KeyPressed { key, .. } => match key {
                Key::ArrowLeft => self.resolve(position, Direction::Reject),
                Key::ArrowRight => self.resolve(position, Direction::Accept),
                Key::Other(_) => Classification::Ignored(IgnoreReason::UnmappedKey),
            },
            Intent::ButtonClicked(direction) => self.resolve(position, direction),
        }
    }

    /// Drop any in-progress drag (the head card changed)
    pub fn reset(&mut self) {
        self.live_offset = 0.0;
    }

    fn resolve(&mut self, position: usize, direction: Direction) -> Classification {
        self.last_resolved = Some(position);
        self.live_offset = 0.0;
        Classification::Decided(direction)
    }
}

impl Default for DecisionClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_SWIPE_THRESHOLD)
    }
}
