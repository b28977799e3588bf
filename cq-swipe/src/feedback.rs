//! Drag feedback mapping
//!
//! Pure functions from the live drag offset to what the card should look
//! like: tilt, which stamp is fading in, and where the card flies on exit.

use cq_common::events::Direction;
use serde::Serialize;

/// Offset at which the card reaches its maximum tilt
pub const ROTATION_RANGE: f64 = 200.0;

/// Maximum tilt in degrees
pub const MAX_ROTATION_DEG: f64 = 25.0;

/// Offset where a stamp starts to appear
pub const STAMP_FADE_START: f64 = 50.0;

/// Offset where a stamp is fully opaque
pub const STAMP_FADE_END: f64 = 150.0;

/// Horizontal offset a decided card animates to before the next one shows
pub const FLY_OUT_DISTANCE: f64 = 300.0;

/// Visual state derived from a drag offset
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DragFeedback {
    pub offset: f64,
    pub rotation_deg: f64,
    pub accept_opacity: f64,
    pub reject_opacity: f64,
}

impl DragFeedback {
    pub fn from_offset(offset: f64) -> Self {
        let offset = if offset.is_finite() { offset } else { 0.0 };
        let rotation_deg =
            (offset / ROTATION_RANGE).clamp(-1.0, 1.0) * MAX_ROTATION_DEG;

        Self {
            offset,
            rotation_deg,
            accept_opacity: stamp_opacity(offset),
            reject_opacity: stamp_opacity(-offset),
        }
    }

    /// Neutral card
    pub fn neutral() -> Self {
        Self::from_offset(0.0)
    }
}

fn stamp_opacity(offset: f64) -> f64 {
    ((offset - STAMP_FADE_START) / (STAMP_FADE_END - STAMP_FADE_START)).clamp(0.0, 1.0)
}

/// Exit offset for a decided card
pub fn fly_out_offset(direction: Direction) -> f64 {
    direction.sign() * FLY_OUT_DISTANCE
}
