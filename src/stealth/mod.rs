//! Stealth and anti-detection module
//!
//! This module keeps automated input from forming recognizable patterns:
//! - Curved, jittered pointer strokes instead of straight jumps
//! - Randomized delays and idle breaks
//! - Randomized click points inside click boxes

pub mod humanize;

pub use humanize::*;

use serde::{Deserialize, Serialize};

/// Configuration for pointer stroke synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Maximum control point offset, as a percentage of the stroke delta
    pub deviation: u32,
    /// Path resolution multiplier; each unit adds 100 samples (must be >= 1)
    pub speed: u32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            deviation: 25,
            speed: 1,
        }
    }
}

impl MotionConfig {
    /// Straight-line strokes (for testing)
    pub fn direct() -> Self {
        Self {
            deviation: 0,
            speed: 1,
        }
    }

    /// Wide, finely sampled curves
    pub fn erratic() -> Self {
        Self {
            deviation: 60,
            speed: 2,
        }
    }
}
