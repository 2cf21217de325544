//! Human behavior simulation for anti-detection
//!
//! Every randomized decision the bot makes goes through a [`Humanizer`], so
//! a single seed reproduces a whole session.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::MotionConfig;
use crate::geometry::{bezier_path, ClickBox, GeometryError, Point2D};

/// A planned pointer stroke
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Pixel positions to visit, ending on the destination
    pub points: Vec<(i32, i32)>,
    /// Time spent moving to each point
    pub step: Duration,
}

impl Stroke {
    /// Total time the stroke takes
    pub fn duration(&self) -> Duration {
        self.step * self.points.len() as u32
    }

    /// Final pointer position
    pub fn destination(&self) -> Option<(i32, i32)> {
        self.points.last().copied()
    }
}

fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}

/// Humanizer for generating randomized timing and positions
pub struct Humanizer<R = StdRng> {
    rng: R,
}

impl Default for Humanizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Humanizer {
    /// Create a humanizer seeded from the operating system
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Create a reproducible humanizer
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> Humanizer<R> {
    /// Wrap an existing random source
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Uniform delay between `min` and `max` seconds
    ///
    /// Negative or NaN bounds count as zero and values too large for a
    /// `Duration` saturate.
    pub fn delay(&mut self, min_secs: f64, max_secs: f64) -> Duration {
        let sampled = max_secs > min_secs && (max_secs - min_secs).is_finite();
        if !sampled {
            return secs_to_duration(min_secs);
        }
        secs_to_duration(self.rng.random_range(min_secs..=max_secs))
    }

    /// Idle break length drawn from a range given in minutes
    pub fn idle_duration(&mut self, min_minutes: f64, max_minutes: f64) -> Duration {
        self.delay(min_minutes * 60.0, max_minutes * 60.0)
    }

    /// Fresh point inside a click box
    pub fn click_point(&mut self, click_box: &ClickBox) -> Point2D {
        click_box.sample(&mut self.rng)
    }

    /// Plan a curved stroke from `from` to `to` lasting `duration`
    ///
    /// Path points are rounded to pixels and the duration is spread evenly
    /// across them.
    pub fn stroke(
        &mut self,
        from: Point2D,
        to: Point2D,
        duration: Duration,
        motion: &MotionConfig,
    ) -> Result<Stroke, GeometryError> {
        let path = bezier_path(&mut self.rng, from, to, motion.deviation, motion.speed)?;
        let points: Vec<(i32, i32)> = path.iter().map(Point2D::rounded).collect();
        let step = duration / points.len() as u32;

        Ok(Stroke { points, step })
    }
}
