//! Mood
//!
//! The authoritative mood scalar lives on the [`Navigator`](crate::navigator::Navigator).
//! This module holds the pieces around it: the clamp range, the changes a
//! scene or choice can carry, the smoothed gauge the surface draws, and the
//! emoji bands derived from it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Closed range mood values are clamped into
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoodRange {
    pub min: f32,
    pub max: f32,
}

impl MoodRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Position of `value` inside the range, 0.0..=1.0
    pub fn fraction(&self, value: f32) -> f32 {
        let span = self.max - self.min;
        if span <= f32::EPSILON {
            return 0.0;
        }
        ((self.clamp(value) - self.min) / span).clamp(0.0, 1.0)
    }
}

impl Default for MoodRange {
    fn default() -> Self {
        Self::new(0.0, 100.0)
    }
}

/// A change to the mood carried by a scene or choice
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MoodChange {
    /// Replace the mood outright
    Set(f32),
    /// Add to the current mood
    Shift(f32),
}

impl MoodChange {
    /// Build from the optional document fields; an absolute value wins
    pub fn from_fields(absolute: Option<f32>, delta: Option<f32>) -> Option<Self> {
        match (absolute, delta) {
            (Some(value), _) => Some(Self::Set(value)),
            (None, Some(delta)) => Some(Self::Shift(delta)),
            (None, None) => None,
        }
    }

    /// Apply to `current`, clamped into `range`
    pub fn apply(self, current: f32, range: MoodRange) -> f32 {
        match self {
            Self::Set(value) => range.clamp(value),
            Self::Shift(delta) => range.clamp(current + delta),
        }
    }
}

// ============================================================================
// Smoothed Gauge
// ============================================================================

/// Below this distance the gauge snaps to its target
const SNAP_DISTANCE: f32 = 0.05;

/// Display value that eases toward the authoritative mood
///
/// Only [`MoodGauge::tick`] moves `rendered`. The stage retargets it after
/// every navigation and ticks it every frame, transitions or not.
#[derive(Clone, Debug)]
pub struct MoodGauge {
    rendered: f32,
    target: f32,
    /// Approach rate per second
    rate: f32,
}

impl MoodGauge {
    pub fn new(initial: f32, rate: f32) -> Self {
        Self {
            rendered: initial,
            target: initial,
            rate: rate.max(0.0),
        }
    }

    pub fn retarget(&mut self, target: f32) {
        self.target = target;
    }

    pub fn tick(&mut self, delta: Duration) {
        let diff = self.target - self.rendered;
        if diff.abs() < SNAP_DISTANCE {
            self.rendered = self.target;
            return;
        }
        let alpha = 1.0 - (-self.rate * delta.as_secs_f32()).exp();
        self.rendered += diff * alpha;
    }

    pub fn rendered(&self) -> f32 {
        self.rendered
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.rendered == self.target
    }
}

// ============================================================================
// Bands
// ============================================================================

/// Coarse mood buckets for the indicator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodBand {
    Gloomy,
    Uneasy,
    Neutral,
    Warm,
    Glowing,
}

impl MoodBand {
    /// Band for a value inside `range`
    pub fn for_value(value: f32, range: MoodRange) -> Self {
        match range.fraction(value) {
            f if f < 0.2 => Self::Gloomy,
            f if f < 0.4 => Self::Uneasy,
            f if f < 0.6 => Self::Neutral,
            f if f < 0.8 => Self::Warm,
            _ => Self::Glowing,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Gloomy => "😞",
            Self::Uneasy => "😬",
            Self::Neutral => "🙂",
            Self::Warm => "😊",
            Self::Glowing => "🥰",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Gloomy => "gloomy",
            Self::Uneasy => "uneasy",
            Self::Neutral => "okay",
            Self::Warm => "warm",
            Self::Glowing => "glowing",
        }
    }
}

/// A snapshot of mood for rendering
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoodReading {
    /// Smoothed display value
    pub rendered: f32,
    /// Authoritative value
    pub value: f32,
    pub range: MoodRange,
}

impl MoodReading {
    pub fn band(&self) -> MoodBand {
        MoodBand::for_value(self.rendered, self.range)
    }

    pub fn fraction(&self) -> f32 {
        self.range.fraction(self.rendered)
    }
}
