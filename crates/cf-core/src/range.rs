//! Value ranges for playback parameters

use serde::{Deserialize, Serialize};

/// Closed `[min, max]` range used to clamp volume and pitch values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    /// Linear volume (silence to unity)
    pub const VOLUME: ValueRange = ValueRange::new(0.0, 1.0);
    /// Random volume deviation
    pub const VOLUME_RANGE: ValueRange = ValueRange::new(0.0, 1.0);
    /// Pitch magnitude (playback rate)
    pub const PITCH: ValueRange = ValueRange::new(0.01, 3.0);
    /// Random pitch deviation
    pub const PITCH_RANGE: ValueRange = ValueRange::new(0.0, 1.0);

    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp a value into the range.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Clamp the magnitude of a value, preserving its sign.
    ///
    /// Used for pitch, where a negative value means reverse playback.
    #[inline]
    pub fn clamp_magnitude(&self, value: f32) -> f32 {
        let magnitude = value.abs().clamp(self.min, self.max);
        if value.is_sign_negative() {
            -magnitude
        } else {
            magnitude
        }
    }

    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// True when `min <= max` and both bounds are finite.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

impl Default for ValueRange {
    fn default() -> Self {
        Self::VOLUME
    }
}
