//! Parameter Calculator
//!
//! Composes the cue-sheet → cue → track override chain into the volume and
//! pitch a player starts with.

use rand::Rng;

use crate::cue_sheet::{Cue, CueSheet, Track};
use crate::range::ValueRange;

/// Stateless composition of the three-level parameter chain.
pub struct Calculator;

impl Calculator {
    /// `sheet.volume * (cue.volume ± cue.range) * (track.volume ± track.range)`,
    /// clamped to [`ValueRange::VOLUME`].
    pub fn calc_volume<R: Rng + ?Sized>(
        sheet: &CueSheet,
        cue: &Cue,
        track: &Track,
        rng: &mut R,
    ) -> f32 {
        let cue_volume = ValueRange::VOLUME.clamp(deviate(cue.volume, cue.volume_range, rng));
        let track_volume =
            ValueRange::VOLUME.clamp(deviate(track.volume, track.volume_range, rng));
        ValueRange::VOLUME.clamp(sheet.volume * cue_volume * track_volume)
    }

    /// Product of the three pitches with random deviation, negated when an odd
    /// number of levels request pitch inversion. Magnitude is clamped to
    /// [`ValueRange::PITCH`].
    pub fn calc_pitch<R: Rng + ?Sized>(
        sheet: &CueSheet,
        cue: &Cue,
        track: &Track,
        rng: &mut R,
    ) -> f32 {
        let cue_pitch = ValueRange::PITCH.clamp(deviate(cue.pitch, cue.pitch_range, rng));
        let track_pitch = ValueRange::PITCH.clamp(deviate(track.pitch, track.pitch_range, rng));
        let pitch = ValueRange::PITCH.clamp(sheet.pitch * cue_pitch * track_pitch);

        let invert = sheet.pitch_invert ^ cue.pitch_invert ^ track.pitch_invert;
        if invert { -pitch } else { pitch }
    }
}

#[inline]
fn deviate<R: Rng + ?Sized>(value: f32, range: f32, rng: &mut R) -> f32 {
    if range > 0.0 {
        value + rng.random_range(-range..=range)
    } else {
        value
    }
}
