//! Host Audio Primitive
//!
//! The conductor never touches samples. It drives schedulable sources
//! provided by the platform audio layer through these traits.

use std::sync::Arc;

use cf_core::AudioClip;

/// One schedulable audio source owned by the host.
///
/// A [`Player`](crate::Player) owns two of these and alternates between
/// them for gapless looping.
pub trait AudioSource: Send {
    /// Assign the buffer to play (None detaches it)
    fn set_clip(&mut self, clip: Option<&AudioClip>);

    /// Route to an output bus (None = default output)
    fn set_output(&mut self, bus: Option<&str>);

    fn set_enabled(&mut self, enabled: bool);

    /// Start playback at absolute clock time `time` (seconds)
    fn play_scheduled(&mut self, time: f64);

    /// Stop playback at absolute clock time `time` (seconds)
    fn set_scheduled_end(&mut self, time: f64);

    fn pause(&mut self);

    fn unpause(&mut self);

    fn stop(&mut self);

    /// Current playback position in sample frames
    fn time_samples(&self) -> u64;

    fn set_time_samples(&mut self, samples: u64);

    /// True from scheduling until the scheduled end, unless paused or stopped
    fn is_playing(&self) -> bool;

    fn set_volume(&mut self, volume: f32);

    fn set_pitch(&mut self, pitch: f32);
}

/// Wall-clock time used for scheduling (seconds, monotonic)
pub trait DspClock: Send + Sync {
    fn dsp_time(&self) -> f64;
}

/// Creates sources for new players.
///
/// Returning `None` leaves the player with a missing source; the player then
/// degrades to no-ops instead of failing.
pub trait SourceFactory: Send {
    fn create_source(&mut self) -> Option<Box<dyn AudioSource>>;
}

/// Shared clock reference
pub type SharedClock = Arc<dyn DspClock>;
