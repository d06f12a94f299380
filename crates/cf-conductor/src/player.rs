//! Player
//!
//! Drives one logical voice on top of two host sources (A/B).
//!
//! ## Gapless looping
//!
//! ```text
//!   source A  |==== segment 1 ====|                     |==== segment 3 ...
//!   source B                      |==== segment 2 ====|
//!                          ^ next_event_time = end - lookahead
//!                            (segment 2 is scheduled here on the idle source)
//! ```
//!
//! Every segment is scheduled with absolute clock times on the currently
//! idle source, then the idle index flips. Non-looping playback schedules a
//! single segment and its next event is its own end.

use cf_core::{AudioClip, CategoryId, PlayerSettings};

use crate::host::{AudioSource, SharedClock};

/// Lower bound for the rate used in duration math
const MIN_RATE: f64 = 1e-3;

// ═══════════════════════════════════════════════════════════════════════════════
// STATE / EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PlayerState {
    #[default]
    Stopped = 0,
    Playing = 1,
    Paused = 2,
}

/// Result of a due [`Player::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Next loop segment was scheduled
    Looped,
    /// Non-looping playback reached its end; the player is now stopped
    Ended,
}

/// Parameters for [`Player::setup`]
#[derive(Debug, Clone, Copy)]
pub struct PlayerSetup<'a> {
    pub output: Option<&'a str>,
    pub clip: Option<&'a AudioClip>,
    pub category_id: Option<CategoryId>,
    pub volume: f32,
    pub pitch: f32,
    pub is_loop: bool,
    pub start_sample: u64,
    pub loop_start_sample: u64,
    pub end_sample: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLAYER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Player {
    sources: [Option<Box<dyn AudioSource>>; 2],
    clock: SharedClock,
    settings: PlayerSettings,

    clip: Option<AudioClip>,
    category_id: Option<CategoryId>,
    is_loop: bool,
    frequency: u32,
    sample_count: u64,
    start_sample: u64,
    loop_start_sample: u64,
    end_sample: u64,

    /// Driven by fades
    internal_volume: f32,
    /// Driven by the public API
    external_volume: f32,
    internal_pitch: f32,
    external_pitch: f32,

    state: PlayerState,
    /// Source the next segment goes to
    idle_index: usize,
    segment_count: u32,
    segment_from: [u64; 2],
    segment_starts: [f64; 2],
    scheduled_ends: [f64; 2],
    next_event_time: f64,
    pause_started_at: f64,
    paused_index: Option<usize>,
}

impl Player {
    pub fn new(
        sources: [Option<Box<dyn AudioSource>>; 2],
        clock: SharedClock,
        settings: PlayerSettings,
    ) -> Self {
        Self {
            sources,
            clock,
            settings,
            clip: None,
            category_id: None,
            is_loop: false,
            frequency: 0,
            sample_count: 0,
            start_sample: 0,
            loop_start_sample: 0,
            end_sample: 0,
            internal_volume: 1.0,
            external_volume: 1.0,
            internal_pitch: 1.0,
            external_pitch: 1.0,
            state: PlayerState::Stopped,
            idle_index: 0,
            segment_count: 0,
            segment_from: [0; 2],
            segment_starts: [0.0; 2],
            scheduled_ends: [0.0; 2],
            next_event_time: 0.0,
            pause_started_at: 0.0,
            paused_index: None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SETUP
    // ═══════════════════════════════════════════════════════════════════════════

    /// Prepare for a new playback. Returns false (and stays inert) when the
    /// clip or either host source is missing.
    pub fn setup(&mut self, setup: PlayerSetup<'_>) -> bool {
        self.reset();

        let Some(clip) = setup.clip else {
            log::error!("Player setup without an audio clip");
            return false;
        };
        if !self.has_sources() {
            log::error!("Player setup for '{}' with a missing audio source", clip.name);
            return false;
        }

        self.frequency = clip.frequency;
        self.sample_count = clip.samples;
        self.start_sample = setup.start_sample.min(clip.samples);
        self.loop_start_sample = setup.loop_start_sample.min(clip.samples);
        self.end_sample = setup.end_sample.min(clip.samples);
        self.is_loop = setup.is_loop;
        self.category_id = setup.category_id;

        for source in self.sources.iter_mut().flatten() {
            source.set_clip(Some(clip));
            source.set_output(setup.output);
            source.set_enabled(true);
        }
        self.clip = Some(clip.clone());

        self.internal_volume = self.settings.volume_range.clamp(setup.volume);
        self.internal_pitch = self.settings.pitch_range.clamp_magnitude(setup.pitch);
        self.external_volume = 1.0;
        self.external_pitch = 1.0;
        self.apply_volume();
        self.apply_pitch();
        true
    }

    /// Return to the pristine pooled state
    pub fn reset(&mut self) {
        self.stop();
        for source in self.sources.iter_mut().flatten() {
            source.set_clip(None);
            source.set_output(None);
        }
        self.clip = None;
        self.category_id = None;
        self.is_loop = false;
        self.frequency = 0;
        self.sample_count = 0;
        self.start_sample = 0;
        self.loop_start_sample = 0;
        self.end_sample = 0;
        self.internal_volume = 1.0;
        self.external_volume = 1.0;
        self.internal_pitch = 1.0;
        self.external_pitch = 1.0;
        self.segment_from = [0; 2];
        self.segment_starts = [0.0; 2];
        self.scheduled_ends = [0.0; 2];
        self.next_event_time = 0.0;
        self.pause_started_at = 0.0;
    }

    #[inline]
    fn has_sources(&self) -> bool {
        self.sources.iter().all(Option::is_some)
    }

    #[inline]
    fn is_ready(&self) -> bool {
        self.clip.is_some() && self.has_sources()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TRANSPORT
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn play(&mut self) {
        if !self.is_ready() {
            log::debug!("Player::play ignored: player is not set up");
            return;
        }
        let now = self.clock.dsp_time();

        for source in self.sources.iter_mut().flatten() {
            source.stop();
        }
        let is_loop = self.is_loop;
        if let Some(secondary) = self.sources[1].as_mut() {
            secondary.set_enabled(is_loop);
        }

        self.idle_index = 0;
        self.segment_count = 0;
        self.paused_index = None;
        self.state = PlayerState::Playing;
        self.schedule_segment(now + self.settings.start_delay_secs);
    }

    /// Stop both sources. Returns true when this call ended an active playback,
    /// so a caller can release resources exactly once.
    pub fn stop(&mut self) -> bool {
        let was_active = self.state != PlayerState::Stopped;
        for source in self.sources.iter_mut().flatten() {
            source.stop();
        }
        self.state = PlayerState::Stopped;
        self.segment_count = 0;
        self.idle_index = 0;
        self.paused_index = None;
        was_active
    }

    pub fn pause(&mut self) {
        if self.state != PlayerState::Playing || !self.is_ready() {
            return;
        }
        let now = self.clock.dsp_time();

        let paused = if self.is_loop {
            let audible = self.audible_index();
            let other = 1 - audible;
            if let Some(source) = self.sources[other].as_mut() {
                source.stop();
            }
            if audible != self.last_index() {
                // The following segment was already queued on `other`.
                // Un-queue it; resume will schedule it again.
                self.idle_index = other;
                self.segment_count = self.segment_count.saturating_sub(1).max(1);
                self.next_event_time = self.loop_event_time(audible);
            }
            audible
        } else {
            self.last_index()
        };

        if let Some(source) = self.sources[paused].as_mut() {
            source.pause();
        }
        self.paused_index = Some(paused);
        self.pause_started_at = now;
        self.state = PlayerState::Paused;
    }

    pub fn resume(&mut self) {
        if self.state != PlayerState::Paused {
            return;
        }
        let paused_for = (self.clock.dsp_time() - self.pause_started_at).max(0.0);

        // Without this shift loop boundaries drift by the pause length
        for i in 0..2 {
            self.segment_starts[i] += paused_for;
            self.scheduled_ends[i] += paused_for;
        }
        self.next_event_time += paused_for;

        if let Some(index) = self.paused_index.take() {
            let end = self.scheduled_ends[index];
            if let Some(source) = self.sources[index].as_mut() {
                source.unpause();
                source.set_scheduled_end(end);
            }
        }
        self.state = PlayerState::Playing;
        self.apply_volume();
    }

    /// Per-frame tick. Returns an event only when the next scheduling point
    /// was due.
    pub fn update(&mut self) -> Option<PlayerEvent> {
        if self.state != PlayerState::Playing {
            return None;
        }
        let now = self.clock.dsp_time();
        if now < self.next_event_time {
            // Keep fades audible
            self.apply_volume();
            return None;
        }

        if self.is_loop {
            let start = self.scheduled_ends[self.last_index()].max(now);
            self.schedule_segment(start);
            self.apply_volume();
            Some(PlayerEvent::Looped)
        } else {
            self.stop();
            Some(PlayerEvent::Ended)
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SCHEDULING
    // ═══════════════════════════════════════════════════════════════════════════

    #[inline]
    fn last_index(&self) -> usize {
        1 - self.idle_index
    }

    /// Wall-clock seconds to play `samples` at the applied pitch
    fn samples_to_secs(&self, samples: u64) -> f64 {
        if self.frequency == 0 {
            return 0.0;
        }
        let rate = (self.applied_pitch().abs() as f64).max(MIN_RATE);
        samples as f64 / self.frequency as f64 / rate
    }

    fn loop_event_time(&self, index: usize) -> f64 {
        (self.scheduled_ends[index] - self.settings.loop_lookahead_secs)
            .max(self.segment_starts[index])
    }

    fn schedule_segment(&mut self, start_time: f64) {
        let index = self.idle_index;
        let from = if self.segment_count == 0 {
            self.start_sample
        } else {
            self.loop_start_sample
        };
        let end_time = start_time + self.samples_to_secs(self.end_sample.abs_diff(from));

        let Some(source) = self.sources[index].as_mut() else {
            log::debug!("Player::schedule_segment: source {} missing", index);
            return;
        };
        source.set_time_samples(from);
        source.play_scheduled(start_time);
        source.set_scheduled_end(end_time);

        self.segment_from[index] = from;
        self.segment_starts[index] = start_time;
        self.scheduled_ends[index] = end_time;
        self.next_event_time = if self.is_loop {
            self.loop_event_time(index)
        } else {
            end_time
        };
        self.idle_index = 1 - index;
        self.segment_count += 1;
    }

    /// Source currently heard. Near a loop boundary both sources report
    /// playing; the one further into its buffer wins.
    fn audible_index(&self) -> usize {
        let playing: Vec<usize> = (0..2)
            .filter(|&i| self.sources[i].as_ref().is_some_and(|s| s.is_playing()))
            .collect();

        match playing.as_slice() {
            [] => self.last_index(),
            [only] => *only,
            _ => {
                let a = self.sources[0].as_ref().map_or(0, |s| s.time_samples());
                let b = self.sources[1].as_ref().map_or(0, |s| s.time_samples());
                if a != b {
                    if a > b { 0 } else { 1 }
                } else if self.segment_starts[0] <= self.segment_starts[1] {
                    0
                } else {
                    1
                }
            }
        }
    }

    /// Recompute the audible segment's end (and any queued segment) after a
    /// pitch change or seek, without restarting playback.
    fn rederive_schedule(&mut self) {
        if self.state == PlayerState::Stopped || !self.is_ready() {
            return;
        }
        let paused = self.state == PlayerState::Paused;
        let reference = if paused {
            self.pause_started_at
        } else {
            self.clock.dsp_time()
        };
        let audible = match self.paused_index {
            Some(index) if paused => index,
            _ => self.audible_index(),
        };

        let (base_time, remaining) = if reference < self.segment_starts[audible] {
            let from = self.segment_from[audible];
            (self.segment_starts[audible], self.end_sample.abs_diff(from))
        } else {
            let position = self.sources[audible]
                .as_ref()
                .map_or(self.end_sample, |s| s.time_samples());
            (reference, self.end_sample.abs_diff(position))
        };
        let new_end = base_time + self.samples_to_secs(remaining);
        self.scheduled_ends[audible] = new_end;
        if !paused {
            if let Some(source) = self.sources[audible].as_mut() {
                source.set_scheduled_end(new_end);
            }
        }

        if !self.is_loop {
            self.next_event_time = new_end;
            return;
        }

        if audible != self.last_index() {
            // Move the queued segment onto the new boundary
            let queued = self.last_index();
            let from = self.loop_start_sample;
            let queued_end = new_end + self.samples_to_secs(self.end_sample.abs_diff(from));
            if let Some(source) = self.sources[queued].as_mut() {
                source.set_time_samples(from);
                source.play_scheduled(new_end);
                source.set_scheduled_end(queued_end);
            }
            self.segment_from[queued] = from;
            self.segment_starts[queued] = new_end;
            self.scheduled_ends[queued] = queued_end;
            self.next_event_time = self.loop_event_time(queued);
        } else {
            self.next_event_time = self.loop_event_time(audible);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VOLUME / PITCH
    // ═══════════════════════════════════════════════════════════════════════════

    /// `clamp(internal * external)` over the configured volume range
    #[inline]
    pub fn applied_volume(&self) -> f32 {
        self.settings
            .volume_range
            .clamp(self.internal_volume * self.external_volume)
    }

    /// `internal * external` with its magnitude clamped; sign means direction
    #[inline]
    pub fn applied_pitch(&self) -> f32 {
        self.settings
            .pitch_range
            .clamp_magnitude(self.internal_pitch * self.external_pitch)
    }

    fn apply_volume(&mut self) {
        let volume = self.applied_volume();
        for source in self.sources.iter_mut().flatten() {
            source.set_volume(volume);
        }
    }

    fn apply_pitch(&mut self) {
        let pitch = self.applied_pitch();
        for source in self.sources.iter_mut().flatten() {
            source.set_pitch(pitch);
        }
    }

    pub fn volume(&self) -> f32 {
        self.external_volume
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.external_volume = self.settings.volume_range.clamp(volume);
        self.apply_volume();
    }

    pub fn internal_volume(&self) -> f32 {
        self.internal_volume
    }

    pub fn set_internal_volume(&mut self, volume: f32) {
        self.internal_volume = self.settings.volume_range.clamp(volume);
        self.apply_volume();
    }

    pub fn pitch(&self) -> f32 {
        self.external_pitch
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.external_pitch = self.settings.pitch_range.clamp_magnitude(pitch);
        self.apply_pitch();
        self.rederive_schedule();
    }

    pub fn internal_pitch(&self) -> f32 {
        self.internal_pitch
    }

    pub fn set_internal_pitch(&mut self, pitch: f32) {
        self.internal_pitch = self.settings.pitch_range.clamp_magnitude(pitch);
        self.apply_pitch();
        self.rederive_schedule();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    #[inline]
    pub fn state(&self) -> PlayerState {
        self.state
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }

    pub fn is_loop(&self) -> bool {
        self.is_loop
    }

    pub fn clip(&self) -> Option<&AudioClip> {
        self.clip.as_ref()
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Clock time of the next scheduling point (loop pre-schedule or end)
    pub fn next_event_time(&self) -> f64 {
        self.next_event_time
    }

    /// Segments scheduled since the last `play()`
    pub fn segment_count(&self) -> u32 {
        self.segment_count
    }

    /// Position of the audible source (0 when stopped or not set up)
    pub fn time_samples(&self) -> u64 {
        if self.state == PlayerState::Stopped {
            return 0;
        }
        let index = match self.paused_index {
            Some(index) => index,
            None => self.audible_index(),
        };
        self.sources[index].as_ref().map_or(0, |s| s.time_samples())
    }

    /// Seek the audible source; the scheduled end follows. Positions past
    /// the segment end clamp to it.
    pub fn set_time_samples(&mut self, samples: u64) {
        if self.state == PlayerState::Stopped || !self.is_ready() {
            return;
        }
        let samples = samples.min(self.end_sample);
        let index = match self.paused_index {
            Some(index) => index,
            None => self.audible_index(),
        };
        if let Some(source) = self.sources[index].as_mut() {
            source.set_time_samples(samples);
        }
        self.rederive_schedule();
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("clip", &self.clip.as_ref().map(|c| c.name.as_str()))
            .field("state", &self.state)
            .field("is_loop", &self.is_loop)
            .field("applied_volume", &self.applied_volume())
            .field("applied_pitch", &self.applied_pitch())
            .field("next_event_time", &self.next_event_time)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
