//! Virtual Host
//!
//! Headless implementation of the host audio primitive. Time only moves
//! when [`VirtualClock::advance`] is called, which makes scheduling fully
//! deterministic for tests and offline simulation.
//!
//! Behaviour follows the platform sources the conductor is written against:
//! - a source reports playing from `play_scheduled` until its scheduled end
//! - position advances at `frequency * |pitch|` once the start time passes
//! - `unpause` does not move the scheduled end

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cf_core::AudioClip;
use parking_lot::Mutex;

use crate::host::{AudioSource, DspClock, SourceFactory};

// ═══════════════════════════════════════════════════════════════════════════════
// CLOCK
// ═══════════════════════════════════════════════════════════════════════════════

/// Manually advanced clock (seconds stored as f64 bits)
#[derive(Debug)]
pub struct VirtualClock {
    bits: AtomicU64,
}

impl VirtualClock {
    pub fn new(start: f64) -> Self {
        Self {
            bits: AtomicU64::new(start.to_bits()),
        }
    }

    #[inline]
    pub fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    pub fn set(&self, time: f64) {
        self.bits.store(time.to_bits(), Ordering::Release);
    }

    pub fn advance(&self, delta: f64) {
        self.set(self.now() + delta);
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl DspClock for VirtualClock {
    fn dsp_time(&self) -> f64 {
        self.now()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Observable state of one virtual source
#[derive(Debug, Clone)]
pub struct VirtualSourceState {
    pub clip: Option<AudioClip>,
    pub output: Option<String>,
    pub enabled: bool,
    pub volume: f32,
    pub pitch: f32,
    /// Clock time playback starts (or started)
    pub scheduled_start: Option<f64>,
    pub scheduled_end: Option<f64>,
    pub paused_at: Option<f64>,
    /// Position at `scheduled_start`
    pub start_sample: u64,
    /// Number of `play_scheduled` calls
    pub play_count: u32,
}

impl Default for VirtualSourceState {
    fn default() -> Self {
        Self {
            clip: None,
            output: None,
            enabled: true,
            volume: 1.0,
            pitch: 1.0,
            scheduled_start: None,
            scheduled_end: None,
            paused_at: None,
            start_sample: 0,
            play_count: 0,
        }
    }
}

impl VirtualSourceState {
    fn is_playing_at(&self, now: f64) -> bool {
        self.clip.is_some()
            && self.scheduled_start.is_some()
            && self.paused_at.is_none()
            && self.scheduled_end.is_none_or(|end| now < end)
    }

    fn position_at(&self, now: f64) -> u64 {
        let (Some(start), Some(clip)) = (self.scheduled_start, &self.clip) else {
            return self.start_sample;
        };
        let mut t = self.paused_at.unwrap_or(now);
        if let Some(end) = self.scheduled_end {
            t = t.min(end);
        }
        let elapsed = (t - start).max(0.0);
        let advanced = (elapsed * clip.frequency as f64 * self.pitch.abs() as f64) as u64;
        (self.start_sample + advanced).min(clip.samples)
    }

    /// Freeze the current position as the new origin
    fn rebase(&mut self, now: f64) {
        let Some(start) = self.scheduled_start else {
            return;
        };
        let at = self.paused_at.unwrap_or(now);
        if at > start {
            self.start_sample = self.position_at(now);
            self.scheduled_start = Some(at);
        }
    }
}

/// Shared view of a virtual source, kept by [`VirtualHost`] for inspection
pub type VirtualSourceProbe = Arc<Mutex<VirtualSourceState>>;

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE
// ═══════════════════════════════════════════════════════════════════════════════

pub struct VirtualSource {
    clock: Arc<VirtualClock>,
    state: VirtualSourceProbe,
}

impl VirtualSource {
    pub fn new(clock: Arc<VirtualClock>) -> Self {
        Self {
            clock,
            state: Arc::new(Mutex::new(VirtualSourceState::default())),
        }
    }

    pub fn probe(&self) -> VirtualSourceProbe {
        Arc::clone(&self.state)
    }
}

impl AudioSource for VirtualSource {
    fn set_clip(&mut self, clip: Option<&AudioClip>) {
        let mut state = self.state.lock();
        state.clip = clip.cloned();
        state.start_sample = 0;
    }

    fn set_output(&mut self, bus: Option<&str>) {
        self.state.lock().output = bus.map(str::to_string);
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.state.lock().enabled = enabled;
    }

    fn play_scheduled(&mut self, time: f64) {
        let mut state = self.state.lock();
        state.scheduled_start = Some(time);
        state.scheduled_end = None;
        state.paused_at = None;
        state.play_count += 1;
    }

    fn set_scheduled_end(&mut self, time: f64) {
        let mut state = self.state.lock();
        if state.scheduled_start.is_some() {
            state.scheduled_end = Some(time);
        }
    }

    fn pause(&mut self) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        if state.is_playing_at(now) {
            state.paused_at = Some(now);
        }
    }

    fn unpause(&mut self) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let Some(paused_at) = state.paused_at.take() else {
            return;
        };
        if let Some(start) = state.scheduled_start {
            // Time spent paused does not count as playback; the end stays put.
            state.scheduled_start = Some(start + (now - paused_at).max(0.0));
        }
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        state.scheduled_start = None;
        state.scheduled_end = None;
        state.paused_at = None;
        state.start_sample = 0;
    }

    fn time_samples(&self) -> u64 {
        self.state.lock().position_at(self.clock.now())
    }

    fn set_time_samples(&mut self, samples: u64) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.rebase(now);
        let limit = state.clip.as_ref().map_or(u64::MAX, |clip| clip.samples);
        state.start_sample = samples.min(limit);
    }

    fn is_playing(&self) -> bool {
        self.state.lock().is_playing_at(self.clock.now())
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.lock().volume = volume;
    }

    fn set_pitch(&mut self, pitch: f32) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        state.rebase(now);
        state.pitch = pitch;
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HOST + FACTORY
// ═══════════════════════════════════════════════════════════════════════════════

/// Clock plus a registry of every source created through its factories
#[derive(Clone)]
pub struct VirtualHost {
    clock: Arc<VirtualClock>,
    sources: Arc<Mutex<Vec<VirtualSourceProbe>>>,
}

impl VirtualHost {
    pub fn new() -> Self {
        Self {
            clock: Arc::new(VirtualClock::default()),
            sources: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn clock(&self) -> Arc<VirtualClock> {
        Arc::clone(&self.clock)
    }

    pub fn factory(&self) -> VirtualSourceFactory {
        VirtualSourceFactory {
            clock: Arc::clone(&self.clock),
            sources: Arc::clone(&self.sources),
            fail: false,
        }
    }

    /// Factory that never produces a source
    pub fn failing_factory(&self) -> VirtualSourceFactory {
        VirtualSourceFactory {
            fail: true,
            ..self.factory()
        }
    }

    /// Probes of all sources created so far, in creation order
    pub fn sources(&self) -> Vec<VirtualSourceProbe> {
        self.sources.lock().clone()
    }

    /// Number of sources currently reporting playing
    pub fn playing_count(&self) -> usize {
        let now = self.clock.now();
        self.sources
            .lock()
            .iter()
            .filter(|s| s.lock().is_playing_at(now))
            .count()
    }

    pub fn advance(&self, delta: f64) {
        self.clock.advance(delta);
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }
}

impl Default for VirtualHost {
    fn default() -> Self {
        Self::new()
    }
}

pub struct VirtualSourceFactory {
    clock: Arc<VirtualClock>,
    sources: Arc<Mutex<Vec<VirtualSourceProbe>>>,
    fail: bool,
}

impl SourceFactory for VirtualSourceFactory {
    fn create_source(&mut self) -> Option<Box<dyn AudioSource>> {
        if self.fail {
            return None;
        }
        let source = VirtualSource::new(Arc::clone(&self.clock));
        self.sources.lock().push(source.probe());
        Some(Box::new(source))
    }
}
