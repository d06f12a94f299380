//! Cue Sheet Data Model
//!
//! A cue sheet owns cues, a cue owns tracks. Each level carries playback
//! parameters that the [`Calculator`](crate::Calculator) composes at play time.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::category::CategoryId;
use crate::error::CfResult;
use crate::throttle::{ThrottleRule, ThrottleType};

// ═══════════════════════════════════════════════════════════════════════════════
// AUDIO CLIP
// ═══════════════════════════════════════════════════════════════════════════════

/// Host-side audio buffer description.
///
/// Sample data stays with the host; the runtime only needs timing facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioClip {
    pub name: String,
    /// Sample rate (Hz)
    pub frequency: u32,
    /// Length in sample frames
    pub samples: u64,
    pub channels: u16,
}

impl AudioClip {
    pub fn new(name: impl Into<String>, frequency: u32, samples: u64) -> Self {
        Self {
            name: name.into(),
            frequency,
            samples,
            channels: 2,
        }
    }

    /// Duration at unity pitch
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.frequency == 0 {
            return 0.0;
        }
        self.samples as f64 / self.frequency as f64
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLAY TYPE
// ═══════════════════════════════════════════════════════════════════════════════

/// How a cue picks its next track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlayType {
    #[default]
    Sequential = 0,
    /// Weighted random by `Track::random_weight`
    Random = 1,
}

impl PlayType {
    #[inline]
    pub fn from_index(index: u8) -> Self {
        match index {
            1 => PlayType::Random,
            _ => PlayType::Sequential,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRACK
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Track {
    pub name: String,
    /// None is a valid "empty track" authoring state
    pub clip: Option<AudioClip>,
    pub start_sample: u64,
    /// 0 = end of clip
    pub end_sample: u64,
    pub loop_start_sample: u64,
    pub is_loop: bool,
    pub volume: f32,
    pub volume_range: f32,
    pub pitch: f32,
    pub pitch_range: f32,
    pub pitch_invert: bool,
    pub random_weight: u32,
    /// Higher survives throttling longer
    pub priority: i32,
    /// Fade-in / fade-out time in seconds (0 = none)
    pub fade_time: f32,
}

impl Default for Track {
    fn default() -> Self {
        Self {
            name: String::new(),
            clip: None,
            start_sample: 0,
            end_sample: 0,
            loop_start_sample: 0,
            is_loop: false,
            volume: 1.0,
            volume_range: 0.0,
            pitch: 1.0,
            pitch_range: 0.0,
            pitch_invert: false,
            random_weight: 0,
            priority: 0,
            fade_time: 0.0,
        }
    }
}

impl Track {
    pub fn new(name: impl Into<String>, clip: Option<AudioClip>) -> Self {
        Self {
            name: name.into(),
            clip,
            ..Default::default()
        }
    }

    pub fn with_loop(mut self, is_loop: bool) -> Self {
        self.is_loop = is_loop;
        self
    }

    pub fn with_samples(mut self, start: u64, loop_start: u64, end: u64) -> Self {
        self.start_sample = start;
        self.loop_start_sample = loop_start;
        self.end_sample = end;
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.random_weight = weight;
        self
    }

    pub fn with_fade_time(mut self, fade_time: f32) -> Self {
        self.fade_time = fade_time.max(0.0);
        self
    }

    /// End sample with the "0 = clip end" convention resolved.
    pub fn resolved_end_sample(&self) -> u64 {
        match &self.clip {
            Some(clip) if self.end_sample == 0 => clip.samples,
            _ => self.end_sample,
        }
    }

    #[inline]
    pub fn has_fade(&self) -> bool {
        self.fade_time > 0.0
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CUE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cue {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub volume: f32,
    pub volume_range: f32,
    pub pitch: f32,
    pub pitch_range: f32,
    pub pitch_invert: bool,
    pub throttle_type: ThrottleType,
    /// 0 = unlimited
    pub throttle_limit: u32,
    pub play_type: PlayType,
    pub tracks: Vec<Track>,
}

impl Default for Cue {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            category_id: None,
            volume: 1.0,
            volume_range: 0.0,
            pitch: 1.0,
            pitch_range: 0.0,
            pitch_invert: false,
            throttle_type: ThrottleType::PriorityOrder,
            throttle_limit: 0,
            play_type: PlayType::Sequential,
            tracks: Vec::new(),
        }
    }
}

impl Cue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_play_type(mut self, play_type: PlayType) -> Self {
        self.play_type = play_type;
        self
    }

    pub fn with_throttle(mut self, throttle_type: ThrottleType, limit: u32) -> Self {
        self.throttle_type = throttle_type;
        self.throttle_limit = limit;
        self
    }

    pub fn with_track(mut self, track: Track) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn track_index(&self, name: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.name == name)
    }

    #[inline]
    pub fn throttle_rule(&self) -> ThrottleRule {
        ThrottleRule::new(self.throttle_type, self.throttle_limit)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CUE SHEET
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueSheet {
    pub name: String,
    pub volume: f32,
    pub pitch: f32,
    pub pitch_invert: bool,
    pub throttle_type: ThrottleType,
    /// 0 = unlimited
    pub throttle_limit: u32,
    pub cues: Vec<Cue>,
}

impl Default for CueSheet {
    fn default() -> Self {
        Self {
            name: String::new(),
            volume: 1.0,
            pitch: 1.0,
            pitch_invert: false,
            throttle_type: ThrottleType::PriorityOrder,
            throttle_limit: 0,
            cues: Vec::new(),
        }
    }
}

impl CueSheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_throttle(mut self, throttle_type: ThrottleType, limit: u32) -> Self {
        self.throttle_type = throttle_type;
        self.throttle_limit = limit;
        self
    }

    pub fn with_cue(mut self, cue: Cue) -> Self {
        self.cues.push(cue);
        self
    }

    pub fn add_cue(&mut self, cue: Cue) {
        self.cues.push(cue);
    }

    pub fn cue_index(&self, name: &str) -> Option<usize> {
        self.cues.iter().position(|c| c.name == name)
    }

    pub fn cue_by_name(&self, name: &str) -> Option<&Cue> {
        self.cues.iter().find(|c| c.name == name)
    }

    #[inline]
    pub fn throttle_rule(&self) -> ThrottleRule {
        ThrottleRule::new(self.throttle_type, self.throttle_limit)
    }

    pub fn from_json_str(json: &str) -> CfResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> CfResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_sheet() -> CueSheet {
        CueSheet::new("sfx").with_cue(
            Cue::new("footstep")
                .with_category(2)
                .with_track(Track::new("a", Some(AudioClip::new("a.wav", 48000, 4800))))
                .with_track(Track::new("b", None)),
        )
    }

    #[test]
    fn test_lookup_by_name() {
        let sheet = test_sheet();
        assert_eq!(sheet.cue_index("footstep"), Some(0));
        assert_eq!(sheet.cue_index("missing"), None);

        let cue = sheet.cue_by_name("footstep").unwrap();
        assert_eq!(cue.track_index("b"), Some(1));
        assert_eq!(cue.category_id, Some(2));
    }

    #[test]
    fn test_resolved_end_sample() {
        let clip = AudioClip::new("x", 48000, 1000);
        assert_eq!(Track::new("t", Some(clip.clone())).resolved_end_sample(), 1000);
        assert_eq!(
            Track::new("t", Some(clip)).with_samples(0, 0, 600).resolved_end_sample(),
            600
        );
        assert_eq!(Track::new("empty", None).resolved_end_sample(), 0);
    }

    #[test]
    fn test_json_defaults_fill_missing_fields() {
        let json = r#"{
            "name": "bgm",
            "cues": [ { "name": "title", "tracks": [ { "name": "loop", "is_loop": true } ] } ]
        }"#;
        let sheet = CueSheet::from_json_str(json).unwrap();

        assert_eq!(sheet.volume, 1.0);
        let track = &sheet.cues[0].tracks[0];
        assert!(track.is_loop);
        assert_eq!(track.pitch, 1.0);
        assert!(track.clip.is_none());
    }

    #[test]
    fn test_clip_duration() {
        let clip = AudioClip::new("x", 44100, 88200);
        assert!((clip.duration_secs() - 2.0).abs() < 1e-9);
        assert_eq!(AudioClip::new("bad", 0, 10).duration_secs(), 0.0);
    }
}
