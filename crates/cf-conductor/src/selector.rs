//! Track Selection
//!
//! Picks the next track of a cue:
//! - **Sequential**: cursor that wraps past the last track
//! - **Random**: weighted by `Track::random_weight`, uniform when no weights are set

use cf_core::{PlayType, Track};
use rand::Rng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSelector {
    Sequential {
        /// Last returned index (None = before the first track)
        cursor: Option<usize>,
        len: usize,
    },
    Random {
        weights: Vec<u32>,
        total_weight: u64,
    },
}

impl TrackSelector {
    pub fn sequential() -> Self {
        TrackSelector::Sequential {
            cursor: None,
            len: 0,
        }
    }

    pub fn random() -> Self {
        TrackSelector::Random {
            weights: Vec::new(),
            total_weight: 0,
        }
    }

    /// Selector for a cue's play type, already set up with its tracks
    pub fn for_tracks(play_type: PlayType, tracks: &[Track]) -> Self {
        let mut selector = match play_type {
            PlayType::Sequential => Self::sequential(),
            PlayType::Random => Self::random(),
        };
        selector.setup(tracks);
        selector
    }

    pub fn setup(&mut self, tracks: &[Track]) {
        match self {
            TrackSelector::Sequential { cursor, len } => {
                *cursor = None;
                *len = tracks.len();
            }
            TrackSelector::Random {
                weights,
                total_weight,
            } => {
                *weights = tracks.iter().map(|t| t.random_weight).collect();
                *total_weight = weights.iter().map(|&w| w as u64).sum();
            }
        }
    }

    /// Next track index, or None for an empty track list
    pub fn next_index<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        match self {
            TrackSelector::Sequential { cursor, len } => {
                if *len == 0 {
                    return None;
                }
                let next = match *cursor {
                    Some(current) if current + 1 < *len => current + 1,
                    _ => 0,
                };
                *cursor = Some(next);
                Some(next)
            }
            TrackSelector::Random {
                weights,
                total_weight,
            } => {
                if weights.is_empty() {
                    return None;
                }
                // Nobody assigned weights: pure random
                if *total_weight == 0 {
                    return Some(rng.random_range(0..weights.len()));
                }

                let draw = rng.random_range(0..*total_weight);
                let mut cumulative = 0u64;
                for (index, &weight) in weights.iter().enumerate() {
                    cumulative += weight as u64;
                    if cumulative > draw {
                        return Some(index);
                    }
                }
                // Unreachable while draw < total_weight
                Some(weights.len() - 1)
            }
        }
    }

    pub fn reset(&mut self) {
        if let TrackSelector::Sequential { cursor, .. } = self {
            *cursor = None;
        }
    }
}
