//! Runtime Settings
//!
//! Top-level configuration for the conductor:
//! - Global throttle rule
//! - Category table (output routing + per-category throttle)
//! - Player value ranges and scheduling timing
//! - Player pool sizing

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::category::{Category, CategoryId};
use crate::error::{CfError, CfResult};
use crate::range::ValueRange;
use crate::throttle::{ThrottleRule, ThrottleType};

/// Conductor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Global throttle type
    pub throttle_type: ThrottleType,
    /// Global concurrency limit (0 = unlimited)
    pub throttle_limit: u32,
    /// Category table
    pub categories: Vec<Category>,
    /// Player value ranges
    pub player: PlayerSettings,
    /// Player pool sizing
    pub pool: PoolSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            throttle_type: ThrottleType::PriorityOrder,
            throttle_limit: 0,
            categories: Vec::new(),
            player: PlayerSettings::default(),
            pool: PoolSettings::default(),
        }
    }
}

/// Player ranges and scheduling constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Applied volume range
    pub volume_range: ValueRange,
    /// Applied pitch magnitude range
    pub pitch_range: ValueRange,
    /// Lead time between `play()` and the first scheduled start (seconds)
    pub start_delay_secs: f64,
    /// How early the next loop segment is scheduled before the current one ends (seconds)
    pub loop_lookahead_secs: f64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            volume_range: ValueRange::VOLUME,
            pitch_range: ValueRange::PITCH,
            start_delay_secs: 0.1,
            loop_lookahead_secs: 0.1,
        }
    }
}

impl PlayerSettings {
    /// Ranges must be ordered (pitch magnitude non-negative), timings non-negative.
    pub fn validate(&self) -> CfResult<()> {
        if !self.volume_range.is_valid() {
            return Err(CfError::Config(format!(
                "volume range [{}, {}] is invalid",
                self.volume_range.min, self.volume_range.max
            )));
        }
        if !self.pitch_range.is_valid() || self.pitch_range.min < 0.0 {
            return Err(CfError::Config(format!(
                "pitch range [{}, {}] is invalid",
                self.pitch_range.min, self.pitch_range.max
            )));
        }
        if self.start_delay_secs < 0.0 || self.loop_lookahead_secs < 0.0 {
            return Err(CfError::Config(
                "player timing must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Player pool sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Players created up front
    pub initial_players: usize,
    /// Idle players retained after return (surplus is dropped)
    pub max_idle_players: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            initial_players: 8,
            max_idle_players: 64,
        }
    }
}

impl Settings {
    pub fn with_global_throttle(mut self, throttle_type: ThrottleType, limit: u32) -> Self {
        self.throttle_type = throttle_type;
        self.throttle_limit = limit;
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.categories.push(category);
        self
    }

    #[inline]
    pub fn throttle_rule(&self) -> ThrottleRule {
        ThrottleRule::new(self.throttle_type, self.throttle_limit)
    }

    pub fn find_category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Reject settings the runtime cannot honour.
    pub fn validate(&self) -> CfResult<()> {
        self.player.validate()?;

        let mut seen = HashSet::new();
        for category in &self.categories {
            if !seen.insert(category.id) {
                return Err(CfError::Config(format!(
                    "duplicate category id {}",
                    category.id
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate settings from JSON
    pub fn from_json_str(json: &str) -> CfResult<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from specified path
    pub fn load_from<P: AsRef<Path>>(path: P) -> CfResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json_str(&content)?;
        log::debug!(
            "Loaded settings from {:?} ({} categories)",
            path.as_ref(),
            settings.categories.len()
        );
        Ok(settings)
    }

    /// Save settings to specified path
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> CfResult<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
