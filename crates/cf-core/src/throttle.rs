//! Throttle Types
//!
//! Concurrency limits applied at cue, cue-sheet, category and global scope.

use serde::{Deserialize, Serialize};

/// What happens when a scope is at its concurrency limit and the
/// candidate has the same priority as the weakest playing sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ThrottleType {
    /// Evict the first lowest-priority incumbent in scope
    #[default]
    PriorityOrder = 0,
    /// Keep incumbents, reject the newcomer
    FirstComeFirstServed = 1,
}

impl ThrottleType {
    /// Convert from u8 index
    #[inline]
    pub fn from_index(index: u8) -> Self {
        match index {
            1 => ThrottleType::FirstComeFirstServed,
            _ => ThrottleType::PriorityOrder,
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ThrottleType::PriorityOrder => "Priority Order",
            ThrottleType::FirstComeFirstServed => "First Come First Served",
        }
    }
}

/// A `(type, limit)` pair read from one throttle scope.
///
/// A limit of 0 means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThrottleRule {
    pub throttle_type: ThrottleType,
    pub limit: u32,
}

impl ThrottleRule {
    pub const UNLIMITED: ThrottleRule = ThrottleRule {
        throttle_type: ThrottleType::PriorityOrder,
        limit: 0,
    };

    pub fn new(throttle_type: ThrottleType, limit: u32) -> Self {
        Self {
            throttle_type,
            limit,
        }
    }

    #[inline]
    pub fn is_limited(&self) -> bool {
        self.limit > 0
    }
}
