//! Categories: output routing plus a throttle rule, independent of cue sheets.

use serde::{Deserialize, Serialize};

use crate::throttle::{ThrottleRule, ThrottleType};

pub type CategoryId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// Output bus the host routes this category to (None = default output)
    pub output_bus: Option<String>,
    pub throttle_type: ThrottleType,
    /// 0 = unlimited
    pub throttle_limit: u32,
}

impl Default for Category {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            output_bus: None,
            throttle_type: ThrottleType::PriorityOrder,
            throttle_limit: 0,
        }
    }
}

impl Category {
    pub fn new(id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_output_bus(mut self, bus: impl Into<String>) -> Self {
        self.output_bus = Some(bus.into());
        self
    }

    pub fn with_throttle(mut self, throttle_type: ThrottleType, limit: u32) -> Self {
        self.throttle_type = throttle_type;
        self.throttle_limit = limit;
        self
    }

    #[inline]
    pub fn throttle_rule(&self) -> ThrottleRule {
        ThrottleRule::new(self.throttle_type, self.throttle_limit)
    }
}
