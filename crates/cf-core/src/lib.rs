//! cf-core: Shared types for CueForge
//!
//! Cue-sheet data model, categories, throttle rules, runtime settings and the
//! parameter calculator used by the conductor.

mod calc;
mod category;
mod cue_sheet;
mod error;
mod range;
mod settings;
mod throttle;

pub use calc::*;
pub use category::*;
pub use cue_sheet::*;
pub use error::*;
pub use range::*;
pub use settings::*;
pub use throttle::*;
