//! CueForge Conductor
//!
//! Playback scheduling and throttling core:
//! - Per-request throttle admission over cue, cue-sheet, category and global scopes
//! - Gapless looping by alternating two host sources per player
//! - Pause/resume with loop-boundary compensation
//! - Linear fades, pooled players, event queue instead of callbacks
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      CONDUCTOR ARCHITECTURE                       │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                   │
//! │   Game / Editor code                                              │
//! │   ┌────────────────┐   ┌─────────────┐                            │
//! │   │ CueController  │──▶│ TrackHandle │                            │
//! │   └───────┬────────┘   └──────┬──────┘                            │
//! │           │  ConductorHandle (Arc<Mutex<Conductor>>)              │
//! │           ▼                   ▼                                   │
//! │   ┌──────────────────────────────────────────────────────────┐    │
//! │   │ Conductor                                                 │    │
//! │   │  sessions ─▶ TrackSelector                                │    │
//! │   │  play ─▶ throttle::admit ─▶ PlayerPool ─▶ TrackController │    │
//! │   │  update(dt) ─▶ Player::update, Fade::tick ─▶ events       │    │
//! │   └──────────────────────────────┬───────────────────────────┘    │
//! │                                  ▼                                │
//! │                  Player ─▶ [AudioSource A, AudioSource B]         │
//! │                              (host primitive, DspClock)           │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cf_conductor::{Conductor, ConductorHandle, CueController, VirtualHost};
//! use cf_core::{CueSheet, Settings};
//!
//! let host = VirtualHost::new();
//! let conductor = ConductorHandle::new(Conductor::new(
//!     Settings::default(),
//!     Box::new(host.factory()),
//!     host.clock(),
//! ));
//!
//! let sheet = Arc::new(CueSheet::load_from("ui.json")?);
//! let cue = CueController::open_by_name(&conductor, &sheet, "click").unwrap();
//! let track = cue.play(false);
//!
//! // Once per frame
//! for event in conductor.update(1.0 / 60.0) {
//!     log::info!("{:?}", event);
//! }
//! ```

#![allow(clippy::new_without_default)]

pub mod conductor;
pub mod cue_controller;
pub mod events;
pub mod fade;
pub mod handle;
pub mod host;
pub mod player;
pub mod pool;
pub mod selector;
pub mod shared;
pub mod throttle;
pub mod track_controller;
pub mod virtual_host;

// Re-exports
pub use conductor::{Conductor, TrackSelection};
pub use cue_controller::{CueController, TrackHandle};
pub use events::ConductorEvent;
pub use fade::Fade;
pub use handle::{
    CueSheetHandle, HANDLE_RESTART, INVALID_HANDLE, LeaseHandle, SessionHandle,
    UnmanagedPlayerHandle,
};
pub use host::{AudioSource, DspClock, SharedClock, SourceFactory};
pub use player::{Player, PlayerEvent, PlayerSetup, PlayerState};
pub use pool::{PlayerPool, PoolStats};
pub use selector::TrackSelector;
pub use shared::ConductorHandle;
pub use throttle::{
    Admission, Candidate, LeaseInfo, RejectReason, ScopeRules, ThrottleScope, admit,
};
pub use track_controller::{LeaseOrigin, TrackController};
pub use virtual_host::{
    VirtualClock, VirtualHost, VirtualSource, VirtualSourceFactory, VirtualSourceProbe,
    VirtualSourceState,
};
