//! Conductor Events
//!
//! Queued during conductor calls and drained by [`Conductor::update`] or
//! [`Conductor::take_events`].
//!
//! [`Conductor::update`]: crate::Conductor::update
//! [`Conductor::take_events`]: crate::Conductor::take_events

use crate::handle::{CueSheetHandle, LeaseHandle, SessionHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConductorEvent {
    /// Non-looping playback reached its end
    TrackEnded {
        lease: LeaseHandle,
        session: SessionHandle,
    },
    /// Explicit stop took effect (immediately, or when its fade-out finished)
    TrackStopped {
        lease: LeaseHandle,
        session: SessionHandle,
    },
    /// Stopped to admit a higher or equal priority request
    TrackEvicted {
        lease: LeaseHandle,
        session: SessionHandle,
    },
    /// Last session on a cue-sheet registration was disposed
    CueSheetUnused {
        cue_sheet: CueSheetHandle,
        name: String,
    },
}

impl ConductorEvent {
    /// Lease the event is about, if any
    pub fn lease(&self) -> Option<LeaseHandle> {
        match self {
            ConductorEvent::TrackEnded { lease, .. }
            | ConductorEvent::TrackStopped { lease, .. }
            | ConductorEvent::TrackEvicted { lease, .. } => Some(*lease),
            ConductorEvent::CueSheetUnused { .. } => None,
        }
    }
}
