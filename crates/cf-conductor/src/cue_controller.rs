//! Public Facades
//!
//! [`CueController`] is one open cue (a session); [`TrackHandle`] is one
//! playing track (a lease). Both forward to the shared conductor and turn
//! stale handles into no-ops.

use std::sync::Arc;

use cf_core::{CategoryId, CueSheet};

use crate::conductor::TrackSelection;
use crate::handle::{LeaseHandle, SessionHandle};
use crate::player::PlayerState;
use crate::shared::ConductorHandle;

// ═══════════════════════════════════════════════════════════════════════════════
// CUE CONTROLLER
// ═══════════════════════════════════════════════════════════════════════════════

/// An open cue. Disposed on drop.
pub struct CueController {
    conductor: ConductorHandle,
    session: Option<SessionHandle>,
}

impl CueController {
    pub fn open_by_index(
        conductor: &ConductorHandle,
        sheet: &Arc<CueSheet>,
        cue_index: usize,
    ) -> Option<Self> {
        let session = conductor.lock().create_session(sheet, cue_index)?;
        Some(Self {
            conductor: conductor.clone(),
            session: Some(session),
        })
    }

    pub fn open_by_name(
        conductor: &ConductorHandle,
        sheet: &Arc<CueSheet>,
        cue_name: &str,
    ) -> Option<Self> {
        let session = conductor.lock().create_session_by_name(sheet, cue_name)?;
        Some(Self {
            conductor: conductor.clone(),
            session: Some(session),
        })
    }

    /// None once disposed
    pub fn session(&self) -> Option<SessionHandle> {
        self.session
    }

    fn play_with(&self, selection: TrackSelection<'_>, force_loop: bool) -> Option<TrackHandle> {
        let session = self.session?;
        let lease = self
            .conductor
            .lock()
            .play(session, selection, force_loop)?;
        Some(TrackHandle {
            conductor: self.conductor.clone(),
            lease,
        })
    }

    /// Play the track the cue's play type picks
    pub fn play(&self, force_loop: bool) -> Option<TrackHandle> {
        self.play_with(TrackSelection::Selector, force_loop)
    }

    /// Play the track after the previous `play_next`, in list order
    pub fn play_next(&self, force_loop: bool) -> Option<TrackHandle> {
        self.play_with(TrackSelection::Next, force_loop)
    }

    pub fn play_index(&self, index: usize, force_loop: bool) -> Option<TrackHandle> {
        self.play_with(TrackSelection::Index(index), force_loop)
    }

    pub fn play_name(&self, name: &str, force_loop: bool) -> Option<TrackHandle> {
        self.play_with(TrackSelection::Name(name), force_loop)
    }

    pub fn pause(&self) {
        if let Some(session) = self.session {
            self.conductor.lock().pause(session);
        }
    }

    pub fn resume(&self) {
        if let Some(session) = self.session {
            self.conductor.lock().resume(session);
        }
    }

    pub fn stop(&self, fade: bool) {
        if let Some(session) = self.session {
            self.conductor.lock().stop(session, fade);
        }
    }

    pub fn is_playing(&self) -> bool {
        self.session
            .is_some_and(|session| self.conductor.lock().is_playing(session))
    }

    pub fn volume(&self) -> f32 {
        self.session
            .and_then(|session| self.conductor.lock().session_volume(session))
            .unwrap_or(1.0)
    }

    pub fn set_volume(&self, volume: f32) {
        if let Some(session) = self.session {
            self.conductor.lock().set_volume(session, volume);
        }
    }

    pub fn pitch(&self) -> f32 {
        self.session
            .and_then(|session| self.conductor.lock().session_pitch(session))
            .unwrap_or(1.0)
    }

    pub fn set_pitch(&self, pitch: f32) {
        if let Some(session) = self.session {
            self.conductor.lock().set_pitch(session, pitch);
        }
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.session
            .and_then(|session| self.conductor.lock().session_category(session))
    }

    pub fn cue_name(&self) -> Option<String> {
        let session = self.session?;
        self.conductor
            .lock()
            .session_cue_name(session)
            .map(str::to_string)
    }

    /// Stop everything immediately and close the session
    pub fn dispose(&mut self) {
        if let Some(session) = self.session.take() {
            self.conductor.lock().dispose_session(session);
        }
    }
}

impl Drop for CueController {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for CueController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueController")
            .field("session", &self.session)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRACK HANDLE
// ═══════════════════════════════════════════════════════════════════════════════

/// One playing track. Outliving the playback is fine: calls become no-ops.
#[derive(Clone)]
pub struct TrackHandle {
    conductor: ConductorHandle,
    lease: LeaseHandle,
}

impl TrackHandle {
    #[inline]
    pub fn lease(&self) -> LeaseHandle {
        self.lease
    }

    pub fn pause(&self) {
        self.conductor.lock().pause_track(self.lease);
    }

    pub fn resume(&self) {
        self.conductor.lock().resume_track(self.lease);
    }

    pub fn stop(&self, fade: bool) {
        self.conductor.lock().stop_track(self.lease, fade);
    }

    pub fn is_playing(&self) -> bool {
        self.conductor.lock().track_is_playing(self.lease)
    }

    pub fn state(&self) -> PlayerState {
        self.conductor.lock().track_state(self.lease)
    }

    pub fn volume(&self) -> Option<f32> {
        self.conductor.lock().track_volume(self.lease)
    }

    pub fn set_volume(&self, volume: f32) {
        self.conductor.lock().set_track_volume(self.lease, volume);
    }

    pub fn pitch(&self) -> Option<f32> {
        self.conductor.lock().track_pitch(self.lease)
    }

    pub fn set_pitch(&self, pitch: f32) {
        self.conductor.lock().set_track_pitch(self.lease, pitch);
    }

    pub fn time_samples(&self) -> u64 {
        self.conductor.lock().track_time_samples(self.lease)
    }

    pub fn set_time_samples(&self, samples: u64) {
        self.conductor
            .lock()
            .set_track_time_samples(self.lease, samples);
    }
}

impl std::fmt::Debug for TrackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TrackHandle").field(&self.lease).finish()
    }
}
