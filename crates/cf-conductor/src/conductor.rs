//! Conductor
//!
//! Owns every runtime table: cue-sheet registrations, sessions, active
//! leases, fades, rented players and the player pool. All mutation goes
//! through `&mut self`; wrap it in [`ConductorHandle`](crate::ConductorHandle)
//! to share it between threads.
//!
//! ## Lease lifecycle
//!
//! ```text
//! play() ──► throttle::admit ──► pool.rent ──► leases
//!                                               │
//!        natural end / stop / eviction ◄────────┤
//!                      │                        │ stop(fade)
//!                      ▼                        ▼
//!                pool.give_back ◄──────── retiring (fading out,
//!                                          not counted by throttle)
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cf_core::{Calculator, CategoryId, CueSheet, PlayerSettings, Settings};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::events::ConductorEvent;
use crate::fade::Fade;
use crate::handle::{
    CueSheetHandle, HandleCounter, LeaseHandle, SessionHandle, UnmanagedPlayerHandle,
};
use crate::host::{SharedClock, SourceFactory};
use crate::player::{Player, PlayerEvent, PlayerSetup, PlayerState};
use crate::pool::{PlayerPool, PoolStats};
use crate::selector::TrackSelector;
use crate::throttle::{self, Admission, Candidate, LeaseInfo, ScopeRules};
use crate::track_controller::{LeaseOrigin, TrackController};

// ═══════════════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Which track of the session's cue to play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSelection<'a> {
    /// Ask the cue's selector (sequential or weighted random)
    Selector,
    /// The track after the one last picked by `Next`, wrapping
    Next,
    Index(usize),
    Name(&'a str),
}

struct CueSheetEntry {
    sheet: Arc<CueSheet>,
    sessions: usize,
}

struct Session {
    cue_sheet: CueSheetHandle,
    cue_index: usize,
    selector: TrackSelector,
    sequence: TrackSelector,
    volume: f32,
    pitch: f32,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONDUCTOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Invalid player ranges or timings fall back to the defaults; a repeated
/// category id keeps its first definition.
fn checked_settings(mut settings: Settings) -> Settings {
    if let Err(err) = settings.player.validate() {
        log::error!("[Conductor] {}; using default player settings", err);
        settings.player = PlayerSettings::default();
    }
    let mut seen = HashSet::new();
    settings.categories.retain(|category| {
        let first = seen.insert(category.id);
        if !first {
            log::error!("[Conductor] Ignoring duplicate category id {}", category.id);
        }
        first
    });
    settings
}

pub struct Conductor {
    settings: Settings,
    pool: PlayerPool,
    rng: StdRng,
    cue_sheets: HashMap<CueSheetHandle, CueSheetEntry>,
    sessions: HashMap<SessionHandle, Session>,
    /// Active leases in start order
    leases: Vec<TrackController>,
    /// Stopped with a fade, still audible
    retiring: Vec<TrackController>,
    fades: Vec<Fade>,
    unmanaged: Vec<(UnmanagedPlayerHandle, Player)>,
    session_ids: HandleCounter,
    lease_ids: HandleCounter,
    cue_sheet_ids: HandleCounter,
    player_ids: HandleCounter,
    pending_events: Vec<ConductorEvent>,
}

impl Conductor {
    /// Create a conductor with an OS-seeded RNG
    pub fn new(settings: Settings, factory: Box<dyn SourceFactory>, clock: SharedClock) -> Self {
        Self::with_rng(settings, factory, clock, StdRng::from_os_rng())
    }

    /// Create a conductor with a fixed seed (reproducible track picks and
    /// volume/pitch deviation)
    pub fn with_seed(
        settings: Settings,
        factory: Box<dyn SourceFactory>,
        clock: SharedClock,
        seed: u64,
    ) -> Self {
        Self::with_rng(settings, factory, clock, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        settings: Settings,
        factory: Box<dyn SourceFactory>,
        clock: SharedClock,
        rng: StdRng,
    ) -> Self {
        let settings = checked_settings(settings);
        let pool = PlayerPool::new(factory, clock, settings.player.clone(), &settings.pool);
        Self {
            settings,
            pool,
            rng,
            cue_sheets: HashMap::new(),
            sessions: HashMap::new(),
            leases: Vec::new(),
            retiring: Vec::new(),
            fades: Vec::new(),
            unmanaged: Vec::new(),
            session_ids: HandleCounter::new(),
            lease_ids: HandleCounter::new(),
            cue_sheet_ids: HandleCounter::new(),
            player_ids: HandleCounter::new(),
            pending_events: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SESSIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Registration for `sheet`, reusing one made for the same `Arc`
    fn register_cue_sheet(&mut self, sheet: &Arc<CueSheet>) -> CueSheetHandle {
        let existing = self
            .cue_sheets
            .iter()
            .find(|(_, entry)| Arc::ptr_eq(&entry.sheet, sheet))
            .map(|(handle, _)| *handle);
        if let Some(handle) = existing {
            return handle;
        }

        let handle = CueSheetHandle::from_raw(self.cue_sheet_ids.next_raw());
        self.cue_sheets.insert(
            handle,
            CueSheetEntry {
                sheet: Arc::clone(sheet),
                sessions: 0,
            },
        );
        log::debug!("[Conductor] Registered cue sheet '{}' as {}", sheet.name, handle);
        handle
    }

    /// Open a session on one cue of `sheet`
    pub fn create_session(
        &mut self,
        sheet: &Arc<CueSheet>,
        cue_index: usize,
    ) -> Option<SessionHandle> {
        let Some(cue) = sheet.cues.get(cue_index) else {
            log::warn!(
                "[Conductor] Cue sheet '{}' has no cue at index {}",
                sheet.name,
                cue_index
            );
            return None;
        };
        let selector = TrackSelector::for_tracks(cue.play_type, &cue.tracks);
        let mut sequence = TrackSelector::sequential();
        sequence.setup(&cue.tracks);

        let cue_sheet = self.register_cue_sheet(sheet);
        if let Some(entry) = self.cue_sheets.get_mut(&cue_sheet) {
            entry.sessions += 1;
        }

        let handle = SessionHandle::from_raw(self.session_ids.next_raw());
        self.sessions.insert(
            handle,
            Session {
                cue_sheet,
                cue_index,
                selector,
                sequence,
                volume: 1.0,
                pitch: 1.0,
            },
        );
        Some(handle)
    }

    /// Open a session on the cue named `cue_name`
    pub fn create_session_by_name(
        &mut self,
        sheet: &Arc<CueSheet>,
        cue_name: &str,
    ) -> Option<SessionHandle> {
        match sheet.cue_index(cue_name) {
            Some(index) => self.create_session(sheet, index),
            None => {
                log::warn!("[Conductor] Cue sheet '{}' has no cue '{}'", sheet.name, cue_name);
                None
            }
        }
    }

    /// Stop every lease of the session immediately and close it
    pub fn dispose_session(&mut self, handle: SessionHandle) {
        let Some(session) = self.sessions.remove(&handle) else {
            log::warn!("[Conductor] dispose_session: unknown {}", handle);
            return;
        };

        let owned: Vec<LeaseHandle> = self
            .leases
            .iter()
            .chain(self.retiring.iter())
            .filter(|controller| controller.session() == handle)
            .map(TrackController::lease)
            .collect();
        for lease in owned {
            self.stop_lease(lease, false);
        }

        let unused = match self.cue_sheets.get_mut(&session.cue_sheet) {
            Some(entry) => {
                entry.sessions = entry.sessions.saturating_sub(1);
                entry.sessions == 0
            }
            None => false,
        };
        if unused {
            if let Some(entry) = self.cue_sheets.remove(&session.cue_sheet) {
                log::debug!("[Conductor] Cue sheet '{}' unused", entry.sheet.name);
                self.pending_events.push(ConductorEvent::CueSheetUnused {
                    cue_sheet: session.cue_sheet,
                    name: entry.sheet.name.clone(),
                });
            }
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn cue_sheet_count(&self) -> usize {
        self.cue_sheets.len()
    }

    /// Registration a session is bound to
    pub fn session_cue_sheet(&self, session: SessionHandle) -> Option<CueSheetHandle> {
        self.sessions.get(&session).map(|s| s.cue_sheet)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PLAY
    // ═══════════════════════════════════════════════════════════════════════════

    /// Start a track of the session's cue.
    ///
    /// Returns None without side effects when the track has no clip or the
    /// throttle rejects it.
    pub fn play(
        &mut self,
        handle: SessionHandle,
        selection: TrackSelection<'_>,
        force_loop: bool,
    ) -> Option<LeaseHandle> {
        let Some(session) = self.sessions.get_mut(&handle) else {
            log::warn!("[Conductor] play: unknown {}", handle);
            return None;
        };
        let cue_sheet = session.cue_sheet;
        let cue_index = session.cue_index;
        let (session_volume, session_pitch) = (session.volume, session.pitch);

        let sheet = match self.cue_sheets.get(&cue_sheet) {
            Some(entry) => Arc::clone(&entry.sheet),
            None => {
                log::warn!("[Conductor] play: {} lost its cue sheet {}", handle, cue_sheet);
                return None;
            }
        };
        let cue = sheet.cues.get(cue_index)?;

        let track_index = match selection {
            TrackSelection::Selector => session.selector.next_index(&mut self.rng),
            TrackSelection::Next => session.sequence.next_index(&mut self.rng),
            TrackSelection::Index(index) => (index < cue.tracks.len()).then_some(index),
            TrackSelection::Name(name) => cue.track_index(name),
        };
        let Some(track_index) = track_index else {
            log::warn!("[Conductor] play: cue '{}' has no track for {:?}", cue.name, selection);
            return None;
        };
        let track = &cue.tracks[track_index];
        let Some(clip) = track.clip.as_ref() else {
            log::debug!("[Conductor] play: track '{}' has no clip", track.name);
            return None;
        };

        // 1. Throttle
        let category = cue
            .category_id
            .and_then(|id| self.settings.find_category(id));
        let rules = ScopeRules {
            cue: cue.throttle_rule(),
            cue_sheet: sheet.throttle_rule(),
            category: category.map(|c| c.throttle_rule()),
            global: self.settings.throttle_rule(),
        };
        let candidate = Candidate {
            cue_sheet,
            cue_index,
            category_id: cue.category_id,
            priority: track.priority,
        };
        let snapshot: Vec<LeaseInfo> = self.leases.iter().map(TrackController::info).collect();
        let evict = match throttle::admit(&snapshot, &candidate, &rules) {
            Admission::Admitted { evict } => evict,
            Admission::Rejected { scope, reason } => {
                log::debug!(
                    "[Conductor] Throttled '{}' at {} scope ({:?})",
                    track.name,
                    scope.display_name(),
                    reason
                );
                return None;
            }
        };
        let output = category.and_then(|c| c.output_bus.clone());

        // 2. Lease a player
        let volume = Calculator::calc_volume(&sheet, cue, track, &mut self.rng);
        let pitch = Calculator::calc_pitch(&sheet, cue, track, &mut self.rng);
        let mut player = self.pool.rent();
        let ready = player.setup(PlayerSetup {
            output: output.as_deref(),
            clip: Some(clip),
            category_id: cue.category_id,
            volume: if track.has_fade() { 0.0 } else { volume },
            pitch,
            is_loop: force_loop || track.is_loop,
            start_sample: track.start_sample,
            loop_start_sample: track.loop_start_sample,
            end_sample: track.resolved_end_sample(),
        });
        if !ready {
            self.pool.give_back(player);
            return None;
        }

        // 3. Make room
        for victim in evict {
            self.evict(victim);
        }

        // 4. Start
        let lease = LeaseHandle::from_raw(self.lease_ids.next_raw());
        player.set_volume(session_volume);
        player.set_pitch(session_pitch);
        if track.has_fade() {
            self.fades.push(Fade::fade_in(lease, volume, track.fade_time));
        }
        player.play();

        let origin = LeaseOrigin {
            session: handle,
            cue_sheet,
            cue_index,
            track_index,
            category_id: cue.category_id,
            priority: track.priority,
            fade_time: track.fade_time,
        };
        self.leases.push(TrackController::new(lease, origin, player));
        log::debug!("[Conductor] Playing '{}' as {} ({})", track.name, lease, handle);
        Some(lease)
    }

    fn evict(&mut self, lease: LeaseHandle) {
        let Some(position) = self.leases.iter().position(|c| c.lease() == lease) else {
            return;
        };
        let controller = self.leases.remove(position);
        let session = controller.session();
        self.fades.retain(|fade| fade.lease() != lease);
        self.release(controller);
        log::debug!("[Conductor] Evicted {}", lease);
        self.pending_events
            .push(ConductorEvent::TrackEvicted { lease, session });
    }

    /// Stop a controller's player and put the player back in the pool
    fn release(&mut self, mut controller: TrackController) {
        controller.stop();
        if let Some(player) = controller.release_player() {
            self.pool.give_back(player);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STOP
    // ═══════════════════════════════════════════════════════════════════════════

    /// Stop one lease. With `fade` and a track fade time the sound rings out,
    /// but the lease leaves the active set right away.
    fn stop_lease(&mut self, lease: LeaseHandle, fade: bool) -> bool {
        if let Some(position) = self.leases.iter().position(|c| c.lease() == lease) {
            let controller = self.leases.remove(position);
            self.fades.retain(|f| f.lease() != lease);

            if fade && controller.fade_time() > 0.0 {
                self.fades.push(Fade::fade_out(
                    lease,
                    controller.internal_volume(),
                    controller.fade_time(),
                ));
                self.retiring.push(controller);
            } else {
                let session = controller.session();
                self.release(controller);
                self.pending_events
                    .push(ConductorEvent::TrackStopped { lease, session });
            }
            return true;
        }

        if self.retiring.iter().any(|c| c.lease() == lease) {
            // Already fading out; only a hard stop changes anything
            if !fade {
                self.finish_retiring(lease);
            }
            return true;
        }
        false
    }

    fn finish_retiring(&mut self, lease: LeaseHandle) {
        let Some(position) = self.retiring.iter().position(|c| c.lease() == lease) else {
            return;
        };
        let controller = self.retiring.remove(position);
        let session = controller.session();
        self.fades.retain(|f| f.lease() != lease);
        self.release(controller);
        self.pending_events
            .push(ConductorEvent::TrackStopped { lease, session });
    }

    /// Stop every lease of a session
    pub fn stop(&mut self, session: SessionHandle, fade: bool) {
        if !self.sessions.contains_key(&session) {
            log::warn!("[Conductor] stop: unknown {}", session);
            return;
        }
        for lease in self.leases_of(session) {
            self.stop_lease(lease, fade);
        }
    }

    pub fn stop_track(&mut self, lease: LeaseHandle, fade: bool) {
        if !self.stop_lease(lease, fade) {
            log::warn!("[Conductor] stop_track: unknown {}", lease);
        }
    }

    pub fn stop_all(&mut self, fade: bool) {
        let snapshot: Vec<LeaseHandle> = self.leases.iter().map(TrackController::lease).collect();
        for lease in snapshot {
            self.stop_lease(lease, fade);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // UPDATE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Per-frame tick. Returns the events queued since the last drain.
    pub fn update(&mut self, delta_time: f32) -> Vec<ConductorEvent> {
        // 1. Active leases (snapshot; ended ones leave during the walk)
        let snapshot: Vec<LeaseHandle> = self.leases.iter().map(TrackController::lease).collect();
        for lease in snapshot {
            let Some(position) = self.leases.iter().position(|c| c.lease() == lease) else {
                continue;
            };
            if self.leases[position].update() == Some(PlayerEvent::Ended) {
                let controller = self.leases.remove(position);
                let session = controller.session();
                self.fades.retain(|f| f.lease() != lease);
                self.release(controller);
                self.pending_events
                    .push(ConductorEvent::TrackEnded { lease, session });
            }
        }

        // 2. Fading-out leases
        let snapshot: Vec<LeaseHandle> = self.retiring.iter().map(TrackController::lease).collect();
        for lease in snapshot {
            let ended = self
                .retiring
                .iter_mut()
                .find(|c| c.lease() == lease)
                .and_then(TrackController::update)
                == Some(PlayerEvent::Ended);
            if ended {
                self.finish_retiring(lease);
            }
        }

        // 3. Rented players
        for (_, player) in &mut self.unmanaged {
            player.update();
        }

        // 4. Fades
        let fades = std::mem::take(&mut self.fades);
        let mut running = Vec::with_capacity(fades.len());
        let mut completed = Vec::new();
        for mut fade in fades {
            let lease = fade.lease();
            let still_fading = fade.tick(delta_time);
            let Some(controller) = self.controller_mut(lease) else {
                continue;
            };
            controller.set_internal_volume(fade.value());
            if still_fading {
                running.push(fade);
            } else if fade.stop_on_complete() {
                completed.push(lease);
            }
        }
        running.append(&mut self.fades);
        self.fades = running;
        for lease in completed {
            self.finish_retiring(lease);
        }

        self.take_events()
    }

    /// Drain queued events without ticking
    pub fn take_events(&mut self) -> Vec<ConductorEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SESSION CONTROL
    // ═══════════════════════════════════════════════════════════════════════════

    fn controller_mut(&mut self, lease: LeaseHandle) -> Option<&mut TrackController> {
        self.leases
            .iter_mut()
            .chain(self.retiring.iter_mut())
            .find(|c| c.lease() == lease)
    }

    fn controller(&self, lease: LeaseHandle) -> Option<&TrackController> {
        self.leases
            .iter()
            .chain(self.retiring.iter())
            .find(|c| c.lease() == lease)
    }

    fn session_leases_mut(
        &mut self,
        session: SessionHandle,
    ) -> impl Iterator<Item = &mut TrackController> {
        self.leases
            .iter_mut()
            .filter(move |c| c.session() == session)
    }

    pub fn pause(&mut self, session: SessionHandle) {
        if !self.sessions.contains_key(&session) {
            log::warn!("[Conductor] pause: unknown {}", session);
            return;
        }
        self.session_leases_mut(session).for_each(TrackController::pause);
    }

    pub fn resume(&mut self, session: SessionHandle) {
        if !self.sessions.contains_key(&session) {
            log::warn!("[Conductor] resume: unknown {}", session);
            return;
        }
        self.session_leases_mut(session).for_each(TrackController::resume);
    }

    /// Set the session's volume and apply it to its active leases
    pub fn set_volume(&mut self, session: SessionHandle, volume: f32) {
        let volume = self.settings.player.volume_range.clamp(volume);
        let Some(state) = self.sessions.get_mut(&session) else {
            log::warn!("[Conductor] set_volume: unknown {}", session);
            return;
        };
        state.volume = volume;
        self.session_leases_mut(session)
            .for_each(|c| c.set_volume(volume));
    }

    /// Set the session's pitch and apply it to its active leases
    pub fn set_pitch(&mut self, session: SessionHandle, pitch: f32) {
        let pitch = self.settings.player.pitch_range.clamp_magnitude(pitch);
        let Some(state) = self.sessions.get_mut(&session) else {
            log::warn!("[Conductor] set_pitch: unknown {}", session);
            return;
        };
        state.pitch = pitch;
        self.session_leases_mut(session).for_each(|c| c.set_pitch(pitch));
    }

    pub fn is_playing(&self, session: SessionHandle) -> bool {
        self.leases
            .iter()
            .any(|c| c.session() == session && c.is_playing())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SESSION QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn session_volume(&self, session: SessionHandle) -> Option<f32> {
        self.sessions.get(&session).map(|s| s.volume)
    }

    pub fn session_pitch(&self, session: SessionHandle) -> Option<f32> {
        self.sessions.get(&session).map(|s| s.pitch)
    }

    fn session_cue(&self, session: SessionHandle) -> Option<&cf_core::Cue> {
        let state = self.sessions.get(&session)?;
        let entry = self.cue_sheets.get(&state.cue_sheet)?;
        entry.sheet.cues.get(state.cue_index)
    }

    pub fn session_category(&self, session: SessionHandle) -> Option<CategoryId> {
        self.session_cue(session).and_then(|cue| cue.category_id)
    }

    pub fn session_cue_name(&self, session: SessionHandle) -> Option<&str> {
        self.session_cue(session).map(|cue| cue.name.as_str())
    }

    pub fn session_track_count(&self, session: SessionHandle) -> Option<usize> {
        self.session_cue(session).map(|cue| cue.tracks.len())
    }

    /// Active leases of a session, in start order
    pub fn leases_of(&self, session: SessionHandle) -> Vec<LeaseHandle> {
        self.leases
            .iter()
            .filter(|c| c.session() == session)
            .map(TrackController::lease)
            .collect()
    }

    /// Leases counted by the throttle
    pub fn active_lease_count(&self) -> usize {
        self.leases.len()
    }

    /// Leases stopped with a fade that are still ringing out
    pub fn fading_lease_count(&self) -> usize {
        self.retiring.len()
    }

    pub fn fade_count(&self) -> usize {
        self.fades.len()
    }

    /// Throttle view of an active lease
    pub fn lease_info(&self, lease: LeaseHandle) -> Option<LeaseInfo> {
        self.leases
            .iter()
            .find(|c| c.lease() == lease)
            .map(TrackController::info)
    }

    /// Origin of an active or fading lease
    pub fn lease_origin(&self, lease: LeaseHandle) -> Option<LeaseOrigin> {
        self.controller(lease).map(|c| *c.origin())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LEASE CONTROL
    // ═══════════════════════════════════════════════════════════════════════════

    fn with_lease<T>(
        &mut self,
        lease: LeaseHandle,
        op: &str,
        f: impl FnOnce(&mut TrackController) -> T,
    ) -> Option<T> {
        match self.controller_mut(lease) {
            Some(controller) => Some(f(controller)),
            None => {
                log::warn!("[Conductor] {}: unknown {}", op, lease);
                None
            }
        }
    }

    pub fn pause_track(&mut self, lease: LeaseHandle) {
        self.with_lease(lease, "pause_track", TrackController::pause);
    }

    pub fn resume_track(&mut self, lease: LeaseHandle) {
        self.with_lease(lease, "resume_track", TrackController::resume);
    }

    pub fn track_volume(&self, lease: LeaseHandle) -> Option<f32> {
        self.controller(lease).map(TrackController::volume)
    }

    pub fn set_track_volume(&mut self, lease: LeaseHandle, volume: f32) {
        self.with_lease(lease, "set_track_volume", |c| c.set_volume(volume));
    }

    pub fn track_pitch(&self, lease: LeaseHandle) -> Option<f32> {
        self.controller(lease).map(TrackController::pitch)
    }

    pub fn set_track_pitch(&mut self, lease: LeaseHandle, pitch: f32) {
        self.with_lease(lease, "set_track_pitch", |c| c.set_pitch(pitch));
    }

    pub fn track_is_playing(&self, lease: LeaseHandle) -> bool {
        self.controller(lease).is_some_and(TrackController::is_playing)
    }

    pub fn track_state(&self, lease: LeaseHandle) -> PlayerState {
        self.controller(lease)
            .map_or(PlayerState::Stopped, TrackController::state)
    }

    pub fn track_time_samples(&self, lease: LeaseHandle) -> u64 {
        self.controller(lease).map_or(0, TrackController::time_samples)
    }

    pub fn set_track_time_samples(&mut self, lease: LeaseHandle, samples: u64) {
        self.with_lease(lease, "set_track_time_samples", |c| {
            c.set_time_samples(samples)
        });
    }

    /// Player of an active or fading lease
    pub fn track_player(&self, lease: LeaseHandle) -> Option<&Player> {
        self.controller(lease).and_then(TrackController::player)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // UNMANAGED PLAYERS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Rent a player outside the lease lifecycle. It is ticked by `update`
    /// and ignored by the throttle until returned.
    pub fn rent_player(&mut self) -> UnmanagedPlayerHandle {
        let handle = UnmanagedPlayerHandle::from_raw(self.player_ids.next_raw());
        let player = self.pool.rent();
        self.unmanaged.push((handle, player));
        handle
    }

    pub fn unmanaged_player_mut(&mut self, handle: UnmanagedPlayerHandle) -> Option<&mut Player> {
        self.unmanaged
            .iter_mut()
            .find(|(h, _)| *h == handle)
            .map(|(_, player)| player)
    }

    /// Give a rented player back. Returns false for an unknown handle.
    pub fn return_player(&mut self, handle: UnmanagedPlayerHandle) -> bool {
        let Some(position) = self.unmanaged.iter().position(|(h, _)| *h == handle) else {
            log::warn!("[Conductor] return_player: unknown {}", handle);
            return false;
        };
        let (_, player) = self.unmanaged.remove(position);
        self.pool.give_back(player);
        true
    }

    pub fn unmanaged_player_count(&self) -> usize {
        self.unmanaged.len()
    }
}

impl std::fmt::Debug for Conductor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conductor")
            .field("cue_sheets", &self.cue_sheets.len())
            .field("sessions", &self.sessions.len())
            .field("leases", &self.leases.len())
            .field("retiring", &self.retiring.len())
            .field("fades", &self.fades.len())
            .field("unmanaged", &self.unmanaged.len())
            .field("pool", &self.pool.stats())
            .finish()
    }
}
