//! Track Controller
//!
//! Binds a leased [`Player`] to the session, cue-sheet registration and track
//! it was started for. Priority is copied at lease time.

use cf_core::CategoryId;

use crate::handle::{CueSheetHandle, LeaseHandle, SessionHandle};
use crate::player::{Player, PlayerEvent, PlayerState};
use crate::throttle::LeaseInfo;

/// Where a lease came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaseOrigin {
    pub session: SessionHandle,
    pub cue_sheet: CueSheetHandle,
    pub cue_index: usize,
    pub track_index: usize,
    pub category_id: Option<CategoryId>,
    pub priority: i32,
    /// Seconds, 0 = no fade
    pub fade_time: f32,
}

#[derive(Debug)]
pub struct TrackController {
    lease: LeaseHandle,
    origin: LeaseOrigin,
    player: Option<Player>,
}

impl TrackController {
    pub fn new(lease: LeaseHandle, origin: LeaseOrigin, player: Player) -> Self {
        Self {
            lease,
            origin,
            player: Some(player),
        }
    }

    #[inline]
    pub fn lease(&self) -> LeaseHandle {
        self.lease
    }

    #[inline]
    pub fn origin(&self) -> &LeaseOrigin {
        &self.origin
    }

    #[inline]
    pub fn session(&self) -> SessionHandle {
        self.origin.session
    }

    #[inline]
    pub fn priority(&self) -> i32 {
        self.origin.priority
    }

    #[inline]
    pub fn fade_time(&self) -> f32 {
        self.origin.fade_time
    }

    pub fn info(&self) -> LeaseInfo {
        LeaseInfo {
            lease: self.lease,
            cue_sheet: self.origin.cue_sheet,
            cue_index: self.origin.cue_index,
            category_id: self.origin.category_id,
            priority: self.origin.priority,
        }
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.player.as_mut()
    }

    /// Hand the player back without stopping it
    pub fn release_player(&mut self) -> Option<Player> {
        self.player.take()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // FORWARDING
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn update(&mut self) -> Option<PlayerEvent> {
        self.player.as_mut().and_then(Player::update)
    }

    pub fn play(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.play();
        }
    }

    /// True when this call stopped an active playback
    pub fn stop(&mut self) -> bool {
        self.player.as_mut().is_some_and(Player::stop)
    }

    pub fn pause(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.pause();
        }
    }

    pub fn resume(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.resume();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.player.as_ref().is_some_and(Player::is_playing)
    }

    pub fn state(&self) -> PlayerState {
        self.player.as_ref().map_or(PlayerState::Stopped, Player::state)
    }

    pub fn volume(&self) -> f32 {
        self.player.as_ref().map_or(0.0, Player::volume)
    }

    pub fn set_volume(&mut self, volume: f32) {
        if let Some(player) = self.player.as_mut() {
            player.set_volume(volume);
        }
    }

    pub fn internal_volume(&self) -> f32 {
        self.player.as_ref().map_or(0.0, Player::internal_volume)
    }

    pub fn set_internal_volume(&mut self, volume: f32) {
        if let Some(player) = self.player.as_mut() {
            player.set_internal_volume(volume);
        }
    }

    pub fn pitch(&self) -> f32 {
        self.player.as_ref().map_or(1.0, Player::pitch)
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        if let Some(player) = self.player.as_mut() {
            player.set_pitch(pitch);
        }
    }

    pub fn time_samples(&self) -> u64 {
        self.player.as_ref().map_or(0, Player::time_samples)
    }

    pub fn set_time_samples(&mut self, samples: u64) {
        if let Some(player) = self.player.as_mut() {
            player.set_time_samples(samples);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SourceFactory;
    use crate::virtual_host::VirtualHost;
    use cf_core::PlayerSettings;

    fn origin() -> LeaseOrigin {
        LeaseOrigin {
            session: SessionHandle::from_raw(1),
            cue_sheet: CueSheetHandle::from_raw(1),
            cue_index: 2,
            track_index: 0,
            category_id: Some(4),
            priority: 7,
            fade_time: 0.0,
        }
    }

    fn controller(host: &VirtualHost) -> TrackController {
        let mut factory = host.factory();
        let player = Player::new(
            [factory.create_source(), factory.create_source()],
            host.clock(),
            PlayerSettings::default(),
        );
        TrackController::new(LeaseHandle::from_raw(3), origin(), player)
    }

    #[test]
    fn test_info_snapshot() {
        let host = VirtualHost::new();
        let info = controller(&host).info();
        assert_eq!(info.lease, LeaseHandle::from_raw(3));
        assert_eq!(info.cue_index, 2);
        assert_eq!(info.category_id, Some(4));
        assert_eq!(info.priority, 7);
    }

    #[test]
    fn test_origin_keeps_fade_time() {
        let host = VirtualHost::new();
        let faded = LeaseOrigin {
            fade_time: 0.25,
            ..origin()
        };
        let mut factory = host.factory();
        let player = Player::new(
            [factory.create_source(), factory.create_source()],
            host.clock(),
            PlayerSettings::default(),
        );
        let controller = TrackController::new(LeaseHandle::from_raw(4), faded, player);

        assert_eq!(*controller.origin(), faded);
        assert_ne!(*controller.origin(), origin());
        assert_eq!(controller.fade_time(), 0.25);
    }

    #[test]
    fn test_released_controller_returns_defaults() {
        let host = VirtualHost::new();
        let mut controller = controller(&host);
        assert!(controller.release_player().is_some());
        assert!(controller.release_player().is_none());

        controller.play();
        controller.set_volume(0.5);
        assert!(!controller.stop());
        assert!(!controller.is_playing());
        assert_eq!(controller.state(), PlayerState::Stopped);
        assert_eq!(controller.time_samples(), 0);
        assert_eq!(controller.update(), None);
    }
}
