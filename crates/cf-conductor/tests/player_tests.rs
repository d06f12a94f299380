//! Player Integration Tests
//!
//! Tests for:
//! - Loop cadence under pause/resume (mid-segment and inside the lookahead window)
//! - Seeking and pitch changes re-deriving scheduled ends
//! - Reverse pitch
//! - Volume/pitch clamping against configured ranges

use approx::assert_relative_eq;
use cf_conductor::{Player, PlayerEvent, PlayerSetup, PlayerState, SourceFactory, VirtualHost};
use cf_core::{AudioClip, PlayerSettings, ValueRange};

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

const FREQ: u32 = 1000;

fn create_player(host: &VirtualHost, settings: PlayerSettings) -> Player {
    let mut factory = host.factory();
    Player::new(
        [factory.create_source(), factory.create_source()],
        host.clock(),
        settings,
    )
}

fn setup<'a>(clip: &'a AudioClip, is_loop: bool, pitch: f32) -> PlayerSetup<'a> {
    PlayerSetup {
        output: None,
        clip: Some(clip),
        category_id: None,
        volume: 1.0,
        pitch,
        is_loop,
        start_sample: 0,
        loop_start_sample: 0,
        end_sample: clip.samples,
    }
}

/// Playing player on a one-second clip
fn playing(host: &VirtualHost, clip: &AudioClip, is_loop: bool) -> Player {
    let mut player = create_player(host, PlayerSettings::default());
    assert!(player.setup(setup(clip, is_loop, 1.0)));
    player.play();
    player
}

fn one_second() -> AudioClip {
    AudioClip::new("tone", FREQ, FREQ as u64)
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAUSE COMPENSATION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_pause_mid_segment_shifts_next_event_by_pause_length() {
    for paused_for in [0.01, 0.5, 3.0, 17.25] {
        let host = VirtualHost::new();
        let clip = one_second();
        let mut player = playing(&host, &clip, true);

        host.advance(0.3);
        let before = player.next_event_time();
        player.pause();
        host.advance(paused_for);
        player.resume();

        assert_relative_eq!(
            player.next_event_time(),
            before + paused_for,
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_pause_in_lookahead_window_keeps_loop_boundary() {
    for paused_for in [0.2, 1.0, 5.5] {
        let host = VirtualHost::new();
        let clip = one_second();
        let mut player = playing(&host, &clip, true);

        // First segment ends at 1.1; the second is queued at 1.0
        host.advance(1.05);
        assert_eq!(player.update(), Some(PlayerEvent::Looped));

        player.pause();
        host.advance(paused_for);
        player.resume();
        assert_eq!(player.update(), Some(PlayerEvent::Looped));

        let queued = host.sources()[1].lock().clone();
        assert_relative_eq!(
            queued.scheduled_start.unwrap(),
            1.1 + paused_for,
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_repeated_pauses_accumulate() {
    let host = VirtualHost::new();
    let clip = one_second();
    let mut player = playing(&host, &clip, true);
    let initial = player.next_event_time();

    for _ in 0..5 {
        host.advance(0.1);
        player.pause();
        host.advance(2.0);
        player.resume();
    }
    assert_relative_eq!(player.next_event_time(), initial + 10.0, epsilon = 1e-9);
    assert_eq!(player.state(), PlayerState::Playing);
}

#[test]
fn test_paused_player_emits_nothing() {
    let host = VirtualHost::new();
    let clip = one_second();
    let mut player = playing(&host, &clip, false);

    player.pause();
    host.advance(30.0);
    assert_eq!(player.update(), None);
    assert_eq!(player.state(), PlayerState::Paused);

    player.resume();
    host.advance(1.2);
    assert_eq!(player.update(), Some(PlayerEvent::Ended));
}

#[test]
fn test_pause_before_start_delay() {
    let host = VirtualHost::new();
    let clip = one_second();
    let mut player = playing(&host, &clip, false);

    host.advance(0.05);
    player.pause();
    host.advance(1.0);
    player.resume();

    assert_relative_eq!(player.next_event_time(), 2.1, epsilon = 1e-9);
}

// ═══════════════════════════════════════════════════════════════════════════════
// SEEK / PITCH
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_seek_rederives_end() {
    let host = VirtualHost::new();
    let clip = AudioClip::new("long", FREQ, 2 * FREQ as u64);
    let mut player = playing(&host, &clip, false);

    host.advance(0.6);
    player.set_time_samples(1500);
    assert_relative_eq!(player.next_event_time(), 1.1, epsilon = 1e-6);
    assert_eq!(player.time_samples(), 1500);
}

#[test]
fn test_seek_past_partial_end_clamps_to_end() {
    let host = VirtualHost::new();
    let clip = AudioClip::new("long", FREQ, 2 * FREQ as u64);
    let mut player = create_player(&host, PlayerSettings::default());
    assert!(player.setup(PlayerSetup {
        end_sample: 1500,
        ..setup(&clip, false, 1.0)
    }));
    player.play();

    host.advance(0.6);
    player.set_time_samples(1800);
    assert_eq!(player.time_samples(), 1500);
    assert_relative_eq!(player.next_event_time(), 0.6, epsilon = 1e-9);

    host.advance(0.01);
    assert_eq!(player.update(), Some(PlayerEvent::Ended));
}

#[test]
fn test_pitch_change_moves_queued_segment() {
    let host = VirtualHost::new();
    let clip = one_second();
    let mut player = playing(&host, &clip, true);

    host.advance(1.05);
    player.update();
    player.set_pitch(2.0);

    // ~50 samples left on A at double speed, then a 0.5s segment on B
    let a = host.sources()[0].lock().clone();
    let b = host.sources()[1].lock().clone();
    assert_relative_eq!(a.scheduled_end.unwrap(), 1.075, epsilon = 1e-3);
    assert_relative_eq!(b.scheduled_start.unwrap(), a.scheduled_end.unwrap(), epsilon = 1e-12);
    assert_relative_eq!(
        b.scheduled_end.unwrap() - b.scheduled_start.unwrap(),
        0.5,
        epsilon = 1e-9
    );
    assert_relative_eq!(player.next_event_time(), b.scheduled_end.unwrap() - 0.1, epsilon = 1e-9);
}

#[test]
fn test_pitch_change_while_paused_applies_on_resume() {
    let host = VirtualHost::new();
    let clip = one_second();
    let mut player = playing(&host, &clip, false);

    host.advance(0.6);
    player.pause();
    player.set_pitch(2.0);
    host.advance(1.0);
    player.resume();

    // ~500 samples left at double speed after resuming at 1.6
    assert_relative_eq!(player.next_event_time(), 1.85, epsilon = 1e-3);
    let a = host.sources()[0].lock().clone();
    assert_relative_eq!(a.scheduled_end.unwrap(), player.next_event_time(), epsilon = 1e-12);
}

#[test]
fn test_reverse_pitch_uses_magnitude() {
    let host = VirtualHost::new();
    let clip = one_second();
    let mut player = create_player(&host, PlayerSettings::default());
    player.setup(setup(&clip, false, -2.0));
    player.play();

    assert_relative_eq!(player.applied_pitch(), -2.0);
    assert_relative_eq!(player.next_event_time(), 0.6, epsilon = 1e-9);
    assert_relative_eq!(host.sources()[0].lock().pitch, -2.0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLAMPING
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_configured_ranges_clamp_round_trip() {
    let settings = PlayerSettings {
        volume_range: ValueRange::new(0.0, 0.5),
        pitch_range: ValueRange::new(0.5, 2.0),
        ..PlayerSettings::default()
    };
    let host = VirtualHost::new();
    let clip = one_second();
    let mut player = create_player(&host, settings);
    player.setup(setup(&clip, false, 1.0));

    player.set_volume(0.9);
    assert_eq!(player.volume(), 0.5);
    player.set_volume(-3.0);
    assert_eq!(player.volume(), 0.0);

    player.set_pitch(-4.0);
    assert_eq!(player.pitch(), -2.0);
    player.set_pitch(0.1);
    assert_eq!(player.pitch(), 0.5);

    // Setup volume 1.0 is clamped to 0.5 internally
    player.set_volume(0.5);
    assert_relative_eq!(player.applied_volume(), 0.25);
    assert_relative_eq!(host.sources()[0].lock().volume, 0.25);
}

#[test]
fn test_applied_pitch_product_is_clamped() {
    let host = VirtualHost::new();
    let clip = one_second();
    let mut player = create_player(&host, PlayerSettings::default());
    player.setup(setup(&clip, false, 2.5));

    player.set_pitch(2.5);
    assert_relative_eq!(player.applied_pitch(), 3.0);
    player.set_pitch(-2.5);
    assert_relative_eq!(player.applied_pitch(), -3.0);
}
