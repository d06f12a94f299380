//! Throttle admission benchmarks

use std::sync::Arc;

use cf_conductor::{
    Candidate, Conductor, CueSheetHandle, LeaseHandle, LeaseInfo, ScopeRules, TrackSelection,
    VirtualHost, admit,
};
use cf_core::{AudioClip, Cue, CueSheet, Settings, ThrottleRule, ThrottleType, Track};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn active_set(len: u32) -> Vec<LeaseInfo> {
    (1..=len)
        .map(|i| LeaseInfo {
            lease: LeaseHandle::from_raw(i),
            cue_sheet: CueSheetHandle::from_raw(i % 4 + 1),
            cue_index: (i % 8) as usize,
            category_id: Some(i % 3),
            priority: (i % 5) as i32,
        })
        .collect()
}

fn bench_admit_at_capacity(c: &mut Criterion) {
    let active = active_set(256);
    let candidate = Candidate {
        cue_sheet: CueSheetHandle::from_raw(1),
        cue_index: 0,
        category_id: Some(0),
        priority: 2,
    };
    let rules = ScopeRules {
        cue: ThrottleRule::new(ThrottleType::PriorityOrder, 64),
        cue_sheet: ThrottleRule::new(ThrottleType::PriorityOrder, 64),
        category: Some(ThrottleRule::new(ThrottleType::FirstComeFirstServed, 128)),
        global: ThrottleRule::new(ThrottleType::PriorityOrder, 256),
    };

    c.bench_function("admit_256_leases", |b| {
        b.iter(|| admit(black_box(&active), black_box(&candidate), black_box(&rules)))
    });
}

fn bench_play_with_eviction(c: &mut Criterion) {
    let host = VirtualHost::new();
    let settings = Settings::default().with_global_throttle(ThrottleType::PriorityOrder, 32);
    let mut conductor = Conductor::with_seed(settings, Box::new(host.factory()), host.clock(), 1);

    let clip = AudioClip::new("loop", 48_000, 48_000);
    let sheet = Arc::new(CueSheet::new("bench").with_cue(
        Cue::new("loop").with_track(Track::new("loop", Some(clip)).with_loop(true)),
    ));
    let session = conductor.create_session(&sheet, 0).expect("cue 0 exists");
    for _ in 0..32 {
        conductor.play(session, TrackSelection::Index(0), false);
    }

    c.bench_function("play_evict_32_leases", |b| {
        b.iter(|| {
            black_box(conductor.play(session, TrackSelection::Index(0), false));
            conductor.take_events();
        })
    });
}

criterion_group!(benches, bench_admit_at_capacity, bench_play_with_eviction);
criterion_main!(benches);
