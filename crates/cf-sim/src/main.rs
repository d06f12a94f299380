//! CueForge Simulator
//!
//! Plays a cue against the virtual host for a fixed number of frames and
//! logs every conductor event.
//!
//! Usage:
//!   cf-sim demos/sheet.json --cue footstep --plays 6
//!   RUST_LOG=debug cf-sim demos/sheet.json --settings demos/settings.json --cue music --loop

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;

use cf_conductor::{Conductor, ConductorEvent, ConductorHandle, CueController, VirtualHost};
use cf_core::{CueSheet, Settings};

#[derive(Parser)]
#[command(name = "cf-sim", about = "Simulate cue playback on a virtual host")]
struct Cli {
    /// Cue sheet (JSON)
    sheet: PathBuf,

    /// Settings file (JSON); defaults are used when omitted
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Cue to open (defaults to the first cue)
    #[arg(short, long)]
    cue: Option<String>,

    /// Number of play requests, issued one per `interval` frames
    #[arg(short, long, default_value_t = 1)]
    plays: u32,

    /// Frames between play requests
    #[arg(short, long, default_value_t = 30)]
    interval: u32,

    /// Simulated frames
    #[arg(short, long, default_value_t = 600)]
    frames: u32,

    /// Frame length in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// RNG seed for reproducible track selection
    #[arg(long)]
    seed: Option<u64>,

    /// Force looping playback
    #[arg(long = "loop")]
    force_loop: bool,

    /// Fade out on the final stop
    #[arg(long)]
    fade_out: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.dt <= 0.0 {
        bail!("--dt must be positive (got {})", cli.dt);
    }

    let settings = match &cli.settings {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    let sheet = CueSheet::load_from(&cli.sheet)
        .with_context(|| format!("failed to load cue sheet from {}", cli.sheet.display()))?;
    let sheet = Arc::new(sheet);

    log::info!(
        "[Sim] Loaded cue sheet '{}' ({} cues)",
        sheet.name,
        sheet.cues.len()
    );

    let host = VirtualHost::new();
    let factory = Box::new(host.factory());
    let conductor = match cli.seed {
        Some(seed) => Conductor::with_seed(settings, factory, host.clock(), seed),
        None => Conductor::new(settings, factory, host.clock()),
    };
    let conductor = ConductorHandle::new(conductor);

    let cue = match &cli.cue {
        Some(name) => CueController::open_by_name(&conductor, &sheet, name)
            .with_context(|| format!("cue '{}' not found in '{}'", name, sheet.name))?,
        None => CueController::open_by_index(&conductor, &sheet, 0)
            .with_context(|| format!("cue sheet '{}' has no cues", sheet.name))?,
    };

    let mut summary = Summary::default();
    let interval = cli.interval.max(1);

    for frame in 0..cli.frames {
        if frame % interval == 0 && frame / interval < cli.plays {
            summary.requested += 1;
            match cue.play(cli.force_loop) {
                Some(track) => {
                    log::info!(
                        "[Sim] t={:.3}s play -> {:?}",
                        host.now(),
                        track.lease()
                    );
                    summary.admitted += 1;
                }
                None => log::info!("[Sim] t={:.3}s play rejected", host.now()),
            }
        }

        host.advance(cli.dt as f64);
        for event in conductor.update(cli.dt) {
            summary.record(&event);
            log::info!("[Sim] t={:.3}s {:?}", host.now(), event);
        }
    }

    cue.stop(cli.fade_out);
    // Let a fade-out run to completion
    let mut drain_frames = 0;
    while conductor.active_lease_count() > 0 || conductor.lock().fading_lease_count() > 0 {
        host.advance(cli.dt as f64);
        for event in conductor.update(cli.dt) {
            summary.record(&event);
            log::info!("[Sim] t={:.3}s {:?}", host.now(), event);
        }
        drain_frames += 1;
        if drain_frames > 10_000 {
            log::warn!("[Sim] Leases still active after drain, giving up");
            break;
        }
    }

    drop(cue);
    for event in conductor.take_events() {
        summary.record(&event);
        log::info!("[Sim] {:?}", event);
    }

    let stats = conductor.pool_stats();
    println!(
        "requested={} admitted={} ended={} stopped={} evicted={} players_created={} idle={}",
        summary.requested,
        summary.admitted,
        summary.ended,
        summary.stopped,
        summary.evicted,
        stats.created,
        stats.idle,
    );

    Ok(())
}

#[derive(Default)]
struct Summary {
    requested: u32,
    admitted: u32,
    ended: u32,
    stopped: u32,
    evicted: u32,
}

impl Summary {
    fn record(&mut self, event: &ConductorEvent) {
        match event {
            ConductorEvent::TrackEnded { .. } => self.ended += 1,
            ConductorEvent::TrackStopped { .. } => self.stopped += 1,
            ConductorEvent::TrackEvicted { .. } => self.evicted += 1,
            ConductorEvent::CueSheetUnused { .. } => {}
        }
    }
}
