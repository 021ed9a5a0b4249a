//! CLI Command Implementations

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use log::info;

use crate::config::EngineConfig;
use crate::engine::{
    EventKind, EventLog, MediaEvent, PlaybackController, SimulatedBackend, TrackSource, WavLoader,
};

/// Properties of a decoded track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub duration_millis: f64,
    pub channels: usize,
    pub sample_rate: u32,
}

/// Settings for a simulated playback run
#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub path: PathBuf,
    pub config: Option<PathBuf>,
    pub rate: Option<f64>,
    pub volume: Option<f64>,
    pub no_pitch_adjust: bool,
    pub seek_millis: Option<f64>,
    pub run_millis: Option<f64>,
    pub step_millis: f64,
}

/// Outcome of a simulated playback run
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub duration_millis: f64,
    pub final_position_millis: f64,
    pub elapsed_millis: f64,
    pub ended: bool,
    pub events: Vec<MediaEvent>,
}

/// Decode a WAV file and report its properties.
pub fn info(path: &Path) -> anyhow::Result<TrackInfo> {
    info!("Inspecting: {}", path.display());

    let buffer = WavLoader::new()
        .load_path(path)
        .with_context(|| format!("failed to load {}", path.display()))?;

    Ok(TrackInfo {
        duration_millis: buffer.duration_millis(),
        channels: buffer.channels(),
        sample_rate: buffer.sample_rate(),
    })
}

/// Play a file on the simulated backend, stepping the virtual clock.
///
/// Runs until the track ends or `run_millis` of virtual time has passed.
pub fn simulate(options: &SimulateOptions) -> anyhow::Result<SimulationReport> {
    if !options.step_millis.is_finite() || options.step_millis <= 0.0 {
        bail!("step must be a positive number of milliseconds");
    }

    let mut config = match &options.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(rate) = options.rate {
        config.playback_rate = rate;
    }
    if let Some(volume) = options.volume {
        config.volume = volume;
    }
    if options.no_pitch_adjust {
        config.adjust_pitch_with_playback_rate = false;
    }

    let backend = SimulatedBackend::new();
    let mut controller = PlaybackController::with_config(backend.clone(), &config)?;
    let log = EventLog::new();
    controller.subscribe(log.clone());

    info!("Simulating: {}", options.path.display());
    let source = TrackSource::by_reference(options.path.display().to_string());
    controller.load_track_with(&WavLoader::new(), source);

    if let Some(detail) = log.events().iter().find_map(|e| match &e.kind {
        EventKind::Error { detail } => Some(detail.clone()),
        _ => None,
    }) {
        bail!("failed to load {}: {}", options.path.display(), detail);
    }

    if let Some(position) = options.seek_millis {
        controller.seek(position);
    }
    controller.play();

    let limit = options
        .run_millis
        .unwrap_or_else(|| controller.duration_millis() / controller.playback_rate() + options.step_millis);
    let mut elapsed = 0.0;
    while elapsed < limit && !controller.paused() {
        backend.advance(options.step_millis);
        elapsed += options.step_millis;
        controller.poll();
    }

    Ok(SimulationReport {
        duration_millis: controller.duration_millis(),
        final_position_millis: controller.current_time_millis(),
        elapsed_millis: elapsed,
        ended: log.count("ended") > 0,
        events: log.events(),
    })
}
