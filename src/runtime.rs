//! Single-task engine actor
//!
//! Hosts a `PlaybackController` on one tokio task. Commands, load
//! completions and scheduler polls are all serialised through a single
//! `select!` loop, so the controller stays the only writer of its state
//! without any locking. Loads run on the blocking pool and re-enter through
//! `complete_load`, where superseded results are dropped.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::engine::{DecodedAudioBuffer, LoadTicket, Loader, PlaybackController, ReadyState, TrackSource};
use crate::error::{EngineError, LoadError, Result};

/// Requests accepted by the engine task
#[derive(Debug)]
pub enum Command {
    Load(TrackSource),
    Play,
    Pause,
    Seek(f64),
    SetVolume(f64),
    SetMuted(bool),
    SetPlaybackRate(f64),
    SetAdjustPitch(bool),
    Snapshot(oneshot::Sender<Snapshot>),
    Shutdown,
}

/// Point-in-time view of the controller
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub current_time_millis: f64,
    pub duration_millis: f64,
    pub paused: bool,
    pub volume: f64,
    pub muted: bool,
    pub playback_rate: f64,
    pub adjust_pitch_with_playback_rate: bool,
    pub ready_state: ReadyState,
}

impl Snapshot {
    fn of(controller: &PlaybackController) -> Self {
        Self {
            current_time_millis: controller.current_time_millis(),
            duration_millis: controller.duration_millis(),
            paused: controller.paused(),
            volume: controller.volume(),
            muted: controller.muted(),
            playback_rate: controller.playback_rate(),
            adjust_pitch_with_playback_rate: controller.adjust_pitch_with_playback_rate(),
            ready_state: controller.ready_state(),
        }
    }
}

/// Cloneable sender side of the engine task
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl EngineHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| EngineError::EngineStopped)
    }

    pub fn load_track(&self, source: TrackSource) -> Result<()> {
        self.send(Command::Load(source))
    }

    pub fn play(&self) -> Result<()> {
        self.send(Command::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    pub fn seek(&self, position_millis: f64) -> Result<()> {
        self.send(Command::Seek(position_millis))
    }

    pub fn set_volume(&self, volume: f64) -> Result<()> {
        self.send(Command::SetVolume(volume))
    }

    pub fn set_muted(&self, muted: bool) -> Result<()> {
        self.send(Command::SetMuted(muted))
    }

    pub fn set_playback_rate(&self, rate: f64) -> Result<()> {
        self.send(Command::SetPlaybackRate(rate))
    }

    pub fn set_adjust_pitch_with_playback_rate(&self, adjust: bool) -> Result<()> {
        self.send(Command::SetAdjustPitch(adjust))
    }

    /// Read the controller state after all previously sent commands
    pub async fn snapshot(&self) -> Result<Snapshot> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Snapshot(reply))?;
        response.await.map_err(|_| EngineError::EngineStopped)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }
}

/// Move `controller` onto its own task
///
/// `tick` is the cadence of `PlaybackController::poll`. The join handle
/// yields the controller back after `shutdown` or once every handle is
/// dropped.
pub fn spawn(
    controller: PlaybackController,
    loader: Arc<dyn Loader>,
    tick: Duration,
) -> (EngineHandle, JoinHandle<PlaybackController>) {
    let (commands, receiver) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(controller, loader, tick, receiver));
    (EngineHandle { commands }, task)
}

type LoadOutcome = (LoadTicket, std::result::Result<DecodedAudioBuffer, LoadError>);

async fn run(
    mut controller: PlaybackController,
    loader: Arc<dyn Loader>,
    tick: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
) -> PlaybackController {
    let (loaded, mut completions) = mpsc::unbounded_channel::<LoadOutcome>();
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    debug!("[RUNTIME] Engine {} started", controller.id());
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                None | Some(Command::Shutdown) => break,
                Some(Command::Load(source)) => {
                    let ticket = controller.load_track(source);
                    let loader = Arc::clone(&loader);
                    let loaded = loaded.clone();
                    tokio::task::spawn_blocking(move || {
                        let result = loader.load(ticket.source());
                        // The engine may already be gone
                        let _ = loaded.send((ticket, result));
                    });
                }
                Some(command) => apply(&mut controller, command),
            },
            Some((ticket, result)) = completions.recv() => {
                controller.complete_load(ticket, result);
            }
            _ = ticker.tick() => controller.poll(),
        }
    }
    debug!("[RUNTIME] Engine {} stopped", controller.id());
    controller
}

fn apply(controller: &mut PlaybackController, command: Command) {
    match command {
        Command::Play => controller.play(),
        Command::Pause => controller.pause(),
        Command::Seek(position) => controller.seek(position),
        Command::SetVolume(volume) => controller.set_volume(volume),
        Command::SetMuted(muted) => controller.set_muted(muted),
        Command::SetPlaybackRate(rate) => controller.set_playback_rate(rate),
        Command::SetAdjustPitch(adjust) => controller.set_adjust_pitch_with_playback_rate(adjust),
        Command::Snapshot(reply) => {
            let _ = reply.send(Snapshot::of(controller));
        }
        Command::Load(_) | Command::Shutdown => {}
    }
}
