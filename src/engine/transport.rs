//! Playback Controller for Playhead
//!
//! The single writer of a track's `PlayState`. Public calls, load
//! completions, natural-end notifications and scheduler ticks all arrive
//! here on one thread; late notifications are matched by identity against
//! the state they were registered for and dropped when stale.
//!
//! State machine:
//! - `NoTrack` -> `Loading` on `load_track`
//! - `Loading` -> `Paused(0)` on load success, stays data-less on failure
//! - `Paused` <-> `Playing` via `play` / `pause`
//! - `Playing` -> `Paused(0)` on natural end
//! - any -> `Loading` on `load_track` (a running source is stopped first)

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::EngineConfig;
use crate::engine::backend::{
    needs_pitch_compensation, transpose_semitones_for_rate, AudioBackend, Destination, EndedToken,
    PitchShifterHandle,
};
use crate::engine::buffer::DecodedAudioBuffer;
use crate::engine::events::{EngineId, EventKind, EventRegistry, EventSink, ListenerId, MediaEvent};
use crate::engine::loader::{LoadTicket, Loader};
use crate::engine::scheduler::Scheduler;
use crate::engine::timeclock::{to_anchor, to_position};
use crate::engine::track::{PlayState, PlayStateId, Track, TrackData, TrackGeneration, TrackSource};
use crate::error::{EngineError, LoadError, Result};

/// Slowest accepted playback rate
pub const MIN_PLAYBACK_RATE: f64 = 0.0625;

/// Fastest accepted playback rate
pub const MAX_PLAYBACK_RATE: f64 = 16.0;

/// How much of the current track is available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// No track, still loading, or the load failed
    HaveNothing,
    /// Fully decoded
    HaveEnoughData,
}

/// Precise single-track playback state machine
///
/// # Example
/// ```
/// use playhead::engine::{
///     ChannelLayout, DecodedAudioBuffer, PlaybackController, SimulatedBackend, TrackSource,
/// };
///
/// let backend = SimulatedBackend::new();
/// let mut controller = PlaybackController::new(backend.clone());
///
/// let ticket = controller.load_track(TrackSource::by_reference("song.wav"));
/// let buffer = DecodedAudioBuffer::silent(10_000, ChannelLayout::Mono, 1000);
/// controller.complete_load(ticket, Ok(buffer));
///
/// controller.play();
/// backend.advance(2500.0);
/// controller.pause();
/// assert_eq!(controller.current_time_millis(), 2500.0);
/// ```
pub struct PlaybackController {
    id: EngineId,
    backend: Box<dyn AudioBackend>,
    track: Option<Track>,
    next_generation: u64,
    next_play_state: u64,
    listeners: EventRegistry,
    scheduler: Scheduler,
    /// Created on first use, then reused for every compensated source
    pitch_shifter: Option<PitchShifterHandle>,
    volume: f64,
    muted: bool,
    playback_rate: f64,
    adjust_pitch_with_playback_rate: bool,
}

impl PlaybackController {
    /// Create a controller with default configuration
    pub fn new<B>(backend: B) -> Self
    where
        B: AudioBackend + 'static,
    {
        Self::build(Box::new(backend), &EngineConfig::default())
    }

    /// Create a controller from a validated configuration
    ///
    /// No events fire during construction.
    pub fn with_config<B>(backend: B, config: &EngineConfig) -> Result<Self>
    where
        B: AudioBackend + 'static,
    {
        config.validate()?;
        Ok(Self::build(Box::new(backend), config))
    }

    fn build(backend: Box<dyn AudioBackend>, config: &EngineConfig) -> Self {
        let mut controller = Self {
            id: EngineId::new(),
            backend,
            track: None,
            next_generation: 1,
            next_play_state: 1,
            listeners: EventRegistry::new(),
            scheduler: Scheduler::new(config.tick_interval_millis),
            pitch_shifter: None,
            volume: config.volume,
            muted: config.muted,
            playback_rate: config.playback_rate,
            adjust_pitch_with_playback_rate: config.adjust_pitch_with_playback_rate,
        };
        controller.apply_output_gain();
        controller
    }

    pub fn id(&self) -> EngineId {
        self.id
    }

    // ========================================================================
    // Observers
    // ========================================================================

    pub fn subscribe<S>(&mut self, sink: S) -> ListenerId
    where
        S: EventSink + 'static,
    {
        self.listeners.subscribe(sink)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn emit(&mut self, kind: EventKind) {
        let event = MediaEvent {
            engine: self.id,
            kind,
        };
        self.listeners.emit(&event);
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Replace the current track and start loading `source`
    ///
    /// The returned ticket must be handed back to `complete_load` with the
    /// loader's result. Any earlier ticket is superseded.
    pub fn load_track(&mut self, source: TrackSource) -> LoadTicket {
        self.stop_running_source();

        let generation = TrackGeneration(self.next_generation);
        self.next_generation += 1;
        debug!("[TRANSPORT] Loading {} (generation {})", source, generation.0);

        self.track = Some(Track::new(generation, source.clone()));
        LoadTicket { generation, source }
    }

    /// Publish a loader result for `ticket`
    ///
    /// Results for a track that is no longer current are discarded without
    /// any event.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: std::result::Result<DecodedAudioBuffer, LoadError>,
    ) {
        let track = match self.track.as_mut() {
            Some(track) if track.generation == ticket.generation && track.is_loading() => track,
            _ => {
                warn!(
                    "[TRANSPORT] Discarding superseded load of {} (generation {})",
                    ticket.source, ticket.generation.0
                );
                return;
            }
        };

        match result {
            Ok(buffer) => {
                info!(
                    "[TRANSPORT] Loaded {} ({:.3}ms, {} ch @ {} Hz)",
                    ticket.source,
                    buffer.duration_millis(),
                    buffer.channels(),
                    buffer.sample_rate()
                );
                track.data = Some(TrackData {
                    buffer: Arc::new(buffer),
                    state: PlayState::Paused {
                        position_millis: 0.0,
                    },
                });
                self.emit(EventKind::LoadedData);
                self.emit(EventKind::CanPlay);
                self.emit(EventKind::CanPlayThrough);
                self.emit(EventKind::TimeUpdate);
            }
            Err(e) => {
                warn!("[TRANSPORT] Failed to load {}: {}", ticket.source, e);
                track.load_failed = true;
                self.emit(EventKind::Error {
                    detail: e.to_string(),
                });
            }
        }
    }

    /// Load `source` synchronously through `loader`
    pub fn load_track_with(&mut self, loader: &dyn Loader, source: TrackSource) {
        let ticket = self.load_track(source);
        let result = loader.load(&ticket.source);
        self.complete_load(ticket, result);
    }

    /// Drop the current track, stopping playback and superseding any load
    pub fn clear_source(&mut self) {
        self.stop_running_source();
        let had_data = self.track.as_ref().is_some_and(|t| t.data.is_some());
        self.track = None;
        debug!("[TRANSPORT] Source cleared");
        if had_data {
            self.emit(EventKind::TimeUpdate);
        }
    }

    // ========================================================================
    // Transport Controls
    // ========================================================================

    /// Start playback from the stored position
    ///
    /// No-op without track data or while already playing.
    pub fn play(&mut self) {
        let Some(position) = self.paused_position() else {
            debug!("[TRANSPORT] Play ignored (no data or already playing)");
            return;
        };
        self.backend.resume();
        self.start_source_at(position);
        debug!("[TRANSPORT] Play from {:.3}ms", position);
        self.emit(EventKind::Play);
    }

    /// Freeze playback at the current position
    ///
    /// No-op unless playing.
    pub fn pause(&mut self) {
        let Some(position) = self.stop_running_source() else {
            debug!("[TRANSPORT] Already paused");
            return;
        };
        self.set_state(PlayState::Paused {
            position_millis: position,
        });
        debug!("[TRANSPORT] Paused at {:.3}ms", position);
        self.emit(EventKind::Pause);
    }

    /// Move to `position_millis`, clamped to the track
    ///
    /// While playing, the running source is replaced by one starting at the
    /// new position. Non-finite targets are ignored.
    pub fn seek(&mut self, position_millis: f64) {
        if !position_millis.is_finite() {
            return;
        }
        let Some(data) = self.data() else {
            return;
        };
        let target = position_millis.clamp(0.0, data.buffer.duration_millis());

        if data.state.is_playing() {
            self.stop_running_source();
            self.start_source_at(target);
        } else {
            self.set_state(PlayState::Paused {
                position_millis: target,
            });
            self.emit(EventKind::TimeUpdate);
        }
        debug!("[TRANSPORT] Seek to {:.3}ms", target);
        self.emit(EventKind::Seeked);
    }

    pub fn seek_secs(&mut self, position_secs: f64) {
        self.seek(position_secs * 1000.0);
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Set the playback rate, clamped to `[MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE]`
    ///
    /// Takes effect immediately while playing without losing position.
    /// Non-finite values are ignored.
    pub fn set_playback_rate(&mut self, rate: f64) {
        if !rate.is_finite() {
            return;
        }
        let rate = rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE);
        if rate == self.playback_rate {
            return;
        }
        self.reconfigure(|controller| controller.playback_rate = rate);
        debug!("[TRANSPORT] Playback rate {}", rate);
        self.emit(EventKind::RateChange);
    }

    pub fn set_adjust_pitch_with_playback_rate(&mut self, adjust: bool) {
        if adjust == self.adjust_pitch_with_playback_rate {
            return;
        }
        self.reconfigure(|controller| controller.adjust_pitch_with_playback_rate = adjust);
        debug!("[TRANSPORT] Pitch compensation {}", adjust);
    }

    /// Set the volume, clamped to `[0, 1]`; NaN is ignored
    pub fn set_volume(&mut self, volume: f64) {
        if volume.is_nan() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        if volume == self.volume {
            return;
        }
        self.volume = volume;
        self.apply_output_gain();
        self.emit(EventKind::VolumeChange);
    }

    /// Silence output without touching the stored volume
    pub fn set_muted(&mut self, muted: bool) {
        if muted == self.muted {
            return;
        }
        self.muted = muted;
        self.apply_output_gain();
        self.emit(EventKind::VolumeChange);
    }

    /// Output device selection is not supported
    pub fn set_sink_id(&mut self, device_id: &str) -> Result<()> {
        warn!("[TRANSPORT] Cannot select output device '{}'", device_id);
        Err(EngineError::UnsupportedOperation {
            operation: "set_sink_id",
        })
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    pub fn adjust_pitch_with_playback_rate(&self) -> bool {
        self.adjust_pitch_with_playback_rate
    }

    /// Gain currently applied by the output stage
    pub fn effective_gain(&self) -> f64 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    // ========================================================================
    // Asynchronous notifications
    // ========================================================================

    /// Deliver pending backend notifications and due scheduler ticks
    ///
    /// Hosts call this at their redraw cadence.
    pub fn poll(&mut self) {
        for token in self.backend.take_ended() {
            self.handle_natural_end(token);
        }

        let now = self.backend.now_millis();
        if self.scheduler.take_due(now) && !self.paused() {
            self.emit(EventKind::TimeUpdate);
            self.scheduler.arm(now);
        }
    }

    /// A backend source finished on its own
    ///
    /// Applies only if `token` belongs to the state currently installed and
    /// that state was not stopped by the controller.
    pub fn handle_natural_end(&mut self, token: EndedToken) {
        let is_current = matches!(
            self.data().map(|d| &d.state),
            Some(PlayState::Playing {
                id,
                suppress_ended_event: false,
                ..
            }) if *id == token.state
        );
        if !is_current {
            debug!(
                "[TRANSPORT] Ignoring stale end of source {} (state {})",
                token.source.0, token.state.0
            );
            return;
        }

        self.scheduler.cancel();
        self.set_state(PlayState::Paused {
            position_millis: 0.0,
        });
        debug!("[TRANSPORT] Track ended");
        self.emit(EventKind::Ended);
    }

    // ========================================================================
    // State Queries
    // ========================================================================

    /// Precise position of the current track
    ///
    /// 0 when there is no track data.
    pub fn current_time_millis(&self) -> f64 {
        let Some(data) = self.data() else {
            return 0.0;
        };
        match &data.state {
            PlayState::Paused { position_millis } => *position_millis,
            PlayState::Playing {
                effective_start_time_millis,
                ..
            } => self.running_position(*effective_start_time_millis, &data.buffer),
        }
    }

    pub fn current_time_secs(&self) -> f64 {
        self.current_time_millis() / 1000.0
    }

    /// Duration of the loaded buffer; 0 without track data
    pub fn duration_millis(&self) -> f64 {
        self.data().map(|d| d.buffer.duration_millis()).unwrap_or(0.0)
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_millis() / 1000.0
    }

    /// True whenever the state is not `Playing`
    pub fn paused(&self) -> bool {
        !self.data().is_some_and(|d| d.state.is_playing())
    }

    pub fn src(&self) -> Option<&TrackSource> {
        self.track.as_ref().map(|t| &t.source)
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn play_state(&self) -> Option<&PlayState> {
        self.data().map(|d| &d.state)
    }

    pub fn is_loading(&self) -> bool {
        self.track.as_ref().is_some_and(|t| t.is_loading())
    }

    pub fn ready_state(&self) -> ReadyState {
        if self.data().is_some() {
            ReadyState::HaveEnoughData
        } else {
            ReadyState::HaveNothing
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn data(&self) -> Option<&TrackData> {
        self.track.as_ref().and_then(|t| t.data.as_ref())
    }

    fn data_mut(&mut self) -> Option<&mut TrackData> {
        self.track.as_mut().and_then(|t| t.data.as_mut())
    }

    fn set_state(&mut self, state: PlayState) {
        if let Some(data) = self.data_mut() {
            data.state = state;
        }
    }

    fn paused_position(&self) -> Option<f64> {
        match self.data()?.state {
            PlayState::Paused { position_millis } => Some(position_millis),
            PlayState::Playing { .. } => None,
        }
    }

    fn running_position(&self, anchor_millis: f64, buffer: &DecodedAudioBuffer) -> f64 {
        let now = self.backend.now_millis();
        to_position(now, anchor_millis, self.playback_rate).clamp(0.0, buffer.duration_millis())
    }

    /// Stop the running source, if any, and return the position it reached
    ///
    /// The stale `Playing` state is left flagged as suppressed; callers
    /// install its replacement.
    fn stop_running_source(&mut self) -> Option<f64> {
        let now = self.backend.now_millis();
        let rate = self.playback_rate;
        let data = self.track.as_mut()?.data.as_mut()?;
        let duration = data.buffer.duration_millis();

        let PlayState::Playing {
            source,
            suppress_ended_event,
            effective_start_time_millis,
            ..
        } = &mut data.state
        else {
            return None;
        };

        *suppress_ended_event = true;
        let position = to_position(now, *effective_start_time_millis, rate).clamp(0.0, duration);
        let source = *source;

        self.backend.stop(source);
        self.scheduler.cancel();
        debug!("[TRANSPORT] Stopped source {} at {:.3}ms", source.0, position);
        Some(position)
    }

    /// Create, route and start a source at `position_millis`, installing
    /// the matching `Playing` state
    ///
    /// Callers must have stopped any previous source.
    fn start_source_at(&mut self, position_millis: f64) {
        let Some(buffer) = self.data().map(|d| Arc::clone(&d.buffer)) else {
            return;
        };
        let rate = self.playback_rate;

        let source = self.backend.create_source(buffer);
        self.backend.set_playback_rate(source, rate);
        if needs_pitch_compensation(rate, self.adjust_pitch_with_playback_rate) {
            let shifter = self.ensure_pitch_shifter();
            self.backend
                .set_transpose_semitones(shifter, transpose_semitones_for_rate(rate));
            self.backend
                .connect(source, Destination::PitchShifter(shifter));
        } else {
            self.backend.connect(source, Destination::Output);
        }

        let now = self.backend.now_millis();
        self.backend.start(source, position_millis / 1000.0);

        let id = PlayStateId(self.next_play_state);
        self.next_play_state += 1;
        self.set_state(PlayState::Playing {
            id,
            source,
            suppress_ended_event: false,
            effective_start_time_millis: to_anchor(now, position_millis, rate),
        });
        self.backend.on_ended(source, EndedToken { source, state: id });
        self.scheduler.arm(now);
    }

    fn ensure_pitch_shifter(&mut self) -> PitchShifterHandle {
        match self.pitch_shifter {
            Some(shifter) => shifter,
            None => {
                let shifter = self.backend.create_pitch_shifter();
                self.pitch_shifter = Some(shifter);
                shifter
            }
        }
    }

    /// Pause, apply `change`, resume from the captured position
    fn reconfigure(&mut self, change: impl FnOnce(&mut Self)) {
        let resume_at = self.stop_running_source();
        change(&mut *self);
        if let Some(position) = resume_at {
            self.start_source_at(position);
        }
    }

    fn apply_output_gain(&mut self) {
        let gain = self.effective_gain();
        self.backend.set_output_gain(gain);
    }
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("id", &self.id)
            .field("track", &self.track)
            .field("volume", &self.volume)
            .field("muted", &self.muted)
            .field("playback_rate", &self.playback_rate)
            .field(
                "adjust_pitch_with_playback_rate",
                &self.adjust_pitch_with_playback_rate,
            )
            .finish()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
