//! Deterministic in-process audio backend
//!
//! Renders nothing. Keeps a manual domain clock and a record of every call
//! so playback can be driven and inspected without audio hardware. Clones
//! share state: hand one to the controller, keep one to advance time.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::backend::{
    AudioBackend, Destination, EndedToken, PitchShifterHandle, SourceHandle,
};
use crate::engine::buffer::DecodedAudioBuffer;
use crate::engine::clock::Clock;

/// Everything the simulated backend knows about one source
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedSource {
    pub handle: SourceHandle,
    pub buffer_duration_millis: f64,
    pub destination: Option<Destination>,
    pub rate: f64,
    /// Domain time of `start`
    pub started_at_millis: Option<f64>,
    pub offset_millis: f64,
    pub stopped: bool,
    pub ended: bool,
    pub ended_token: Option<EndedToken>,
}

impl SimulatedSource {
    /// Started and neither stopped nor finished
    pub fn is_live(&self) -> bool {
        self.started_at_millis.is_some() && !self.stopped && !self.ended
    }

    /// Domain time at which the source runs out of buffer
    pub fn end_time_millis(&self) -> Option<f64> {
        let started = self.started_at_millis?;
        let remaining = (self.buffer_duration_millis - self.offset_millis).max(0.0);
        Some(started + remaining / self.rate)
    }
}

#[derive(Debug)]
struct SimState {
    now_millis: f64,
    next_handle: u64,
    sources: Vec<SimulatedSource>,
    shifters: Vec<(PitchShifterHandle, f64)>,
    output_gain: f64,
    resume_calls: usize,
    pending_ended: Vec<EndedToken>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            now_millis: 0.0,
            next_handle: 1,
            sources: Vec::new(),
            shifters: Vec::new(),
            output_gain: 1.0,
            resume_calls: 0,
            pending_ended: Vec::new(),
        }
    }
}

impl SimState {
    fn source_mut(&mut self, handle: SourceHandle) -> Option<&mut SimulatedSource> {
        self.sources.iter_mut().find(|s| s.handle == handle)
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }
}

/// Shared handle to a simulated backend
#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the domain clock, finishing any source that runs out of buffer
    pub fn advance(&self, millis: f64) {
        if !millis.is_finite() || millis <= 0.0 {
            return;
        }
        let mut state = self.state.lock();
        state.now_millis += millis;
        let now = state.now_millis;

        let mut finished = Vec::new();
        for source in state.sources.iter_mut().filter(|s| s.is_live()) {
            if matches!(source.end_time_millis(), Some(end) if now >= end) {
                source.ended = true;
                if let Some(token) = source.ended_token {
                    finished.push(token);
                }
            }
        }
        state.pending_ended.extend(finished);
    }

    /// Queue a natural-end notification for `handle` whatever its state
    ///
    /// Models a callback that was already in flight when the source was
    /// stopped.
    pub fn inject_ended(&self, handle: SourceHandle) {
        let mut state = self.state.lock();
        let token = state
            .sources
            .iter()
            .find(|s| s.handle == handle)
            .and_then(|s| s.ended_token);
        if let Some(token) = token {
            state.pending_ended.push(token);
        }
    }

    pub fn sources(&self) -> Vec<SimulatedSource> {
        self.state.lock().sources.clone()
    }

    pub fn source(&self, handle: SourceHandle) -> Option<SimulatedSource> {
        self.state
            .lock()
            .sources
            .iter()
            .find(|s| s.handle == handle)
            .cloned()
    }

    pub fn live_sources(&self) -> Vec<SimulatedSource> {
        self.state
            .lock()
            .sources
            .iter()
            .filter(|s| s.is_live())
            .cloned()
            .collect()
    }

    pub fn created_sources(&self) -> usize {
        self.state.lock().sources.len()
    }

    pub fn output_gain(&self) -> f64 {
        self.state.lock().output_gain
    }

    pub fn resume_calls(&self) -> usize {
        self.state.lock().resume_calls
    }

    pub fn pitch_shifters(&self) -> Vec<(PitchShifterHandle, f64)> {
        self.state.lock().shifters.clone()
    }

    pub fn transpose_semitones(&self, shifter: PitchShifterHandle) -> Option<f64> {
        self.state
            .lock()
            .shifters
            .iter()
            .find(|(h, _)| *h == shifter)
            .map(|(_, semitones)| *semitones)
    }
}

impl Clock for SimulatedBackend {
    fn now_millis(&self) -> f64 {
        self.state.lock().now_millis
    }
}

impl AudioBackend for SimulatedBackend {
    fn create_source(&mut self, buffer: Arc<DecodedAudioBuffer>) -> SourceHandle {
        let mut state = self.state.lock();
        let handle = SourceHandle(state.allocate());
        state.sources.push(SimulatedSource {
            handle,
            buffer_duration_millis: buffer.duration_millis(),
            destination: None,
            rate: 1.0,
            started_at_millis: None,
            offset_millis: 0.0,
            stopped: false,
            ended: false,
            ended_token: None,
        });
        handle
    }

    fn connect(&mut self, source: SourceHandle, destination: Destination) {
        if let Some(s) = self.state.lock().source_mut(source) {
            s.destination = Some(destination);
        }
    }

    fn set_playback_rate(&mut self, source: SourceHandle, rate: f64) {
        if let Some(s) = self.state.lock().source_mut(source) {
            s.rate = rate;
        }
    }

    fn start(&mut self, source: SourceHandle, offset_secs: f64) {
        let mut state = self.state.lock();
        let now = state.now_millis;
        if let Some(s) = state.source_mut(source) {
            s.started_at_millis = Some(now);
            s.offset_millis = offset_secs * 1000.0;
        }
    }

    fn stop(&mut self, source: SourceHandle) {
        if let Some(s) = self.state.lock().source_mut(source) {
            s.stopped = true;
        }
    }

    fn on_ended(&mut self, source: SourceHandle, token: EndedToken) {
        if let Some(s) = self.state.lock().source_mut(source) {
            s.ended_token = Some(token);
        }
    }

    fn take_ended(&mut self) -> Vec<EndedToken> {
        std::mem::take(&mut self.state.lock().pending_ended)
    }

    fn resume(&mut self) {
        self.state.lock().resume_calls += 1;
    }

    fn set_output_gain(&mut self, gain: f64) {
        self.state.lock().output_gain = gain;
    }

    fn create_pitch_shifter(&mut self) -> PitchShifterHandle {
        let mut state = self.state.lock();
        let handle = PitchShifterHandle(state.allocate());
        state.shifters.push((handle, 0.0));
        handle
    }

    fn set_transpose_semitones(&mut self, shifter: PitchShifterHandle, semitones: f64) {
        let mut state = self.state.lock();
        if let Some(entry) = state.shifters.iter_mut().find(|(h, _)| *h == shifter) {
            entry.1 = semitones;
        }
    }
}
