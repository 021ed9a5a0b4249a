//! Audio backend boundary
//!
//! The controller never renders audio itself. It drives an `AudioBackend`
//! through opaque source handles and learns about natural ends through
//! `EndedToken`s it registered when starting a source.

use std::sync::Arc;

use crate::engine::buffer::DecodedAudioBuffer;
use crate::engine::clock::Clock;
use crate::engine::track::PlayStateId;

/// Opaque handle to one backend playback source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceHandle(pub u64);

/// Opaque handle to a backend pitch-shifter node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PitchShifterHandle(pub u64);

/// Where a source's output is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Straight to the output (gain) stage
    Output,
    /// Through a pitch shifter, which itself feeds the output stage
    PitchShifter(PitchShifterHandle),
}

/// Registration returned to the controller when a source ends on its own
///
/// Carries the identity of the `Playing` state the source was started for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndedToken {
    pub source: SourceHandle,
    pub state: PlayStateId,
}

/// Audio rendering collaborator
///
/// Implementations own the signal graph, the output gain stage and the
/// playback-domain clock. Calls arrive on the controller's thread only.
pub trait AudioBackend: Clock + Send {
    /// Create a (not yet started) source for `buffer`
    fn create_source(&mut self, buffer: Arc<DecodedAudioBuffer>) -> SourceHandle;

    fn connect(&mut self, source: SourceHandle, destination: Destination);

    fn set_playback_rate(&mut self, source: SourceHandle, rate: f64);

    /// Start playing `source` from `offset_secs` into its buffer
    fn start(&mut self, source: SourceHandle, offset_secs: f64);

    /// Stop `source` immediately; a stopped source never reports an end
    fn stop(&mut self, source: SourceHandle);

    /// Register the token to report when `source` finishes on its own
    fn on_ended(&mut self, source: SourceHandle, token: EndedToken);

    /// Drain natural-end notifications collected since the last call
    ///
    /// Backends that push notifications through
    /// `PlaybackController::handle_natural_end` can keep the default.
    fn take_ended(&mut self) -> Vec<EndedToken> {
        Vec::new()
    }

    /// Leave a suspended audio context
    fn resume(&mut self);

    /// Effective gain of the output stage (volume, or 0 when muted)
    fn set_output_gain(&mut self, gain: f64);

    /// Create a pitch shifter connected to the output stage
    fn create_pitch_shifter(&mut self) -> PitchShifterHandle;

    fn set_transpose_semitones(&mut self, shifter: PitchShifterHandle, semitones: f64);
}

/// Transposition that cancels the pitch change caused by `rate`
///
/// Playing at rate `r` shifts pitch by `12 * log2(r)` semitones; the
/// shifter applies the inverse.
#[inline]
pub fn transpose_semitones_for_rate(rate: f64) -> f64 {
    12.0 * (1.0 / rate).log2()
}

/// Whether a source started now must go through the pitch shifter
#[inline]
pub fn needs_pitch_compensation(rate: f64, adjust_pitch_with_playback_rate: bool) -> bool {
    adjust_pitch_with_playback_rate && rate != 1.0
}
