//! Track data model
//!
//! A `Track` is replaced wholesale on every load; only `TrackData::state`
//! is ever mutated in place, and only by the playback controller.

use std::fmt;
use std::sync::Arc;

use crate::engine::backend::SourceHandle;
use crate::engine::buffer::DecodedAudioBuffer;

/// Where a track's audio comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSource {
    /// A path or URL
    ByReference(String),
    /// Raw encoded bytes held in memory
    ByBlob(Arc<[u8]>),
}

impl TrackSource {
    pub fn by_reference(url: impl Into<String>) -> Self {
        TrackSource::ByReference(url.into())
    }

    pub fn by_blob(bytes: impl Into<Arc<[u8]>>) -> Self {
        TrackSource::ByBlob(bytes.into())
    }
}

impl fmt::Display for TrackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackSource::ByReference(url) => write!(f, "{}", url),
            TrackSource::ByBlob(bytes) => write!(f, "<blob {} bytes>", bytes.len()),
        }
    }
}

/// Identity of one installed track
///
/// Generations are strictly increasing per controller, so a load result
/// can be matched against the track it was started for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackGeneration(pub(crate) u64);

/// Identity of one installed `Playing` state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayStateId(pub(crate) u64);

/// Play/pause state of a loaded track
#[derive(Debug, Clone, PartialEq)]
pub enum PlayState {
    /// Frozen at a position in `[0, duration]`
    Paused { position_millis: f64 },
    /// A backend source is running
    Playing {
        id: PlayStateId,
        source: SourceHandle,
        /// Set before the controller stops `source` itself
        suppress_ended_event: bool,
        effective_start_time_millis: f64,
    },
}

impl PlayState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlayState::Playing { .. })
    }
}

impl fmt::Display for PlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayState::Paused { position_millis } => write!(f, "Paused({:.3}ms)", position_millis),
            PlayState::Playing { id, source, .. } => {
                write!(f, "Playing(state {}, source {})", id.0, source.0)
            }
        }
    }
}

/// A decoded track ready to play
#[derive(Debug, Clone)]
pub struct TrackData {
    pub buffer: Arc<DecodedAudioBuffer>,
    pub state: PlayState,
}

/// The engine's current track
///
/// `data` stays `None` while the load is in flight and forever if it fails.
#[derive(Debug)]
pub struct Track {
    pub(crate) generation: TrackGeneration,
    pub(crate) source: TrackSource,
    pub(crate) data: Option<TrackData>,
    pub(crate) load_failed: bool,
}

impl Track {
    pub(crate) fn new(generation: TrackGeneration, source: TrackSource) -> Self {
        Self {
            generation,
            source,
            data: None,
            load_failed: false,
        }
    }

    pub fn generation(&self) -> TrackGeneration {
        self.generation
    }

    pub fn source(&self) -> &TrackSource {
        &self.source
    }

    pub fn data(&self) -> Option<&TrackData> {
        self.data.as_ref()
    }

    /// Still waiting for the loader
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && !self.load_failed
    }

    pub fn load_failed(&self) -> bool {
        self.load_failed
    }
}
