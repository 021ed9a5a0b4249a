//! Playback Engine Module
//!
//! Core playback engine including:
//! - Track/PlayState data model
//! - Anchor/position time math
//! - The playback controller state machine
//! - Backend, loader and event boundaries

pub mod backend;
pub mod buffer;
pub mod clock;
pub mod events;
pub mod loader;
pub mod scheduler;
pub mod simulated;
pub mod timeclock;
pub mod track;
pub mod transport;

pub use backend::{AudioBackend, Destination, EndedToken, PitchShifterHandle, SourceHandle};
pub use buffer::{ChannelLayout, DecodedAudioBuffer};
pub use clock::{Clock, ManualClock};
pub use events::{EngineId, EventKind, EventLog, EventRegistry, EventSink, ListenerId, MediaEvent};
pub use loader::{LoadTicket, Loader, WavLoader};
pub use scheduler::Scheduler;
pub use simulated::{SimulatedBackend, SimulatedSource};
pub use track::{PlayState, PlayStateId, Track, TrackData, TrackGeneration, TrackSource};
pub use transport::{PlaybackController, ReadyState, MAX_PLAYBACK_RATE, MIN_PLAYBACK_RATE};
