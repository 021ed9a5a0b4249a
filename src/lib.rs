//! Playhead - Precise Playback Engine
//!
//! Tracks the play/pause position of a single audio track with millisecond
//! accuracy, independent of the audio rendering technology, with variable
//! playback rate and optional pitch compensation.
//!
//! # Architecture
//!
//! - `engine::PlaybackController` owns the play state and is its only writer
//! - `engine::AudioBackend` renders audio and provides the domain clock
//! - `engine::Loader` decodes sources into buffers
//! - Listeners receive media-element style events synchronously

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
#[cfg(feature = "runtime")]
pub mod runtime;

pub use config::EngineConfig;
pub use engine::PlaybackController;
pub use error::{EngineError, LoadError, Result};
