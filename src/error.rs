//! Error handling for Playhead
//!
//! Load failures never cross the controller's public operations; they are
//! turned into `error` events at the load boundary. `EngineError` covers the
//! few operations that can fail explicitly.

use thiserror::Error;

/// Result type alias for Playhead operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failure while turning a track source into a decoded buffer
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Invalid audio: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Unsupported source: {source_desc}")]
    UnsupportedSource { source_desc: String },

    #[error("Audio contains no samples")]
    EmptyAudio,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            LoadError::NotFound { .. } => "NOT_FOUND",
            LoadError::InvalidAudio { .. } => "INVALID_AUDIO",
            LoadError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            LoadError::UnsupportedSource { .. } => "UNSUPPORTED_SOURCE",
            LoadError::EmptyAudio => "EMPTY_AUDIO",
            LoadError::Io(_) => "IO_ERROR",
        }
    }
}

/// Main error type for Playhead operations
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Load failed: {0}")]
    Load(#[from] LoadError),

    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation { operation: &'static str },

    #[error("Invalid argument: {name} = {value}")]
    InvalidArgument { name: &'static str, value: String },

    #[error("Configuration error: {reason}")]
    Config { reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Engine task is no longer running")]
    EngineStopped,
}

impl EngineError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::Load(inner) => inner.error_code(),
            EngineError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            EngineError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            EngineError::Config { .. } => "CONFIG_ERROR",
            EngineError::Serialization(_) => "SERIALIZATION_ERROR",
            EngineError::Io(_) => "IO_ERROR",
            EngineError::EngineStopped => "ENGINE_STOPPED",
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors leave the engine fully usable; the caller can
    /// retry with a different source or argument.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::EngineStopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = EngineError::UnsupportedOperation {
            operation: "set_sink_id",
        };
        assert_eq!(err.error_code(), "UNSUPPORTED_OPERATION");
        assert_eq!(err.to_string(), "Unsupported operation: set_sink_id");
    }

    #[test]
    fn test_load_error_code_passes_through() {
        let err: EngineError = LoadError::EmptyAudio.into();
        assert_eq!(err.error_code(), "EMPTY_AUDIO");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_engine_stopped_not_recoverable() {
        assert!(!EngineError::EngineStopped.is_recoverable());
    }
}
