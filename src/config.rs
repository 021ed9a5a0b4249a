//! Engine configuration
//!
//! Initial values for the engine-wide knobs, loadable from JSON. Runtime
//! setters clamp silently; a configuration file is validated strictly
//! instead, so typos surface as errors rather than surprising defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::scheduler::DEFAULT_TICK_INTERVAL_MILLIS;
use crate::engine::transport::{MAX_PLAYBACK_RATE, MIN_PLAYBACK_RATE};
use crate::error::{EngineError, Result};

fn default_volume() -> f64 {
    1.0
}

fn default_playback_rate() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_tick_interval() -> f64 {
    DEFAULT_TICK_INTERVAL_MILLIS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Output volume in `[0, 1]`
    #[serde(default = "default_volume")]
    pub volume: f64,

    #[serde(default)]
    pub muted: bool,

    #[serde(default = "default_playback_rate")]
    pub playback_rate: f64,

    /// Route rate-changed playback through the pitch shifter
    #[serde(default = "default_true")]
    pub adjust_pitch_with_playback_rate: bool,

    /// Interval between `timeupdate` ticks while playing
    #[serde(default = "default_tick_interval")]
    pub tick_interval_millis: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            muted: false,
            playback_rate: default_playback_rate(),
            adjust_pitch_with_playback_rate: true,
            tick_interval_millis: default_tick_interval(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| EngineError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.volume.is_finite() || !(0.0..=1.0).contains(&self.volume) {
            return Err(EngineError::InvalidArgument {
                name: "volume",
                value: self.volume.to_string(),
            });
        }
        if !self.playback_rate.is_finite()
            || !(MIN_PLAYBACK_RATE..=MAX_PLAYBACK_RATE).contains(&self.playback_rate)
        {
            return Err(EngineError::InvalidArgument {
                name: "playback_rate",
                value: self.playback_rate.to_string(),
            });
        }
        if !self.tick_interval_millis.is_finite() || self.tick_interval_millis <= 0.0 {
            return Err(EngineError::InvalidArgument {
                name: "tick_interval_millis",
                value: self.tick_interval_millis.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use test_case::test_case;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.volume, 1.0);
        assert!(!config.muted);
        assert_eq!(config.playback_rate, 1.0);
        assert!(config.adjust_pitch_with_playback_rate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "playback_rate": 1.5 }"#).unwrap();
        assert_eq!(config.playback_rate, 1.5);
        assert_eq!(config.volume, 1.0);
        assert_eq!(config.tick_interval_millis, DEFAULT_TICK_INTERVAL_MILLIS);
    }

    #[test]
    fn test_out_of_range_volume_rejected() {
        let err = EngineConfig::from_json_str(r#"{ "volume": 1.5 }"#).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
    }

    #[test_case(r#"{ "playback_rate": 0.0 }"#, "playback_rate" ; "zero rate")]
    #[test_case(r#"{ "playback_rate": 32.0 }"#, "playback_rate" ; "rate above maximum")]
    #[test_case(r#"{ "volume": -0.1 }"#, "volume" ; "negative volume")]
    #[test_case(r#"{ "tick_interval_millis": 0.0 }"#, "tick_interval_millis" ; "zero tick")]
    fn test_out_of_range_field_rejected(json: &str, field: &str) {
        match EngineConfig::from_json_str(json) {
            Err(EngineError::InvalidArgument { name, .. }) => assert_eq!(name, field),
            other => panic!("expected InvalidArgument, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = EngineConfig::from_json_str(r#"{ "volum": 0.5 }"#).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "muted": true, "volume": 0.25 }}"#).unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert!(config.muted);
        assert_eq!(config.volume, 0.25);
    }

    #[test]
    fn test_json_round_trip_keeps_values() {
        let config = EngineConfig {
            volume: 0.5,
            playback_rate: 0.75,
            ..EngineConfig::default()
        };
        let parsed = EngineConfig::from_json_str(&config.to_json_string().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
