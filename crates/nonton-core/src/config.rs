//! Session, engine and engagement configuration

use crate::Error;
use serde::{Deserialize, Serialize};

/// Options recognized at session construction
///
/// Missing keys take their defaults, so `{"autoplay": false}` is a valid
/// configuration object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Request playback as soon as the media is ready
    pub autoplay: bool,
    /// Show the media element's native controls
    pub controls: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            controls: true,
        }
    }
}

impl SessionConfig {
    /// Parse a JSON configuration object, filling in defaults
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Tunables handed to the adaptive streaming engine
///
/// Field names serialize to the hls.js config keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Target forward buffer (seconds)
    pub max_buffer_length: f64,
    /// Hard ceiling on the forward buffer (seconds)
    pub max_max_buffer_length: f64,
    /// Played media kept behind the playhead (seconds)
    pub back_buffer_length: f64,
    /// Demux segments on a background worker
    pub enable_worker: bool,
    pub low_latency_mode: bool,
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_buffer_length: 30.0,
            max_max_buffer_length: 600.0,
            back_buffer_length: 90.0,
            enable_worker: true,
            low_latency_mode: true,
            debug: false,
        }
    }
}

impl EngineConfig {
    /// Long forward buffer for on-demand titles
    pub fn vod() -> Self {
        Self {
            max_buffer_length: 60.0,
            back_buffer_length: 120.0,
            low_latency_mode: false,
            ..Default::default()
        }
    }

    /// Short buffers that keep live streams close to the edge
    pub fn low_latency() -> Self {
        Self {
            max_buffer_length: 10.0,
            max_max_buffer_length: 30.0,
            back_buffer_length: 30.0,
            ..Default::default()
        }
    }

    /// Look up a preset by name (`default`, `vod`, `low-latency`)
    pub fn preset(name: &str) -> crate::Result<Self> {
        match name.to_lowercase().as_str() {
            "default" => Ok(Self::default()),
            "vod" => Ok(Self::vod()),
            "low-latency" | "low_latency" | "live" => Ok(Self::low_latency()),
            other => Err(Error::InvalidConfig(format!("unknown engine preset: {}", other))),
        }
    }

    /// Reject buffer settings the engine cannot honor
    pub fn validate(&self) -> crate::Result<()> {
        let lengths = [
            ("maxBufferLength", self.max_buffer_length),
            ("maxMaxBufferLength", self.max_max_buffer_length),
            ("backBufferLength", self.back_buffer_length),
        ];
        for (key, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!("{} must be a non-negative number", key)));
            }
        }

        if self.max_buffer_length > self.max_max_buffer_length {
            return Err(Error::InvalidConfig(format!(
                "maxBufferLength ({}) exceeds maxMaxBufferLength ({})",
                self.max_buffer_length, self.max_max_buffer_length
            )));
        }
        Ok(())
    }
}

/// Engagement counter settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    /// Tick period in milliseconds
    pub interval_ms: u32,
    /// Points credited per unpaused tick
    pub credit_per_tick: u32,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            credit_per_tick: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::default();
        assert!(config.autoplay);
        assert!(config.controls);
    }

    #[test]
    fn test_partial_session_config() {
        let config = SessionConfig::from_json(r#"{"autoplay": false}"#).unwrap();
        assert!(!config.autoplay);
        assert!(config.controls);

        let config = SessionConfig::from_json("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_engine_config_keys() {
        let json = serde_json::to_value(EngineConfig::default()).unwrap();
        assert_eq!(json["maxBufferLength"], 30.0);
        assert_eq!(json["maxMaxBufferLength"], 600.0);
        assert_eq!(json["backBufferLength"], 90.0);
        assert_eq!(json["enableWorker"], true);
        assert_eq!(json["lowLatencyMode"], true);
    }

    #[test]
    fn test_engine_presets() {
        let vod = EngineConfig::vod();
        assert!(!vod.low_latency_mode);
        assert!(vod.max_buffer_length > EngineConfig::default().max_buffer_length);
        assert!(vod.validate().is_ok());

        let live = EngineConfig::low_latency();
        assert!(live.low_latency_mode);
        assert!(live.max_buffer_length < EngineConfig::default().max_buffer_length);
        assert!(live.max_max_buffer_length < EngineConfig::default().max_max_buffer_length);
        assert!(live.validate().is_ok());

        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(EngineConfig::preset("VOD").unwrap(), EngineConfig::vod());
        assert_eq!(EngineConfig::preset("low-latency").unwrap(), EngineConfig::low_latency());
        assert_eq!(EngineConfig::preset("default").unwrap(), EngineConfig::default());

        let err = EngineConfig::preset("turbo").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_invalid_engine_config() {
        let inverted = EngineConfig {
            max_buffer_length: 900.0,
            ..Default::default()
        };
        assert!(matches!(inverted.validate(), Err(Error::InvalidConfig(_))));

        let negative = EngineConfig {
            back_buffer_length: -1.0,
            ..Default::default()
        };
        assert!(matches!(negative.validate(), Err(Error::InvalidConfig(_))));

        let nan = EngineConfig {
            max_buffer_length: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }
}
