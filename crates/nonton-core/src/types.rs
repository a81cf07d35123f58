//! Core types for Nonton playback sessions

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a session delivers media to its element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Segmented stream driven by a client-side engine (hls.js)
    AdaptiveEngine,
    /// Segmented stream played by the media element itself
    NativeAdaptive,
    /// Plain file download
    Progressive,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::AdaptiveEngine => "adaptive_engine",
            DeliveryMode::NativeAdaptive => "native_adaptive",
            DeliveryMode::Progressive => "progressive",
        }
    }
}

impl std::fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities advertised by the runtime hosting a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// A general-purpose adaptive streaming engine can be constructed
    pub adaptive_engine: bool,
    /// The media element plays segmented streams natively
    pub native_adaptive: bool,
}

impl PlatformCapabilities {
    pub fn new(adaptive_engine: bool, native_adaptive: bool) -> Self {
        Self { adaptive_engine, native_adaptive }
    }
}

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Constructed, nothing built yet
    Uninitialized,
    /// Handles built, waiting for playback to start
    Initializing,
    /// Media element is playing
    Playing,
    /// Media element is paused
    Paused,
    /// Unrecoverable stream fault, teardown in progress
    Errored,
    /// All handles released
    Destroyed,
}

impl LifecycleState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, target),
            // From Uninitialized
            (Uninitialized, Initializing) | (Uninitialized, Destroyed) |
            // From Initializing
            (Initializing, Playing) | (Initializing, Paused) | (Initializing, Errored) | (Initializing, Destroyed) |
            // From Playing
            (Playing, Paused) | (Playing, Errored) | (Playing, Destroyed) |
            // From Paused
            (Paused, Playing) | (Paused, Errored) | (Paused, Destroyed) |
            // From Errored
            (Errored, Destroyed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Destroyed)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Uninitialized => write!(f, "uninitialized"),
            LifecycleState::Initializing => write!(f, "initializing"),
            LifecycleState::Playing => write!(f, "playing"),
            LifecycleState::Paused => write!(f, "paused"),
            LifecycleState::Errored => write!(f, "errored"),
            LifecycleState::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// Category of a streaming engine error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Media,
    KeySystem,
    Mux,
    Other,
}

impl ErrorKind {
    /// Map an hls.js `ErrorTypes` value onto a kind
    pub fn from_engine_type(value: &str) -> Self {
        match value {
            "networkError" => ErrorKind::Network,
            "mediaError" => ErrorKind::Media,
            "keySystemError" => ErrorKind::KeySystem,
            "muxError" => ErrorKind::Mux,
            _ => ErrorKind::Other,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network"),
            ErrorKind::Media => write!(f, "media"),
            ErrorKind::KeySystem => write!(f, "key_system"),
            ErrorKind::Mux => write!(f, "mux"),
            ErrorKind::Other => write!(f, "other"),
        }
    }
}

/// Error reported by the streaming engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamError {
    pub fatal: bool,
    pub kind: ErrorKind,
    /// Engine-specific detail string (e.g. `manifestLoadError`)
    #[serde(default)]
    pub details: String,
}

impl StreamError {
    pub fn fatal(kind: ErrorKind, details: impl Into<String>) -> Self {
        Self { fatal: true, kind, details: details.into() }
    }

    pub fn non_fatal(kind: ErrorKind, details: impl Into<String>) -> Self {
        Self { fatal: false, kind, details: details.into() }
    }
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = if self.fatal { "fatal" } else { "non-fatal" };
        if self.details.is_empty() {
            write!(f, "{} {} error", severity, self.kind)
        } else {
            write!(f, "{} {} error ({})", severity, self.kind, self.details)
        }
    }
}

/// Notifications emitted by the streaming engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    ManifestParsed { level_count: usize },
    Error(StreamError),
    LevelSwitched { level: usize },
}

/// Notifications emitted by the media element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaEvent {
    LoadedMetadata,
    Play,
    Pause,
    Ended,
}

/// Rendition as the engine reports it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineLevel {
    pub height: u32,
    pub width: u32,
    /// Bits per second
    pub bitrate: u64,
}

/// Selectable quality level exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityLevel {
    pub index: usize,
    pub height: u32,
    pub width: u32,
    pub bitrate: u64,
}

impl QualityLevel {
    pub fn from_engine(index: usize, level: EngineLevel) -> Self {
        Self {
            index,
            height: level.height,
            width: level.width,
            bitrate: level.bitrate,
        }
    }

    /// Returns quality tier name
    pub fn quality_name(&self) -> &'static str {
        match self.height {
            0 => "auto",
            1..=240 => "240p",
            241..=360 => "360p",
            361..=480 => "480p",
            481..=720 => "720p",
            721..=1080 => "1080p",
            1081..=1440 => "1440p",
            _ => "4K",
        }
    }
}

/// Counters collected over the life of a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Fatal network errors answered with a load restart
    pub network_recoveries: u32,
    /// Fatal media errors answered with decoder recovery
    pub media_recoveries: u32,
    /// Non-fatal errors observed
    pub non_fatal_errors: u32,
    /// Level switches reported by the engine
    pub quality_switches: u32,
    /// Most recent level reported by the engine
    pub current_level: Option<usize>,
}
