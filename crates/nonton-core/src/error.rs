//! Error types for Nonton Core

use thiserror::Error;

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Session error types
#[derive(Error, Debug)]
pub enum Error {
    // Construction errors
    #[error("Mount point not found: {0}")]
    MountPointNotFound(String),

    #[error("Media URL must not be empty")]
    EmptyMediaUrl,

    // Lifecycle errors
    #[error("Invalid session state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Session already destroyed")]
    SessionDestroyed,

    // Engine errors
    #[error("Adaptive streaming engine not available")]
    EngineUnavailable,

    #[error("Failed to create streaming engine: {0}")]
    EngineInit(String),

    // Media element errors
    #[error("Media element error: {0}")]
    MediaElement(String),

    #[error("Playback request rejected: {0}")]
    PlaybackRejected(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Manifest errors
    #[error("Failed to fetch manifest: {0}")]
    ManifestFetch(String),

    #[error("Failed to parse manifest: {0}")]
    ManifestParse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if retrying the same request may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::PlaybackRejected(_) | Error::ManifestFetch(_))
    }

    /// Returns the error code for logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::MountPointNotFound(_) => "MOUNT_NOT_FOUND",
            Error::EmptyMediaUrl => "EMPTY_URL",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
            Error::SessionDestroyed => "DESTROYED",
            Error::EngineUnavailable => "ENGINE_UNAVAILABLE",
            Error::EngineInit(_) => "ENGINE_INIT",
            Error::MediaElement(_) => "MEDIA_ELEMENT",
            Error::PlaybackRejected(_) => "PLAY_REJECTED",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::ManifestFetch(_) => "MANIFEST_FETCH",
            Error::ManifestParse(_) => "MANIFEST_PARSE",
            Error::Json(_) => "JSON",
        }
    }
}
