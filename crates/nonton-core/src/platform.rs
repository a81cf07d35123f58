//! Runtime capabilities a playback session is built on
//!
//! A session never touches the DOM or hls.js directly. It talks to a
//! [`MediaPlatform`], which hands out a mount point, media elements and
//! streaming engines. The browser binding implements these traits over
//! `web-sys`; tests and the CLI use [`crate::memory`].
//!
//! Notifications flow the other way as [`crate::EngineEvent`] and
//! [`crate::MediaEvent`] values, which the platform's owner feeds into
//! [`crate::PlaybackSession::handle_engine_event`] and
//! [`crate::PlaybackSession::handle_media_event`].

use crate::{EngineConfig, EngineLevel, PlatformCapabilities, Result};

/// A video element owned by a session
pub trait MediaElement {
    fn set_src(&self, url: &str);

    /// Detach the current source so the element stops fetching
    fn clear_src(&self);

    fn set_controls(&self, enabled: bool);

    /// Size the element to fill its container
    fn fill_container(&self);

    /// Ask the element to start playback.
    ///
    /// Returns as soon as the request is issued. An `Err` means the request
    /// was refused outright; an asynchronous refusal is dropped by the
    /// implementation.
    fn play(&self) -> Result<()>;

    fn pause(&self);

    /// Playback position in seconds; may be NaN while nothing is loaded
    fn current_time(&self) -> f64;

    /// Media duration in seconds; NaN until metadata is known
    fn duration(&self) -> f64;

    fn paused(&self) -> bool;
}

/// Host container that displays a session's media element
pub trait MountPoint {
    type Media;

    /// Remove every child. Safe on an empty container.
    fn clear(&self);

    fn append(&self, media: &Self::Media) -> Result<()>;
}

/// Client-side adaptive streaming engine (hls.js in the browser)
pub trait AdaptiveEngine {
    type Media;

    fn load_source(&mut self, url: &str);

    fn attach_media(&mut self, media: &Self::Media);

    /// Number of renditions known from the parsed manifest
    fn level_count(&self) -> usize;

    fn level(&self, index: usize) -> Option<EngineLevel>;

    /// Forced level, `None` while the engine picks automatically
    fn current_level(&self) -> Option<usize>;

    fn set_current_level(&mut self, index: usize);

    /// Restart segment loading after a network failure
    fn start_load(&mut self);

    /// Reset the decoding pipeline after a media failure
    fn recover_media_error(&mut self);

    fn destroy(&mut self);
}

/// Factory for everything a session needs from its runtime
pub trait MediaPlatform {
    type Media: MediaElement;
    type Mount: MountPoint<Media = Self::Media>;
    type Engine: AdaptiveEngine<Media = Self::Media>;

    /// Resolve a mount point by its host id
    fn find_mount(&self, id: &str) -> Option<Self::Mount>;

    /// Probe engine and native segmented-stream support
    fn capabilities(&self) -> PlatformCapabilities;

    fn create_media_element(&self) -> Result<Self::Media>;

    fn create_engine(&self, config: &EngineConfig) -> Result<Self::Engine>;
}
