//! Playback Session - one playback attempt for one media URL
//!
//! Coordinates:
//! - Delivery mode selection
//! - Media element and engine construction
//! - Fatal stream error recovery
//! - Lifecycle state transitions
//! - Deterministic teardown

use crate::{
    delivery::select_delivery_mode,
    platform::{AdaptiveEngine, MediaElement, MediaPlatform, MountPoint},
    recovery::{recovery_action, RecoveryAction},
    DeliveryMode, EngineConfig, EngineEvent, Error, LifecycleState, MediaEvent, QualityLevel,
    Result, SessionConfig, SessionId, SessionStats, StreamError,
};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Playback session owning a mount point, a media element and, for
/// engine-driven streams, an adaptive streaming engine.
///
/// Dropping a session destroys it.
pub struct PlaybackSession<P: MediaPlatform> {
    /// Unique session ID
    id: SessionId,
    /// Runtime the handles come from
    platform: P,
    /// Container this session renders into
    mount: P::Mount,
    /// Media URL, never empty
    url: String,
    /// Options frozen at construction
    config: SessionConfig,
    /// Tunables for the engine
    engine_config: EngineConfig,
    /// Chosen once by `initialize`
    mode: Option<DeliveryMode>,
    media: Option<P::Media>,
    engine: Option<P::Engine>,
    /// Current lifecycle state
    state: LifecycleState,
    /// State change broadcaster
    state_tx: watch::Sender<LifecycleState>,
    /// Engine has reported a parsed manifest
    manifest_parsed: bool,
    stats: SessionStats,
    /// Error that ended the session, if any
    fault: Option<StreamError>,
}

impl<P: MediaPlatform> PlaybackSession<P> {
    /// Create a session bound to the mount point `mount_id`.
    ///
    /// Nothing is built until [`initialize`](Self::initialize).
    pub fn new(
        platform: P,
        mount_id: &str,
        url: impl Into<String>,
        config: SessionConfig,
    ) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(Error::EmptyMediaUrl);
        }

        let mount = platform.find_mount(mount_id).ok_or_else(|| {
            warn!(mount_id, "Mount point not found");
            Error::MountPointNotFound(mount_id.to_string())
        })?;

        let (state_tx, _) = watch::channel(LifecycleState::Uninitialized);
        let id = SessionId::new();

        debug!(session_id = %id, mount_id, url = %url, "Session created");

        Ok(Self {
            id,
            platform,
            mount,
            url,
            config,
            engine_config: EngineConfig::default(),
            mode: None,
            media: None,
            engine: None,
            state: LifecycleState::Uninitialized,
            state_tx,
            manifest_parsed: false,
            stats: SessionStats::default(),
            fault: None,
        })
    }

    /// Replace the engine tunables used by `initialize`
    pub fn with_engine_config(mut self, engine_config: EngineConfig) -> Result<Self> {
        engine_config.validate()?;
        self.engine_config = engine_config;
        Ok(self)
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine_config
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Delivery mode, `None` before `initialize`
    pub fn delivery_mode(&self) -> Option<DeliveryMode> {
        self.mode
    }

    /// Get current state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Subscribe to state changes
    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.state_tx.subscribe()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.is_terminal()
    }

    /// Stream error that made the session tear itself down
    pub fn fault(&self) -> Option<&StreamError> {
        self.fault.as_ref()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Raw media element for read-only event subscription
    pub fn media_element(&self) -> Option<&P::Media> {
        self.media.as_ref()
    }

    /// Transition to new state
    fn set_state(&mut self, new_state: LifecycleState) -> Result<()> {
        let current = self.state;
        if current == new_state {
            return Ok(());
        }

        if !current.can_transition_to(new_state) {
            return Err(Error::InvalidStateTransition {
                from: current.to_string(),
                to: new_state.to_string(),
            });
        }

        self.state = new_state;
        self.state_tx.send_replace(new_state);

        info!(session_id = %self.id, from = %current, to = %new_state, "State transition");

        Ok(())
    }

    /// Select the delivery mode, build the media element (and engine) and
    /// start loading. Returns the media element.
    #[instrument(skip(self), fields(session_id = %self.id, url = %self.url))]
    pub fn initialize(&mut self) -> Result<&P::Media> {
        match self.state {
            LifecycleState::Uninitialized => {}
            LifecycleState::Destroyed => return Err(Error::SessionDestroyed),
            current => {
                return Err(Error::InvalidStateTransition {
                    from: current.to_string(),
                    to: LifecycleState::Initializing.to_string(),
                })
            }
        }

        self.set_state(LifecycleState::Initializing)?;
        self.mount.clear();

        let mode = select_delivery_mode(&self.url, self.platform.capabilities());
        self.mode = Some(mode);
        info!(mode = %mode, "Delivery mode selected");

        if let Err(e) = self.build(mode) {
            warn!(error = %e, code = e.error_code(), "Initialization failed, tearing down");
            self.destroy();
            return Err(e);
        }

        self.media
            .as_ref()
            .ok_or_else(|| Error::MediaElement("media element missing after build".into()))
    }

    fn build(&mut self, mode: DeliveryMode) -> Result<()> {
        let media = self.platform.create_media_element()?;
        media.set_controls(self.config.controls);
        media.fill_container();
        self.mount.append(&media)?;
        self.media = Some(media);

        match mode {
            DeliveryMode::AdaptiveEngine => {
                let mut engine = self.platform.create_engine(&self.engine_config)?;
                engine.load_source(&self.url);
                if let Some(media) = self.media.as_ref() {
                    engine.attach_media(media);
                }
                self.engine = Some(engine);
                // Autoplay waits for ManifestParsed
            }
            DeliveryMode::NativeAdaptive => {
                if let Some(media) = self.media.as_ref() {
                    media.set_src(&self.url);
                }
                // Autoplay waits for LoadedMetadata
            }
            DeliveryMode::Progressive => {
                if let Some(media) = self.media.as_ref() {
                    media.set_src(&self.url);
                }
                if self.config.autoplay {
                    self.request_play();
                }
            }
        }

        Ok(())
    }

    /// Fire-and-forget playback request; refusals are expected (autoplay
    /// policy) and dropped.
    fn request_play(&self) {
        if let Some(media) = self.media.as_ref() {
            if let Err(e) = media.play() {
                debug!(session_id = %self.id, error = %e, "Playback request rejected, ignoring");
            }
        }
    }

    /// Start playback
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn play(&self) {
        self.request_play();
    }

    /// Pause playback
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn pause(&self) {
        if let Some(media) = self.media.as_ref() {
            media.pause();
        }
    }

    /// Playback position in seconds, 0 without a media element
    pub fn current_time(&self) -> f64 {
        self.media
            .as_ref()
            .map(|m| zero_if_nan(m.current_time()))
            .unwrap_or(0.0)
    }

    /// Duration in seconds, 0 until known or without a media element
    pub fn duration(&self) -> f64 {
        self.media
            .as_ref()
            .map(|m| zero_if_nan(m.duration()))
            .unwrap_or(0.0)
    }

    /// Whether playback is paused; true without a media element
    pub fn paused(&self) -> bool {
        self.media.as_ref().map(|m| m.paused()).unwrap_or(true)
    }

    /// Quality levels known from the manifest.
    ///
    /// Empty outside engine mode and before the manifest is parsed. The
    /// iterator reads the engine lazily and can be cloned to restart.
    pub fn quality_levels(&self) -> QualityLevels<'_, P::Engine> {
        let engine = self.engine.as_ref().filter(|_| self.manifest_parsed);
        QualityLevels {
            count: engine.map(|e| e.level_count()).unwrap_or(0),
            engine,
            next: 0,
        }
    }

    /// Level forced through [`change_quality`](Self::change_quality), `None`
    /// while the engine chooses automatically or outside engine mode
    pub fn current_quality(&self) -> Option<usize> {
        self.engine.as_ref().and_then(|e| e.current_level())
    }

    /// Force a quality level. Out of range or outside engine mode is a no-op.
    pub fn change_quality(&mut self, level: usize) {
        match self.engine.as_mut() {
            Some(engine) if level < engine.level_count() => {
                engine.set_current_level(level);
                info!(session_id = %self.id, level, "Quality level requested");
            }
            Some(engine) => {
                debug!(level, level_count = engine.level_count(), "Quality level out of range");
            }
            None => {
                debug!(level, "No streaming engine, ignoring quality change");
            }
        }
    }

    /// Feed an engine notification into the session
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        if self.is_destroyed() || self.engine.is_none() {
            debug!(session_id = %self.id, ?event, "Engine event without engine, ignoring");
            return;
        }

        match event {
            EngineEvent::ManifestParsed { level_count } => {
                self.manifest_parsed = true;
                info!(session_id = %self.id, levels = level_count, "Manifest parsed");
                if self.config.autoplay {
                    self.request_play();
                }
            }
            EngineEvent::LevelSwitched { level } => {
                self.stats.quality_switches += 1;
                self.stats.current_level = Some(level);
                info!(session_id = %self.id, level, "Quality switched");
            }
            EngineEvent::Error(err) => self.handle_stream_error(err),
        }
    }

    fn handle_stream_error(&mut self, err: StreamError) {
        let action = recovery_action(&err);

        match action {
            RecoveryAction::Ignore => {
                self.stats.non_fatal_errors += 1;
                debug!(session_id = %self.id, error = %err, "Non-fatal stream error");
            }
            RecoveryAction::RestartLoad => {
                warn!(session_id = %self.id, error = %err, "Network error, restarting load");
                if let Some(engine) = self.engine.as_mut() {
                    engine.start_load();
                }
                self.stats.network_recoveries += 1;
            }
            RecoveryAction::RecoverMedia => {
                warn!(session_id = %self.id, error = %err, "Media error, recovering");
                if let Some(engine) = self.engine.as_mut() {
                    engine.recover_media_error();
                }
                self.stats.media_recoveries += 1;
            }
            RecoveryAction::Teardown => {
                error!(session_id = %self.id, error = %err, "Unrecoverable stream error, destroying session");
                self.fault = Some(err);
                if let Err(e) = self.set_state(LifecycleState::Errored) {
                    debug!(error = %e, "Errored state skipped");
                }
                self.destroy();
            }
        }
    }

    /// Feed a media element notification into the session
    pub fn handle_media_event(&mut self, event: MediaEvent) {
        if self.is_destroyed() {
            debug!(session_id = %self.id, ?event, "Media event after destroy, ignoring");
            return;
        }

        let target = match event {
            MediaEvent::LoadedMetadata => {
                if self.mode == Some(DeliveryMode::NativeAdaptive) && self.config.autoplay {
                    self.request_play();
                }
                return;
            }
            MediaEvent::Play => LifecycleState::Playing,
            MediaEvent::Pause | MediaEvent::Ended => LifecycleState::Paused,
        };

        if let Err(e) = self.set_state(target) {
            debug!(session_id = %self.id, ?event, error = %e, "Media event ignored");
        }
    }

    /// Release the engine and media element and clear the mount point.
    ///
    /// Safe to call any number of times.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn destroy(&mut self) {
        if self.is_destroyed() {
            return;
        }

        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
        }

        if let Some(media) = self.media.take() {
            media.pause();
            media.clear_src();
        }

        self.mount.clear();

        self.state = LifecycleState::Destroyed;
        self.state_tx.send_replace(LifecycleState::Destroyed);

        info!(fault = self.fault.is_some(), "Session destroyed");
    }
}

impl<P: MediaPlatform> Drop for PlaybackSession<P> {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn zero_if_nan(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

/// Lazy iterator over a session's quality levels
pub struct QualityLevels<'a, E> {
    engine: Option<&'a E>,
    next: usize,
    count: usize,
}

impl<E> Clone for QualityLevels<'_, E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine,
            next: self.next,
            count: self.count,
        }
    }
}

impl<E: AdaptiveEngine> Iterator for QualityLevels<'_, E> {
    type Item = QualityLevel;

    fn next(&mut self) -> Option<QualityLevel> {
        let engine = self.engine?;
        while self.next < self.count {
            let index = self.next;
            self.next += 1;
            if let Some(level) = engine.level(index) {
                return Some(QualityLevel::from_engine(index, level));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.count.saturating_sub(self.next)))
    }
}
