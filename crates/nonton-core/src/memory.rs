//! In-memory platform for tests and headless replay
//!
//! Every handle is a cheap clone over shared state, so a caller can keep a
//! copy of a media element or engine handed to a session and inspect what the
//! session did with it.

use crate::{
    platform::{AdaptiveEngine, MediaElement, MediaPlatform, MountPoint},
    EngineConfig, EngineLevel, Error, PlatformCapabilities, Result,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Default)]
struct PlatformState {
    next_handle: u64,
    mounts: HashMap<String, MemoryMount>,
    media: Vec<MemoryMedia>,
    engines: Vec<MemoryEngine>,
    /// Levels every new engine reports
    levels: Vec<EngineLevel>,
    reject_play: bool,
    fail_engine: bool,
}

impl PlatformState {
    fn next_id(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

/// Platform whose handles record every call made on them
#[derive(Clone)]
pub struct MemoryPlatform {
    capabilities: PlatformCapabilities,
    state: Rc<RefCell<PlatformState>>,
}

impl MemoryPlatform {
    pub fn new(capabilities: PlatformCapabilities) -> Self {
        Self {
            capabilities,
            state: Rc::new(RefCell::new(PlatformState::default())),
        }
    }

    /// Register a mount point and return a handle to it
    pub fn add_mount(&self, id: &str) -> MemoryMount {
        let mount = MemoryMount {
            id: id.to_string(),
            inner: Rc::new(RefCell::new(MountState::default())),
        };
        self.state
            .borrow_mut()
            .mounts
            .insert(id.to_string(), mount.clone());
        mount
    }

    pub fn mount(&self, id: &str) -> Option<MemoryMount> {
        self.state.borrow().mounts.get(id).cloned()
    }

    /// Levels reported by engines created from now on
    pub fn set_levels(&self, levels: Vec<EngineLevel>) {
        self.state.borrow_mut().levels = levels;
    }

    /// Make media elements created from now on refuse `play()`
    pub fn set_reject_play(&self, reject: bool) {
        self.state.borrow_mut().reject_play = reject;
    }

    /// Make engine construction fail
    pub fn set_fail_engine(&self, fail: bool) {
        self.state.borrow_mut().fail_engine = fail;
    }

    /// Media elements created so far
    pub fn media_elements(&self) -> Vec<MemoryMedia> {
        self.state.borrow().media.clone()
    }

    /// Engines created so far
    pub fn engines(&self) -> Vec<MemoryEngine> {
        self.state.borrow().engines.clone()
    }
}

impl MediaPlatform for MemoryPlatform {
    type Media = MemoryMedia;
    type Mount = MemoryMount;
    type Engine = MemoryEngine;

    fn find_mount(&self, id: &str) -> Option<MemoryMount> {
        self.mount(id)
    }

    fn capabilities(&self) -> PlatformCapabilities {
        self.capabilities
    }

    fn create_media_element(&self) -> Result<MemoryMedia> {
        let mut state = self.state.borrow_mut();
        let media = MemoryMedia {
            id: state.next_id(),
            inner: Rc::new(RefCell::new(MediaState {
                paused: true,
                current_time: 0.0,
                duration: f64::NAN,
                reject_play: state.reject_play,
                ..Default::default()
            })),
        };
        state.media.push(media.clone());
        Ok(media)
    }

    fn create_engine(&self, config: &EngineConfig) -> Result<MemoryEngine> {
        let mut state = self.state.borrow_mut();
        if !self.capabilities.adaptive_engine {
            return Err(Error::EngineUnavailable);
        }
        if state.fail_engine {
            return Err(Error::EngineInit("engine construction refused".into()));
        }

        let engine = MemoryEngine {
            id: state.next_id(),
            inner: Rc::new(RefCell::new(EngineState {
                config: config.clone(),
                levels: state.levels.clone(),
                ..Default::default()
            })),
        };
        state.engines.push(engine.clone());
        Ok(engine)
    }
}

#[derive(Default)]
struct MountState {
    children: Vec<u64>,
    clear_calls: u32,
}

/// Mount point holding media element ids
#[derive(Clone)]
pub struct MemoryMount {
    id: String,
    inner: Rc<RefCell<MountState>>,
}

impl MemoryMount {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ids of the media elements currently mounted
    pub fn children(&self) -> Vec<u64> {
        self.inner.borrow().children.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().children.is_empty()
    }

    pub fn clear_calls(&self) -> u32 {
        self.inner.borrow().clear_calls
    }

    /// Put foreign content into the container
    pub fn insert_foreign(&self, id: u64) {
        self.inner.borrow_mut().children.push(id);
    }
}

impl MountPoint for MemoryMount {
    type Media = MemoryMedia;

    fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.children.clear();
        inner.clear_calls += 1;
    }

    fn append(&self, media: &MemoryMedia) -> Result<()> {
        self.inner.borrow_mut().children.push(media.id);
        Ok(())
    }
}

#[derive(Default)]
struct MediaState {
    src: Option<String>,
    controls: bool,
    fills_container: bool,
    paused: bool,
    current_time: f64,
    duration: f64,
    reject_play: bool,
    play_calls: u32,
    pause_calls: u32,
}

/// Media element recording its settings and transport calls
#[derive(Clone)]
pub struct MemoryMedia {
    id: u64,
    inner: Rc<RefCell<MediaState>>,
}

impl MemoryMedia {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn src(&self) -> Option<String> {
        self.inner.borrow().src.clone()
    }

    pub fn controls(&self) -> bool {
        self.inner.borrow().controls
    }

    pub fn fills_container(&self) -> bool {
        self.inner.borrow().fills_container
    }

    pub fn play_calls(&self) -> u32 {
        self.inner.borrow().play_calls
    }

    pub fn pause_calls(&self) -> u32 {
        self.inner.borrow().pause_calls
    }

    pub fn set_current_time(&self, seconds: f64) {
        self.inner.borrow_mut().current_time = seconds;
    }

    pub fn set_duration(&self, seconds: f64) {
        self.inner.borrow_mut().duration = seconds;
    }
}

impl MediaElement for MemoryMedia {
    fn set_src(&self, url: &str) {
        self.inner.borrow_mut().src = Some(url.to_string());
    }

    fn clear_src(&self) {
        self.inner.borrow_mut().src = None;
    }

    fn set_controls(&self, enabled: bool) {
        self.inner.borrow_mut().controls = enabled;
    }

    fn fill_container(&self) {
        self.inner.borrow_mut().fills_container = true;
    }

    fn play(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.play_calls += 1;
        if inner.reject_play {
            return Err(Error::PlaybackRejected("NotAllowedError".into()));
        }
        inner.paused = false;
        Ok(())
    }

    fn pause(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.pause_calls += 1;
        inner.paused = true;
    }

    fn current_time(&self) -> f64 {
        self.inner.borrow().current_time
    }

    fn duration(&self) -> f64 {
        self.inner.borrow().duration
    }

    fn paused(&self) -> bool {
        self.inner.borrow().paused
    }
}

#[derive(Default)]
struct EngineState {
    config: EngineConfig,
    levels: Vec<EngineLevel>,
    current_level: Option<usize>,
    sources: Vec<String>,
    attached: Vec<u64>,
    start_load_calls: u32,
    recover_media_calls: u32,
    destroy_calls: u32,
}

/// Streaming engine recording every call
#[derive(Clone)]
pub struct MemoryEngine {
    id: u64,
    inner: Rc<RefCell<EngineState>>,
}

impl MemoryEngine {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> EngineConfig {
        self.inner.borrow().config.clone()
    }

    /// URLs passed to `load_source`
    pub fn sources(&self) -> Vec<String> {
        self.inner.borrow().sources.clone()
    }

    /// Media element ids passed to `attach_media`
    pub fn attached(&self) -> Vec<u64> {
        self.inner.borrow().attached.clone()
    }

    pub fn start_load_calls(&self) -> u32 {
        self.inner.borrow().start_load_calls
    }

    pub fn recover_media_calls(&self) -> u32 {
        self.inner.borrow().recover_media_calls
    }

    pub fn destroy_calls(&self) -> u32 {
        self.inner.borrow().destroy_calls
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroy_calls() > 0
    }
}

impl AdaptiveEngine for MemoryEngine {
    type Media = MemoryMedia;

    fn load_source(&mut self, url: &str) {
        self.inner.borrow_mut().sources.push(url.to_string());
    }

    fn attach_media(&mut self, media: &MemoryMedia) {
        self.inner.borrow_mut().attached.push(media.id);
    }

    fn level_count(&self) -> usize {
        self.inner.borrow().levels.len()
    }

    fn level(&self, index: usize) -> Option<EngineLevel> {
        self.inner.borrow().levels.get(index).copied()
    }

    fn current_level(&self) -> Option<usize> {
        self.inner.borrow().current_level
    }

    fn set_current_level(&mut self, index: usize) {
        self.inner.borrow_mut().current_level = Some(index);
    }

    fn start_load(&mut self) {
        self.inner.borrow_mut().start_load_calls += 1;
    }

    fn recover_media_error(&mut self) {
        self.inner.borrow_mut().recover_media_calls += 1;
    }

    fn destroy(&mut self) {
        self.inner.borrow_mut().destroy_calls += 1;
    }
}
