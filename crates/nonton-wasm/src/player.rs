//! `NontonPlayer` - the JavaScript-facing playback session

use crate::platform::{js_error, release_later, WebPlatform};
use crate::router::{EventRouter, RoutedEvent, SharedSession};
use nonton_core::{
    EngagementConfig, EngagementCounter, PlaybackSession, QualityLevel, SessionConfig, TimerAction,
};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, info};
use wasm_bindgen::prelude::*;
use web_sys::HtmlVideoElement;

fn to_js(err: nonton_core::Error) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

/// Parse an optional `{autoplay, controls}` object
fn session_config(options: &JsValue) -> Result<SessionConfig, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(SessionConfig::default());
    }
    serde_wasm_bindgen::from_value(options.clone()).map_err(JsValue::from)
}

type WeakSession = Weak<RefCell<PlaybackSession<WebPlatform>>>;

enum SessionPoll {
    Paused(bool),
    Busy,
    Gone,
}

fn poll_session(session: &WeakSession) -> SessionPoll {
    let Some(rc) = session.upgrade() else {
        return SessionPoll::Gone;
    };
    let Ok(guard) = rc.try_borrow() else {
        return SessionPoll::Busy;
    };
    let poll = if guard.is_destroyed() {
        SessionPoll::Gone
    } else {
        SessionPoll::Paused(guard.paused())
    };
    poll
}

struct TimerState {
    session: WeakSession,
    counter: RefCell<EngagementCounter>,
    callback: RefCell<Option<js_sys::Function>>,
    interval_id: Cell<Option<i32>>,
    tick: RefCell<Option<Closure<dyn FnMut()>>>,
}

/// Interval timer crediting watch time while the session plays
///
/// Cloned into the tick closure and the router observer; all clones share
/// the interval handle, so whichever of them sees the session end clears it.
#[derive(Clone)]
struct EngagementTimer {
    state: Rc<TimerState>,
}

impl EngagementTimer {
    fn new(session: WeakSession, config: EngagementConfig) -> Self {
        Self {
            state: Rc::new(TimerState {
                session,
                counter: RefCell::new(EngagementCounter::new(config)),
                callback: RefCell::new(None),
                interval_id: Cell::new(None),
                tick: RefCell::new(None),
            }),
        }
    }

    fn set_callback(&self, callback: js_sys::Function) {
        *self.state.callback.borrow_mut() = Some(callback);
    }

    fn apply(&self, action: TimerAction) {
        match action {
            TimerAction::Keep => {}
            TimerAction::Arm => {
                if let Err(e) = self.arm() {
                    debug!(error = %js_error(&e), "Engagement timer not started");
                }
            }
            TimerAction::Disarm => self.disarm(),
        }
    }

    /// Start ticking unless already armed, suspended, stopped or without a callback
    fn arm(&self) -> Result<(), JsValue> {
        let state = &self.state;
        if state.interval_id.get().is_some()
            || state.callback.borrow().is_none()
            || !state.counter.borrow().is_running()
        {
            return Ok(());
        }

        if state.tick.borrow().is_none() {
            let weak = Rc::downgrade(state);
            let tick = Closure::<dyn FnMut()>::new(move || {
                if let Some(state) = weak.upgrade() {
                    EngagementTimer { state }.tick();
                }
            });
            *state.tick.borrow_mut() = Some(tick);
        }

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let interval_ms = i32::try_from(state.counter.borrow().config().interval_ms).unwrap_or(i32::MAX);
        let id = {
            let tick = state.tick.borrow();
            let Some(tick) = tick.as_ref() else {
                return Ok(());
            };
            window.set_interval_with_callback_and_timeout_and_arguments_0(
                tick.as_ref().unchecked_ref(),
                interval_ms,
            )?
        };
        state.interval_id.set(Some(id));
        Ok(())
    }

    fn disarm(&self) {
        if let Some(id) = self.state.interval_id.take() {
            if let Some(window) = web_sys::window() {
                window.clear_interval_with_handle(id);
            }
        }
    }

    fn tick(&self) {
        let paused = match poll_session(&self.state.session) {
            SessionPoll::Paused(paused) => paused,
            SessionPoll::Busy => return,
            SessionPoll::Gone => {
                let action = self.state.counter.borrow_mut().on_session_destroyed();
                self.apply(action);
                return;
            }
        };

        let credit = self.state.counter.borrow_mut().tick(paused);
        let Some(credit) = credit else {
            return;
        };
        let callback = self.state.callback.borrow().clone();
        if let Some(callback) = callback {
            match serde_wasm_bindgen::to_value(&credit) {
                Ok(value) => {
                    if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                        debug!(error = %js_error(&e), "Engagement callback failed");
                    }
                }
                Err(e) => debug!(error = %e, "Engagement credit not serializable"),
            }
        }
    }

    /// Follow a handled session event
    fn observe(&self, event: &RoutedEvent) {
        if matches!(poll_session(&self.state.session), SessionPoll::Gone) {
            let action = self.state.counter.borrow_mut().on_session_destroyed();
            self.apply(action);
            return;
        }
        if let RoutedEvent::Media(event) = event {
            let action = self.state.counter.borrow_mut().on_media_event(*event);
            self.apply(action);
        }
    }

    /// Clear the timer for good and release its closure
    fn stop(&self) {
        let action = self.state.counter.borrow_mut().on_session_destroyed();
        self.apply(action);
        if let Some(tick) = self.state.tick.borrow_mut().take() {
            release_later(vec![tick]);
        }
    }

    fn is_armed(&self) -> bool {
        self.state.interval_id.get().is_some()
    }
}

/// Playback session bound to a page container
#[wasm_bindgen]
pub struct NontonPlayer {
    session: SharedSession,
    router: EventRouter,
    engagement: EngagementTimer,
}

#[wasm_bindgen]
impl NontonPlayer {
    /// Create a player for `url` inside the element with id `container_id`.
    ///
    /// Fails when the container does not exist or the URL is empty.
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str, url: &str, options: JsValue) -> Result<NontonPlayer, JsValue> {
        let config = session_config(&options)?;
        let router = EventRouter::new();
        let platform = WebPlatform::new(router.clone()).map_err(to_js)?;
        let session = PlaybackSession::new(platform, container_id, url, config).map_err(to_js)?;

        let session = Rc::new(RefCell::new(session));
        router.bind(&session);

        let engagement = EngagementTimer::new(Rc::downgrade(&session), EngagementConfig::default());
        let observer = engagement.clone();
        router.observe(move |event| observer.observe(event));

        Ok(NontonPlayer {
            session,
            router,
            engagement,
        })
    }

    /// Build the player and start loading; returns the `<video>` element
    pub fn init(&mut self) -> Result<HtmlVideoElement, JsValue> {
        let video = {
            let mut session = self.session.borrow_mut();
            session.initialize().map_err(to_js)?.element().clone()
        };
        self.router.flush();
        self.engagement.arm()?;
        Ok(video)
    }

    pub fn play(&self) {
        self.session.borrow().play();
        self.router.flush();
    }

    pub fn pause(&self) {
        self.session.borrow().pause();
        self.router.flush();
    }

    /// Release hls.js, the video element and the container content
    pub fn destroy(&mut self) {
        self.engagement.stop();
        self.session.borrow_mut().destroy();
        self.router.flush();
    }

    #[wasm_bindgen(js_name = changeQuality)]
    pub fn change_quality(&self, level: i32) {
        match usize::try_from(level) {
            Ok(level) => self.session.borrow_mut().change_quality(level),
            Err(_) => debug!(level, "Negative quality level ignored"),
        }
        self.router.flush();
    }

    /// `[{index, height, width, bitrate}]`, empty outside hls.js playback
    #[wasm_bindgen(js_name = getQualityLevels)]
    pub fn get_quality_levels(&self) -> Result<JsValue, JsValue> {
        let levels: Vec<QualityLevel> = self.session.borrow().quality_levels().collect();
        serde_wasm_bindgen::to_value(&levels).map_err(JsValue::from)
    }

    /// Register `callback({points, total})`, called once per second of playback
    #[wasm_bindgen(js_name = onEngagement)]
    pub fn on_engagement(&mut self, callback: js_sys::Function) -> Result<(), JsValue> {
        self.engagement.set_callback(callback);
        if self.session.borrow().media_element().is_some() {
            self.engagement.arm()?;
        }
        Ok(())
    }

    /// Whether the engagement interval is currently scheduled
    #[wasm_bindgen(getter, js_name = engagementActive)]
    pub fn engagement_active(&self) -> bool {
        self.engagement.is_armed()
    }

    #[wasm_bindgen(getter, js_name = currentTime)]
    pub fn current_time(&self) -> f64 {
        self.session.borrow().current_time()
    }

    #[wasm_bindgen(getter)]
    pub fn duration(&self) -> f64 {
        self.session.borrow().duration()
    }

    #[wasm_bindgen(getter)]
    pub fn paused(&self) -> bool {
        self.session.borrow().paused()
    }

    #[wasm_bindgen(getter, js_name = deliveryMode)]
    pub fn delivery_mode(&self) -> Option<String> {
        self.session.borrow().delivery_mode().map(|m| m.to_string())
    }

    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.session.borrow().state().to_string()
    }

    /// Details of the stream error that ended the session, if any
    #[wasm_bindgen(getter)]
    pub fn fault(&self) -> Option<String> {
        self.session.borrow().fault().map(|f| f.to_string())
    }
}

impl Drop for NontonPlayer {
    fn drop(&mut self) {
        self.engagement.stop();
        if let Ok(mut session) = self.session.try_borrow_mut() {
            session.destroy();
        }
        info!("Player released");
    }
}

/// Create and initialize a player in one call
#[wasm_bindgen(js_name = createPlayer)]
pub fn create_player(container_id: &str, url: &str, options: JsValue) -> Result<NontonPlayer, JsValue> {
    let mut player = NontonPlayer::new(container_id, url, options)?;
    player.init()?;
    Ok(player)
}
