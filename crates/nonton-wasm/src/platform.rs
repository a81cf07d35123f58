//! Browser platform - DOM container, `<video>` element and hls.js engine

use crate::hls::{self, Hls};
use crate::router::{EventRouter, RoutedEvent};
use nonton_core::{
    AdaptiveEngine, EngineConfig, EngineLevel, Error, MediaElement, MediaEvent, MediaPlatform,
    MountPoint, PlatformCapabilities, Result, HLS_MIME_TYPE,
};
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, Event, HtmlMediaElement, HtmlVideoElement};

/// Inline style that stretches the player over its container
const PLAYER_CSS: &str = "position:absolute;top:0;left:0;width:100%;height:100%";

const MEDIA_EVENTS: &[(&str, MediaEvent)] = &[
    ("loadedmetadata", MediaEvent::LoadedMetadata),
    ("play", MediaEvent::Play),
    ("pause", MediaEvent::Pause),
    ("ended", MediaEvent::Ended),
];

/// Best-effort message from a thrown JS value
pub fn js_error(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| value.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
        .unwrap_or_else(|| format!("{:?}", value))
}

/// Drop callbacks on a later tick; one of them may be running right now
pub(crate) fn release_later<T: 'static>(callbacks: Vec<T>) {
    if !callbacks.is_empty() {
        wasm_bindgen_futures::spawn_local(async move { drop(callbacks) });
    }
}

#[derive(Clone)]
pub struct WebPlatform {
    document: Document,
    router: EventRouter,
}

impl WebPlatform {
    pub fn new(router: EventRouter) -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| Error::MediaElement("no document available".into()))?;
        Ok(Self { document, router })
    }
}

impl MediaPlatform for WebPlatform {
    type Media = WebMedia;
    type Mount = WebMount;
    type Engine = WebEngine;

    fn find_mount(&self, id: &str) -> Option<WebMount> {
        self.document
            .get_element_by_id(id)
            .map(|element| WebMount { element })
    }

    fn capabilities(&self) -> PlatformCapabilities {
        let native_adaptive = self
            .document
            .create_element("video")
            .ok()
            .and_then(|el| el.dyn_into::<HtmlMediaElement>().ok())
            .map(|probe| !probe.can_play_type(HLS_MIME_TYPE).is_empty())
            .unwrap_or(false);

        PlatformCapabilities {
            adaptive_engine: hls::is_available(),
            native_adaptive,
        }
    }

    fn create_media_element(&self) -> Result<WebMedia> {
        let element = self
            .document
            .create_element("video")
            .and_then(|el| el.dyn_into::<HtmlVideoElement>().map_err(JsValue::from))
            .map_err(|e| Error::MediaElement(js_error(&e)))?;

        let mut media = WebMedia {
            element,
            listeners: Vec::with_capacity(MEDIA_EVENTS.len()),
        };

        for &(name, event) in MEDIA_EVENTS {
            let router = self.router.clone();
            let listener = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
                router.dispatch(RoutedEvent::Media(event));
            });
            media
                .element
                .add_event_listener_with_callback(name, listener.as_ref().unchecked_ref())
                .map_err(|e| Error::MediaElement(js_error(&e)))?;
            media.listeners.push((name, listener));
        }

        Ok(media)
    }

    fn create_engine(&self, config: &EngineConfig) -> Result<WebEngine> {
        if !hls::is_available() {
            return Err(Error::EngineUnavailable);
        }

        let js_config = serde_wasm_bindgen::to_value(config)
            .map_err(|e| Error::EngineInit(e.to_string()))?;
        let hls = Hls::new(&js_config).map_err(|e| Error::EngineInit(js_error(&e)))?;

        let mut listeners = Vec::new();
        for name in [hls::MANIFEST_PARSED, hls::ERROR, hls::LEVEL_SWITCHED] {
            let router = self.router.clone();
            let listener = Closure::<dyn FnMut(JsValue, JsValue)>::new(
                move |_: JsValue, data: JsValue| {
                    if let Some(event) = hls::parse_event(name, &data) {
                        router.dispatch(RoutedEvent::Engine(event));
                    }
                },
            );
            hls.on(name, listener.as_ref().unchecked_ref());
            listeners.push(listener);
        }

        Ok(WebEngine {
            hls,
            listeners,
            destroyed: false,
        })
    }
}

/// DOM container addressed by id
pub struct WebMount {
    element: Element,
}

impl MountPoint for WebMount {
    type Media = WebMedia;

    fn clear(&self) {
        self.element.set_inner_html("");
    }

    fn append(&self, media: &WebMedia) -> Result<()> {
        self.element
            .append_child(&media.element)
            .map(|_| ())
            .map_err(|e| Error::MediaElement(js_error(&e)))
    }
}

/// `<video>` element with its event listeners
pub struct WebMedia {
    element: HtmlVideoElement,
    listeners: Vec<(&'static str, Closure<dyn FnMut(Event)>)>,
}

impl WebMedia {
    pub fn element(&self) -> &HtmlVideoElement {
        &self.element
    }
}

impl Drop for WebMedia {
    fn drop(&mut self) {
        for (name, listener) in &self.listeners {
            let _ = self
                .element
                .remove_event_listener_with_callback(name, listener.as_ref().unchecked_ref());
        }
        release_later(std::mem::take(&mut self.listeners));
    }
}

impl MediaElement for WebMedia {
    fn set_src(&self, url: &str) {
        self.element.set_src(url);
    }

    fn clear_src(&self) {
        let _ = self.element.remove_attribute("src");
        self.element.load();
    }

    fn set_controls(&self, enabled: bool) {
        self.element.set_controls(enabled);
    }

    fn fill_container(&self) {
        self.element.style().set_css_text(PLAYER_CSS);
    }

    fn play(&self) -> Result<()> {
        let promise = self
            .element
            .play()
            .map_err(|e| Error::PlaybackRejected(js_error(&e)))?;

        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                debug!(error = %js_error(&e), "Playback promise rejected, ignoring");
            }
        });
        Ok(())
    }

    fn pause(&self) {
        let _ = self.element.pause();
    }

    fn current_time(&self) -> f64 {
        self.element.current_time()
    }

    fn duration(&self) -> f64 {
        self.element.duration()
    }

    fn paused(&self) -> bool {
        self.element.paused()
    }
}

/// hls.js instance with its event listeners
pub struct WebEngine {
    hls: Hls,
    listeners: Vec<Closure<dyn FnMut(JsValue, JsValue)>>,
    destroyed: bool,
}

impl AdaptiveEngine for WebEngine {
    type Media = WebMedia;

    fn load_source(&mut self, url: &str) {
        self.hls.load_source(url);
    }

    fn attach_media(&mut self, media: &WebMedia) {
        self.hls.attach_media(&media.element);
    }

    fn level_count(&self) -> usize {
        hls::levels_of(&self.hls).length() as usize
    }

    fn level(&self, index: usize) -> Option<EngineLevel> {
        let levels = hls::levels_of(&self.hls);
        let index = u32::try_from(index).ok().filter(|i| *i < levels.length())?;
        Some(hls::parse_level(&levels.get(index)))
    }

    fn current_level(&self) -> Option<usize> {
        usize::try_from(self.hls.current_level()).ok()
    }

    fn set_current_level(&mut self, index: usize) {
        if let Ok(level) = i32::try_from(index) {
            self.hls.set_current_level(level);
        }
    }

    fn start_load(&mut self) {
        self.hls.start_load();
    }

    fn recover_media_error(&mut self) {
        self.hls.recover_media_error();
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.hls.destroy();
            self.destroyed = true;
        }
    }
}

impl Drop for WebEngine {
    fn drop(&mut self) {
        self.destroy();
        release_later(std::mem::take(&mut self.listeners));
    }
}
