//! Bindings to the global hls.js `Hls` class

use js_sys::{Array, Reflect};
use nonton_core::{EngineEvent, EngineLevel, ErrorKind, StreamError};
use wasm_bindgen::prelude::*;
use web_sys::HtmlMediaElement;

/// `Hls.Events.MANIFEST_PARSED`
pub const MANIFEST_PARSED: &str = "hlsManifestParsed";
/// `Hls.Events.ERROR`
pub const ERROR: &str = "hlsError";
/// `Hls.Events.LEVEL_SWITCHED`
pub const LEVEL_SWITCHED: &str = "hlsLevelSwitched";

#[wasm_bindgen]
extern "C" {
    pub type Hls;

    #[wasm_bindgen(static_method_of = Hls, js_name = isSupported)]
    fn is_supported() -> bool;

    #[wasm_bindgen(constructor, catch)]
    pub fn new(config: &JsValue) -> Result<Hls, JsValue>;

    #[wasm_bindgen(method, js_name = loadSource)]
    pub fn load_source(this: &Hls, url: &str);

    #[wasm_bindgen(method, js_name = attachMedia)]
    pub fn attach_media(this: &Hls, media: &HtmlMediaElement);

    #[wasm_bindgen(method)]
    pub fn on(this: &Hls, event: &str, callback: &js_sys::Function);

    #[wasm_bindgen(method, getter)]
    pub fn levels(this: &Hls) -> JsValue;

    #[wasm_bindgen(method, getter, js_name = currentLevel)]
    pub fn current_level(this: &Hls) -> i32;

    #[wasm_bindgen(method, setter, js_name = currentLevel)]
    pub fn set_current_level(this: &Hls, level: i32);

    #[wasm_bindgen(method, js_name = startLoad)]
    pub fn start_load(this: &Hls);

    #[wasm_bindgen(method, js_name = recoverMediaError)]
    pub fn recover_media_error(this: &Hls);

    #[wasm_bindgen(method)]
    pub fn destroy(this: &Hls);
}

/// True when hls.js is loaded on the page and MSE is usable
pub fn is_available() -> bool {
    let loaded = Reflect::has(&js_sys::global(), &JsValue::from_str("Hls")).unwrap_or(false);
    loaded && Hls::is_supported()
}

fn get(data: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(data, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn get_f64(data: &JsValue, key: &str) -> Option<f64> {
    get(data, key).and_then(|v| v.as_f64())
}

/// The engine's `levels` array, empty before the manifest is parsed
pub fn levels_of(hls: &Hls) -> Array {
    hls.levels().dyn_into::<Array>().unwrap_or_else(|_| Array::new())
}

/// Read `{height, width, bitrate}` from an hls.js `Level`
pub fn parse_level(level: &JsValue) -> EngineLevel {
    EngineLevel {
        height: get_f64(level, "height").unwrap_or(0.0) as u32,
        width: get_f64(level, "width").unwrap_or(0.0) as u32,
        bitrate: get_f64(level, "bitrate").unwrap_or(0.0) as u64,
    }
}

/// Translate an hls.js event payload into an engine event
pub fn parse_event(event: &str, data: &JsValue) -> Option<EngineEvent> {
    match event {
        MANIFEST_PARSED => {
            let level_count = get(data, "levels")
                .and_then(|v| v.dyn_into::<Array>().ok())
                .map(|levels| levels.length() as usize)
                .unwrap_or(0);
            Some(EngineEvent::ManifestParsed { level_count })
        }
        ERROR => {
            let fatal = get(data, "fatal").and_then(|v| v.as_bool()).unwrap_or(false);
            let kind = get(data, "type")
                .and_then(|v| v.as_string())
                .map(|t| ErrorKind::from_engine_type(&t))
                .unwrap_or(ErrorKind::Other);
            let details = get(data, "details").and_then(|v| v.as_string()).unwrap_or_default();
            Some(EngineEvent::Error(StreamError { fatal, kind, details }))
        }
        LEVEL_SWITCHED => {
            let level = get_f64(data, "level")?;
            (level >= 0.0).then(|| EngineEvent::LevelSwitched { level: level as usize })
        }
        _ => None,
    }
}
