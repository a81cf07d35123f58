//! Nonton WASM - browser bindings for the Nonton playback session
//!
//! Mounts a `<video>` element into a page container and drives it with
//! hls.js when the page has loaded it, native HLS otherwise, or plain
//! progressive playback for non-HLS files.
//!
//! ```javascript
//! import init, { createPlayer } from '@nonton/wasm';
//!
//! await init();
//! const player = createPlayer('player', 'https://cdn.example.com/v/master.m3u8', { autoplay: true });
//! player.onEngagement(({ points, total }) => console.log(points, total));
//! player.changeQuality(2);
//! player.destroy();
//! ```

use wasm_bindgen::prelude::*;

mod hls;
mod logging;
mod platform;
mod player;
mod router;

pub use player::{create_player, NontonPlayer};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logging::init(tracing::Level::INFO);
    tracing::info!(version = nonton_core::VERSION, "Nonton WASM initialized");
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
