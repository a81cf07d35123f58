//! Replay scripts
//!
//! A script is a JSON array of steps:
//!
//! ```json
//! [
//!   {"engine": {"event": "manifest_parsed", "level_count": 3}},
//!   {"media": "play"},
//!   {"call": {"change_quality": 2}},
//!   {"engine": {"event": "error", "fatal": true, "kind": "network", "details": "fragLoadError"}},
//!   {"call": "destroy"}
//! ]
//! ```

use nonton_core::{EngineEvent, MediaEvent, MediaPlatform, PlaybackSession};
use serde::{Deserialize, Serialize};

/// Caller operation on the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Call {
    Play,
    Pause,
    Destroy,
    ChangeQuality(usize),
}

/// One replay step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Engine(EngineEvent),
    Media(MediaEvent),
    Call(Call),
}

impl Step {
    pub fn apply<P: MediaPlatform>(&self, session: &mut PlaybackSession<P>) {
        match self {
            Step::Engine(event) => session.handle_engine_event(event.clone()),
            Step::Media(event) => session.handle_media_event(*event),
            Step::Call(Call::Play) => session.play(),
            Step::Call(Call::Pause) => session.pause(),
            Step::Call(Call::Destroy) => session.destroy(),
            Step::Call(Call::ChangeQuality(level)) => session.change_quality(*level),
        }
    }
}

pub fn parse(json: &str) -> serde_json::Result<Vec<Step>> {
    serde_json::from_str(json)
}
