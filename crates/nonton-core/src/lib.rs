//! Nonton Core - Playback session for the Nonton watch page
//!
//! This crate provides the platform-agnostic half of the player:
//! - Delivery mode selection (hls.js engine, native HLS, progressive file)
//! - Media element and engine lifecycle
//! - Fatal stream error recovery
//! - Quality level introspection and switching
//! - Engagement counting on top of the paused state
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Nonton Core                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐       │
//! │  │   Delivery   │  │   Recovery   │  │  Engagement  │       │
//! │  │   Selector   │  │    Policy    │  │   Counter    │       │
//! │  └──────┬───────┘  └──────┬───────┘  └──────────────┘       │
//! │         │                 │                                 │
//! │         └────────┬────────┘                                 │
//! │           ┌──────┴──────┐                                   │
//! │           │  Playback   │◄──── EngineEvent / MediaEvent     │
//! │           │  Session    │                                   │
//! │           └──────┬──────┘                                   │
//! │                  │                                          │
//! │  ┌───────────────┴──────────────────────────────┐           │
//! │  │ MediaPlatform: MountPoint, MediaElement,     │           │
//! │  │                AdaptiveEngine                │           │
//! │  └──────────────────────────────────────────────┘           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod delivery;
pub mod engagement;
pub mod error;
pub mod memory;
pub mod platform;
pub mod recovery;
pub mod session;
pub mod types;

pub use config::{EngagementConfig, EngineConfig, SessionConfig};
pub use delivery::{is_adaptive_stream, select_delivery_mode, HLS_MIME_TYPE};
pub use engagement::{EngagementCounter, EngagementCredit, TimerAction};
pub use error::{Error, Result};
pub use platform::{AdaptiveEngine, MediaElement, MediaPlatform, MountPoint};
pub use recovery::{recovery_action, RecoveryAction};
pub use session::{PlaybackSession, QualityLevels};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
