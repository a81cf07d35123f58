//! CLI command implementations

use crate::output::{format_levels, format_output};
use crate::script::{self, Step};
use anyhow::Context;
use m3u8_rs::Playlist;
use nonton_core::memory::MemoryPlatform;
use nonton_core::{
    is_adaptive_stream, select_delivery_mode, DeliveryMode, EngineConfig, EngineLevel, Error,
    LifecycleState, PlatformCapabilities, PlaybackSession, QualityLevel, SessionConfig,
    SessionStats, StreamError,
};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, instrument};
use url::Url;

/// Container id used for replays
const REPLAY_MOUNT: &str = "player";

#[derive(Debug, Serialize)]
pub struct ModeReport {
    pub url: String,
    pub adaptive_stream: bool,
    pub mode: DeliveryMode,
}

pub fn mode_report(url: &str, capabilities: PlatformCapabilities) -> ModeReport {
    ModeReport {
        url: url.to_string(),
        adaptive_stream: is_adaptive_stream(url),
        mode: select_delivery_mode(url, capabilities),
    }
}

/// Print the delivery mode for a URL
pub fn mode(url: &str, no_engine: bool, native: bool, format: &str) -> anyhow::Result<()> {
    let report = mode_report(url, PlatformCapabilities::new(!no_engine, native));
    println!("{}", format_output(&report, format));
    Ok(())
}

/// Read a playlist from an http(s) URL or a local path
#[instrument]
pub async fn load_playlist(source: &str) -> nonton_core::Result<String> {
    match Url::parse(source) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
            let response = reqwest::get(url)
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| Error::ManifestFetch(format!("{}: {}", source, e)))?;
            response
                .text()
                .await
                .map_err(|e| Error::ManifestFetch(format!("{}: {}", source, e)))
        }
        _ => tokio::fs::read_to_string(source)
            .await
            .map_err(|e| Error::ManifestFetch(format!("{}: {}", source, e))),
    }
}

/// Quality levels a streaming engine would expose for this playlist
///
/// I-frame variants are skipped and the ladder is ordered by bandwidth.
/// A media playlist yields a single level with unknown dimensions.
pub fn parse_levels(content: &str) -> nonton_core::Result<Vec<QualityLevel>> {
    let playlist = m3u8_rs::parse_playlist_res(content.as_bytes())
        .map_err(|e| Error::ManifestParse(format!("{:?}", e)))?;

    let master = match playlist {
        Playlist::MasterPlaylist(master) => master,
        Playlist::MediaPlaylist(_) => {
            return Ok(vec![QualityLevel::from_engine(0, EngineLevel::default())]);
        }
    };

    let mut variants: Vec<EngineLevel> = master
        .variants
        .iter()
        .filter(|v| !v.is_i_frame)
        .map(|v| EngineLevel {
            height: v.resolution.map(|r| r.height as u32).unwrap_or(0),
            width: v.resolution.map(|r| r.width as u32).unwrap_or(0),
            bitrate: v.bandwidth,
        })
        .collect();
    variants.sort_by_key(|l| l.bitrate);

    Ok(variants
        .into_iter()
        .enumerate()
        .map(|(index, level)| QualityLevel::from_engine(index, level))
        .collect())
}

/// Print the quality ladder of a playlist
pub async fn levels(source: &str, format: &str) -> anyhow::Result<()> {
    let content = load_playlist(source).await?;
    let levels = parse_levels(&content)?;
    info!(count = levels.len(), "Parsed quality levels");
    println!("{}", format_levels(&levels, format));
    Ok(())
}

/// Simulated platform for a replay
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    pub adaptive_engine: bool,
    pub native_adaptive: bool,
    pub levels: Vec<EngineLevel>,
    pub reject_play: bool,
    pub engine: EngineConfig,
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub session_id: String,
    pub mode: Option<DeliveryMode>,
    pub steps: usize,
    pub state: LifecycleState,
    pub paused: bool,
    pub quality_levels: Vec<QualityLevel>,
    pub stats: SessionStats,
    pub fault: Option<StreamError>,
    pub mount_empty: bool,
}

/// Run `steps` against a fresh in-memory session
pub fn run_replay(
    url: &str,
    steps: &[Step],
    options: &ReplayOptions,
) -> anyhow::Result<ReplayReport> {
    let platform = MemoryPlatform::new(PlatformCapabilities::new(
        options.adaptive_engine,
        options.native_adaptive,
    ));
    platform.set_levels(options.levels.clone());
    platform.set_reject_play(options.reject_play);
    let mount = platform.add_mount(REPLAY_MOUNT);

    let mut session = PlaybackSession::new(platform, REPLAY_MOUNT, url, SessionConfig::default())?
        .with_engine_config(options.engine.clone())?;
    session.initialize()?;

    for step in steps {
        debug!(?step, "Replaying");
        step.apply(&mut session);
    }

    Ok(ReplayReport {
        session_id: session.id().to_string(),
        mode: session.delivery_mode(),
        steps: steps.len(),
        state: session.state(),
        paused: session.paused(),
        quality_levels: session.quality_levels().collect(),
        stats: session.stats().clone(),
        fault: session.fault().cloned(),
        mount_empty: mount.is_empty(),
    })
}

/// Replay a script file and print the final session state
pub async fn replay(
    url: &str,
    script_path: &Path,
    options: &ReplayOptions,
    format: &str,
) -> anyhow::Result<()> {
    let json = tokio::fs::read_to_string(script_path)
        .await
        .with_context(|| format!("reading {}", script_path.display()))?;
    let steps = script::parse(&json)?;

    let report = run_replay(url, &steps, options)?;
    println!("{}", format_output(&report, format));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Call;
    use nonton_core::{EngineEvent, ErrorKind, MediaEvent};

    const MASTER: &str = "#EXTM3U
#EXT-X-VERSION:6
#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080
1080p.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360
360p.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2500000,RESOLUTION=1280x720
720p.m3u8
#EXT-X-I-FRAME-STREAM-INF:BANDWIDTH=200000,RESOLUTION=640x360,URI=\"iframe.m3u8\"
";

    const MEDIA: &str = "#EXTM3U
#EXT-X-TARGETDURATION:6
#EXTINF:6.0,
seg0.ts
#EXT-X-ENDLIST
";

    fn levels() -> Vec<EngineLevel> {
        vec![
            EngineLevel { height: 360, width: 640, bitrate: 800_000 },
            EngineLevel { height: 720, width: 1280, bitrate: 2_500_000 },
        ]
    }

    fn engine_options() -> ReplayOptions {
        ReplayOptions {
            adaptive_engine: true,
            levels: levels(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_master_levels() {
        let levels = parse_levels(MASTER).unwrap();

        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0], QualityLevel { index: 0, height: 360, width: 640, bitrate: 800_000 });
        assert_eq!(levels[2].height, 1080);
        assert!(levels.windows(2).all(|w| w[0].bitrate <= w[1].bitrate));
    }

    #[test]
    fn test_parse_media_playlist_single_level() {
        let levels = parse_levels(MEDIA).unwrap();
        assert_eq!(levels, vec![QualityLevel::from_engine(0, EngineLevel::default())]);
    }

    #[test]
    fn test_parse_invalid_playlist() {
        let err = parse_levels("not a playlist").unwrap_err();
        assert!(matches!(err, Error::ManifestParse(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_mode_report() {
        let report = mode_report(
            "https://cdn.example.com/v/master.m3u8?token=1",
            PlatformCapabilities::new(false, true),
        );
        assert!(report.adaptive_stream);
        assert_eq!(report.mode, DeliveryMode::NativeAdaptive);

        let report = mode_report("movie.mp4", PlatformCapabilities::new(true, true));
        assert_eq!(report.mode, DeliveryMode::Progressive);
    }

    #[tokio::test]
    async fn test_load_playlist_from_file() {
        let path = std::env::temp_dir().join("nonton-cli-master-test.m3u8");
        tokio::fs::write(&path, MASTER).await.unwrap();

        let content = load_playlist(path.to_str().unwrap()).await.unwrap();
        assert_eq!(parse_levels(&content).unwrap().len(), 3);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_load_missing_playlist() {
        let err = load_playlist("/nonexistent/nonton/master.m3u8").await.unwrap_err();
        assert!(matches!(err, Error::ManifestFetch(_)));
        assert_eq!(err.error_code(), "MANIFEST_FETCH");
    }

    #[test]
    fn test_replay_recovers_then_plays() {
        let steps = vec![
            Step::Engine(EngineEvent::ManifestParsed { level_count: 2 }),
            Step::Media(MediaEvent::Play),
            Step::Engine(EngineEvent::Error(StreamError::fatal(ErrorKind::Network, "fragLoadError"))),
            Step::Engine(EngineEvent::Error(StreamError::non_fatal(ErrorKind::Media, "bufferStalledError"))),
            Step::Call(Call::ChangeQuality(1)),
            Step::Engine(EngineEvent::LevelSwitched { level: 1 }),
        ];

        let report = run_replay("https://cdn.example.com/master.m3u8", &steps, &engine_options()).unwrap();

        assert_eq!(report.mode, Some(DeliveryMode::AdaptiveEngine));
        assert_eq!(report.state, LifecycleState::Playing);
        assert_eq!(report.quality_levels.len(), 2);
        assert_eq!(report.stats.network_recoveries, 1);
        assert_eq!(report.stats.non_fatal_errors, 1);
        assert_eq!(report.stats.current_level, Some(1));
        assert!(report.fault.is_none());
        assert!(!report.mount_empty);
    }

    #[test]
    fn test_replay_unrecoverable_error_tears_down() {
        let steps = vec![Step::Engine(EngineEvent::Error(StreamError::fatal(
            ErrorKind::KeySystem,
            "keySystemNoKeys",
        )))];

        let report = run_replay("https://cdn.example.com/master.m3u8", &steps, &engine_options()).unwrap();

        assert_eq!(report.state, LifecycleState::Destroyed);
        assert_eq!(report.fault.map(|f| f.kind), Some(ErrorKind::KeySystem));
        assert!(report.mount_empty);
        assert!(report.quality_levels.is_empty());
    }

    #[test]
    fn test_replay_progressive_destroy() {
        let steps = vec![Step::Media(MediaEvent::Play), Step::Call(Call::Destroy)];

        let report = run_replay("https://cdn.example.com/movie.mp4", &steps, &ReplayOptions::default()).unwrap();

        assert_eq!(report.mode, Some(DeliveryMode::Progressive));
        assert_eq!(report.state, LifecycleState::Destroyed);
        assert!(report.paused);
        assert!(report.mount_empty);
    }

    #[test]
    fn test_replay_rejects_empty_url() {
        assert!(run_replay("", &[], &ReplayOptions::default()).is_err());
    }

    #[test]
    fn test_replay_uses_engine_preset() {
        let options = ReplayOptions {
            engine: EngineConfig::vod(),
            ..engine_options()
        };
        let steps = vec![Step::Engine(EngineEvent::ManifestParsed { level_count: 2 })];

        let report = run_replay("https://cdn.example.com/master.m3u8", &steps, &options).unwrap();
        assert_eq!(report.mode, Some(DeliveryMode::AdaptiveEngine));
        assert_eq!(report.quality_levels.len(), 2);
    }

    #[test]
    fn test_replay_rejects_invalid_engine_config() {
        let options = ReplayOptions {
            engine: EngineConfig { max_buffer_length: -5.0, ..EngineConfig::default() },
            ..engine_options()
        };

        let err = run_replay("https://cdn.example.com/master.m3u8", &[], &options).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidConfig(_))));
    }
}
