//! Delivery mode selection

use crate::{DeliveryMode, PlatformCapabilities};
use url::Url;

/// MIME type probed for native HLS playback
pub const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";

/// Check whether a media URL points at an HLS playlist.
///
/// Accepts absolute and relative URLs; query string, fragment and letter
/// case are ignored.
pub fn is_adaptive_stream(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_lowercase(),
        Err(_) => {
            let end = url.find(|c: char| c == '?' || c == '#').unwrap_or(url.len());
            url[..end].to_lowercase()
        }
    };

    path.ends_with(".m3u8")
}

/// Pick the delivery mode for a URL on a runtime.
///
/// The engine wins over native playback when both are available.
pub fn select_delivery_mode(url: &str, capabilities: PlatformCapabilities) -> DeliveryMode {
    if !is_adaptive_stream(url) {
        return DeliveryMode::Progressive;
    }

    if capabilities.adaptive_engine {
        DeliveryMode::AdaptiveEngine
    } else if capabilities.native_adaptive {
        DeliveryMode::NativeAdaptive
    } else {
        DeliveryMode::Progressive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENGINE: PlatformCapabilities = PlatformCapabilities {
        adaptive_engine: true,
        native_adaptive: false,
    };
    const NATIVE: PlatformCapabilities = PlatformCapabilities {
        adaptive_engine: false,
        native_adaptive: true,
    };
    const BOTH: PlatformCapabilities = PlatformCapabilities {
        adaptive_engine: true,
        native_adaptive: true,
    };
    const NONE: PlatformCapabilities = PlatformCapabilities {
        adaptive_engine: false,
        native_adaptive: false,
    };

    #[test]
    fn test_detect_hls() {
        assert!(is_adaptive_stream("stream.m3u8"));
        assert!(is_adaptive_stream("https://cdn.example.com/anime/ep1/master.m3u8"));
        assert!(is_adaptive_stream("https://cdn.example.com/master.M3U8?token=abc"));
        assert!(is_adaptive_stream("/hls/index.m3u8#t=10"));
    }

    #[test]
    fn test_detect_progressive() {
        assert!(!is_adaptive_stream("clip.mp4"));
        assert!(!is_adaptive_stream("https://cdn.example.com/video.webm"));
        assert!(!is_adaptive_stream("https://cdn.example.com/video.mp4?name=a.m3u8"));
        assert!(!is_adaptive_stream("https://proxy.example.com/play?src=ep1.m3u8"));
    }

    #[test]
    fn test_plain_m3u_is_progressive() {
        assert!(!is_adaptive_stream("playlist.m3u"));
        assert!(!is_adaptive_stream("https://radio.example.com/list.M3U"));
        assert_eq!(select_delivery_mode("playlist.m3u", ENGINE), DeliveryMode::Progressive);
        assert_eq!(select_delivery_mode("playlist.m3u", BOTH), DeliveryMode::Progressive);
    }

    #[test]
    fn test_engine_preferred() {
        assert_eq!(select_delivery_mode("stream.m3u8", ENGINE), DeliveryMode::AdaptiveEngine);
        assert_eq!(select_delivery_mode("stream.m3u8", BOTH), DeliveryMode::AdaptiveEngine);
    }

    #[test]
    fn test_native_fallback() {
        assert_eq!(select_delivery_mode("stream.m3u8", NATIVE), DeliveryMode::NativeAdaptive);
    }

    #[test]
    fn test_progressive_fallback() {
        assert_eq!(select_delivery_mode("stream.m3u8", NONE), DeliveryMode::Progressive);
        assert_eq!(select_delivery_mode("clip.mp4", BOTH), DeliveryMode::Progressive);
        assert_eq!(select_delivery_mode("clip.mp4", NONE), DeliveryMode::Progressive);
    }
}
