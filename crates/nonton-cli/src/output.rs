//! Output formatting for CLI

use nonton_core::QualityLevel;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

/// Render a report as pretty JSON, or as `key: value` lines otherwise
pub fn format_output<T: Serialize>(data: &T, format: &str) -> String {
    let value = serde_json::to_value(data).unwrap_or_default();
    match OutputFormat::from(format) {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table | OutputFormat::Text => match value {
            serde_json::Value::Object(fields) => fields
                .iter()
                .map(|(key, value)| format!("{}: {}", key, plain(value)))
                .collect::<Vec<_>>()
                .join("\n"),
            other => plain(&other),
        },
    }
}

fn plain(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

#[derive(Tabled)]
struct LevelRow {
    #[tabled(rename = "#")]
    index: usize,
    quality: &'static str,
    resolution: String,
    bitrate: String,
}

impl From<&QualityLevel> for LevelRow {
    fn from(level: &QualityLevel) -> Self {
        Self {
            index: level.index,
            quality: level.quality_name(),
            resolution: format!("{}x{}", level.width, level.height),
            bitrate: format_bitrate(level.bitrate),
        }
    }
}

/// Render a quality ladder
pub fn format_levels(levels: &[QualityLevel], format: &str) -> String {
    match OutputFormat::from(format) {
        OutputFormat::Json => {
            serde_json::to_string_pretty(levels).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Table => Table::new(levels.iter().map(LevelRow::from)).to_string(),
        OutputFormat::Text => levels
            .iter()
            .map(|l| {
                format!(
                    "{}. {} {}x{} {}",
                    l.index,
                    l.quality_name(),
                    l.width,
                    l.height,
                    format_bitrate(l.bitrate)
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

pub fn format_bitrate(bps: u64) -> String {
    if bps >= 1_000_000 {
        format!("{:.1} Mbps", bps as f64 / 1_000_000.0)
    } else if bps >= 1_000 {
        format!("{} kbps", bps / 1_000)
    } else {
        format!("{} bps", bps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("table"), OutputFormat::Table);
        assert_eq!(OutputFormat::from("anything"), OutputFormat::Text);
    }

    #[test]
    fn test_format_output_text() {
        let text = format_output(&json!({"mode": "progressive", "fault": null}), "text");
        assert!(text.contains("mode: progressive"));
        assert!(text.contains("fault: -"));
    }

    #[test]
    fn test_format_bitrate() {
        assert_eq!(format_bitrate(5_000_000), "5.0 Mbps");
        assert_eq!(format_bitrate(800_000), "800 kbps");
        assert_eq!(format_bitrate(500), "500 bps");
    }

    #[test]
    fn test_format_levels_table() {
        let levels = [QualityLevel { index: 0, height: 720, width: 1280, bitrate: 2_500_000 }];
        let table = format_levels(&levels, "table");
        assert!(table.contains("720p"));
        assert!(table.contains("1280x720"));
    }
}
