//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from TOML and carries the
//! tool and conversion sections. Every section defaults sensibly so a
//! completely empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tools: ToolsConfig,
    pub conversion: ConversionConfig,
}

impl Config {
    /// Deserialize a `Config` from a TOML string.
    ///
    /// String-based so the caller can read the file however it sees fit.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let conv = &self.conversion;

        if conv.segment_duration == 0 {
            warnings.push(
                "conversion.segment_duration is 0; streaming conversions need an explicit duration"
                    .into(),
            );
        }

        if conv.timeout_secs == 0 {
            warnings.push("conversion.timeout_secs is 0; every engine run will time out".into());
        }

        if conv.max_concurrent == Some(0) {
            warnings.push("conversion.max_concurrent is 0; the gateway will refuse to start".into());
        }

        if !conv.segment_pattern.contains('%') || !conv.segment_pattern.contains('d') {
            warnings.push(format!(
                "conversion.segment_pattern '{}' has no numeric placeholder (e.g. %03d)",
                conv.segment_pattern
            ));
        }

        if !conv.manifest_name.ends_with(".m3u8") {
            warnings.push(format!(
                "conversion.manifest_name '{}' does not end in .m3u8",
                conv.manifest_name
            ));
        }

        if let Some(ref p) = self.tools.ffmpeg_path {
            if !p.exists() {
                warnings.push(format!(
                    "tools.ffmpeg_path {} does not exist; PATH will be searched",
                    p.display()
                ));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
}

/// Encoding and output-layout defaults for the transcode gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub video_codec: String,
    pub audio_codec: String,
    /// Segment / fragment length in seconds for the streaming modes.
    pub segment_duration: u32,
    pub manifest_name: String,
    pub segment_pattern: String,
    pub timeout_secs: u64,
    /// Upper bound on engine processes running at once. `None` is unbounded.
    pub max_concurrent: Option<usize>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".into(),
            audio_codec: "aac".into(),
            segment_duration: 4,
            manifest_name: "playlist.m3u8".into(),
            segment_pattern: "segment%03d.ts".into(),
            timeout_secs: 86400,
            max_concurrent: None,
        }
    }
}

impl ConversionConfig {
    /// Engine run timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.conversion.video_codec, "libx264");
        assert_eq!(cfg.conversion.audio_codec, "aac");
        assert_eq!(cfg.conversion.segment_duration, 4);
        assert_eq!(cfg.conversion.manifest_name, "playlist.m3u8");
        assert!(cfg.conversion.max_concurrent.is_none());
        assert!(cfg.tools.ffmpeg_path.is_none());
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = Config::from_toml(
            r#"
            [conversion]
            segment_duration = 6
            max_concurrent = 2
            "#,
        )
        .unwrap();
        assert_eq!(cfg.conversion.segment_duration, 6);
        assert_eq!(cfg.conversion.max_concurrent, Some(2));
        assert_eq!(cfg.conversion.timeout(), Duration::from_secs(86400));
    }

    #[test]
    fn malformed_toml_is_validation_error() {
        let err = Config::from_toml("[conversion\nsegment_duration = ").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn validate_flags_questionable_values() {
        let mut cfg = Config::default();
        cfg.conversion.segment_duration = 0;
        cfg.conversion.max_concurrent = Some(0);
        cfg.conversion.segment_pattern = "segment.ts".into();
        cfg.conversion.manifest_name = "index.txt".into();
        cfg.tools.ffmpeg_path = Some(PathBuf::from("/nonexistent/ffmpeg_xyz"));

        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 5, "{warnings:?}");
    }
}
