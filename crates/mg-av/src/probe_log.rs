//! Translation of ffmpeg's free-form probe log into a [`MediaProbeResult`].
//!
//! All knowledge of the log's phrasing lives in [`parse_probe_log`]. If the
//! engine changes its wording, the fields silently come back empty; nothing
//! here turns a missing match into an error.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Version of the log grammar understood by [`parse_probe_log`]. Bump it
/// whenever a pattern changes.
pub const PARSER_VERSION: u32 = 1;

/// Info-map key for the container duration.
pub const DURATION_KEY: &str = "duration";
/// Info-map key for the first stream's video codec descriptor.
pub const VIDEO_CODEC_KEY: &str = "videoCodec";

static DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Duration: ([0-9:.]+)").expect("duration pattern is valid"));

static VIDEO_STREAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Stream #0:0.*?Video: ([^,\r\n]+)").expect("video stream pattern is valid")
});

/// Structured result of probing one input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaProbeResult {
    pub parser_version: u32,
    /// Raw duration token, e.g. `00:01:30.50`.
    pub duration: Option<String>,
    /// `duration` converted to seconds, when it is well formed.
    pub duration_secs: Option<f64>,
    /// Video descriptor of stream `#0:0`, e.g. `h264 (High) (avc1 / 0x31637661)`.
    pub video_codec: Option<String>,
}

impl MediaProbeResult {
    /// The string-keyed view: `duration` and `videoCodec`, each present only
    /// when its pattern matched.
    pub fn to_info_map(&self) -> BTreeMap<String, String> {
        let mut info = BTreeMap::new();
        if let Some(ref d) = self.duration {
            info.insert(DURATION_KEY.to_string(), d.clone());
        }
        if let Some(ref c) = self.video_codec {
            info.insert(VIDEO_CODEC_KEY.to_string(), c.clone());
        }
        info
    }
}

/// Parse a probe log. The two patterns are matched independently.
pub fn parse_probe_log(log: &str) -> MediaProbeResult {
    let duration = DURATION
        .captures(log)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let video_codec = VIDEO_STREAM
        .captures(log)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());

    MediaProbeResult {
        parser_version: PARSER_VERSION,
        duration_secs: duration.as_deref().and_then(clock_to_secs),
        duration,
        video_codec,
    }
}

/// Convert `[[HH:]MM:]SS[.frac]` to seconds. Returns `None` for anything
/// that is not made of at most three numeric components.
pub fn clock_to_secs(token: &str) -> Option<f64> {
    let (negative, body) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };

    let parts: Vec<&str> = body.split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let mut secs = 0.0;
    for part in &parts {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
            return None;
        }
        let value: f64 = part.parse().ok()?;
        secs = secs * 60.0 + value;
    }

    Some(if negative { -secs } else { secs })
}
