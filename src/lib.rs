//! Mediagate - async transcoding gateway and playback facade
//!
//! This library crate exposes the configuration loader and re-exports the
//! workspace crates for the binary and for integration testing.

pub mod config;

pub use mg_av::{
    ConversionOutcome, ConversionRequest, Engine, FfmpegEngine, MediaProbeResult, OutputMode,
    ProgressSample, ProgressStream, ToolRegistry, TranscodeGateway,
};
pub use mg_core::{Error, Result};
pub use mg_playback::{ClockEngine, MediaSource, MediaTime, PlaybackEngine, Player};
