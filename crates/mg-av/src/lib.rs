//! # mg-av
//!
//! Transcoding and log scraping over the ffmpeg command-line engine.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache the path to ffmpeg.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support, capturing output or streaming stderr record by record.
//! - **Engine seam** ([`Engine`], [`FfmpegEngine`]) -- the engine is started
//!   with a one-shot [`CompletionSender`] it must resolve exactly once.
//! - **Argument recipes** ([`recipes`]) -- discrete argument lists for each
//!   output mode; nothing is ever handed to a shell.
//! - **Log parsing** ([`probe_log`], [`progress`]) -- regex translation of the
//!   engine's free-form log into [`MediaProbeResult`] and [`ProgressSample`]s.
//! - **Gateway** ([`TranscodeGateway`]) -- the public conversion operations.

pub mod command;
pub mod completion;
pub mod engine;
pub mod gateway;
pub mod probe_log;
pub mod progress;
pub mod recipes;
pub mod tools;

// ---- Re-exports for convenience ----

pub use command::{LogRecords, ToolCommand, ToolOutput};
pub use completion::{completion_channel, CompletionReceiver, CompletionSender, EngineCompletion};
pub use engine::{Engine, FfmpegEngine};
pub use gateway::{ConversionOutcome, ConversionRequest, OutputMode, TranscodeGateway};
pub use probe_log::{parse_probe_log, MediaProbeResult};
pub use progress::{ProgressSample, ProgressStream};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
