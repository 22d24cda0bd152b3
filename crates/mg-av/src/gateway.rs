//! The transcode gateway: validate input, run the engine, verify artifacts.
//!
//! Every conversion-style operation follows the same rule: the engine's
//! return code alone never decides success. A zero return code is required,
//! and then the expected artifact must be present on disk and non-empty.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mg_core::config::{Config, ConversionConfig};
use mg_core::{Error, Result};
use serde::Serialize;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};

use crate::completion::{completion_channel, EngineCompletion};
use crate::engine::{Engine, FfmpegEngine};
use crate::probe_log::{parse_probe_log, MediaProbeResult};
use crate::progress::{pump_samples, ProgressStream};
use crate::recipes::{self, HlsLayout};
use crate::tools::ToolRegistry;

const OUTPUT_FILE: &str = "Output file";
const MANIFEST_FILE: &str = "Manifest file";
const NO_INFO: &str = "Failed to get video info";

/// Buffered records/samples between the engine reader and the consumer.
const PROGRESS_BUFFER: usize = 64;

/// Which artifact a [`ConversionRequest`] should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Single progressive-download MP4.
    Mp4,
    /// HLS manifest plus numbered segments in a directory.
    Hls,
    /// Single fragmented MP4.
    FragmentedMp4,
}

/// One conversion, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub input: PathBuf,
    /// Output file, or output directory for [`OutputMode::Hls`].
    pub output: PathBuf,
    /// Segment length in seconds; the configured default when `None`.
    pub segment_duration: Option<u32>,
}

impl ConversionRequest {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            segment_duration: None,
        }
    }

    pub fn with_segment_duration(mut self, secs: u32) -> Self {
        self.segment_duration = Some(secs);
        self
    }
}

/// Result of [`TranscodeGateway::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// The artifact exists at `output` (the manifest, for HLS).
    Succeeded { output: PathBuf },
    /// The engine failed or the artifact is missing.
    Failed { diagnostic: String },
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionOutcome::Succeeded { .. })
    }
}

/// Entry point for every conversion operation.
#[derive(Clone)]
pub struct TranscodeGateway {
    engine: Arc<dyn Engine>,
    conversion: ConversionConfig,
    limiter: Option<Arc<Semaphore>>,
}

impl std::fmt::Debug for TranscodeGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscodeGateway")
            .field("engine", &self.engine.name())
            .field("conversion", &self.conversion)
            .field("limiter", &self.limiter)
            .finish()
    }
}

impl TranscodeGateway {
    /// Build a gateway over `engine`.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if `conversion.max_concurrent` is zero or above
    /// [`Semaphore::MAX_PERMITS`].
    pub fn new(engine: Arc<dyn Engine>, conversion: ConversionConfig) -> Result<Self> {
        let limiter = match conversion.max_concurrent {
            None => None,
            Some(0) => {
                return Err(Error::Validation(
                    "conversion.max_concurrent must be at least 1".into(),
                ))
            }
            Some(n) if n > Semaphore::MAX_PERMITS => {
                return Err(Error::Validation(format!(
                    "conversion.max_concurrent {n} exceeds the limit of {}",
                    Semaphore::MAX_PERMITS
                )))
            }
            Some(n) => Some(Arc::new(Semaphore::new(n))),
        };
        Ok(Self {
            engine,
            conversion,
            limiter,
        })
    }

    /// Build a gateway over the ffmpeg located via `config.tools`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let tools = ToolRegistry::discover(&config.tools);
        let engine = FfmpegEngine::from_registry(&tools, config.conversion.timeout());
        Self::new(Arc::new(engine), config.conversion.clone())
    }

    /// Re-encode `input` to an H.264/AAC MP4 at `output`, with the index at
    /// the front of the file.
    pub async fn convert(&self, input: &Path, output: &Path) -> Result<PathBuf> {
        require_input(input)?;
        prepare_dir(output.parent());

        tracing::info!("MP4 convert: {:?} -> {:?}", input, output);
        let completion = self
            .execute(recipes::mp4(input, output, &self.conversion))
            .await?;
        verify(completion, output, OUTPUT_FILE).await
    }

    /// Probe `input` and return the `duration`/`videoCodec` info map.
    /// Keys whose pattern did not match are absent.
    pub async fn get_info(&self, input: &Path) -> Result<BTreeMap<String, String>> {
        Ok(self.probe(input).await?.to_info_map())
    }

    /// Probe `input` and return the structured result.
    ///
    /// The engine's return code is ignored (a probe has no output and ffmpeg
    /// always complains about that); only an empty log is a failure.
    pub async fn probe(&self, input: &Path) -> Result<MediaProbeResult> {
        require_input(input)?;

        tracing::info!("Probe: {:?}", input);
        let completion = self.execute(recipes::probe(input)).await?;
        if completion.log.trim().is_empty() {
            return Err(Error::conversion_failed(NO_INFO));
        }

        let result = parse_probe_log(&completion.log);
        tracing::debug!("Probe result for {:?}: {:?}", input, result);
        Ok(result)
    }

    /// Segment `input` into HLS under `output_dir`; returns the manifest path.
    pub async fn start_streaming_conversion(
        &self,
        input: &Path,
        output_dir: &Path,
        segment_duration: Option<u32>,
    ) -> Result<PathBuf> {
        require_input(input)?;
        let segment_duration = self.segment_duration(segment_duration)?;
        prepare_dir(Some(output_dir));

        let layout = HlsLayout::new(output_dir, &self.conversion);

        tracing::info!(
            "HLS segment: {:?} -> {:?} (segment_duration={}s)",
            input,
            output_dir,
            segment_duration
        );
        let completion = self
            .execute(recipes::hls(input, &layout, segment_duration, &self.conversion))
            .await?;
        verify(completion, &layout.manifest, MANIFEST_FILE).await
    }

    /// Re-encode `input` to a fragmented MP4 suitable for progressive
    /// streaming.
    pub async fn create_streaming_mp4(
        &self,
        input: &Path,
        output: &Path,
        segment_duration: Option<u32>,
    ) -> Result<PathBuf> {
        require_input(input)?;
        let segment_duration = self.segment_duration(segment_duration)?;
        prepare_dir(output.parent());

        tracing::info!(
            "Fragmented MP4: {:?} -> {:?} (segment_duration={}s)",
            input,
            output,
            segment_duration
        );
        let completion = self
            .execute(recipes::fragmented_mp4(
                input,
                output,
                segment_duration,
                &self.conversion,
            ))
            .await?;
        verify(completion, output, OUTPUT_FILE).await
    }

    /// Run an analysis pass over `input` and stream the elapsed time the
    /// engine reports.
    ///
    /// The stream ends when the engine exits. Engine failures after launch
    /// only end the stream early; nothing is reported to the consumer.
    pub async fn monitor_progress(&self, input: &Path) -> Result<ProgressStream> {
        require_input(input)?;

        let permit = self.acquire().await?;

        let (record_tx, record_rx) = mpsc::channel(PROGRESS_BUFFER);
        let (sample_tx, sample_rx) = mpsc::channel(PROGRESS_BUFFER);

        tracing::info!("Progress monitor: {:?}", input);
        self.engine.start_streaming(recipes::analysis(input), record_tx);

        tokio::spawn(async move {
            // Held until the engine closes its log, which it does on exit.
            let _permit = permit;
            pump_samples(record_rx, sample_tx).await;
        });

        Ok(ProgressStream::new(sample_rx))
    }

    /// Execute `request` in `mode`, folding conversion failures into
    /// [`ConversionOutcome::Failed`]. A missing input or a rejected segment
    /// duration stays an `Err`.
    pub async fn run(&self, request: &ConversionRequest, mode: OutputMode) -> Result<ConversionOutcome> {
        let result = match mode {
            OutputMode::Mp4 => self.convert(&request.input, &request.output).await,
            OutputMode::Hls => {
                self.start_streaming_conversion(
                    &request.input,
                    &request.output,
                    request.segment_duration,
                )
                .await
            }
            OutputMode::FragmentedMp4 => {
                self.create_streaming_mp4(&request.input, &request.output, request.segment_duration)
                    .await
            }
        };

        match result {
            Ok(output) => Ok(ConversionOutcome::Succeeded { output }),
            Err(Error::ConversionFailed(diagnostic)) => Ok(ConversionOutcome::Failed { diagnostic }),
            Err(e) => Err(e),
        }
    }

    /// The requested segment length, else the configured one. Zero is
    /// rejected before anything is launched.
    fn segment_duration(&self, requested: Option<u32>) -> Result<u32> {
        match requested.unwrap_or(self.conversion.segment_duration) {
            0 => Err(Error::Validation(
                "segment duration must be at least 1 second".into(),
            )),
            secs => Ok(secs),
        }
    }

    async fn acquire(&self) -> Result<Option<OwnedSemaphorePermit>> {
        match self.limiter {
            Some(ref sem) => sem
                .clone()
                .acquire_owned()
                .await
                .map(Some)
                .map_err(|_| Error::conversion_failed("engine limiter closed")),
            None => Ok(None),
        }
    }

    /// Launch the engine and wait for its single completion signal.
    ///
    /// The permit lives in a task that waits for the completion, so it is
    /// only returned once the engine has finished even if the caller stops
    /// waiting.
    async fn execute(&self, args: Vec<String>) -> Result<EngineCompletion> {
        let permit = self.acquire().await?;

        tracing::debug!("{} {:?}", self.engine.name(), args);
        let (done, completion) = completion_channel(self.engine.name());
        self.engine.start(args, done);

        let waiter = tokio::spawn(async move {
            let _permit = permit;
            completion.await
        });

        match waiter.await {
            Ok(result) => result.map_err(Error::into_conversion_failure),
            Err(e) => Err(Error::conversion_failed(format!(
                "{} completion task failed: {e}",
                self.engine.name()
            ))),
        }
    }
}

fn require_input(input: &Path) -> Result<()> {
    if input.is_file() {
        Ok(())
    } else {
        Err(Error::invalid_input(input))
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// Best-effort directory creation; a failure shows up later as an engine
/// failure or a missing artifact.
fn prepare_dir(dir: Option<&Path>) {
    let Some(dir) = dir.filter(|d| !d.as_os_str().is_empty()) else {
        return;
    };
    if let Err(e) = ensure_dir(dir) {
        tracing::warn!("Failed to create output dir {}: {e}", dir.display());
    }
}

/// Apply the success rule: zero return code, then the artifact must exist
/// and hold at least one byte. `kind` names the artifact in diagnostics.
async fn verify(completion: EngineCompletion, artifact: &Path, kind: &str) -> Result<PathBuf> {
    if !completion.is_success() {
        tracing::warn!(
            "Engine failed with code {:?} for {:?}",
            completion.return_code,
            artifact
        );
        return Err(Error::ConversionFailed(completion.log));
    }

    match tokio::fs::metadata(artifact).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(artifact.to_path_buf()),
        Ok(meta) if meta.is_file() => {
            tracing::warn!("Engine reported success but {:?} is empty", artifact);
            Err(Error::conversion_failed(format!("{kind} is empty")))
        }
        _ => {
            tracing::warn!("Engine reported success but {:?} is missing", artifact);
            Err(Error::conversion_failed(format!("{kind} was not created")))
        }
    }
}
