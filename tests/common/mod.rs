//! Shared test harness for integration tests.
//!
//! Provides [`ScriptedEngine`], an [`Engine`] double that answers with a
//! canned return code and log and manipulates the expected artifact the way
//! each test needs, plus small filesystem helpers.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mediagate::{Engine, TranscodeGateway};
use mg_av::{CompletionSender, EngineCompletion, ToolCommand, ToolRegistry};
use mg_core::config::ConversionConfig;
use tokio::sync::mpsc;

/// What the scripted engine does to the artifact named by its last argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// Write a non-empty file there.
    Write,
    /// Leave it alone.
    Skip,
    /// Write it, then delete it again before signalling completion.
    WriteThenDelete,
    /// Write a zero-byte file there.
    Empty,
}

/// Counts runs in flight and remembers the highest count seen.
#[derive(Default)]
pub struct RunGauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl RunGauge {
    fn enter(self: &Arc<Self>) -> RunGuard {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        RunGuard(self.clone())
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct RunGuard(Arc<RunGauge>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct ScriptedEngine {
    code: Option<i32>,
    log: String,
    artifact: Artifact,
    /// How long each run stays alive after emitting its output.
    hold: Duration,
    gauge: Arc<RunGauge>,
    launches: AtomicUsize,
    invocations: Mutex<Vec<Vec<String>>>,
}

impl ScriptedEngine {
    pub fn new(code: Option<i32>, log: &str, artifact: Artifact) -> Arc<Self> {
        Self::holding(code, log, artifact, Duration::ZERO)
    }

    /// Like [`ScriptedEngine::new`], but every run stays alive for `hold`.
    pub fn holding(code: Option<i32>, log: &str, artifact: Artifact, hold: Duration) -> Arc<Self> {
        Arc::new(Self {
            code,
            log: log.to_string(),
            artifact,
            hold,
            gauge: Arc::default(),
            launches: AtomicUsize::new(0),
            invocations: Mutex::new(Vec::new()),
        })
    }

    /// Highest number of runs that were alive at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.gauge.peak()
    }

    pub fn succeeding() -> Arc<Self> {
        Self::new(Some(0), "", Artifact::Write)
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn last_args(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, args: &[String]) {
        self.launches.fetch_add(1, Ordering::SeqCst);
        self.invocations.lock().unwrap().push(args.to_vec());
    }
}

impl Engine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn start(&self, args: Vec<String>, done: CompletionSender) {
        self.record(&args);
        let guard = self.gauge.enter();

        let target = args.last().map(PathBuf::from);
        let code = self.code;
        let log = self.log.clone();
        let artifact = self.artifact;
        let hold = self.hold;

        tokio::spawn(async move {
            if let Some(target) = target {
                match artifact {
                    Artifact::Write => std::fs::write(&target, b"scripted output").unwrap(),
                    Artifact::WriteThenDelete => {
                        std::fs::write(&target, b"scripted output").unwrap();
                        std::fs::remove_file(&target).unwrap();
                    }
                    Artifact::Empty => std::fs::write(&target, b"").unwrap(),
                    Artifact::Skip => {}
                }
            }
            tokio::time::sleep(hold).await;
            drop(guard);
            done.resolve(Ok(EngineCompletion::new(code, log)));
        });
    }

    fn start_streaming(&self, args: Vec<String>, records: mpsc::Sender<String>) {
        self.record(&args);

        // Emit the log the way ffmpeg does: status updates rewritten with \r.
        let records_out: Vec<String> = self
            .log
            .split(['\n', '\r'])
            .filter(|r| !r.is_empty())
            .map(String::from)
            .collect();

        let guard = self.gauge.enter();
        let hold = self.hold;

        tokio::spawn(async move {
            for record in records_out {
                if records.send(record).await.is_err() {
                    break;
                }
            }
            tokio::time::sleep(hold).await;
            // The run ends before its log closes, as with a real process.
            drop(guard);
            drop(records);
        });
    }
}

pub fn gateway(engine: Arc<ScriptedEngine>) -> TranscodeGateway {
    TranscodeGateway::new(engine, ConversionConfig::default()).unwrap()
}

/// Create a small placeholder media file.
pub fn touch(dir: &Path, name: &str) -> PathBuf {
    let p = dir.join(name);
    std::fs::write(&p, b"not really media").unwrap();
    p
}

/// Path to an ffmpeg that can encode H.264, or `None` to skip real-engine
/// tests on machines without one.
pub fn real_ffmpeg() -> Option<PathBuf> {
    let registry = ToolRegistry::discover(&Default::default());
    let path = registry.require("ffmpeg").ok()?.path.clone();
    let encoders = std::process::Command::new(&path)
        .args(["-hide_banner", "-encoders"])
        .output()
        .ok()?;
    let listing = String::from_utf8_lossy(&encoders.stdout);
    (listing.contains("libx264") && listing.contains(" aac ")).then_some(path)
}

/// Generate a short test clip with ffmpeg's built-in sources.
pub async fn synth_clip(ffmpeg: &Path, dest: &Path, seconds: u32) {
    let mut cmd = ToolCommand::new(ffmpeg.to_path_buf());
    cmd.args(["-hide_banner", "-nostdin", "-y"]);
    cmd.args(["-f", "lavfi", "-i"]);
    cmd.arg(format!("testsrc=duration={seconds}:size=320x240:rate=25"));
    cmd.args(["-f", "lavfi", "-i"]);
    cmd.arg(format!("sine=frequency=440:duration={seconds}"));
    cmd.args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-c:a", "aac", "-shortest"]);
    cmd.arg(dest.to_string_lossy());
    let out = cmd.run().await.expect("ffmpeg runs");
    assert!(out.status.success(), "clip synthesis failed:\n{}", out.log());
}
