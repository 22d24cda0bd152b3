//! The seam between the gateway and the external multimedia engine.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::command::ToolCommand;
use crate::completion::{CompletionSender, EngineCompletion};
use crate::tools::ToolRegistry;

/// An external engine that runs one invocation per call.
///
/// Both methods return immediately; the run proceeds in the background.
/// Implementations must be called from within a tokio runtime.
pub trait Engine: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Start a run. `done` must be resolved exactly once with the return
    /// code and full log, or with an error if the run could not be launched
    /// or awaited.
    fn start(&self, args: Vec<String>, done: CompletionSender);

    /// Start a run whose log is pushed into `records` one record at a time.
    /// Dropping `records` (when the engine exits, or fails to launch) closes
    /// the channel; the exit status is not reported.
    fn start_streaming(&self, args: Vec<String>, records: mpsc::Sender<String>);
}

/// [`Engine`] backed by the ffmpeg executable.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    program: PathBuf,
    timeout: Duration,
}

impl FfmpegEngine {
    pub fn new(program: PathBuf, timeout: Duration) -> Self {
        Self { program, timeout }
    }

    /// Use the ffmpeg found by `tools`. When it was not found, the bare
    /// program name is used so the failure surfaces at launch time.
    pub fn from_registry(tools: &ToolRegistry, timeout: Duration) -> Self {
        let program = match tools.require("ffmpeg") {
            Ok(cfg) => cfg.path.clone(),
            Err(e) => {
                tracing::warn!("{e}");
                PathBuf::from("ffmpeg")
            }
        };
        Self::new(program, timeout)
    }

    fn command(&self, args: Vec<String>) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.program.clone());
        cmd.args(args);
        cmd.timeout(self.timeout);
        cmd
    }
}

impl Engine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn start(&self, args: Vec<String>, done: CompletionSender) {
        let cmd = self.command(args);
        tokio::spawn(async move {
            let result = cmd
                .run()
                .await
                .map(|out| EngineCompletion::new(out.status.code(), out.log()));
            done.resolve(result);
        });
    }

    fn start_streaming(&self, args: Vec<String>, records: mpsc::Sender<String>) {
        let cmd = self.command(args);
        tokio::spawn(async move {
            let name = cmd.program_name();
            let mut process = match cmd.spawn_logged() {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!("{e}");
                    return;
                }
            };

            let run = async {
                let mut forwarding = true;
                loop {
                    match process.records.next_record().await {
                        Ok(Some(record)) => {
                            // Keep draining after the consumer leaves so the
                            // child never blocks on a full pipe.
                            if forwarding && records.send(record).await.is_err() {
                                forwarding = false;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            tracing::warn!("{name}: error reading log: {e}");
                            break;
                        }
                    }
                }
                process.child.wait().await
            };

            match tokio::time::timeout(cmd.timeout_duration(), run).await {
                Ok(Ok(status)) => tracing::debug!("{name} exited with {status}"),
                Ok(Err(e)) => tracing::warn!("{name}: I/O error waiting for process: {e}"),
                Err(_) => tracing::warn!("{name} timed out after {:?}", cmd.timeout_duration()),
            }
        });
    }
}
