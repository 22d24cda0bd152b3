//! One-shot bridge between an engine's completion signal and an awaitable
//! future.
//!
//! An engine is handed a [`CompletionSender`] when it is started and signals
//! the end of its run by calling [`CompletionSender::resolve`]. `resolve`
//! consumes the sender, so a second resolution does not compile. A sender
//! dropped without resolving makes the paired [`CompletionReceiver`] yield
//! a tool error.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

/// What the engine reports when a run ends: its return code and the full
/// aggregated log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCompletion {
    /// Process exit code; `None` when the process was terminated by a signal.
    pub return_code: Option<i32>,
    pub log: String,
}

impl EngineCompletion {
    pub fn new(return_code: Option<i32>, log: impl Into<String>) -> Self {
        Self {
            return_code,
            log: log.into(),
        }
    }

    /// Whether the engine's own return code signals success.
    pub fn is_success(&self) -> bool {
        self.return_code == Some(0)
    }
}

/// Create a linked sender/receiver pair for a single engine run.
pub fn completion_channel(tool: impl Into<String>) -> (CompletionSender, CompletionReceiver) {
    let (tx, rx) = oneshot::channel();
    let tool = tool.into();
    (
        CompletionSender {
            tx,
            tool: tool.clone(),
        },
        CompletionReceiver { rx, tool },
    )
}

/// The engine's half of the bridge.
#[derive(Debug)]
pub struct CompletionSender {
    tx: oneshot::Sender<mg_core::Result<EngineCompletion>>,
    tool: String,
}

impl CompletionSender {
    /// Resolve the run. Launch-level failures are passed as `Err`.
    pub fn resolve(self, result: mg_core::Result<EngineCompletion>) {
        if self.tx.send(result).is_err() {
            tracing::debug!("{} completed after its caller stopped waiting", self.tool);
        }
    }
}

/// The caller's half of the bridge; resolves exactly once.
#[derive(Debug)]
pub struct CompletionReceiver {
    rx: oneshot::Receiver<mg_core::Result<EngineCompletion>>,
    tool: String,
}

impl Future for CompletionReceiver {
    type Output = mg_core::Result<EngineCompletion>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        Pin::new(&mut this.rx).poll(cx).map(|received| match received {
            Ok(result) => result,
            Err(_) => Err(mg_core::Error::tool(
                this.tool.clone(),
                "engine dropped its completion handle without resolving",
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_with_engine_result() {
        let (tx, rx) = completion_channel("ffmpeg");
        tokio::spawn(async move {
            tx.resolve(Ok(EngineCompletion::new(Some(0), "done")));
        });
        let completion = rx.await.unwrap();
        assert!(completion.is_success());
        assert_eq!(completion.log, "done");
    }

    #[tokio::test]
    async fn launch_errors_pass_through() {
        let (tx, rx) = completion_channel("ffmpeg");
        tx.resolve(Err(mg_core::Error::tool("ffmpeg", "failed to spawn: not found")));
        let err = rx.await.unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }

    #[tokio::test]
    async fn dropped_sender_is_an_error() {
        let (tx, rx) = completion_channel("ffmpeg");
        drop(tx);
        let err = rx.await.unwrap_err();
        assert!(err.to_string().contains("without resolving"), "{err}");
    }

    #[test]
    fn resolving_after_receiver_dropped_is_harmless() {
        let (tx, rx) = completion_channel("ffmpeg");
        drop(rx);
        tx.resolve(Ok(EngineCompletion::new(Some(1), "")));
    }

    #[test]
    fn success_requires_zero_code() {
        assert!(EngineCompletion::new(Some(0), "").is_success());
        assert!(!EngineCompletion::new(Some(1), "").is_success());
        assert!(!EngineCompletion::new(None, "").is_success());
    }
}
