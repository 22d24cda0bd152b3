//! Progress samples scraped from the engine's status line, and the stream
//! that delivers them.

use std::pin::Pin;
use std::sync::LazyLock;
use std::task::{Context, Poll};

use futures::Stream;
use regex::Regex;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::probe_log::clock_to_secs;

static TIME_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btime=(\S+)").expect("time pattern is valid"));

/// Elapsed media time reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSample {
    pub elapsed_secs: f64,
}

/// Every parseable `time=<elapsed>` token in `record`, in order.
/// Tokens that do not parse (`time=N/A`, `time=garbage`) are skipped.
pub fn samples_in(record: &str) -> impl Iterator<Item = ProgressSample> + '_ {
    TIME_TOKEN
        .captures_iter(record)
        .filter_map(|c| c.get(1))
        .filter_map(|m| clock_to_secs(m.as_str()))
        .map(|elapsed_secs| ProgressSample { elapsed_secs })
}

/// Lazy, finite stream of [`ProgressSample`]s from one engine run.
///
/// Ends when the engine exits, whatever its exit status. It cannot be
/// restarted; monitoring again launches a new run.
#[derive(Debug)]
pub struct ProgressStream {
    inner: ReceiverStream<ProgressSample>,
}

impl ProgressStream {
    pub(crate) fn new(rx: mpsc::Receiver<ProgressSample>) -> Self {
        Self {
            inner: ReceiverStream::new(rx),
        }
    }
}

impl Stream for ProgressStream {
    type Item = ProgressSample;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Drain `records` and push every sample into `samples` until the record
/// channel closes, which happens when the engine exits.
///
/// If the consumer goes away, forwarding stops but draining continues, so
/// the caller can hold resources for exactly as long as the engine runs.
pub(crate) async fn pump_samples(
    mut records: mpsc::Receiver<String>,
    samples: mpsc::Sender<ProgressSample>,
) {
    let mut forwarding = true;
    while let Some(record) = records.recv().await {
        if !forwarding {
            continue;
        }
        for sample in samples_in(&record) {
            tracing::trace!(elapsed = sample.elapsed_secs, "progress");
            if samples.send(sample).await.is_err() {
                tracing::debug!("progress consumer dropped; draining until the engine exits");
                forwarding = false;
                break;
            }
        }
    }
}
