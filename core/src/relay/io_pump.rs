use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, Instrument};

use crate::error::RelayError;

use super::tee::TeeSink;
use super::types::{RelayProgress, RelayReport, StreamKind};

/// Error recorded for a relay that was still running when draining gave up.
pub const ABANDONED: &str = "abandoned after drain grace";

/// Copies `rd` into `tee` chunk by chunk until end-of-stream.
///
/// `progress` is updated after every chunk that reached all sinks, so it stays
/// accurate when an error cuts the relay short.
pub async fn relay<R>(
    stream: StreamKind,
    rd: &mut R,
    tee: &mut TeeSink,
    progress: &RelayProgress,
    buf_size: usize,
) -> Result<(), RelayError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = vec![0u8; buf_size.max(1)];
    loop {
        let n = rd
            .read(&mut buf)
            .await
            .map_err(|source| RelayError::Source { stream, source })?;
        if n == 0 {
            return Ok(());
        }

        tee.write_chunk(&buf[..n])
            .await
            .map_err(|source| RelayError::Sink { stream, source })?;
        progress.record(n);
    }
}

/// A spawned relay. Dropping it detaches the task.
pub struct RelayTask {
    stream: StreamKind,
    handle: JoinHandle<RelayReport>,
    progress: Arc<RelayProgress>,
    suppressed: Option<Arc<AtomicU64>>,
}

impl RelayTask {
    /// Waits for the relay until `deadline`.
    ///
    /// A relay still running at the deadline is left to the process exit and
    /// reported with the counts it reached, as is a task that panicked.
    pub async fn join_until(mut self, deadline: Instant) -> RelayReport {
        let res = tokio::time::timeout_at(deadline, &mut self.handle).await;
        match res {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                tracing::warn!(stream = %self.stream, error = %e, "relay task failed");
                self.partial_report(format!("relay task failed: {e}"))
            }
            Err(_) => {
                let stats = self.progress.snapshot();
                tracing::warn!(
                    stream = %self.stream,
                    bytes = stats.bytes,
                    "relay still running after child exit, abandoning it"
                );
                self.partial_report(ABANDONED.to_string())
            }
        }
    }

    fn partial_report(&self, error: String) -> RelayReport {
        let stats = self.progress.snapshot();
        RelayReport {
            stream: self.stream,
            bytes: stats.bytes,
            chunks: stats.chunks,
            suppressed_chunks: suppressed_count(self.suppressed.as_deref()),
            error: Some(error),
        }
    }
}

fn suppressed_count(counter: Option<&AtomicU64>) -> u64 {
    counter.map(|c| c.load(Ordering::Relaxed)).unwrap_or(0)
}

/// Runs [`relay`] as its own task, logging through `dispatch` inside the
/// caller's current span.
///
/// Relay errors are reported as warnings and folded into the returned
/// report; they never abort the session. The source and sinks are dropped
/// when the task ends.
pub fn spawn_relay<R>(
    stream: StreamKind,
    mut rd: R,
    mut tee: TeeSink,
    buf_size: usize,
    suppressed: Option<Arc<AtomicU64>>,
    dispatch: &Dispatch,
) -> RelayTask
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let progress = Arc::new(RelayProgress::default());
    let task_progress = progress.clone();
    let task_suppressed = suppressed.clone();
    let task = async move {
        tracing::debug!(%stream, sinks = ?tee.labels(), "relay started");
        let res = relay(stream, &mut rd, &mut tee, &task_progress, buf_size).await;
        let stats = task_progress.snapshot();
        let suppressed_chunks = suppressed_count(task_suppressed.as_deref());

        let error = match res {
            Ok(()) => {
                tracing::info!(
                    %stream,
                    bytes = stats.bytes,
                    chunks = stats.chunks,
                    suppressed_chunks,
                    "relay finished"
                );
                None
            }
            Err(e) => {
                tracing::warn!(%stream, bytes = stats.bytes, error = %e, "relay stopped");
                Some(e.to_string())
            }
        };

        RelayReport {
            stream,
            bytes: stats.bytes,
            chunks: stats.chunks,
            suppressed_chunks,
            error,
        }
    };
    let handle = tokio::spawn(
        task.instrument(tracing::Span::current())
            .with_subscriber(dispatch.clone()),
    );
    RelayTask {
        stream,
        handle,
        progress,
        suppressed,
    }
}
