//! 过滤读取器：在调用方看到数据之前，对每次 read 得到的 chunk 应用过滤函数。
//!
//! Filtering is strictly per chunk. A marker that straddles two reads is not
//! seen by either of them and passes through untouched.
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

/// Result of filtering one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filtered {
    /// Forward the chunk unchanged.
    Keep,
    /// Suppress the whole chunk.
    Drop,
    /// Forward these bytes instead. Must not be longer than the chunk.
    Replace(Vec<u8>),
}

/// A stateless chunk transformation.
pub trait ChunkFilter: Send + Sync {
    fn apply(&self, chunk: &[u8]) -> Filtered;
}

/// Drops every chunk that contains `marker`.
#[derive(Debug, Clone)]
pub struct MarkerFilter {
    marker: Vec<u8>,
}

impl MarkerFilter {
    pub fn new(marker: impl AsRef<[u8]>) -> Self {
        Self {
            marker: marker.as_ref().to_vec(),
        }
    }
}

impl ChunkFilter for MarkerFilter {
    fn apply(&self, chunk: &[u8]) -> Filtered {
        if self.marker.is_empty() {
            return Filtered::Keep;
        }
        match memchr::memmem::find(chunk, &self.marker) {
            Some(_) => Filtered::Drop,
            None => Filtered::Keep,
        }
    }
}

pub struct FilterReader<R> {
    inner: R,
    filter: Arc<dyn ChunkFilter>,
    suppressed: Arc<AtomicU64>,
}

impl<R> FilterReader<R> {
    pub fn new(inner: R, filter: Arc<dyn ChunkFilter>) -> Self {
        Self {
            inner,
            filter,
            suppressed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared counter of fully suppressed chunks; stays readable after the
    /// reader has been moved into a relay.
    pub fn suppressed_counter(&self) -> Arc<AtomicU64> {
        self.suppressed.clone()
    }
}

impl<R> AsyncRead for FilterReader<R>
where
    R: AsyncRead + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            let start = buf.filled().len();
            ready!(Pin::new(&mut this.inner).poll_read(cx, buf))?;
            let n = buf.filled().len() - start;
            if n == 0 {
                return Poll::Ready(Ok(()));
            }

            let kept = match this.filter.apply(&buf.filled()[start..]) {
                Filtered::Keep => return Poll::Ready(Ok(())),
                Filtered::Drop => 0,
                Filtered::Replace(out) => {
                    debug_assert!(out.len() <= n, "filter grew the chunk");
                    let keep = out.len().min(n);
                    buf.set_filled(start);
                    buf.put_slice(&out[..keep]);
                    keep
                }
            };
            if kept > 0 {
                return Poll::Ready(Ok(()));
            }

            // An empty read would look like end-of-stream to the caller, so a
            // suppressed chunk is skipped and the source polled again.
            buf.set_filled(start);
            this.suppressed.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(bytes = n, "suppressed filtered chunk");
        }
    }
}
