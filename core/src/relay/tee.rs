use tokio::io::AsyncWriteExt;

use crate::error::SinkError;

use super::types::BoxedSink;

struct SinkSlot {
    label: &'static str,
    sink: BoxedSink,
}

/// Fans one byte stream out to several destinations.
///
/// Every chunk is written and flushed to each destination in insertion
/// order before the next chunk is accepted. A failure stops at the failing
/// destination; earlier destinations keep what they already received.
#[derive(Default)]
pub struct TeeSink {
    sinks: Vec<SinkSlot>,
}

impl TeeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, label: &'static str, sink: BoxedSink) -> Self {
        self.sinks.push(SinkSlot { label, sink });
        self
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.label).collect()
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), SinkError> {
        if chunk.is_empty() {
            return Ok(());
        }
        for slot in self.sinks.iter_mut() {
            let res = match slot.sink.write_all(chunk).await {
                Ok(()) => slot.sink.flush().await,
                Err(e) => Err(e),
            };
            res.map_err(|source| SinkError {
                sink: slot.label,
                source,
            })?;
        }
        Ok(())
    }
}
