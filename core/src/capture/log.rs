//! 捕获日志（lsp_capture.log）：会话内唯一的显式 tracing 上下文。
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use crate::error::CaptureError;

use super::files::create_truncated;

/// Handle to the capture log file. Cheap to clone; every record is written
/// straight to the file so nothing is lost if the process exits abruptly.
#[derive(Clone)]
pub struct CaptureLog {
    file: Arc<Mutex<File>>,
    path: PathBuf,
}

impl CaptureLog {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref().to_path_buf();
        let file = create_truncated(&path)?;
        Ok(Self {
            file: Arc::new(Mutex::new(file)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Builds the session's tracing dispatcher writing into this log.
    pub fn dispatch(&self, level: &str) -> Result<Dispatch, CaptureError> {
        let filter = EnvFilter::try_new(level).map_err(|e| CaptureError::Logging(e.to_string()))?;
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(self.clone())
            .with_ansi(false);
        let subscriber = tracing_subscriber::registry().with(filter).with(layer);
        Ok(Dispatch::new(subscriber))
    }
}

pub struct CaptureLogWriter<'a> {
    guard: MutexGuard<'a, File>,
}

impl Write for CaptureLogWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.guard.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.guard.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.guard.flush()
    }
}

impl<'a> MakeWriter<'a> for CaptureLog {
    type Writer = CaptureLogWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        // A panic while holding the lock leaves the file usable.
        let guard = self.file.lock().unwrap_or_else(|e| e.into_inner());
        CaptureLogWriter { guard }
    }
}
