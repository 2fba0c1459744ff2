use std::fmt;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};

pub type BoxedSource = Box<dyn AsyncRead + Unpin + Send>;
pub type BoxedSink = Box<dyn AsyncWrite + Unpin + Send>;

/// Which of the three relayed streams a relay serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// parent stdin -> child stdin
    Input,
    /// child stdout -> parent stdout
    Output,
    /// child stderr -> parent stderr
    Error,
}

impl StreamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamKind::Input => "stdin",
            StreamKind::Output => "stdout",
            StreamKind::Error => "stderr",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ChildCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// How the child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitOutcome {
    Exited { code: i32 },
    Signaled { signal: i32 },
    Unknown,
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        matches!(self, ExitOutcome::Exited { code: 0 })
    }
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitOutcome::Exited { code };
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitOutcome::Signaled { signal };
            }
        }
        ExitOutcome::Unknown
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Exited { code } => write!(f, "exit status: {code}"),
            ExitOutcome::Signaled { signal } => write!(f, "signal: {signal}"),
            ExitOutcome::Unknown => f.write_str("unknown termination"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub bytes: u64,
    pub chunks: u64,
}

/// Counters of a running relay, readable while the relay task still owns
/// its streams.
#[derive(Debug, Default)]
pub struct RelayProgress {
    bytes: AtomicU64,
    chunks: AtomicU64,
}

impl RelayProgress {
    pub fn record(&self, n: usize) {
        self.bytes.fetch_add(n as u64, Ordering::Relaxed);
        self.chunks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RelayStats {
        RelayStats {
            bytes: self.bytes.load(Ordering::Relaxed),
            chunks: self.chunks.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RelayReport {
    pub stream: StreamKind,
    pub bytes: u64,
    pub chunks: u64,
    pub suppressed_chunks: u64,
    pub error: Option<String>,
}

/// Summary of one supervised session, written to the capture log as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub session_id: String,
    pub program: String,
    pub args: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub exit: Option<ExitOutcome>,
    pub relays: Vec<RelayReport>,
}
