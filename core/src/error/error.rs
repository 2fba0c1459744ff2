use std::path::PathBuf;

use thiserror::Error;

use crate::relay::{ExitOutcome, Phase, StreamKind};

/// Startup failures: nothing has been relayed yet when one of these occurs.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("cannot determine a log directory: {0}")]
    BaseDir(String),
    #[error("cannot open {}: {source}", .path.display())]
    LogOpen {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("logging setup failed: {0}")]
    Logging(String),
}

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("start sub process {program} failed: {source}")]
    Start {
        program: String,
        source: std::io::Error,
    },
    #[error("failed to create {stream} pipe")]
    Pipe { stream: StreamKind },
    #[error("command finished with error: {outcome}")]
    ChildFailed { outcome: ExitOutcome },
    #[error("waiting for child failed: {0}")]
    Wait(std::io::Error),
    #[error("invalid phase transition {from:?} -> {to:?}")]
    Phase { from: Phase, to: Phase },
}

/// A tee destination that rejected a write.
#[derive(Error, Debug)]
#[error("write to {sink} failed: {source}")]
pub struct SinkError {
    pub sink: &'static str,
    #[source]
    pub source: std::io::Error,
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("error copying {stream}: {source}")]
    Source {
        stream: StreamKind,
        source: std::io::Error,
    },
    #[error("error copying {stream}: {source}")]
    Sink {
        stream: StreamKind,
        #[source]
        source: SinkError,
    },
}
