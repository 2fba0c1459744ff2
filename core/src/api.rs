//! Stable re-exports for consumers (`cli` and external crates).
//!
//! Prefer importing from `lspcap_core::api` instead of reaching into internal modules.

pub use crate::capture::{CaptureLog, RelayLogs};
pub use crate::config::{
    resolve_log_dir, BaseDir, BaseDirSource, CaptureConfig, ExitPolicy, FilterConfig,
    LogFileNames, LoggingConfig, RelayConfig,
};
pub use crate::error::{CaptureError, RelayError, SinkError, SupervisorError};
pub use crate::relay::{
    exit_code, ChildCommand, ChildSession, ChunkFilter, ExitOutcome, Filtered, MarkerFilter,
    ParentStreams, RunReport, StreamKind, Supervisor,
};
