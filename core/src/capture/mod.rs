mod files;
mod log;

pub use files::RelayLogs;
pub use log::{CaptureLog, CaptureLogWriter};
