mod load;
mod types;

pub use load::{resolve_log_dir, BaseDir, BaseDirSource};
pub use types::{
    CaptureConfig, ExitPolicy, FilterConfig, LogFileNames, LoggingConfig, RelayConfig,
};
