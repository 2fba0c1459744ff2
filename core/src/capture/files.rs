use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::config::{BaseDir, LogFileNames};
use crate::error::CaptureError;
use crate::relay::BoxedSink;

/// Opens `path` write-only, creating it or truncating what was there.
pub(crate) fn create_truncated(path: &Path) -> Result<File, CaptureError> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o644);
    }
    opts.open(path).map_err(|source| CaptureError::LogOpen {
        path: path.to_path_buf(),
        source,
    })
}

fn open_sink(path: &Path) -> Result<BoxedSink, CaptureError> {
    let file = create_truncated(path)?;
    Ok(Box::new(tokio::fs::File::from_std(file)))
}

/// The three byte-exact stream logs, one per relay.
pub struct RelayLogs {
    pub client_input: BoxedSink,
    pub server_output: BoxedSink,
    pub server_err: BoxedSink,
}

impl RelayLogs {
    pub fn open(dir: &BaseDir, names: &LogFileNames) -> Result<Self, CaptureError> {
        Ok(Self {
            client_input: open_sink(&dir.join(&names.client_input))?,
            server_output: open_sink(&dir.join(&names.server_output))?,
            server_err: open_sink(&dir.join(&names.server_err))?,
        })
    }
}
