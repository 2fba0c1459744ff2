use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct CaptureConfig {
    /// Where the four logs go. `None` means next to the executable.
    pub log_dir: Option<PathBuf>,

    pub files: LogFileNames,

    pub filter: FilterConfig,

    pub relay: RelayConfig,

    pub logging: LoggingConfig,

    pub exit_policy: ExitPolicy,
}

#[derive(Debug, Clone)]
pub struct LogFileNames {
    /// Timestamped supervisor diagnostics.
    pub capture: String,
    /// Bytes sent from the client (parent stdin) to the server.
    pub client_input: String,
    /// Server stdout, after filtering.
    pub server_output: String,
    pub server_err: String,
}

impl Default for LogFileNames {
    fn default() -> Self {
        Self {
            capture: "lsp_capture.log".to_string(),
            client_input: "client_input.log".to_string(),
            server_output: "server_output.log".to_string(),
            server_err: "server_err.log".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Any stdout chunk containing this is dropped before it reaches the
    /// client. JVM debug agents print it on stdout and break LSP framing.
    pub marker: String,
}

fn default_marker() -> String {
    "Listening for transport".to_string()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub buffer_size: usize,

    /// How long to wait for stdout/stderr to drain after the child exits.
    pub drain_grace_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            buffer_size: 16 * 1024,
            drain_grace_ms: 2000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// EnvFilter string, e.g. "info" or "lspcap_core=debug".
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// What a non-clean child exit turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitPolicy {
    /// Log and exit with status 1 whatever the child's code was.
    #[default]
    Fatal,
    /// Exit with the child's own code (128 + N for signal N).
    Propagate,
}
