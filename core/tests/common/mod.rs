#![allow(dead_code)]

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use lspcap_core::api::{
    BaseDir, BaseDirSource, CaptureLog, FilterConfig, LogFileNames, MarkerFilter, ParentStreams,
    RelayConfig, RelayLogs, Supervisor,
};
use tokio::io::AsyncWrite;

/// In-memory stand-in for the parent's stdout/stderr.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl AsyncWrite for SharedBuf {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// A temp log directory plus captured parent streams for one session.
pub struct Harness {
    pub dir: tempfile::TempDir,
    pub names: LogFileNames,
    pub capture: CaptureLog,
    pub stdout: SharedBuf,
    pub stderr: SharedBuf,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let names = LogFileNames::default();
        let capture = CaptureLog::create(dir.path().join(&names.capture)).unwrap();
        Self {
            dir,
            names,
            capture,
            stdout: SharedBuf::default(),
            stderr: SharedBuf::default(),
        }
    }

    pub fn supervisor(&self) -> Supervisor {
        self.supervisor_with_grace(5000)
    }

    pub fn supervisor_with_grace(&self, drain_grace_ms: u64) -> Supervisor {
        let relay = RelayConfig {
            drain_grace_ms,
            ..RelayConfig::default()
        };
        Supervisor::new(
            relay,
            Arc::new(MarkerFilter::new(FilterConfig::default().marker)),
            self.capture.dispatch("debug").unwrap(),
        )
    }

    pub fn parent(&self, stdin: &[u8]) -> ParentStreams {
        ParentStreams {
            stdin: Box::new(io::Cursor::new(stdin.to_vec())),
            stdout: Box::new(self.stdout.clone()),
            stderr: Box::new(self.stderr.clone()),
        }
    }

    pub fn logs(&self) -> RelayLogs {
        let base = BaseDir {
            path: self.dir.path().to_path_buf(),
            source: BaseDirSource::Explicit,
            fallback_reason: None,
        };
        RelayLogs::open(&base, &self.names).unwrap()
    }

    pub fn client_input_log(&self) -> Vec<u8> {
        std::fs::read(self.dir.path().join(&self.names.client_input)).unwrap()
    }

    pub fn server_output_log(&self) -> Vec<u8> {
        std::fs::read(self.dir.path().join(&self.names.server_output)).unwrap()
    }

    pub fn server_err_log(&self) -> Vec<u8> {
        std::fs::read(self.dir.path().join(&self.names.server_err)).unwrap()
    }

    pub fn capture_text(&self) -> String {
        std::fs::read_to_string(self.capture.path()).unwrap()
    }
}

pub fn sh(script: &str) -> lspcap_core::api::ChildCommand {
    lspcap_core::api::ChildCommand::new("sh", vec!["-c".to_string(), script.to_string()])
}
