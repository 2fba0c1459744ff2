#![cfg(unix)]

mod common;

use async_trait::async_trait;
use common::{sh, Harness};
use lspcap_core::api::{
    exit_code, ChildCommand, ChildSession, ExitOutcome, ExitPolicy, StreamKind, SupervisorError,
};
use lspcap_core::api::ParentStreams;
use lspcap_core::relay::{BoxedSink, BoxedSource, ABANDONED};
use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};

#[tokio::test]
async fn cat_echoes_stdin_and_logs_both_directions() {
    let h = Harness::new();
    let cmd = ChildCommand::new("cat", vec![]);

    let report = h
        .supervisor()
        .run(&cmd, h.parent(b"hello\n"), h.logs())
        .await
        .unwrap();

    assert_eq!(h.stdout.contents(), b"hello\n".to_vec());
    assert_eq!(h.client_input_log(), b"hello\n".to_vec());
    assert_eq!(h.server_output_log(), b"hello\n".to_vec());
    assert!(h.server_err_log().is_empty());
    assert_eq!(report.exit, Some(ExitOutcome::Exited { code: 0 }));

    let out = report
        .relays
        .iter()
        .find(|r| r.stream == StreamKind::Output)
        .unwrap();
    assert_eq!(out.bytes, 6);
    assert!(out.error.is_none());
    assert_eq!(exit_code(&Ok(report), ExitPolicy::Fatal), 0);

    let log = h.capture_text();
    let finished: Vec<&str> = log.lines().filter(|l| l.contains("relay finished")).collect();
    assert!(!finished.is_empty(), "{log}");
    for line in finished {
        assert!(line.contains("session_id="), "{line}");
    }
}

#[tokio::test]
async fn broken_stdout_does_not_stop_the_session() {
    let h = Harness::new();
    let broken = tokio_test::io::Builder::new()
        .write_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        .build();
    let parent = ParentStreams {
        stdout: Box::new(broken),
        ..h.parent(b"")
    };

    let res = h
        .supervisor()
        .run(&sh("echo out; sleep 0.2; echo err >&2"), parent, h.logs())
        .await;

    let report = res.as_ref().unwrap();
    let out = report
        .relays
        .iter()
        .find(|r| r.stream == StreamKind::Output)
        .unwrap();
    let error = out.error.as_deref().unwrap();
    assert!(error.contains("stdout"), "{error}");
    let err_relay = report
        .relays
        .iter()
        .find(|r| r.stream == StreamKind::Error)
        .unwrap();
    assert!(err_relay.error.is_none());

    assert_eq!(h.stderr.contents(), b"err\n".to_vec());
    assert_eq!(h.server_err_log(), b"err\n".to_vec());
    assert_eq!(exit_code(&res, ExitPolicy::Fatal), 0);
    assert!(h.capture_text().contains("relay stopped"));
}

#[tokio::test]
async fn straggling_relays_are_abandoned_but_reported() {
    let h = Harness::new();
    // The background sleep keeps the pipes open after the shell exits.
    let cmd = sh("echo hi; sleep 3 & exit 0");
    let started = Instant::now();

    let report = h
        .supervisor_with_grace(200)
        .run(&cmd, h.parent(b""), h.logs())
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
    assert_eq!(h.stdout.contents(), b"hi\n".to_vec());
    assert_eq!(report.relays.len(), 2);
    let out = report
        .relays
        .iter()
        .find(|r| r.stream == StreamKind::Output)
        .unwrap();
    assert_eq!(out.bytes, 3);
    assert_eq!(out.error.as_deref(), Some(ABANDONED));

    let log = h.capture_text();
    assert!(log.contains("abandoning it"), "{log}");
    assert!(log.contains(ABANDONED), "{log}");
}

#[tokio::test]
async fn marker_line_is_dropped_before_the_tee() {
    let h = Harness::new();
    let cmd = sh("printf 'Listening for transport dt_socket at address: 5005\\n'");

    let report = h
        .supervisor()
        .run(&cmd, h.parent(b""), h.logs())
        .await
        .unwrap();

    assert!(h.stdout.contents().is_empty());
    assert!(h.server_output_log().is_empty());
    let out = report
        .relays
        .iter()
        .find(|r| r.stream == StreamKind::Output)
        .unwrap();
    assert_eq!(out.suppressed_chunks, 1);
    assert_eq!(out.bytes, 0);
}

#[tokio::test]
async fn output_after_a_suppressed_chunk_still_arrives() {
    let h = Harness::new();
    let cmd = sh("echo 'Listening for transport dt_socket at address: 5005'; sleep 0.3; echo ready");

    h.supervisor()
        .run(&cmd, h.parent(b""), h.logs())
        .await
        .unwrap();

    assert_eq!(h.stdout.contents(), b"ready\n".to_vec());
    assert_eq!(h.server_output_log(), b"ready\n".to_vec());
}

#[tokio::test]
async fn stderr_is_relayed_verbatim() {
    let h = Harness::new();
    let cmd = sh("echo 'Listening for transport on stderr' >&2");

    h.supervisor()
        .run(&cmd, h.parent(b""), h.logs())
        .await
        .unwrap();

    let expected = b"Listening for transport on stderr\n".to_vec();
    assert_eq!(h.stderr.contents(), expected);
    assert_eq!(h.server_err_log(), expected);
    assert!(h.stdout.contents().is_empty());
}

#[tokio::test]
async fn non_zero_exit_is_reported_and_logged() {
    let h = Harness::new();

    let res = h
        .supervisor()
        .run(&sh("exit 2"), h.parent(b""), h.logs())
        .await;

    match &res {
        Err(SupervisorError::ChildFailed { outcome }) => {
            assert_eq!(*outcome, ExitOutcome::Exited { code: 2 })
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(exit_code(&res, ExitPolicy::Fatal), 1);
    assert_eq!(exit_code(&res, ExitPolicy::Propagate), 2);

    let log = h.capture_text();
    assert!(log.contains("command finished with error"), "{log}");
    assert!(log.contains("exit status: 2"), "{log}");
    assert!(log.contains("session summary"), "{log}");
}

#[tokio::test]
async fn missing_program_never_starts_relays() {
    let h = Harness::new();
    let cmd = ChildCommand::new("lspcap-no-such-program", vec![]);

    let res = h
        .supervisor()
        .run(&cmd, h.parent(b"hello\n"), h.logs())
        .await;

    assert!(matches!(res, Err(SupervisorError::Start { .. })));
    assert_eq!(exit_code(&res, ExitPolicy::Propagate), 1);
    assert!(h.stdout.contents().is_empty());
    assert!(h.client_input_log().is_empty());

    let log = h.capture_text();
    assert!(log.contains("start sub process fail"), "{log}");
    assert!(!log.contains("relay started"), "{log}");
    assert!(!log.contains("relay finished"), "{log}");
}

#[tokio::test]
async fn summary_names_the_program() {
    let h = Harness::new();

    h.supervisor()
        .run(&sh("echo hi"), h.parent(b""), h.logs())
        .await
        .unwrap();

    let log = h.capture_text();
    assert!(log.contains(r#""program":"sh""#), "{log}");
    assert!(log.contains(r#""kind":"exited""#), "{log}");
}

struct FakeSession {
    stdin: Option<BoxedSink>,
    stdout: Option<BoxedSource>,
    stderr: Option<BoxedSource>,
    wait_error: bool,
}

impl FakeSession {
    fn new() -> Self {
        Self {
            stdin: Some(Box::new(tokio::io::sink())),
            stdout: Some(Box::new(tokio::io::empty())),
            stderr: Some(Box::new(tokio::io::empty())),
            wait_error: false,
        }
    }
}

#[async_trait]
impl ChildSession for FakeSession {
    fn id(&self) -> Option<u32> {
        None
    }

    fn stdin(&mut self) -> Option<BoxedSink> {
        self.stdin.take()
    }

    fn stdout(&mut self) -> Option<BoxedSource> {
        self.stdout.take()
    }

    fn stderr(&mut self) -> Option<BoxedSource> {
        self.stderr.take()
    }

    async fn wait(&mut self) -> std::io::Result<ExitOutcome> {
        if self.wait_error {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "no child"));
        }
        Ok(ExitOutcome::Exited { code: 0 })
    }
}

#[tokio::test]
async fn wait_failure_is_a_wait_error() {
    let h = Harness::new();
    let session = FakeSession {
        wait_error: true,
        ..FakeSession::new()
    };

    let res = h
        .supervisor()
        .supervise(Box::new(session), &sh("true"), h.parent(b""), h.logs())
        .await;

    assert!(matches!(res, Err(SupervisorError::Wait(_))));
    assert_eq!(exit_code(&res, ExitPolicy::Propagate), 1);
    assert!(h.capture_text().contains("waiting for command failed"));
}

#[tokio::test]
async fn missing_pipe_fails_before_any_relay() {
    let h = Harness::new();
    let session = FakeSession {
        stdout: None,
        ..FakeSession::new()
    };

    let res = h
        .supervisor()
        .supervise(Box::new(session), &sh("true"), h.parent(b""), h.logs())
        .await;

    assert!(matches!(
        res,
        Err(SupervisorError::Pipe {
            stream: StreamKind::Output
        })
    ));
    let log = h.capture_text();
    assert!(log.contains("failed to create pipe"), "{log}");
    assert!(!log.contains("relay started"), "{log}");
}
