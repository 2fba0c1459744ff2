//! Supervisor：启动子进程，把三条标准流接到三个 relay 上，等待子进程退出并汇总。
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, Instrument};

use crate::capture::RelayLogs;
use crate::config::RelayConfig;
use crate::error::SupervisorError;

use super::filter::{ChunkFilter, FilterReader};
use super::io_pump::{spawn_relay, RelayTask};
use super::phase::{Phase, PhaseTracker};
use super::process::ProcessSession;
use super::tee::TeeSink;
use super::traits::ChildSession;
use super::types::{
    BoxedSink, BoxedSource, ChildCommand, ExitOutcome, RelayReport, RunReport, StreamKind,
};

/// The supervisor's own standard streams.
pub struct ParentStreams {
    pub stdin: BoxedSource,
    pub stdout: BoxedSink,
    pub stderr: BoxedSink,
}

impl ParentStreams {
    pub fn inherit() -> Self {
        Self {
            stdin: Box::new(tokio::io::stdin()),
            stdout: Box::new(tokio::io::stdout()),
            stderr: Box::new(tokio::io::stderr()),
        }
    }
}

pub struct Supervisor {
    relay: RelayConfig,
    filter: Arc<dyn ChunkFilter>,
    dispatch: Dispatch,
}

impl Supervisor {
    /// `dispatch` is the session's logging context; every record from the
    /// supervisor and its relays goes through it.
    pub fn new(relay: RelayConfig, filter: Arc<dyn ChunkFilter>, dispatch: Dispatch) -> Self {
        Self {
            relay,
            filter,
            dispatch,
        }
    }

    /// Starts `cmd` and supervises it until it exits.
    pub async fn run(
        &self,
        cmd: &ChildCommand,
        parent: ParentStreams,
        logs: RelayLogs,
    ) -> Result<RunReport, SupervisorError> {
        let session = tracing::dispatcher::with_default(&self.dispatch, || {
            tracing::info!(program = %cmd.program, args = ?cmd.args, "starting sub process");
            ProcessSession::spawn(cmd).inspect_err(|e| {
                tracing::error!(error = %e, "start sub process fail");
            })
        })?;
        self.supervise(Box::new(session), cmd, parent, logs).await
    }

    /// Relays an already started child's streams until it exits.
    pub async fn supervise(
        &self,
        session: Box<dyn ChildSession>,
        cmd: &ChildCommand,
        parent: ParentStreams,
        logs: RelayLogs,
    ) -> Result<RunReport, SupervisorError> {
        let session_id = uuid::Uuid::new_v4().to_string();
        // Spans bind to the dispatcher that is current when they are created.
        let span = tracing::dispatcher::with_default(&self.dispatch, || {
            tracing::info_span!("session", %session_id, program = %cmd.program)
        });
        self.supervise_inner(session_id, session, cmd, parent, logs)
            .instrument(span)
            .with_subscriber(self.dispatch.clone())
            .await
    }

    async fn supervise_inner(
        &self,
        session_id: String,
        mut session: Box<dyn ChildSession>,
        cmd: &ChildCommand,
        parent: ParentStreams,
        logs: RelayLogs,
    ) -> Result<RunReport, SupervisorError> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut phase = PhaseTracker::new();
        phase.advance(Phase::LogsOpened)?;

        let child_stdin = take_pipe(session.stdin(), StreamKind::Input)?;
        let child_stdout = take_pipe(session.stdout(), StreamKind::Output)?;
        let child_stderr = take_pipe(session.stderr(), StreamKind::Error)?;
        phase.advance(Phase::PipesCreated)?;

        let buf_size = self.relay.buffer_size;
        let input = spawn_relay(
            StreamKind::Input,
            parent.stdin,
            TeeSink::new()
                .with_sink("child stdin", child_stdin)
                .with_sink("client input log", logs.client_input),
            buf_size,
            None,
            &self.dispatch,
        );

        let filtered = FilterReader::new(child_stdout, self.filter.clone());
        let suppressed = filtered.suppressed_counter();
        let output = spawn_relay(
            StreamKind::Output,
            filtered,
            TeeSink::new()
                .with_sink("stdout", parent.stdout)
                .with_sink("server output log", logs.server_output),
            buf_size,
            Some(suppressed),
            &self.dispatch,
        );

        let error = spawn_relay(
            StreamKind::Error,
            child_stderr,
            TeeSink::new()
                .with_sink("stderr", parent.stderr)
                .with_sink("server err log", logs.server_err),
            buf_size,
            None,
            &self.dispatch,
        );
        phase.advance(Phase::RelaysRunning)?;

        tracing::info!(pid = ?session.id(), "child started");
        phase.advance(Phase::ChildStarted)?;

        let waited = session.wait().await;
        phase.advance(Phase::ChildExited)?;

        // Parent stdin may never close; the input relay is left to the
        // process exit.
        drop(input);
        let relays = self.drain(vec![output, error]).await;

        let report = RunReport {
            session_id,
            program: cmd.program.clone(),
            args: cmd.args.clone(),
            started_at,
            duration_ms: clock.elapsed().as_millis() as u64,
            exit: waited.as_ref().ok().copied(),
            relays,
        };
        match serde_json::to_string(&report) {
            Ok(summary) => tracing::info!(%summary, "session summary"),
            Err(e) => tracing::warn!(error = %e, "session summary not serializable"),
        }

        finish(waited).map(|()| report)
    }

    async fn drain(&self, relays: Vec<RelayTask>) -> Vec<RelayReport> {
        let grace_ms = self.relay.drain_grace_ms;
        tracing::debug!(grace_ms, "draining relays");
        let deadline = tokio::time::Instant::now() + Duration::from_millis(grace_ms);
        futures::future::join_all(relays.into_iter().map(|r| r.join_until(deadline))).await
    }
}

fn take_pipe<T>(handle: Option<T>, stream: StreamKind) -> Result<T, SupervisorError> {
    handle.ok_or_else(|| {
        tracing::error!(%stream, "failed to create pipe");
        SupervisorError::Pipe { stream }
    })
}

fn finish(waited: std::io::Result<ExitOutcome>) -> Result<(), SupervisorError> {
    match waited {
        Ok(outcome) if outcome.success() => {
            tracing::info!(%outcome, "command finished");
            Ok(())
        }
        Ok(outcome) => {
            tracing::error!(%outcome, "command finished with error");
            Err(SupervisorError::ChildFailed { outcome })
        }
        Err(e) => {
            tracing::error!(error = %e, "waiting for command failed");
            Err(SupervisorError::Wait(e))
        }
    }
}
