use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use crate::error::SupervisorError;

use super::traits::ChildSession;
use super::types::{BoxedSink, BoxedSource, ChildCommand, ExitOutcome};

/// A real child process with piped stdin/stdout/stderr.
///
/// The environment and working directory are inherited. The child is killed
/// if the session is dropped before it has been waited on.
pub struct ProcessSession {
    child: Child,
}

impl ProcessSession {
    pub fn spawn(cmd: &ChildCommand) -> Result<Self, SupervisorError> {
        let child = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SupervisorError::Start {
                program: cmd.program.clone(),
                source,
            })?;
        Ok(Self { child })
    }
}

#[async_trait]
impl ChildSession for ProcessSession {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn stdin(&mut self) -> Option<BoxedSink> {
        self.child.stdin.take().map(|s| Box::new(s) as BoxedSink)
    }

    fn stdout(&mut self) -> Option<BoxedSource> {
        self.child.stdout.take().map(|s| Box::new(s) as BoxedSource)
    }

    fn stderr(&mut self) -> Option<BoxedSource> {
        self.child.stderr.take().map(|s| Box::new(s) as BoxedSource)
    }

    async fn wait(&mut self) -> std::io::Result<ExitOutcome> {
        let status = self.child.wait().await?;
        Ok(ExitOutcome::from(status))
    }
}
