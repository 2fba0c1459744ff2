use async_trait::async_trait;

use super::types::{BoxedSink, BoxedSource, ExitOutcome};

/// A started child whose three standard streams can be taken exactly once.
#[async_trait]
pub trait ChildSession: Send {
    fn id(&self) -> Option<u32>;
    fn stdin(&mut self) -> Option<BoxedSink>;
    fn stdout(&mut self) -> Option<BoxedSource>;
    fn stderr(&mut self) -> Option<BoxedSource>;
    async fn wait(&mut self) -> std::io::Result<ExitOutcome>;
}
