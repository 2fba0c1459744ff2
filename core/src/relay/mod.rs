mod exit;
mod filter;
mod io_pump;
mod phase;
mod process;
mod supervisor;
mod tee;
mod traits;
pub mod types;

pub use exit::exit_code;
pub use filter::{ChunkFilter, FilterReader, Filtered, MarkerFilter};
pub use io_pump::{relay, spawn_relay, RelayTask, ABANDONED};
pub use phase::{Phase, PhaseTracker};
pub use process::ProcessSession;
pub use supervisor::{ParentStreams, Supervisor};
pub use tee::TeeSink;
pub use traits::ChildSession;
pub use types::{
    BoxedSink, BoxedSource, ChildCommand, ExitOutcome, RelayProgress, RelayReport, RelayStats,
    RunReport, StreamKind,
};
