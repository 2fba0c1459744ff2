use crate::config::ExitPolicy;
use crate::error::SupervisorError;

use super::types::{ExitOutcome, RunReport};

/// Maps a session result to the supervisor's own exit code.
///
/// Startup failures are always 1. A failed child is 1 under
/// [`ExitPolicy::Fatal`]; under [`ExitPolicy::Propagate`] it is the child's
/// code, or 128 + N when it was killed by signal N.
pub fn exit_code(result: &Result<RunReport, SupervisorError>, policy: ExitPolicy) -> i32 {
    match result {
        Ok(_) => 0,
        Err(SupervisorError::ChildFailed { outcome }) => match policy {
            ExitPolicy::Fatal => 1,
            ExitPolicy::Propagate => match outcome {
                ExitOutcome::Exited { code } if *code != 0 => *code,
                ExitOutcome::Signaled { signal } => 128 + signal,
                _ => 1,
            },
        },
        Err(_) => 1,
    }
}
