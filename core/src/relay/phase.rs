use serde::Serialize;

use crate::error::SupervisorError;

/// Supervisor lifecycle. Phases are strictly sequential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    LogsOpened,
    PipesCreated,
    RelaysRunning,
    ChildStarted,
    ChildExited,
}

impl Phase {
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Init => Some(Phase::LogsOpened),
            Phase::LogsOpened => Some(Phase::PipesCreated),
            Phase::PipesCreated => Some(Phase::RelaysRunning),
            Phase::RelaysRunning => Some(Phase::ChildStarted),
            Phase::ChildStarted => Some(Phase::ChildExited),
            Phase::ChildExited => None,
        }
    }
}

/// Records supervisor phase transitions in the capture log.
///
/// The supervisor advances it in straight-line order, so a rejected
/// transition only shows up if that order is changed.
#[derive(Debug)]
pub struct PhaseTracker {
    current: Phase,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self {
            current: Phase::Init,
        }
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Phase {
        self.current
    }

    pub fn advance(&mut self, to: Phase) -> Result<(), SupervisorError> {
        if self.current.next() != Some(to) {
            return Err(SupervisorError::Phase {
                from: self.current,
                to,
            });
        }
        tracing::debug!(from = ?self.current, to = ?to, "supervisor phase");
        self.current = to;
        Ok(())
    }
}
