//! Observed lifecycle of a supervised worker

use ipa_proxy::ServeExit;

/// What the supervisor currently knows about a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    /// The serve loop is (as far as observed) still running
    Running,
    /// The serve loop returned normally
    Exited(ServeExit),
    /// The worker died without returning; its channel is severed
    Crashed,
    /// Force-terminated: the worker outlived its shutdown bound and was
    /// abandoned with a severed channel
    Abandoned,
}

impl WorkerStatus {
    /// Checks whether the worker definitely will not process more calls
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerStatus::Running)
    }

    pub fn is_crashed(&self) -> bool {
        matches!(self, WorkerStatus::Crashed)
    }
}
