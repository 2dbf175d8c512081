//! Supervisor failure conditions

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupervisorError {
    /// The isolated worker died without completing its serve loop.
    /// Fatal for the owning camera; pending calls have already failed
    /// with a closed channel.
    #[error("Module '{module}' crashed")]
    ModuleCrashed { module: String },

    /// The host refused to create the worker's execution context.
    #[error("Failed to spawn worker for module '{module}': {reason}")]
    SpawnFailed { module: String, reason: String },
}
