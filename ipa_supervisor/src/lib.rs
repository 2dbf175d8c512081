//! # IPA Isolation Supervisor
//!
//! Runs a module's server stub in its own supervised execution context,
//! connected to the controller only through a message channel. A module
//! fault tears down that one context; the controller keeps running and
//! decides recovery policy itself — the supervisor never restarts a
//! module on its own.

pub mod error;
pub mod status;
pub mod worker;

pub use error::SupervisorError;
pub use status::WorkerStatus;
pub use worker::IsolatedWorker;
