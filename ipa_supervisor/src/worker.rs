//! The supervised worker: one serve loop per isolated module instance
//!
//! Execution contexts are backed by threads behind a spawn seam, so the
//! supervision semantics (liveness, crash detection, bounded teardown)
//! stay independent of the isolation mechanism.

use crate::error::SupervisorError;
use crate::status::WorkerStatus;
use ipa_proxy::{IpaModule, ServeExit, ServerStub};
use ipa_schema::ProtocolSchema;
use ipa_transport::{channel_pair, ChannelHalf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// A supervised execution context running one module's server stub
///
/// Created before any operation is issued; the returned channel half is
/// the controller's endpoint and becomes the client stub's transport.
/// Worker death severs the channel, so pending and future calls fail
/// with a closed-channel condition while the supervisor reports the
/// crash.
pub struct IsolatedWorker {
    module_name: String,
    handle: Option<JoinHandle<ServeExit>>,
    status: WorkerStatus,
}

impl IsolatedWorker {
    /// Spawns the worker and connects the transport
    ///
    /// Returns the supervisor handle and the controller-side channel
    /// endpoint.
    pub fn spawn(
        module_name: impl Into<String>,
        schema: ProtocolSchema,
        module: Box<dyn IpaModule>,
    ) -> Result<(Self, ChannelHalf), SupervisorError> {
        let module_name = module_name.into();
        let (controller, mut worker_channel) = channel_pair();

        let thread_name = format!("ipa-{}", module_name);
        let handle = thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                let mut server = ServerStub::new(schema, module);
                server.serve(&mut worker_channel)
            })
            .map_err(|err| SupervisorError::SpawnFailed {
                module: module_name.clone(),
                reason: err.to_string(),
            })?;

        log::info!("spawned isolated worker for module '{}'", module_name);
        Ok((
            Self {
                module_name,
                handle: Some(handle),
                status: WorkerStatus::Running,
            },
            controller,
        ))
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Returns the worker status, reaping the thread if it has ended
    pub fn status(&mut self) -> WorkerStatus {
        if self.status == WorkerStatus::Running {
            if let Some(handle) = &self.handle {
                if handle.is_finished() {
                    self.reap();
                }
            }
        }
        self.status
    }

    /// Fails with `ModuleCrashed` if the worker died unexpectedly
    pub fn check(&mut self) -> Result<(), SupervisorError> {
        if self.status().is_crashed() {
            return Err(SupervisorError::ModuleCrashed {
                module: self.module_name.clone(),
            });
        }
        Ok(())
    }

    /// Waits up to `timeout` for the worker to end, then force-terminates
    ///
    /// Call after the graceful shutdown request has been sent (or the
    /// channel severed). An unresponsive worker is abandoned: its channel
    /// endpoint is already unreachable, so it can do no further harm.
    pub fn shutdown(&mut self, timeout: Duration) -> WorkerStatus {
        let deadline = Instant::now() + timeout;
        loop {
            let status = self.status();
            if status.is_terminal() {
                return status;
            }
            if Instant::now() >= deadline {
                log::warn!(
                    "module '{}' ignored shutdown for {:?}, abandoning worker",
                    self.module_name,
                    timeout
                );
                self.handle = None;
                self.status = WorkerStatus::Abandoned;
                return self.status;
            }
            thread::sleep(SHUTDOWN_POLL_INTERVAL);
        }
    }

    fn reap(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.status = match handle.join() {
            Ok(exit) => WorkerStatus::Exited(exit),
            Err(_) => {
                log::error!("module '{}' crashed", self.module_name);
                WorkerStatus::Crashed
            }
        };
    }
}
