//! Per-camera IPA context

use crate::error::HostError;
use camera_types::{BufferHandle, CameraId, ContextId};
use ipa_locator::ExecutionMode;
use ipa_proxy::{ClientStub, EventSink, ProxyError, WirePayload};
use ipa_supervisor::IsolatedWorker;
use ipa_transport::MessageChannel;
use std::time::Duration;

/// How long closure diagnosis waits for a dead worker to be reaped
const CRASH_REAP_WAIT: Duration = Duration::from_millis(200);

/// One camera's binding of module instance, client stub, transport, and
/// (when isolated) supervised worker
///
/// Exclusively owned by the controller side; never shared across
/// cameras. Calls are serialized per context — the stub holds at most
/// one synchronous call in flight.
pub struct IpaContext {
    id: ContextId,
    camera: CameraId,
    module_name: String,
    mode: ExecutionMode,
    client: ClientStub<Box<dyn MessageChannel>>,
    worker: Option<IsolatedWorker>,
}

impl IpaContext {
    pub(crate) fn new(
        camera: CameraId,
        module_name: String,
        mode: ExecutionMode,
        client: ClientStub<Box<dyn MessageChannel>>,
        worker: Option<IsolatedWorker>,
    ) -> Self {
        Self {
            id: ContextId::new(),
            camera,
            module_name,
            mode,
            client,
            worker,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn camera(&self) -> CameraId {
        self.camera
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Invokes a synchronous operation, blocking for its result
    pub fn call(&mut self, opcode: u32, payload: WirePayload) -> Result<WirePayload, HostError> {
        self.call_with_buffers(opcode, payload, Vec::new())
    }

    pub fn call_with_buffers(
        &mut self,
        opcode: u32,
        payload: WirePayload,
        buffers: Vec<BufferHandle>,
    ) -> Result<WirePayload, HostError> {
        match self.client.call_with_buffers(opcode, payload, buffers) {
            Err(ProxyError::ChannelClosed) => Err(self.diagnose_closure()),
            other => Ok(other?),
        }
    }

    /// Invokes an asynchronous operation without waiting
    pub fn cast(&mut self, opcode: u32, payload: WirePayload) -> Result<(), HostError> {
        self.cast_with_buffers(opcode, payload, Vec::new())
    }

    pub fn cast_with_buffers(
        &mut self,
        opcode: u32,
        payload: WirePayload,
        buffers: Vec<BufferHandle>,
    ) -> Result<(), HostError> {
        match self.client.cast_with_buffers(opcode, payload, buffers) {
            Err(ProxyError::ChannelClosed) => Err(self.diagnose_closure()),
            other => Ok(other?),
        }
    }

    /// Dispatches pending module events to `sink`, in arrival order
    pub fn poll_events(&mut self, sink: &mut dyn EventSink) -> usize {
        self.client.poll_events(sink)
    }

    /// Fails if an isolated worker has crashed
    pub fn check(&mut self) -> Result<(), HostError> {
        if let Some(worker) = &mut self.worker {
            worker.check()?;
        }
        Ok(())
    }

    /// Tears the context down: graceful shutdown request with a bounded
    /// wait, then force-termination of an unresponsive worker
    pub fn close(&mut self, timeout: Duration) -> Result<(), HostError> {
        log::info!(
            "closing context {} for camera {} (module '{}')",
            self.id,
            self.camera,
            self.module_name
        );
        self.client.shutdown()?;
        if let Some(worker) = &mut self.worker {
            worker.shutdown(timeout);
        }
        Ok(())
    }

    /// Distinguishes a crashed module from an ordinarily severed channel
    fn diagnose_closure(&mut self) -> HostError {
        if let Some(worker) = &mut self.worker {
            // The channel closing usually means the worker is already
            // down; give the reap a moment to observe it.
            worker.shutdown(CRASH_REAP_WAIT);
            if let Err(err) = worker.check() {
                return err.into();
            }
        }
        ProxyError::ChannelClosed.into()
    }
}
