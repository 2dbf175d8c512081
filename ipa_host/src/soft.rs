//! Contract for the software ISP pipeline type
//!
//! The shape generated code takes for every pipeline: opcode constants
//! and the schema on one side, a typed module trait, dispatcher, client,
//! and event router on the other. Module authors implement [`SoftIpa`];
//! everything else here is mechanical translation to and from the wire.

use crate::context::IpaContext;
use crate::error::HostError;
use camera_types::{BufferHandle, ControlList, FrameMetadata, ProtocolVersion, StreamConfig};
use ipa_proxy::{
    EventSender, EventSink, IpaModule, ModuleCall, WirePayload,
};
use ipa_schema::{
    CallingMode, EventDescriptor, OperationDescriptor, ParamSpec, ProtocolSchema, WireType,
    EVENT_OPCODE_BASE,
};

pub const PIPELINE: &str = "soft";
pub const VERSION: ProtocolVersion = ProtocolVersion::new(3, 0);

pub const OP_INIT: u32 = 1;
pub const OP_CONFIGURE: u32 = 2;
pub const OP_START: u32 = 3;
pub const OP_STOP: u32 = 4;
pub const OP_QUEUE_REQUEST: u32 = 5;
pub const OP_PROCESS_STATS: u32 = 6;

pub const EV_SET_SENSOR_CONTROLS: u32 = EVENT_OPCODE_BASE | 1;
pub const EV_METADATA_READY: u32 = EVENT_OPCODE_BASE | 2;

const OPERATIONS: &[OperationDescriptor] = &[
    OperationDescriptor {
        name: "init",
        opcode: OP_INIT,
        mode: CallingMode::Synchronous,
        params: &[ParamSpec::new("sensor", WireType::String)],
        returns: Some(WireType::ControlList),
    },
    OperationDescriptor {
        name: "configure",
        opcode: OP_CONFIGURE,
        mode: CallingMode::Synchronous,
        params: &[ParamSpec::new("config", WireType::StreamConfig)],
        returns: None,
    },
    OperationDescriptor {
        name: "start",
        opcode: OP_START,
        mode: CallingMode::Synchronous,
        params: &[],
        returns: None,
    },
    OperationDescriptor {
        name: "stop",
        opcode: OP_STOP,
        mode: CallingMode::Synchronous,
        params: &[],
        returns: None,
    },
    OperationDescriptor {
        name: "queue_request",
        opcode: OP_QUEUE_REQUEST,
        mode: CallingMode::Asynchronous,
        params: &[
            ParamSpec::new("frame", WireType::Uint32),
            ParamSpec::new("controls", WireType::ControlList),
        ],
        returns: None,
    },
    OperationDescriptor {
        name: "process_stats",
        opcode: OP_PROCESS_STATS,
        mode: CallingMode::Asynchronous,
        params: &[ParamSpec::new("frame", WireType::FrameMetadata)],
        returns: None,
    },
];

const EVENTS: &[EventDescriptor] = &[
    EventDescriptor {
        name: "set_sensor_controls",
        opcode: EV_SET_SENSOR_CONTROLS,
        payload: &[ParamSpec::new("controls", WireType::ControlList)],
    },
    EventDescriptor {
        name: "metadata_ready",
        opcode: EV_METADATA_READY,
        payload: &[
            ParamSpec::new("frame", WireType::Uint32),
            ParamSpec::new("controls", WireType::ControlList),
        ],
    },
];

pub const fn schema() -> ProtocolSchema {
    ProtocolSchema {
        pipeline: PIPELINE,
        version: VERSION,
        operations: OPERATIONS,
        events: EVENTS,
    }
}

/// Typed event surface available to a soft IPA implementation
#[derive(Clone)]
pub struct SoftEvents {
    sender: EventSender,
}

impl SoftEvents {
    /// Asks the pipeline handler to apply sensor controls
    pub fn set_sensor_controls(&self, controls: &ControlList) {
        if let Ok(payload) = WirePayload::new(controls) {
            self.sender.raise(EV_SET_SENSOR_CONTROLS, payload);
        }
    }

    /// Reports completed frame metadata
    pub fn metadata_ready(&self, frame: u32, controls: &ControlList) {
        if let Ok(payload) = WirePayload::new(&(frame, controls)) {
            self.sender.raise(EV_METADATA_READY, payload);
        }
    }
}

/// The interface a soft IPA module implements
pub trait SoftIpa: Send {
    /// Receives the typed event surface before any call is dispatched
    fn bind_events(&mut self, _events: SoftEvents) {}

    fn init(&mut self, sensor: String) -> Result<ControlList, String>;

    fn configure(&mut self, config: StreamConfig) -> Result<(), String>;

    fn start(&mut self) -> Result<(), String>;

    fn stop(&mut self) -> Result<(), String>;

    fn queue_request(&mut self, frame: u32, controls: ControlList);

    fn process_stats(&mut self, frame: FrameMetadata, buffers: Vec<BufferHandle>);
}

/// Adapts a [`SoftIpa`] implementation to the untyped module interface
pub struct SoftDispatcher<T: SoftIpa> {
    inner: T,
}

impl<T: SoftIpa> SoftDispatcher<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Boxes the dispatcher for a module factory
    pub fn boxed(inner: T) -> Box<dyn IpaModule>
    where
        T: 'static,
    {
        Box::new(Self::new(inner))
    }
}

impl<T: SoftIpa> IpaModule for SoftDispatcher<T> {
    fn bind_events(&mut self, events: EventSender) {
        self.inner.bind_events(SoftEvents { sender: events });
    }

    fn invoke(&mut self, call: ModuleCall) -> Result<WirePayload, String> {
        match call.opcode {
            OP_INIT => {
                let sensor: String = call.payload.deserialize().map_err(|e| e.to_string())?;
                let controls = self.inner.init(sensor)?;
                WirePayload::new(&controls).map_err(|e| e.to_string())
            }
            OP_CONFIGURE => {
                let config: StreamConfig =
                    call.payload.deserialize().map_err(|e| e.to_string())?;
                self.inner.configure(config)?;
                Ok(WirePayload::empty())
            }
            OP_START => {
                self.inner.start()?;
                Ok(WirePayload::empty())
            }
            OP_STOP => {
                self.inner.stop()?;
                Ok(WirePayload::empty())
            }
            other => Err(format!("opcode {other:#x} is not synchronous")),
        }
    }

    fn notify(&mut self, call: ModuleCall) {
        match call.opcode {
            OP_QUEUE_REQUEST => {
                match call.payload.deserialize::<(u32, ControlList)>() {
                    Ok((frame, controls)) => self.inner.queue_request(frame, controls),
                    Err(err) => log::warn!("dropping queue_request: {}", err),
                }
            }
            OP_PROCESS_STATS => match call.payload.deserialize::<FrameMetadata>() {
                Ok(frame) => self.inner.process_stats(frame, call.buffers),
                Err(err) => log::warn!("dropping process_stats: {}", err),
            },
            other => log::warn!("opcode {:#x} is not asynchronous", other),
        }
    }
}

/// Receiver for decoded soft pipeline events
pub trait SoftEventHandler {
    fn set_sensor_controls(&mut self, controls: ControlList);

    fn metadata_ready(&mut self, frame: u32, controls: ControlList);
}

/// Decodes raw events and forwards them to a [`SoftEventHandler`]
pub struct SoftEventRouter<'a, H: SoftEventHandler> {
    handler: &'a mut H,
}

impl<'a, H: SoftEventHandler> SoftEventRouter<'a, H> {
    pub fn new(handler: &'a mut H) -> Self {
        Self { handler }
    }
}

impl<H: SoftEventHandler> EventSink for SoftEventRouter<'_, H> {
    fn on_event(&mut self, opcode: u32, payload: WirePayload, _buffers: Vec<BufferHandle>) {
        match opcode {
            EV_SET_SENSOR_CONTROLS => match payload.deserialize::<ControlList>() {
                Ok(controls) => self.handler.set_sensor_controls(controls),
                Err(err) => log::warn!("dropping set_sensor_controls: {}", err),
            },
            EV_METADATA_READY => match payload.deserialize::<(u32, ControlList)>() {
                Ok((frame, controls)) => self.handler.metadata_ready(frame, controls),
                Err(err) => log::warn!("dropping metadata_ready: {}", err),
            },
            other => log::warn!("unknown event opcode {:#x}", other),
        }
    }
}

/// Typed client over a soft pipeline context
///
/// Wraps the context a pipeline handler holds for its camera; every
/// method is one declared operation.
pub struct SoftIpaClient {
    context: IpaContext,
}

impl SoftIpaClient {
    pub fn new(context: IpaContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &IpaContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut IpaContext {
        &mut self.context
    }

    pub fn init(&mut self, sensor: &str) -> Result<ControlList, HostError> {
        let reply = self
            .context
            .call(OP_INIT, WirePayload::new(&sensor).map_err(ipa_proxy::ProxyError::from)?)?;
        Ok(reply.deserialize().map_err(ipa_proxy::ProxyError::from)?)
    }

    pub fn configure(&mut self, config: &StreamConfig) -> Result<(), HostError> {
        self.context.call(
            OP_CONFIGURE,
            WirePayload::new(config).map_err(ipa_proxy::ProxyError::from)?,
        )?;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), HostError> {
        self.context.call(OP_START, WirePayload::empty())?;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), HostError> {
        self.context.call(OP_STOP, WirePayload::empty())?;
        Ok(())
    }

    pub fn queue_request(&mut self, frame: u32, controls: &ControlList) -> Result<(), HostError> {
        self.context.cast(
            OP_QUEUE_REQUEST,
            WirePayload::new(&(frame, controls)).map_err(ipa_proxy::ProxyError::from)?,
        )
    }

    pub fn process_stats(
        &mut self,
        frame: &FrameMetadata,
        buffers: Vec<BufferHandle>,
    ) -> Result<(), HostError> {
        self.context.cast_with_buffers(
            OP_PROCESS_STATS,
            WirePayload::new(frame).map_err(ipa_proxy::ProxyError::from)?,
            buffers,
        )
    }

    /// Routes pending events to `handler`, returning how many fired
    pub fn poll_events<H: SoftEventHandler>(&mut self, handler: &mut H) -> usize {
        let mut router = SoftEventRouter::new(handler);
        self.context.poll_events(&mut router)
    }

    /// Graceful teardown of the underlying context
    pub fn close(&mut self, timeout: std::time::Duration) -> Result<(), HostError> {
        self.context.close(timeout)
    }
}
