//! Client stub: typed calls out, correlated replies and events in

use crate::error::ProxyError;
use crate::reply::decode_reply;
use crate::state::CallState;
use camera_types::BufferHandle;
use ipa_schema::{CallingMode, OperationDescriptor, ProtocolSchema, SHUTDOWN_OPCODE};
use ipa_transport::{MessageChannel, TransportError};
use ipa_wire::{CorrelationId, WireMessage, WirePayload};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Receiver for events dispatched by [`ClientStub::poll_events`]
///
/// Implemented for any `FnMut(u32, WirePayload, Vec<BufferHandle>)`
/// closure; a typed event router implements it by decoding the payload
/// per the schema's event descriptors.
pub trait EventSink {
    fn on_event(&mut self, opcode: u32, payload: WirePayload, buffers: Vec<BufferHandle>);
}

impl<F> EventSink for F
where
    F: FnMut(u32, WirePayload, Vec<BufferHandle>),
{
    fn on_event(&mut self, opcode: u32, payload: WirePayload, buffers: Vec<BufferHandle>) {
        self(opcode, payload, buffers)
    }
}

/// The controller-side half of the proxy pair
///
/// Owns the channel endpoint for one context. Synchronous calls block
/// until the correlated reply arrives; events received in the meantime
/// are buffered for the next [`poll_events`](Self::poll_events).
pub struct ClientStub<C: MessageChannel> {
    schema: ProtocolSchema,
    channel: C,
    next_correlation: u32,
    state: CallState,
    pending_events: VecDeque<WireMessage>,
    call_timeout: Option<Duration>,
    closed: bool,
}

impl<C: MessageChannel> ClientStub<C> {
    pub fn new(schema: ProtocolSchema, channel: C) -> Self {
        Self {
            schema,
            channel,
            next_correlation: 1,
            state: CallState::Idle,
            pending_events: VecDeque::new(),
            call_timeout: None,
            closed: false,
        }
    }

    /// Bounds every synchronous reply wait; expiry breaks the context
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn call_state(&self) -> CallState {
        self.state
    }

    /// Invokes a synchronous operation and blocks for its result
    pub fn call(&mut self, opcode: u32, payload: WirePayload) -> Result<WirePayload, ProxyError> {
        self.call_with_buffers(opcode, payload, Vec::new())
    }

    /// Like [`call`](Self::call), with bulk buffer references attached
    pub fn call_with_buffers(
        &mut self,
        opcode: u32,
        payload: WirePayload,
        buffers: Vec<BufferHandle>,
    ) -> Result<WirePayload, ProxyError> {
        let op = self.lookup(opcode, CallingMode::Synchronous)?;
        log::trace!("call {} ({:#x})", op.name, opcode);
        let reply = self.roundtrip(opcode, payload, buffers)?;
        decode_reply(&reply.payload)?.map_err(ProxyError::ModuleFault)
    }

    /// Invokes an asynchronous operation; returns as soon as the message
    /// is queued
    pub fn cast(&mut self, opcode: u32, payload: WirePayload) -> Result<(), ProxyError> {
        self.cast_with_buffers(opcode, payload, Vec::new())
    }

    /// Like [`cast`](Self::cast), with bulk buffer references attached
    pub fn cast_with_buffers(
        &mut self,
        opcode: u32,
        payload: WirePayload,
        buffers: Vec<BufferHandle>,
    ) -> Result<(), ProxyError> {
        let op = self.lookup(opcode, CallingMode::Asynchronous)?;
        log::trace!("cast {} ({:#x})", op.name, opcode);
        let message =
            WireMessage::unsolicited(opcode, payload).with_buffers(buffers);
        self.send(message)
    }

    /// Dispatches buffered and newly arrived events to `sink`, in arrival
    /// order, without blocking
    ///
    /// Returns the number of events dispatched.
    pub fn poll_events(&mut self, sink: &mut dyn EventSink) -> usize {
        if !self.closed && !self.state.is_broken() {
            loop {
                match self.channel.receive_timeout(Duration::ZERO) {
                    Ok(message) => self.stash_inbound(message),
                    Err(TransportError::ReceiveTimeout) => break,
                    Err(TransportError::Wire(err)) => {
                        log::warn!("rejecting malformed message: {}", err);
                    }
                    Err(TransportError::ChannelClosed) => {
                        self.state = CallState::Broken;
                        break;
                    }
                }
            }
        }

        let mut count = 0;
        while let Some(event) = self.pending_events.pop_front() {
            sink.on_event(event.opcode, event.payload, event.buffers);
            count += 1;
        }
        count
    }

    /// Performs the graceful shutdown handshake and closes the channel
    ///
    /// On an already broken context the handshake is skipped. Events that
    /// arrived before the acknowledgement remain available through
    /// [`poll_events`](Self::poll_events).
    pub fn shutdown(&mut self) -> Result<(), ProxyError> {
        if self.closed {
            return Ok(());
        }
        if !self.state.is_broken() {
            let ack = self.roundtrip(SHUTDOWN_OPCODE, WirePayload::empty(), Vec::new());
            match ack {
                Ok(_) => {}
                // A peer that died mid-handshake is already gone.
                Err(ProxyError::ChannelClosed) | Err(ProxyError::CallTimeout) => {
                    log::warn!("shutdown handshake got no acknowledgement");
                }
                Err(err) => return Err(err),
            }
        }
        self.channel.close();
        self.closed = true;
        Ok(())
    }

    fn lookup(
        &self,
        opcode: u32,
        mode: CallingMode,
    ) -> Result<&'static OperationDescriptor, ProxyError> {
        let op = self
            .schema
            .operation(opcode)
            .ok_or(ProxyError::UnknownOperation(opcode))?;
        if op.mode != mode {
            return Err(ProxyError::WrongCallingMode {
                name: op.name,
                mode: match op.mode {
                    CallingMode::Synchronous => "synchronous",
                    CallingMode::Asynchronous => "asynchronous",
                },
            });
        }
        Ok(op)
    }

    fn send(&mut self, message: WireMessage) -> Result<(), ProxyError> {
        if !self.state.accepts_calls() {
            return Err(ProxyError::Broken);
        }
        match self.channel.send(message) {
            Ok(()) => Ok(()),
            Err(TransportError::ChannelClosed) => {
                self.state = CallState::Broken;
                Err(ProxyError::ChannelClosed)
            }
            // The transport rejected this one message; the channel and
            // the context stay usable.
            Err(err) => Err(err.into()),
        }
    }

    /// Sends a correlated request and blocks until its reply
    fn roundtrip(
        &mut self,
        opcode: u32,
        payload: WirePayload,
        buffers: Vec<BufferHandle>,
    ) -> Result<WireMessage, ProxyError> {
        let correlation = self.allocate_correlation();
        let request = WireMessage::call(opcode, correlation, payload).with_buffers(buffers);
        self.send(request)?;
        self.state = CallState::AwaitingReply;

        let deadline = self.call_timeout.map(|t| Instant::now() + t);
        loop {
            let received = match deadline {
                Some(deadline) => {
                    let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                        break;
                    };
                    self.channel.receive_timeout(remaining)
                }
                None => self.channel.receive(),
            };

            match received {
                Ok(message)
                    if message.opcode == opcode && message.correlation == correlation =>
                {
                    self.state = CallState::Idle;
                    return Ok(message);
                }
                Ok(message) => self.stash_inbound(message),
                Err(TransportError::ReceiveTimeout) => break,
                Err(TransportError::Wire(err)) => {
                    log::warn!("rejecting malformed message: {}", err);
                }
                Err(TransportError::ChannelClosed) => {
                    self.state = CallState::Broken;
                    return Err(ProxyError::ChannelClosed);
                }
            }
        }

        // Timeout: a peer that stopped replying is indistinguishable from
        // a dead one.
        self.state = CallState::Broken;
        Err(ProxyError::CallTimeout)
    }

    fn stash_inbound(&mut self, message: WireMessage) {
        if ProtocolSchema::is_event_opcode(message.opcode) {
            self.pending_events.push_back(message);
        } else {
            log::warn!(
                "dropping uncorrelated reply for opcode {:#x} {}",
                message.opcode,
                message.correlation
            );
        }
    }

    fn allocate_correlation(&mut self) -> CorrelationId {
        let id = CorrelationId::new(self.next_correlation);
        self.next_correlation = self.next_correlation.checked_add(1).unwrap_or(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{EventSender, IpaModule, ModuleCall};
    use crate::server::{ServeExit, ServerStub};
    use camera_types::ProtocolVersion;
    use ipa_schema::{
        EventDescriptor, OperationDescriptor, ParamSpec, WireType, EVENT_OPCODE_BASE,
    };
    use ipa_transport::{channel_pair, ChannelHalf};
    use std::thread::JoinHandle;

    const OP_DOUBLE: u32 = 1;
    const OP_RECORD: u32 = 2;
    const OP_FAIL: u32 = 3;
    const EV_RECORDED: u32 = EVENT_OPCODE_BASE | 1;

    const OPS: &[OperationDescriptor] = &[
        OperationDescriptor {
            name: "double",
            opcode: OP_DOUBLE,
            mode: CallingMode::Synchronous,
            params: &[ParamSpec::new("value", WireType::Uint32)],
            returns: Some(WireType::Uint32),
        },
        OperationDescriptor {
            name: "record",
            opcode: OP_RECORD,
            mode: CallingMode::Asynchronous,
            params: &[ParamSpec::new("value", WireType::Uint32)],
            returns: None,
        },
        OperationDescriptor {
            name: "fail",
            opcode: OP_FAIL,
            mode: CallingMode::Synchronous,
            params: &[],
            returns: None,
        },
    ];

    const EVENTS: &[EventDescriptor] = &[EventDescriptor {
        name: "recorded",
        opcode: EV_RECORDED,
        payload: &[ParamSpec::new("value", WireType::Uint32)],
    }];

    fn test_schema() -> ProtocolSchema {
        ProtocolSchema {
            pipeline: "test",
            version: ProtocolVersion::new(1, 0),
            operations: OPS,
            events: EVENTS,
        }
    }

    struct TestModule {
        events: Option<EventSender>,
    }

    impl IpaModule for TestModule {
        fn bind_events(&mut self, events: EventSender) {
            self.events = Some(events);
        }

        fn invoke(&mut self, call: ModuleCall) -> Result<WirePayload, String> {
            match call.opcode {
                OP_DOUBLE => {
                    let value: u32 = call.payload.deserialize().map_err(|e| e.to_string())?;
                    if let Some(events) = &self.events {
                        events.raise(EV_RECORDED, WirePayload::new(&value).unwrap());
                    }
                    WirePayload::new(&(value * 2)).map_err(|e| e.to_string())
                }
                OP_FAIL => Err("deliberate fault".to_string()),
                _ => Err("unexpected opcode".to_string()),
            }
        }

        fn notify(&mut self, call: ModuleCall) {
            if let (Some(events), Ok(value)) = (&self.events, call.payload.deserialize::<u32>()) {
                events.raise(EV_RECORDED, WirePayload::new(&value).unwrap());
            }
        }
    }

    fn spawn_server() -> (ClientStub<ChannelHalf>, JoinHandle<ServeExit>) {
        let (controller, mut worker) = channel_pair();
        let handle = std::thread::spawn(move || {
            let mut server =
                ServerStub::new(test_schema(), Box::new(TestModule { events: None }));
            server.serve(&mut worker)
        });
        (ClientStub::new(test_schema(), controller), handle)
    }

    #[test]
    fn test_sync_call_round_trip() {
        let (mut client, handle) = spawn_server();

        let reply = client.call(OP_DOUBLE, WirePayload::new(&21u32).unwrap()).unwrap();
        assert_eq!(reply.deserialize::<u32>().unwrap(), 42);
        assert_eq!(client.call_state(), CallState::Idle);

        client.shutdown().unwrap();
        assert_eq!(handle.join().unwrap(), ServeExit::Shutdown);
    }

    #[test]
    fn test_module_fault_surfaces() {
        let (mut client, handle) = spawn_server();

        let err = client.call(OP_FAIL, WirePayload::empty()).unwrap_err();
        assert!(matches!(err, ProxyError::ModuleFault(ref s) if s == "deliberate fault"));
        // A fault leaves the context usable.
        assert_eq!(client.call_state(), CallState::Idle);

        client.shutdown().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_cast_and_poll_events() {
        let (mut client, handle) = spawn_server();

        client.cast(OP_RECORD, WirePayload::new(&7u32).unwrap()).unwrap();

        // The event arrives asynchronously; poll until it shows up.
        let mut seen = Vec::new();
        for _ in 0..100 {
            client.poll_events(&mut |opcode, payload: WirePayload, _buffers| {
                seen.push((opcode, payload.deserialize::<u32>().unwrap()));
            });
            if !seen.is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(seen, vec![(EV_RECORDED, 7)]);

        client.shutdown().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_events_buffered_during_call() {
        let (mut client, handle) = spawn_server();

        // The module raises an event inside the call; the stub must
        // buffer it while matching the reply.
        let reply = client.call(OP_DOUBLE, WirePayload::new(&5u32).unwrap()).unwrap();
        assert_eq!(reply.deserialize::<u32>().unwrap(), 10);

        let mut seen = Vec::new();
        client.poll_events(&mut |opcode, payload: WirePayload, _buffers| {
            seen.push((opcode, payload.deserialize::<u32>().unwrap()));
        });
        assert_eq!(seen, vec![(EV_RECORDED, 5)]);

        client.shutdown().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_unknown_operation() {
        let (mut client, handle) = spawn_server();
        assert!(matches!(
            client.call(99, WirePayload::empty()),
            Err(ProxyError::UnknownOperation(99))
        ));
        client.shutdown().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_wrong_calling_mode() {
        let (mut client, handle) = spawn_server();

        assert!(matches!(
            client.call(OP_RECORD, WirePayload::empty()),
            Err(ProxyError::WrongCallingMode { name: "record", .. })
        ));
        assert!(matches!(
            client.cast(OP_DOUBLE, WirePayload::empty()),
            Err(ProxyError::WrongCallingMode { name: "double", .. })
        ));

        client.shutdown().unwrap();
        handle.join().unwrap();
    }

    /// Transport that rejects every send without severing the channel
    struct RejectingChannel;

    impl MessageChannel for RejectingChannel {
        fn send(&mut self, _message: WireMessage) -> Result<(), TransportError> {
            Err(TransportError::Wire(ipa_wire::WireError::Serialize(
                "frame too large".to_string(),
            )))
        }

        fn receive(&mut self) -> Result<WireMessage, TransportError> {
            Err(TransportError::ReceiveTimeout)
        }

        fn close(&mut self) {}

        fn state(&self) -> ipa_transport::ChannelState {
            ipa_transport::ChannelState::Open
        }
    }

    #[test]
    fn test_rejected_send_surfaces_without_breaking_context() {
        let mut client = ClientStub::new(test_schema(), RejectingChannel);

        // A cast whose message never left the stub must not report
        // success.
        let err = client
            .cast(OP_RECORD, WirePayload::new(&1u32).unwrap())
            .unwrap_err();
        assert!(matches!(err, ProxyError::Wire(_)));

        // A call surfaces the send failure directly instead of waiting
        // for a reply that can never come.
        let err = client
            .call(OP_DOUBLE, WirePayload::new(&1u32).unwrap())
            .unwrap_err();
        assert!(matches!(err, ProxyError::Wire(_)));

        // The rejection is scoped to the message, not the context.
        assert_eq!(client.call_state(), CallState::Idle);
    }

    #[test]
    fn test_channel_closed_breaks_context() {
        let (controller, worker) = channel_pair();
        let mut client = ClientStub::new(test_schema(), controller);
        drop(worker);

        let err = client.call(OP_DOUBLE, WirePayload::new(&1u32).unwrap()).unwrap_err();
        assert!(matches!(err, ProxyError::ChannelClosed));
        assert!(client.call_state().is_broken());

        // Broken is terminal.
        assert!(matches!(
            client.call(OP_DOUBLE, WirePayload::new(&1u32).unwrap()),
            Err(ProxyError::Broken)
        ));
        assert!(matches!(
            client.cast(OP_RECORD, WirePayload::new(&1u32).unwrap()),
            Err(ProxyError::Broken)
        ));
    }

    #[test]
    fn test_call_timeout_breaks_context() {
        // A peer that accepts the request but never replies.
        let (controller, _worker) = channel_pair();
        let mut client = ClientStub::new(test_schema(), controller)
            .with_call_timeout(Duration::from_millis(20));

        let err = client.call(OP_DOUBLE, WirePayload::new(&1u32).unwrap()).unwrap_err();
        assert!(matches!(err, ProxyError::CallTimeout));
        assert!(client.call_state().is_broken());
    }

    #[test]
    fn test_shutdown_skips_handshake_when_broken() {
        let (controller, worker) = channel_pair();
        let mut client = ClientStub::new(test_schema(), controller);
        drop(worker);

        let _ = client.call(OP_DOUBLE, WirePayload::new(&1u32).unwrap());
        assert!(client.call_state().is_broken());
        client.shutdown().unwrap();
    }
}
