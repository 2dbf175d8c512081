//! In-process execution: the server stub runs inside the caller's send

use ipa_proxy::ServerStub;
use ipa_transport::{ChannelState, MessageChannel, TransportError};
use ipa_wire::WireMessage;
use std::collections::VecDeque;
use std::time::Duration;

/// A channel whose peer is the module itself
///
/// With isolation disabled there is no worker: `send` dispatches the
/// message straight into the server stub on the calling thread and
/// queues whatever the module produced — replies and events — for the
/// following `receive` calls. Same ownership, framing, and failure
/// semantics as a real transport, minus the process boundary.
pub struct InlineChannel {
    server: ServerStub,
    inbound: VecDeque<WireMessage>,
    state: ChannelState,
    shutting_down: bool,
}

impl InlineChannel {
    pub fn new(server: ServerStub) -> Self {
        Self {
            server,
            inbound: VecDeque::new(),
            state: ChannelState::Open,
            shutting_down: false,
        }
    }
}

impl MessageChannel for InlineChannel {
    fn send(&mut self, message: WireMessage) -> Result<(), TransportError> {
        if !self.state.is_usable() {
            return Err(TransportError::ChannelClosed);
        }

        let (out, shutdown) = self.server.handle_message(message);
        self.inbound.extend(out);
        self.state = ChannelState::Active;
        if shutdown {
            // Queued replies stay readable until drained.
            self.shutting_down = true;
            self.state = ChannelState::Closing;
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<WireMessage, TransportError> {
        if self.state.is_closed() {
            return Err(TransportError::ChannelClosed);
        }

        self.inbound.extend(self.server.drain_events());
        if let Some(message) = self.inbound.pop_front() {
            return Ok(message);
        }

        if self.shutting_down {
            self.state = ChannelState::Closed;
            return Err(TransportError::ChannelClosed);
        }
        // The module only runs inside send, so an empty queue can never
        // fill while we wait.
        Err(TransportError::ReceiveTimeout)
    }

    fn receive_timeout(&mut self, _timeout: Duration) -> Result<WireMessage, TransportError> {
        self.receive()
    }

    fn close(&mut self) {
        if !self.state.is_closed() {
            self.state = ChannelState::Closed;
            self.inbound.clear();
        }
    }

    fn state(&self) -> ChannelState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camera_types::ProtocolVersion;
    use ipa_proxy::{
        ClientStub, EventSender, IpaModule, ModuleCall, ProxyError, WirePayload,
    };
    use ipa_schema::{
        CallingMode, EventDescriptor, OperationDescriptor, ParamSpec, ProtocolSchema, WireType,
        EVENT_OPCODE_BASE,
    };

    const OP_DOUBLE: u32 = 1;
    const OP_RECORD: u32 = 2;
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
            let value: u32 = call.payload.deserialize().map_err(|e| e.to_string())?;
            WirePayload::new(&(value * 2)).map_err(|e| e.to_string())
        }

        fn notify(&mut self, call: ModuleCall) {
            if let (Some(events), Ok(value)) = (&self.events, call.payload.deserialize::<u32>()) {
                events.raise(EV_RECORDED, WirePayload::new(&value).unwrap());
            }
        }
    }

    fn inline_client() -> ClientStub<InlineChannel> {
        let server = ServerStub::new(test_schema(), Box::new(TestModule { events: None }));
        ClientStub::new(test_schema(), InlineChannel::new(server))
    }

    #[test]
    fn test_inline_sync_call() {
        let mut client = inline_client();
        let reply = client.call(OP_DOUBLE, WirePayload::new(&8u32).unwrap()).unwrap();
        assert_eq!(reply.deserialize::<u32>().unwrap(), 16);
    }

    #[test]
    fn test_inline_cast_delivers_event() {
        let mut client = inline_client();
        client.cast(OP_RECORD, WirePayload::new(&3u32).unwrap()).unwrap();

        let mut seen = Vec::new();
        client.poll_events(&mut |opcode, payload: WirePayload, _| {
            seen.push((opcode, payload.deserialize::<u32>().unwrap()));
        });
        assert_eq!(seen, vec![(EV_RECORDED, 3)]);
    }

    #[test]
    fn test_inline_shutdown() {
        let mut client = inline_client();
        client.shutdown().unwrap();

        assert!(matches!(
            client.call(OP_DOUBLE, WirePayload::new(&1u32).unwrap()),
            Err(ProxyError::ChannelClosed) | Err(ProxyError::Broken)
        ));
    }
}
