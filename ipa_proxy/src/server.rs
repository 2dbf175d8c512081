//! Server stub: wire messages back into module calls

use crate::module::{EventSender, IpaModule, ModuleCall};
use crate::reply::encode_reply;
use ipa_schema::{CallingMode, ProtocolSchema, SHUTDOWN_OPCODE};
use ipa_transport::{MessageChannel, TransportError};
use ipa_wire::{WireMessage, WirePayload};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

/// How often the serve loop flushes spontaneously raised events while the
/// channel is quiet
const EVENT_FLUSH_INTERVAL: Duration = Duration::from_millis(10);

/// Why a serve loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeExit {
    /// The controller requested graceful shutdown
    Shutdown,
    /// The channel was severed without a shutdown handshake
    Disconnected,
}

/// The module-side half of the proxy pair
///
/// Decodes received messages, invokes the module implementation, replies
/// to synchronous operations, and forwards module-raised events. Runs
/// either inside an isolated worker's serve loop or inline within the
/// controller's call when isolation is disabled.
pub struct ServerStub {
    schema: ProtocolSchema,
    module: Box<dyn IpaModule>,
    events_rx: Receiver<WireMessage>,
}

impl ServerStub {
    /// Creates a server stub around a module instance
    ///
    /// The module receives its [`EventSender`] here, before any call can
    /// reach it.
    pub fn new(schema: ProtocolSchema, mut module: Box<dyn IpaModule>) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        module.bind_events(EventSender::new(events_tx));
        Self {
            schema,
            module,
            events_rx,
        }
    }

    /// Handles one inbound message
    ///
    /// Returns the messages to deliver to the controller, in order, and
    /// whether a shutdown was requested. Malformed or unknown input is
    /// answered with a fault (synchronous) or dropped with a warning —
    /// it never ends the serve loop.
    pub fn handle_message(&mut self, message: WireMessage) -> (Vec<WireMessage>, bool) {
        if message.opcode == SHUTDOWN_OPCODE {
            let mut out = self.drain_events();
            if let Some(ack) = reply_to(&message, Ok(WirePayload::empty())) {
                out.push(ack);
            }
            return (out, true);
        }

        if ProtocolSchema::is_event_opcode(message.opcode) {
            log::warn!(
                "ignoring event opcode {:#x} received on the module side",
                message.opcode
            );
            return (Vec::new(), false);
        }

        let Some(op) = self.schema.operation(message.opcode) else {
            log::warn!("unknown operation opcode {:#x}", message.opcode);
            let mut out = self.drain_events();
            if !message.correlation.is_unsolicited() {
                let fault = Err(format!("unknown operation opcode {:#x}", message.opcode));
                if let Some(reply) = reply_to(&message, fault) {
                    out.push(reply);
                }
            }
            return (out, false);
        };

        let call = ModuleCall {
            opcode: message.opcode,
            payload: message.payload.clone(),
            buffers: message.buffers.clone(),
        };

        match op.mode {
            CallingMode::Synchronous => {
                let outcome = self.module.invoke(call);
                // Events raised while the call executed precede its reply.
                let mut out = self.drain_events();
                if let Some(reply) = reply_to(&message, outcome) {
                    out.push(reply);
                }
                (out, false)
            }
            CallingMode::Asynchronous => {
                self.module.notify(call);
                (self.drain_events(), false)
            }
        }
    }

    /// Drains events the module has raised since the last call
    pub fn drain_events(&mut self) -> Vec<WireMessage> {
        self.events_rx.try_iter().collect()
    }

    /// Serves the channel until shutdown or disconnection
    ///
    /// This is the body of an isolated execution context: a blocking loop
    /// delivering calls to the module and events back to the controller.
    pub fn serve<C: MessageChannel>(&mut self, channel: &mut C) -> ServeExit {
        loop {
            match channel.receive_timeout(EVENT_FLUSH_INTERVAL) {
                Ok(message) => {
                    let (out, shutdown) = self.handle_message(message);
                    if !self.send_all(channel, out) {
                        return ServeExit::Disconnected;
                    }
                    if shutdown {
                        log::info!("module serve loop shutting down");
                        channel.close();
                        return ServeExit::Shutdown;
                    }
                }
                Err(TransportError::ReceiveTimeout) => {
                    let events = self.drain_events();
                    if !self.send_all(channel, events) {
                        return ServeExit::Disconnected;
                    }
                }
                Err(TransportError::Wire(err)) => {
                    // One bad message; the channel itself is still good.
                    log::warn!("rejecting malformed message: {}", err);
                }
                Err(TransportError::ChannelClosed) => {
                    log::info!("module serve loop ending: channel closed");
                    return ServeExit::Disconnected;
                }
            }
        }
    }

    fn send_all<C: MessageChannel>(&self, channel: &mut C, messages: Vec<WireMessage>) -> bool {
        for message in messages {
            let opcode = message.opcode;
            let correlation = message.correlation;
            match channel.send(message) {
                Ok(()) => {}
                Err(TransportError::ChannelClosed) => return false,
                Err(err) => {
                    log::error!("failed to send message for opcode {:#x}: {}", opcode, err);
                    // A caller blocked on this reply gets a fault instead
                    // of silence.
                    if !correlation.is_unsolicited()
                        && !ProtocolSchema::is_event_opcode(opcode)
                    {
                        let fault = Err(format!("reply undeliverable: {err}"));
                        if let Ok(payload) = encode_reply(fault) {
                            let substitute = WireMessage::call(opcode, correlation, payload);
                            if let Err(TransportError::ChannelClosed) = channel.send(substitute)
                            {
                                return false;
                            }
                        }
                    }
                }
            }
        }
        true
    }
}

/// Builds the reply message for a synchronous request
fn reply_to(request: &WireMessage, outcome: Result<WirePayload, String>) -> Option<WireMessage> {
    match encode_reply(outcome) {
        Ok(payload) => Some(WireMessage::call(
            request.opcode,
            request.correlation,
            payload,
        )),
        Err(err) => {
            log::error!("failed to encode reply for opcode {:#x}: {}", request.opcode, err);
            None
        }
    }
}
