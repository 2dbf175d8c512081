//! The type-erased module-side interface

use camera_types::BufferHandle;
use ipa_schema::{ProtocolSchema, SHUTDOWN_OPCODE};
use ipa_wire::{WireMessage, WirePayload};
use std::sync::mpsc::Sender;

/// One decoded call reaching the module implementation
#[derive(Debug)]
pub struct ModuleCall {
    /// Operation opcode from the pipeline type's schema
    pub opcode: u32,
    /// Serialized operation parameters
    pub payload: WirePayload,
    /// Out-of-band bulk buffers referenced by the call
    pub buffers: Vec<BufferHandle>,
}

/// Handle through which a module raises events
///
/// Cloneable and thread-safe; a module may emit from its own worker
/// threads. Events are forwarded to the controller by the server stub in
/// raise order, independent of any in-flight call.
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<WireMessage>,
}

impl EventSender {
    pub(crate) fn new(tx: Sender<WireMessage>) -> Self {
        Self { tx }
    }

    /// Raises an event with the given payload
    ///
    /// The controller side observes events in raise order. Raising after
    /// the context has been torn down is a silent no-op.
    pub fn raise(&self, opcode: u32, payload: WirePayload) {
        self.raise_with_buffers(opcode, payload, Vec::new());
    }

    /// Raises an event carrying bulk buffer references
    pub fn raise_with_buffers(
        &self,
        opcode: u32,
        payload: WirePayload,
        buffers: Vec<BufferHandle>,
    ) {
        debug_assert!(
            ProtocolSchema::is_event_opcode(opcode) && opcode != SHUTDOWN_OPCODE,
            "event opcode {opcode:#x} outside event range"
        );
        let message = WireMessage::unsolicited(opcode, payload).with_buffers(buffers);
        if self.tx.send(message).is_err() {
            log::debug!("event {opcode:#x} dropped: server stub gone");
        }
    }
}

/// The erased capability surface of one IPA module instance
///
/// A typed, per-pipeline dispatcher implements this by decoding parameters
/// and forwarding to the pipeline type's interface trait; module authors
/// implement that trait, not this one. One instance exists per camera.
pub trait IpaModule: Send {
    /// Receives the event handle once, before any call is dispatched
    ///
    /// Modules that emit no events may ignore it.
    fn bind_events(&mut self, _events: EventSender) {}

    /// Handles a synchronous operation, returning the serialized result
    /// or a fault description
    fn invoke(&mut self, call: ModuleCall) -> Result<WirePayload, String>;

    /// Handles an asynchronous operation; there is no reply
    fn notify(&mut self, call: ModuleCall);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipa_schema::EVENT_OPCODE_BASE;
    use std::sync::mpsc;

    #[test]
    fn test_event_sender_forwards() {
        let (tx, rx) = mpsc::channel();
        let sender = EventSender::new(tx);

        sender.raise(EVENT_OPCODE_BASE | 1, WirePayload::empty());
        let message = rx.recv().unwrap();
        assert_eq!(message.opcode, EVENT_OPCODE_BASE | 1);
        assert!(message.correlation.is_unsolicited());
    }

    #[test]
    fn test_event_sender_after_teardown() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic.
        sender.raise(EVENT_OPCODE_BASE | 1, WirePayload::empty());
    }
}
