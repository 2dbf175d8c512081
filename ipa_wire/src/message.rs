//! Wire messages: the unit carried by a transport channel

use crate::payload::WirePayload;
use camera_types::BufferHandle;
use std::fmt;

/// Token linking a synchronous reply to its originating call
///
/// Events and asynchronous casts are unsolicited and carry
/// [`CorrelationId::UNSOLICITED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(u32);

impl CorrelationId {
    /// Correlation value for messages that expect no reply
    pub const UNSOLICITED: CorrelationId = CorrelationId(0);

    /// Creates a correlation ID from its wire value
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the wire value
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Checks whether this message expects no reply
    pub fn is_unsolicited(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Corr({})", self.0)
    }
}

/// One framed message: call, reply, or event
///
/// Transient — constructed per call or event and discarded after delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct WireMessage {
    /// Operation or event opcode
    pub opcode: u32,
    /// Correlation token; zero when unsolicited
    pub correlation: CorrelationId,
    /// Serialized parameters, result, or event payload
    pub payload: WirePayload,
    /// Out-of-band bulk buffer references
    pub buffers: Vec<BufferHandle>,
}

impl WireMessage {
    /// Creates a call message with a correlation token
    pub fn call(opcode: u32, correlation: CorrelationId, payload: WirePayload) -> Self {
        Self {
            opcode,
            correlation,
            payload,
            buffers: Vec::new(),
        }
    }

    /// Creates an unsolicited message (async cast or event)
    pub fn unsolicited(opcode: u32, payload: WirePayload) -> Self {
        Self::call(opcode, CorrelationId::UNSOLICITED, payload)
    }

    /// Attaches bulk buffer handles
    pub fn with_buffers(mut self, buffers: Vec<BufferHandle>) -> Self {
        self.buffers = buffers;
        self
    }
}
