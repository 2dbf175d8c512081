//! Operation and event descriptors

use std::fmt;

/// Opcode reserved for the transport-level shutdown handshake
///
/// No schema may declare it; the server stub acknowledges it and ends its
/// serve loop.
pub const SHUTDOWN_OPCODE: u32 = 0;

/// Bit marking an opcode as an event (module → controller notification)
///
/// Replies echo their request opcode, so the client stub tells replies and
/// events apart by this bit alone.
pub const EVENT_OPCODE_BASE: u32 = 0x8000_0000;

/// Calling mode of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallingMode {
    /// Caller blocks until the reply arrives
    Synchronous,
    /// Fire-and-forget; no reply, no completion signal
    Asynchronous,
}

impl fmt::Display for CallingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallingMode::Synchronous => write!(f, "sync"),
            CallingMode::Asynchronous => write!(f, "async"),
        }
    }
}

/// Wire type of a parameter, return value or event payload field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Bool,
    Uint32,
    Int32,
    Uint64,
    Int64,
    Float,
    String,
    Size,
    Rectangle,
    StreamConfig,
    ControlList,
    FrameMetadata,
    /// Out-of-band bulk buffer reference
    BufferHandle,
}

/// A named, typed parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: WireType,
}

impl ParamSpec {
    /// Creates a parameter spec
    pub const fn new(name: &'static str, ty: WireType) -> Self {
        Self { name, ty }
    }
}

/// Descriptor of one operation exposed by an IPA module
///
/// Defined at build time from the pipeline type's schema; immutable.
/// Asynchronous operations never declare a return value — callers must not
/// block waiting on one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationDescriptor {
    /// Operation name, unique within the pipeline type
    pub name: &'static str,
    /// Wire opcode, unique within the pipeline type
    pub opcode: u32,
    /// Calling mode
    pub mode: CallingMode,
    /// Ordered parameter list
    pub params: &'static [ParamSpec],
    /// Return type; always `None` for asynchronous operations
    pub returns: Option<WireType>,
}

impl OperationDescriptor {
    /// Checks whether callers block on this operation
    pub fn is_synchronous(&self) -> bool {
        self.mode == CallingMode::Synchronous
    }
}

/// Descriptor of one event emitted by an IPA module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDescriptor {
    /// Event name, unique within the pipeline type
    pub name: &'static str,
    /// Wire opcode; must carry [`EVENT_OPCODE_BASE`]
    pub opcode: u32,
    /// Ordered payload field list
    pub payload: &'static [ParamSpec],
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: &[ParamSpec] = &[
        ParamSpec::new("frame", WireType::Uint32),
        ParamSpec::new("controls", WireType::ControlList),
    ];

    #[test]
    fn test_operation_descriptor() {
        let op = OperationDescriptor {
            name: "queue_request",
            opcode: 4,
            mode: CallingMode::Asynchronous,
            params: PARAMS,
            returns: None,
        };

        assert!(!op.is_synchronous());
        assert_eq!(op.params.len(), 2);
        assert_eq!(op.params[0].name, "frame");
    }

    #[test]
    fn test_calling_mode_display() {
        assert_eq!(format!("{}", CallingMode::Synchronous), "sync");
        assert_eq!(format!("{}", CallingMode::Asynchronous), "async");
    }

    #[test]
    fn test_event_opcode_base_disjoint_from_shutdown() {
        assert_ne!(EVENT_OPCODE_BASE, SHUTDOWN_OPCODE);
        assert_eq!(EVENT_OPCODE_BASE & (EVENT_OPCODE_BASE - 1), 0);
    }
}
