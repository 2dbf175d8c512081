//! Proxy error taxonomy

use ipa_transport::TransportError;
use ipa_wire::WireError;
use thiserror::Error;

/// Errors surfaced by the proxy pair
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The transport is severed; the owning context is broken and accepts
    /// no further calls.
    #[error("Channel closed")]
    ChannelClosed,

    /// The configured reply bound expired. The context is treated as
    /// broken, exactly as if the channel had closed.
    #[error("Synchronous call timed out")]
    CallTimeout,

    /// An earlier failure broke this context; no further calls are
    /// accepted.
    #[error("Context broken by earlier channel failure")]
    Broken,

    /// Opcode not present in the pipeline type's schema.
    #[error("Unknown operation opcode {0:#x}")]
    UnknownOperation(u32),

    /// An operation was invoked through the wrong calling mode. This is a
    /// generated-code or authoring error, not a runtime condition.
    #[error("Operation '{name}' is {mode}")]
    WrongCallingMode {
        name: &'static str,
        mode: &'static str,
    },

    /// The module reported a failure for a synchronous operation.
    #[error("Module fault: {0}")]
    ModuleFault(String),

    /// Local (de)serialization failure; scoped to a single message.
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl From<TransportError> for ProxyError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::ChannelClosed => ProxyError::ChannelClosed,
            TransportError::ReceiveTimeout => ProxyError::CallTimeout,
            TransportError::Wire(wire) => ProxyError::Wire(wire),
        }
    }
}
