//! Transport error taxonomy

use ipa_wire::WireError;
use thiserror::Error;

/// Errors raised by a transport channel
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying transport is severed. Every pending and future
    /// operation on this channel fails the same way.
    #[error("Channel closed")]
    ChannelClosed,

    /// No message arrived within the requested bound. The channel itself
    /// is still usable; whether to treat this as fatal is the caller's
    /// policy.
    #[error("Receive timed out")]
    ReceiveTimeout,

    /// The current message is malformed. It is rejected; subsequent
    /// messages on the channel are unaffected.
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl TransportError {
    /// Checks whether the channel remains usable after this error
    pub fn is_fatal(&self) -> bool {
        match self {
            TransportError::ChannelClosed => true,
            TransportError::ReceiveTimeout => false,
            TransportError::Wire(err) => !err.is_local(),
        }
    }
}
