//! Wire-level error taxonomy

use thiserror::Error;

/// Errors raised while encoding or decoding wire data
#[derive(Debug, Error)]
pub enum WireError {
    /// Corrupt or truncated bytes; the offending message is rejected, the
    /// channel stays usable.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A value could not be serialized. Authoring error, not a wire
    /// condition.
    #[error("Payload serialization failed: {0}")]
    Serialize(String),

    /// Frame exceeds the size guard.
    #[error("Frame of {size} bytes exceeds maximum of {max}")]
    Oversized { size: usize, max: usize },

    /// Underlying stream failure while framing.
    #[error("Wire I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl WireError {
    /// Builds a malformed-payload error with context
    pub fn malformed(reason: impl Into<String>) -> Self {
        WireError::MalformedPayload(reason.into())
    }

    /// Checks whether this error is scoped to a single message
    ///
    /// Local errors reject one message; non-local errors mean the stream
    /// itself can no longer be trusted.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            WireError::MalformedPayload(_) | WireError::Serialize(_)
        )
    }
}
