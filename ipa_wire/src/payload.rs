//! Type-erased message payloads

use crate::error::WireError;
use serde::{Deserialize, Serialize};

/// Serialized payload bytes of one message
///
/// The payload representation is JSON: composite and optional values
/// describe themselves, so a payload decodes without any external type
/// table. Bulk binary data never goes through here — it is referenced by
/// buffer handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WirePayload {
    data: Vec<u8>,
}

impl WirePayload {
    /// Serializes a value into a payload
    pub fn new<T: Serialize>(value: &T) -> Result<Self, WireError> {
        let data =
            serde_json::to_vec(value).map_err(|err| WireError::Serialize(err.to_string()))?;
        Ok(Self { data })
    }

    /// Creates an empty payload (operations without parameters)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps raw payload bytes received from the wire
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Deserializes the payload into a value
    ///
    /// Malformed or truncated bytes fail with
    /// [`WireError::MalformedPayload`]; a partial value is never produced.
    pub fn deserialize<T: for<'de> Deserialize<'de>>(&self) -> Result<T, WireError> {
        serde_json::from_slice(&self.data)
            .map_err(|err| WireError::MalformedPayload(err.to_string()))
    }

    /// Returns the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the payload, returning its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Returns the payload length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Checks whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
