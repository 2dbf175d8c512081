//! Bulk buffer references and per-frame metadata

use crate::controls::ControlList;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a bulk frame or parameter buffer
///
/// Pixel and metadata buffers are never inlined into message payloads.
/// Both sides of the channel share the underlying storage by handle; a
/// message payload refers to it by `id` only. The handle itself is small
/// and copyable, and its wire encoding is fixed-size (id + length).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferHandle {
    /// Identifier agreed between controller and module at mapping time
    pub id: u32,
    /// Length of the underlying buffer in bytes
    pub length: u64,
}

impl BufferHandle {
    /// Creates a new buffer handle
    pub const fn new(id: u32, length: u64) -> Self {
        Self { id, length }
    }
}

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer({}, {} bytes)", self.id, self.length)
    }
}

/// Metadata produced for a completed frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameMetadata {
    /// Frame sequence number
    pub sequence: u64,
    /// Capture timestamp in nanoseconds
    pub timestamp_ns: u64,
    /// Controls computed by the module for this frame
    pub controls: ControlList,
}

impl FrameMetadata {
    /// Creates metadata for a frame
    pub fn new(sequence: u64, timestamp_ns: u64) -> Self {
        Self {
            sequence,
            timestamp_ns,
            controls: ControlList::new(),
        }
    }

    /// Attaches computed controls
    pub fn with_controls(mut self, controls: ControlList) -> Self {
        self.controls = controls;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_handle() {
        let handle = BufferHandle::new(3, 4096);
        assert_eq!(handle.id, 3);
        assert_eq!(handle.length, 4096);
        assert_eq!(format!("{}", handle), "Buffer(3, 4096 bytes)");
    }

    #[test]
    fn test_frame_metadata() {
        let mut controls = ControlList::new();
        controls.set(1, 100i32);

        let meta = FrameMetadata::new(7, 1_000_000).with_controls(controls.clone());
        assert_eq!(meta.sequence, 7);
        assert_eq!(meta.timestamp_ns, 1_000_000);
        assert_eq!(meta.controls, controls);
    }
}
