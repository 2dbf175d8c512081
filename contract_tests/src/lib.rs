//! # IPA Contract Tests
//!
//! This crate provides "golden" tests for the IPA wire and protocol
//! contracts to ensure they don't drift accidentally over time.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: the frame layout and opcode assignments
//!   are spelled out as bytes and numbers, not re-derived from the code
//!   under test
//! - **Testability first**: contract tests fail when an interface changes
//! - **Mechanism not policy**: define what must stay stable, not how to
//!   use it
//!
//! Client and server stubs built independently must interoperate over
//! the wire; these tests are the fence around that guarantee.

pub mod framing;
pub mod reply_envelope;
pub mod soft_protocol;

/// Common helpers for contract validation
pub mod test_helpers {
    use ipa_wire::{decode_frame, encode_frame, WireMessage};

    /// Encodes a message and asserts the frame decodes back unchanged
    pub fn assert_frame_stable(message: &WireMessage) -> Vec<u8> {
        let frame = encode_frame(message).expect("Failed to encode frame");
        let (decoded, consumed) = decode_frame(&frame).expect("Failed to decode frame");
        assert_eq!(consumed, frame.len(), "Frame length drifted");
        assert_eq!(&decoded, message, "Frame round trip changed the message");
        frame
    }

    /// Reads a little-endian u32 at a byte offset within a frame
    pub fn u32_at(frame: &[u8], offset: usize) -> u32 {
        let bytes: [u8; 4] = frame[offset..offset + 4]
            .try_into()
            .expect("Frame shorter than expected");
        u32::from_le_bytes(bytes)
    }
}
