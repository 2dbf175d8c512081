//! # IPA Wire Format
//!
//! Payload serialization and message framing for the IPA transport.
//!
//! ## Philosophy
//!
//! - **One serializer**: this crate is the sole place where values become
//!   bytes. Proxies and transports deal in [`WireMessage`]s, never in
//!   encodings.
//! - **Self-delimiting**: every variable-length element carries its own
//!   length, so decoding never depends on anything beyond the message
//!   boundary.
//! - **Reject, don't truncate**: malformed or short input yields
//!   [`WireError::MalformedPayload`]; a partially-decoded value is never
//!   returned.
//! - **Bulk data out of band**: pixel and parameter buffers travel as
//!   fixed-size handle references, never inlined in payloads.
//!
//! ## Frame layout
//!
//! All integers little-endian; `length` covers everything after itself:
//!
//! ```text
//! [length:u32][opcode:u32][correlation:u32]
//! [payload_len:u32][payload bytes][handle_count:u32][id:u32 len:u64]...
//! ```

pub mod error;
pub mod frame;
pub mod message;
pub mod payload;

pub use error::WireError;
pub use frame::{
    decode_frame, encode_frame, FrameReader, FrameWriter, HANDLE_WIRE_SIZE, MAX_FRAME_SIZE,
};
pub use message::{CorrelationId, WireMessage};
pub use payload::WirePayload;
