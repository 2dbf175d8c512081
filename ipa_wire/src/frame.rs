//! Length-prefixed message framing
//!
//! Frames are decoded strictly front-to-back; a frame that does not consume
//! exactly its declared length is rejected as malformed. A rejected frame
//! never poisons the framing of the messages that follow it, because the
//! length prefix always bounds how many bytes belong to the frame.

use crate::error::WireError;
use crate::message::{CorrelationId, WireMessage};
use crate::payload::WirePayload;
use camera_types::BufferHandle;
use std::io::{Read, Write};

/// Wire size of one encoded buffer handle (id:u32 + length:u64)
pub const HANDLE_WIRE_SIZE: usize = 12;

/// Upper bound on a single frame, guarding against corrupt length prefixes
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

const FIXED_BODY_SIZE: usize = 4 + 4 + 4 + 4; // opcode + correlation + payload_len + handle_count

/// Encodes a message into one framed byte vector
pub fn encode_frame(message: &WireMessage) -> Result<Vec<u8>, WireError> {
    let body_len = FIXED_BODY_SIZE
        + message.payload.len()
        + message.buffers.len() * HANDLE_WIRE_SIZE;
    if body_len > MAX_FRAME_SIZE {
        return Err(WireError::Oversized {
            size: body_len,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut out = Vec::with_capacity(4 + body_len);
    out.extend_from_slice(&(body_len as u32).to_le_bytes());
    out.extend_from_slice(&message.opcode.to_le_bytes());
    out.extend_from_slice(&message.correlation.value().to_le_bytes());
    out.extend_from_slice(&(message.payload.len() as u32).to_le_bytes());
    out.extend_from_slice(message.payload.as_bytes());
    out.extend_from_slice(&(message.buffers.len() as u32).to_le_bytes());
    for handle in &message.buffers {
        out.extend_from_slice(&handle.id.to_le_bytes());
        out.extend_from_slice(&handle.length.to_le_bytes());
    }

    Ok(out)
}

/// Decodes one frame from the front of `buf`
///
/// Returns the message and the number of bytes consumed.
pub fn decode_frame(buf: &[u8]) -> Result<(WireMessage, usize), WireError> {
    if buf.len() < 4 {
        return Err(WireError::malformed("frame shorter than length prefix"));
    }
    let body_len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if body_len > MAX_FRAME_SIZE {
        return Err(WireError::Oversized {
            size: body_len,
            max: MAX_FRAME_SIZE,
        });
    }
    if buf.len() < 4 + body_len {
        return Err(WireError::malformed("truncated frame body"));
    }

    let message = decode_body(&buf[4..4 + body_len])?;
    Ok((message, 4 + body_len))
}

fn decode_body(body: &[u8]) -> Result<WireMessage, WireError> {
    let mut cursor = Cursor::new(body);

    let opcode = cursor.u32()?;
    let correlation = CorrelationId::new(cursor.u32()?);
    let payload_len = cursor.u32()? as usize;
    let payload = WirePayload::from_bytes(cursor.bytes(payload_len)?.to_vec());
    let handle_count = cursor.u32()? as usize;

    let mut buffers = Vec::with_capacity(handle_count.min(64));
    for _ in 0..handle_count {
        let id = cursor.u32()?;
        let length = cursor.u64()?;
        buffers.push(BufferHandle::new(id, length));
    }

    if !cursor.at_end() {
        return Err(WireError::malformed("trailing bytes after frame body"));
    }

    Ok(WireMessage {
        opcode,
        correlation,
        payload,
        buffers,
    })
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| WireError::malformed("field extends past frame body"))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, WireError> {
        let b = self.bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64, WireError> {
        let b = self.bytes(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn at_end(&self) -> bool {
        self.pos == self.buf.len()
    }
}

/// Writes framed messages to a byte stream
pub struct FrameWriter<W: Write> {
    inner: W,
}

impl<W: Write> FrameWriter<W> {
    /// Creates a writer over a byte stream
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Encodes and writes one message, flushing the stream
    pub fn write_message(&mut self, message: &WireMessage) -> Result<(), WireError> {
        let frame = encode_frame(message)?;
        self.inner.write_all(&frame)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Returns the underlying stream
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Reads framed messages from a byte stream
pub struct FrameReader<R: Read> {
    inner: R,
}

impl<R: Read> FrameReader<R> {
    /// Creates a reader over a byte stream
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Reads one complete message, blocking until it is available
    pub fn read_message(&mut self) -> Result<WireMessage, WireError> {
        let mut len_bytes = [0u8; 4];
        self.inner.read_exact(&mut len_bytes)?;
        let body_len = u32::from_le_bytes(len_bytes) as usize;
        if body_len > MAX_FRAME_SIZE {
            return Err(WireError::Oversized {
                size: body_len,
                max: MAX_FRAME_SIZE,
            });
        }

        let mut body = vec![0u8; body_len];
        self.inner.read_exact(&mut body)?;
        decode_body(&body)
    }

    /// Returns the underlying stream
    pub fn into_inner(self) -> R {
        self.inner
    }
}
