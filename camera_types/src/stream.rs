//! Stream configuration exchanged with IPA modules

use crate::geometry::Size;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel format as a packed fourcc code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelFormat(u32);

impl PixelFormat {
    /// Creates a pixel format from a fourcc code
    pub const fn from_fourcc(code: u32) -> Self {
        Self(code)
    }

    /// Creates a pixel format from four ASCII characters
    pub const fn fourcc(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self(a as u32 | (b as u32) << 8 | (c as u32) << 16 | (d as u32) << 24)
    }

    /// Returns the packed fourcc code
    pub const fn code(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..4 {
            let byte = ((self.0 >> (8 * i)) & 0xff) as u8;
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, ".")?;
            }
        }
        Ok(())
    }
}

/// Configuration of a single stream handed to an IPA module
///
/// This mirrors the controller's stream configuration with serializable
/// fields only; the module never sees controller-owned stream state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Pixel format of the stream
    pub pixel_format: PixelFormat,
    /// Frame size in pixels
    pub size: Size,
    /// Line stride in bytes
    pub stride: u32,
    /// Number of buffers allocated for the stream
    pub buffer_count: u32,
}

impl StreamConfig {
    /// Creates a stream configuration
    pub fn new(pixel_format: PixelFormat, size: Size) -> Self {
        Self {
            pixel_format,
            size,
            stride: 0,
            buffer_count: 0,
        }
    }

    /// Sets the line stride
    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    /// Sets the buffer count
    pub fn with_buffer_count(mut self, count: u32) -> Self {
        self.buffer_count = count;
        self
    }
}
