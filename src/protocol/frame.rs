//! Length-prefixed framing.
//!
//! Every message on the wire is a 4-byte big-endian unsigned length followed
//! by that many payload bytes. [`FrameBuffer`] accumulates whatever the
//! transport delivers and yields complete payloads one at a time; partial
//! data stays buffered untouched until the rest arrives, so the decoder
//! works no matter how the socket chunks its reads.
//!
//! # Example
//!
//! ```
//! use wirecall::protocol::{encode_frame, FrameBuffer};
//!
//! let frame = encode_frame(b"payload");
//!
//! let mut buffer = FrameBuffer::new();
//! buffer.push(&frame);
//! let payload = buffer.try_next().unwrap().unwrap();
//! assert_eq!(&payload[..], b"payload");
//! ```

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{Result, RpcError};

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Default maximum payload length (16 MiB).
pub const DEFAULT_MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Encode a payload into a single frame: 4-byte big-endian length + payload.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Buffer for accumulating incoming bytes and extracting complete payloads.
///
/// The length prefix is only peeked until the whole frame is present; on
/// insufficient data nothing is consumed, so a half-delivered frame survives
/// any number of intermediate [`try_next`](FrameBuffer::try_next) calls.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Maximum allowed payload length.
    max_frame_len: u32,
}

impl FrameBuffer {
    /// Create a new frame buffer with the default maximum payload length.
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    /// Create a new frame buffer with a custom maximum payload length.
    pub fn with_max_frame_len(max_frame_len: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            max_frame_len,
        }
    }

    /// Append raw bytes from a socket read.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to extract the next complete payload.
    ///
    /// Returns:
    /// - `Ok(Some(payload))` if a complete frame was buffered; surplus bytes
    ///   stay buffered for the following frame
    /// - `Ok(None)` if more data is needed (nothing consumed)
    /// - `Err(...)` if the length prefix exceeds the configured maximum
    ///
    /// At most one payload is produced per call; loop until `Ok(None)` to
    /// drain everything a read delivered.
    pub fn try_next(&mut self) -> Result<Option<Bytes>> {
        if self.buffer.len() < LENGTH_PREFIX_LEN {
            return Ok(None);
        }

        // Peek the prefix without consuming it.
        let len = u32::from_be_bytes([
            self.buffer[0],
            self.buffer[1],
            self.buffer[2],
            self.buffer[3],
        ]);

        if len > self.max_frame_len {
            return Err(RpcError::Protocol(format!(
                "frame length {} exceeds maximum {}",
                len, self.max_frame_len
            )));
        }

        let total = LENGTH_PREFIX_LEN + len as usize;
        if self.buffer.len() < total {
            return Ok(None);
        }

        self.buffer.advance(LENGTH_PREFIX_LEN);
        Ok(Some(self.buffer.split_to(len as usize).freeze()))
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discard all buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
