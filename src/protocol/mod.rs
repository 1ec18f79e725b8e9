//! Protocol module - wire messages and length-prefixed framing.
//!
//! This module defines what travels on the wire:
//! - [`Request`] / [`Response`] message types with their status codes
//! - 4-byte big-endian length-prefix framing with a resumable decoder

mod frame;
mod message;

pub use frame::{encode_frame, FrameBuffer, DEFAULT_MAX_FRAME_LEN, LENGTH_PREFIX_LEN};
pub use message::{code, Request, Response};
