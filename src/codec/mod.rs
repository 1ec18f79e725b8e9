//! Codec module - pluggable serialization for protocol messages.
//!
//! The [`Serializer`] contract turns [`Request`]/[`Response`] messages into
//! payload bytes and back; the framing layer never looks inside them. Two
//! implementations ship with the crate:
//!
//! - [`JsonSerializer`] - JSON via `serde_json` (the default)
//! - [`MsgPackSerializer`] - MessagePack via `rmp-serde`
//!
//! Client and server must agree on the serializer; there is no codec
//! negotiation on the wire.
//!
//! # Example
//!
//! ```
//! use wirecall::codec::{JsonSerializer, Serializer};
//! use wirecall::protocol::Response;
//!
//! let serializer = JsonSerializer;
//! let response = Response::success("id-1", serde_json::json!("hi"));
//! let bytes = serializer.encode_response(&response).unwrap();
//! let decoded = serializer.decode_response(&bytes).unwrap();
//! assert_eq!(decoded, response);
//! ```

mod json;
mod msgpack;

pub use json::JsonSerializer;
pub use msgpack::MsgPackSerializer;

use crate::error::Result;
use crate::protocol::{Request, Response};

/// Object↔bytes codec contract.
///
/// Object-safe so one `Arc<dyn Serializer>` can be shared by a client and a
/// server. Decode failures are codec-level errors: the connection that
/// produced the bytes is considered broken.
pub trait Serializer: Send + Sync + 'static {
    /// Serialize a request to payload bytes.
    fn encode_request(&self, request: &Request) -> Result<Vec<u8>>;

    /// Deserialize a request from payload bytes.
    fn decode_request(&self, bytes: &[u8]) -> Result<Request>;

    /// Serialize a response to payload bytes.
    fn encode_response(&self, response: &Response) -> Result<Vec<u8>>;

    /// Deserialize a response from payload bytes.
    fn decode_response(&self, bytes: &[u8]) -> Result<Response>;
}
