//! MessagePack serializer using `rmp-serde`.
//!
//! Uses `to_vec_named` so structs are encoded as maps (with field names)
//! rather than positional arrays, keeping the wire shape interchangeable
//! with the JSON serializer's field-name-keyed output.

use crate::error::Result;
use crate::protocol::{Request, Response};

use super::Serializer;

/// MessagePack codec for protocol messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackSerializer;

impl Serializer for MsgPackSerializer {
    fn encode_request(&self, request: &Request) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(request)?)
    }

    fn decode_request(&self, bytes: &[u8]) -> Result<Request> {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    fn encode_response(&self, response: &Response) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(response)?)
    }

    fn decode_response(&self, bytes: &[u8]) -> Result<Response> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_roundtrip() {
        let serializer = MsgPackSerializer;
        let request = Request {
            request_id: "id-1".to_string(),
            interface_name: "CalcService".to_string(),
            method_name: "add".to_string(),
            parameter_types: vec!["i64".to_string(), "i64".to_string()],
            parameters: vec![json!(2), json!(3)],
        };

        let bytes = serializer.encode_request(&request).unwrap();
        let decoded = serializer.decode_request(&bytes).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_response_roundtrip() {
        let serializer = MsgPackSerializer;
        let response = Response::success("id-1", json!({"sum": 5}));

        let bytes = serializer.encode_response(&response).unwrap();
        let decoded = serializer.decode_response(&bytes).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_named_encoding_produces_map_format() {
        let serializer = MsgPackSerializer;
        let response = Response::success("id-1", json!(1));
        let bytes = serializer.encode_response(&response).unwrap();

        // Map format starts with 0x8X (fixmap); array format would be 0x9X.
        assert_eq!(
            bytes[0] & 0xF0,
            0x80,
            "Expected map format (0x8X), got {:02X}",
            bytes[0]
        );
    }

    #[test]
    fn test_decode_error_on_invalid_data() {
        let serializer = MsgPackSerializer;
        assert!(serializer.decode_response(b"\xFF\xFF\xFF").is_err());
    }
}
