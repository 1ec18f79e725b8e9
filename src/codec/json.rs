//! JSON serializer using `serde_json`.

use crate::error::Result;
use crate::protocol::{Request, Response};

use super::Serializer;

/// JSON codec for protocol messages. This is the default serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn encode_request(&self, request: &Request) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(request)?)
    }

    fn decode_request(&self, bytes: &[u8]) -> Result<Request> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn encode_response(&self, response: &Response) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(response)?)
    }

    fn decode_response(&self, bytes: &[u8]) -> Result<Response> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_request() -> Request {
        Request {
            request_id: "id-1".to_string(),
            interface_name: "HelloService".to_string(),
            method_name: "hello".to_string(),
            parameter_types: vec!["String".to_string()],
            parameters: vec![json!("Ada")],
        }
    }

    #[test]
    fn test_request_roundtrip() {
        let serializer = JsonSerializer;
        let request = sample_request();

        let bytes = serializer.encode_request(&request).unwrap();
        let decoded = serializer.decode_request(&bytes).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_response_roundtrip() {
        let serializer = JsonSerializer;
        let response = Response::fail("id-1", 500, "boom");

        let bytes = serializer.encode_response(&response).unwrap();
        let decoded = serializer.decode_response(&bytes).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_decode_error_on_invalid_data() {
        let serializer = JsonSerializer;
        assert!(serializer.decode_request(b"not json").is_err());
        assert!(serializer.decode_response(b"not json").is_err());
    }
}
