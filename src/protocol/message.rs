//! Request and response message types.
//!
//! These are the only two payloads that ever travel inside a frame:
//! a [`Request`] from client to server, a [`Response`] back. Field names on
//! the wire are camelCase. Parameter and result values are opaque JSON
//! values; giving them concrete types is the job of the proxy layer on the
//! client and the method table on the server.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response status codes.
pub mod code {
    /// Call succeeded.
    pub const OK: i32 = 0;
    /// No service registered under the requested interface name.
    pub const SERVICE_NOT_FOUND: i32 = 404;
    /// Method resolution or invocation failed on the server.
    pub const INVOCATION_FAILED: i32 = 500;
}

/// A remote method invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Correlation token, unique among calls outstanding on one client.
    pub request_id: String,
    /// Service identity, optionally suffixed with a version (`name-version`).
    pub interface_name: String,
    /// Method to invoke.
    pub method_name: String,
    /// Ordered signature descriptors, matched exactly on the server.
    pub parameter_types: Vec<String>,
    /// Ordered argument values.
    pub parameters: Vec<Value>,
}

/// The outcome of a remote method invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Echoes the originating request's correlation token.
    pub request_id: String,
    /// 0 on success, nonzero failure category otherwise.
    pub code: i32,
    /// Human-readable failure text, absent on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Result payload, null on failure.
    #[serde(default)]
    pub data: Value,
}

impl Response {
    /// Build a success response carrying a result payload.
    pub fn success(request_id: impl Into<String>, data: Value) -> Self {
        Self {
            request_id: request_id.into(),
            code: code::OK,
            message: None,
            data,
        }
    }

    /// Build a failure response with a status code and message.
    pub fn fail(request_id: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            code,
            message: Some(message.into()),
            data: Value::Null,
        }
    }

    /// Whether this response reports success.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.code == code::OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_field_names_are_camel_case() {
        let request = Request {
            request_id: "id-1".to_string(),
            interface_name: "HelloService".to_string(),
            method_name: "hello".to_string(),
            parameter_types: vec!["String".to_string()],
            parameters: vec![json!("Ada")],
        };

        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(encoded["requestId"], json!("id-1"));
        assert_eq!(encoded["interfaceName"], json!("HelloService"));
        assert_eq!(encoded["methodName"], json!("hello"));
        assert_eq!(encoded["parameterTypes"], json!(["String"]));
        assert_eq!(encoded["parameters"], json!(["Ada"]));
    }

    #[test]
    fn test_success_response_omits_message() {
        let response = Response::success("id-1", json!("Hello, Ada!"));

        assert_eq!(response.code, code::OK);
        assert!(response.is_ok());

        let encoded = serde_json::to_value(&response).unwrap();
        assert!(encoded.get("message").is_none());
        assert_eq!(encoded["data"], json!("Hello, Ada!"));
    }

    #[test]
    fn test_fail_response_carries_code_and_message() {
        let response = Response::fail("id-2", code::SERVICE_NOT_FOUND, "service not found");

        assert!(!response.is_ok());
        assert_eq!(response.code, 404);
        assert_eq!(response.message.as_deref(), Some("service not found"));
        assert_eq!(response.data, Value::Null);
    }

    #[test]
    fn test_response_roundtrip() {
        let original = Response::success("id-3", json!({"answer": 42}));
        let bytes = serde_json::to_vec(&original).unwrap();
        let decoded: Response = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_request_roundtrip() {
        let original = Request {
            request_id: "id-4".to_string(),
            interface_name: "CalcService-1.0".to_string(),
            method_name: "add".to_string(),
            parameter_types: vec!["i64".to_string(), "i64".to_string()],
            parameters: vec![json!(2), json!(3)],
        };
        let bytes = serde_json::to_vec(&original).unwrap();
        let decoded: Request = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, original);
    }
}
