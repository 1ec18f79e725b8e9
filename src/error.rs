//! Error types for wirecall.

use std::time::Duration;

use thiserror::Error;

/// Main error type for all wirecall operations.
#[derive(Debug, Error)]
pub enum RpcError {
    /// No address registered for the requested service name.
    #[error("service not found: {0}")]
    ServiceNotFound(String),

    /// A connection to the target address could not be established or kept active.
    #[error("connection unavailable: {address}: {reason}")]
    ConnectionUnavailable { address: String, reason: String },

    /// Encoding or writing a request failed. The call fails immediately,
    /// without waiting for the response timeout.
    #[error("transport failure: {0}")]
    Transport(String),

    /// No response arrived within the call deadline.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// The remote side answered with a nonzero response code.
    #[error("remote call failed (code {code}): {message}")]
    Call { code: i32, message: String },

    /// Protocol error (oversized frame, invalid state, misuse).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Connection closed while a call was in flight.
    #[error("connection closed")]
    ConnectionClosed,

    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),
}

/// Result type alias using RpcError.
pub type Result<T> = std::result::Result<T, RpcError>;
