//! Configuration structs.
//!
//! The core does no file or environment loading; startup glue deserializes
//! whatever source it owns into these structs and passes them in.

use serde::Deserialize;

/// Default call and connect timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Client-side settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// How long a call waits for its response before failing with Timeout.
    pub call_timeout_ms: u64,
    /// How long a connection attempt may take before failing.
    pub connect_timeout_ms: u64,
    /// Fallback address for direct-mode registries. Carried here for startup
    /// glue; the core only reads it when constructing a `DirectRegistry`.
    pub direct_address: Option<String>,
    /// Version suffix applied to proxied interface names.
    pub version: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: DEFAULT_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_TIMEOUT_MS,
            direct_address: None,
            version: None,
        }
    }
}

/// Server-side settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind and to announce to the registry.
    pub host: String,
    /// Port to bind; 0 picks an ephemeral port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.call_timeout_ms, 5000);
        assert_eq!(config.connect_timeout_ms, 5000);
        assert!(config.direct_address.is_none());
        assert!(config.version.is_none());
    }

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"call_timeout_ms": 100, "version": "1.0"}"#).unwrap();
        assert_eq!(config.call_timeout_ms, 100);
        assert_eq!(config.connect_timeout_ms, 5000);
        assert_eq!(config.version.as_deref(), Some("1.0"));
    }
}
