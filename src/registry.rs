//! Service registry - name to address lookup.
//!
//! A registry maps a service name to a single static `host:port` address.
//! Servers announce their registered service names on start; clients resolve
//! a name before each connection attempt. There is no health checking, no
//! multiple addresses per name, and no dynamic refresh.
//!
//! Two implementations:
//! - [`LocalRegistry`] - plain in-memory table, miss returns `None`
//! - [`DirectRegistry`] - in-memory table with a configured fallback address
//!   returned on miss (direct-connection setups where every service lives at
//!   one known address)

use dashmap::DashMap;

/// Name → address lookup table for remote services.
pub trait ServiceRegistry: Send + Sync + 'static {
    /// Register an address under a service name. Upsert, last write wins.
    fn register(&self, name: &str, address: &str);

    /// Look up the address for a service name.
    fn discover(&self, name: &str) -> Option<String>;
}

/// In-memory registry; lookups miss when a name was never registered.
#[derive(Debug, Default)]
pub struct LocalRegistry {
    addresses: DashMap<String, String>,
}

impl LocalRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ServiceRegistry for LocalRegistry {
    fn register(&self, name: &str, address: &str) {
        tracing::info!("registering service {} -> {}", name, address);
        self.addresses.insert(name.to_string(), address.to_string());
    }

    fn discover(&self, name: &str) -> Option<String> {
        let address = self.addresses.get(name).map(|entry| entry.value().clone());
        tracing::debug!("discover {} -> {:?}", name, address);
        address
    }
}

/// In-memory registry with a fixed fallback address for unregistered names.
#[derive(Debug)]
pub struct DirectRegistry {
    addresses: DashMap<String, String>,
    default_address: String,
}

impl DirectRegistry {
    /// Create a registry that falls back to `default_address` on miss.
    pub fn new(default_address: impl Into<String>) -> Self {
        let default_address = default_address.into();
        tracing::info!("direct registry with default address {}", default_address);
        Self {
            addresses: DashMap::new(),
            default_address,
        }
    }
}

impl ServiceRegistry for DirectRegistry {
    fn register(&self, name: &str, address: &str) {
        tracing::info!("registering service {} -> {}", name, address);
        self.addresses.insert(name.to_string(), address.to_string());
    }

    fn discover(&self, name: &str) -> Option<String> {
        let address = self
            .addresses
            .get(name)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| self.default_address.clone());
        tracing::debug!("discover {} -> {}", name, address);
        Some(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_miss_is_absent() {
        let registry = LocalRegistry::new();
        assert_eq!(registry.discover("GhostService"), None);
    }

    #[test]
    fn test_register_then_discover() {
        let registry = LocalRegistry::new();
        registry.register("HelloService", "127.0.0.1:9000");
        assert_eq!(
            registry.discover("HelloService").as_deref(),
            Some("127.0.0.1:9000")
        );
    }

    #[test]
    fn test_last_write_wins() {
        let registry = LocalRegistry::new();
        registry.register("HelloService", "127.0.0.1:9000");
        registry.register("HelloService", "127.0.0.1:9001");
        registry.register("HelloService", "10.0.0.7:9002");
        assert_eq!(
            registry.discover("HelloService").as_deref(),
            Some("10.0.0.7:9002")
        );
    }

    #[test]
    fn test_direct_falls_back_on_miss() {
        let registry = DirectRegistry::new("127.0.0.1:9000");
        assert_eq!(
            registry.discover("AnyService").as_deref(),
            Some("127.0.0.1:9000")
        );
    }

    #[test]
    fn test_direct_specific_entry_overrides_fallback() {
        let registry = DirectRegistry::new("127.0.0.1:9000");
        registry.register("HelloService", "127.0.0.1:9100");
        assert_eq!(
            registry.discover("HelloService").as_deref(),
            Some("127.0.0.1:9100")
        );
        assert_eq!(
            registry.discover("OtherService").as_deref(),
            Some("127.0.0.1:9000")
        );
    }
}
