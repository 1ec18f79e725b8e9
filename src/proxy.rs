//! Dynamic call proxy.
//!
//! The single marshalling boundary between typed interface calls and wire
//! messages. A [`ProxyFactory`] turns an interface identity (plus an
//! optional version) into a [`ServiceProxy`]; each
//! [`call`](ServiceProxy::call) builds a request with a fresh requestId,
//! delegates to the client engine, and converts the response: nonzero
//! codes into [`RpcError::Call`], success data into the declared return
//! type.
//!
//! A typed remote interface is a trait with exactly one network-backed
//! implementor wrapping a proxy:
//!
//! ```ignore
//! trait HelloApi {
//!     async fn hello(&self, name: &str) -> wirecall::Result<String>;
//! }
//!
//! struct HelloRemote {
//!     proxy: ServiceProxy,
//! }
//!
//! impl HelloApi for HelloRemote {
//!     async fn hello(&self, name: &str) -> wirecall::Result<String> {
//!         self.proxy.call("hello", &["String"], vec![json!(name)]).await
//!     }
//! }
//!
//! let factory = ProxyFactory::new(client);
//! let hello = HelloRemote { proxy: factory.proxy("HelloService") };
//! ```
//!
//! Identity, equality, and string rendering of a proxy handle are local
//! trait implementations (`Debug`, `Display`, `PartialEq`) and produce no
//! network traffic.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::client::RpcClient;
use crate::error::{Result, RpcError};
use crate::protocol::{code, Request};

/// Factory producing call-translating proxies bound to one client.
///
/// Replaces annotation-driven injection: external wiring calls
/// [`proxy`](ProxyFactory::proxy) and assigns the result explicitly.
#[derive(Clone)]
pub struct ProxyFactory {
    client: Arc<RpcClient>,
    version: Option<String>,
}

impl ProxyFactory {
    /// Create a factory producing unversioned proxies.
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self {
            client,
            version: None,
        }
    }

    /// Create a factory whose proxies target versioned interface names
    /// (`name-version`).
    pub fn with_version(client: Arc<RpcClient>, version: impl Into<String>) -> Self {
        Self {
            client,
            version: Some(version.into()),
        }
    }

    /// Produce a proxy for the given interface identity.
    pub fn proxy(&self, interface: &str) -> ServiceProxy {
        let interface_name = match &self.version {
            Some(version) => format!("{}-{}", interface, version),
            None => interface.to_string(),
        };
        ServiceProxy {
            client: self.client.clone(),
            interface_name,
        }
    }
}

impl fmt::Debug for ProxyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyFactory")
            .field("version", &self.version)
            .finish()
    }
}

/// A call-translating handle for one remote interface.
#[derive(Clone)]
pub struct ServiceProxy {
    client: Arc<RpcClient>,
    interface_name: String,
}

impl ServiceProxy {
    /// The (possibly versioned) interface name this proxy targets.
    pub fn interface_name(&self) -> &str {
        &self.interface_name
    }

    /// Invoke a remote method and coerce its result to `R`.
    ///
    /// Generates a fresh requestId, builds the request, and awaits the
    /// client engine. A nonzero response code becomes [`RpcError::Call`]
    /// carrying the response message.
    pub async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        parameter_types: &[&str],
        parameters: Vec<Value>,
    ) -> Result<R> {
        let request = Request {
            request_id: Uuid::new_v4().to_string(),
            interface_name: self.interface_name.clone(),
            method_name: method.to_string(),
            parameter_types: parameter_types.iter().map(|t| t.to_string()).collect(),
            parameters,
        };
        tracing::debug!(
            "calling {}.{} (request {})",
            self.interface_name,
            method,
            request.request_id
        );

        let response = self.client.send(request).await?;
        if response.code != code::OK {
            return Err(RpcError::Call {
                code: response.code,
                message: response
                    .message
                    .unwrap_or_else(|| "remote call failed".to_string()),
            });
        }
        Ok(serde_json::from_value(response.data)?)
    }
}

impl fmt::Debug for ServiceProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProxy")
            .field("interface_name", &self.interface_name)
            .finish()
    }
}

impl fmt::Display for ServiceProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proxy({})", self.interface_name)
    }
}

impl PartialEq for ServiceProxy {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.client, &other.client) && self.interface_name == other.interface_name
    }
}

impl Eq for ServiceProxy {}
