//! # wirecall
//!
//! A lightweight TCP RPC framework: call a method on a remote service
//! through a local interface as if the call were in-process.
//!
//! ## Architecture
//!
//! - **Wire**: 4-byte big-endian length prefix + serialized payload
//! - **Client**: persistent connection per target, pending-call table keyed
//!   by requestId, bounded await per call
//! - **Server**: per-connection read and writer tasks, per-request dispatch
//!   tasks, table-driven method resolution
//! - **Proxy**: the marshalling boundary turning typed calls into requests
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use serde_json::json;
//! use wirecall::client::RpcClient;
//! use wirecall::codec::JsonSerializer;
//! use wirecall::proxy::ProxyFactory;
//! use wirecall::registry::{LocalRegistry, ServiceRegistry};
//! use wirecall::server::{RpcServer, Service};
//!
//! #[tokio::main]
//! async fn main() -> wirecall::Result<()> {
//!     let registry = Arc::new(LocalRegistry::new());
//!     let serializer = Arc::new(JsonSerializer);
//!
//!     let server = RpcServer::new("127.0.0.1", 0, registry.clone(), serializer.clone());
//!     server.register_service("HelloService", Service::builder()
//!         .method("hello", &["String"], |(name,): (String,)| async move {
//!             Ok(format!("Hello, {}!", name))
//!         })
//!         .build());
//!     server.start().await?;
//!
//!     let client = Arc::new(RpcClient::new(registry, serializer));
//!     let proxy = ProxyFactory::new(client).proxy("HelloService");
//!     let greeting: String = proxy.call("hello", &["String"], vec![json!("Ada")]).await?;
//!     assert_eq!(greeting, "Hello, Ada!");
//!
//!     server.stop().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;
pub mod proxy;
pub mod registry;
pub mod server;

pub use client::RpcClient;
pub use codec::{JsonSerializer, MsgPackSerializer, Serializer};
pub use config::{ClientConfig, ServerConfig};
pub use error::{Result, RpcError};
pub use protocol::{Request, Response};
pub use proxy::{ProxyFactory, ServiceProxy};
pub use registry::{DirectRegistry, LocalRegistry, ServiceRegistry};
pub use server::{RpcServer, Service, ServiceBuilder, ServiceError};
