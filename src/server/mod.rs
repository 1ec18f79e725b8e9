//! RPC server engine.
//!
//! [`RpcServer`] accepts TCP connections and serves requests against its
//! registered [`Service`] tables. Per connection: one read task feeds the
//! frame decoder, one writer task drains an outbound channel onto the
//! socket, and every decoded request is handed to its own task, so a slow
//! or hanging method never stalls reads for other requests on the same or
//! other connections.
//!
//! Application-level failures (unknown service, signature mismatch, handler
//! errors) become failure responses and leave the connection open; only
//! transport or codec errors close it.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wirecall::registry::LocalRegistry;
//! use wirecall::codec::JsonSerializer;
//! use wirecall::server::{RpcServer, Service};
//!
//! let server = RpcServer::new("127.0.0.1", 9000, registry, Arc::new(JsonSerializer));
//! server.register_service("HelloService", Service::builder()
//!     .method("hello", &["String"], |(name,): (String,)| async move {
//!         Ok(format!("Hello, {}!", name))
//!     })
//!     .build());
//! let addr = server.start().await?;
//! // ...
//! server.stop().await;
//! ```

mod service;

pub use service::{BoxFuture, MethodHandler, Service, ServiceBuilder, ServiceError};

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::{JoinHandle, JoinSet};

use crate::codec::Serializer;
use crate::config::ServerConfig;
use crate::error::{Result, RpcError};
use crate::protocol::{code, encode_frame, FrameBuffer, Request, Response};
use crate::registry::ServiceRegistry;

/// Socket read buffer size.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Capacity of each connection's outbound response channel.
const OUTBOUND_CHANNEL_CAPACITY: usize = 64;

/// Shared service table: interface name → method table.
type ServiceTable = DashMap<String, Arc<Service>>;

/// RPC server: connection acceptance and per-request dispatch.
pub struct RpcServer {
    host: String,
    port: u16,
    registry: Arc<dyn ServiceRegistry>,
    serializer: Arc<dyn Serializer>,
    services: Arc<ServiceTable>,
    state: Mutex<Option<ServerState>>,
}

struct ServerState {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    accept_task: JoinHandle<()>,
}

impl RpcServer {
    /// Create a server that will bind `host:port`. Port 0 picks an
    /// ephemeral port, reported by [`start`](RpcServer::start).
    pub fn new(
        host: impl Into<String>,
        port: u16,
        registry: Arc<dyn ServiceRegistry>,
        serializer: Arc<dyn Serializer>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            registry,
            serializer,
            services: Arc::new(DashMap::new()),
            state: Mutex::new(None),
        }
    }

    /// Create a server from a [`ServerConfig`].
    pub fn with_config(
        config: ServerConfig,
        registry: Arc<dyn ServiceRegistry>,
        serializer: Arc<dyn Serializer>,
    ) -> Self {
        Self::new(config.host, config.port, registry, serializer)
    }

    /// Register a service instance under an interface name (optionally
    /// already suffixed with a version). Call before [`start`]: only names
    /// present at start are announced to the registry.
    ///
    /// [`start`]: RpcServer::start
    pub fn register_service(&self, name: impl Into<String>, service: Service) {
        let name = name.into();
        tracing::info!("registering service {}", name);
        self.services.insert(name, Arc::new(service));
    }

    /// Bind the listener, announce every registered service name under the
    /// bound address, and spawn the accept loop. Returns the bound address.
    pub async fn start(&self) -> Result<SocketAddr> {
        let mut state = self.state.lock().await;
        if state.is_some() {
            return Err(RpcError::Protocol("server already started".to_string()));
        }

        let bind_addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&bind_addr).await?;
        let local_addr = listener.local_addr()?;

        let announce_addr = format!("{}:{}", self.host, local_addr.port());
        for entry in self.services.iter() {
            self.registry.register(entry.key(), &announce_addr);
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let accept_task = tokio::spawn(accept_loop(
            listener,
            shutdown_rx,
            self.services.clone(),
            self.serializer.clone(),
        ));

        tracing::info!("RPC server listening on {}", local_addr);
        *state = Some(ServerState {
            local_addr,
            shutdown_tx,
            accept_task,
        });
        Ok(local_addr)
    }

    /// Stop accepting and tear down connection tasks. Registry entries are
    /// not removed; stale addresses surface as connection failures on the
    /// next call that resolves them.
    pub async fn stop(&self) {
        let state = self.state.lock().await.take();
        if let Some(state) = state {
            let _ = state.shutdown_tx.send(());
            let _ = state.accept_task.await;
            tracing::info!("RPC server stopped");
        }
    }

    /// The bound address, if the server was started.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.state.lock().await.as_ref().map(|s| s.local_addr)
    }
}

impl std::fmt::Debug for RpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcServer")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("services", &self.services.len())
            .finish()
    }
}

/// Accept connections until shutdown. Dropping the task set on exit aborts
/// the remaining per-connection tasks.
async fn accept_loop(
    listener: TcpListener,
    mut shutdown_rx: oneshot::Receiver<()>,
    services: Arc<ServiceTable>,
    serializer: Arc<dyn Serializer>,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::debug!("accepted connection from {}", peer);
                    connections.spawn(handle_connection(
                        stream,
                        peer,
                        services.clone(),
                        serializer.clone(),
                    ));
                }
                Err(e) => {
                    tracing::warn!("accept failed: {}", e);
                }
            },
            _ = &mut shutdown_rx => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }
}

/// Serve one connection: decode requests off the read path, dispatch each in
/// its own task, serialize responses through the writer task.
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    services: Arc<ServiceTable>,
    serializer: Arc<dyn Serializer>,
) {
    let (mut reader, writer) = stream.into_split();

    // Dispatch tasks complete in any order; the writer task serializes their
    // response frames onto the socket.
    let (outbound_tx, outbound_rx) = mpsc::channel::<Bytes>(OUTBOUND_CHANNEL_CAPACITY);
    tokio::spawn(write_loop(writer, outbound_rx, peer));

    let mut decoder = FrameBuffer::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    'read: loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                tracing::error!("read from {} failed: {}", peer, e);
                break;
            }
        };

        decoder.push(&buf[..n]);
        loop {
            match decoder.try_next() {
                Ok(Some(payload)) => {
                    let request = match serializer.decode_request(&payload) {
                        Ok(request) => request,
                        Err(e) => {
                            tracing::error!("failed to decode request from {}: {}", peer, e);
                            break 'read;
                        }
                    };

                    // Off the read path: a hanging method must not stall
                    // reads for the requests behind it.
                    let services = services.clone();
                    let serializer = serializer.clone();
                    let outbound = outbound_tx.clone();
                    tokio::spawn(async move {
                        let response = dispatch(&services, request).await;
                        match serializer.encode_response(&response) {
                            Ok(payload) => {
                                let _ = outbound.send(Bytes::from(encode_frame(&payload))).await;
                            }
                            Err(e) => {
                                tracing::error!("failed to encode response: {}", e);
                            }
                        }
                    });
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("protocol error on connection from {}: {}", peer, e);
                    break 'read;
                }
            }
        }
    }

    tracing::debug!("connection from {} closed", peer);
}

/// Drain outbound frames onto the socket.
async fn write_loop(mut writer: OwnedWriteHalf, mut outbound: mpsc::Receiver<Bytes>, peer: SocketAddr) {
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = writer.write_all(&frame).await {
            tracing::error!("write to {} failed: {}", peer, e);
            return;
        }
    }
}

/// Resolve and invoke one request. Every failure becomes a failure response;
/// nothing from here ever breaks the connection.
async fn dispatch(services: &ServiceTable, request: Request) -> Response {
    let Request {
        request_id,
        interface_name,
        method_name,
        parameter_types,
        parameters,
    } = request;

    let service = match services.get(&interface_name) {
        Some(entry) => entry.value().clone(),
        None => {
            tracing::warn!(
                "request {} for unknown service {}",
                request_id,
                interface_name
            );
            return Response::fail(request_id, code::SERVICE_NOT_FOUND, "service not found");
        }
    };

    let handler = match service.resolve(&method_name, &parameter_types) {
        Some(handler) => handler,
        None => {
            let signature = format!("{}({})", method_name, parameter_types.join(", "));
            tracing::warn!(
                "request {}: no method {} on service {}",
                request_id,
                signature,
                interface_name
            );
            return Response::fail(
                request_id,
                code::INVOCATION_FAILED,
                format!("no method matching {} on service {}", signature, interface_name),
            );
        }
    };

    match handler.invoke(parameters).await {
        Ok(data) => Response::success(request_id, data),
        Err(e) => {
            tracing::warn!("request {}: invocation failed: {}", request_id, e);
            Response::fail(request_id, code::INVOCATION_FAILED, e.to_string())
        }
    }
}
