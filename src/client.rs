//! RPC client engine.
//!
//! [`RpcClient`] owns the connection map and the pending-call table. A call
//! runs through [`send`](RpcClient::send):
//! 1. Resolve the target address via the registry
//! 2. Reuse the active connection to that address, or dial a new one
//! 3. Register a pending-call entry, then frame and write the request
//! 4. Await the response with a bounded timeout
//!
//! Each connection runs one inbound-read task; it is the only place that
//! fulfills pending calls, by correlating decoded responses to their
//! requestId. Responses may arrive in any order relative to sends; every
//! caller only ever observes its own response.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wirecall::client::RpcClient;
//! use wirecall::codec::JsonSerializer;
//! use wirecall::registry::LocalRegistry;
//!
//! let registry = Arc::new(LocalRegistry::new());
//! registry.register("HelloService", "127.0.0.1:9000");
//! let client = RpcClient::new(registry, Arc::new(JsonSerializer));
//! let response = client.send(request).await?;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::codec::Serializer;
use crate::config::ClientConfig;
use crate::error::{Result, RpcError};
use crate::protocol::{encode_frame, FrameBuffer, Request, Response};
use crate::registry::ServiceRegistry;

/// Socket read buffer size.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Outstanding calls awaiting their response, keyed by requestId.
type PendingCalls = DashMap<String, oneshot::Sender<Response>>;

/// RPC client: connection management, request correlation, awaiting call
/// semantics.
///
/// Cheap to share behind an `Arc`; all tables are concurrent maps scoped to
/// this instance.
pub struct RpcClient {
    registry: Arc<dyn ServiceRegistry>,
    serializer: Arc<dyn Serializer>,
    /// One connection per target, keyed by `host:port`.
    connections: DashMap<String, Arc<Connection>>,
    pending: Arc<PendingCalls>,
    call_timeout: Duration,
    connect_timeout: Duration,
}

impl RpcClient {
    /// Create a client with default timeouts.
    pub fn new(registry: Arc<dyn ServiceRegistry>, serializer: Arc<dyn Serializer>) -> Self {
        Self::with_config(registry, serializer, ClientConfig::default())
    }

    /// Create a client with explicit settings.
    pub fn with_config(
        registry: Arc<dyn ServiceRegistry>,
        serializer: Arc<dyn Serializer>,
        config: ClientConfig,
    ) -> Self {
        Self {
            registry,
            serializer,
            connections: DashMap::new(),
            pending: Arc::new(DashMap::new()),
            call_timeout: Duration::from_millis(config.call_timeout_ms),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
        }
    }

    /// Send a request and await its response.
    ///
    /// # Errors
    ///
    /// - [`RpcError::ServiceNotFound`] if the registry has no address for
    ///   `request.interface_name`
    /// - [`RpcError::ConnectionUnavailable`] if no active connection could be
    ///   established
    /// - [`RpcError::Transport`] if encoding or writing the request failed;
    ///   the call fails immediately, no timeout is spent
    /// - [`RpcError::Timeout`] if no response arrived within the deadline
    pub async fn send(&self, request: Request) -> Result<Response> {
        let address = self
            .registry
            .discover(&request.interface_name)
            .ok_or_else(|| RpcError::ServiceNotFound(request.interface_name.clone()))?;

        let connection = self.connection(&address).await?;

        // The pending entry must exist before any byte leaves: a response can
        // arrive the instant the request hits the wire.
        let (tx, rx) = oneshot::channel();
        self.pending.insert(request.request_id.clone(), tx);

        let frame = match self.serializer.encode_request(&request) {
            Ok(payload) => encode_frame(&payload),
            Err(e) => {
                self.pending.remove(&request.request_id);
                return Err(RpcError::Transport(format!(
                    "request encoding failed: {}",
                    e
                )));
            }
        };

        if let Err(e) = connection.write_frame(&frame).await {
            self.pending.remove(&request.request_id);
            connection.mark_inactive();
            tracing::error!("write to {} failed: {}", address, e);
            return Err(RpcError::Transport(e.to_string()));
        }
        tracing::debug!("sent request {} to {}", request.request_id, address);

        match timeout(self.call_timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => {
                self.pending.remove(&request.request_id);
                Err(RpcError::ConnectionClosed)
            }
            Err(_) => {
                // A response arriving after this removal finds no entry and
                // is discarded by the read task.
                self.pending.remove(&request.request_id);
                tracing::warn!(
                    "request {} timed out after {:?}",
                    request.request_id,
                    self.call_timeout
                );
                Err(RpcError::Timeout(self.call_timeout))
            }
        }
    }

    /// Number of calls currently awaiting a response.
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }

    /// Drop all connections. In-flight calls run into their timeouts;
    /// subsequent calls dial fresh connections.
    pub fn close(&self) {
        tracing::info!("closing RPC client");
        self.connections.clear();
    }

    /// Get the active connection for `address`, dialing one if none exists
    /// or the existing one went inactive.
    async fn connection(&self, address: &str) -> Result<Arc<Connection>> {
        let existing = self
            .connections
            .get(address)
            .map(|entry| entry.value().clone());
        if let Some(connection) = existing {
            if connection.is_active() {
                return Ok(connection);
            }
            // Broken connection: discard and dial fresh. No retry/backoff.
            self.connections.remove(address);
        }

        let stream = match timeout(self.connect_timeout, TcpStream::connect(address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(RpcError::ConnectionUnavailable {
                    address: address.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(RpcError::ConnectionUnavailable {
                    address: address.to_string(),
                    reason: format!("connect timed out after {:?}", self.connect_timeout),
                })
            }
        };

        let (read_half, write_half) = stream.into_split();
        let active = Arc::new(AtomicBool::new(true));
        let read_task = spawn_read_task(
            address.to_string(),
            read_half,
            self.pending.clone(),
            self.serializer.clone(),
            active.clone(),
        );

        let connection = Arc::new(Connection {
            writer: Mutex::new(write_half),
            active,
            read_task,
        });
        self.connections
            .insert(address.to_string(), connection.clone());
        tracing::info!("connected to {}", address);
        Ok(connection)
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("connections", &self.connections.len())
            .field("pending", &self.pending.len())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

/// One established connection: exactly one transport, write half guarded for
/// exclusive access, read half owned by the inbound-read task.
struct Connection {
    writer: Mutex<OwnedWriteHalf>,
    active: Arc<AtomicBool>,
    read_task: JoinHandle<()>,
}

impl Connection {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn mark_inactive(&self) {
        self.active.store(false, Ordering::Release);
    }

    async fn write_frame(&self, frame: &[u8]) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(frame).await?;
        writer.flush().await
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.read_task.abort();
    }
}

/// Spawn the inbound-read task for a connection. It is the only writer that
/// fulfills pending calls.
fn spawn_read_task(
    address: String,
    mut reader: OwnedReadHalf,
    pending: Arc<PendingCalls>,
    serializer: Arc<dyn Serializer>,
    active: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut decoder = FrameBuffer::new();
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        'read: loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) => {
                    tracing::debug!("connection to {} closed by peer", address);
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    tracing::error!("read from {} failed: {}", address, e);
                    break;
                }
            };

            decoder.push(&buf[..n]);
            loop {
                match decoder.try_next() {
                    Ok(Some(payload)) => {
                        let response = match serializer.decode_response(&payload) {
                            Ok(response) => response,
                            Err(e) => {
                                tracing::error!(
                                    "failed to decode response from {}: {}",
                                    address,
                                    e
                                );
                                break 'read;
                            }
                        };
                        complete(&pending, response);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!("protocol error on connection to {}: {}", address, e);
                        break 'read;
                    }
                }
            }
        }

        active.store(false, Ordering::Release);
    })
}

/// Hand a decoded response to its waiting caller, or discard it.
fn complete(pending: &PendingCalls, response: Response) {
    match pending.remove(&response.request_id) {
        Some((_, tx)) => {
            // The caller may have timed out between our removal and this
            // send; a dropped receiver is not an error.
            let _ = tx.send(response);
        }
        None => {
            tracing::warn!(
                "discarding response for unknown request {}",
                response.request_id
            );
        }
    }
}
