//! Connection registry
//!
//! The one piece of shared server state: the set of live sessions, keyed
//! by session identity and guarded by a single lock. Callers never see
//! the container itself, only `register`/`remove`/`snapshot`.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::AsyncWrite;
use tracing::{debug, info};

use crate::codec::FrameWriter;
use crate::message::Frame;
use crate::types::SessionId;

type Sink = Box<dyn AsyncWrite + Send + Unpin>;

/// Write-side handle for one live session
///
/// Shared between the session's own handler task and concurrent broadcast
/// tasks; the encoder sits behind an async mutex so a frame is always
/// written whole.
pub struct ClientHandle {
    /// Identity of the owning session
    pub id: SessionId,
    /// Socket-derived peer address, as carried in ONLINE/NICKNAME frames
    pub remote_addr: String,
    writer: tokio::sync::Mutex<FrameWriter<Sink>>,
}

impl ClientHandle {
    /// Create a handle over the write side of an accepted connection
    pub fn new(
        id: SessionId,
        remote_addr: String,
        sink: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        Self {
            id,
            remote_addr,
            writer: tokio::sync::Mutex::new(FrameWriter::new(Box::new(sink))),
        }
    }

    /// Encode and send one frame to this session's peer
    pub async fn send(&self, frame: &Frame) -> io::Result<()> {
        self.writer.lock().await.write(frame).await
    }

    async fn shutdown(&self) -> io::Result<()> {
        self.writer.lock().await.shutdown().await
    }
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandle")
            .field("id", &self.id)
            .field("remote_addr", &self.remote_addr)
            .finish_non_exhaustive()
    }
}

/// The set of all live sessions on one server instance
///
/// Mutation and iteration are serialized behind a single lock; the lock
/// is never held across I/O. Removal is idempotent and closes the
/// underlying connection.
#[derive(Debug, Default)]
pub struct Registry {
    clients: Mutex<HashMap<SessionId, Arc<ClientHandle>>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session to the live set
    pub fn register(&self, handle: Arc<ClientHandle>) {
        let mut clients = self.clients.lock();
        clients.insert(handle.id, handle);
        debug!(total = clients.len(), "registered session");
    }

    /// Remove a session by identity, closing its connection
    ///
    /// Safe to call for a session that was already removed or never
    /// registered. Close errors are reported, not propagated.
    pub async fn remove(&self, id: SessionId) {
        let removed = self.clients.lock().remove(&id);
        if let Some(handle) = removed {
            info!(peer = %handle.remote_addr, "closing connection");
            if let Err(e) = handle.shutdown().await {
                debug!(peer = %handle.remote_addr, error = %e, "error closing connection");
            }
        }
    }

    /// Copy of the current members, for broadcast fan-out
    ///
    /// Copying under the lock and releasing before any I/O keeps a single
    /// broadcast from ever seeing a torn iteration while sessions are
    /// concurrently removed.
    pub fn snapshot(&self) -> Vec<Arc<ClientHandle>> {
        self.clients.lock().values().cloned().collect()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    /// Whether no sessions are live
    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, DuplexStream};

    fn test_handle(id: SessionId) -> (Arc<ClientHandle>, DuplexStream) {
        let (sink, peer) = duplex(1024);
        let handle = Arc::new(ClientHandle::new(id, "127.0.0.1:4000".to_string(), sink));
        (handle, peer)
    }

    #[tokio::test]
    async fn test_register_and_snapshot() {
        let registry = Registry::new();
        let id = SessionId::new();
        let (handle, _peer) = test_handle(id);

        registry.register(handle);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot()[0].id, id);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = Registry::new();
        let id = SessionId::new();
        let (handle, _peer) = test_handle(id);
        registry.register(handle);

        registry.remove(id).await;
        assert!(registry.is_empty());

        // removing again, or removing a session that never existed, is a
        // no-op
        registry.remove(id).await;
        registry.remove(SessionId::new()).await;
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_remove_closes_the_connection() {
        let registry = Registry::new();
        let id = SessionId::new();
        let (handle, mut peer) = test_handle(id);
        registry.register(handle);

        registry.remove(id).await;

        let mut buf = Vec::new();
        let n = peer.read_to_end(&mut buf).await.unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn test_concurrent_registration() {
        let registry = Arc::new(Registry::new());

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                let (handle, peer) = test_handle(SessionId::new());
                registry.register(handle);
                peer
            }));
        }

        // keep the peers alive until every registration has landed
        let mut peers = Vec::new();
        for task in tasks {
            peers.push(task.await.unwrap());
        }

        assert_eq!(registry.len(), 16);
    }
}
