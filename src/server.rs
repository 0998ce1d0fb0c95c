//! TCP chat server
//!
//! Owns the listener and the connection registry, accepting connections
//! and spawning one session handler task per client. Accept failures are
//! logged and the loop keeps serving.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::handler::handle_connection;
use crate::registry::Registry;

/// A bound chat server
pub struct ChatServer {
    listener: TcpListener,
    registry: Arc<Registry>,
}

impl ChatServer {
    /// Bind the listener on `addr`; the registry starts empty.
    pub async fn bind(addr: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "listening");
        Ok(Self {
            listener,
            registry: Arc::new(Registry::new()),
        })
    }

    /// The bound address (useful when binding port 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The live-session registry
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Serve connections until the running task is dropped.
    ///
    /// Stopping the accept loop does not cancel sessions already in
    /// flight; they wind down when their own connections do.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!(peer = %addr, "accepted connection");
                    let registry = Arc::clone(&self.registry);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, registry).await {
                            error!(peer = %addr, error = %e, "session ended with error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                }
            }
        }
    }
}
