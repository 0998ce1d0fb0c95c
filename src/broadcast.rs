//! Broadcast engine
//!
//! Fans one event out to every live session. Delivery is best effort: a
//! failed send is logged and skipped, never retried, and never removes
//! the recipient. The recipient's own handler notices the dead connection
//! on its read side and deregisters itself.

use std::sync::Arc;

use tracing::warn;

use crate::message::Frame;
use crate::registry::Registry;

/// Attempt to deliver one frame to every session currently registered.
pub async fn broadcast(registry: &Registry, frame: &Frame) {
    for client in registry.snapshot() {
        if let Err(e) = client.send(frame).await {
            warn!(peer = %client.remote_addr, error = %e, "failed to deliver broadcast");
        }
    }
}

/// Dispatch a broadcast on its own task.
///
/// Keeps a slow or blocked recipient from stalling the caller's read
/// loop. Broadcasts spawned concurrently may reach different recipients
/// in different relative orders.
pub fn spawn_broadcast(registry: Arc<Registry>, frame: Frame) {
    tokio::spawn(async move {
        broadcast(&registry, &frame).await;
    });
}
