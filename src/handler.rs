//! Per-connection session handler
//!
//! Runs the read loop for one accepted connection: decodes commands,
//! tracks the session's nickname, and fans derived events out through
//! the broadcast engine. Owns the whole lifecycle from registration to
//! registry cleanup.

use std::sync::Arc;

use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::broadcast::{broadcast, spawn_broadcast};
use crate::codec::FrameReader;
use crate::error::ProtocolError;
use crate::message::Frame;
use crate::registry::{ClientHandle, Registry};
use crate::types::SessionId;

/// Handle one accepted connection until it disconnects or misbehaves.
///
/// The returned error is for the accept loop's log only; every failure
/// is fully handled here, including deregistration.
pub async fn handle_connection(
    stream: TcpStream,
    registry: Arc<Registry>,
) -> Result<(), ProtocolError> {
    let remote_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let session_id = SessionId::new();
    let (read_half, write_half) = stream.into_split();
    let mut reader = FrameReader::new(read_half);

    registry.register(Arc::new(ClientHandle::new(
        session_id,
        remote_addr.clone(),
        write_half,
    )));
    info!(session = %session_id, peer = %remote_addr, "session started");

    spawn_broadcast(
        Arc::clone(&registry),
        Frame::Online {
            remote_addr: remote_addr.clone(),
        },
    );

    // The nickname is only ever touched by this task. It stays empty
    // until the first NAME command; further NAME commands overwrite it.
    let mut name = String::new();

    loop {
        match reader.read().await {
            Ok(Frame::Send { message }) => {
                spawn_broadcast(
                    Arc::clone(&registry),
                    Frame::Message {
                        name: name.clone(),
                        message,
                    },
                );
            }
            Ok(Frame::Name { name: new_name }) => {
                name = new_name;
                info!(session = %session_id, name = %name, "nickname set");
                spawn_broadcast(
                    Arc::clone(&registry),
                    Frame::Nickname {
                        remote_addr: remote_addr.clone(),
                        name: name.clone(),
                    },
                );
            }
            // server-to-client frames are illegal on this side; tear the
            // session down the same way as a clean disconnect
            Ok(frame) => {
                warn!(session = %session_id, peer = %remote_addr, keyword = frame.keyword(), "received server-only frame");
                broadcast(&registry, &Frame::Leave { name: name.clone() }).await;
                registry.remove(session_id).await;
                return Err(ProtocolError::UnexpectedFrame(frame.keyword()));
            }
            Err(ProtocolError::ConnectionClosed) => {
                debug!(session = %session_id, peer = %remote_addr, "peer disconnected");
                broadcast(&registry, &Frame::Leave { name: name.clone() }).await;
                registry.remove(session_id).await;
                return Ok(());
            }
            // Framing and transport errors leave the stream position
            // unrecoverable: drop the session without a leave
            // announcement.
            Err(e) => {
                registry.remove(session_id).await;
                return Err(e);
            }
        }
    }
}
