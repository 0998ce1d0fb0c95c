//! Multi-Client TCP Chat Library
//!
//! A chat service where a server accepts TCP connections, keeps a
//! registry of live sessions, and rebroadcasts chat events to every
//! connected client.
//!
//! # Wire protocol
//! Each frame is one LF-terminated line: an ASCII keyword, a space, then
//! space-separated fields. Six shapes cover the whole protocol: `SEND`
//! and `NAME` travel client → server; `MESSAGE`, `ONLINE`, `LEAVE` and
//! `NICKNAME` travel server → clients. Free chat text is percent-escaped
//! so it can never corrupt framing.
//!
//! # Architecture
//! - One task per accepted connection runs the session handler loop.
//! - The registry is the only shared state, behind a single lock.
//! - Every broadcast runs as its own detached task: delivery is best
//!   effort, per recipient, with no cross-recipient ordering guarantee.
//!
//! # Example
//! ```ignore
//! use linechat::{ChatClient, ChatServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = ChatServer::bind("127.0.0.1:3333").await?;
//!     tokio::spawn(server.run());
//!
//!     let mut client = ChatClient::connect("127.0.0.1:3333").await?;
//!     client.set_name("alice").await?;
//!     client.send_message("hello").await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod client;
pub mod codec;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use client::{ChatClient, ClientReceiver, ClientSender};
pub use codec::{FrameReader, FrameWriter};
pub use error::ProtocolError;
pub use handler::handle_connection;
pub use message::Frame;
pub use registry::{ClientHandle, Registry};
pub use server::ChatServer;
pub use types::SessionId;
