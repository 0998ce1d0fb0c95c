//! Chat client
//!
//! Library-level client for the line protocol: dials the server, sends
//! SEND/NAME commands, and decodes incoming server events. The
//! interactive terminal front end in `bin/client.rs` is a thin wrapper
//! over this.

use std::io;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::codec::{FrameReader, FrameWriter};
use crate::error::ProtocolError;
use crate::message::Frame;

/// A connected chat client
pub struct ChatClient {
    reader: FrameReader<OwnedReadHalf>,
    writer: FrameWriter<OwnedWriteHalf>,
    name: String,
}

impl ChatClient {
    /// Dial the server at `addr`.
    pub async fn connect(addr: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: FrameReader::new(read_half),
            writer: FrameWriter::new(write_half),
            name: String::new(),
        })
    }

    /// The nickname most recently requested via [`set_name`](Self::set_name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a nickname with the chat room.
    pub async fn set_name(&mut self, name: &str) -> io::Result<()> {
        self.name = name.to_string();
        self.writer
            .write(&Frame::Name {
                name: name.to_string(),
            })
            .await
    }

    /// Say something to everyone in the chat room.
    pub async fn send_message(&mut self, message: &str) -> io::Result<()> {
        self.writer
            .write(&Frame::Send {
                message: message.to_string(),
            })
            .await
    }

    /// Send an arbitrary frame.
    pub async fn send(&mut self, frame: &Frame) -> io::Result<()> {
        self.writer.write(frame).await
    }

    /// Receive the next server event.
    pub async fn recv(&mut self) -> Result<Frame, ProtocolError> {
        self.reader.read().await
    }

    /// Split into independently usable receive and send halves, for
    /// driving reads and writes from different tasks.
    pub fn split(self) -> (ClientReceiver, ClientSender) {
        (
            ClientReceiver {
                reader: self.reader,
            },
            ClientSender {
                writer: self.writer,
                name: self.name,
            },
        )
    }
}

/// Receive half of a split [`ChatClient`]
pub struct ClientReceiver {
    reader: FrameReader<OwnedReadHalf>,
}

impl ClientReceiver {
    /// Receive the next server event.
    pub async fn recv(&mut self) -> Result<Frame, ProtocolError> {
        self.reader.read().await
    }
}

/// Send half of a split [`ChatClient`]
pub struct ClientSender {
    writer: FrameWriter<OwnedWriteHalf>,
    name: String,
}

impl ClientSender {
    /// The nickname most recently requested via [`set_name`](Self::set_name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a nickname with the chat room.
    pub async fn set_name(&mut self, name: &str) -> io::Result<()> {
        self.name = name.to_string();
        self.writer
            .write(&Frame::Name {
                name: name.to_string(),
            })
            .await
    }

    /// Say something to everyone in the chat room.
    pub async fn send_message(&mut self, message: &str) -> io::Result<()> {
        self.writer
            .write(&Frame::Send {
                message: message.to_string(),
            })
            .await
    }
}
