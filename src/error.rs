//! Error types for the chat service
//!
//! Defines the protocol-level error taxonomy.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Protocol and transport errors
///
/// Everything that can go wrong while reading or writing frames. All of
/// these terminate the affected connection; none of them are ever echoed
/// back over the wire.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The peer closed the stream cleanly (normal disconnect)
    #[error("connection closed")]
    ConnectionClosed,

    /// The leading token of a frame matched no known keyword (fatal:
    /// stream position is unrecoverable afterwards)
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    /// A known keyword arrived with missing or undecodable fields
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// A server-to-client frame arrived on the server's read side
    #[error("unexpected {0} frame")]
    UnexpectedFrame(&'static str),

    /// Transport failure on the underlying stream (fatal)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
