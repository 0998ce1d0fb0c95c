//! Line-oriented frame codec
//!
//! Each frame is one LF-terminated line: an ASCII keyword, a space, then
//! the frame's fields. Intermediate fields run to the next literal space,
//! the final field runs to the line terminator. Only the free-text
//! `message` field of `MESSAGE` is percent-escaped, because raw chat text
//! may itself contain spaces and newlines; `name` and `remote_addr` are
//! locally- or socket-derived and written verbatim.

use std::io;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::ProtocolError;
use crate::message::Frame;

/// Bytes escaped in free chat text: controls (including LF and CR), the
/// field separator, and the escape character itself.
const TEXT_ESCAPE: &AsciiSet = &CONTROLS.add(b' ').add(b'%');

/// Escape free-form chat text for embedding as the final frame field.
fn escape(text: &str) -> String {
    utf8_percent_encode(text, TEXT_ESCAPE).to_string()
}

/// Reverse [`escape`]. Fails if the decoded bytes are not valid UTF-8.
fn unescape(text: &str) -> Result<String, ProtocolError> {
    percent_decode_str(text)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| ProtocolError::MalformedFrame(format!("invalid escaped text: {e}")))
}

/// Encode one frame, including the trailing line terminator.
pub fn encode(frame: &Frame) -> String {
    match frame {
        Frame::Send { message } => format!("SEND {message}\n"),
        Frame::Name { name } => format!("NAME {name}\n"),
        Frame::Message { name, message } => format!("MESSAGE {name} {}\n", escape(message)),
        Frame::Online { remote_addr } => format!("ONLINE {remote_addr}\n"),
        Frame::Leave { name } => format!("LEAVE {name}\n"),
        Frame::Nickname { remote_addr, name } => format!("NICKNAME {remote_addr} {name}\n"),
    }
}

/// Parse one frame from a line with the terminator already stripped.
///
/// Keywords match exactly, including their trailing space: a line with no
/// space at all cannot carry any frame and is an unknown command.
pub fn parse(line: &str) -> Result<Frame, ProtocolError> {
    let Some((keyword, rest)) = line.split_once(' ') else {
        return Err(ProtocolError::UnknownCommand(line.to_string()));
    };

    match keyword {
        "SEND" => Ok(Frame::Send {
            message: rest.to_string(),
        }),
        "NAME" => Ok(Frame::Name {
            name: rest.to_string(),
        }),
        "MESSAGE" => {
            let Some((name, escaped)) = rest.split_once(' ') else {
                return Err(ProtocolError::MalformedFrame(
                    "MESSAGE frame is missing its message field".to_string(),
                ));
            };
            Ok(Frame::Message {
                name: name.to_string(),
                message: unescape(escaped)?,
            })
        }
        "ONLINE" => Ok(Frame::Online {
            remote_addr: rest.to_string(),
        }),
        "LEAVE" => Ok(Frame::Leave {
            name: rest.to_string(),
        }),
        "NICKNAME" => {
            let Some((remote_addr, name)) = rest.split_once(' ') else {
                return Err(ProtocolError::MalformedFrame(
                    "NICKNAME frame is missing its name field".to_string(),
                ));
            };
            Ok(Frame::Nickname {
                remote_addr: remote_addr.to_string(),
                name: name.to_string(),
            })
        }
        _ => Err(ProtocolError::UnknownCommand(keyword.to_string())),
    }
}

/// Decodes frames from the read side of a connection
///
/// Consumes exactly one line per call; escaping guarantees a frame never
/// spans lines.
pub struct FrameReader<R> {
    reader: BufReader<R>,
    line: String,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wrap the read side of a connection
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            line: String::new(),
        }
    }

    /// Read and decode the next frame.
    ///
    /// Returns `ConnectionClosed` on a clean end of stream. A trailing
    /// fragment with no line terminator is a truncated stream: the
    /// fragment is discarded and reported as a close as well.
    pub async fn read(&mut self) -> Result<Frame, ProtocolError> {
        self.line.clear();
        let n = self.reader.read_line(&mut self.line).await?;
        if n == 0 || !self.line.ends_with('\n') {
            return Err(ProtocolError::ConnectionClosed);
        }
        parse(self.line.trim_end_matches('\n'))
    }
}

/// Encodes frames onto the write side of a connection
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Wrap the write side of a connection
    pub fn new(inner: W) -> Self {
        Self { writer: inner }
    }

    /// Encode and write one frame, flushing it onto the wire.
    pub async fn write(&mut self, frame: &Frame) -> io::Result<()> {
        self.writer.write_all(encode(frame).as_bytes()).await?;
        self.writer.flush().await
    }

    /// Shut the write side down, flushing anything buffered first.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(frame: Frame) {
        let wire = encode(&frame);
        assert!(wire.ends_with('\n'));
        let decoded = parse(wire.trim_end_matches('\n')).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_round_trip_all_variants() {
        round_trip(Frame::Send {
            message: "hello".to_string(),
        });
        round_trip(Frame::Name {
            name: "alice".to_string(),
        });
        round_trip(Frame::Message {
            name: "alice".to_string(),
            message: "hi there".to_string(),
        });
        round_trip(Frame::Online {
            remote_addr: "127.0.0.1:4000".to_string(),
        });
        round_trip(Frame::Leave {
            name: "alice".to_string(),
        });
        round_trip(Frame::Nickname {
            remote_addr: "127.0.0.1:4000".to_string(),
            name: "alice".to_string(),
        });
    }

    #[test]
    fn test_round_trip_message_with_special_characters() {
        round_trip(Frame::Message {
            name: "bob".to_string(),
            message: "50% of lines\nhave spaces, newlines and % signs".to_string(),
        });
    }

    #[test]
    fn test_message_text_is_escaped_on_the_wire() {
        let wire = encode(&Frame::Message {
            name: "bob".to_string(),
            message: "hello world\nfoo".to_string(),
        });
        assert_eq!(wire, "MESSAGE bob hello%20world%0Afoo\n");
    }

    #[test]
    fn test_unescape_message() {
        let frame = parse("MESSAGE bob hello%20world%0Afoo").unwrap();
        assert_eq!(
            frame,
            Frame::Message {
                name: "bob".to_string(),
                message: "hello world\nfoo".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_keyword() {
        match parse("BOGUS x") {
            Err(ProtocolError::UnknownCommand(keyword)) => assert_eq!(keyword, "BOGUS"),
            other => panic!("expected unknown command, got {other:?}"),
        }
    }

    #[test]
    fn test_line_without_space_is_unknown() {
        assert!(matches!(
            parse("SEND"),
            Err(ProtocolError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert!(matches!(
            parse("send hi"),
            Err(ProtocolError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_empty_name_is_valid() {
        let frame = parse("MESSAGE  hi").unwrap();
        assert_eq!(
            frame,
            Frame::Message {
                name: String::new(),
                message: "hi".to_string(),
            }
        );
    }

    #[test]
    fn test_message_missing_field_is_malformed() {
        assert!(matches!(
            parse("MESSAGE bob"),
            Err(ProtocolError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_nickname_missing_field_is_malformed() {
        assert!(matches!(
            parse("NICKNAME 127.0.0.1:4000"),
            Err(ProtocolError::MalformedFrame(_))
        ));
    }

    #[tokio::test]
    async fn test_reader_decodes_consecutive_frames() {
        let input: &[u8] = b"NAME alice\nSEND hi\n";
        let mut reader = FrameReader::new(input);
        assert_eq!(
            reader.read().await.unwrap(),
            Frame::Name {
                name: "alice".to_string()
            }
        );
        assert_eq!(
            reader.read().await.unwrap(),
            Frame::Send {
                message: "hi".to_string()
            }
        );
        assert!(matches!(
            reader.read().await,
            Err(ProtocolError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_reader_does_not_hang_on_unknown_keyword() {
        let input: &[u8] = b"BOGUS x\n";
        let mut reader = FrameReader::new(input);
        assert!(matches!(
            reader.read().await,
            Err(ProtocolError::UnknownCommand(_))
        ));
    }

    #[tokio::test]
    async fn test_reader_discards_trailing_fragment() {
        let input: &[u8] = b"SEND hi\nSEND trunc";
        let mut reader = FrameReader::new(input);
        assert_eq!(
            reader.read().await.unwrap(),
            Frame::Send {
                message: "hi".to_string()
            }
        );
        assert!(matches!(
            reader.read().await,
            Err(ProtocolError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_writer_reader_round_trip() {
        let (client, server) = tokio::io::duplex(256);
        let mut writer = FrameWriter::new(client);
        let mut reader = FrameReader::new(server);

        let frame = Frame::Nickname {
            remote_addr: "127.0.0.1:4000".to_string(),
            name: "alice".to_string(),
        };
        writer.write(&frame).await.unwrap();
        assert_eq!(reader.read().await.unwrap(), frame);
    }
}
