//! Protocol codec for encoding/decoding frames
//!
//! Field writers for both wire directions, plus the incremental decoder
//! driven by the connection receive loop.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{ProtocolError, ProtocolResult};

use super::layout::{fixed_size, has_status};
use super::message::{unpad, Message, MessageStatus, MessageType};
use super::{DOC_NAME_LEN, TAG_LEN, USER_NAME_LEN};

/// Encode a frame into a buffer
///
/// `from_server = false` is the client send direction. `true` produces the
/// server's frames and exists for loopback tests and mock servers. Types
/// without a send path in the requested direction fail with
/// `UnsupportedDirection`; on any error the buffer contents are unusable
/// and callers reset the buffer between frames.
pub fn encode(message: &Message, from_server: bool, buf: &mut BytesMut) -> ProtocolResult<()> {
    if from_server {
        encode_server(message, buf)
    } else {
        encode_client(message, buf)
    }
}

fn encode_client(message: &Message, buf: &mut BytesMut) -> ProtocolResult<()> {
    use MessageType::*;

    buf.put_u8(message.kind.tag());
    match message.kind {
        DocActivate => {
            buf.put_u32(message.id);
            buf.put_slice(&message.hash);
        }
        DocCreate | DocDelete | DocOpen => {
            put_name(buf, &message.name, DOC_NAME_LEN, "document name")?;
        }
        DocSave => buf.put_u32(message.id),
        DocList | UserLogout => {}
        SyncByte => buf.put_u8(message.payload.first().copied().unwrap_or(0)),
        SyncDeletion => {
            buf.put_u32(message.position);
            buf.put_u32(message.length);
        }
        SyncMultibyte => {
            buf.put_u32(message.payload.len() as u32);
            buf.put_slice(&message.payload);
        }
        // The original client never implemented these send paths; the
        // would-be layouts are known but stay an extension point.
        Status | SyncCursor | UserLogin | UserJoin | UserQuit => {
            return Err(ProtocolError::UnsupportedDirection { kind: message.kind });
        }
    }
    Ok(())
}

fn encode_server(message: &Message, buf: &mut BytesMut) -> ProtocolResult<()> {
    use MessageType::*;

    // An absent status encodes as NotOk, the server's default value.
    let status = message.status.unwrap_or(MessageStatus::NotOk).byte();

    buf.put_u8(message.kind.tag());
    match message.kind {
        DocActivate | DocSave => {
            buf.put_u8(status);
            buf.put_u32(message.id);
        }
        DocCreate | DocDelete => {
            buf.put_u8(status);
            put_name(buf, &message.name, DOC_NAME_LEN, "document name")?;
        }
        DocOpen => {
            buf.put_u8(status);
            buf.put_u32(message.id);
            put_name(buf, &message.name, DOC_NAME_LEN, "document name")?;
        }
        DocList => {
            // `length` is the slot count; the payload is padded or cut to
            // exactly count slots, as the server does.
            let width = message.length as usize * DOC_NAME_LEN;
            let take = message.payload.len().min(width);
            buf.put_u32(message.length);
            buf.put_slice(&message.payload[..take]);
            buf.put_bytes(0, width - take);
        }
        Status | UserLogin => buf.put_u8(status),
        SyncByte => {
            buf.put_u32(message.position);
            buf.put_u8(message.payload.first().copied().unwrap_or(0));
        }
        SyncDeletion => {
            buf.put_u32(message.position);
            buf.put_u32(message.length);
        }
        SyncMultibyte => {
            buf.put_u32(message.position);
            buf.put_u32(message.payload.len() as u32);
            buf.put_slice(&message.payload);
        }
        UserJoin => {
            buf.put_u32(message.id);
            put_name(buf, &message.name, USER_NAME_LEN, "user name")?;
        }
        UserQuit => buf.put_u32(message.id),
        UserLogout | SyncCursor => {
            return Err(ProtocolError::UnsupportedDirection { kind: message.kind });
        }
    }
    Ok(())
}

/// Write a name into its fixed-width slot, zero-padded on the right
fn put_name(
    buf: &mut BytesMut,
    name: &str,
    width: usize,
    field: &'static str,
) -> ProtocolResult<()> {
    let bytes = name.as_bytes();
    if bytes.len() > width {
        return Err(ProtocolError::FieldTooLong {
            field,
            max: width,
            actual: bytes.len(),
        });
    }
    buf.put_slice(bytes);
    buf.put_bytes(0, width - bytes.len());
    Ok(())
}

/// Incremental frame decoder
///
/// Feed received bytes into a buffer and call [`Decoder::decode`]; it
/// returns `Ok(None)` until a whole frame is buffered. An `InvalidType`
/// error consumes exactly the offending tag byte, so decoding can resume
/// at the next byte.
pub struct Decoder {
    from_server: bool,
    state: DecodeState,
}

#[derive(Debug, Clone, Copy)]
enum DecodeState {
    /// Waiting for the tag byte
    Tag,
    /// Waiting for the fixed prefix that follows the tag
    Fixed { kind: MessageType },
    /// Waiting for a dynamic tail (DocList slots, multibyte payload)
    Tail {
        kind: MessageType,
        position: u32,
        length: u32,
        need: usize,
    },
}

impl Decoder {
    /// Create a decoder for one wire direction
    ///
    /// A client decodes server frames (`from_server = true`); the reverse
    /// direction is used by loopback tests and mock servers.
    pub fn new(from_server: bool) -> Self {
        Self {
            from_server,
            state: DecodeState::Tag,
        }
    }

    /// Forget any partially decoded frame and expect a fresh tag byte
    pub fn reset(&mut self) {
        self.state = DecodeState::Tag;
    }

    /// Attempt to decode one frame from the buffer
    ///
    /// Returns Ok(None) if more data is needed.
    pub fn decode(&mut self, buf: &mut BytesMut) -> ProtocolResult<Option<Message>> {
        loop {
            match self.state {
                DecodeState::Tag => {
                    if buf.is_empty() {
                        return Ok(None);
                    }
                    let tag = buf.get_u8();
                    let kind =
                        MessageType::from_tag(tag).ok_or(ProtocolError::InvalidType(tag))?;
                    self.state = DecodeState::Fixed { kind };
                }
                DecodeState::Fixed { kind } => {
                    let need = fixed_size(kind, self.from_server) - TAG_LEN;
                    if buf.len() < need {
                        return Ok(None);
                    }
                    let mut fixed = buf.split_to(need);

                    match kind {
                        MessageType::DocList if self.from_server => {
                            let count = fixed.get_u32();
                            self.state = DecodeState::Tail {
                                kind,
                                position: 0,
                                length: count,
                                need: count as usize * DOC_NAME_LEN,
                            };
                        }
                        MessageType::SyncMultibyte => {
                            let (position, length) = if self.from_server {
                                (fixed.get_u32(), fixed.get_u32())
                            } else {
                                (0, fixed.get_u32())
                            };
                            self.state = DecodeState::Tail {
                                kind,
                                position,
                                length,
                                need: length as usize,
                            };
                        }
                        _ => {
                            let message = parse_fixed(kind, self.from_server, &mut fixed);
                            self.state = DecodeState::Tag;
                            return Ok(Some(message));
                        }
                    }
                }
                DecodeState::Tail {
                    kind,
                    position,
                    length,
                    need,
                } => {
                    if buf.len() < need {
                        return Ok(None);
                    }
                    let mut message = Message::new(kind);
                    message.position = position;
                    message.length = length;
                    message.payload = buf.split_to(need).to_vec();
                    self.state = DecodeState::Tag;
                    return Ok(Some(message));
                }
            }
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Parse the fixed fields of a frame whose whole layout is fixed-size
fn parse_fixed(kind: MessageType, from_server: bool, buf: &mut BytesMut) -> Message {
    use MessageType::*;

    let mut message = Message::new(kind);
    if from_server {
        if has_status(kind, true) {
            message.status = Some(MessageStatus::from_byte(buf.get_u8()));
        }
        match kind {
            DocActivate | DocSave => message.id = buf.get_u32(),
            DocCreate | DocDelete => message.name = take_name(buf, DOC_NAME_LEN),
            DocOpen => {
                message.id = buf.get_u32();
                message.name = take_name(buf, DOC_NAME_LEN);
            }
            SyncByte => {
                message.position = buf.get_u32();
                message.payload = vec![buf.get_u8()];
            }
            SyncDeletion => {
                message.position = buf.get_u32();
                message.length = buf.get_u32();
            }
            UserJoin => {
                message.id = buf.get_u32();
                message.name = take_name(buf, USER_NAME_LEN);
            }
            UserQuit => message.id = buf.get_u32(),
            // Status, SyncCursor, UserLogin, UserLogout carry only their
            // status byte.
            _ => {}
        }
    } else {
        match kind {
            DocActivate => {
                message.id = buf.get_u32();
                buf.copy_to_slice(&mut message.hash);
            }
            DocCreate | DocDelete | DocOpen => message.name = take_name(buf, DOC_NAME_LEN),
            DocSave => message.id = buf.get_u32(),
            SyncByte => message.payload = vec![buf.get_u8()],
            SyncCursor => message.position = buf.get_u32(),
            SyncDeletion => {
                message.position = buf.get_u32();
                message.length = buf.get_u32();
            }
            UserLogin => {
                message.name = take_name(buf, USER_NAME_LEN);
                buf.copy_to_slice(&mut message.hash);
            }
            // DocList, Status, UserLogout, UserJoin, UserQuit arrive as a
            // bare tag in this direction.
            _ => {}
        }
    }
    message
}

/// Read a fixed-width name slot and strip its padding
fn take_name(buf: &mut BytesMut, width: usize) -> String {
    let slot = buf.split_to(width);
    unpad(&slot)
}
