//! Shared error taxonomy
//!
//! One error type covers the codec and the connection manager, so callers
//! handle both through a single `Result` alias.

use std::io;
use thiserror::Error;

use crate::protocol::MessageType;

/// Transport errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid message type tag: {0:#04x}")]
    InvalidType(u8),

    #[error("Connection to {addr} failed: {source}")]
    ConnectionFailed { addr: String, source: io::Error },

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Not connected")]
    NotConnected,

    #[error("Field too long: {field} is {actual} bytes (max: {max})")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("Message type {kind:?} has no send path in this direction")]
    UnsupportedDirection { kind: MessageType },

    #[error("IO error: {0}")]
    UnexpectedIo(#[from] io::Error),

    #[error("Read timeout")]
    Timeout,
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
