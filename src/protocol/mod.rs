//! Protocol module - the CoText editor wire format
//!
//! A fixed binary format shared with the server:
//! - 1 byte message type tag (table ordinal)
//! - big-endian u32 integers
//! - fixed-width string fields, zero-padded on the right
//! - direction-dependent field layouts

mod codec;
mod layout;
mod message;

pub use codec::*;
pub use layout::*;
pub use message::*;

/// Default port of the CoText server
pub const DEFAULT_PORT: u16 = 52021;

/// Wire width of the message type tag
pub const TAG_LEN: usize = 1;

/// Wire width of document and session ids
pub const ID_LEN: usize = 4;

/// Wire width of a document name slot
pub const DOC_NAME_LEN: usize = 128;

/// Wire width of a user name slot
pub const USER_NAME_LEN: usize = 64;

/// Wire width of the SHA-1 credential hash
pub const HASH_LEN: usize = 20;

/// Wire width of size, position, length and count fields
pub const SIZE_LEN: usize = 4;

/// Wire width of a status code
pub const STATUS_LEN: usize = 1;

/// Wire width of a single sync byte
pub const BYTE_LEN: usize = 1;
