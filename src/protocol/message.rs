//! Protocol message definitions
//!
//! Message types, status codes, and the in-memory frame representation
//! shared by the codec and the connection manager.

use super::{DOC_NAME_LEN, HASH_LEN};

/// Message types
///
/// The wire tag is the variant's position in this table. The table is part
/// of the protocol; reordering it breaks interoperability with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Activate a previously opened document
    DocActivate = 0,
    /// Create a document
    DocCreate = 1,
    /// Delete a document
    DocDelete = 2,
    /// List all documents on the server
    DocList = 3,
    /// Open a document
    DocOpen = 4,
    /// Persist the active document
    DocSave = 5,
    /// Bare server status response
    Status = 6,
    /// Single-byte edit in the active document
    SyncByte = 7,
    /// Cursor movement
    SyncCursor = 8,
    /// Deletion of a byte range
    SyncDeletion = 9,
    /// Multi-byte edit in the active document
    SyncMultibyte = 10,
    /// User authentication
    UserLogin = 11,
    /// End of session
    UserLogout = 12,
    /// Another user joined the active document
    UserJoin = 13,
    /// Another user left the active document
    UserQuit = 14,
}

impl MessageType {
    /// Every message type, in tag order
    pub const ALL: [MessageType; 15] = [
        MessageType::DocActivate,
        MessageType::DocCreate,
        MessageType::DocDelete,
        MessageType::DocList,
        MessageType::DocOpen,
        MessageType::DocSave,
        MessageType::Status,
        MessageType::SyncByte,
        MessageType::SyncCursor,
        MessageType::SyncDeletion,
        MessageType::SyncMultibyte,
        MessageType::UserLogin,
        MessageType::UserLogout,
        MessageType::UserJoin,
        MessageType::UserQuit,
    ];

    /// Map a wire tag to its message type
    pub fn from_tag(tag: u8) -> Option<MessageType> {
        match tag {
            0 => Some(MessageType::DocActivate),
            1 => Some(MessageType::DocCreate),
            2 => Some(MessageType::DocDelete),
            3 => Some(MessageType::DocList),
            4 => Some(MessageType::DocOpen),
            5 => Some(MessageType::DocSave),
            6 => Some(MessageType::Status),
            7 => Some(MessageType::SyncByte),
            8 => Some(MessageType::SyncCursor),
            9 => Some(MessageType::SyncDeletion),
            10 => Some(MessageType::SyncMultibyte),
            11 => Some(MessageType::UserLogin),
            12 => Some(MessageType::UserLogout),
            13 => Some(MessageType::UserJoin),
            14 => Some(MessageType::UserQuit),
            _ => None,
        }
    }

    /// The wire tag of this message type
    pub fn tag(&self) -> u8 {
        *self as u8
    }
}

/// Status codes carried by server responses
///
/// Any byte outside the table decodes as `Unknown`; status decoding never
/// fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageStatus {
    Ok = 0,
    OkContentsFollowing = 1,
    DocAlreadyExists = 2,
    DocNotExist = 3,
    DocSaved = 4,
    UserNotExist = 5,
    UserWrongPassword = 6,
    UserNoActiveDoc = 7,
    UserCursorUnknown = 8,
    UserCursorOutOfBounds = 9,
    UserLengthTooLong = 10,
    NotOk = 11,
    Unknown = 12,
}

impl MessageStatus {
    /// Every status code, in byte order
    pub const ALL: [MessageStatus; 13] = [
        MessageStatus::Ok,
        MessageStatus::OkContentsFollowing,
        MessageStatus::DocAlreadyExists,
        MessageStatus::DocNotExist,
        MessageStatus::DocSaved,
        MessageStatus::UserNotExist,
        MessageStatus::UserWrongPassword,
        MessageStatus::UserNoActiveDoc,
        MessageStatus::UserCursorUnknown,
        MessageStatus::UserCursorOutOfBounds,
        MessageStatus::UserLengthTooLong,
        MessageStatus::NotOk,
        MessageStatus::Unknown,
    ];

    /// Map a wire byte to a status, falling back to `Unknown` out of range
    pub fn from_byte(byte: u8) -> MessageStatus {
        match byte {
            0 => MessageStatus::Ok,
            1 => MessageStatus::OkContentsFollowing,
            2 => MessageStatus::DocAlreadyExists,
            3 => MessageStatus::DocNotExist,
            4 => MessageStatus::DocSaved,
            5 => MessageStatus::UserNotExist,
            6 => MessageStatus::UserWrongPassword,
            7 => MessageStatus::UserNoActiveDoc,
            8 => MessageStatus::UserCursorUnknown,
            9 => MessageStatus::UserCursorOutOfBounds,
            10 => MessageStatus::UserLengthTooLong,
            11 => MessageStatus::NotOk,
            _ => MessageStatus::Unknown,
        }
    }

    /// The wire byte of this status
    pub fn byte(&self) -> u8 {
        *self as u8
    }

    /// Check if this status reports success
    pub fn is_ok(&self) -> bool {
        matches!(
            self,
            MessageStatus::Ok | MessageStatus::OkContentsFollowing | MessageStatus::DocSaved
        )
    }
}

/// One protocol frame in memory
///
/// Carries the union of all frame fields. A given (type, direction) layout
/// uses only a subset; the rest stay at their defaults (zero, empty,
/// absent). Frames are constructed fresh per send and per receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Frame type, selects the wire layout
    pub kind: MessageType,
    /// Document or session id
    pub id: u32,
    /// Document or user name, without wire padding
    pub name: String,
    /// Byte position within the active document
    pub position: u32,
    /// Deletion length, payload length, or DocList slot count
    pub length: u32,
    /// Raw payload: sync bytes, or concatenated name slots for DocList
    pub payload: Vec<u8>,
    /// Server status, absent on frames whose layout carries none
    pub status: Option<MessageStatus>,
    /// SHA-1 credential hash, client-to-server only
    pub hash: [u8; HASH_LEN],
}

impl Message {
    /// Create an empty frame of the given type
    pub fn new(kind: MessageType) -> Self {
        Self {
            kind,
            id: 0,
            name: String::new(),
            position: 0,
            length: 0,
            payload: Vec::new(),
            status: None,
            hash: [0; HASH_LEN],
        }
    }

    /// Request activation of an open document
    pub fn doc_activate(id: u32, hash: [u8; HASH_LEN]) -> Self {
        let mut message = Self::new(MessageType::DocActivate);
        message.id = id;
        message.hash = hash;
        message
    }

    /// Request creation of a document
    pub fn doc_create(name: &str) -> Self {
        let mut message = Self::new(MessageType::DocCreate);
        message.name = name.to_string();
        message
    }

    /// Request deletion of a document
    pub fn doc_delete(name: &str) -> Self {
        let mut message = Self::new(MessageType::DocDelete);
        message.name = name.to_string();
        message
    }

    /// Request the server's document list
    pub fn doc_list() -> Self {
        Self::new(MessageType::DocList)
    }

    /// Request opening of a document
    pub fn doc_open(name: &str) -> Self {
        let mut message = Self::new(MessageType::DocOpen);
        message.name = name.to_string();
        message
    }

    /// Request persisting of the active document
    pub fn doc_save(id: u32) -> Self {
        let mut message = Self::new(MessageType::DocSave);
        message.id = id;
        message
    }

    /// A single-byte edit at the server-tracked cursor
    pub fn sync_byte(byte: u8) -> Self {
        let mut message = Self::new(MessageType::SyncByte);
        message.payload = vec![byte];
        message
    }

    /// A deletion of `length` bytes at `position`
    pub fn sync_deletion(position: u32, length: u32) -> Self {
        let mut message = Self::new(MessageType::SyncDeletion);
        message.position = position;
        message.length = length;
        message
    }

    /// A multi-byte edit at the server-tracked cursor
    pub fn sync_multibyte(payload: Vec<u8>) -> Self {
        let mut message = Self::new(MessageType::SyncMultibyte);
        message.length = payload.len() as u32;
        message.payload = payload;
        message
    }

    /// End the session
    pub fn user_logout() -> Self {
        Self::new(MessageType::UserLogout)
    }

    /// Split a DocList payload into its name slots, in wire order
    pub fn document_names(&self) -> Vec<String> {
        self.payload.chunks(DOC_NAME_LEN).map(unpad).collect()
    }
}

/// Strip the zero padding from a fixed-width name slot
pub(crate) fn unpad(slot: &[u8]) -> String {
    let end = slot.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&slot[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tag_table() {
        for (tag, kind) in MessageType::ALL.iter().enumerate() {
            assert_eq!(kind.tag() as usize, tag);
            assert_eq!(MessageType::from_tag(tag as u8), Some(*kind));
        }
        for tag in 15..=255u8 {
            assert_eq!(MessageType::from_tag(tag), None);
        }
    }

    #[test]
    fn test_status_byte_table() {
        for (byte, status) in MessageStatus::ALL.iter().enumerate() {
            assert_eq!(status.byte() as usize, byte);
            assert_eq!(MessageStatus::from_byte(byte as u8), *status);
        }
        for byte in 13..=255u8 {
            assert_eq!(MessageStatus::from_byte(byte), MessageStatus::Unknown);
        }
    }

    #[test]
    fn test_constructors_leave_defaults() {
        let message = Message::doc_create("notes.txt");
        assert_eq!(message.kind, MessageType::DocCreate);
        assert_eq!(message.name, "notes.txt");
        assert_eq!(message.id, 0);
        assert_eq!(message.status, None);
        assert!(message.payload.is_empty());

        let message = Message::sync_multibyte(b"hello".to_vec());
        assert_eq!(message.length, 5);
        assert_eq!(message.position, 0);
    }

    #[test]
    fn test_document_names() {
        let mut payload = Vec::new();
        for name in ["alpha", "beta"] {
            let mut slot = name.as_bytes().to_vec();
            slot.resize(DOC_NAME_LEN, 0);
            payload.extend_from_slice(&slot);
        }

        let mut message = Message::new(MessageType::DocList);
        message.length = 2;
        message.payload = payload;

        assert_eq!(message.document_names(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_unpad_keeps_interior_bytes() {
        assert_eq!(unpad(b"abc\0\0\0"), "abc");
        assert_eq!(unpad(b"\0\0\0"), "");
        assert_eq!(unpad(b"a\0b\0"), "a\0b");
    }
}
