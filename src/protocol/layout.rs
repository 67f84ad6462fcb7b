//! Wire layout rules
//!
//! Frame sizes and field presence are a pure function of (type, direction,
//! dynamic element count). The codec must agree with this module byte for
//! byte; the server computes sizes the same way.
//!
//! `dynamic` is the payload byte count for `SyncMultibyte` and the name
//! slot count for a server `DocList`; every other layout ignores it.

use super::message::MessageType;
use super::{
    BYTE_LEN, DOC_NAME_LEN, HASH_LEN, ID_LEN, SIZE_LEN, STATUS_LEN, TAG_LEN, USER_NAME_LEN,
};

/// Payload bytes carried by the frame
pub(crate) fn payload_len(kind: MessageType, dynamic: usize) -> usize {
    match kind {
        MessageType::SyncByte => BYTE_LEN,
        MessageType::SyncMultibyte => dynamic,
        _ => 0,
    }
}

/// Whether the frame carries a 4-byte id
pub(crate) fn has_id(kind: MessageType, from_server: bool) -> bool {
    matches!(kind, MessageType::DocActivate | MessageType::DocSave)
        || (from_server
            && matches!(
                kind,
                MessageType::DocOpen | MessageType::UserJoin | MessageType::UserQuit
            ))
}

/// Document name bytes carried by the frame
pub(crate) fn doc_name_len(kind: MessageType, from_server: bool, dynamic: usize) -> usize {
    let slots = match kind {
        MessageType::DocCreate | MessageType::DocDelete | MessageType::DocOpen => 1,
        MessageType::DocList if from_server => dynamic,
        _ => 0,
    };
    slots * DOC_NAME_LEN
}

/// Whether the frame carries the 20-byte credential hash
pub(crate) fn has_hash(kind: MessageType, from_server: bool) -> bool {
    !from_server && matches!(kind, MessageType::DocActivate | MessageType::UserLogin)
}

/// Whether the frame carries its first 4-byte size field
/// (position, length, or DocList slot count, depending on the type)
pub(crate) fn has_size(kind: MessageType, from_server: bool) -> bool {
    matches!(kind, MessageType::SyncDeletion | MessageType::SyncMultibyte)
        || (from_server && matches!(kind, MessageType::DocList | MessageType::SyncByte))
        || (!from_server && kind == MessageType::SyncCursor)
}

/// Whether the frame carries a second 4-byte size field
pub(crate) fn has_second_size(kind: MessageType, from_server: bool) -> bool {
    kind == MessageType::SyncDeletion || (from_server && kind == MessageType::SyncMultibyte)
}

/// Whether the frame carries a status byte
pub(crate) fn has_status(kind: MessageType, from_server: bool) -> bool {
    from_server
        && !matches!(
            kind,
            MessageType::DocList
                | MessageType::SyncByte
                | MessageType::SyncDeletion
                | MessageType::SyncMultibyte
                | MessageType::UserJoin
                | MessageType::UserQuit
        )
}

/// Whether the frame carries a 64-byte user name
pub(crate) fn has_user_name(kind: MessageType, from_server: bool) -> bool {
    (from_server && kind == MessageType::UserJoin)
        || (!from_server && kind == MessageType::UserLogin)
}

/// Total wire size of a frame, tag byte included
pub fn frame_size(kind: MessageType, from_server: bool, dynamic: usize) -> usize {
    let mut size = TAG_LEN;
    size += payload_len(kind, dynamic);
    if has_id(kind, from_server) {
        size += ID_LEN;
    }
    size += doc_name_len(kind, from_server, dynamic);
    if has_hash(kind, from_server) {
        size += HASH_LEN;
    }
    if has_size(kind, from_server) {
        size += SIZE_LEN;
    }
    if has_second_size(kind, from_server) {
        size += SIZE_LEN;
    }
    if has_status(kind, from_server) {
        size += STATUS_LEN;
    }
    if has_user_name(kind, from_server) {
        size += USER_NAME_LEN;
    }
    size
}

/// Fixed prefix of a frame, tag byte included
///
/// `DocList` and `SyncMultibyte` carry their element count on the wire, so
/// the decoder reads this much first and the dynamic tail afterwards. For
/// every other type this is the whole frame.
pub(crate) fn fixed_size(kind: MessageType, from_server: bool) -> usize {
    match kind {
        MessageType::DocList | MessageType::SyncMultibyte => frame_size(kind, from_server, 0),
        _ => frame_size(kind, from_server, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MessageType::*;

    #[test]
    fn test_server_frame_sizes() {
        let expected = [
            (DocActivate, 6),
            (DocCreate, 130),
            (DocDelete, 130),
            (DocOpen, 134),
            (DocSave, 6),
            (Status, 2),
            (SyncByte, 6),
            (SyncCursor, 2),
            (SyncDeletion, 9),
            (UserLogin, 2),
            (UserLogout, 2),
            (UserJoin, 69),
            (UserQuit, 5),
        ];
        for (kind, size) in expected {
            assert_eq!(frame_size(kind, true, 1), size, "{:?}", kind);
        }

        assert_eq!(frame_size(DocList, true, 0), 5);
        assert_eq!(frame_size(DocList, true, 3), 5 + 3 * DOC_NAME_LEN);
        assert_eq!(frame_size(SyncMultibyte, true, 0), 9);
        assert_eq!(frame_size(SyncMultibyte, true, 5), 14);
    }

    #[test]
    fn test_client_frame_sizes() {
        let expected = [
            (DocActivate, 25),
            (DocCreate, 129),
            (DocDelete, 129),
            (DocList, 1),
            (DocOpen, 129),
            (DocSave, 5),
            (Status, 1),
            (SyncByte, 2),
            (SyncCursor, 5),
            (SyncDeletion, 9),
            (UserLogin, 85),
            (UserLogout, 1),
            (UserJoin, 1),
            (UserQuit, 1),
        ];
        for (kind, size) in expected {
            assert_eq!(frame_size(kind, false, 1), size, "{:?}", kind);
        }

        assert_eq!(frame_size(SyncMultibyte, false, 0), 5);
        assert_eq!(frame_size(SyncMultibyte, false, 7), 12);
    }

    #[test]
    fn test_fixed_size_stops_before_dynamic_tail() {
        assert_eq!(fixed_size(DocList, true), 5);
        assert_eq!(fixed_size(DocList, false), 1);
        assert_eq!(fixed_size(SyncMultibyte, true), 9);
        assert_eq!(fixed_size(SyncMultibyte, false), 5);

        // SyncByte's single payload byte is part of the fixed prefix.
        assert_eq!(fixed_size(SyncByte, true), 6);
        assert_eq!(fixed_size(SyncByte, false), 2);
    }

    #[test]
    fn test_status_presence_matches_layout() {
        for kind in MessageType::ALL {
            assert!(!has_status(kind, false), "{:?}", kind);
        }
        let without = [DocList, SyncByte, SyncDeletion, SyncMultibyte, UserJoin, UserQuit];
        for kind in MessageType::ALL {
            assert_eq!(has_status(kind, true), !without.contains(&kind), "{:?}", kind);
        }
    }
}
