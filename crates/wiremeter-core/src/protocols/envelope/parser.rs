use super::error::EnvelopeError;
use super::layout;

/// Message type carried in the low 15 bits of the type/flags word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    None,
    Call,
    Notify,
    Return,
    Echo,
    FrameUp,
    FrameDown,
    Unknown(u16),
}

impl MessageType {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            layout::TYPE_NONE => Self::None,
            layout::TYPE_CALL => Self::Call,
            layout::TYPE_NOTIFY => Self::Notify,
            layout::TYPE_RETURN => Self::Return,
            layout::TYPE_ECHO => Self::Echo,
            layout::TYPE_FRAME_UP => Self::FrameUp,
            layout::TYPE_FRAME_DOWN => Self::FrameDown,
            other => Self::Unknown(other),
        }
    }

    /// Container envelopes wrap exactly one nested frame.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            Self::Call | Self::Echo | Self::FrameUp | Self::FrameDown
        )
    }
}

/// One parsed outer frame.
#[derive(Debug)]
pub struct Envelope<'a> {
    pub msg_type: MessageType,
    pub compressed: bool,
    pub body: &'a [u8],
}

/// Parses a complete frame whose length prefix was already validated by
/// the reassembler. The declared size still bounds the body so trailing
/// garbage after a nested frame is never misread as payload.
pub fn parse_envelope(frame: &[u8]) -> Result<Envelope<'_>, EnvelopeError> {
    if frame.len() < layout::HEADER_LEN {
        return Err(EnvelopeError::TooShort {
            needed: layout::HEADER_LEN,
            actual: frame.len(),
        });
    }
    let size_bytes = &frame[layout::SIZE_RANGE];
    let declared = u32::from_be_bytes([size_bytes[0], size_bytes[1], size_bytes[2], size_bytes[3]]);
    if declared < layout::MIN_FRAME_LEN {
        return Err(EnvelopeError::SizeBelowMinimum { declared });
    }
    if declared as usize > frame.len() {
        return Err(EnvelopeError::SizeBeyondBuffer {
            declared,
            actual: frame.len(),
        });
    }

    let flag_bytes = &frame[layout::TYPE_FLAGS_RANGE];
    let type_and_flags = u16::from_be_bytes([flag_bytes[0], flag_bytes[1]]);
    Ok(Envelope {
        msg_type: MessageType::from_raw(type_and_flags & layout::TYPE_MASK),
        compressed: type_and_flags & layout::COMPRESS_FLAG != 0,
        body: &frame[layout::HEADER_LEN..declared as usize],
    })
}

#[cfg(test)]
mod tests {
    use super::{MessageType, parse_envelope};
    use crate::protocols::envelope::error::EnvelopeError;

    fn frame(type_and_flags: u16, body: &[u8]) -> Vec<u8> {
        let size = (6 + body.len()) as u32;
        let mut out = Vec::with_capacity(size as usize);
        out.extend_from_slice(&size.to_be_bytes());
        out.extend_from_slice(&type_and_flags.to_be_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn parse_notify_uncompressed() {
        let bytes = frame(0x0002, b"payload");
        let env = parse_envelope(&bytes).unwrap();
        assert_eq!(env.msg_type, MessageType::Notify);
        assert!(!env.compressed);
        assert_eq!(env.body, b"payload");
    }

    #[test]
    fn compression_bit_is_separated_from_type() {
        let bytes = frame(0x8004, &[]);
        let env = parse_envelope(&bytes).unwrap();
        assert_eq!(env.msg_type, MessageType::Echo);
        assert!(env.compressed);
    }

    #[test]
    fn container_types() {
        for raw in [1u16, 4, 5, 6] {
            assert!(MessageType::from_raw(raw).is_container());
        }
        for raw in [0u16, 2, 3, 7] {
            assert!(!MessageType::from_raw(raw).is_container());
        }
    }

    #[test]
    fn unknown_type_preserved() {
        assert_eq!(MessageType::from_raw(0x7abc), MessageType::Unknown(0x7abc));
    }

    #[test]
    fn declared_size_bounds_body() {
        // A frame declaring 8 bytes inside a 10-byte buffer keeps only
        // two body bytes.
        let mut bytes = frame(0x0002, &[0xaa, 0xbb]);
        bytes.extend_from_slice(&[0xcc, 0xdd]);
        let env = parse_envelope(&bytes).unwrap();
        assert_eq!(env.body, &[0xaa, 0xbb]);
    }

    #[test]
    fn short_header_rejected() {
        let err = parse_envelope(&[0, 0, 0]).unwrap_err();
        assert!(matches!(err, EnvelopeError::TooShort { .. }));
    }

    #[test]
    fn declared_size_beyond_buffer_rejected() {
        let mut bytes = frame(0x0002, b"xy");
        bytes[3] = 0xff;
        let err = parse_envelope(&bytes).unwrap_err();
        assert!(matches!(err, EnvelopeError::SizeBeyondBuffer { .. }));
    }
}
