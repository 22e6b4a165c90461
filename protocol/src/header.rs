//! Packet header shapes of the MU wire protocol.
//!
//! The first byte of every packet selects one of two header layouts. Odd
//! values (`C1`/`C3`) carry a byte-sized length, even values (`C2`/`C4`) a
//! big-endian word-sized one:
//!
//! ```text
//! C1/C3: [type] [size]             [opcode] [sub-opcode?] ...
//! C2/C4: [type] [size hi] [size lo] [opcode] [sub-opcode?] ...
//! ```
//!
//! `C3` and `C4` are the encrypted variants of `C1` and `C2`.

/// Byte-sized length, plaintext.
pub const C1: u8 = 0xC1;
/// Word-sized length, plaintext.
pub const C2: u8 = 0xC2;
/// Byte-sized length, encrypted.
pub const C3: u8 = 0xC3;
/// Word-sized length, encrypted.
pub const C4: u8 = 0xC4;

/// First header byte from which packets are treated as encrypted.
pub const ENCRYPTION_THRESHOLD: u8 = C3;

/// Header layout selected by the first byte of a packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeaderKind {
    C1,
    C2,
    C3,
    C4,
}

impl HeaderKind {
    pub fn from_type_byte(value: u8) -> Result<Self, FrameError> {
        match value {
            C1 => Ok(Self::C1),
            C2 => Ok(Self::C2),
            C3 => Ok(Self::C3),
            C4 => Ok(Self::C4),
            other => Err(FrameError::UnknownHeaderType(other)),
        }
    }

    #[must_use]
    pub const fn type_byte(self) -> u8 {
        match self {
            Self::C1 => C1,
            Self::C2 => C2,
            Self::C3 => C3,
            Self::C4 => C4,
        }
    }

    /// Number of bytes used by the length field.
    #[must_use]
    pub const fn length_width(self) -> usize {
        if self.type_byte() % 2 == 1 { 1 } else { 2 }
    }

    /// Offset of the opcode byte.
    #[must_use]
    pub const fn opcode_offset(self) -> usize {
        1 + self.length_width()
    }

    /// Offset of the sub-opcode byte of grouped packets.
    #[must_use]
    pub const fn sub_opcode_offset(self) -> usize {
        self.opcode_offset() + 1
    }

    #[must_use]
    pub const fn is_encrypted(self) -> bool {
        self.type_byte() >= ENCRYPTION_THRESHOLD
    }

    /// Largest packet that fits the length field.
    #[must_use]
    pub const fn max_len(self) -> usize {
        if self.length_width() == 1 {
            u8::MAX as usize
        } else {
            u16::MAX as usize
        }
    }
}

/// Errors for buffers that cannot be interpreted as a packet.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("packet is empty")]
    Empty,

    #[error("unknown header type {0:#04X}")]
    UnknownHeaderType(u8),

    #[error("packet too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },

    #[error("declared length {declared} does not fit buffer of {actual} bytes")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("packet of {len} bytes exceeds {kind:?} limit of {limit}")]
    TooLong {
        kind: HeaderKind,
        len: usize,
        limit: usize,
    },
}

/// Header view derived from a raw packet buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub kind: HeaderKind,
    /// Packet length as written in the length field, header included.
    pub declared_len: usize,
    pub opcode: u8,
    /// Byte after the opcode, present when the packet is long enough. Only
    /// meaningful for grouped packets.
    pub sub_opcode: Option<u8>,
    pub is_encrypted: bool,
    /// Offset of the first byte after the opcode.
    pub body_offset: usize,
}

/// Reads the declared packet length without requiring the full packet.
pub fn declared_len(buffer: &[u8]) -> Result<Option<(HeaderKind, usize)>, FrameError> {
    let Some(&type_byte) = buffer.first() else {
        return Ok(None);
    };
    let kind = HeaderKind::from_type_byte(type_byte)?;
    let len = match kind.length_width() {
        1 => buffer.get(1).map(|&size| usize::from(size)),
        _ => match (buffer.get(1), buffer.get(2)) {
            (Some(&hi), Some(&lo)) => Some(usize::from(u16::from_be_bytes([hi, lo]))),
            _ => None,
        },
    };
    Ok(len.map(|len| (kind, len)))
}

/// Interprets the header of a complete packet.
///
/// The buffer must contain at least the header up to the opcode and must not
/// be shorter than the length it declares.
pub fn read_header(buffer: &[u8]) -> Result<FrameHeader, FrameError> {
    if buffer.is_empty() {
        return Err(FrameError::Empty);
    }
    let kind = HeaderKind::from_type_byte(buffer[0])?;
    let min_len = kind.opcode_offset() + 1;
    if buffer.len() < min_len {
        return Err(FrameError::TooShort {
            needed: min_len,
            actual: buffer.len(),
        });
    }

    let (_, declared_len) = declared_len(buffer)?.ok_or(FrameError::TooShort {
        needed: min_len,
        actual: buffer.len(),
    })?;
    if declared_len < min_len || declared_len > buffer.len() {
        return Err(FrameError::LengthMismatch {
            declared: declared_len,
            actual: buffer.len(),
        });
    }

    let packet = &buffer[..declared_len];
    Ok(FrameHeader {
        kind,
        declared_len,
        opcode: packet[kind.opcode_offset()],
        sub_opcode: packet.get(kind.sub_opcode_offset()).copied(),
        is_encrypted: kind.is_encrypted(),
        body_offset: kind.opcode_offset() + 1,
    })
}

/// Re-derives the sub-opcode of a grouped packet with the same parity rule
/// as [`read_header`].
#[must_use]
pub fn sub_opcode_at(buffer: &[u8]) -> Option<u8> {
    let kind = HeaderKind::from_type_byte(*buffer.first()?).ok()?;
    buffer.get(kind.sub_opcode_offset()).copied()
}

/// Builds outgoing packets with a correct length field.
#[derive(Clone, Debug)]
pub struct FrameBuilder {
    kind: HeaderKind,
    opcode: u8,
    sub_opcode: Option<u8>,
    body: Vec<u8>,
}

impl FrameBuilder {
    #[must_use]
    pub fn new(kind: HeaderKind, opcode: u8) -> Self {
        Self {
            kind,
            opcode,
            sub_opcode: None,
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn sub_opcode(mut self, sub_opcode: u8) -> Self {
        self.sub_opcode = Some(sub_opcode);
        self
    }

    #[must_use]
    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    #[must_use]
    pub fn byte(mut self, value: u8) -> Self {
        self.body.push(value);
        self
    }

    /// Appends `text` as a fixed-width, NUL padded field.
    #[must_use]
    pub fn fixed_str(mut self, text: &str, width: usize) -> Self {
        let bytes = text.as_bytes();
        let used = bytes.len().min(width);
        self.body.extend_from_slice(&bytes[..used]);
        self.body.resize(self.body.len() + (width - used), 0);
        self
    }

    pub fn build(self) -> Result<Vec<u8>, FrameError> {
        let header_len = self.kind.opcode_offset() + 1 + usize::from(self.sub_opcode.is_some());
        let len = header_len + self.body.len();
        if len > self.kind.max_len() {
            return Err(FrameError::TooLong {
                kind: self.kind,
                len,
                limit: self.kind.max_len(),
            });
        }

        let mut packet = Vec::with_capacity(len);
        packet.push(self.kind.type_byte());
        if self.kind.length_width() == 1 {
            packet.push(len as u8);
        } else {
            packet.extend_from_slice(&(len as u16).to_be_bytes());
        }
        packet.push(self.opcode);
        if let Some(sub_opcode) = self.sub_opcode {
            packet.push(sub_opcode);
        }
        packet.extend_from_slice(&self.body);
        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_headers_read_opcode_at_offset_two() {
        for type_byte in [C1, C3] {
            let header = read_header(&[type_byte, 0x05, 0xD4, 0x12, 0x34]).unwrap();
            assert_eq!(header.declared_len, 5);
            assert_eq!(header.opcode, 0xD4);
            assert_eq!(header.sub_opcode, Some(0x12));
            assert_eq!(header.body_offset, 3);
        }
    }

    #[test]
    fn even_headers_read_big_endian_length() {
        for type_byte in [C2, C4] {
            let header = read_header(&[type_byte, 0x00, 0x06, 0xF3, 0x03, 0x00]).unwrap();
            assert_eq!(header.declared_len, 6);
            assert_eq!(header.opcode, 0xF3);
            assert_eq!(header.sub_opcode, Some(0x03));
            assert_eq!(header.body_offset, 4);
        }
    }

    #[test]
    fn encryption_follows_threshold() {
        assert!(!read_header(&[C1, 3, 0x00]).unwrap().is_encrypted);
        assert!(!read_header(&[C2, 0, 4, 0x00]).unwrap().is_encrypted);
        assert!(read_header(&[C3, 3, 0x00]).unwrap().is_encrypted);
        assert!(read_header(&[C4, 0, 4, 0x00]).unwrap().is_encrypted);
    }

    #[test]
    fn short_buffers_are_malformed() {
        assert_eq!(read_header(&[]), Err(FrameError::Empty));
        assert!(matches!(
            read_header(&[C1, 3]),
            Err(FrameError::TooShort { needed: 3, .. })
        ));
        assert!(matches!(
            read_header(&[C2, 0, 4]),
            Err(FrameError::TooShort { needed: 4, .. })
        ));
        assert!(matches!(
            read_header(&[C1, 9, 0x00]),
            Err(FrameError::LengthMismatch { .. })
        ));
        assert_eq!(
            read_header(&[0x10, 3, 0x00]),
            Err(FrameError::UnknownHeaderType(0x10))
        );
    }

    #[test]
    fn sub_opcode_missing_on_minimal_packet() {
        let header = read_header(&[C1, 3, 0x0E]).unwrap();
        assert_eq!(header.sub_opcode, None);
    }

    #[test]
    fn sub_opcode_uses_same_parity_rule() {
        assert_eq!(sub_opcode_at(&[C3, 4, 0xF1, 0x01]), Some(0x01));
        assert_eq!(sub_opcode_at(&[C4, 0, 5, 0xF1, 0x02]), Some(0x02));
        assert_eq!(sub_opcode_at(&[C1, 3, 0xF1]), None);
    }

    #[test]
    fn builder_writes_length_for_both_shapes() {
        let small = FrameBuilder::new(HeaderKind::C1, 0x00)
            .fixed_str("abc", 10)
            .build()
            .unwrap();
        assert_eq!(small.len(), 13);
        assert_eq!(small[1], 13);

        let large = FrameBuilder::new(HeaderKind::C2, 0xF3)
            .sub_opcode(0x00)
            .bytes(&[0; 300])
            .build()
            .unwrap();
        assert_eq!(&large[..5], &[C2, 0x01, 0x31, 0xF3, 0x00]);
    }

    #[test]
    fn builder_rejects_oversized_byte_frames() {
        let err = FrameBuilder::new(HeaderKind::C1, 0x00)
            .bytes(&[0; 300])
            .build()
            .unwrap_err();
        assert!(matches!(err, FrameError::TooLong { limit: 255, .. }));
    }
}
