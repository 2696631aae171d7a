//! Forward-compatible TLV walking over a message suffix.

use byteorder::{BigEndian, ByteOrder};

use crate::error::DecodeError;

/// One type-length-value record trailing a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv<'a> {
    /// TLV type code.
    pub tlv_type: u16,
    /// TLV value bytes (length field excluded).
    pub value: &'a [u8],
}

/// Iterator over the TLV records between a message's fixed body and its
/// declared end.
///
/// Unknown TLV types are yielded like any other; callers skip what they
/// do not understand. A record whose declared length runs past the end
/// of the suffix yields a [`DecodeError::TruncatedTlv`] and ends the
/// walk.
#[derive(Debug, Clone)]
pub struct TlvIter<'a> {
    suffix: &'a [u8],
    /// Offset of the suffix within the whole message, for error reporting.
    base_offset: usize,
    cursor: usize,
}

impl<'a> TlvIter<'a> {
    /// TLV header size: 2-byte type + 2-byte length.
    pub const HEADER_SIZE: usize = 4;

    /// Walk the TLVs in `suffix`, which starts `base_offset` bytes into
    /// the message.
    #[must_use]
    pub const fn new(suffix: &'a [u8], base_offset: usize) -> Self {
        Self {
            suffix,
            base_offset,
            cursor: 0,
        }
    }

    /// Validate every TLV without retaining them.
    ///
    /// Used by the codec for forward compatibility: unknown TLVs are
    /// fine, truncated ones are not.
    pub fn validate(suffix: &'a [u8], base_offset: usize) -> Result<(), DecodeError> {
        for tlv in Self::new(suffix, base_offset) {
            tlv?;
        }
        Ok(())
    }
}

impl<'a> Iterator for TlvIter<'a> {
    type Item = Result<Tlv<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = &self.suffix[self.cursor..];
        if remaining.is_empty() {
            return None;
        }
        if remaining.len() < Self::HEADER_SIZE {
            let item = Err(DecodeError::TruncatedTlv {
                needed: self.base_offset + self.cursor + Self::HEADER_SIZE,
                have: self.base_offset + self.suffix.len(),
            });
            self.cursor = self.suffix.len();
            return Some(item);
        }
        let tlv_type = BigEndian::read_u16(&remaining[0..2]);
        let length = usize::from(BigEndian::read_u16(&remaining[2..4]));
        let end = Self::HEADER_SIZE + length;
        if end > remaining.len() {
            let item = Err(DecodeError::TruncatedTlv {
                needed: self.base_offset + self.cursor + end,
                have: self.base_offset + self.suffix.len(),
            });
            self.cursor = self.suffix.len();
            return Some(item);
        }
        let value = &remaining[Self::HEADER_SIZE..end];
        self.cursor += end;
        Some(Ok(Tlv { tlv_type, value }))
    }
}
