//! The 34-byte common message header.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{DecodeError, EncodeError};
use crate::types::PortIdentity;

use super::MessageType;

/// Flag bits within the 16-bit flagField (header octets 6..8, big-endian).
pub mod flags {
    /// Another port is the alternate master.
    pub const ALTERNATE_MASTER: u16 = 0x0100;
    /// Sync is followed by a `Follow_Up` carrying the precise timestamp.
    pub const TWO_STEP: u16 = 0x0200;
    /// Message was sent unicast.
    pub const UNICAST: u16 = 0x0400;
    /// Last minute of the day has 61 seconds.
    pub const LEAP61: u16 = 0x0001;
    /// Last minute of the day has 59 seconds.
    pub const LEAP59: u16 = 0x0002;
    /// currentUtcOffset is known to be correct.
    pub const UTC_OFFSET_VALID: u16 = 0x0004;
    /// Timescale is PTP (TAI), not arbitrary.
    pub const PTP_TIMESCALE: u16 = 0x0008;
    /// Time is traceable to a primary reference.
    pub const TIME_TRACEABLE: u16 = 0x0010;
    /// Frequency is traceable to a primary reference.
    pub const FREQUENCY_TRACEABLE: u16 = 0x0020;
}

/// Full IEEE 1588 common header (34 bytes, all multi-byte fields BE).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Transport-specific nibble (upper 4 bits of byte 0).
    pub transport_specific: u8,
    /// Message type (lower 4 bits of byte 0).
    pub message_type: MessageType,
    /// PTP version (major nibble; must be 2).
    pub version: u8,
    /// Total message length including this header.
    pub message_length: u16,
    /// Domain number.
    pub domain_number: u8,
    /// Flag field; see [`flags`].
    pub flags: u16,
    /// Correction in scaled nanoseconds ×2¹⁶, signed.
    pub correction_field: i64,
    /// Identity of the sending port.
    pub source_port_identity: PortIdentity,
    /// Sequence ID, per message type per port.
    pub sequence_id: u16,
    /// Control field (v1 compatibility, still emitted).
    pub control_field: u8,
    /// log2 of the message interval.
    pub log_message_interval: i8,
}

impl Header {
    /// Header size in bytes.
    pub const SIZE: usize = 34;

    /// Supported PTP major version.
    pub const VERSION_2: u8 = 2;

    /// Byte offset of the correctionField within a message.
    pub const CORRECTION_FIELD_OFFSET: usize = 8;

    /// Create a header for the given type with protocol defaults.
    #[must_use]
    pub fn new(message_type: MessageType, source: PortIdentity, sequence_id: u16) -> Self {
        Self {
            transport_specific: 0,
            message_type,
            version: Self::VERSION_2,
            message_length: 0, // filled in on encode
            domain_number: 0,
            flags: 0,
            correction_field: 0,
            source_port_identity: source,
            sequence_id,
            control_field: message_type.control_field(),
            log_message_interval: 0x7F,
        }
    }

    /// Encode into the first 34 bytes of `buf`, writing the total
    /// message length (header + `body_length`).
    pub fn encode(&self, buf: &mut [u8], body_length: usize) -> Result<(), EncodeError> {
        if buf.len() < Self::SIZE {
            return Err(EncodeError::BufferTooSmall {
                needed: Self::SIZE,
                have: buf.len(),
            });
        }
        buf[0] = (self.transport_specific << 4) | (self.message_type.to_wire() & 0x0F);
        buf[1] = self.version & 0x0F;
        let total = u16::try_from(Self::SIZE + body_length).unwrap_or(u16::MAX);
        BigEndian::write_u16(&mut buf[2..4], total);
        buf[4] = self.domain_number;
        buf[5] = 0; // reserved
        BigEndian::write_u16(&mut buf[6..8], self.flags);
        BigEndian::write_i64(&mut buf[8..16], self.correction_field);
        buf[16..20].fill(0); // reserved
        buf[20..30].copy_from_slice(&self.source_port_identity.encode());
        BigEndian::write_u16(&mut buf[30..32], self.sequence_id);
        buf[32] = self.control_field;
        buf[33] = self.log_message_interval as u8;
        Ok(())
    }

    /// Decode the common header from a received buffer.
    ///
    /// Checks length, version, and that the declared message length both
    /// covers the header and fits inside the buffer. Nothing past the
    /// declared length is ever read.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < Self::SIZE {
            return Err(DecodeError::InvalidLength {
                needed: Self::SIZE,
                have: data.len(),
            });
        }
        let version = data[1] & 0x0F;
        if version != Self::VERSION_2 {
            return Err(DecodeError::InvalidVersion(version));
        }
        let message_type = MessageType::from_wire(data[0])?;
        let message_length = BigEndian::read_u16(&data[2..4]);
        if usize::from(message_length) < Self::SIZE {
            return Err(DecodeError::InvalidLength {
                needed: Self::SIZE,
                have: usize::from(message_length),
            });
        }
        if usize::from(message_length) > data.len() {
            return Err(DecodeError::InvalidLength {
                needed: usize::from(message_length),
                have: data.len(),
            });
        }
        let source_port_identity =
            PortIdentity::decode(&data[20..30]).ok_or(DecodeError::InvalidLength {
                needed: 30,
                have: data.len(),
            })?;
        Ok(Self {
            transport_specific: data[0] >> 4,
            message_type,
            version,
            message_length,
            domain_number: data[4],
            flags: BigEndian::read_u16(&data[6..8]),
            correction_field: BigEndian::read_i64(&data[8..16]),
            source_port_identity,
            sequence_id: BigEndian::read_u16(&data[30..32]),
            control_field: data[32],
            log_message_interval: data[33] as i8,
        })
    }

    /// Whether the two-step flag is set.
    #[must_use]
    pub const fn is_two_step(&self) -> bool {
        self.flags & flags::TWO_STEP != 0
    }
}
