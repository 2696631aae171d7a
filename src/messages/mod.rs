//! PTP message types, parsing, and encoding.
//!
//! Implements the IEEE 1588-2019 message formats: the 34-byte common
//! header, the typed bodies, and a forward-compatible TLV walk over
//! whatever trails the fixed body. All multi-byte fields are big-endian
//! on the wire; decoding never reads past the header's declared
//! messageLength and never panics on malformed input.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{DecodeError, EncodeError};
use crate::time::Timestamp;
use crate::types::{ClockIdentity, ClockQuality, PortIdentity, TimeSource};

pub mod header;
pub mod tlv;

#[cfg(test)]
mod tests;

pub use header::{flags, Header};
pub use tlv::{Tlv, TlvIter};

/// PTP message type identifiers (IEEE 1588 §13.3.2.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Sync (master → slave), carries T1.
    Sync,
    /// Delay request (slave → master), sent at T3.
    DelayReq,
    /// Peer delay request (P2P link measurement).
    PdelayReq,
    /// Peer delay response.
    PdelayResp,
    /// Follow-up (master → slave), carries precise T1.
    FollowUp,
    /// Delay response (master → slave), carries T4.
    DelayResp,
    /// Peer delay response follow-up.
    PdelayRespFollowUp,
    /// Announce (master → all), clock properties for BMCA.
    Announce,
    /// Signaling (TLV container).
    Signaling,
    /// Management.
    Management,
}

impl MessageType {
    /// Parse from the lower 4 bits of the first header byte.
    pub fn from_wire(value: u8) -> Result<Self, DecodeError> {
        match value & 0x0F {
            0x0 => Ok(Self::Sync),
            0x1 => Ok(Self::DelayReq),
            0x2 => Ok(Self::PdelayReq),
            0x3 => Ok(Self::PdelayResp),
            0x8 => Ok(Self::FollowUp),
            0x9 => Ok(Self::DelayResp),
            0xA => Ok(Self::PdelayRespFollowUp),
            0xB => Ok(Self::Announce),
            0xC => Ok(Self::Signaling),
            0xD => Ok(Self::Management),
            other => Err(DecodeError::UnknownType(other)),
        }
    }

    /// The wire nibble for this type.
    #[must_use]
    pub const fn to_wire(self) -> u8 {
        match self {
            Self::Sync => 0x0,
            Self::DelayReq => 0x1,
            Self::PdelayReq => 0x2,
            Self::PdelayResp => 0x3,
            Self::FollowUp => 0x8,
            Self::DelayResp => 0x9,
            Self::PdelayRespFollowUp => 0xA,
            Self::Announce => 0xB,
            Self::Signaling => 0xC,
            Self::Management => 0xD,
        }
    }

    /// Whether this type is an event message (requires rx/tx timestamping).
    #[must_use]
    pub const fn is_event(self) -> bool {
        matches!(
            self,
            Self::Sync | Self::DelayReq | Self::PdelayReq | Self::PdelayResp
        )
    }

    /// Whether this type is a general message.
    #[must_use]
    pub const fn is_general(self) -> bool {
        !self.is_event()
    }

    /// The v1-compatibility control field value for this type.
    #[must_use]
    pub const fn control_field(self) -> u8 {
        match self {
            Self::Sync => 0x00,
            Self::DelayReq => 0x01,
            Self::FollowUp => 0x02,
            Self::DelayResp => 0x03,
            Self::Management => 0x04,
            _ => 0x05,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync => write!(f, "Sync"),
            Self::DelayReq => write!(f, "Delay_Req"),
            Self::PdelayReq => write!(f, "Pdelay_Req"),
            Self::PdelayResp => write!(f, "Pdelay_Resp"),
            Self::FollowUp => write!(f, "Follow_Up"),
            Self::DelayResp => write!(f, "Delay_Resp"),
            Self::PdelayRespFollowUp => write!(f, "Pdelay_Resp_Follow_Up"),
            Self::Announce => write!(f, "Announce"),
            Self::Signaling => write!(f, "Signaling"),
            Self::Management => write!(f, "Management"),
        }
    }
}

/// Announce body: the grandmaster description evaluated by BMCA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnounceBody {
    /// Origin timestamp (may be zero; informational).
    pub origin_timestamp: Timestamp,
    /// Current TAI−UTC offset in seconds.
    pub current_utc_offset: i16,
    /// Grandmaster priority1.
    pub grandmaster_priority1: u8,
    /// Grandmaster clock quality.
    pub grandmaster_clock_quality: ClockQuality,
    /// Grandmaster priority2.
    pub grandmaster_priority2: u8,
    /// Grandmaster identity.
    pub grandmaster_identity: ClockIdentity,
    /// Hops between the sender and the grandmaster.
    pub steps_removed: u16,
    /// The grandmaster's time source.
    pub time_source: TimeSource,
}

impl AnnounceBody {
    /// Fixed body size on the wire.
    pub const WIRE_SIZE: usize = 30;

    fn encode(&self, buf: &mut [u8]) {
        buf[0..10].copy_from_slice(&self.origin_timestamp.encode());
        BigEndian::write_i16(&mut buf[10..12], self.current_utc_offset);
        buf[12] = 0; // reserved
        buf[13] = self.grandmaster_priority1;
        buf[14..18].copy_from_slice(&self.grandmaster_clock_quality.encode());
        buf[18] = self.grandmaster_priority2;
        buf[19..27].copy_from_slice(&self.grandmaster_identity.0);
        BigEndian::write_u16(&mut buf[27..29], self.steps_removed);
        buf[29] = self.time_source.to_wire();
    }

    fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < Self::WIRE_SIZE {
            return None;
        }
        Some(Self {
            origin_timestamp: Timestamp::decode(&data[0..10])?,
            current_utc_offset: BigEndian::read_i16(&data[10..12]),
            grandmaster_priority1: data[13],
            grandmaster_clock_quality: ClockQuality::decode(&data[14..18])?,
            grandmaster_priority2: data[18],
            grandmaster_identity: ClockIdentity::decode(&data[19..27])?,
            steps_removed: BigEndian::read_u16(&data[27..29]),
            time_source: TimeSource::from_wire(data[29]),
        })
    }
}

/// Typed message bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageBody {
    /// Sync: origin timestamp (approximate when two-step).
    Sync {
        /// Origin timestamp.
        origin_timestamp: Timestamp,
    },
    /// Delay request: origin timestamp (T3).
    DelayReq {
        /// Origin timestamp.
        origin_timestamp: Timestamp,
    },
    /// Follow-up: precise origin timestamp (T1).
    FollowUp {
        /// Precise origin timestamp from the associated Sync.
        precise_origin_timestamp: Timestamp,
    },
    /// Delay response: receive timestamp (T4) and the requester.
    DelayResp {
        /// When the master received the `Delay_Req`.
        receive_timestamp: Timestamp,
        /// Port identity of the requester.
        requesting_port_identity: PortIdentity,
    },
    /// Peer delay request.
    PdelayReq {
        /// Origin timestamp.
        origin_timestamp: Timestamp,
    },
    /// Peer delay response.
    PdelayResp {
        /// When the peer received the `Pdelay_Req`.
        request_receipt_timestamp: Timestamp,
        /// Port identity of the requester.
        requesting_port_identity: PortIdentity,
    },
    /// Peer delay response follow-up.
    PdelayRespFollowUp {
        /// When the peer transmitted the `Pdelay_Resp`.
        response_origin_timestamp: Timestamp,
        /// Port identity of the requester.
        requesting_port_identity: PortIdentity,
    },
    /// Announce: grandmaster description.
    Announce(AnnounceBody),
    /// Signaling stub: the header-adjacent target identity only.
    Signaling {
        /// Port this signaling message addresses.
        target_port_identity: PortIdentity,
    },
    /// Management stub: the header-adjacent target identity only.
    Management {
        /// Port this management message addresses.
        target_port_identity: PortIdentity,
    },
}

/// A parsed PTP message: header plus typed body.
///
/// TLVs trailing the fixed body are validated on decode (a truncated
/// record is an error; an unknown one is not) and skipped; callers who
/// need them walk the raw suffix with [`TlvIter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    /// Message header.
    pub header: Header,
    /// Message body.
    pub body: MessageBody,
}

/// Body size for Sync/FollowUp/DelayReq: one 10-byte timestamp.
const TIMESTAMP_BODY_SIZE: usize = 10;
/// Body size for DelayResp/PdelayResp/PdelayRespFollowUp: timestamp + identity.
const TS_AND_IDENTITY_BODY_SIZE: usize = 20;
/// Body size for PdelayReq: timestamp + 10 reserved bytes.
const PDELAY_REQ_BODY_SIZE: usize = 20;
/// Body size for the Signaling/Management stub: target identity.
const TARGET_IDENTITY_BODY_SIZE: usize = 10;

impl Message {
    /// Largest fixed message this engine produces (Announce, 64 bytes).
    pub const MAX_FIXED_SIZE: usize = Header::SIZE + AnnounceBody::WIRE_SIZE;

    /// Parse a complete message from a received buffer.
    ///
    /// The buffer may be longer than the message (link-layer padding);
    /// everything past the header's messageLength is ignored.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let header = Header::decode(data)?;
        // Header::decode guarantees message_length fits in `data`.
        let message = &data[..usize::from(header.message_length)];
        let body_data = &message[Header::SIZE..];

        let too_short = |needed: usize| DecodeError::InvalidLength {
            needed: Header::SIZE + needed,
            have: message.len(),
        };

        let (body, fixed_len) = match header.message_type {
            MessageType::Sync => (
                MessageBody::Sync {
                    origin_timestamp: Timestamp::decode(body_data)
                        .ok_or_else(|| too_short(TIMESTAMP_BODY_SIZE))?,
                },
                TIMESTAMP_BODY_SIZE,
            ),
            MessageType::DelayReq => (
                MessageBody::DelayReq {
                    origin_timestamp: Timestamp::decode(body_data)
                        .ok_or_else(|| too_short(TIMESTAMP_BODY_SIZE))?,
                },
                TIMESTAMP_BODY_SIZE,
            ),
            MessageType::FollowUp => (
                MessageBody::FollowUp {
                    precise_origin_timestamp: Timestamp::decode(body_data)
                        .ok_or_else(|| too_short(TIMESTAMP_BODY_SIZE))?,
                },
                TIMESTAMP_BODY_SIZE,
            ),
            MessageType::DelayResp => {
                if body_data.len() < TS_AND_IDENTITY_BODY_SIZE {
                    return Err(too_short(TS_AND_IDENTITY_BODY_SIZE));
                }
                (
                    MessageBody::DelayResp {
                        receive_timestamp: Timestamp::decode(&body_data[0..10])
                            .ok_or_else(|| too_short(TS_AND_IDENTITY_BODY_SIZE))?,
                        requesting_port_identity: PortIdentity::decode(&body_data[10..20])
                            .ok_or_else(|| too_short(TS_AND_IDENTITY_BODY_SIZE))?,
                    },
                    TS_AND_IDENTITY_BODY_SIZE,
                )
            }
            MessageType::PdelayReq => {
                if body_data.len() < PDELAY_REQ_BODY_SIZE {
                    return Err(too_short(PDELAY_REQ_BODY_SIZE));
                }
                (
                    MessageBody::PdelayReq {
                        origin_timestamp: Timestamp::decode(body_data)
                            .ok_or_else(|| too_short(PDELAY_REQ_BODY_SIZE))?,
                    },
                    PDELAY_REQ_BODY_SIZE,
                )
            }
            MessageType::PdelayResp => {
                if body_data.len() < TS_AND_IDENTITY_BODY_SIZE {
                    return Err(too_short(TS_AND_IDENTITY_BODY_SIZE));
                }
                (
                    MessageBody::PdelayResp {
                        request_receipt_timestamp: Timestamp::decode(&body_data[0..10])
                            .ok_or_else(|| too_short(TS_AND_IDENTITY_BODY_SIZE))?,
                        requesting_port_identity: PortIdentity::decode(&body_data[10..20])
                            .ok_or_else(|| too_short(TS_AND_IDENTITY_BODY_SIZE))?,
                    },
                    TS_AND_IDENTITY_BODY_SIZE,
                )
            }
            MessageType::PdelayRespFollowUp => {
                if body_data.len() < TS_AND_IDENTITY_BODY_SIZE {
                    return Err(too_short(TS_AND_IDENTITY_BODY_SIZE));
                }
                (
                    MessageBody::PdelayRespFollowUp {
                        response_origin_timestamp: Timestamp::decode(&body_data[0..10])
                            .ok_or_else(|| too_short(TS_AND_IDENTITY_BODY_SIZE))?,
                        requesting_port_identity: PortIdentity::decode(&body_data[10..20])
                            .ok_or_else(|| too_short(TS_AND_IDENTITY_BODY_SIZE))?,
                    },
                    TS_AND_IDENTITY_BODY_SIZE,
                )
            }
            MessageType::Announce => (
                MessageBody::Announce(
                    AnnounceBody::decode(body_data)
                        .ok_or_else(|| too_short(AnnounceBody::WIRE_SIZE))?,
                ),
                AnnounceBody::WIRE_SIZE,
            ),
            MessageType::Signaling => (
                MessageBody::Signaling {
                    target_port_identity: PortIdentity::decode(body_data)
                        .ok_or_else(|| too_short(TARGET_IDENTITY_BODY_SIZE))?,
                },
                TARGET_IDENTITY_BODY_SIZE,
            ),
            MessageType::Management => (
                MessageBody::Management {
                    target_port_identity: PortIdentity::decode(body_data)
                        .ok_or_else(|| too_short(TARGET_IDENTITY_BODY_SIZE))?,
                },
                TARGET_IDENTITY_BODY_SIZE,
            ),
        };

        // Whatever trails the fixed body must be a well-formed TLV chain.
        TlvIter::validate(&body_data[fixed_len..], Header::SIZE + fixed_len)?;

        Ok(Self { header, body })
    }

    /// The fixed body length this message encodes to.
    #[must_use]
    pub const fn body_length(&self) -> usize {
        match self.body {
            MessageBody::Sync { .. }
            | MessageBody::DelayReq { .. }
            | MessageBody::FollowUp { .. } => TIMESTAMP_BODY_SIZE,
            MessageBody::DelayResp { .. }
            | MessageBody::PdelayReq { .. }
            | MessageBody::PdelayResp { .. }
            | MessageBody::PdelayRespFollowUp { .. } => TS_AND_IDENTITY_BODY_SIZE,
            MessageBody::Announce(_) => AnnounceBody::WIRE_SIZE,
            MessageBody::Signaling { .. } | MessageBody::Management { .. } => {
                TARGET_IDENTITY_BODY_SIZE
            }
        }
    }

    /// The total encoded size of this message.
    #[must_use]
    pub const fn encoded_length(&self) -> usize {
        Header::SIZE + self.body_length()
    }

    /// Encode into `buf`, returning the number of bytes written.
    ///
    /// The written prefix is exactly the messageLength the header
    /// declares.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        let total = self.encoded_length();
        if buf.len() < total {
            return Err(EncodeError::BufferTooSmall {
                needed: total,
                have: buf.len(),
            });
        }
        self.header.encode(buf, self.body_length())?;
        let body = &mut buf[Header::SIZE..total];
        match &self.body {
            MessageBody::Sync { origin_timestamp }
            | MessageBody::DelayReq { origin_timestamp } => {
                body[0..10].copy_from_slice(&origin_timestamp.encode());
            }
            MessageBody::FollowUp {
                precise_origin_timestamp,
            } => {
                body[0..10].copy_from_slice(&precise_origin_timestamp.encode());
            }
            MessageBody::DelayResp {
                receive_timestamp,
                requesting_port_identity,
            } => {
                body[0..10].copy_from_slice(&receive_timestamp.encode());
                body[10..20].copy_from_slice(&requesting_port_identity.encode());
            }
            MessageBody::PdelayReq { origin_timestamp } => {
                body[0..10].copy_from_slice(&origin_timestamp.encode());
                body[10..20].fill(0); // reserved
            }
            MessageBody::PdelayResp {
                request_receipt_timestamp,
                requesting_port_identity,
            } => {
                body[0..10].copy_from_slice(&request_receipt_timestamp.encode());
                body[10..20].copy_from_slice(&requesting_port_identity.encode());
            }
            MessageBody::PdelayRespFollowUp {
                response_origin_timestamp,
                requesting_port_identity,
            } => {
                body[0..10].copy_from_slice(&response_origin_timestamp.encode());
                body[10..20].copy_from_slice(&requesting_port_identity.encode());
            }
            MessageBody::Announce(announce) => announce.encode(body),
            MessageBody::Signaling {
                target_port_identity,
            }
            | MessageBody::Management {
                target_port_identity,
            } => {
                body[0..10].copy_from_slice(&target_port_identity.encode());
            }
        }
        Ok(total)
    }

    // ---- Constructors ----

    /// Create a Sync message (two-step flag set; the precise T1 follows
    /// in a `Follow_Up`).
    #[must_use]
    pub fn sync(source: PortIdentity, sequence_id: u16, origin: Timestamp) -> Self {
        let mut header = Header::new(MessageType::Sync, source, sequence_id);
        header.flags |= flags::TWO_STEP;
        Self {
            header,
            body: MessageBody::Sync {
                origin_timestamp: origin,
            },
        }
    }

    /// Create a Follow-up carrying the precise Sync origin timestamp.
    #[must_use]
    pub fn follow_up(source: PortIdentity, sequence_id: u16, precise_origin: Timestamp) -> Self {
        Self {
            header: Header::new(MessageType::FollowUp, source, sequence_id),
            body: MessageBody::FollowUp {
                precise_origin_timestamp: precise_origin,
            },
        }
    }

    /// Create a Delay request.
    #[must_use]
    pub fn delay_req(source: PortIdentity, sequence_id: u16, origin: Timestamp) -> Self {
        Self {
            header: Header::new(MessageType::DelayReq, source, sequence_id),
            body: MessageBody::DelayReq {
                origin_timestamp: origin,
            },
        }
    }

    /// Create a Delay response to `requesting_port`.
    #[must_use]
    pub fn delay_resp(
        source: PortIdentity,
        sequence_id: u16,
        receive_timestamp: Timestamp,
        requesting_port: PortIdentity,
    ) -> Self {
        Self {
            header: Header::new(MessageType::DelayResp, source, sequence_id),
            body: MessageBody::DelayResp {
                receive_timestamp,
                requesting_port_identity: requesting_port,
            },
        }
    }

    /// Create an Announce message.
    #[must_use]
    pub fn announce(source: PortIdentity, sequence_id: u16, body: AnnounceBody) -> Self {
        Self {
            header: Header::new(MessageType::Announce, source, sequence_id),
            body: MessageBody::Announce(body),
        }
    }
}
