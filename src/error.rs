//! Error types

use crate::port::PortState;

/// Main error type for PTP engine operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PtpError {
    /// A caller-supplied parameter is out of range or inconsistent.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// A buffer or message length is wrong.
    #[error("invalid length: need {needed} bytes, have {have}")]
    InvalidLength {
        /// Minimum bytes needed.
        needed: usize,
        /// Bytes actually available.
        have: usize,
    },

    /// Message carries an unsupported PTP version.
    #[error("invalid PTP version: {0} (only version 2 is supported)")]
    InvalidVersion(u8),

    /// A timestamp violates ordering or range constraints.
    #[error("invalid timestamp")]
    InvalidTimestamp,

    /// No port with the given number exists on this clock.
    #[error("invalid port number: {0}")]
    InvalidPort(u16),

    /// The message type is recognized but not handled in this role.
    #[error("unsupported message type: 0x{0:02X}")]
    UnsupportedMessage(u8),

    /// The messageLength header field disagrees with the buffer.
    #[error("message size mismatch: header says {declared}, buffer has {actual}")]
    InvalidMessageSize {
        /// Length declared by the header.
        declared: usize,
        /// Length actually available.
        actual: usize,
    },

    /// A HAL operation timed out, or a message is too old to process.
    #[error("timeout")]
    Timeout,

    /// A required resource is unavailable (table full, HAL missing).
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(&'static str),

    /// The operation is invalid for the port's current state.
    #[error("invalid operation in state {0:?}")]
    StateError(PortState),

    /// Message domain does not match under strict domain checking.
    #[error("domain mismatch: message domain {got}, local domain {expected}")]
    DomainError {
        /// Domain number carried by the message.
        got: u8,
        /// Locally configured domain number.
        expected: u8,
    },
}

/// Errors from decoding a received buffer into a typed message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Buffer too short for the claimed content.
    #[error("buffer too short: need {needed} bytes, have {have}")]
    InvalidLength {
        /// Minimum bytes needed.
        needed: usize,
        /// Bytes actually available.
        have: usize,
    },

    /// Major version is not 2.
    #[error("unsupported PTP version: {0}")]
    InvalidVersion(u8),

    /// The message-type nibble is not one this engine understands.
    #[error("unknown PTP message type: 0x{0:02X}")]
    UnknownType(u8),

    /// A TLV's declared length runs past the end of the message.
    #[error("truncated TLV: value ends at byte {needed}, message ends at {have}")]
    TruncatedTlv {
        /// Byte offset where the TLV value would end.
        needed: usize,
        /// Byte offset where the message actually ends.
        have: usize,
    },
}

/// Errors from encoding a typed message into a caller-supplied buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The destination buffer cannot hold the encoded message.
    #[error("buffer too small: need {needed} bytes, have {have}")]
    BufferTooSmall {
        /// Bytes the encoding requires.
        needed: usize,
        /// Bytes the buffer provides.
        have: usize,
    },
}

impl From<DecodeError> for PtpError {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::InvalidLength { needed, have }
            | DecodeError::TruncatedTlv { needed, have } => Self::InvalidLength { needed, have },
            DecodeError::InvalidVersion(v) => Self::InvalidVersion(v),
            DecodeError::UnknownType(t) => Self::UnsupportedMessage(t),
        }
    }
}

impl From<EncodeError> for PtpError {
    fn from(e: EncodeError) -> Self {
        let EncodeError::BufferTooSmall { needed, have } = e;
        Self::InvalidLength { needed, have }
    }
}
