//! Transparent clock: residence-time correction in transit.

use byteorder::{BigEndian, ByteOrder};
use tracing::warn;

use crate::error::PtpError;
use crate::messages::Header;
use crate::time::{TimeInterval, Timestamp};
use crate::types::DelayMechanism;

/// A transparent clock corrects forwarded PTP event messages for the
/// time they spent inside the device, without participating in master
/// election.
///
/// The correction is applied in the wire's scaled-nanoseconds ×2¹⁶
/// representation, bit-exact:
///
/// ```text
/// correctionField_out = correctionField_in + (tx_ts − rx_ts) × 2¹⁶
/// ```
///
/// An E2E transparent clock corrects every event message it forwards.
/// A P2P transparent clock corrects only Sync; `Pdelay` exchanges are
/// link-local and terminate at each hop rather than being forwarded.
#[derive(Debug, Clone)]
pub struct TransparentClock {
    mode: DelayMechanism,
    /// Frames whose correctionField was updated.
    pub residence_updates: u64,
    /// Frames dropped for a negative residence time.
    pub negative_residence_rejected: u64,
}

impl TransparentClock {
    /// Create a transparent clock in the given mode.
    #[must_use]
    pub const fn new(mode: DelayMechanism) -> Self {
        Self {
            mode,
            residence_updates: 0,
            negative_residence_rejected: 0,
        }
    }

    /// The configured mode.
    #[must_use]
    pub const fn mode(&self) -> DelayMechanism {
        self.mode
    }

    /// Residence time of a forwarded frame.
    ///
    /// # Errors
    /// [`PtpError::InvalidTimestamp`] when `tx` precedes `rx`.
    pub fn calculate_residence_time(
        rx: Timestamp,
        tx: Timestamp,
    ) -> Result<TimeInterval, PtpError> {
        let residence = tx - rx;
        if residence.is_negative() {
            return Err(PtpError::InvalidTimestamp);
        }
        Ok(residence)
    }

    /// Add a residence time to a correctionField value, in the wire's
    /// scaled-nanoseconds representation.
    #[must_use]
    pub const fn update_correction_field(correction_in: i64, residence: TimeInterval) -> i64 {
        correction_in.saturating_add(residence.to_scaled_ns())
    }

    /// Patch the correctionField of a frame being forwarded, given its
    /// ingress and egress timestamps.
    ///
    /// Non-event messages (and `Pdelay` frames in P2P mode) pass
    /// through untouched.
    ///
    /// # Errors
    /// Decode errors for malformed frames and
    /// [`PtpError::InvalidTimestamp`] for negative residence times; the
    /// frame is left unmodified in both cases.
    pub fn process_frame(
        &mut self,
        frame: &mut [u8],
        rx: Timestamp,
        tx: Timestamp,
    ) -> Result<(), PtpError> {
        let header = Header::decode(frame)?;
        if !self.corrects(&header) {
            return Ok(());
        }
        let residence = match Self::calculate_residence_time(rx, tx) {
            Ok(residence) => residence,
            Err(e) => {
                self.negative_residence_rejected += 1;
                warn!(%rx, %tx, "negative residence time, frame not corrected");
                return Err(e);
            }
        };
        let updated = Self::update_correction_field(header.correction_field, residence);
        BigEndian::write_i64(
            &mut frame[Header::CORRECTION_FIELD_OFFSET..Header::CORRECTION_FIELD_OFFSET + 8],
            updated,
        );
        self.residence_updates += 1;
        Ok(())
    }

    fn corrects(&self, header: &Header) -> bool {
        use crate::messages::MessageType;
        match self.mode {
            DelayMechanism::E2E => header.message_type.is_event(),
            DelayMechanism::P2P => header.message_type == MessageType::Sync,
        }
    }
}
