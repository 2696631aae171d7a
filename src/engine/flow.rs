//! Message-flow validation in front of the port.

use tracing::debug;

use crate::error::PtpError;
use crate::messages::Message;
use crate::time::{TimeInterval, Timestamp};
use crate::types::PtpConfig;

/// Validates incoming buffers before they reach a port.
///
/// Checks are ordered cheapest first: decode (version, length bounds),
/// then domain (under strict checking), then age against the local
/// clock. The caller counts the outcome; a failed message produces no
/// state change anywhere.
#[derive(Debug, Clone)]
pub struct MessageFlow {
    domain_number: u8,
    strict_domain: bool,
    max_age: TimeInterval,
}

impl MessageFlow {
    /// Build a flow validator from the port configuration.
    #[must_use]
    pub fn new(config: &PtpConfig) -> Self {
        Self {
            domain_number: config.domain_number,
            strict_domain: config.strict_domain_checking,
            max_age: TimeInterval::from_millis(
                i64::try_from(config.max_message_age_ms).unwrap_or(i64::MAX),
            ),
        }
    }

    /// Decode and validate a received buffer.
    ///
    /// # Errors
    /// Decode errors, [`PtpError::DomainError`] on a domain mismatch
    /// under strict checking, and [`PtpError::Timeout`] when the
    /// receive timestamp is older than the configured age bound.
    pub fn ingest(
        &self,
        data: &[u8],
        rx: Timestamp,
        now: Timestamp,
    ) -> Result<Message, PtpError> {
        let message = Message::decode(data).map_err(|e| {
            debug!(error = %e, len = data.len(), "message rejected by codec");
            PtpError::from(e)
        })?;

        if self.strict_domain && message.header.domain_number != self.domain_number {
            debug!(
                got = message.header.domain_number,
                expected = self.domain_number,
                "message rejected: wrong domain"
            );
            return Err(PtpError::DomainError {
                got: message.header.domain_number,
                expected: self.domain_number,
            });
        }

        if (now - rx) > self.max_age {
            debug!(%rx, %now, "message rejected: too old");
            return Err(PtpError::Timeout);
        }

        Ok(message)
    }
}
