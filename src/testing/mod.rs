//! In-memory HAL implementations for tests and examples.
//!
//! [`RecordingHal`] stands in for a platform: it serves a settable
//! clock, records every transmitted frame and clock adjustment, and can
//! be told to fail sends or to produce hardware egress timestamps.

use crate::error::PtpError;
use crate::hal::{AdjustMode, PortHal};
use crate::time::{TimeInterval, Timestamp};

/// Which HAL capability a frame was sent through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentKind {
    /// `send_announce`
    Announce,
    /// `send_sync`
    Sync,
    /// `send_follow_up`
    FollowUp,
    /// `send_delay_req`
    DelayReq,
    /// `send_delay_resp`
    DelayResp,
}

/// A recorded transmission.
#[derive(Debug, Clone)]
pub struct SentFrame {
    /// Capability the frame went through.
    pub kind: SentKind,
    /// The encoded bytes.
    pub bytes: Vec<u8>,
    /// Local clock at transmission.
    pub at: Timestamp,
}

/// A recorded clock adjustment.
#[derive(Debug, Clone, PartialEq)]
pub enum ClockAdjustment {
    /// `adjust_clock(offset, mode)`
    Phase {
        /// The measured offset passed in.
        offset: TimeInterval,
        /// Step or slew.
        mode: AdjustMode,
    },
    /// `adjust_frequency(ppb)`
    Frequency(f64),
}

/// A HAL that records everything and owns a manually advanced clock.
#[derive(Debug, Default)]
pub struct RecordingHal {
    /// The local clock; tests set and advance this directly.
    pub now: Timestamp,
    /// Every frame sent, in order.
    pub sent: Vec<SentFrame>,
    /// Every clock adjustment, in order.
    pub adjustments: Vec<ClockAdjustment>,
    /// When true, every send fails with `Timeout`.
    pub fail_sends: bool,
    /// When true, sends return `now` as the hardware egress timestamp.
    pub hardware_timestamps: bool,
}

impl RecordingHal {
    /// A HAL with its clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A HAL with its clock at `now`.
    #[must_use]
    pub fn at(now: Timestamp) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    /// Frames of one kind, in send order.
    #[must_use]
    pub fn sent_of(&self, kind: SentKind) -> Vec<&SentFrame> {
        self.sent.iter().filter(|f| f.kind == kind).collect()
    }

    /// Count of frames of one kind.
    #[must_use]
    pub fn count_of(&self, kind: SentKind) -> usize {
        self.sent.iter().filter(|f| f.kind == kind).count()
    }

    fn record(&mut self, kind: SentKind, frame: &[u8]) -> Result<Option<Timestamp>, PtpError> {
        if self.fail_sends {
            return Err(PtpError::Timeout);
        }
        self.sent.push(SentFrame {
            kind,
            bytes: frame.to_vec(),
            at: self.now,
        });
        Ok(self.hardware_timestamps.then_some(self.now))
    }
}

impl PortHal for RecordingHal {
    fn send_announce(&mut self, frame: &[u8]) -> Result<Option<Timestamp>, PtpError> {
        self.record(SentKind::Announce, frame)
    }

    fn send_sync(&mut self, frame: &[u8]) -> Result<Option<Timestamp>, PtpError> {
        self.record(SentKind::Sync, frame)
    }

    fn send_follow_up(&mut self, frame: &[u8]) -> Result<Option<Timestamp>, PtpError> {
        self.record(SentKind::FollowUp, frame)
    }

    fn send_delay_req(&mut self, frame: &[u8]) -> Result<Option<Timestamp>, PtpError> {
        self.record(SentKind::DelayReq, frame)
    }

    fn send_delay_resp(&mut self, frame: &[u8]) -> Result<Option<Timestamp>, PtpError> {
        self.record(SentKind::DelayResp, frame)
    }

    fn timestamp(&mut self) -> Timestamp {
        self.now
    }

    fn adjust_clock(&mut self, offset: TimeInterval, mode: AdjustMode) -> Result<(), PtpError> {
        self.adjustments.push(ClockAdjustment::Phase { offset, mode });
        Ok(())
    }

    fn adjust_frequency(&mut self, ppb: f64) -> Result<(), PtpError> {
        self.adjustments.push(ClockAdjustment::Frequency(ppb));
        Ok(())
    }
}
