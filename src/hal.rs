//! Hardware abstraction: the capability set the engine consumes.
//!
//! The platform implements [`PortHal`] and injects it at port
//! construction as a generic parameter, so there is no dynamic dispatch
//! on the hot path. All operations are synchronous and non-blocking;
//! an implementation that cannot complete immediately returns
//! [`PtpError::Timeout`] rather than stalling the engine.
//!
//! The HAL must serialize concurrent receive deliveries before calling
//! into the engine: `process_message` and `tick` are never entered
//! concurrently.

use crate::error::PtpError;
use crate::time::{TimeInterval, Timestamp};

/// How a phase correction is applied to the local clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustMode {
    /// Jump the clock immediately.
    Step,
    /// Let the frequency servo walk the clock in.
    Slew,
}

/// Platform capabilities a PTP port requires.
///
/// The `send_*` methods transmit an already-encoded frame and return
/// the hardware egress timestamp when the platform captures one;
/// `None` means no hardware timestamping, and the engine falls back to
/// software timestamps (degraded accuracy, not a fault). The peer-delay
/// frames of the P2P mechanism travel through the same capabilities as
/// their end-to-end counterparts.
///
/// `adjust_clock(offset, mode)` receives the measured offset from the
/// master; the implementation removes it (a positive offset means the
/// local clock is ahead). `adjust_frequency(ppb)` receives the servo
/// output computed from that same offset sign convention and applies it
/// so the measured offset is driven toward zero.
pub trait PortHal {
    /// Transmit an Announce frame (general port).
    fn send_announce(&mut self, frame: &[u8]) -> Result<Option<Timestamp>, PtpError>;

    /// Transmit a Sync frame (event port, timestamped).
    fn send_sync(&mut self, frame: &[u8]) -> Result<Option<Timestamp>, PtpError>;

    /// Transmit a Follow-up frame (general port).
    fn send_follow_up(&mut self, frame: &[u8]) -> Result<Option<Timestamp>, PtpError>;

    /// Transmit a Delay or Pdelay request frame (event port, timestamped).
    fn send_delay_req(&mut self, frame: &[u8]) -> Result<Option<Timestamp>, PtpError>;

    /// Transmit a Delay or Pdelay response frame.
    fn send_delay_resp(&mut self, frame: &[u8]) -> Result<Option<Timestamp>, PtpError>;

    /// Read the local clock.
    fn timestamp(&mut self) -> Timestamp;

    /// Apply a phase correction for the given measured offset.
    fn adjust_clock(&mut self, offset: TimeInterval, mode: AdjustMode) -> Result<(), PtpError>;

    /// Apply a frequency correction in parts per billion.
    fn adjust_frequency(&mut self, ppb: f64) -> Result<(), PtpError>;
}
