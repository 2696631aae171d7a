//! Clock containers: ordinary, boundary, and transparent.
//!
//! A container owns its ports and the coordinators that wire them to
//! the servo and the observability surface. Dispatch between the clock
//! kinds is by match over [`Clock`], not virtual calls.

mod boundary;
mod ordinary;
mod transparent;

#[cfg(test)]
mod tests;

pub use boundary::{BoundaryClock, MAX_PORTS};
pub use ordinary::OrdinaryClock;
pub use transparent::TransparentClock;

use crate::error::PtpError;
use crate::hal::PortHal;
use crate::time::Timestamp;

/// A PTP clock of any kind.
pub enum Clock<H: PortHal> {
    /// Single-port clock.
    Ordinary(OrdinaryClock<H>),
    /// Multi-port clock that both synchronizes and distributes.
    Boundary(BoundaryClock<H>),
    /// Residence-time corrector without protocol state machines.
    Transparent(TransparentClock),
}

impl<H: PortHal> Clock<H> {
    /// Forward a tick to the contained clock.
    ///
    /// Transparent clocks have no timers; their tick is a no-op.
    pub fn tick(&mut self, now: Timestamp) {
        match self {
            Self::Ordinary(clock) => clock.tick(now),
            Self::Boundary(clock) => clock.tick(now),
            Self::Transparent(_) => {}
        }
    }

    /// Process a received buffer on the given port.
    ///
    /// Ordinary and transparent clocks ignore `port_number`.
    ///
    /// # Errors
    /// [`PtpError::InvalidPort`] for an unknown boundary-clock port.
    pub fn process_message(
        &mut self,
        port_number: u16,
        data: &[u8],
        rx: Timestamp,
    ) -> Result<(), PtpError> {
        match self {
            Self::Ordinary(clock) => {
                clock.process_message(data, rx);
                Ok(())
            }
            Self::Boundary(clock) => clock.process_message(port_number, data, rx),
            Self::Transparent(_) => Ok(()),
        }
    }
}
