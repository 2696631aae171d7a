//! Feeds offset samples into the PI servo and applies its corrections.

use tracing::warn;

use crate::hal::{AdjustMode, PortHal};
use crate::port::OffsetSample;
use crate::servo::{Correction, PiServo, ServoState};
use crate::time::Timestamp;
use crate::types::ServoConfig;

/// Owns the PI servo and routes its output to the clock HAL.
#[derive(Debug, Clone)]
pub struct ServoCoordinator {
    servo: PiServo,
    /// Corrections that failed to apply at the HAL.
    pub apply_failures: u64,
}

impl ServoCoordinator {
    /// Create a coordinator with the given servo tuning.
    #[must_use]
    pub fn new(config: ServoConfig) -> Self {
        Self {
            servo: PiServo::new(config),
            apply_failures: 0,
        }
    }

    /// Feed one offset sample and apply the resulting correction.
    ///
    /// HAL failures are logged and counted; the servo state machine has
    /// already advanced, so the next sample continues from there.
    pub fn ingest<H: PortHal>(&mut self, sample: OffsetSample, hal: &mut H, now: Timestamp) {
        let result = match self.servo.update(sample.offset, now) {
            Correction::Step(offset) => hal.adjust_clock(offset, AdjustMode::Step),
            Correction::Frequency(ppb) => hal.adjust_frequency(ppb),
        };
        if let Err(error) = result {
            self.apply_failures += 1;
            warn!(%error, "clock correction failed to apply");
        }
    }

    /// Periodic holdover check.
    pub fn tick(&mut self, now: Timestamp) {
        self.servo.check_holdover(now);
    }

    /// Current servo lock state.
    #[must_use]
    pub const fn state(&self) -> ServoState {
        self.servo.state()
    }

    /// The PI servo for counter and gauge reads.
    #[must_use]
    pub const fn servo(&self) -> &PiServo {
        &self.servo
    }

    /// Reset the servo, dropping accumulated control state.
    pub fn reset(&mut self) {
        self.servo.reset();
    }
}
