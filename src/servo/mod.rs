//! PI clock servo with anti-windup, rate limiting, and a lock state
//! machine.
//!
//! The servo consumes offset samples in nanoseconds and produces either
//! a phase step (large offset, not locked) or a frequency slew in parts
//! per billion. It never touches the wire's scaled-nanosecond
//! representation; that conversion belongs to the codec and the
//! transparent clock.

use tracing::{debug, info};

use crate::time::{TimeInterval, Timestamp};
use crate::types::ServoConfig;


/// Lock progression of the servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServoState {
    /// No sample has been processed yet.
    #[default]
    Uninitialized,
    /// Offsets are large or erratic.
    Unlocked,
    /// Offsets are inside the locking threshold and shrinking.
    Locking,
    /// Offsets have stayed inside the lock threshold long enough.
    Locked,
    /// No update within the holdover timeout; last frequency held.
    Holdover,
}

/// Correction the caller should apply through the HAL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    /// Step the clock phase: the measured offset to remove.
    Step(TimeInterval),
    /// Slew the clock frequency by this output, in ppb.
    Frequency(f64),
}

/// Proportional-integral servo.
#[derive(Debug, Clone)]
pub struct PiServo {
    config: ServoConfig,
    state: ServoState,
    /// Accumulated error term Σe, in nanoseconds.
    integral: f64,
    /// Last frequency output, in ppb.
    output_ppb: f64,
    /// Samples in a row inside the lock threshold.
    consecutive_in_lock: u32,
    last_update: Option<Timestamp>,
    step_count: u64,
    slew_count: u64,
    rate_limit_hits: u64,
    anti_windup_activations: u64,
}

impl PiServo {
    /// Create a servo with the given tuning.
    #[must_use]
    pub fn new(config: ServoConfig) -> Self {
        Self {
            config,
            state: ServoState::Uninitialized,
            integral: 0.0,
            output_ppb: 0.0,
            consecutive_in_lock: 0,
            last_update: None,
            step_count: 0,
            slew_count: 0,
            rate_limit_hits: 0,
            anti_windup_activations: 0,
        }
    }

    /// Feed one offset sample and obtain the correction to apply.
    ///
    /// `now` is the local time the sample was taken; it drives rate
    /// limiting and holdover detection and must be monotonic across
    /// calls.
    pub fn update(&mut self, offset: TimeInterval, now: Timestamp) -> Correction {
        let abs_offset = offset.abs().nanos();

        // Large offsets are stepped out, not slewed, unless locked.
        if abs_offset > self.config.step_threshold_ns && self.state != ServoState::Locked {
            self.step_count += 1;
            self.integral = 0.0;
            self.output_ppb = 0.0;
            self.consecutive_in_lock = 0;
            self.state = ServoState::Unlocked;
            self.last_update = Some(now);
            info!(offset = %offset, "servo stepping clock phase");
            return Correction::Step(offset);
        }

        let elapsed_secs = self
            .last_update
            .map_or(1.0, |last| (now - last).as_secs_f64().max(1e-3));
        self.last_update = Some(now);

        #[allow(clippy::cast_precision_loss, reason = "offsets fit f64 exactly below 2^53 ns")]
        let error = offset.nanos() as f64;

        // Integrate with anti-windup: the integral contribution is
        // clamped, and the stored term saturates with it.
        self.integral += error * elapsed_secs;
        let integral_limit = self.config.integral_limit_ppb / self.config.ki.max(f64::MIN_POSITIVE);
        if self.integral.abs() > integral_limit {
            self.integral = self.integral.clamp(-integral_limit, integral_limit);
            self.anti_windup_activations += 1;
        }

        let raw = self.config.kp * error + self.config.ki * self.integral;
        let clamped = raw.clamp(-self.config.max_freq_ppb, self.config.max_freq_ppb);

        // Rate limiting against the previous output.
        let max_delta = self.config.max_rate_ppb_per_sec * elapsed_secs;
        let limited = if (clamped - self.output_ppb).abs() > max_delta {
            self.rate_limit_hits += 1;
            if clamped > self.output_ppb {
                self.output_ppb + max_delta
            } else {
                self.output_ppb - max_delta
            }
        } else {
            clamped
        };

        self.output_ppb = limited;
        self.slew_count += 1;
        self.advance_lock_state(abs_offset);
        debug!(
            offset = %offset,
            output_ppb = self.output_ppb,
            state = ?self.state,
            "servo slew"
        );
        Correction::Frequency(self.output_ppb)
    }

    /// Check for a missing-update timeout. Called from `tick`.
    ///
    /// In holdover the last frequency output remains in effect; the
    /// servo does not command any change.
    pub fn check_holdover(&mut self, now: Timestamp) {
        if self.state == ServoState::Uninitialized || self.state == ServoState::Holdover {
            return;
        }
        if let Some(last) = self.last_update {
            let timeout = TimeInterval::from_millis(
                i64::try_from(self.config.holdover_timeout_ms).unwrap_or(i64::MAX),
            );
            if (now - last) > timeout {
                info!("servo entering holdover, preserving {} ppb", self.output_ppb);
                self.state = ServoState::Holdover;
                self.consecutive_in_lock = 0;
            }
        }
    }

    fn advance_lock_state(&mut self, abs_offset_ns: i64) {
        if abs_offset_ns > self.config.unlock_threshold_ns {
            if matches!(self.state, ServoState::Locked | ServoState::Locking) {
                info!(offset_ns = abs_offset_ns, "servo lost lock");
            }
            self.state = ServoState::Unlocked;
            self.consecutive_in_lock = 0;
            return;
        }

        if abs_offset_ns < self.config.lock_threshold_ns {
            self.consecutive_in_lock += 1;
            if self.consecutive_in_lock >= self.config.samples_for_lock {
                if self.state != ServoState::Locked {
                    info!(samples = self.consecutive_in_lock, "servo locked");
                }
                self.state = ServoState::Locked;
                return;
            }
        } else {
            self.consecutive_in_lock = 0;
        }

        if self.state != ServoState::Locked {
            self.state = if abs_offset_ns < self.config.locking_threshold_ns {
                ServoState::Locking
            } else {
                ServoState::Unlocked
            };
        }
    }

    /// Current lock state.
    #[must_use]
    pub const fn state(&self) -> ServoState {
        self.state
    }

    /// Most recent frequency output in ppb (held through holdover).
    #[must_use]
    pub const fn frequency_ppb(&self) -> f64 {
        self.output_ppb
    }

    /// Phase steps issued.
    #[must_use]
    pub const fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Frequency slews issued.
    #[must_use]
    pub const fn slew_count(&self) -> u64 {
        self.slew_count
    }

    /// Times the output hit the rate limiter.
    #[must_use]
    pub const fn rate_limit_hits(&self) -> u64 {
        self.rate_limit_hits
    }

    /// Times the integrator hit its anti-windup clamp.
    #[must_use]
    pub const fn anti_windup_activations(&self) -> u64 {
        self.anti_windup_activations
    }

    /// Reset to the uninitialized state, dropping all history.
    pub fn reset(&mut self) {
        self.state = ServoState::Uninitialized;
        self.integral = 0.0;
        self.output_ppb = 0.0;
        self.consecutive_in_lock = 0;
        self.last_update = None;
    }
}
