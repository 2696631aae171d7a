//! Heartbeat pacing and aggregated health snapshots.

use crate::engine::sync::SyncHealth;
use crate::port::PortState;
use crate::servo::ServoState;
use crate::time::{TimeInterval, Timestamp};

/// Aggregated engine health, published once per heartbeat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthStatus {
    /// State of the (slave-selected) port.
    pub port_state: PortState,
    /// Synchronization quality classification.
    pub sync_health: SyncHealth,
    /// Servo lock state.
    pub servo_state: ServoState,
    /// Latest offset from master, in nanoseconds.
    pub offset_ns: i64,
    /// Latest mean path delay, in nanoseconds.
    pub mean_path_delay_ns: i64,
    /// Current servo frequency output, in ppb.
    pub frequency_ppb: f64,
    /// Foreign masters currently observed.
    pub foreign_masters: usize,
    /// Validation failures to date.
    pub validations_failed: u64,
}

/// Emits at most one heartbeat per second, and none at start-up.
///
/// The first `poll` establishes the baseline; a heartbeat fires at the
/// first tick at least one second after it, so `tick(t=0)` can never
/// emit.
#[derive(Debug, Clone, Copy, Default)]
pub struct Heartbeat {
    started: Option<Timestamp>,
    last_emit: Option<Timestamp>,
    /// Heartbeats emitted since construction.
    pub emitted: u64,
}

impl Heartbeat {
    /// Minimum spacing between heartbeats.
    pub const PERIOD: TimeInterval = TimeInterval::from_secs(1);

    /// Create an idle heartbeat.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when a heartbeat is due at `now`.
    pub fn poll(&mut self, now: Timestamp) -> bool {
        let Some(started) = self.started else {
            self.started = Some(now);
            return false;
        };
        if (now - started) < Self::PERIOD {
            return false;
        }
        if self
            .last_emit
            .is_some_and(|last| (now - last) < Self::PERIOD)
        {
            return false;
        }
        self.last_emit = Some(now);
        self.emitted += 1;
        true
    }
}
