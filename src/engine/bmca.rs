//! Periodic BMCA re-evaluation and election bookkeeping.

use tracing::warn;

use crate::hal::PortHal;
use crate::port::{Port, PortState};
use crate::time::{TimeInterval, Timestamp};

/// Role changes closer together than this many evaluation intervals
/// are counted as suspected oscillation.
const OSCILLATION_WINDOW_INTERVALS: i64 = 3;

/// Drives the port's BMCA on a fixed interval and tracks outcomes.
#[derive(Debug, Clone)]
pub struct BmcaCoordinator {
    interval: TimeInterval,
    last_run: Option<Timestamp>,
    last_role_change: Option<Timestamp>,

    /// Total BMCA evaluations triggered by this coordinator.
    pub executions: u64,
    /// Evaluations that changed the port's role.
    pub role_changes: u64,
    /// Evaluations that left the port in a master role.
    pub master_selections: u64,
    /// Evaluations that left the port in a slave role.
    pub slave_selections: u64,
    /// Evaluations that left the port passive.
    pub passive_selections: u64,
    /// Evaluations that changed the adopted parent.
    pub parent_changes: u64,
    /// Evaluations skipped for lack of candidates.
    pub no_foreign_masters: u64,
    /// Role changes suspiciously close to the previous one.
    pub oscillations_suspected: u64,
}

impl BmcaCoordinator {
    /// Default evaluation interval: one second.
    pub const DEFAULT_INTERVAL: TimeInterval = TimeInterval::from_secs(1);

    /// Create a coordinator with the default interval.
    #[must_use]
    pub fn new() -> Self {
        Self::with_interval(Self::DEFAULT_INTERVAL)
    }

    /// Create a coordinator evaluating every `interval`.
    #[must_use]
    pub fn with_interval(interval: TimeInterval) -> Self {
        Self {
            interval,
            last_run: None,
            last_role_change: None,
            executions: 0,
            role_changes: 0,
            master_selections: 0,
            slave_selections: 0,
            passive_selections: 0,
            parent_changes: 0,
            no_foreign_masters: 0,
            oscillations_suspected: 0,
        }
    }

    /// Run the port's BMCA if the interval elapsed, recording outcomes.
    pub fn tick<H: PortHal>(&mut self, port: &mut Port<H>, now: Timestamp) {
        let due = self.last_run.is_none_or(|last| (now - last) >= self.interval);
        if !due {
            return;
        }
        self.last_run = Some(now);
        self.executions += 1;

        if port.foreign_master_count() == 0 && port.state() != PortState::PreMaster {
            self.no_foreign_masters += 1;
            return;
        }

        let state_before = port.state();
        let parent_before = port.parent_data_set().parent_port_identity;

        port.evaluate_bmca(now);

        let state_after = port.state();
        let parent_after = port.parent_data_set().parent_port_identity;

        match state_after {
            PortState::Master | PortState::PreMaster => self.master_selections += 1,
            PortState::Slave | PortState::Uncalibrated => self.slave_selections += 1,
            PortState::Passive => self.passive_selections += 1,
            _ => {}
        }

        if state_after != state_before {
            self.role_changes += 1;
            let window = TimeInterval::from_nanos(
                self.interval.nanos().saturating_mul(OSCILLATION_WINDOW_INTERVALS),
            );
            if let Some(previous) = self.last_role_change {
                if (now - previous) < window {
                    self.oscillations_suspected += 1;
                    warn!(
                        %state_before,
                        %state_after,
                        "BMCA role oscillation suspected"
                    );
                }
            }
            self.last_role_change = Some(now);
        }
        if parent_after != parent_before {
            self.parent_changes += 1;
        }
    }
}

impl Default for BmcaCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
