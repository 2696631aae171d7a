//! Synchronization-quality monitoring.

use crate::time::{TimeInterval, Timestamp};
use crate::types::{CurrentDataSet, SyncMonitorConfig};

/// Health classification of the synchronization loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncHealth {
    /// |offset| below 1 µs.
    Synchronized,
    /// |offset| below 10 µs and improving.
    Converging,
    /// |offset| below 100 µs.
    Degraded,
    /// |offset| at or above 100 µs, or no data yet.
    #[default]
    Critical,
}

impl SyncHealth {
    /// Classify an offset magnitude against the fixed thresholds.
    #[must_use]
    pub fn classify(offset: TimeInterval) -> Self {
        let abs = offset.abs();
        if abs < TimeInterval::from_micros(1) {
            Self::Synchronized
        } else if abs < TimeInterval::from_micros(10) {
            Self::Converging
        } else if abs < TimeInterval::from_micros(100) {
            Self::Degraded
        } else {
            Self::Critical
        }
    }
}

/// Samples the current data set on an interval and keeps rolling
/// offset statistics over a bounded variance window.
#[derive(Debug, Clone)]
pub struct SyncMonitor {
    interval: TimeInterval,
    last_sample: Option<Timestamp>,
    window: Vec<i64>,
    capacity: usize,
    next_slot: usize,
    health: SyncHealth,
    /// Samples taken since construction.
    pub samples_taken: u64,
}

impl SyncMonitor {
    /// Create a monitor from configuration.
    #[must_use]
    pub fn new(config: &SyncMonitorConfig) -> Self {
        let capacity = config.variance_window_samples.max(1);
        Self {
            interval: TimeInterval::from_millis(
                i64::try_from(config.sampling_interval_ms).unwrap_or(i64::MAX),
            ),
            last_sample: None,
            window: Vec::with_capacity(capacity),
            capacity,
            next_slot: 0,
            health: SyncHealth::Critical,
            samples_taken: 0,
        }
    }

    /// Sample the data set if the interval elapsed. Returns the new
    /// health classification when a sample was taken.
    pub fn tick(&mut self, current: &CurrentDataSet, now: Timestamp) -> Option<SyncHealth> {
        let due = self
            .last_sample
            .is_none_or(|last| (now - last) >= self.interval);
        if !due {
            return None;
        }
        self.last_sample = Some(now);
        self.samples_taken += 1;

        let offset = current.offset_from_master;
        if self.window.len() < self.capacity {
            self.window.push(offset.nanos());
        } else {
            self.window[self.next_slot] = offset.nanos();
        }
        self.next_slot = (self.next_slot + 1) % self.capacity;

        self.health = SyncHealth::classify(offset);
        Some(self.health)
    }

    /// Latest health classification.
    #[must_use]
    pub const fn health(&self) -> SyncHealth {
        self.health
    }

    /// Mean offset over the window, in nanoseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "statistics are diagnostic")]
    pub fn mean_offset_ns(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        let sum: f64 = self.window.iter().map(|&ns| ns as f64).sum();
        Some(sum / self.window.len() as f64)
    }

    /// Population variance over the window, in ns².
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "statistics are diagnostic")]
    pub fn offset_variance(&self) -> Option<f64> {
        let mean = self.mean_offset_ns()?;
        let sum: f64 = self
            .window
            .iter()
            .map(|&ns| {
                let d = ns as f64 - mean;
                d * d
            })
            .sum();
        Some(sum / self.window.len() as f64)
    }

    /// Number of samples currently windowed.
    #[must_use]
    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}
