//! Offset and mean-path-delay computation from paired timestamps.
//!
//! E2E pairs T1 (Sync origin, precise value from `Follow_Up`), T2 (Sync
//! reception), T3 (`Delay_Req` transmission), and T4 (`Delay_Req`
//! reception at the master, returned in `Delay_Resp`):
//!
//! ```text
//! offset        = ((T2 − T1) − (T4 − T3)) / 2
//! meanPathDelay = ((T2 − T1) + (T4 − T3)) / 2
//! ```
//!
//! P2P measures the peer link delay with the identical arithmetic over
//! a `Pdelay` exchange, and the slave offset becomes `(T2 − T1) −
//! peerMeanPathDelay`.
//!
//! Header corrections are folded into the recorded timestamps (plain
//! nanoseconds; the ×2¹⁶ scaling never leaves the codec), so the
//! formulas above see corrected values.

use tracing::warn;

use crate::time::{TimeInterval, Timestamp};

/// One complete, validated offset measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetSample {
    /// Offset of the local clock from the master (positive = ahead).
    pub offset: TimeInterval,
    /// Mean one-way path delay; always positive in a valid sample.
    pub mean_path_delay: TimeInterval,
}

/// Why a completed T1..T4 set was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFault {
    /// Computed mean path delay was zero or negative.
    NonPositiveDelay,
}

/// Collects T1..T4 and produces offset samples plus window statistics.
#[derive(Debug, Clone)]
pub struct OffsetEngine {
    t1: Option<Timestamp>,
    t2: Option<Timestamp>,
    t3: Option<Timestamp>,
    t4: Option<Timestamp>,
    /// Ring buffer of recent offsets (nanoseconds).
    window: Vec<i64>,
    window_capacity: usize,
    next_slot: usize,
    samples_total: u64,
}

impl OffsetEngine {
    /// Create an engine with a sliding statistics window of
    /// `window_capacity` samples.
    #[must_use]
    pub fn new(window_capacity: usize) -> Self {
        let window_capacity = window_capacity.max(1);
        Self {
            t1: None,
            t2: None,
            t3: None,
            t4: None,
            window: Vec::with_capacity(window_capacity),
            window_capacity,
            next_slot: 0,
            samples_total: 0,
        }
    }

    /// Record T1 and T2 from a Sync (one-step) or Sync + `Follow_Up`
    /// (two-step) exchange, corrections already applied.
    pub fn record_sync(&mut self, t1: Timestamp, t2: Timestamp) {
        self.t1 = Some(t1);
        self.t2 = Some(t2);
    }

    /// Record T2 alone for a two-step Sync; the precise T1 arrives in
    /// the `Follow_Up`. Any stale T1 from a previous cycle is dropped.
    pub fn record_sync_rx(&mut self, t2: Timestamp) {
        self.t1 = None;
        self.t2 = Some(t2);
    }

    /// Record the precise T1 from a `Follow_Up` for an already-received
    /// Sync.
    pub fn record_precise_origin(&mut self, t1: Timestamp) {
        self.t1 = Some(t1);
    }

    /// Record T3, the `Delay_Req` transmission time.
    pub fn record_delay_req_tx(&mut self, t3: Timestamp) {
        self.t3 = Some(t3);
    }

    /// Record T4 from a `Delay_Resp`, correction already applied.
    pub fn record_delay_resp(&mut self, t4: Timestamp) {
        self.t4 = Some(t4);
    }

    /// Whether all four timestamps are present.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.t1.is_some() && self.t2.is_some() && self.t3.is_some() && self.t4.is_some()
    }

    /// Drop any partially collected timestamps.
    pub fn clear(&mut self) {
        self.t1 = None;
        self.t2 = None;
        self.t3 = None;
        self.t4 = None;
    }

    /// Try to complete a measurement cycle.
    ///
    /// Returns `None` while timestamps are missing. Once all four are
    /// present they are consumed — valid or not — so the next sample
    /// requires a fresh T1..T4 and nothing is counted twice.
    pub fn try_complete(&mut self) -> Option<Result<OffsetSample, SampleFault>> {
        let (t1, t2, t3, t4) = (self.t1?, self.t2?, self.t3?, self.t4?);
        self.clear();

        if t2 < t1 {
            warn!(%t1, %t2, "sync timestamps out of order (T2 < T1)");
        }
        if t4 < t3 {
            warn!(%t3, %t4, "delay timestamps out of order (T4 < T3)");
        }

        let master_to_slave = t2 - t1;
        let slave_to_master = t4 - t3;
        let mean_path_delay = (master_to_slave + slave_to_master).half();
        if !mean_path_delay.is_positive() {
            warn!(
                delay = %mean_path_delay,
                "discarding sample with non-positive mean path delay"
            );
            return Some(Err(SampleFault::NonPositiveDelay));
        }

        let offset = (master_to_slave - slave_to_master).half();
        self.push_sample(offset);
        Some(Ok(OffsetSample {
            offset,
            mean_path_delay,
        }))
    }

    /// Complete a P2P measurement: T1/T2 from Sync, link delay from the
    /// `Pdelay` exchange. T3/T4 are not used by this mechanism.
    pub fn try_complete_p2p(
        &mut self,
        peer_mean_path_delay: TimeInterval,
    ) -> Option<Result<OffsetSample, SampleFault>> {
        let (t1, t2) = (self.t1?, self.t2?);
        self.clear();

        if !peer_mean_path_delay.is_positive() {
            return Some(Err(SampleFault::NonPositiveDelay));
        }
        let offset = (t2 - t1) - peer_mean_path_delay;
        self.push_sample(offset);
        Some(Ok(OffsetSample {
            offset,
            mean_path_delay: peer_mean_path_delay,
        }))
    }

    fn push_sample(&mut self, offset: TimeInterval) {
        if self.window.len() < self.window_capacity {
            self.window.push(offset.nanos());
        } else {
            self.window[self.next_slot] = offset.nanos();
        }
        self.next_slot = (self.next_slot + 1) % self.window_capacity;
        self.samples_total += 1;
    }

    /// Total samples accepted since construction.
    #[must_use]
    pub const fn samples_total(&self) -> u64 {
        self.samples_total
    }

    /// Number of samples currently in the window.
    #[must_use]
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Smallest offset in the window.
    #[must_use]
    pub fn min_offset(&self) -> Option<TimeInterval> {
        self.window.iter().min().map(|&ns| TimeInterval::from_nanos(ns))
    }

    /// Largest offset in the window.
    #[must_use]
    pub fn max_offset(&self) -> Option<TimeInterval> {
        self.window.iter().max().map(|&ns| TimeInterval::from_nanos(ns))
    }

    /// Mean offset over the window.
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "statistics are diagnostic")]
    pub fn mean_offset(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        let sum: f64 = self.window.iter().map(|&ns| ns as f64).sum();
        Some(sum / self.window.len() as f64)
    }

    /// Population variance of the window, in ns².
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "statistics are diagnostic")]
    pub fn offset_variance(&self) -> Option<f64> {
        let mean = self.mean_offset()?;
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
}

/// Collects the four timestamps of one `Pdelay` exchange.
///
/// The initiator records T1 on `Pdelay_Req` transmission and T4 on
/// `Pdelay_Resp` reception; the responder's T2/T3 arrive in the
/// response and its follow-up.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdelayExchange {
    t1: Option<Timestamp>,
    t2: Option<Timestamp>,
    t3: Option<Timestamp>,
    t4: Option<Timestamp>,
}

impl PdelayExchange {
    /// Record the `Pdelay_Req` transmission time.
    pub fn record_request_tx(&mut self, t1: Timestamp) {
        *self = Self {
            t1: Some(t1),
            ..Self::default()
        };
    }

    /// Record the responder's receipt timestamp from `Pdelay_Resp` and
    /// the local reception time of that response.
    pub fn record_response(&mut self, t2: Timestamp, t4: Timestamp) {
        self.t2 = Some(t2);
        self.t4 = Some(t4);
    }

    /// Record the responder's transmission timestamp from
    /// `Pdelay_Resp_Follow_Up`.
    pub fn record_response_origin(&mut self, t3: Timestamp) {
        self.t3 = Some(t3);
    }

    /// Compute the peer mean path delay once the exchange is complete.
    pub fn try_complete(&mut self) -> Option<Result<TimeInterval, SampleFault>> {
        let (t1, t2, t3, t4) = (self.t1?, self.t2?, self.t3?, self.t4?);
        *self = Self::default();

        let delay = ((t4 - t1) - (t3 - t2)).half();
        if !delay.is_positive() {
            warn!(delay = %delay, "discarding non-positive peer delay");
            return Some(Err(SampleFault::NonPositiveDelay));
        }
        Some(Ok(delay))
    }
}
