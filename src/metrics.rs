//! Monotonic protocol counters.
//!
//! Every counter is owned by its port (no process-wide singletons), so
//! multi-instance and multi-domain deployments stay correct. Gauges
//! (current offset, path delay, servo output, port state) are read from
//! the owning components directly; this struct holds only things that
//! count up.

/// Per-port protocol statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Statistics {
    /// Announce messages transmitted.
    pub announce_sent: u64,
    /// Announce messages received and accepted.
    pub announce_received: u64,
    /// Announce receipt timeouts dispatched.
    pub announce_timeouts: u64,
    /// Sync messages transmitted.
    pub sync_sent: u64,
    /// Sync messages received.
    pub sync_received: u64,
    /// Follow-up messages transmitted.
    pub follow_up_sent: u64,
    /// Follow-up messages received.
    pub follow_up_received: u64,
    /// Delay requests transmitted.
    pub delay_req_sent: u64,
    /// Delay requests received (master side).
    pub delay_req_received: u64,
    /// Delay responses transmitted (master side).
    pub delay_resp_sent: u64,
    /// Delay responses received.
    pub delay_resp_received: u64,
    /// State-machine transitions taken.
    pub state_transitions: u64,
    /// BMCA runs where the local clock won.
    pub bmca_local_wins: u64,
    /// BMCA runs where a foreign master won.
    pub bmca_foreign_wins: u64,
    /// BMCA runs that ended in a tie and recommended Passive.
    pub bmca_passive_wins: u64,
    /// BMCA ties forced by the fault-injection hook.
    pub bmca_forced_ties: u64,
    /// Complete T1..T4 offset computations.
    pub offsets_computed: u64,
    /// Messages that passed validation.
    pub validations_passed: u64,
    /// Messages or samples that failed validation.
    pub validations_failed: u64,
    /// Offset samples with magnitude below one microsecond.
    pub sub_microsecond_samples: u64,
}

impl Statistics {
    /// Create a zeroed statistics block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total messages received across all types.
    #[must_use]
    pub fn messages_received(&self) -> u64 {
        self.announce_received
            + self.sync_received
            + self.follow_up_received
            + self.delay_req_received
            + self.delay_resp_received
    }

    /// Total messages transmitted across all types.
    #[must_use]
    pub fn messages_sent(&self) -> u64 {
        self.announce_sent
            + self.sync_sent
            + self.follow_up_sent
            + self.delay_req_sent
            + self.delay_resp_sent
    }
}
