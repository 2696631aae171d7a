//! IEEE 1588 data sets owned by a port.

use crate::time::TimeInterval;
use crate::types::common::{ClockIdentity, ClockQuality, PortIdentity};
use crate::types::config::{DelayMechanism, PtpConfig};

/// Per-port configuration and state snapshot (IEEE 1588 §8.2.15).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortDataSet {
    /// Identity of this port.
    pub port_identity: PortIdentity,
    /// log2 of the minimum `Delay_Req` interval.
    pub log_min_delay_req_interval: i8,
    /// Mean path delay to the peer (P2P) or master (E2E).
    pub peer_mean_path_delay: TimeInterval,
    /// log2 of the Announce interval.
    pub log_announce_interval: i8,
    /// Announce receipt timeout in announce intervals.
    pub announce_receipt_timeout: u8,
    /// log2 of the Sync interval.
    pub log_sync_interval: i8,
    /// Delay measurement mechanism.
    pub delay_mechanism: DelayMechanism,
    /// log2 of the minimum `Pdelay_Req` interval.
    pub log_min_pdelay_req_interval: i8,
    /// PTP version (always 2).
    pub version_number: u8,
}

impl PortDataSet {
    /// Build the initial port data set from configuration.
    #[must_use]
    pub fn from_config(port_identity: PortIdentity, config: &PtpConfig) -> Self {
        Self {
            port_identity,
            log_min_delay_req_interval: config.log_min_delay_req_interval,
            peer_mean_path_delay: TimeInterval::ZERO,
            log_announce_interval: config.log_announce_interval,
            announce_receipt_timeout: config.announce_receipt_timeout,
            log_sync_interval: config.log_sync_interval,
            delay_mechanism: config.effective_delay_mechanism(),
            log_min_pdelay_req_interval: config.log_min_delay_req_interval,
            version_number: 2,
        }
    }
}

/// Synchronization results (IEEE 1588 §8.2.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CurrentDataSet {
    /// Hops between this clock and the grandmaster.
    pub steps_removed: u16,
    /// Most recent offset from the master.
    pub offset_from_master: TimeInterval,
    /// Most recent mean path delay.
    pub mean_path_delay: TimeInterval,
}

/// Parent and grandmaster description (IEEE 1588 §8.2.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentDataSet {
    /// Identity of the port this clock synchronizes to.
    pub parent_port_identity: PortIdentity,
    /// Whether the observed parent statistics below are valid.
    pub parent_stats: bool,
    /// Observed variance of the parent's offset (0xFFFF = not computed).
    pub observed_parent_offset_scaled_log_variance: u16,
    /// Observed phase change rate of the parent (0x7FFF_FFFF = not computed).
    pub observed_parent_clock_phase_change_rate: i32,
    /// Grandmaster identity.
    pub grandmaster_identity: ClockIdentity,
    /// Grandmaster clock quality.
    pub grandmaster_clock_quality: ClockQuality,
    /// Grandmaster priority1.
    pub grandmaster_priority1: u8,
    /// Grandmaster priority2.
    pub grandmaster_priority2: u8,
}

impl ParentDataSet {
    /// Sentinel for an unobserved parent variance.
    pub const VARIANCE_NOT_COMPUTED: u16 = 0xFFFF;
    /// Sentinel for an unobserved phase change rate.
    pub const PHASE_CHANGE_RATE_NOT_COMPUTED: i32 = 0x7FFF_FFFF;

    /// A parent data set describing the local clock as its own parent,
    /// the state before any master has been adopted and after a local
    /// BMCA win.
    #[must_use]
    pub fn self_parented(
        identity: ClockIdentity,
        quality: ClockQuality,
        priority1: u8,
        priority2: u8,
    ) -> Self {
        Self {
            parent_port_identity: PortIdentity::new(identity, 0),
            parent_stats: false,
            observed_parent_offset_scaled_log_variance: Self::VARIANCE_NOT_COMPUTED,
            observed_parent_clock_phase_change_rate: Self::PHASE_CHANGE_RATE_NOT_COMPUTED,
            grandmaster_identity: identity,
            grandmaster_clock_quality: quality,
            grandmaster_priority1: priority1,
            grandmaster_priority2: priority2,
        }
    }
}
