//! Engine configuration with profile presets.

use serde::{Deserialize, Serialize};

/// Path-delay measurement mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelayMechanism {
    /// End-to-end delay request-response.
    E2E,
    /// Peer-to-peer delay measurement on each link.
    P2P,
}

/// Named PTP profile selecting protocol behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Profile {
    /// IEEE 1588 default profile, E2E or P2P as configured.
    Default1588,
    /// IEEE 802.1AS generalized PTP: P2P, reduced state set.
    GPtp,
    /// AES67 media profile: E2E over UDP/IPv4.
    Aes67,
    /// Industrial automation profile.
    Industrial,
}

impl Profile {
    /// The delay mechanism this profile mandates, if any.
    #[must_use]
    pub const fn mandated_delay_mechanism(self) -> Option<DelayMechanism> {
        match self {
            Self::GPtp => Some(DelayMechanism::P2P),
            Self::Aes67 => Some(DelayMechanism::E2E),
            Self::Default1588 | Self::Industrial => None,
        }
    }

    /// Whether the foreign-master feature's qualification hold-down is
    /// active: a port that wins BMCA waits one announce interval in
    /// `PreMaster` before transmitting as master.
    ///
    /// gPTP drops the hold-down, not master selection; its ports still
    /// run BMCA and take master/slave roles, but promote immediately.
    #[must_use]
    pub const fn uses_qualification_hold_down(self) -> bool {
        !matches!(self, Self::GPtp)
    }
}

/// PI servo tuning and thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServoConfig {
    /// Proportional gain applied to the offset in nanoseconds.
    pub kp: f64,
    /// Integral gain applied to the accumulated offset.
    pub ki: f64,
    /// Clamp for the frequency adjustment output, in parts per billion.
    pub max_freq_ppb: f64,
    /// Clamp for the integrator term (anti-windup), in ppb.
    pub integral_limit_ppb: f64,
    /// Maximum output change per second, in ppb.
    pub max_rate_ppb_per_sec: f64,
    /// Offsets above this magnitude trigger a phase step when not locked.
    pub step_threshold_ns: i64,
    /// Offsets below this magnitude count toward lock.
    pub lock_threshold_ns: i64,
    /// Offsets below this magnitude enter the `Locking` state.
    pub locking_threshold_ns: i64,
    /// Offsets above this magnitude drop an acquired lock.
    pub unlock_threshold_ns: i64,
    /// Consecutive in-threshold samples required to declare lock.
    pub samples_for_lock: u32,
    /// Milliseconds without an update before entering holdover.
    pub holdover_timeout_ms: u64,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            kp: 0.7,
            ki: 0.3,
            max_freq_ppb: 100_000.0,
            integral_limit_ppb: 50_000.0,
            max_rate_ppb_per_sec: 20_000.0,
            step_threshold_ns: 128_000_000,
            lock_threshold_ns: 1_000,
            locking_threshold_ns: 100_000,
            unlock_threshold_ns: 250_000,
            samples_for_lock: 16,
            holdover_timeout_ms: 5_000,
        }
    }
}

/// Sync-quality monitor sampling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMonitorConfig {
    /// Interval between samples of the current data set, in milliseconds.
    pub sampling_interval_ms: u64,
    /// Number of samples in the rolling variance window.
    pub variance_window_samples: usize,
}

impl Default for SyncMonitorConfig {
    fn default() -> Self {
        Self {
            sampling_interval_ms: 1_000,
            variance_window_samples: 60,
        }
    }
}

/// Configuration for a PTP port and its owning clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PtpConfig {
    /// PTP domain number (default 0).
    pub domain_number: u8,

    /// BMCA priority1 (lower wins, default 128).
    pub priority1: u8,

    /// BMCA priority2 (lower wins, default 128).
    pub priority2: u8,

    /// log2 of the Announce interval in seconds (0 = 1 s).
    pub log_announce_interval: i8,

    /// log2 of the Sync interval in seconds (−3 = 8 per second).
    pub log_sync_interval: i8,

    /// log2 of the minimum `Delay_Req` interval in seconds.
    pub log_min_delay_req_interval: i8,

    /// Announce intervals without an Announce before the master is
    /// declared lost (default 3).
    pub announce_receipt_timeout: u8,

    /// Path-delay measurement mechanism.
    pub delay_mechanism: DelayMechanism,

    /// Protocol profile.
    pub profile: Profile,

    /// Reject messages from other domains instead of ignoring them silently.
    pub strict_domain_checking: bool,

    /// Capacity of the foreign-master table (default 16).
    pub foreign_master_capacity: usize,

    /// Reject messages whose receive timestamp is older than this many
    /// milliseconds at processing time.
    pub max_message_age_ms: u64,

    /// Servo tuning.
    pub servo: ServoConfig,

    /// Sync-quality monitor settings.
    pub sync: SyncMonitorConfig,
}

impl Default for PtpConfig {
    fn default() -> Self {
        Self {
            domain_number: 0,
            priority1: 128,
            priority2: 128,
            log_announce_interval: 0,
            log_sync_interval: -3,
            log_min_delay_req_interval: 0,
            announce_receipt_timeout: 3,
            delay_mechanism: DelayMechanism::E2E,
            profile: Profile::Default1588,
            strict_domain_checking: false,
            foreign_master_capacity: 16,
            max_message_age_ms: 1_000,
            servo: ServoConfig::default(),
            sync: SyncMonitorConfig::default(),
        }
    }
}

impl PtpConfig {
    /// Create a new config builder.
    #[must_use]
    pub fn builder() -> PtpConfigBuilder {
        PtpConfigBuilder::default()
    }

    /// The Announce interval in nanoseconds (2^`log_announce_interval` s).
    #[must_use]
    pub fn announce_interval_ns(&self) -> i64 {
        log_interval_ns(self.log_announce_interval)
    }

    /// The Sync interval in nanoseconds.
    #[must_use]
    pub fn sync_interval_ns(&self) -> i64 {
        log_interval_ns(self.log_sync_interval)
    }

    /// The minimum `Delay_Req` interval in nanoseconds.
    #[must_use]
    pub fn delay_req_interval_ns(&self) -> i64 {
        log_interval_ns(self.log_min_delay_req_interval)
    }

    /// The Announce receipt timeout window in nanoseconds:
    /// `announce_receipt_timeout × 2^log_announce_interval`.
    #[must_use]
    pub fn announce_timeout_ns(&self) -> i64 {
        i64::from(self.announce_receipt_timeout).saturating_mul(self.announce_interval_ns())
    }

    /// The effective delay mechanism after profile mandates.
    #[must_use]
    pub fn effective_delay_mechanism(&self) -> DelayMechanism {
        self.profile
            .mandated_delay_mechanism()
            .unwrap_or(self.delay_mechanism)
    }
}

/// 2^log2_seconds as nanoseconds, for the log-interval header fields.
fn log_interval_ns(log2_seconds: i8) -> i64 {
    if log2_seconds >= 0 {
        1_000_000_000i64 << u32::from(log2_seconds.unsigned_abs()).min(31)
    } else {
        1_000_000_000i64 >> u32::from(log2_seconds.unsigned_abs()).min(31)
    }
}

/// Builder for [`PtpConfig`].
#[derive(Debug, Clone, Default)]
pub struct PtpConfigBuilder {
    config: PtpConfig,
}

impl PtpConfigBuilder {
    /// Set the PTP domain number.
    #[must_use]
    pub fn domain_number(mut self, domain: u8) -> Self {
        self.config.domain_number = domain;
        self
    }

    /// Set BMCA priority1.
    #[must_use]
    pub fn priority1(mut self, priority: u8) -> Self {
        self.config.priority1 = priority;
        self
    }

    /// Set BMCA priority2.
    #[must_use]
    pub fn priority2(mut self, priority: u8) -> Self {
        self.config.priority2 = priority;
        self
    }

    /// Set the log2 Announce interval.
    #[must_use]
    pub fn log_announce_interval(mut self, log2_seconds: i8) -> Self {
        self.config.log_announce_interval = log2_seconds;
        self
    }

    /// Set the log2 Sync interval.
    #[must_use]
    pub fn log_sync_interval(mut self, log2_seconds: i8) -> Self {
        self.config.log_sync_interval = log2_seconds;
        self
    }

    /// Set the log2 minimum `Delay_Req` interval.
    #[must_use]
    pub fn log_min_delay_req_interval(mut self, log2_seconds: i8) -> Self {
        self.config.log_min_delay_req_interval = log2_seconds;
        self
    }

    /// Set the Announce receipt timeout in announce intervals.
    #[must_use]
    pub fn announce_receipt_timeout(mut self, intervals: u8) -> Self {
        self.config.announce_receipt_timeout = intervals;
        self
    }

    /// Set the delay mechanism.
    #[must_use]
    pub fn delay_mechanism(mut self, mechanism: DelayMechanism) -> Self {
        self.config.delay_mechanism = mechanism;
        self
    }

    /// Set the protocol profile.
    #[must_use]
    pub fn profile(mut self, profile: Profile) -> Self {
        self.config.profile = profile;
        self
    }

    /// Enable strict domain checking.
    #[must_use]
    pub fn strict_domain_checking(mut self, strict: bool) -> Self {
        self.config.strict_domain_checking = strict;
        self
    }

    /// Set the foreign-master table capacity.
    #[must_use]
    pub fn foreign_master_capacity(mut self, capacity: usize) -> Self {
        self.config.foreign_master_capacity = capacity.max(1);
        self
    }

    /// Set the servo configuration.
    #[must_use]
    pub fn servo(mut self, servo: ServoConfig) -> Self {
        self.config.servo = servo;
        self
    }

    /// Set the sync-monitor configuration.
    #[must_use]
    pub fn sync(mut self, sync: SyncMonitorConfig) -> Self {
        self.config.sync = sync;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> PtpConfig {
        self.config
    }
}
