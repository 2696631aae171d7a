//! Single-port ordinary clock.

use tracing::{debug, info};

use crate::engine::{
    BmcaCoordinator, HealthStatus, Heartbeat, MessageFlow, ServoCoordinator, SyncMonitor,
};
use crate::hal::PortHal;
use crate::metrics::Statistics;
use crate::port::{Port, PortState};
use crate::servo::ServoState;
use crate::time::Timestamp;
use crate::types::{ClockIdentity, ClockQuality, PortIdentity, PtpConfig};

/// An ordinary clock: exactly one port plus the servo and coordinators.
pub struct OrdinaryClock<H: PortHal> {
    port: Port<H>,
    flow: MessageFlow,
    bmca: BmcaCoordinator,
    monitor: SyncMonitor,
    servo: ServoCoordinator,
    heartbeat: Heartbeat,
}

impl<H: PortHal> OrdinaryClock<H> {
    /// Create an ordinary clock with its single port numbered 1.
    pub fn new(identity: ClockIdentity, quality: ClockQuality, config: PtpConfig, hal: H) -> Self {
        let flow = MessageFlow::new(&config);
        let monitor = SyncMonitor::new(&config.sync);
        let servo = ServoCoordinator::new(config.servo);
        let port = Port::new(PortIdentity::new(identity, 1), quality, config, hal);
        Self {
            port,
            flow,
            bmca: BmcaCoordinator::new(),
            monitor,
            servo,
            heartbeat: Heartbeat::new(),
        }
    }

    /// Initialize the port and begin listening.
    pub fn start(&mut self, now: Timestamp) {
        self.port.initialize(now);
    }

    /// Validate and process one received buffer.
    ///
    /// Invalid messages are counted and dropped; they never produce
    /// state changes or propagate errors to the caller.
    pub fn process_message(&mut self, data: &[u8], rx: Timestamp) {
        let now = self.port.hal_mut().timestamp();
        match self.flow.ingest(data, rx, now) {
            Ok(message) => {
                self.port.statistics_mut().validations_passed += 1;
                if let Err(error) = self.port.process_message(&message, rx) {
                    debug!(%error, "message processing reported an error");
                }
                if let Some(sample) = self.port.take_offset_sample() {
                    self.servo.ingest(sample, self.port.hal_mut(), rx);
                }
            }
            Err(error) => {
                self.port.statistics_mut().validations_failed += 1;
                debug!(%error, "dropping invalid message");
            }
        }
    }

    /// Advance all timers and coordinators.
    pub fn tick(&mut self, now: Timestamp) {
        self.port.tick(now);
        self.bmca.tick(&mut self.port, now);
        self.monitor.tick(self.port.current_data_set(), now);
        self.servo.tick(now);
        if self.heartbeat.poll(now) {
            let status = self.health();
            info!(
                state = %status.port_state,
                health = ?status.sync_health,
                offset_ns = status.offset_ns,
                "heartbeat"
            );
        }
    }

    /// Aggregate the current health snapshot.
    #[must_use]
    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            port_state: self.port.state(),
            sync_health: self.monitor.health(),
            servo_state: self.servo.state(),
            offset_ns: self.port.current_data_set().offset_from_master.nanos(),
            mean_path_delay_ns: self.port.current_data_set().mean_path_delay.nanos(),
            frequency_ppb: self.servo.servo().frequency_ppb(),
            foreign_masters: self.port.foreign_master_count(),
            validations_failed: self.port.statistics().validations_failed,
        }
    }

    /// Whether the clock is synchronized to a master.
    #[must_use]
    pub fn is_synchronized(&self) -> bool {
        self.port.state() == PortState::Slave
    }

    /// Whether the servo has acquired lock.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.servo.state() == ServoState::Locked
    }

    /// The port.
    #[must_use]
    pub const fn port(&self) -> &Port<H> {
        &self.port
    }

    /// Mutable access to the port (admin control, fault injection).
    pub fn port_mut(&mut self) -> &mut Port<H> {
        &mut self.port
    }

    /// Protocol counters.
    #[must_use]
    pub const fn statistics(&self) -> &Statistics {
        self.port.statistics()
    }

    /// The BMCA coordinator's counters.
    #[must_use]
    pub const fn bmca_coordinator(&self) -> &BmcaCoordinator {
        &self.bmca
    }

    /// The sync monitor.
    #[must_use]
    pub const fn sync_monitor(&self) -> &SyncMonitor {
        &self.monitor
    }

    /// The servo coordinator.
    #[must_use]
    pub const fn servo_coordinator(&self) -> &ServoCoordinator {
        &self.servo
    }

    /// Heartbeats emitted so far.
    #[must_use]
    pub const fn heartbeats_emitted(&self) -> u64 {
        self.heartbeat.emitted
    }
}
