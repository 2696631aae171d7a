//! Multi-port boundary clock.

use tracing::{debug, info};

use crate::engine::{BmcaCoordinator, Heartbeat, MessageFlow, ServoCoordinator, SyncMonitor};
use crate::error::PtpError;
use crate::hal::PortHal;
use crate::port::{Port, PortState};
use crate::time::Timestamp;
use crate::types::{ClockIdentity, ClockQuality, PortIdentity, PtpConfig};

/// Upper bound on ports per boundary clock.
pub const MAX_PORTS: usize = 32;

/// A boundary clock: N ports, one adopted parent, one servo.
///
/// The port that ends up in a slave role feeds the clock's servo and
/// its parent data set; the remaining ports distribute that parent
/// downstream as masters, advertising the slave port's steps-removed
/// plus one.
pub struct BoundaryClock<H: PortHal> {
    identity: ClockIdentity,
    quality: ClockQuality,
    config: PtpConfig,
    ports: Vec<Port<H>>,
    coordinators: Vec<BmcaCoordinator>,
    flow: MessageFlow,
    monitor: SyncMonitor,
    servo: ServoCoordinator,
    heartbeat: Heartbeat,
}

impl<H: PortHal> BoundaryClock<H> {
    /// Create a boundary clock with no ports yet.
    #[must_use]
    pub fn new(identity: ClockIdentity, quality: ClockQuality, config: PtpConfig) -> Self {
        let flow = MessageFlow::new(&config);
        let monitor = SyncMonitor::new(&config.sync);
        let servo = ServoCoordinator::new(config.servo);
        Self {
            identity,
            quality,
            config,
            ports: Vec::with_capacity(4),
            coordinators: Vec::with_capacity(4),
            flow,
            monitor,
            servo,
            heartbeat: Heartbeat::new(),
        }
    }

    /// Add a port over `hal`, returning its 1-based port number.
    ///
    /// # Errors
    /// [`PtpError::ResourceUnavailable`] once [`MAX_PORTS`] is reached.
    pub fn add_port(&mut self, hal: H) -> Result<u16, PtpError> {
        if self.ports.len() >= MAX_PORTS {
            return Err(PtpError::ResourceUnavailable("boundary clock port limit"));
        }
        let port_number = u16::try_from(self.ports.len() + 1)
            .map_err(|_| PtpError::ResourceUnavailable("boundary clock port limit"))?;
        let identity = PortIdentity::new(self.identity, port_number);
        self.ports
            .push(Port::new(identity, self.quality, self.config.clone(), hal));
        self.coordinators.push(BmcaCoordinator::new());
        Ok(port_number)
    }

    /// Initialize every port.
    pub fn start(&mut self, now: Timestamp) {
        for port in &mut self.ports {
            port.initialize(now);
        }
    }

    /// Validate and process one buffer received on `port_number`.
    ///
    /// # Errors
    /// [`PtpError::InvalidPort`] when no such port exists. Message
    /// validation failures are counted on the port and swallowed.
    pub fn process_message(
        &mut self,
        port_number: u16,
        data: &[u8],
        rx: Timestamp,
    ) -> Result<(), PtpError> {
        let index = self.port_index(port_number)?;
        let port = &mut self.ports[index];
        let now = port.hal_mut().timestamp();
        match self.flow.ingest(data, rx, now) {
            Ok(message) => {
                port.statistics_mut().validations_passed += 1;
                if let Err(error) = port.process_message(&message, rx) {
                    debug!(%error, port = port_number, "message processing reported an error");
                }
                if let Some(sample) = port.take_offset_sample() {
                    self.servo.ingest(sample, port.hal_mut(), rx);
                }
            }
            Err(error) => {
                port.statistics_mut().validations_failed += 1;
                debug!(%error, port = port_number, "dropping invalid message");
            }
        }
        Ok(())
    }

    /// Advance every port and the clock-level coordinators.
    pub fn tick(&mut self, now: Timestamp) {
        for (port, coordinator) in self.ports.iter_mut().zip(&mut self.coordinators) {
            port.tick(now);
            coordinator.tick(port, now);
        }
        self.propagate_parent();

        if let Some(slave) = self.slave_port_index() {
            let current = *self.ports[slave].current_data_set();
            self.monitor.tick(&current, now);
        }
        self.servo.tick(now);
        if self.heartbeat.poll(now) {
            info!(
                ports = self.ports.len(),
                has_slave = self.has_slave_port(),
                has_master = self.has_master_port(),
                "heartbeat"
            );
        }
    }

    /// Feed the slave port's adopted parent into all other ports so
    /// their master-role Announces describe the clock's grandmaster,
    /// one step further removed.
    fn propagate_parent(&mut self) {
        let Some(slave) = self.slave_port_index() else {
            return;
        };
        let parent = *self.ports[slave].parent_data_set();
        let steps = self.ports[slave].current_data_set().steps_removed;
        let time_source = self.ports[slave].time_source();

        for (index, port) in self.ports.iter_mut().enumerate() {
            if index == slave {
                continue;
            }
            let ds = port.parent_data_set_mut();
            ds.grandmaster_identity = parent.grandmaster_identity;
            ds.grandmaster_clock_quality = parent.grandmaster_clock_quality;
            ds.grandmaster_priority1 = parent.grandmaster_priority1;
            ds.grandmaster_priority2 = parent.grandmaster_priority2;
            port.set_steps_removed(steps);
            port.set_time_source(time_source);
        }
    }

    fn port_index(&self, port_number: u16) -> Result<usize, PtpError> {
        self.ports
            .iter()
            .position(|p| p.identity().port_number == port_number)
            .ok_or(PtpError::InvalidPort(port_number))
    }

    fn slave_port_index(&self) -> Option<usize> {
        self.ports
            .iter()
            .position(|p| p.state().is_slave_role())
    }

    /// Whether any port is in the master state.
    #[must_use]
    pub fn has_master_port(&self) -> bool {
        self.ports.iter().any(|p| p.state() == PortState::Master)
    }

    /// Whether any port follows a remote master.
    #[must_use]
    pub fn has_slave_port(&self) -> bool {
        self.slave_port_index().is_some()
    }

    /// Whether the clock is synchronized through some slave port.
    #[must_use]
    pub fn is_synchronized(&self) -> bool {
        self.ports.iter().any(|p| p.state() == PortState::Slave)
    }

    /// Number of ports.
    #[must_use]
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// The port with the given 1-based number.
    ///
    /// # Errors
    /// [`PtpError::InvalidPort`] when no such port exists.
    pub fn port(&self, port_number: u16) -> Result<&Port<H>, PtpError> {
        self.port_index(port_number).map(|i| &self.ports[i])
    }

    /// Mutable access to the port with the given 1-based number.
    ///
    /// # Errors
    /// [`PtpError::InvalidPort`] when no such port exists.
    pub fn port_mut(&mut self, port_number: u16) -> Result<&mut Port<H>, PtpError> {
        let index = self.port_index(port_number)?;
        Ok(&mut self.ports[index])
    }
}
