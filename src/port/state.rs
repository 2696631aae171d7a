//! Port states, events, and the transition table.

/// The state of a PTP port (IEEE 1588 §9.2.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PortState {
    /// Data sets are being initialized; nothing is transmitted.
    #[default]
    Initializing,
    /// A fault is active; only `FAULT_CLEARED` leaves this state.
    Faulty,
    /// Administratively disabled. Terminal until re-enabled.
    Disabled,
    /// Waiting to hear from masters before taking a role.
    Listening,
    /// Won BMCA; qualifying before transmitting as master.
    PreMaster,
    /// Transmitting Announce and Sync as a master.
    Master,
    /// A tie or configuration keeps this port out of the hierarchy.
    Passive,
    /// Following a master but not yet reliably synchronized.
    Uncalibrated,
    /// Synchronized to the current parent.
    Slave,
}

impl PortState {
    /// Whether the port is tracking a remote master's Announces.
    #[must_use]
    pub const fn tracks_announce_timeout(&self) -> bool {
        matches!(self, Self::Slave | Self::Uncalibrated)
    }

    /// Whether the port transmits master messages.
    #[must_use]
    pub const fn is_master_role(&self) -> bool {
        matches!(self, Self::Master)
    }

    /// Whether the port follows a remote master.
    #[must_use]
    pub const fn is_slave_role(&self) -> bool {
        matches!(self, Self::Slave | Self::Uncalibrated)
    }
}

impl std::fmt::Display for PortState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Initializing => "INITIALIZING",
            Self::Faulty => "FAULTY",
            Self::Disabled => "DISABLED",
            Self::Listening => "LISTENING",
            Self::PreMaster => "PRE_MASTER",
            Self::Master => "MASTER",
            Self::Passive => "PASSIVE",
            Self::Uncalibrated => "UNCALIBRATED",
            Self::Slave => "SLAVE",
        };
        write!(f, "{name}")
    }
}

/// Events the port state machine dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortEvent {
    /// Begin operating after construction or fault recovery.
    Initialize,
    /// A fault was detected.
    FaultDetected,
    /// The active fault was cleared.
    FaultCleared,
    /// Administratively enabled.
    DesignatedEnabled,
    /// Administratively disabled.
    DesignatedDisabled,
    /// BMCA recommends master (another clock is grandmaster).
    RsMaster,
    /// BMCA recommends master with the local clock as grandmaster.
    RsGrandMaster,
    /// BMCA recommends slave to the selected parent.
    RsSlave,
    /// BMCA recommends passive (tie).
    RsPassive,
    /// The pre-master qualification interval elapsed.
    QualificationTimeout,
    /// No Announce from the master within the timeout window.
    AnnounceReceiptTimeout,
    /// The synchronization heuristic was satisfied; promote to Slave.
    MasterClockSelected,
    /// Synchronization to the master was lost.
    SynchronizationFault,
}

/// The transition table: `Some(next)` if the event causes a transition
/// from `state`, `None` if the event is not applicable there.
///
/// `FAULT_DETECTED` and `DESIGNATED_DISABLED` apply from any state;
/// `Disabled` is left only by `DESIGNATED_ENABLED` and `Faulty` only by
/// `FAULT_CLEARED` (or disabling).
#[must_use]
pub fn transition(state: PortState, event: PortEvent) -> Option<PortState> {
    use PortEvent as E;
    use PortState as S;

    // Global transitions first.
    match event {
        E::DesignatedDisabled => return Some(S::Disabled),
        E::FaultDetected if state != S::Disabled => return Some(S::Faulty),
        _ => {}
    }

    match (state, event) {
        (S::Initializing, E::Initialize) => Some(S::Listening),

        (S::Faulty, E::FaultCleared) => Some(S::Initializing),

        (S::Disabled, E::DesignatedEnabled) => Some(S::Initializing),

        (S::Listening | S::Passive | S::Uncalibrated, E::RsMaster | E::RsGrandMaster) => {
            Some(S::PreMaster)
        }
        (S::Listening | S::Passive, E::RsSlave) => Some(S::Uncalibrated),
        (S::Listening | S::Uncalibrated | S::Master | S::Slave, E::RsPassive) => Some(S::Passive),

        (S::PreMaster, E::QualificationTimeout) => Some(S::Master),
        (S::PreMaster, E::RsSlave) => Some(S::Uncalibrated),
        (S::PreMaster, E::RsPassive) => Some(S::Passive),

        (S::Master, E::RsSlave) => Some(S::Uncalibrated),

        (S::Uncalibrated, E::MasterClockSelected) => Some(S::Slave),
        (S::Uncalibrated, E::AnnounceReceiptTimeout | E::SynchronizationFault) => {
            Some(S::Listening)
        }

        (S::Slave, E::AnnounceReceiptTimeout) => Some(S::Listening),
        (S::Slave, E::SynchronizationFault) => Some(S::Uncalibrated),
        (S::Slave, E::RsMaster | E::RsGrandMaster) => Some(S::PreMaster),

        (S::Passive, E::AnnounceReceiptTimeout) => Some(S::Listening),

        _ => None,
    }
}
