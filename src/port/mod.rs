//! A PTP port: state machine, message handling, and timers.
//!
//! The port is the unit the protocol runs on. It owns its data sets,
//! foreign-master table, offset engine, and sequence counters, and is
//! driven synchronously from two entry points: `process_message` for
//! received traffic and `tick` for time-based work (timeouts, periodic
//! transmission, BMCA re-evaluation). All transmission and clock access
//! goes through the injected [`PortHal`].

use tracing::{debug, info, warn};

use crate::bmca::{BmcaVerdict, ForeignMasterTable, PriorityVector};
use crate::error::PtpError;
use crate::fault::FaultInjector;
use crate::hal::PortHal;
use crate::messages::{AnnounceBody, Header, Message, MessageBody, MessageType};
use crate::metrics::Statistics;
use crate::time::{TimeInterval, Timestamp};
use crate::types::{
    ClockQuality, CurrentDataSet, DelayMechanism, ParentDataSet, PortDataSet, PortIdentity,
    PtpConfig, TimeSource,
};

mod state;
mod timing;

#[cfg(test)]
pub(crate) mod tests;

pub use state::{transition, PortEvent, PortState};
pub use timing::{OffsetEngine, OffsetSample, PdelayExchange, SampleFault};

/// Consecutive send failures in master state before a fault is raised.
const SEND_FAILURE_FAULT_THRESHOLD: u32 = 3;

/// Clean offset samples required to promote Uncalibrated to Slave.
const SAMPLES_FOR_CALIBRATION: u32 = 3;

/// A single PTP port over a platform HAL.
pub struct Port<H: PortHal> {
    config: PtpConfig,
    hal: H,
    identity: PortIdentity,
    clock_quality: ClockQuality,
    time_source: TimeSource,
    state: PortState,

    port_ds: PortDataSet,
    current_ds: CurrentDataSet,
    parent_ds: ParentDataSet,
    foreign_masters: ForeignMasterTable,
    stats: Statistics,
    fault: FaultInjector,
    offsets: OffsetEngine,
    pdelay: PdelayExchange,
    peer_delay: Option<TimeInterval>,

    announce_sequence: u16,
    sync_sequence: u16,
    delay_req_sequence: u16,

    last_announce_rx: Option<Timestamp>,
    pending_sync_sequence: Option<u16>,
    pending_sync_correction: TimeInterval,
    awaiting_delay_resp: Option<u16>,
    latest_sample: Option<OffsetSample>,

    last_announce_tx: Option<Timestamp>,
    last_sync_tx: Option<Timestamp>,
    last_delay_req_tx: Option<Timestamp>,
    premaster_since: Option<Timestamp>,

    clean_samples: u32,
    validation_baseline: u64,
    consecutive_send_failures: u32,
}

impl<H: PortHal> Port<H> {
    /// Create a port in the `Initializing` state.
    pub fn new(identity: PortIdentity, quality: ClockQuality, config: PtpConfig, hal: H) -> Self {
        let port_ds = PortDataSet::from_config(identity, &config);
        let parent_ds = ParentDataSet::self_parented(
            identity.clock_identity,
            quality,
            config.priority1,
            config.priority2,
        );
        let foreign_masters = ForeignMasterTable::new(config.foreign_master_capacity);
        let offsets = OffsetEngine::new(config.sync.variance_window_samples);
        Self {
            config,
            hal,
            identity,
            clock_quality: quality,
            time_source: TimeSource::InternalOscillator,
            state: PortState::Initializing,
            port_ds,
            current_ds: CurrentDataSet::default(),
            parent_ds,
            foreign_masters,
            stats: Statistics::new(),
            fault: FaultInjector::new(),
            offsets,
            pdelay: PdelayExchange::default(),
            peer_delay: None,
            announce_sequence: 0,
            sync_sequence: 0,
            delay_req_sequence: 0,
            last_announce_rx: None,
            pending_sync_sequence: None,
            pending_sync_correction: TimeInterval::ZERO,
            awaiting_delay_resp: None,
            latest_sample: None,
            last_announce_tx: None,
            last_sync_tx: None,
            last_delay_req_tx: None,
            premaster_since: None,
            clean_samples: 0,
            validation_baseline: 0,
            consecutive_send_failures: 0,
        }
    }

    /// Reset all port entities and enter `Listening`.
    pub fn initialize(&mut self, now: Timestamp) {
        self.port_ds = PortDataSet::from_config(self.identity, &self.config);
        self.current_ds = CurrentDataSet::default();
        self.parent_ds = ParentDataSet::self_parented(
            self.identity.clock_identity,
            self.clock_quality,
            self.config.priority1,
            self.config.priority2,
        );
        self.time_source = TimeSource::InternalOscillator;
        self.foreign_masters.clear();
        self.stats = Statistics::new();
        self.offsets.clear();
        self.pdelay = PdelayExchange::default();
        self.peer_delay = None;
        self.announce_sequence = 0;
        self.sync_sequence = 0;
        self.delay_req_sequence = 0;
        self.last_announce_rx = None;
        self.pending_sync_sequence = None;
        self.awaiting_delay_resp = None;
        self.latest_sample = None;
        self.last_announce_tx = None;
        self.last_sync_tx = None;
        self.last_delay_req_tx = None;
        self.premaster_since = None;
        self.consecutive_send_failures = 0;

        self.set_state(PortState::Initializing, now);
        let _ = self.dispatch_internal(PortEvent::Initialize, now);
    }

    /// Dispatch an external event through the state machine.
    ///
    /// # Errors
    /// Returns [`PtpError::StateError`] when the event does not apply
    /// in the current state.
    pub fn handle_event(&mut self, event: PortEvent, now: Timestamp) -> Result<PortState, PtpError> {
        match state::transition(self.state, event) {
            Some(next) => {
                self.set_state(next, now);
                Ok(next)
            }
            None => Err(PtpError::StateError(self.state)),
        }
    }

    /// Stop the port: transition to `Disabled` and cease all emission.
    pub fn stop(&mut self, now: Timestamp) {
        let _ = self.handle_event(PortEvent::DesignatedDisabled, now);
    }

    /// Raise a fault.
    pub fn inject_fault(&mut self, now: Timestamp) {
        let _ = self.handle_event(PortEvent::FaultDetected, now);
    }

    /// Clear an active fault and re-initialize.
    ///
    /// # Errors
    /// Returns [`PtpError::StateError`] when the port is not faulty.
    pub fn clear_fault(&mut self, now: Timestamp) -> Result<(), PtpError> {
        self.handle_event(PortEvent::FaultCleared, now)?;
        self.initialize(now);
        Ok(())
    }

    fn dispatch_internal(&mut self, event: PortEvent, now: Timestamp) -> Option<PortState> {
        let next = state::transition(self.state, event)?;
        self.set_state(next, now);
        Some(next)
    }

    fn set_state(&mut self, next: PortState, now: Timestamp) {
        if self.state == next {
            return;
        }
        let previous = self.state;
        self.state = next;
        self.stats.state_transitions += 1;
        // The synchronization heuristic restarts on every transition.
        self.clean_samples = 0;
        info!(port = %self.identity, %previous, state = %next, "port state transition");

        match next {
            PortState::Listening => {
                self.last_announce_rx = None;
            }
            PortState::PreMaster => {
                self.premaster_since = Some(now);
            }
            PortState::Master => {
                // Emit immediately on the next tick.
                self.last_announce_tx = None;
                self.last_sync_tx = None;
                self.consecutive_send_failures = 0;
            }
            PortState::Uncalibrated => {
                self.validation_baseline = self.stats.validations_failed;
                self.offsets.clear();
                self.pending_sync_sequence = None;
                self.awaiting_delay_resp = None;
                self.last_delay_req_tx = None;
            }
            PortState::Faulty | PortState::Disabled => {
                self.premaster_since = None;
                self.pending_sync_sequence = None;
                self.awaiting_delay_resp = None;
            }
            PortState::Initializing | PortState::Slave | PortState::Passive => {}
        }
        if previous == PortState::PreMaster && next != PortState::Master {
            self.premaster_since = None;
        }
    }

    // ---- Message processing ----

    /// Process a decoded message received at `rx`.
    ///
    /// Decode and domain validation happen upstream in the message-flow
    /// coordinator; this method routes by body and updates protocol
    /// state. Errors are informational (the caller counts them) and
    /// never leave the port in an inconsistent state.
    pub fn process_message(&mut self, message: &Message, rx: Timestamp) -> Result<(), PtpError> {
        if matches!(
            self.state,
            PortState::Disabled | PortState::Faulty | PortState::Initializing
        ) {
            return Ok(());
        }
        match &message.body {
            MessageBody::Announce(body) => self.process_announce(&message.header, body, rx),
            MessageBody::Sync { origin_timestamp } => {
                self.process_sync(&message.header, *origin_timestamp, rx)
            }
            MessageBody::FollowUp {
                precise_origin_timestamp,
            } => self.process_follow_up(&message.header, *precise_origin_timestamp),
            MessageBody::DelayReq { .. } => self.process_delay_req(&message.header, rx),
            MessageBody::DelayResp {
                receive_timestamp,
                requesting_port_identity,
            } => self.process_delay_resp(
                &message.header,
                *receive_timestamp,
                *requesting_port_identity,
            ),
            MessageBody::PdelayReq { .. } => self.process_pdelay_req(&message.header, rx),
            MessageBody::PdelayResp {
                request_receipt_timestamp,
                requesting_port_identity,
            } => self.process_pdelay_resp(*request_receipt_timestamp, *requesting_port_identity, rx),
            MessageBody::PdelayRespFollowUp {
                response_origin_timestamp,
                requesting_port_identity,
            } => {
                self.process_pdelay_resp_follow_up(
                    *response_origin_timestamp,
                    *requesting_port_identity,
                );
                Ok(())
            }
            // Header-valid signaling and management are accepted as stubs.
            MessageBody::Signaling { .. } | MessageBody::Management { .. } => Ok(()),
        }
    }

    /// Process an Announce from a candidate master.
    pub fn process_announce(
        &mut self,
        header: &Header,
        body: &AnnounceBody,
        rx: Timestamp,
    ) -> Result<(), PtpError> {
        self.stats.announce_received += 1;

        // Our own Announces looping back carry no election information.
        if header.source_port_identity.clock_identity == self.identity.clock_identity {
            return Ok(());
        }

        self.last_announce_rx = Some(rx);

        if self
            .foreign_masters
            .upsert(header.source_port_identity, *body, rx)
            .is_err()
        {
            self.stats.validations_failed += 1;
            return Err(PtpError::ResourceUnavailable("foreign-master table full"));
        }

        self.run_bmca(rx);
        Ok(())
    }

    /// Process a Sync, recording T2 (and T1 for one-step masters).
    pub fn process_sync(
        &mut self,
        header: &Header,
        origin: Timestamp,
        rx: Timestamp,
    ) -> Result<(), PtpError> {
        self.stats.sync_received += 1;
        if !self.state.is_slave_role()
            || header.source_port_identity != self.parent_ds.parent_port_identity
        {
            return Ok(());
        }

        let correction = TimeInterval::from_scaled_ns(header.correction_field);
        if header.is_two_step() {
            self.offsets.record_sync_rx(rx);
            self.pending_sync_sequence = Some(header.sequence_id);
            self.pending_sync_correction = correction;
        } else {
            self.offsets.record_sync(origin + correction, rx);
            self.pending_sync_sequence = None;
            self.complete_sample_if_ready();
        }
        Ok(())
    }

    /// Process a `Follow_Up` carrying the precise T1.
    pub fn process_follow_up(&mut self, header: &Header, precise: Timestamp) -> Result<(), PtpError> {
        self.stats.follow_up_received += 1;
        if header.source_port_identity != self.parent_ds.parent_port_identity {
            return Ok(());
        }
        let Some(pending) = self.pending_sync_sequence else {
            debug!(seq = header.sequence_id, "Follow_Up without a pending Sync");
            return Ok(());
        };
        if pending != header.sequence_id {
            debug!(
                expected = pending,
                got = header.sequence_id,
                "Follow_Up sequence mismatch"
            );
            return Ok(());
        }
        let correction = self
            .pending_sync_correction
            .saturating_add(TimeInterval::from_scaled_ns(header.correction_field));
        self.offsets.record_precise_origin(precise + correction);
        self.pending_sync_sequence = None;
        self.complete_sample_if_ready();
        Ok(())
    }

    /// Respond to a `Delay_Req` when acting as master.
    pub fn process_delay_req(&mut self, header: &Header, rx: Timestamp) -> Result<(), PtpError> {
        self.stats.delay_req_received += 1;
        if self.state != PortState::Master {
            return Ok(());
        }
        let mut response = Message::delay_resp(
            self.identity,
            header.sequence_id,
            rx,
            header.source_port_identity,
        );
        response.header.domain_number = self.config.domain_number;
        response.header.correction_field = header.correction_field;
        response.header.log_message_interval = self.config.log_min_delay_req_interval;

        let mut frame = [0u8; Message::MAX_FIXED_SIZE];
        let len = response.encode(&mut frame)?;
        match self.hal.send_delay_resp(&frame[..len]) {
            Ok(_) => {
                self.stats.delay_resp_sent += 1;
                self.consecutive_send_failures = 0;
                Ok(())
            }
            Err(e) => {
                self.note_send_failure(rx, &e);
                Err(e)
            }
        }
    }

    /// Process a `Delay_Resp` carrying T4.
    pub fn process_delay_resp(
        &mut self,
        header: &Header,
        receive_timestamp: Timestamp,
        requesting: PortIdentity,
    ) -> Result<(), PtpError> {
        self.stats.delay_resp_received += 1;
        if requesting != self.identity
            || header.source_port_identity != self.parent_ds.parent_port_identity
        {
            return Ok(());
        }
        if self.awaiting_delay_resp != Some(header.sequence_id) {
            debug!(seq = header.sequence_id, "unexpected Delay_Resp sequence");
            return Ok(());
        }
        self.awaiting_delay_resp = None;
        let correction = TimeInterval::from_scaled_ns(header.correction_field);
        self.offsets
            .record_delay_resp(receive_timestamp.offset_by(-correction));
        self.complete_sample_if_ready();
        Ok(())
    }

    fn process_pdelay_req(&mut self, header: &Header, rx: Timestamp) -> Result<(), PtpError> {
        // Peer delay is answered in every operational state.
        let mut response = Message {
            header: Header::new(
                MessageType::PdelayResp,
                self.identity,
                header.sequence_id,
            ),
            body: MessageBody::PdelayResp {
                request_receipt_timestamp: rx,
                requesting_port_identity: header.source_port_identity,
            },
        };
        response.header.domain_number = self.config.domain_number;

        let mut frame = [0u8; Message::MAX_FIXED_SIZE];
        let len = response.encode(&mut frame)?;
        let egress = self.hal.send_delay_resp(&frame[..len])?;
        let t3 = egress.unwrap_or_else(|| self.hal.timestamp());

        let mut follow_up = Message {
            header: Header::new(
                MessageType::PdelayRespFollowUp,
                self.identity,
                header.sequence_id,
            ),
            body: MessageBody::PdelayRespFollowUp {
                response_origin_timestamp: t3,
                requesting_port_identity: header.source_port_identity,
            },
        };
        follow_up.header.domain_number = self.config.domain_number;
        let len = follow_up.encode(&mut frame)?;
        self.hal.send_follow_up(&frame[..len])?;
        Ok(())
    }

    fn process_pdelay_resp(
        &mut self,
        request_receipt: Timestamp,
        requesting: PortIdentity,
        rx: Timestamp,
    ) -> Result<(), PtpError> {
        if requesting != self.identity {
            return Ok(());
        }
        self.pdelay.record_response(request_receipt, rx);
        Ok(())
    }

    fn process_pdelay_resp_follow_up(&mut self, response_origin: Timestamp, requesting: PortIdentity) {
        if requesting != self.identity {
            return;
        }
        self.pdelay.record_response_origin(response_origin);
        match self.pdelay.try_complete() {
            Some(Ok(delay)) => {
                self.peer_delay = Some(delay);
                self.port_ds.peer_mean_path_delay = delay;
            }
            Some(Err(_)) => {
                self.stats.validations_failed += 1;
            }
            None => {}
        }
    }

    fn complete_sample_if_ready(&mut self) {
        let outcome = match self.port_ds.delay_mechanism {
            DelayMechanism::E2E => self.offsets.try_complete(),
            DelayMechanism::P2P => match self.peer_delay {
                Some(delay) => self.offsets.try_complete_p2p(delay),
                None => None,
            },
        };
        match outcome {
            Some(Ok(sample)) => {
                self.stats.offsets_computed += 1;
                self.stats.validations_passed += 1;
                if sample.offset.abs() < TimeInterval::from_micros(1) {
                    self.stats.sub_microsecond_samples += 1;
                }
                self.current_ds.offset_from_master = sample.offset;
                self.current_ds.mean_path_delay = sample.mean_path_delay;
                self.clean_samples += 1;
                self.latest_sample = Some(sample);
                self.check_calibration();
            }
            Some(Err(_)) => {
                self.stats.validations_failed += 1;
            }
            None => {}
        }
    }

    fn check_calibration(&mut self) {
        if self.state != PortState::Uncalibrated {
            return;
        }
        if self.clean_samples >= SAMPLES_FOR_CALIBRATION
            && self.stats.validations_failed == self.validation_baseline
        {
            // The heuristic needs a time for entry actions; the latest
            // sample implies one was just processed, so reuse the last
            // announce time or zero.
            let now = self.last_announce_rx.unwrap_or(Timestamp::ZERO);
            let _ = self.dispatch_internal(PortEvent::MasterClockSelected, now);
        }
    }

    // ---- Tick-driven work ----

    /// Advance timers: timeouts, periodic transmission, and BMCA
    /// re-evaluation. `now` must be monotonic across calls.
    pub fn tick(&mut self, now: Timestamp) {
        match self.state {
            PortState::Disabled | PortState::Faulty | PortState::Initializing => return,
            _ => {}
        }

        if self.state.tracks_announce_timeout() && self.announce_timed_out(now) {
            self.stats.announce_timeouts += 1;
            warn!(port = %self.identity, "announce receipt timeout, clearing masters");
            self.foreign_masters.clear();
            let _ = self.dispatch_internal(PortEvent::AnnounceReceiptTimeout, now);
            return;
        }

        let staleness = TimeInterval::from_nanos(self.config.announce_timeout_ns());
        self.foreign_masters.prune(now, staleness);

        if self.state == PortState::PreMaster {
            self.run_bmca(now);
        }
        if self.state == PortState::PreMaster && self.qualification_elapsed(now) {
            let _ = self.dispatch_internal(PortEvent::QualificationTimeout, now);
        }

        if self.state == PortState::Listening && !self.foreign_masters.is_empty() {
            self.run_bmca(now);
        }

        if self.state == PortState::Master {
            self.master_emissions(now);
        }

        if self.state.is_slave_role() && self.delay_req_due(now) {
            match self.port_ds.delay_mechanism {
                DelayMechanism::E2E => self.send_delay_req(now),
                DelayMechanism::P2P => self.send_pdelay_req(now),
            }
        }
    }

    /// Whether the pre-master qualification wait is over. Profiles
    /// without the hold-down (gPTP) promote on the first tick.
    fn qualification_elapsed(&self, now: Timestamp) -> bool {
        if !self.config.profile.uses_qualification_hold_down() {
            return true;
        }
        self.premaster_since
            .is_some_and(|since| (now - since).nanos() >= self.config.announce_interval_ns())
    }

    fn announce_timed_out(&self, now: Timestamp) -> bool {
        self.last_announce_rx
            .is_some_and(|last| (now - last).nanos() > self.config.announce_timeout_ns())
    }

    fn delay_req_due(&self, now: Timestamp) -> bool {
        self.last_delay_req_tx
            .is_none_or(|last| (now - last).nanos() >= self.config.delay_req_interval_ns())
    }

    // ---- BMCA ----

    /// Re-evaluate the best master on demand (periodic coordinator
    /// path). Honors the no-compare rule: outside `PreMaster`, an empty
    /// foreign-master table means there is nothing to elect and the
    /// call is a no-op.
    pub fn evaluate_bmca(&mut self, now: Timestamp) {
        match self.state {
            PortState::Disabled | PortState::Faulty | PortState::Initializing => return,
            PortState::PreMaster => {}
            _ if self.foreign_masters.is_empty() => return,
            _ => {}
        }
        self.run_bmca(now);
    }

    /// Run the best-master election against the current foreign set.
    ///
    /// Never called with nothing to compare except in `PreMaster`,
    /// where a local-only candidate list legitimately elects the local
    /// clock; a port in `Listening` with an empty table stays put so a
    /// just-forgotten master cannot be replaced by self-election.
    fn run_bmca(&mut self, now: Timestamp) {
        if self.fault.take_forced_tie() {
            self.stats.bmca_forced_ties += 1;
            self.stats.bmca_passive_wins += 1;
            info!(port = %self.identity, "BMCA tie forced by fault injection");
            let _ = self.dispatch_internal(PortEvent::RsPassive, now);
            return;
        }

        let local = PriorityVector::local(
            &self.config,
            self.identity.clock_identity,
            self.clock_quality,
        );

        let mut best_foreign: Option<(PortIdentity, PriorityVector, AnnounceBody)> = None;
        for entry in self.foreign_masters.iter() {
            let vector = PriorityVector::from_announce(&entry.last_announce);
            let better = match &best_foreign {
                None => true,
                Some((_, current, _)) => vector.compare(current) == BmcaVerdict::Better,
            };
            if better {
                best_foreign = Some((entry.source_port_identity, vector, entry.last_announce));
            }
        }

        match best_foreign {
            None => self.adopt_local_grandmaster(now),
            Some((source, vector, announce)) => match local.compare(&vector) {
                BmcaVerdict::Better => self.adopt_local_grandmaster(now),
                BmcaVerdict::Equal => {
                    self.stats.bmca_passive_wins += 1;
                    info!(port = %self.identity, "BMCA tie with foreign master, going passive");
                    let _ = self.dispatch_internal(PortEvent::RsPassive, now);
                }
                BmcaVerdict::Worse => self.adopt_foreign_master(source, &announce, now),
            },
        }
    }

    fn adopt_local_grandmaster(&mut self, now: Timestamp) {
        self.stats.bmca_local_wins += 1;
        self.current_ds.steps_removed = 0;
        self.current_ds.offset_from_master = TimeInterval::ZERO;
        self.parent_ds = ParentDataSet::self_parented(
            self.identity.clock_identity,
            self.clock_quality,
            self.config.priority1,
            self.config.priority2,
        );
        self.time_source = TimeSource::InternalOscillator;
        let _ = self.dispatch_internal(PortEvent::RsGrandMaster, now);
    }

    fn adopt_foreign_master(&mut self, source: PortIdentity, announce: &AnnounceBody, now: Timestamp) {
        self.stats.bmca_foreign_wins += 1;
        let parent_changed = self.parent_ds.parent_port_identity != source;

        self.parent_ds.parent_port_identity = source;
        self.parent_ds.grandmaster_identity = announce.grandmaster_identity;
        self.parent_ds.grandmaster_clock_quality = announce.grandmaster_clock_quality;
        self.parent_ds.grandmaster_priority1 = announce.grandmaster_priority1;
        self.parent_ds.grandmaster_priority2 = announce.grandmaster_priority2;
        self.current_ds.steps_removed = announce.steps_removed.saturating_add(1);
        self.time_source = announce.time_source;

        if parent_changed {
            info!(
                port = %self.identity,
                parent = %source,
                grandmaster = %announce.grandmaster_identity,
                "adopted new parent"
            );
        }

        if self.state == PortState::Slave && parent_changed {
            // A new parent restarts calibration.
            let _ = self.dispatch_internal(PortEvent::SynchronizationFault, now);
            return;
        }
        let _ = self.dispatch_internal(PortEvent::RsSlave, now);
    }

    // ---- Master-side transmission ----

    fn master_emissions(&mut self, now: Timestamp) {
        let announce_due = self
            .last_announce_tx
            .is_none_or(|last| (now - last).nanos() >= self.config.announce_interval_ns());
        if announce_due {
            self.send_announce(now);
            self.last_announce_tx = Some(now);
        }
        if self.state != PortState::Master {
            // A send-failure fault mid-emission stops the cycle.
            return;
        }

        let sync_due = self
            .last_sync_tx
            .is_none_or(|last| (now - last).nanos() >= self.config.sync_interval_ns());
        if sync_due {
            self.send_sync_pair(now);
            self.last_sync_tx = Some(now);
        }
    }

    fn send_announce(&mut self, now: Timestamp) {
        let body = AnnounceBody {
            origin_timestamp: self.hal.timestamp(),
            current_utc_offset: 0,
            grandmaster_priority1: self.parent_ds.grandmaster_priority1,
            grandmaster_clock_quality: self.parent_ds.grandmaster_clock_quality,
            grandmaster_priority2: self.parent_ds.grandmaster_priority2,
            grandmaster_identity: self.parent_ds.grandmaster_identity,
            steps_removed: self.current_ds.steps_removed,
            time_source: self.time_source,
        };
        let mut message = Message::announce(self.identity, self.announce_sequence, body);
        message.header.domain_number = self.config.domain_number;
        message.header.log_message_interval = self.config.log_announce_interval;

        let mut frame = [0u8; Message::MAX_FIXED_SIZE];
        match message
            .encode(&mut frame)
            .map_err(PtpError::from)
            .and_then(|len| self.hal.send_announce(&frame[..len]))
        {
            Ok(_) => {
                self.stats.announce_sent += 1;
                self.announce_sequence = self.announce_sequence.wrapping_add(1);
                self.consecutive_send_failures = 0;
            }
            Err(e) => self.note_send_failure(now, &e),
        }
    }

    fn send_sync_pair(&mut self, now: Timestamp) {
        let sequence = self.sync_sequence;
        let origin = self.hal.timestamp();
        let mut sync = Message::sync(self.identity, sequence, origin);
        sync.header.domain_number = self.config.domain_number;
        sync.header.log_message_interval = self.config.log_sync_interval;

        let mut frame = [0u8; Message::MAX_FIXED_SIZE];
        let egress = match sync
            .encode(&mut frame)
            .map_err(PtpError::from)
            .and_then(|len| self.hal.send_sync(&frame[..len]))
        {
            Ok(egress) => {
                self.stats.sync_sent += 1;
                egress
            }
            Err(e) => {
                self.note_send_failure(now, &e);
                return;
            }
        };

        // The precise origin for the Follow_Up: hardware egress stamp
        // when available, a fresh software read otherwise.
        let precise = egress.unwrap_or_else(|| self.hal.timestamp());
        let mut follow_up = Message::follow_up(self.identity, sequence, precise);
        follow_up.header.domain_number = self.config.domain_number;
        follow_up.header.log_message_interval = self.config.log_sync_interval;

        match follow_up
            .encode(&mut frame)
            .map_err(PtpError::from)
            .and_then(|len| self.hal.send_follow_up(&frame[..len]))
        {
            Ok(_) => {
                self.stats.follow_up_sent += 1;
                self.sync_sequence = self.sync_sequence.wrapping_add(1);
                self.consecutive_send_failures = 0;
            }
            Err(e) => self.note_send_failure(now, &e),
        }
    }

    // ---- Slave-side transmission ----

    fn send_delay_req(&mut self, now: Timestamp) {
        let sequence = self.delay_req_sequence;
        let fallback_t3 = self.hal.timestamp();
        let mut message = Message::delay_req(self.identity, sequence, fallback_t3);
        message.header.domain_number = self.config.domain_number;
        message.header.log_message_interval = self.config.log_min_delay_req_interval;

        let mut frame = [0u8; Message::MAX_FIXED_SIZE];
        match message
            .encode(&mut frame)
            .map_err(PtpError::from)
            .and_then(|len| self.hal.send_delay_req(&frame[..len]))
        {
            Ok(egress) => {
                let t3 = egress.unwrap_or(fallback_t3);
                self.offsets.record_delay_req_tx(t3);
                self.awaiting_delay_resp = Some(sequence);
                self.stats.delay_req_sent += 1;
                self.delay_req_sequence = self.delay_req_sequence.wrapping_add(1);
                self.last_delay_req_tx = Some(now);
            }
            Err(e) => {
                warn!(port = %self.identity, error = %e, "Delay_Req send failed");
            }
        }
    }

    fn send_pdelay_req(&mut self, now: Timestamp) {
        let sequence = self.delay_req_sequence;
        let fallback_t1 = self.hal.timestamp();
        let mut message = Message {
            header: Header::new(
                MessageType::PdelayReq,
                self.identity,
                sequence,
            ),
            body: MessageBody::PdelayReq {
                origin_timestamp: fallback_t1,
            },
        };
        message.header.domain_number = self.config.domain_number;

        let mut frame = [0u8; Message::MAX_FIXED_SIZE];
        match message
            .encode(&mut frame)
            .map_err(PtpError::from)
            .and_then(|len| self.hal.send_delay_req(&frame[..len]))
        {
            Ok(egress) => {
                let t1 = egress.unwrap_or(fallback_t1);
                self.pdelay.record_request_tx(t1);
                self.stats.delay_req_sent += 1;
                self.delay_req_sequence = self.delay_req_sequence.wrapping_add(1);
                self.last_delay_req_tx = Some(now);
            }
            Err(e) => {
                warn!(port = %self.identity, error = %e, "Pdelay_Req send failed");
            }
        }
    }

    fn note_send_failure(&mut self, now: Timestamp, error: &PtpError) {
        warn!(port = %self.identity, %error, "send failed");
        if self.state == PortState::Master {
            self.consecutive_send_failures += 1;
            if self.consecutive_send_failures >= SEND_FAILURE_FAULT_THRESHOLD {
                warn!(
                    port = %self.identity,
                    failures = self.consecutive_send_failures,
                    "repeated send failures, raising fault"
                );
                let _ = self.dispatch_internal(PortEvent::FaultDetected, now);
            }
        }
    }

    // ---- Accessors ----

    /// The port's identity.
    #[must_use]
    pub const fn identity(&self) -> PortIdentity {
        self.identity
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> PortState {
        self.state
    }

    /// Protocol counters.
    #[must_use]
    pub const fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Counter access for the owning clock's coordinators.
    pub(crate) fn statistics_mut(&mut self) -> &mut Statistics {
        &mut self.stats
    }

    /// The port data set.
    #[must_use]
    pub const fn port_data_set(&self) -> &PortDataSet {
        &self.port_ds
    }

    /// The current data set (offset, delay, steps removed).
    #[must_use]
    pub const fn current_data_set(&self) -> &CurrentDataSet {
        &self.current_ds
    }

    /// The parent data set (adopted grandmaster description).
    #[must_use]
    pub const fn parent_data_set(&self) -> &ParentDataSet {
        &self.parent_ds
    }

    /// Write access to the parent data set, for boundary-clock parent
    /// propagation.
    pub fn parent_data_set_mut(&mut self) -> &mut ParentDataSet {
        &mut self.parent_ds
    }

    /// Set the steps-removed a boundary clock's master port advertises.
    pub fn set_steps_removed(&mut self, steps: u16) {
        self.current_ds.steps_removed = steps;
    }

    /// Set the time source advertised in Announces.
    pub fn set_time_source(&mut self, source: TimeSource) {
        self.time_source = source;
    }

    /// The time source currently advertised in Announces.
    #[must_use]
    pub const fn time_source(&self) -> TimeSource {
        self.time_source
    }

    /// Number of observed foreign masters.
    #[must_use]
    pub fn foreign_master_count(&self) -> usize {
        self.foreign_masters.len()
    }

    /// The offset engine, for statistics sampling.
    #[must_use]
    pub const fn offset_engine(&self) -> &OffsetEngine {
        &self.offsets
    }

    /// Take the most recent offset sample, if a new one was produced.
    pub fn take_offset_sample(&mut self) -> Option<OffsetSample> {
        self.latest_sample.take()
    }

    /// The fault injector for this port.
    pub fn fault_injector_mut(&mut self) -> &mut FaultInjector {
        &mut self.fault
    }

    /// The configuration this port runs with.
    #[must_use]
    pub const fn config(&self) -> &PtpConfig {
        &self.config
    }

    /// The platform HAL this port transmits through.
    #[must_use]
    pub const fn hal(&self) -> &H {
        &self.hal
    }

    /// Mutable HAL access, for servo corrections applied by the owning
    /// clock.
    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }
}
