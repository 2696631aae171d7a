mod port;

use crate::messages::{AnnounceBody, Header, Message, MessageType};
use crate::port::Port;
use crate::testing::RecordingHal;
use crate::time::Timestamp;
use crate::types::{ClockIdentity, ClockQuality, PortIdentity, PtpConfig, TimeSource};

/// The local clock identity used by port tests.
pub(crate) fn local_identity() -> PortIdentity {
    PortIdentity::new(ClockIdentity([0x10; 8]), 1)
}

/// The default remote master used by port tests.
pub(crate) fn master_identity() -> PortIdentity {
    PortIdentity::new(ClockIdentity([0x20; 8]), 1)
}

/// A freshly initialized port in `Listening`.
pub(crate) fn listening_port(config: PtpConfig) -> Port<RecordingHal> {
    let mut port = Port::new(
        local_identity(),
        ClockQuality::default(),
        config,
        RecordingHal::new(),
    );
    port.initialize(Timestamp::ZERO);
    port
}

/// An Announce message from `source` with the given priority1.
pub(crate) fn announce_from(source: PortIdentity, priority1: u8, sequence: u16) -> Message {
    let body = AnnounceBody {
        origin_timestamp: Timestamp::ZERO,
        current_utc_offset: 37,
        grandmaster_priority1: priority1,
        grandmaster_clock_quality: ClockQuality::default(),
        grandmaster_priority2: 128,
        grandmaster_identity: source.clock_identity,
        steps_removed: 0,
        time_source: TimeSource::Gps,
    };
    Message::announce(source, sequence, body)
}

/// A two-step Sync from `source`.
pub(crate) fn sync_from(source: PortIdentity, sequence: u16, origin: Timestamp) -> Message {
    Message::sync(source, sequence, origin)
}

/// A `Follow_Up` from `source`.
pub(crate) fn follow_up_from(source: PortIdentity, sequence: u16, precise: Timestamp) -> Message {
    Message::follow_up(source, sequence, precise)
}

/// A `Delay_Resp` from `source` addressed to `requesting`.
pub(crate) fn delay_resp_from(
    source: PortIdentity,
    sequence: u16,
    t4: Timestamp,
    requesting: PortIdentity,
) -> Message {
    Message::delay_resp(source, sequence, t4, requesting)
}

/// Drive a port into `Uncalibrated` under `master_identity()`.
pub(crate) fn adopt_master(port: &mut Port<RecordingHal>, at: Timestamp) {
    let announce = announce_from(master_identity(), 64, 0);
    port.process_message(&announce, at).unwrap();
}

/// Run one full T1..T4 exchange against `master_identity()`.
///
/// Timestamps model a symmetric 100 ns path with the given offset in
/// nanoseconds, starting at `base` seconds.
pub(crate) fn run_offset_exchange(
    port: &mut Port<RecordingHal>,
    base: u64,
    offset_ns: i64,
    sequence: u16,
) {
    let delay_ns = 100u64;
    let t1 = Timestamp::from_nanos(base * 1_000_000_000);
    // The master keeps announcing; refresh the receipt timer so the
    // exchange is not raced by the announce timeout.
    port.process_message(&announce_from(master_identity(), 64, sequence), t1)
        .unwrap();
    // Slave receives at t1 + delay + offset (its clock runs `offset` ahead).
    let t2 = Timestamp::from_nanos(
        (base * 1_000_000_000)
            .saturating_add(delay_ns)
            .saturating_add_signed(offset_ns),
    );
    port.process_message(&sync_from(master_identity(), sequence, t1), t2)
        .unwrap();
    port.process_message(&follow_up_from(master_identity(), sequence, t1), t2)
        .unwrap();

    // The port sends Delay_Req on its next tick.
    let local_t3 = t2.offset_by(crate::time::TimeInterval::from_millis(10));
    port.hal_mut().now = local_t3;
    port.tick(local_t3);

    // Master receives it one path delay later, minus the slave's offset.
    let t4 = Timestamp::from_nanos(
        u64::try_from(local_t3.to_nanos()).unwrap().saturating_add(delay_ns),
    )
    .offset_by(crate::time::TimeInterval::from_nanos(-offset_ns));
    let seq = last_delay_req_sequence(port);
    port.process_message(
        &delay_resp_from(master_identity(), seq, t4, local_identity()),
        t4,
    )
    .unwrap();
}

/// Sequence id of the most recent `Delay_Req` the port sent.
pub(crate) fn last_delay_req_sequence(port: &Port<RecordingHal>) -> u16 {
    use crate::testing::SentKind;
    let frames = port_hal(port).sent_of(SentKind::DelayReq);
    let frame = frames.last().expect("no Delay_Req sent");
    let header = Header::decode(&frame.bytes).unwrap();
    assert_eq!(header.message_type, MessageType::DelayReq);
    header.sequence_id
}

/// Immutable access to the recording HAL of a port under test.
pub(crate) fn port_hal(port: &Port<RecordingHal>) -> &RecordingHal {
    port.hal()
}
