use super::{announce_bytes, encode, gm_identity, local_clock_identity};
use crate::clock::OrdinaryClock;
use crate::engine::SyncHealth;
use crate::messages::Message;
use crate::port::PortState;
use crate::testing::{ClockAdjustment, RecordingHal};
use crate::time::{TimeInterval, Timestamp};
use crate::types::{ClockQuality, PortIdentity, PtpConfig};

fn secs(s: u64) -> Timestamp {
    Timestamp::from_secs(s)
}

fn clock() -> OrdinaryClock<RecordingHal> {
    let mut clock = OrdinaryClock::new(
        local_clock_identity(),
        ClockQuality::default(),
        PtpConfig::default(),
        RecordingHal::new(),
    );
    clock.start(Timestamp::ZERO);
    clock
}

/// Drive one full sync + delay exchange with `offset_ns` between the
/// clocks and a 100 ns symmetric path, starting at `base` seconds.
fn run_exchange(clock: &mut OrdinaryClock<RecordingHal>, base: u64, offset_ns: i64, seq: u16) {
    let base_ns = base * 1_000_000_000;
    let t1 = Timestamp::from_nanos(base_ns);
    let t2 = Timestamp::from_nanos(base_ns.saturating_add(100).saturating_add_signed(offset_ns));
    clock.port_mut().hal_mut().now = t2;
    clock.process_message(&announce_bytes(gm_identity(), 64, seq), t2);
    clock.process_message(&encode(&Message::sync(gm_identity(), seq, t1)), t2);
    clock.process_message(&encode(&Message::follow_up(gm_identity(), seq, t1)), t2);

    let t3 = t2 + TimeInterval::from_millis(10);
    clock.port_mut().hal_mut().now = t3;
    clock.tick(t3);

    let frames = clock.port().hal().sent_of(crate::testing::SentKind::DelayReq);
    let frame = frames.last().expect("no Delay_Req sent");
    let request = Message::decode(&frame.bytes).unwrap();
    let t4 = Timestamp::from_nanos(
        u64::try_from(t3.to_nanos()).unwrap().saturating_add(100),
    )
    .offset_by(TimeInterval::from_nanos(-offset_ns));
    let local_port = PortIdentity::new(local_clock_identity(), 1);
    let resp = Message::delay_resp(gm_identity(), request.header.sequence_id, t4, local_port);
    clock.port_mut().hal_mut().now = t4;
    clock.process_message(&encode(&resp), t4);
}

// ===== Cold start =====

#[test]
fn test_starts_listening() {
    let clock = clock();
    assert_eq!(clock.port().state(), PortState::Listening);
    assert!(!clock.is_synchronized());
}

#[test]
fn test_cold_start_reaches_slave() {
    let mut clock = clock();
    run_exchange(&mut clock, 10, 40, 1);
    assert_eq!(clock.port().state(), PortState::Uncalibrated);
    run_exchange(&mut clock, 11, 30, 2);
    run_exchange(&mut clock, 12, 20, 3);
    assert_eq!(clock.port().state(), PortState::Slave);
    assert!(clock.is_synchronized());
    assert!(clock.statistics().bmca_foreign_wins >= 1);
    assert!(clock.statistics().sub_microsecond_samples >= 3);
}

#[test]
fn test_servo_receives_samples() {
    let mut clock = clock();
    run_exchange(&mut clock, 10, 40, 1);
    let adjustments = &clock.port().hal().adjustments;
    assert_eq!(adjustments.len(), 1);
    assert!(matches!(adjustments[0], ClockAdjustment::Frequency(_)));
}

#[test]
fn test_large_offset_steps_clock() {
    let mut clock = clock();
    // 500 ms offset: way past the 128 ms step threshold.
    run_exchange(&mut clock, 10, 500_000_000, 1);
    let adjustments = &clock.port().hal().adjustments;
    assert!(adjustments.iter().any(|a| matches!(
        a,
        ClockAdjustment::Phase {
            mode: crate::hal::AdjustMode::Step,
            ..
        }
    )));
}

// ===== Malformed traffic =====

#[test]
fn test_garbage_counted_not_crashing() {
    let mut clock = clock();
    for len in 0..60usize {
        let junk = vec![0xA5u8; len];
        clock.process_message(&junk, secs(1));
    }
    assert_eq!(clock.port().state(), PortState::Listening);
    assert_eq!(clock.statistics().validations_failed, 60);
    assert_eq!(clock.statistics().messages_received(), 0);
}

#[test]
fn test_valid_traffic_counts_validations_passed() {
    let mut clock = clock();
    clock.port_mut().hal_mut().now = secs(1);
    clock.process_message(&announce_bytes(gm_identity(), 64, 0), secs(1));
    assert_eq!(clock.statistics().validations_passed, 1);
    assert_eq!(clock.statistics().announce_received, 1);
}

// ===== Health and heartbeat =====

#[test]
fn test_no_heartbeat_at_t_zero() {
    let mut clock = clock();
    clock.tick(Timestamp::ZERO);
    assert_eq!(clock.heartbeats_emitted(), 0);
}

#[test]
fn test_heartbeat_once_per_second() {
    let mut clock = clock();
    clock.tick(Timestamp::ZERO);
    clock.tick(Timestamp::from_millis(250));
    clock.tick(secs(1));
    clock.tick(Timestamp::from_millis(1_400));
    clock.tick(secs(2));
    assert_eq!(clock.heartbeats_emitted(), 2);
}

#[test]
fn test_health_snapshot_reflects_port() {
    let mut clock = clock();
    run_exchange(&mut clock, 10, 40, 1);
    let health = clock.health();
    assert_eq!(health.port_state, PortState::Uncalibrated);
    assert_eq!(health.offset_ns, 40);
    assert_eq!(health.mean_path_delay_ns, 100);
    assert_eq!(health.foreign_masters, 1);
}

#[test]
fn test_monitor_classifies_after_sampling() {
    let mut clock = clock();
    run_exchange(&mut clock, 10, 40, 1);
    // The monitor samples on the tick inside the next exchange.
    run_exchange(&mut clock, 11, 30, 2);
    assert_eq!(clock.sync_monitor().health(), SyncHealth::Synchronized);
}
