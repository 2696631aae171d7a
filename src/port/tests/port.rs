use super::{
    adopt_master, announce_from, delay_resp_from, follow_up_from, listening_port, local_identity,
    master_identity, run_offset_exchange, sync_from,
};
use crate::messages::{Header, Message, MessageType};
use crate::port::{Port, PortEvent, PortState};
use crate::testing::{RecordingHal, SentKind};
use crate::time::{TimeInterval, Timestamp};
use crate::types::{ClockIdentity, ClockQuality, PortIdentity, Profile, PtpConfig};

fn secs(s: u64) -> Timestamp {
    Timestamp::from_secs(s)
}

// ===== Lifecycle =====

#[test]
fn test_new_port_is_initializing() {
    let port = Port::new(
        local_identity(),
        ClockQuality::default(),
        PtpConfig::default(),
        RecordingHal::new(),
    );
    assert_eq!(port.state(), PortState::Initializing);
}

#[test]
fn test_initialize_enters_listening() {
    let port = listening_port(PtpConfig::default());
    assert_eq!(port.state(), PortState::Listening);
}

#[test]
fn test_stop_disables_port() {
    let mut port = listening_port(PtpConfig::default());
    port.stop(secs(1));
    assert_eq!(port.state(), PortState::Disabled);
    // Ticks in Disabled emit nothing.
    port.tick(secs(100));
    assert!(port.hal().sent.is_empty());
}

#[test]
fn test_fault_and_recovery() {
    let mut port = listening_port(PtpConfig::default());
    port.inject_fault(secs(1));
    assert_eq!(port.state(), PortState::Faulty);
    port.clear_fault(secs(2)).unwrap();
    assert_eq!(port.state(), PortState::Listening);
}

#[test]
fn test_invalid_event_surfaces_state_error() {
    let mut port = listening_port(PtpConfig::default());
    let err = port
        .handle_event(PortEvent::QualificationTimeout, secs(1))
        .unwrap_err();
    assert!(matches!(err, crate::error::PtpError::StateError(_)));
}

// ===== BMCA driven role selection =====

#[test]
fn test_local_wins_against_worse_foreign() {
    let mut port = listening_port(PtpConfig::default());
    let announce = announce_from(master_identity(), 200, 0);
    port.process_message(&announce, secs(1)).unwrap();
    assert_eq!(port.state(), PortState::PreMaster);
    assert!(port.statistics().bmca_local_wins >= 1);

    // Qualification: one announce interval later the port is master.
    port.tick(secs(3));
    assert_eq!(port.state(), PortState::Master);
}

#[test]
fn test_foreign_wins_against_local() {
    let mut port = listening_port(PtpConfig::default());
    adopt_master(&mut port, secs(1));
    assert_eq!(port.state(), PortState::Uncalibrated);
    assert!(port.statistics().bmca_foreign_wins >= 1);
    assert_eq!(
        port.parent_data_set().parent_port_identity,
        master_identity()
    );
    assert_eq!(
        port.parent_data_set().grandmaster_identity,
        master_identity().clock_identity
    );
    assert_eq!(port.current_data_set().steps_removed, 1);
}

#[test]
fn test_best_of_three_masters_adopted() {
    let mut port = listening_port(PtpConfig::default());
    let masters = [
        (PortIdentity::new(ClockIdentity([0x31; 8]), 1), 150u8),
        (PortIdentity::new(ClockIdentity([0x32; 8]), 1), 100u8),
        (PortIdentity::new(ClockIdentity([0x33; 8]), 1), 200u8),
    ];
    for (i, (source, priority)) in masters.iter().enumerate() {
        let announce = announce_from(*source, *priority, u16::try_from(i).unwrap());
        port.process_message(&announce, secs(1)).unwrap();
    }
    assert_eq!(port.state(), PortState::Uncalibrated);
    assert_eq!(
        port.parent_data_set().grandmaster_identity,
        ClockIdentity([0x32; 8])
    );
    assert_eq!(port.foreign_master_count(), 3);
}

#[test]
fn test_own_announce_ignored() {
    let mut port = listening_port(PtpConfig::default());
    let announce = announce_from(local_identity(), 1, 0);
    port.process_message(&announce, secs(1)).unwrap();
    assert_eq!(port.state(), PortState::Listening);
    assert_eq!(port.foreign_master_count(), 0);
}

#[test]
fn test_foreign_table_overflow_counts_validation_failure() {
    let config = PtpConfig::builder().foreign_master_capacity(2).build();
    let mut port = listening_port(config);
    for n in 0x40..0x43u8 {
        let source = PortIdentity::new(ClockIdentity([n; 8]), 1);
        // Priorities worse than local so the port stays out of slave.
        let _ = port.process_message(&announce_from(source, 250, 0), secs(1));
    }
    assert_eq!(port.foreign_master_count(), 2);
    assert_eq!(port.statistics().validations_failed, 1);
}

#[test]
fn test_forced_tie_goes_passive_once() {
    let mut port = listening_port(PtpConfig::default());
    port.fault_injector_mut().force_bmca_tie();
    let announce = announce_from(master_identity(), 64, 0);
    port.process_message(&announce, secs(1)).unwrap();
    assert_eq!(port.state(), PortState::Passive);
    assert_eq!(port.statistics().bmca_forced_ties, 1);
    assert_eq!(port.statistics().bmca_passive_wins, 1);

    // The flag cleared itself; the next announce elects normally.
    let announce = announce_from(master_identity(), 64, 1);
    port.process_message(&announce, secs(2)).unwrap();
    assert_eq!(port.state(), PortState::Uncalibrated);
}

#[test]
fn test_gptp_profile_still_elects_a_better_master() {
    let config = PtpConfig::builder().profile(Profile::GPtp).build();
    let mut port = listening_port(config);
    adopt_master(&mut port, secs(1));
    assert_eq!(port.state(), PortState::Uncalibrated);
    assert_eq!(port.foreign_master_count(), 1);
    assert_eq!(
        port.parent_data_set().parent_port_identity,
        master_identity()
    );
}

#[test]
fn test_gptp_profile_promotes_without_qualification_wait() {
    let config = PtpConfig::builder().profile(Profile::GPtp).build();
    let mut port = listening_port(config);
    port.process_message(&announce_from(master_identity(), 200, 0), secs(1))
        .unwrap();
    assert_eq!(port.state(), PortState::PreMaster);

    // No announce-interval hold-down under gPTP: the next tick promotes.
    port.tick(secs(1));
    assert_eq!(port.state(), PortState::Master);
}

#[test]
fn test_default_profile_waits_out_qualification() {
    let mut port = listening_port(PtpConfig::default());
    port.process_message(&announce_from(master_identity(), 200, 0), secs(1))
        .unwrap();
    assert_eq!(port.state(), PortState::PreMaster);

    // Within the announce interval the port is still qualifying.
    port.tick(Timestamp::from_millis(1_500));
    assert_eq!(port.state(), PortState::PreMaster);
    port.tick(secs(2));
    assert_eq!(port.state(), PortState::Master);
}

// ===== Announce receipt timeout =====

#[test]
fn test_announce_timeout_clears_masters_and_listens() {
    let mut port = listening_port(PtpConfig::default());
    adopt_master(&mut port, secs(10));
    assert_eq!(port.state(), PortState::Uncalibrated);

    // 3 × 1 s announce interval; at 13.5 s the master is gone.
    port.tick(Timestamp::from_millis(13_500));
    assert_eq!(port.state(), PortState::Listening);
    assert_eq!(port.foreign_master_count(), 0);
    assert_eq!(port.statistics().announce_timeouts, 1);

    // No self-election from the stale entry on subsequent ticks.
    port.tick(secs(20));
    port.tick(secs(21));
    assert_eq!(port.state(), PortState::Listening);
    assert_eq!(port.statistics().bmca_local_wins, 0);
}

#[test]
fn test_no_timeout_while_announces_keep_arriving() {
    let mut port = listening_port(PtpConfig::default());
    adopt_master(&mut port, secs(10));
    for s in 11..16 {
        port.process_message(&announce_from(master_identity(), 64, s), secs(u64::from(s)))
            .unwrap();
        port.tick(secs(u64::from(s)));
    }
    assert_ne!(port.state(), PortState::Listening);
    assert_eq!(port.statistics().announce_timeouts, 0);
}

// ===== Master emissions =====

fn master_port() -> (Port<RecordingHal>, Timestamp) {
    let mut port = listening_port(PtpConfig::default());
    port.process_message(&announce_from(master_identity(), 200, 0), secs(1))
        .unwrap();
    let now = secs(3);
    port.tick(now); // qualification
    assert_eq!(port.state(), PortState::Master);
    (port, now)
}

#[test]
fn test_master_emits_announce_and_sync_pairs() {
    let (mut port, now) = master_port();
    port.hal_mut().now = now;
    port.tick(now);
    assert_eq!(port.hal().count_of(SentKind::Announce), 1);
    assert_eq!(port.hal().count_of(SentKind::Sync), 1);
    assert_eq!(port.hal().count_of(SentKind::FollowUp), 1);
    assert_eq!(port.statistics().announce_sent, 1);
    assert_eq!(port.statistics().sync_sent, 1);

    // Sync runs at 8 Hz, announce at 1 Hz.
    let later = now + TimeInterval::from_millis(125);
    port.hal_mut().now = later;
    port.tick(later);
    assert_eq!(port.hal().count_of(SentKind::Announce), 1);
    assert_eq!(port.hal().count_of(SentKind::Sync), 2);
}

#[test]
fn test_master_announce_content() {
    let (mut port, now) = master_port();
    port.hal_mut().now = now;
    port.tick(now);
    let frames = port.hal().sent_of(SentKind::Announce);
    let decoded = Message::decode(&frames[0].bytes).unwrap();
    assert_eq!(decoded.header.message_type, MessageType::Announce);
    assert_eq!(decoded.header.source_port_identity, local_identity());
    match decoded.body {
        crate::messages::MessageBody::Announce(body) => {
            assert_eq!(body.grandmaster_identity, local_identity().clock_identity);
            assert_eq!(body.steps_removed, 0);
            assert_eq!(body.grandmaster_priority1, 128);
        }
        other => panic!("expected Announce, got {other:?}"),
    }
}

#[test]
fn test_sync_sequence_ids_increment() {
    let (mut port, mut now) = master_port();
    for _ in 0..3 {
        port.hal_mut().now = now;
        port.tick(now);
        now = now + TimeInterval::from_millis(125);
    }
    let frames = port.hal().sent_of(SentKind::Sync);
    let sequences: Vec<u16> = frames
        .iter()
        .map(|f| Header::decode(&f.bytes).unwrap().sequence_id)
        .collect();
    assert_eq!(sequences, vec![0, 1, 2]);
}

#[test]
fn test_master_answers_delay_req() {
    let (mut port, now) = master_port();
    let slave = PortIdentity::new(ClockIdentity([0x55; 8]), 1);
    let request = Message::delay_req(slave, 9, Timestamp::ZERO);
    let rx = now + TimeInterval::from_millis(1);
    port.process_message(&request, rx).unwrap();

    let frames = port.hal().sent_of(SentKind::DelayResp);
    assert_eq!(frames.len(), 1);
    let decoded = Message::decode(&frames[0].bytes).unwrap();
    match decoded.body {
        crate::messages::MessageBody::DelayResp {
            receive_timestamp,
            requesting_port_identity,
        } => {
            assert_eq!(receive_timestamp, rx);
            assert_eq!(requesting_port_identity, slave);
        }
        other => panic!("expected DelayResp, got {other:?}"),
    }
    assert_eq!(decoded.header.sequence_id, 9);
    assert_eq!(port.statistics().delay_req_received, 1);
    assert_eq!(port.statistics().delay_resp_sent, 1);
}

#[test]
fn test_repeated_send_failures_raise_fault() {
    let (mut port, now) = master_port();
    port.hal_mut().fail_sends = true;
    let mut t = now;
    for _ in 0..4 {
        t = t + TimeInterval::from_secs(1);
        port.hal_mut().now = t;
        port.tick(t);
        if port.state() == PortState::Faulty {
            break;
        }
    }
    assert_eq!(port.state(), PortState::Faulty);
}

// ===== Slave path =====

#[test]
fn test_slave_sends_delay_req_when_uncalibrated() {
    let mut port = listening_port(PtpConfig::default());
    adopt_master(&mut port, secs(10));
    port.hal_mut().now = secs(10);
    port.tick(secs(10));
    assert_eq!(port.hal().count_of(SentKind::DelayReq), 1);
    assert_eq!(port.statistics().delay_req_sent, 1);
}

#[test]
fn test_full_exchange_computes_offset() {
    let mut port = listening_port(PtpConfig::default());
    adopt_master(&mut port, secs(10));
    run_offset_exchange(&mut port, 10, 50, 1);
    assert_eq!(port.statistics().offsets_computed, 1);
    assert_eq!(
        port.current_data_set().offset_from_master,
        TimeInterval::from_nanos(50)
    );
    assert_eq!(
        port.current_data_set().mean_path_delay,
        TimeInterval::from_nanos(100)
    );
    let sample = port.take_offset_sample().unwrap();
    assert_eq!(sample.offset, TimeInterval::from_nanos(50));
    // Taking the sample consumes it.
    assert!(port.take_offset_sample().is_none());
}

#[test]
fn test_three_clean_samples_promote_to_slave() {
    let mut port = listening_port(PtpConfig::default());
    adopt_master(&mut port, secs(10));
    assert_eq!(port.state(), PortState::Uncalibrated);

    run_offset_exchange(&mut port, 10, 50, 1);
    assert_eq!(port.state(), PortState::Uncalibrated);
    run_offset_exchange(&mut port, 11, 40, 2);
    assert_eq!(port.state(), PortState::Uncalibrated);
    run_offset_exchange(&mut port, 12, 30, 3);
    assert_eq!(port.state(), PortState::Slave);
    assert!(port.statistics().sub_microsecond_samples >= 3);
}

#[test]
fn test_validation_failure_blocks_promotion() {
    let mut port = listening_port(PtpConfig::default());
    adopt_master(&mut port, secs(10));

    // Poison the window with a validation failure: an announce overflow
    // is the simplest way to bump the counter.
    let config_capacity = port.config().foreign_master_capacity;
    for n in 0..=config_capacity {
        let source = PortIdentity::new(ClockIdentity([0x60 + u8::try_from(n).unwrap(); 8]), 1);
        let _ = port.process_message(&announce_from(source, 250, 0), secs(10));
    }
    assert!(port.statistics().validations_failed > 0);

    run_offset_exchange(&mut port, 10, 50, 1);
    run_offset_exchange(&mut port, 11, 40, 2);
    run_offset_exchange(&mut port, 12, 30, 3);
    assert_eq!(port.state(), PortState::Uncalibrated);
}

#[test]
fn test_sync_from_non_parent_ignored() {
    let mut port = listening_port(PtpConfig::default());
    adopt_master(&mut port, secs(10));
    let stranger = PortIdentity::new(ClockIdentity([0x77; 8]), 1);
    port.process_message(&sync_from(stranger, 0, secs(10)), secs(10))
        .unwrap();
    port.process_message(&follow_up_from(stranger, 0, secs(10)), secs(10))
        .unwrap();
    assert_eq!(port.statistics().offsets_computed, 0);
}

#[test]
fn test_delay_resp_for_other_port_ignored() {
    let mut port = listening_port(PtpConfig::default());
    adopt_master(&mut port, secs(10));
    port.hal_mut().now = secs(10);
    port.tick(secs(10)); // sends Delay_Req

    let other = PortIdentity::new(ClockIdentity([0x78; 8]), 1);
    let resp = delay_resp_from(master_identity(), 0, secs(10), other);
    port.process_message(&resp, secs(10)).unwrap();
    assert_eq!(port.statistics().offsets_computed, 0);
}

#[test]
fn test_follow_up_sequence_mismatch_ignored() {
    let mut port = listening_port(PtpConfig::default());
    adopt_master(&mut port, secs(10));
    port.process_message(&sync_from(master_identity(), 5, secs(10)), secs(10))
        .unwrap();
    port.process_message(&follow_up_from(master_identity(), 6, secs(10)), secs(10))
        .unwrap();
    // Mismatched Follow_Up leaves the cycle incomplete.
    assert_eq!(port.statistics().offsets_computed, 0);
}

#[test]
fn test_sync_correction_field_applied() {
    let mut port = listening_port(PtpConfig::default());
    adopt_master(&mut port, secs(10));

    let base = 10_000_000_000u64;
    let t1 = Timestamp::from_nanos(base);
    let t2 = Timestamp::from_nanos(base + 150);
    let mut sync = sync_from(master_identity(), 1, t1);
    // 50 ns of residence time accumulated in transit.
    sync.header.correction_field = TimeInterval::from_nanos(50).to_scaled_ns();
    port.process_message(&sync, t2).unwrap();
    port.process_message(&follow_up_from(master_identity(), 1, t1), t2)
        .unwrap();

    port.hal_mut().now = Timestamp::from_nanos(base + 1000);
    port.tick(Timestamp::from_nanos(base + 1000));
    let t4 = Timestamp::from_nanos(base + 1100);
    let resp = delay_resp_from(
        master_identity(),
        super::last_delay_req_sequence(&port),
        t4,
        local_identity(),
    );
    port.process_message(&resp, t4).unwrap();

    // Without the correction the offset would read 25 ns; attributing
    // the 50 ns residence time to the path leaves the clocks aligned.
    assert_eq!(
        port.current_data_set().offset_from_master,
        TimeInterval::ZERO
    );
    assert_eq!(
        port.current_data_set().mean_path_delay,
        TimeInterval::from_nanos(100)
    );
}
