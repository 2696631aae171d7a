use crate::engine::Heartbeat;
use crate::time::Timestamp;

#[test]
fn test_no_heartbeat_at_time_zero() {
    let mut hb = Heartbeat::new();
    assert!(!hb.poll(Timestamp::ZERO));
    assert_eq!(hb.emitted, 0);
}

#[test]
fn test_first_heartbeat_after_one_second() {
    let mut hb = Heartbeat::new();
    assert!(!hb.poll(Timestamp::ZERO));
    assert!(!hb.poll(Timestamp::from_millis(500)));
    assert!(hb.poll(Timestamp::from_secs(1)));
    assert_eq!(hb.emitted, 1);
}

#[test]
fn test_at_most_one_per_second() {
    let mut hb = Heartbeat::new();
    hb.poll(Timestamp::ZERO);
    assert!(hb.poll(Timestamp::from_secs(1)));
    assert!(!hb.poll(Timestamp::from_millis(1_200)));
    assert!(!hb.poll(Timestamp::from_millis(1_999)));
    assert!(hb.poll(Timestamp::from_secs(2)));
    assert_eq!(hb.emitted, 2);
}

#[test]
fn test_sparse_ticks_emit_on_arrival() {
    let mut hb = Heartbeat::new();
    hb.poll(Timestamp::ZERO);
    // A long gap still yields a single heartbeat.
    assert!(hb.poll(Timestamp::from_secs(10)));
    assert!(!hb.poll(Timestamp::from_millis(10_500)));
    assert!(hb.poll(Timestamp::from_secs(12)));
    assert_eq!(hb.emitted, 2);
}

#[test]
fn test_baseline_from_first_poll_not_construction() {
    let mut hb = Heartbeat::new();
    // First poll at t=5 establishes the baseline; emission begins at 6.
    assert!(!hb.poll(Timestamp::from_secs(5)));
    assert!(!hb.poll(Timestamp::from_millis(5_800)));
    assert!(hb.poll(Timestamp::from_secs(6)));
}
