use crate::types::{ClockIdentity, ClockQuality, PortIdentity, TimeSource};

// ===== ClockIdentity =====

#[test]
fn test_clock_identity_from_mac() {
    let id = ClockIdentity::from_mac_address([0x00, 0x1B, 0x19, 0xAB, 0xCD, 0xEF]);
    assert_eq!(id.0, [0x00, 0x1B, 0x19, 0xFF, 0xFE, 0xAB, 0xCD, 0xEF]);
}

#[test]
fn test_clock_identity_ordering_is_lexicographic() {
    let a = ClockIdentity([0, 0, 0, 0, 0, 0, 0, 1]);
    let b = ClockIdentity([0, 0, 0, 0, 0, 0, 1, 0]);
    let c = ClockIdentity([1, 0, 0, 0, 0, 0, 0, 0]);
    assert!(a < b);
    assert!(b < c);
}

#[test]
fn test_clock_identity_decode_too_short() {
    assert!(ClockIdentity::decode(&[0u8; 7]).is_none());
}

#[test]
fn test_clock_identity_display() {
    let id = ClockIdentity([0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x11, 0x22, 0x33]);
    assert_eq!(format!("{id}"), "DE:AD:BE:EF:00:11:22:33");
}

// ===== PortIdentity =====

#[test]
fn test_port_identity_encode_decode_roundtrip() {
    let id = PortIdentity::new(ClockIdentity([1, 2, 3, 4, 5, 6, 7, 8]), 42);
    let decoded = PortIdentity::decode(&id.encode()).unwrap();
    assert_eq!(id, decoded);
}

#[test]
fn test_port_identity_known_bytes() {
    let id = PortIdentity::new(ClockIdentity([1, 2, 3, 4, 5, 6, 7, 8]), 0x0A0B);
    assert_eq!(id.encode(), [1, 2, 3, 4, 5, 6, 7, 8, 0x0A, 0x0B]);
}

#[test]
fn test_port_identity_decode_too_short() {
    assert!(PortIdentity::decode(&[0u8; 9]).is_none());
}

// ===== ClockQuality =====

#[test]
fn test_clock_quality_default_is_worst() {
    let q = ClockQuality::default();
    assert_eq!(q.clock_class, 248);
    assert_eq!(q.clock_accuracy, 0xFE);
    assert_eq!(q.offset_scaled_log_variance, 0xFFFF);
}

#[test]
fn test_clock_quality_roundtrip() {
    let q = ClockQuality {
        clock_class: 6,
        clock_accuracy: 0x20,
        offset_scaled_log_variance: 0x1234,
    };
    assert_eq!(ClockQuality::decode(&q.encode()).unwrap(), q);
}

// ===== TimeSource =====

#[test]
fn test_time_source_known_codes() {
    assert_eq!(TimeSource::from_wire(0x10), TimeSource::AtomicClock);
    assert_eq!(TimeSource::from_wire(0x20), TimeSource::Gps);
    assert_eq!(TimeSource::from_wire(0xA0), TimeSource::InternalOscillator);
    assert_eq!(TimeSource::Gps.to_wire(), 0x20);
}

#[test]
fn test_time_source_unknown_code_roundtrips() {
    let src = TimeSource::from_wire(0x77);
    assert_eq!(src, TimeSource::Unknown(0x77));
    assert_eq!(src.to_wire(), 0x77);
}
