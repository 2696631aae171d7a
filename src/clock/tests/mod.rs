mod ordinary;

use crate::messages::{AnnounceBody, Message};
use crate::time::Timestamp;
use crate::types::{ClockIdentity, ClockQuality, PortIdentity, TimeSource};

/// Encode a message into owned bytes.
pub(crate) fn encode(message: &Message) -> Vec<u8> {
    let mut buf = [0u8; Message::MAX_FIXED_SIZE];
    let len = message.encode(&mut buf).unwrap();
    buf[..len].to_vec()
}

/// An encoded Announce from `source` with the given priority1.
pub(crate) fn announce_bytes(source: PortIdentity, priority1: u8, sequence: u16) -> Vec<u8> {
    let body = AnnounceBody {
        origin_timestamp: Timestamp::ZERO,
        current_utc_offset: 37,
        grandmaster_priority1: priority1,
        grandmaster_clock_quality: ClockQuality {
            clock_class: 6,
            clock_accuracy: 0x20,
            offset_scaled_log_variance: 0x4E5D,
        },
        grandmaster_priority2: 128,
        grandmaster_identity: source.clock_identity,
        steps_removed: 0,
        time_source: TimeSource::Gps,
    };
    encode(&Message::announce(source, sequence, body))
}

pub(crate) fn gm_identity() -> PortIdentity {
    PortIdentity::new(ClockIdentity([0xA0; 8]), 1)
}

pub(crate) fn local_clock_identity() -> ClockIdentity {
    ClockIdentity([0x01; 8])
}
