//! Property tests for the wire codec: encode/decode round-trips and
//! decoder robustness against arbitrary input.

use proptest::prelude::*;

use ptpsync::messages::{AnnounceBody, Header, Message, MessageBody, MessageType};
use ptpsync::time::Timestamp;
use ptpsync::types::{ClockIdentity, ClockQuality, PortIdentity, TimeSource};

fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
    (0u64..(1u64 << 48), 0u32..1_000_000_000).prop_map(|(seconds, nanoseconds)| Timestamp {
        seconds,
        nanoseconds,
    })
}

fn arb_port_identity() -> impl Strategy<Value = PortIdentity> {
    (any::<[u8; 8]>(), any::<u16>())
        .prop_map(|(id, port)| PortIdentity::new(ClockIdentity(id), port))
}

fn arb_clock_quality() -> impl Strategy<Value = ClockQuality> {
    (any::<u8>(), any::<u8>(), any::<u16>()).prop_map(|(class, accuracy, variance)| {
        ClockQuality {
            clock_class: class,
            clock_accuracy: accuracy,
            offset_scaled_log_variance: variance,
        }
    })
}

fn arb_body() -> impl Strategy<Value = (MessageType, MessageBody)> {
    prop_oneof![
        arb_timestamp().prop_map(|ts| (
            MessageType::Sync,
            MessageBody::Sync {
                origin_timestamp: ts
            }
        )),
        arb_timestamp().prop_map(|ts| (
            MessageType::DelayReq,
            MessageBody::DelayReq {
                origin_timestamp: ts
            }
        )),
        arb_timestamp().prop_map(|ts| (
            MessageType::FollowUp,
            MessageBody::FollowUp {
                precise_origin_timestamp: ts
            }
        )),
        (arb_timestamp(), arb_port_identity()).prop_map(|(ts, id)| (
            MessageType::DelayResp,
            MessageBody::DelayResp {
                receive_timestamp: ts,
                requesting_port_identity: id,
            }
        )),
        (arb_timestamp(), arb_port_identity()).prop_map(|(ts, id)| (
            MessageType::PdelayResp,
            MessageBody::PdelayResp {
                request_receipt_timestamp: ts,
                requesting_port_identity: id,
            }
        )),
        (
            arb_timestamp(),
            any::<i16>(),
            any::<u8>(),
            arb_clock_quality(),
            any::<u8>(),
            any::<[u8; 8]>(),
            any::<u16>(),
            any::<u8>()
        )
            .prop_map(
                |(ts, utc, p1, quality, p2, gm, steps, time_source)| (
                    MessageType::Announce,
                    MessageBody::Announce(AnnounceBody {
                        origin_timestamp: ts,
                        current_utc_offset: utc,
                        grandmaster_priority1: p1,
                        grandmaster_clock_quality: quality,
                        grandmaster_priority2: p2,
                        grandmaster_identity: ClockIdentity(gm),
                        steps_removed: steps,
                        time_source: TimeSource::from_wire(time_source),
                    })
                )
            ),
    ]
}

fn arb_message() -> impl Strategy<Value = Message> {
    (
        arb_body(),
        arb_port_identity(),
        any::<u16>(),
        any::<i64>(),
        any::<u8>(),
        0u8..16,
        any::<i8>(),
    )
        .prop_map(
            |((message_type, body), source, sequence, correction, domain, transport, log_interval)| {
                let mut header = Header::new(message_type, source, sequence);
                header.correction_field = correction;
                header.domain_number = domain;
                header.transport_specific = transport;
                header.log_message_interval = log_interval;
                Message { header, body }
            },
        )
}

proptest! {
    /// decode(encode(m)) reproduces every field of m, and encode
    /// writes exactly the declared messageLength.
    #[test]
    fn roundtrip_preserves_message(message in arb_message()) {
        let mut buf = [0u8; 128];
        let len = message.encode(&mut buf).expect("encode failed");
        prop_assert_eq!(len, message.encoded_length());

        let declared = u16::from_be_bytes([buf[2], buf[3]]);
        prop_assert_eq!(usize::from(declared), len);

        let decoded = Message::decode(&buf[..len]).expect("decode failed");
        prop_assert_eq!(decoded.body, message.body);
        prop_assert_eq!(decoded.header.message_type, message.header.message_type);
        prop_assert_eq!(decoded.header.sequence_id, message.header.sequence_id);
        prop_assert_eq!(decoded.header.correction_field, message.header.correction_field);
        prop_assert_eq!(decoded.header.domain_number, message.header.domain_number);
        prop_assert_eq!(decoded.header.source_port_identity, message.header.source_port_identity);
        prop_assert_eq!(decoded.header.transport_specific, message.header.transport_specific);
        prop_assert_eq!(decoded.header.log_message_interval, message.header.log_message_interval);
    }

    /// The decoder never panics, whatever the bytes.
    #[test]
    fn decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..200)) {
        let _ = Message::decode(&data);
    }

    /// Truncating a valid encoding never panics and never produces a
    /// phantom success past the header length check.
    #[test]
    fn truncations_never_panic(message in arb_message(), cut in 0usize..64) {
        let mut buf = [0u8; 128];
        let len = message.encode(&mut buf).expect("encode failed");
        let cut = cut.min(len);
        let _ = Message::decode(&buf[..cut]);
    }
}
