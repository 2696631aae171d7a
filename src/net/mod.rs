//! UDP/IPv4 transport adapter over tokio.
//!
//! The core engine is synchronous; this module is the async shell a
//! hosted platform can run it in. [`UdpPtpNode`] owns the standard PTP
//! sockets (event 319, general 320, or ephemeral ports for testing),
//! delivers received datagrams into an [`crate::clock::OrdinaryClock`]
//! serialized through its event loop, and drives `tick` from a timer.
//!
//! Available with the `tokio-runtime` feature (default).

mod node;


pub use node::{UdpHal, UdpPtpNode, UdpPtpNodeConfig};

use std::net::Ipv4Addr;

/// UDP port for event messages (Sync, `Delay_Req`).
pub const PTP_EVENT_PORT: u16 = 319;

/// UDP port for general messages (`Follow_Up`, `Delay_Resp`, Announce).
pub const PTP_GENERAL_PORT: u16 = 320;

/// Primary IPv4 multicast group for PTP over UDP.
pub const PTP_PRIMARY_MULTICAST: Ipv4Addr = Ipv4Addr::new(224, 0, 1, 129);
