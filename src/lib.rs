//! # ptpsync
//!
//! A hardware-agnostic IEEE 1588-2019 Precision Time Protocol engine:
//! the port state machine, the Best Master Clock Algorithm, and
//! offset/delay measurement driving a PI servo, wired together by
//! synchronous coordinators.
//!
//! The engine is single-threaded and runtime-free. It is driven from
//! two entry points — `process_message` for received buffers tagged
//! with a receive timestamp, and `tick(now)` for timeouts and periodic
//! transmission — and reaches the platform only through the
//! [`hal::PortHal`] capability trait injected at construction.
//!
//! ## Example
//!
//! ```rust
//! use ptpsync::clock::OrdinaryClock;
//! use ptpsync::testing::RecordingHal;
//! use ptpsync::time::Timestamp;
//! use ptpsync::types::{ClockIdentity, ClockQuality, PtpConfig};
//!
//! let identity = ClockIdentity::from_mac_address([0x00, 0x1B, 0x19, 0x00, 0x00, 0x01]);
//! let mut clock = OrdinaryClock::new(
//!     identity,
//!     ClockQuality::default(),
//!     PtpConfig::default(),
//!     RecordingHal::new(),
//! );
//! clock.start(Timestamp::ZERO);
//! // feed clock.process_message(..) and clock.tick(..) from the platform
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
/// Error types
pub mod error;
/// Hardware abstraction
pub mod hal;
/// Core types
pub mod types;

pub mod bmca;
pub mod clock;
pub mod engine;
pub mod fault;
pub mod messages;
pub mod metrics;
pub mod port;
pub mod servo;
/// Test-support HAL implementations
pub mod testing;
pub mod time;

#[cfg(feature = "tokio-runtime")]
pub mod net;

// Re-exports
pub use clock::{BoundaryClock, Clock, OrdinaryClock, TransparentClock};
pub use error::{DecodeError, EncodeError, PtpError};
pub use hal::{AdjustMode, PortHal};
pub use port::{Port, PortEvent, PortState};
pub use time::{TimeInterval, Timestamp};
pub use types::{ClockIdentity, ClockQuality, PortIdentity, Profile, PtpConfig};
