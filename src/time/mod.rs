//! Time representations: wire-format timestamps and signed intervals.
//!
//! IEEE 1588 carries 80-bit timestamps (48-bit seconds + 32-bit
//! nanoseconds) on the wire. Internally, all arithmetic happens on
//! [`TimeInterval`] — plain signed nanoseconds. The scaled-nanoseconds
//! ×2¹⁶ representation used by the header's correctionField exists only
//! at message boundaries; [`TimeInterval::to_scaled_ns`] and
//! [`TimeInterval::from_scaled_ns`] are the explicit crossing points.

mod interval;
mod timestamp;

#[cfg(test)]
mod tests;

pub use interval::TimeInterval;
pub use timestamp::Timestamp;
