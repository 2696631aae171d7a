//! PTP timestamp representation and wire conversion.

use super::interval::TimeInterval;

/// IEEE 1588 PTP timestamp: 48-bit seconds + 32-bit nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    /// Seconds since the PTP epoch.
    pub seconds: u64,
    /// Nanoseconds within the current second (`0..999_999_999`).
    pub nanoseconds: u32,
}

impl Timestamp {
    /// Nanoseconds in one second.
    pub const NANOS_PER_SEC: u32 = 1_000_000_000;

    /// Maximum seconds representable in 48 bits.
    pub const MAX_SECONDS_48BIT: u64 = (1u64 << 48) - 1;

    /// Wire size: 6-byte seconds + 4-byte nanoseconds.
    pub const WIRE_SIZE: usize = 10;

    /// Zero timestamp.
    pub const ZERO: Self = Self {
        seconds: 0,
        nanoseconds: 0,
    };

    /// Create a new timestamp, normalizing nanoseconds ≥ 1 s into seconds.
    #[must_use]
    pub fn new(seconds: u64, nanoseconds: u32) -> Self {
        Self {
            seconds: seconds + u64::from(nanoseconds / Self::NANOS_PER_SEC),
            nanoseconds: nanoseconds % Self::NANOS_PER_SEC,
        }
    }

    /// Create a timestamp from whole seconds.
    #[must_use]
    pub const fn from_secs(seconds: u64) -> Self {
        Self {
            seconds,
            nanoseconds: 0,
        }
    }

    /// Create a timestamp from milliseconds since the epoch.
    #[must_use]
    pub fn from_millis(millis: u64) -> Self {
        Self {
            seconds: millis / 1_000,
            nanoseconds: u32::try_from(millis % 1_000).unwrap_or(0) * 1_000_000,
        }
    }

    /// Create a timestamp from microseconds since the epoch.
    #[must_use]
    pub fn from_micros(micros: u64) -> Self {
        Self {
            seconds: micros / 1_000_000,
            nanoseconds: u32::try_from(micros % 1_000_000).unwrap_or(0) * 1_000,
        }
    }

    /// Create a timestamp from nanoseconds since the epoch.
    #[must_use]
    pub fn from_nanos(nanos: u64) -> Self {
        Self {
            seconds: nanos / u64::from(Self::NANOS_PER_SEC),
            nanoseconds: u32::try_from(nanos % u64::from(Self::NANOS_PER_SEC)).unwrap_or(0),
        }
    }

    /// Total nanoseconds since the epoch.
    #[must_use]
    pub fn to_nanos(&self) -> i128 {
        i128::from(self.seconds) * i128::from(Self::NANOS_PER_SEC) + i128::from(self.nanoseconds)
    }

    /// Signed difference `self - other` as a [`TimeInterval`].
    ///
    /// Saturates at the interval's i64 range (±~292 years), which no real
    /// pair of in-protocol timestamps approaches.
    #[must_use]
    pub fn diff(&self, other: &Self) -> TimeInterval {
        let d = self.to_nanos() - other.to_nanos();
        TimeInterval::from_nanos(i64::try_from(d).unwrap_or(if d < 0 {
            i64::MIN
        } else {
            i64::MAX
        }))
    }

    /// Add a signed interval, flooring at zero (PTP timestamps are unsigned).
    #[must_use]
    pub fn offset_by(&self, interval: TimeInterval) -> Self {
        let nanos = self.to_nanos() + i128::from(interval.nanos());
        if nanos <= 0 {
            return Self::ZERO;
        }
        let seconds = u64::try_from(nanos / i128::from(Self::NANOS_PER_SEC)).unwrap_or(u64::MAX);
        let nanoseconds =
            u32::try_from(nanos % i128::from(Self::NANOS_PER_SEC)).unwrap_or(0);
        Self {
            seconds,
            nanoseconds,
        }
    }

    /// Encode as IEEE 1588 wire format: 6-byte seconds (BE) + 4-byte nanoseconds (BE).
    #[must_use]
    pub fn encode(&self) -> [u8; Self::WIRE_SIZE] {
        let mut buf = [0u8; Self::WIRE_SIZE];
        let sec_bytes = (self.seconds & Self::MAX_SECONDS_48BIT).to_be_bytes();
        // 48-bit seconds: lower 6 bytes of the 8-byte u64
        buf[0..6].copy_from_slice(&sec_bytes[2..8]);
        buf[6..10].copy_from_slice(&self.nanoseconds.to_be_bytes());
        buf
    }

    /// Decode from IEEE 1588 wire format.
    ///
    /// Returns `None` if the slice is shorter than [`Self::WIRE_SIZE`].
    #[must_use]
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < Self::WIRE_SIZE {
            return None;
        }
        let seconds =
            u64::from_be_bytes([0, 0, data[0], data[1], data[2], data[3], data[4], data[5]]);
        let nanoseconds = u32::from_be_bytes([data[6], data[7], data[8], data[9]]);
        Some(Self {
            seconds,
            nanoseconds,
        })
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanoseconds)
    }
}

impl std::ops::Sub for Timestamp {
    type Output = TimeInterval;

    fn sub(self, rhs: Self) -> Self::Output {
        self.diff(&rhs)
    }
}

impl std::ops::Add<TimeInterval> for Timestamp {
    type Output = Self;

    fn add(self, rhs: TimeInterval) -> Self::Output {
        self.offset_by(rhs)
    }
}
