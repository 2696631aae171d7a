//! Identity and clock-quality types shared across the engine.

/// An 8-byte clock identity, ordered lexicographically.
///
/// Typically derived from a MAC address (EUI-48 mapped into EUI-64).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ClockIdentity(pub [u8; 8]);

impl ClockIdentity {
    /// Wire size in bytes.
    pub const WIRE_SIZE: usize = 8;

    /// Build an EUI-64 identity from a MAC address by inserting `FF:FE`
    /// in the middle, the conventional IEEE 1588 mapping.
    #[must_use]
    pub const fn from_mac_address(mac: [u8; 6]) -> Self {
        Self([mac[0], mac[1], mac[2], 0xFF, 0xFE, mac[3], mac[4], mac[5]])
    }

    /// Decode from 8 bytes.
    #[must_use]
    pub fn decode(data: &[u8]) -> Option<Self> {
        let bytes: [u8; 8] = data.get(0..8)?.try_into().ok()?;
        Some(Self(bytes))
    }
}

impl std::fmt::Display for ClockIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// PTP port identity: clock identity + 16-bit port number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PortIdentity {
    /// Identity of the owning clock.
    pub clock_identity: ClockIdentity,
    /// Port number (1-based).
    pub port_number: u16,
}

impl PortIdentity {
    /// Wire size in bytes.
    pub const WIRE_SIZE: usize = 10;

    /// Create a new port identity.
    #[must_use]
    pub const fn new(clock_identity: ClockIdentity, port_number: u16) -> Self {
        Self {
            clock_identity,
            port_number,
        }
    }

    /// Encode as 10 bytes (8-byte clock identity + 2-byte port number, BE).
    #[must_use]
    pub fn encode(&self) -> [u8; Self::WIRE_SIZE] {
        let mut buf = [0u8; Self::WIRE_SIZE];
        buf[0..8].copy_from_slice(&self.clock_identity.0);
        buf[8..10].copy_from_slice(&self.port_number.to_be_bytes());
        buf
    }

    /// Decode from 10 bytes.
    #[must_use]
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < Self::WIRE_SIZE {
            return None;
        }
        Some(Self {
            clock_identity: ClockIdentity::decode(&data[0..8])?,
            port_number: u16::from_be_bytes([data[8], data[9]]),
        })
    }
}

impl std::fmt::Display for PortIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.clock_identity, self.port_number)
    }
}

/// Clock quality triple carried in Announce messages.
///
/// Smaller clock class and accuracy codes mean better clocks; variance
/// is compared numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockQuality {
    /// Traceability class (6 = primary reference, 248 = default).
    pub clock_class: u8,
    /// Accuracy code (0x20 = 25 ns ... 0xFE = unknown).
    pub clock_accuracy: u8,
    /// Offset scaled log variance (0xFFFF = not computed).
    pub offset_scaled_log_variance: u16,
}

impl ClockQuality {
    /// Wire size in bytes.
    pub const WIRE_SIZE: usize = 4;

    /// Encode as 4 bytes.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::WIRE_SIZE] {
        let mut buf = [0u8; Self::WIRE_SIZE];
        buf[0] = self.clock_class;
        buf[1] = self.clock_accuracy;
        buf[2..4].copy_from_slice(&self.offset_scaled_log_variance.to_be_bytes());
        buf
    }

    /// Decode from 4 bytes.
    #[must_use]
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < Self::WIRE_SIZE {
            return None;
        }
        Some(Self {
            clock_class: data[0],
            clock_accuracy: data[1],
            offset_scaled_log_variance: u16::from_be_bytes([data[2], data[3]]),
        })
    }
}

impl Default for ClockQuality {
    fn default() -> Self {
        Self {
            clock_class: 248,
            clock_accuracy: 0xFE,
            offset_scaled_log_variance: 0xFFFF,
        }
    }
}

/// Source feeding the grandmaster's time (IEEE 1588 Table 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeSource {
    /// Calibrated atomic clock.
    AtomicClock,
    /// GPS or equivalent satellite system.
    Gps,
    /// Terrestrial radio time distribution.
    TerrestrialRadio,
    /// Another PTP domain.
    Ptp,
    /// NTP or SNTP.
    Ntp,
    /// Manually set.
    HandSet,
    /// Any other source.
    Other,
    /// Free-running oscillator.
    #[default]
    InternalOscillator,
    /// A code this engine does not recognize, preserved for round-trip.
    Unknown(u8),
}

impl TimeSource {
    /// The wire code for this source.
    #[must_use]
    pub const fn to_wire(self) -> u8 {
        match self {
            Self::AtomicClock => 0x10,
            Self::Gps => 0x20,
            Self::TerrestrialRadio => 0x30,
            Self::Ptp => 0x40,
            Self::Ntp => 0x50,
            Self::HandSet => 0x60,
            Self::Other => 0x90,
            Self::InternalOscillator => 0xA0,
            Self::Unknown(code) => code,
        }
    }

    /// Parse a wire code, preserving unrecognized values.
    #[must_use]
    pub const fn from_wire(code: u8) -> Self {
        match code {
            0x10 => Self::AtomicClock,
            0x20 => Self::Gps,
            0x30 => Self::TerrestrialRadio,
            0x40 => Self::Ptp,
            0x50 => Self::Ntp,
            0x60 => Self::HandSet,
            0x90 => Self::Other,
            0xA0 => Self::InternalOscillator,
            other => Self::Unknown(other),
        }
    }
}
