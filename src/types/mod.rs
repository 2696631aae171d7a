//! Core types: identities, clock quality, configuration, and data sets.

mod common;
mod config;
mod datasets;

#[cfg(test)]
mod tests;

pub use common::{ClockIdentity, ClockQuality, PortIdentity, TimeSource};
pub use config::{
    DelayMechanism, Profile, PtpConfig, PtpConfigBuilder, ServoConfig, SyncMonitorConfig,
};
pub use datasets::{CurrentDataSet, ParentDataSet, PortDataSet};
