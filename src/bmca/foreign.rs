//! Bounded table of observed foreign masters.

use tracing::warn;

use crate::messages::AnnounceBody;
use crate::time::{TimeInterval, Timestamp};
use crate::types::PortIdentity;

/// One observed foreign master: the latest Announce and when it arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignMasterEntry {
    /// Port the Announce was sent from (the table key).
    pub source_port_identity: PortIdentity,
    /// The most recent Announce body from this master.
    pub last_announce: AnnounceBody,
    /// Receive timestamp of that Announce.
    pub last_seen: Timestamp,
}

/// Fixed-capacity set of foreign masters, keyed by sending port.
///
/// Backing storage is sized once at construction; `upsert` on a full
/// table is an error, never a silent drop.
#[derive(Debug, Clone)]
pub struct ForeignMasterTable {
    entries: Vec<ForeignMasterEntry>,
    capacity: usize,
}

/// The table is full; the announce was not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFull;

impl ForeignMasterTable {
    /// Create a table holding at most `capacity` masters.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert or refresh the entry for `source`.
    ///
    /// # Errors
    /// Returns [`TableFull`] when `source` is new and the table is at
    /// capacity.
    pub fn upsert(
        &mut self,
        source: PortIdentity,
        announce: AnnounceBody,
        now: Timestamp,
    ) -> Result<(), TableFull> {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.source_port_identity == source)
        {
            entry.last_announce = announce;
            entry.last_seen = now;
            return Ok(());
        }
        if self.entries.len() >= self.capacity {
            warn!(
                %source,
                capacity = self.capacity,
                "foreign-master table full, rejecting new master"
            );
            return Err(TableFull);
        }
        self.entries.push(ForeignMasterEntry {
            source_port_identity: source,
            last_announce: announce,
            last_seen: now,
        });
        Ok(())
    }

    /// Drop entries not refreshed within `staleness` before `now`.
    pub fn prune(&mut self, now: Timestamp, staleness: TimeInterval) {
        self.entries.retain(|e| (now - e.last_seen) <= staleness);
    }

    /// Remove every entry. Used when the current master times out.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Current number of observed masters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no masters are currently observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate the current entries for BMCA list construction.
    pub fn iter(&self) -> impl Iterator<Item = &ForeignMasterEntry> {
        self.entries.iter()
    }

    /// Look up the entry for a specific sending port.
    #[must_use]
    pub fn get(&self, source: &PortIdentity) -> Option<&ForeignMasterEntry> {
        self.entries
            .iter()
            .find(|e| e.source_port_identity == *source)
    }
}
