//! Priority-vector construction and comparison.

use crate::messages::AnnounceBody;
use crate::types::{ClockIdentity, ClockQuality, PtpConfig};

/// The ordered tuple BMCA compares, one per candidate master.
///
/// Field order is the comparison order; the derived `Ord` therefore
/// implements the lexicographic comparison directly. Smaller is better
/// for every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PriorityVector {
    /// Grandmaster priority1.
    pub priority1: u8,
    /// Grandmaster clock class.
    pub clock_class: u8,
    /// Grandmaster clock accuracy.
    pub clock_accuracy: u8,
    /// Grandmaster offset scaled log variance.
    pub offset_scaled_log_variance: u16,
    /// Grandmaster priority2.
    pub priority2: u8,
    /// Grandmaster identity, compared byte-wise.
    pub grandmaster_identity: ClockIdentity,
    /// Steps removed from the grandmaster as adopted through this
    /// candidate (announce value + 1 for foreign masters, 0 for the
    /// local clock).
    pub steps_removed: u16,
}

impl PriorityVector {
    /// The local clock's own vector.
    #[must_use]
    pub fn local(config: &PtpConfig, identity: ClockIdentity, quality: ClockQuality) -> Self {
        Self {
            priority1: config.priority1,
            clock_class: quality.clock_class,
            clock_accuracy: quality.clock_accuracy,
            offset_scaled_log_variance: quality.offset_scaled_log_variance,
            priority2: config.priority2,
            grandmaster_identity: identity,
            steps_removed: 0,
        }
    }

    /// A foreign master's vector, as adopted through the port that
    /// received the Announce.
    #[must_use]
    pub fn from_announce(announce: &AnnounceBody) -> Self {
        Self {
            priority1: announce.grandmaster_priority1,
            clock_class: announce.grandmaster_clock_quality.clock_class,
            clock_accuracy: announce.grandmaster_clock_quality.clock_accuracy,
            offset_scaled_log_variance: announce
                .grandmaster_clock_quality
                .offset_scaled_log_variance,
            priority2: announce.grandmaster_priority2,
            grandmaster_identity: announce.grandmaster_identity,
            steps_removed: announce.steps_removed.saturating_add(1),
        }
    }

    /// Compare `self` against `other`.
    #[must_use]
    pub fn compare(&self, other: &Self) -> BmcaVerdict {
        match self.cmp(other) {
            std::cmp::Ordering::Less => BmcaVerdict::Better,
            std::cmp::Ordering::Greater => BmcaVerdict::Worse,
            std::cmp::Ordering::Equal => BmcaVerdict::Equal,
        }
    }
}

/// Outcome of comparing two priority vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmcaVerdict {
    /// The left-hand vector describes the better master.
    Better,
    /// The right-hand vector describes the better master.
    Worse,
    /// The vectors are identical: a tie.
    Equal,
}

/// Find the best candidate in a list where index 0 is the local clock
/// and the rest are foreign masters.
///
/// Returns `None` for an empty list. Ties keep the earlier index, so a
/// foreign master that exactly equals the local vector resolves to
/// index 0 here; the caller detects the tie separately via
/// [`PriorityVector::compare`] to recommend Passive.
#[must_use]
pub fn best_candidate(candidates: &[PriorityVector]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        match best {
            None => best = Some(index),
            Some(current) => {
                if candidate.compare(&candidates[current]) == BmcaVerdict::Better {
                    best = Some(index);
                }
            }
        }
    }
    best
}
