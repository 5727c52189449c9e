//! Cleaning policies.

use crate::backup::Backup;
use crate::error::Result;
use crate::point::RestorePointId;
use crate::policy::limit::{AgeLimit, CountLimit, Limit, SizeLimit};
use chrono::TimeDelta;
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Outcome of one eviction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    /// Evicted restore points, oldest first.
    pub evicted: Vec<RestorePointId>,
    /// The limit was still exceeded when no removable point was left.
    pub over_limit: bool,
}

impl CleaningReport {
    /// Fold a later pass into this report.
    pub fn merge(&mut self, other: CleaningReport) {
        self.evicted.extend(other.evicted);
        self.over_limit = other.over_limit;
    }
}

/// Evicts restore points from a backup to keep it within a limit.
///
/// Implementations must not delete full points that still have dependents;
/// when only such points remain they stop and report `over_limit` instead of
/// failing.
pub trait CleaningPolicy: fmt::Debug + Send {
    /// Run one eviction pass.
    fn clean(&self, backup: &mut Backup) -> Result<CleaningReport>;
}

/// Evicts the oldest removable restore point while a limit is exceeded.
///
/// Points are considered in chain order. Full points with dependents are
/// skipped; evicting their incremental children makes them removable on a
/// later iteration.
#[derive(Debug)]
pub struct LimitCleaning {
    limit: Box<dyn Limit>,
}

impl LimitCleaning {
    pub fn new<L: Limit + 'static>(limit: L) -> Self {
        Self::from_boxed(Box::new(limit))
    }

    pub fn from_boxed(limit: Box<dyn Limit>) -> Self {
        Self { limit }
    }

    /// Keep at most `max_points` restore points.
    pub fn max_points(max_points: usize) -> Self {
        Self::new(CountLimit::new(max_points))
    }

    /// Keep at most `max_size` bytes of restore points.
    pub fn max_size(max_size: u64) -> Self {
        Self::new(SizeLimit::new(max_size))
    }

    /// Keep no restore point older than `max_age`.
    pub fn max_age(max_age: TimeDelta) -> Self {
        Self::new(AgeLimit::new(max_age))
    }
}

impl CleaningPolicy for LimitCleaning {
    fn clean(&self, backup: &mut Backup) -> Result<CleaningReport> {
        evict_while(backup, |backup| self.limit.is_exceeded(backup))
    }
}

/// Delete the oldest removable point until `exceeded` turns false.
pub(crate) fn evict_while(
    backup: &mut Backup,
    mut exceeded: impl FnMut(&Backup) -> bool,
) -> Result<CleaningReport> {
    let mut report = CleaningReport::default();

    while exceeded(backup) {
        let Some(victim) = backup.oldest_removable() else {
            report.over_limit = true;
            break;
        };

        let point = backup.delete_restore_point(victim)?;
        info!(
            backup = %backup.id(),
            point = %victim,
            kind = %point.kind(),
            size = point.size(),
            "evicted restore point"
        );
        report.evicted.push(victim);
    }

    Ok(report)
}
