//! Limits a backup can exceed.

use crate::backup::Backup;
use chrono::{TimeDelta, Utc};
use std::fmt;

/// A budget a backup can be over.
pub trait Limit: fmt::Debug + Send {
    /// Whether the backup currently exceeds this limit.
    fn is_exceeded(&self, backup: &Backup) -> bool;
}

impl Limit for Box<dyn Limit> {
    fn is_exceeded(&self, backup: &Backup) -> bool {
        (**self).is_exceeded(backup)
    }
}

/// At most `max_points` live restore points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountLimit {
    max_points: usize,
}

impl CountLimit {
    pub fn new(max_points: usize) -> Self {
        Self { max_points }
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }
}

impl Limit for CountLimit {
    fn is_exceeded(&self, backup: &Backup) -> bool {
        backup.len() > self.max_points
    }
}

/// At most `max_size` bytes across all live restore points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimit {
    max_size: u64,
}

impl SizeLimit {
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }
}

impl Limit for SizeLimit {
    fn is_exceeded(&self, backup: &Backup) -> bool {
        backup.total_size() > self.max_size
    }
}

/// No live restore point older than `max_age`.
///
/// Age is measured against the wall clock at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeLimit {
    max_age: TimeDelta,
}

impl AgeLimit {
    pub fn new(max_age: TimeDelta) -> Self {
        Self { max_age }
    }

    pub fn max_age(&self) -> TimeDelta {
        self.max_age
    }
}

impl Limit for AgeLimit {
    fn is_exceeded(&self, backup: &Backup) -> bool {
        let Some(cutoff) = Utc::now().checked_sub_signed(self.max_age) else {
            return false;
        };
        backup
            .points()
            .iter()
            .any(|point| point.created_at() < cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::RestorePoint;
    use std::fs;
    use tempfile::TempDir;

    fn backup_with_points(points: Vec<RestorePoint>) -> (TempDir, Backup) {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), b"a").unwrap();
        let mut backup = Backup::open(temp_dir.path()).unwrap();
        for point in points {
            backup.add_restore_point(point).unwrap();
        }
        (temp_dir, backup)
    }

    #[test]
    fn test_count_limit() {
        let (_dir, backup) = backup_with_points(vec![
            RestorePoint::full(["a.txt"], 1),
            RestorePoint::full(["a.txt"], 1),
        ]);
        assert!(!CountLimit::new(2).is_exceeded(&backup));
        assert!(CountLimit::new(1).is_exceeded(&backup));
    }

    #[test]
    fn test_size_limit() {
        let (_dir, backup) = backup_with_points(vec![
            RestorePoint::full(["a.txt"], 40),
            RestorePoint::incremental(["b.txt"], 10),
        ]);
        assert!(!SizeLimit::new(50).is_exceeded(&backup));
        assert!(SizeLimit::new(49).is_exceeded(&backup));
    }

    #[test]
    fn test_age_limit() {
        let old = Utc::now() - TimeDelta::days(10);
        let (_dir, backup) = backup_with_points(vec![
            RestorePoint::full(["a.txt"], 1).with_created_at(old),
            RestorePoint::full(["a.txt"], 1),
        ]);
        assert!(AgeLimit::new(TimeDelta::days(1)).is_exceeded(&backup));
        assert!(!AgeLimit::new(TimeDelta::days(30)).is_exceeded(&backup));
    }

    #[test]
    fn test_age_limit_unbounded() {
        let (_dir, backup) = backup_with_points(vec![RestorePoint::full(["a.txt"], 1)]);
        assert!(!AgeLimit::new(TimeDelta::MAX).is_exceeded(&backup));
    }

    #[test]
    fn test_limits_on_empty_backup() {
        let (_dir, backup) = backup_with_points(Vec::new());
        assert!(!CountLimit::new(0).is_exceeded(&backup));
        assert!(!SizeLimit::new(0).is_exceeded(&backup));
        assert!(!AgeLimit::new(TimeDelta::zero()).is_exceeded(&backup));
    }

    #[test]
    fn test_boxed_limit_delegates() {
        let (_dir, backup) = backup_with_points(vec![RestorePoint::full(["a.txt"], 1)]);
        let limit: Box<dyn Limit> = Box::new(CountLimit::new(0));
        assert!(limit.is_exceeded(&backup));
    }
}
