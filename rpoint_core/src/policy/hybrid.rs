//! Hybrid policies: creation and eviction under one joint limit.

use crate::backup::Backup;
use crate::error::{Error, Result};
use crate::point::RestorePoint;
use crate::policy::cleaning::{CleaningReport, evict_while};
use crate::policy::limit::Limit;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Governs creation and eviction together.
///
/// Runs after the cleaning policy on every added restore point, so it sees
/// the already-cleaned chain. It may add and delete points freely; points it
/// adds go through the cleaning policy but do not re-run the hybrid policy.
pub trait HybridPolicy: fmt::Debug + Send {
    fn apply(&self, backup: &mut Backup) -> Result<CleaningReport>;
}

/// How [`CombinedLimits`] joins its limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HybridMode {
    /// Evict while any limit is exceeded.
    #[default]
    Any,
    /// Evict while every limit is exceeded.
    All,
}

impl HybridMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HybridMode::Any => "any",
            HybridMode::All => "all",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "any" => Ok(HybridMode::Any),
            "all" => Ok(HybridMode::All),
            _ => Err(Error::invalid_config(format!(
                "Unknown hybrid mode: {} (expected any or all)",
                s
            ))),
        }
    }
}

/// Several limits joined with [`HybridMode`].
///
/// With no limits configured it is never exceeded.
#[derive(Debug, Default)]
pub struct CombinedLimits {
    mode: HybridMode,
    limits: Vec<Box<dyn Limit>>,
}

impl CombinedLimits {
    pub fn new(mode: HybridMode) -> Self {
        Self {
            mode,
            limits: Vec::new(),
        }
    }

    /// Add a limit.
    pub fn with_limit<L: Limit + 'static>(self, limit: L) -> Self {
        self.with_boxed(Box::new(limit))
    }

    pub fn with_boxed(mut self, limit: Box<dyn Limit>) -> Self {
        self.limits.push(limit);
        self
    }

    pub fn mode(&self) -> HybridMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }
}

impl Limit for CombinedLimits {
    fn is_exceeded(&self, backup: &Backup) -> bool {
        if self.limits.is_empty() {
            return false;
        }
        match self.mode {
            HybridMode::Any => self.limits.iter().any(|limit| limit.is_exceeded(backup)),
            HybridMode::All => self.limits.iter().all(|limit| limit.is_exceeded(backup)),
        }
    }
}

impl HybridPolicy for CombinedLimits {
    fn apply(&self, backup: &mut Backup) -> Result<CleaningReport> {
        evict_while(backup, |backup| self.is_exceeded(backup))
    }
}

/// Starts a new full point once incrementals pile up.
///
/// When the incremental points anchored to the newest full point together
/// exceed `threshold` bytes, a full point is built with the backup's
/// creation policy and every older point is evicted, incrementals first,
/// then the full points they released. Without a creation policy nothing
/// happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebaseOnThreshold {
    threshold: u64,
}

impl RebaseOnThreshold {
    pub fn new(threshold: u64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Total size of the incremental points anchored to the newest full point.
    ///
    /// Saturates at `u64::MAX`.
    pub fn pending_size(backup: &Backup) -> u64 {
        let Some(anchor) = backup.nearest_full().map(RestorePoint::id) else {
            return 0;
        };
        backup
            .points()
            .iter()
            .filter(|point| point.parent() == Some(anchor))
            .fold(0u64, |total, point| total.saturating_add(point.size()))
    }
}

impl HybridPolicy for RebaseOnThreshold {
    fn apply(&self, backup: &mut Backup) -> Result<CleaningReport> {
        let mut report = CleaningReport::default();

        let pending = Self::pending_size(backup);
        if pending <= self.threshold {
            return Ok(report);
        }

        let Some(rebased) = backup.create_full_point()? else {
            warn!(
                backup = %backup.id(),
                pending,
                threshold = self.threshold,
                "incremental threshold exceeded but no creation policy is set"
            );
            return Ok(report);
        };
        info!(backup = %backup.id(), point = %rebased, pending, "forced full restore point");

        loop {
            // The cleaning policy may already have evicted the new point
            let Some(boundary) = backup.points().iter().position(|p| p.id() == rebased) else {
                break;
            };

            let victim = backup.points()[..boundary]
                .iter()
                .find(|point| point.is_removable())
                .map(RestorePoint::id);

            let Some(victim) = victim else {
                report.over_limit = boundary > 0;
                break;
            };

            backup.delete_restore_point(victim)?;
            info!(backup = %backup.id(), point = %victim, "evicted restore point before rebase");
            report.evicted.push(victim);
        }

        Ok(report)
    }
}
