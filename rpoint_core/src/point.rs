//! Restore points and their summary views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Unique identifier of a restore point.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestorePointId(Uuid);

impl RestorePointId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        RestorePointId(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        RestorePointId(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RestorePointId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RestorePointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for RestorePointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RestorePointId({})", self.0)
    }
}

/// Kind of a restore point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestorePointKind {
    /// Stores a complete file set.
    Full,
    /// Stores only files absent from its full anchor.
    Incremental,
}

impl RestorePointKind {
    /// Returns the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            RestorePointKind::Full => "full",
            RestorePointKind::Incremental => "incremental",
        }
    }
}

impl fmt::Display for RestorePointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Variant {
    Full { dependency_count: usize },
    Incremental { parent: Option<RestorePointId> },
}

/// A point-in-time snapshot of a file set.
///
/// Restore points are built by callers or a
/// [`CreationPolicy`](crate::CreationPolicy) and handed to
/// [`Backup::add_restore_point`](crate::Backup::add_restore_point), which
/// takes ownership. Once linked into a backup, the dependency bookkeeping
/// (`dependency_count`, `parent`) is maintained by the backup alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestorePoint {
    id: RestorePointId,
    created_at: DateTime<Utc>,
    size: u64,
    files: BTreeSet<PathBuf>,
    variant: Variant,
}

impl RestorePoint {
    /// Create a full restore point over the given files.
    pub fn full<I, P>(files: I, size: u64) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::build(files, size, Variant::Full { dependency_count: 0 })
    }

    /// Create an incremental restore point over the given files.
    ///
    /// The file set is reduced to the delta against its full anchor when
    /// the point is added to a backup.
    pub fn incremental<I, P>(files: I, size: u64) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::build(files, size, Variant::Incremental { parent: None })
    }

    fn build<I, P>(files: I, size: u64, variant: Variant) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            id: RestorePointId::new(),
            created_at: Utc::now(),
            size,
            files: files.into_iter().map(Into::into).collect(),
            variant,
        }
    }

    /// Override the creation timestamp.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Override the id.
    pub fn with_id(mut self, id: RestorePointId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> RestorePointId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn files(&self) -> &BTreeSet<PathBuf> {
        &self.files
    }

    /// Check whether the point captured the given file.
    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    pub fn kind(&self) -> RestorePointKind {
        match self.variant {
            Variant::Full { .. } => RestorePointKind::Full,
            Variant::Incremental { .. } => RestorePointKind::Incremental,
        }
    }

    pub fn is_full(&self) -> bool {
        self.kind() == RestorePointKind::Full
    }

    /// Number of incremental points anchored to this point.
    ///
    /// Always 0 for incremental points.
    pub fn dependency_count(&self) -> usize {
        match self.variant {
            Variant::Full { dependency_count } => dependency_count,
            Variant::Incremental { .. } => 0,
        }
    }

    /// The full point this incremental point is anchored to.
    ///
    /// `None` for full points and for incremental points not yet added to a
    /// backup.
    pub fn parent(&self) -> Option<RestorePointId> {
        match self.variant {
            Variant::Full { .. } => None,
            Variant::Incremental { parent } => parent,
        }
    }

    /// Whether the point can be deleted without breaking a dependency.
    pub fn is_removable(&self) -> bool {
        self.dependency_count() == 0
    }

    /// Forget any dependency bookkeeping carried over from another chain.
    pub(crate) fn reset_links(&mut self) {
        self.variant = match self.variant {
            Variant::Full { .. } => Variant::Full { dependency_count: 0 },
            Variant::Incremental { .. } => Variant::Incremental { parent: None },
        };
    }

    /// Reduce the file set to files absent from `anchor` and link to it.
    pub(crate) fn link_to(&mut self, anchor: &RestorePoint) {
        self.files.retain(|file| !anchor.files.contains(file));
        if let Variant::Incremental { parent } = &mut self.variant {
            *parent = Some(anchor.id);
        }
    }

    pub(crate) fn increment_dependency(&mut self) {
        if let Variant::Full { dependency_count } = &mut self.variant {
            *dependency_count += 1;
        }
    }

    pub(crate) fn decrement_dependency(&mut self) {
        if let Variant::Full { dependency_count } = &mut self.variant {
            *dependency_count = dependency_count.saturating_sub(1);
        }
    }
}

/// Immutable summary of a restore point, taken when it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestorePointInfo {
    pub id: RestorePointId,
    pub kind: RestorePointKind,
    pub size: u64,
    pub file_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&RestorePoint> for RestorePointInfo {
    fn from(point: &RestorePoint) -> Self {
        Self {
            id: point.id(),
            kind: point.kind(),
            size: point.size(),
            file_count: point.files().len(),
            created_at: point.created_at(),
        }
    }
}
