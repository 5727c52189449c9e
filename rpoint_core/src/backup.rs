//! The backup aggregate: restore point chain, tracked files and policies.

use crate::error::{Error, Result};
use crate::point::{RestorePoint, RestorePointId, RestorePointInfo, RestorePointKind};
use crate::policy::{CleaningPolicy, CleaningReport, CreationPolicy, HybridPolicy};
use crate::walk;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// A chain of restore points over a tracked file set.
///
/// Incremental points are anchored to the nearest preceding full point, so
/// the dependency graph is a set of stars: every incremental point has
/// exactly one full parent and no incremental point depends on another.
///
/// All operations are synchronous. A `Backup` is `Send`; share it between
/// threads behind a single lock so that chain, file set, size counter and
/// dependency counters are always observed together.
#[derive(Debug)]
pub struct Backup {
    id: Uuid,
    source: PathBuf,
    files: BTreeSet<PathBuf>,
    points: Vec<RestorePoint>,
    infos: Vec<RestorePointInfo>,
    total_size: u64,
    creation: Option<Box<dyn CreationPolicy>>,
    cleaning: Option<Box<dyn CleaningPolicy>>,
    hybrid: Option<Box<dyn HybridPolicy>>,
    last_cleaning: Option<CleaningReport>,
    last_hybrid: Option<CleaningReport>,
}

impl Backup {
    /// Open a backup over the files directly contained in `source`.
    ///
    /// Fails with [`Error::DirectoryNotFound`] if `source` does not exist or
    /// is not a directory, and with [`Error::DirectoryEmpty`] if it contains
    /// no files.
    pub fn open<P: AsRef<Path>>(source: P) -> Result<Self> {
        let source = source.as_ref().to_path_buf();

        if !source.is_dir() {
            return Err(Error::directory_not_found(&source));
        }

        let files = walk::list_files(&source)?;
        if files.is_empty() {
            return Err(Error::directory_empty(&source));
        }

        let id = Uuid::new_v4();
        debug!(backup = %id, source = %source.display(), files = files.len(), "opened backup");

        Ok(Self {
            id,
            source,
            files: files.into_iter().collect(),
            points: Vec::new(),
            infos: Vec::new(),
            total_size: 0,
            creation: None,
            cleaning: None,
            hybrid: None,
            last_cleaning: None,
            last_hybrid: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The directory the backup was opened over.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Currently tracked files.
    pub fn files(&self) -> &BTreeSet<PathBuf> {
        &self.files
    }

    /// Summaries of the live restore points, in chain order.
    pub fn restore_points(&self) -> &[RestorePointInfo] {
        &self.infos
    }

    /// The live restore points, in chain order.
    pub fn points(&self) -> &[RestorePoint] {
        &self.points
    }

    /// Look up a live restore point by id.
    pub fn point(&self, id: RestorePointId) -> Option<&RestorePoint> {
        self.position(id).map(|index| &self.points[index])
    }

    /// The most recently added full point, if any.
    pub fn nearest_full(&self) -> Option<&RestorePoint> {
        self.nearest_full_index().map(|index| &self.points[index])
    }

    /// The oldest point that can be deleted without breaking a dependency.
    pub fn oldest_removable(&self) -> Option<RestorePointId> {
        self.points
            .iter()
            .find(|point| point.is_removable())
            .map(RestorePoint::id)
    }

    /// Sum of the sizes of all live restore points.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Number of live restore points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Outcome of the most recent cleaning policy run.
    ///
    /// A report with `over_limit` set means the policy could not bring the
    /// backup under its limit because every remaining candidate has
    /// dependents.
    pub fn last_cleaning_report(&self) -> Option<&CleaningReport> {
        self.last_cleaning.as_ref()
    }

    /// Outcome of the most recent hybrid policy run.
    pub fn last_hybrid_report(&self) -> Option<&CleaningReport> {
        self.last_hybrid.as_ref()
    }

    /// Add a restore point to the end of the chain.
    ///
    /// A full point is appended as-is. An incremental point is anchored to
    /// the nearest preceding full point: its file set is reduced to the files
    /// that point does not contain, and the anchor's dependency count is
    /// incremented. Fails with [`Error::FirstPointIncremental`] when there is
    /// no full point to anchor to, and with [`Error::DuplicateRestorePoint`]
    /// when the id is already live. A point whose size would overflow
    /// [`total_size`](Self::total_size) fails with [`Error::SizeOverflow`].
    /// On any of these errors nothing changes.
    ///
    /// Dependency bookkeeping the point carries, for example as a clone of a
    /// point linked in another chain, is discarded before linking.
    ///
    /// After the point is added this call additionally runs the cleaning
    /// policy and then the hybrid policy, if configured. Evictions made by
    /// those policies are committed one at a time; if a policy fails, its
    /// error is returned but the point stays added.
    pub fn add_restore_point(&mut self, mut point: RestorePoint) -> Result<RestorePointId> {
        let id = point.id();
        if self.position(id).is_some() {
            return Err(Error::duplicate_restore_point(id));
        }

        let total_size = self
            .total_size
            .checked_add(point.size())
            .ok_or_else(|| Error::size_overflow(point.size(), self.total_size))?;

        point.reset_links();
        if point.kind() == RestorePointKind::Incremental {
            let anchor = self
                .nearest_full_index()
                .ok_or(Error::FirstPointIncremental)?;
            point.link_to(&self.points[anchor]);
            self.points[anchor].increment_dependency();
        }

        self.total_size = total_size;
        self.infos.push(RestorePointInfo::from(&point));
        debug!(
            backup = %self.id,
            point = %id,
            kind = %point.kind(),
            size = point.size(),
            total_size = self.total_size,
            "added restore point"
        );
        self.points.push(point);

        self.run_cleaning()?;
        self.run_hybrid()?;

        Ok(id)
    }

    /// Delete a restore point and return it.
    ///
    /// Incremental points are always deletable and release their anchor.
    /// A full point with dependents fails with [`Error::RemovingDependent`]
    /// and an unknown id with [`Error::RestorePointNotFound`]; neither
    /// changes any state.
    pub fn delete_restore_point(&mut self, id: RestorePointId) -> Result<RestorePoint> {
        let index = self
            .position(id)
            .ok_or_else(|| Error::restore_point_not_found(id))?;

        let dependents = self.points[index].dependency_count();
        if dependents > 0 {
            return Err(Error::removing_dependent(id, dependents));
        }

        let point = self.points.remove(index);
        if let Some(parent) = point.parent()
            && let Some(parent_index) = self.position(parent)
        {
            self.points[parent_index].decrement_dependency();
        }

        self.total_size -= point.size();
        self.infos.retain(|info| info.id != id);
        debug!(
            backup = %self.id,
            point = %id,
            kind = %point.kind(),
            total_size = self.total_size,
            "deleted restore point"
        );

        Ok(point)
    }

    /// Start tracking a file, or every file a directory directly contains.
    ///
    /// Returns the number of newly tracked files.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();

        if path.is_dir() {
            let mut added = 0;
            for file in walk::list_files(path)? {
                if self.files.insert(file) {
                    added += 1;
                }
            }
            return Ok(added);
        }

        Ok(usize::from(self.files.insert(path.to_path_buf())))
    }

    /// Stop tracking a file, or every tracked file directly inside a
    /// directory.
    ///
    /// Returns the number of files no longer tracked; removing an untracked
    /// path is a no-op.
    pub fn remove_file<P: AsRef<Path>>(&mut self, path: P) -> usize {
        let path = path.as_ref();
        let before = self.files.len();
        self.files
            .retain(|file| file != path && file.parent() != Some(path));
        before - self.files.len()
    }

    /// Replace the creation policy.
    pub fn set_creation_policy<P: CreationPolicy + 'static>(&mut self, policy: P) {
        self.creation = Some(Box::new(policy));
    }

    /// Replace the cleaning policy and evaluate it once against the current
    /// chain.
    pub fn set_cleaning_policy<P: CleaningPolicy + 'static>(
        &mut self,
        policy: P,
    ) -> Result<CleaningReport> {
        self.cleaning = Some(Box::new(policy));
        Ok(self.run_cleaning()?.unwrap_or_default())
    }

    /// Replace the hybrid policy.
    ///
    /// The policy is not applied retroactively; it first runs on the next
    /// added restore point.
    pub fn set_hybrid_policy<P: HybridPolicy + 'static>(&mut self, policy: P) {
        self.hybrid = Some(Box::new(policy));
    }

    /// Build a full point with the creation policy and add it.
    ///
    /// Returns `Ok(None)` when no creation policy is configured.
    pub fn create_full_point(&mut self) -> Result<Option<RestorePointId>> {
        let Some(policy) = self.creation.as_ref() else {
            return Ok(None);
        };
        let point = policy.create_full(self)?;
        self.add_restore_point(point).map(Some)
    }

    /// Build an incremental point with the creation policy and add it.
    ///
    /// Returns `Ok(None)` when no creation policy is configured.
    pub fn create_incremental_point(&mut self) -> Result<Option<RestorePointId>> {
        let Some(policy) = self.creation.as_ref() else {
            return Ok(None);
        };
        let point = policy.create_incremental(self)?;
        self.add_restore_point(point).map(Some)
    }

    fn position(&self, id: RestorePointId) -> Option<usize> {
        self.points.iter().position(|point| point.id() == id)
    }

    fn nearest_full_index(&self) -> Option<usize> {
        self.points.iter().rposition(RestorePoint::is_full)
    }

    // Policies are taken out while they run, so a policy that adds points
    // does not re-enter itself.
    fn run_cleaning(&mut self) -> Result<Option<CleaningReport>> {
        let Some(policy) = self.cleaning.take() else {
            return Ok(None);
        };
        let result = policy.clean(self);
        if self.cleaning.is_none() {
            self.cleaning = Some(policy);
        }

        let report = result?;
        if report.over_limit {
            warn!(
                backup = %self.id,
                points = self.points.len(),
                total_size = self.total_size,
                "cleaning left backup over limit: remaining points have dependents"
            );
        }
        self.last_cleaning = Some(report.clone());
        Ok(Some(report))
    }

    fn run_hybrid(&mut self) -> Result<()> {
        let Some(policy) = self.hybrid.take() else {
            return Ok(());
        };
        let result = policy.apply(self);
        if self.hybrid.is_none() {
            self.hybrid = Some(policy);
        }

        let report = result?;
        if report.over_limit {
            warn!(
                backup = %self.id,
                points = self.points.len(),
                total_size = self.total_size,
                "hybrid policy left backup over limit"
            );
        }
        self.last_hybrid = Some(report);
        Ok(())
    }
}
