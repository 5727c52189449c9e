//! Creation policies.

use crate::backup::Backup;
use crate::error::{Error, Result};
use crate::point::RestorePoint;
use std::fmt;
use std::fs;
use std::path::Path;

/// Builds restore points from a backup's tracked files.
///
/// The backup adds the returned point itself; see
/// [`Backup::create_full_point`] and [`Backup::create_incremental_point`].
pub trait CreationPolicy: fmt::Debug + Send {
    fn create_full(&self, backup: &Backup) -> Result<RestorePoint>;

    fn create_incremental(&self, backup: &Backup) -> Result<RestorePoint>;
}

/// Sizes restore points from on-disk file lengths.
///
/// A full point is charged for every tracked file. An incremental point is
/// charged only for files its anchor (the nearest full point) lacks, which
/// matches the delta the backup stores for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileSizeCreation;

impl FileSizeCreation {
    fn file_size(path: &Path) -> Result<u64> {
        let metadata = fs::metadata(path).map_err(|e| Error::Io {
            source: std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e)),
        })?;
        Ok(metadata.len())
    }

    fn add_file_size(total: u64, path: &Path) -> Result<u64> {
        let size = Self::file_size(path)?;
        total
            .checked_add(size)
            .ok_or_else(|| Error::size_overflow(size, total))
    }
}

impl CreationPolicy for FileSizeCreation {
    fn create_full(&self, backup: &Backup) -> Result<RestorePoint> {
        let size = backup
            .files()
            .iter()
            .try_fold(0, |total, file| Self::add_file_size(total, file))?;
        Ok(RestorePoint::full(backup.files().iter().cloned(), size))
    }

    fn create_incremental(&self, backup: &Backup) -> Result<RestorePoint> {
        let anchor = backup.nearest_full();

        let size = backup
            .files()
            .iter()
            .filter(|file| !anchor.is_some_and(|anchor| anchor.contains(file)))
            .try_fold(0, |total, file| Self::add_file_size(total, file))?;
        Ok(RestorePoint::incremental(backup.files().iter().cloned(), size))
    }
}
