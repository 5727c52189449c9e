//! Listing the files a directory directly contains.

use crate::error::Result;
use std::path::{Path, PathBuf};

/// List the regular files directly contained in `dir`.
///
/// Subdirectories are not descended into and are not returned. Hidden and
/// ignored files are included; a backup source is taken as-is.
pub(crate) fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let walker = ignore::WalkBuilder::new(dir)
        .max_depth(Some(1)) // Only immediate children
        .standard_filters(false) // Do not skip hidden or .gitignore'd files
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        let entry_path = entry.path();

        // Skip the directory itself
        if entry_path == dir {
            continue;
        }

        if entry_path.metadata()?.is_file() {
            files.push(entry_path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}
