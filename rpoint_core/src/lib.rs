//! # rpoint Core
//!
//! An in-memory backup engine managing a chain of restore points over a
//! tracked file set.
//!
//! A [`Backup`] is opened over a source directory and collects restore
//! points: full points capture the complete file set, incremental points
//! capture only files their anchor (the nearest preceding full point) lacks.
//! A full point cannot be deleted while incremental points depend on it.
//!
//! ## Features
//!
//! - Full and incremental restore points with dependency tracking
//! - Size accounting across the live chain
//! - Pluggable creation, cleaning and hybrid policies
//! - Count, size and age limits for eviction
//! - `key=value` policy configuration
//!
//! ## Example
//!
//! ```no_run
//! use rpoint_core::{Backup, FileSizeCreation, LimitCleaning};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Open a backup over an existing, non-empty directory
//! let mut backup = Backup::open("./my-data")?;
//!
//! // Keep at most five restore points
//! backup.set_creation_policy(FileSizeCreation);
//! backup.set_cleaning_policy(LimitCleaning::max_points(5))?;
//!
//! // Snapshot everything, then only what changed
//! backup.create_full_point()?;
//! backup.add_file("./my-data/new.txt")?;
//! backup.create_incremental_point()?;
//!
//! for info in backup.restore_points() {
//!     println!("{} {} {} bytes", info.id, info.kind, info.size);
//! }
//! println!("Total: {} bytes", backup.total_size());
//! # Ok(())
//! # }
//! ```

mod backup;
mod config;
mod error;
mod point;
mod policy;
mod walk;

pub use backup::Backup;
pub use config::{BackupConfig, CreationKind, HybridSpec, LimitSpec};
pub use error::{Error, Result};
pub use point::{RestorePoint, RestorePointId, RestorePointInfo, RestorePointKind};
pub use policy::{
    AgeLimit, CleaningPolicy, CleaningReport, CombinedLimits, CountLimit, CreationPolicy,
    FileSizeCreation, HybridMode, HybridPolicy, Limit, LimitCleaning, RebaseOnThreshold,
    SizeLimit,
};
