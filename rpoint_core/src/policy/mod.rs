//! Pluggable strategies that create and evict restore points.
//!
//! A [`Backup`](crate::Backup) holds at most one policy of each kind:
//!
//! - [`CreationPolicy`] builds full and incremental points on request.
//! - [`CleaningPolicy`] runs after every added point and evicts points to
//!   respect a [`Limit`].
//! - [`HybridPolicy`] runs after the cleaning policy and may both add and
//!   evict points.

mod cleaning;
mod creation;
mod hybrid;
mod limit;

pub use cleaning::{CleaningPolicy, CleaningReport, LimitCleaning};
pub use creation::{CreationPolicy, FileSizeCreation};
pub use hybrid::{CombinedLimits, HybridMode, HybridPolicy, RebaseOnThreshold};
pub use limit::{AgeLimit, CountLimit, Limit, SizeLimit};
