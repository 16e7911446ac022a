//! Full reconciliation of the local mirror against a VLE snapshot.
//!
//! # Responsibility
//! - Obtain one authoritative snapshot from a `SnapshotSource`.
//! - Run the course, group, course-member and group-member passes in that
//!   order, upserting present items and deleting orphans with cascades.
//!
//! # Invariants
//! - A failed fetch aborts the run before any pass.
//! - Each pass commits in its own transaction; earlier passes stay committed
//!   if a later one fails.
//! - Items naming an unknown username are skipped and do not protect any
//!   existing record from deletion.

mod engine;
mod passes;
pub mod snapshot;
pub mod source;

pub use engine::{SyncEngine, SyncError, SyncReport, FULL_SYNC_COMPLETED};
pub use passes::PassStats;
