//! Local mirror of VLE course and group membership.
//!
//! The crate owns the mirrored record sets, the reconciliation engine that
//! aligns them with an upstream snapshot, and the single-record mutation calls
//! the VLE pushes between full syncs.

pub mod api;
pub mod config;
pub mod db;
pub mod filter;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sync;

pub use api::auth::{authorize, AuthOutcome};
pub use api::{handle, ApiResponse, Route};
pub use config::{BasicAuthCredentials, ConfigError, VleConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use filter::group_filter::{FilterMode, GroupFilter, GroupFilterError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use repo::{RepoError, RepoResult, UpsertOutcome};
pub use service::course_service::CourseService;
pub use service::expansion::{expand_user_ids, ExpandError, ExpandQuery};
pub use service::group_service::GroupService;
pub use service::{ServiceError, ServiceResult};
pub use sync::source::{FetchError, FileSnapshotSource, HttpSnapshotSource, SnapshotSource};
pub use sync::{PassStats, SyncEngine, SyncError, SyncReport, FULL_SYNC_COMPLETED};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
