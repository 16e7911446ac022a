//! Reconciliation run orchestration.

use crate::repo::{RepoError, RepoResult};
use crate::service::begin_write;
use crate::sync::passes::{
    run_pass, CourseMemberPass, CoursePass, GroupMemberPass, GroupPass, PassStats, ReconcilePass,
};
use crate::sync::snapshot::Snapshot;
use crate::sync::source::{FetchError, SnapshotSource};
use log::{error, info};
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

pub const FULL_SYNC_COMPLETED: &str = "Full VLE synchronization completed successfully";

/// Outcome of one completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub courses: PassStats,
    pub groups: PassStats,
    pub course_members: PassStats,
    pub group_members: PassStats,
}

impl SyncReport {
    pub fn message(&self) -> &'static str {
        FULL_SYNC_COMPLETED
    }
}

#[derive(Debug)]
pub enum SyncError {
    /// The snapshot could not be obtained; no pass ran.
    Fetch(FetchError),
    /// A pass failed; passes before it stay committed.
    Repo(RepoError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fetch(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<FetchError> for SyncError {
    fn from(value: FetchError) -> Self {
        Self::Fetch(value)
    }
}

impl From<RepoError> for SyncError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Brings the local mirror in line with an authoritative snapshot.
pub struct SyncEngine<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SyncEngine<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Fetches one snapshot and reconciles all four record sets.
    pub fn full_sync(&self, source: &dyn SnapshotSource) -> Result<SyncReport, SyncError> {
        let snapshot = source.fetch().map_err(|err| {
            error!("event=sync_fetch module=sync status=error error={err}");
            SyncError::Fetch(err)
        })?;
        self.apply_snapshot(&snapshot)
    }

    /// Runs the course, group, course-member and group-member passes in order.
    pub fn apply_snapshot(&self, snapshot: &Snapshot) -> Result<SyncReport, SyncError> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!("event=sync_run module=sync status=start run_id={run_id}");

        let result = self.run_passes(run_id, snapshot);
        match &result {
            Ok(_) => info!(
                "event=sync_run module=sync status=ok run_id={run_id} duration_ms={}",
                started.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=sync_run module=sync status=error run_id={run_id} duration_ms={} error={err}",
                started.elapsed().as_millis()
            ),
        }
        result
    }

    fn run_passes(&self, run_id: Uuid, snapshot: &Snapshot) -> Result<SyncReport, SyncError> {
        let courses = self.commit_pass(run_id, CoursePass::ENTITY, |conn| {
            run_pass(&CoursePass::new(conn), &snapshot.course_kv_store)
        })?;
        let groups = self.commit_pass(run_id, GroupPass::ENTITY, |conn| {
            run_pass(&GroupPass::new(conn), &snapshot.group_kv_store)
        })?;
        let course_members = self.commit_pass(run_id, CourseMemberPass::ENTITY, |conn| {
            run_pass(&CourseMemberPass::new(conn), &snapshot.course_member)
        })?;
        let group_members = self.commit_pass(run_id, GroupMemberPass::ENTITY, |conn| {
            run_pass(&GroupMemberPass::new(conn), &snapshot.group_member)
        })?;

        Ok(SyncReport {
            run_id,
            courses,
            groups,
            course_members,
            group_members,
        })
    }

    /// Runs one pass inside its own immediate transaction.
    fn commit_pass<F>(&self, run_id: Uuid, entity: &str, pass: F) -> Result<PassStats, SyncError>
    where
        F: FnOnce(&Connection) -> RepoResult<PassStats>,
    {
        let tx = begin_write(self.conn)?;
        let stats = pass(&tx)?;
        tx.commit()?;

        info!(
            "event=sync_pass module=sync status=ok run_id={run_id} entity={entity} created={} updated={} unchanged={} skipped={} deleted={}",
            stats.created, stats.updated, stats.unchanged, stats.skipped, stats.deleted
        );
        Ok(stats)
    }
}
