//! Per-entity reconciliation passes.

use crate::filter::group_filter::GroupFilter;
use crate::model::course::Course;
use crate::model::group::{Group, GroupKey};
use crate::model::membership::MembershipId;
use crate::repo::course_member_repo::{CourseMemberRepository, SqliteCourseMemberRepository};
use crate::repo::course_repo::{CourseRepository, SqliteCourseRepository};
use crate::repo::group_member_repo::{GroupMemberRepository, SqliteGroupMemberRepository};
use crate::repo::group_repo::{GroupRepository, SqliteGroupRepository};
use crate::repo::user_repo::{SqliteUserDirectory, UserDirectory};
use crate::repo::{RepoResult, UpsertOutcome};
use crate::sync::snapshot::{CourseItem, CourseMemberItem, GroupItem, GroupMemberItem};
use log::debug;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeSet;

/// Counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Items naming an unknown username.
    pub skipped: usize,
    /// Orphans removed, excluding cascaded children.
    pub deleted: usize,
}

impl PassStats {
    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

pub(crate) enum ItemOutcome<K> {
    /// The item was written under this key.
    Applied(K, UpsertOutcome),
    Skipped,
}

/// One entity type's view of the mirror during reconciliation.
pub(crate) trait ReconcilePass {
    type Key: Ord + Clone;
    type Item;

    const ENTITY: &'static str;

    fn existing_keys(&self) -> RepoResult<Vec<Self::Key>>;
    fn apply(&self, item: &Self::Item) -> RepoResult<ItemOutcome<Self::Key>>;
    /// Deletes every orphan with its cascade. `orphans` is never empty.
    fn delete_orphans(&self, orphans: &[Self::Key]) -> RepoResult<usize>;
}

/// Upserts every incoming item, then deletes the keys no item touched.
pub(crate) fn run_pass<P: ReconcilePass>(pass: &P, items: &[P::Item]) -> RepoResult<PassStats> {
    let mut candidates: BTreeSet<P::Key> = pass.existing_keys()?.into_iter().collect();
    let mut stats = PassStats::default();

    for item in items {
        match pass.apply(item)? {
            ItemOutcome::Applied(key, outcome) => {
                stats.record(outcome);
                candidates.remove(&key);
            }
            ItemOutcome::Skipped => stats.skipped += 1,
        }
    }

    if !candidates.is_empty() {
        let orphans: Vec<P::Key> = candidates.into_iter().collect();
        stats.deleted = pass.delete_orphans(&orphans)?;
    }
    Ok(stats)
}

pub(crate) struct CoursePass<'conn> {
    conn: &'conn Connection,
}

impl<'conn> CoursePass<'conn> {
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ReconcilePass for CoursePass<'_> {
    type Key = String;
    type Item = CourseItem;

    const ENTITY: &'static str = "course";

    fn existing_keys(&self) -> RepoResult<Vec<String>> {
        SqliteCourseRepository::new(self.conn).list_course_ids()
    }

    fn apply(&self, item: &CourseItem) -> RepoResult<ItemOutcome<String>> {
        let outcome = SqliteCourseRepository::new(self.conn)
            .upsert_course(&Course::new(item.vle_course_id.as_str(), item.name.as_str()))?;
        Ok(ItemOutcome::Applied(item.vle_course_id.clone(), outcome))
    }

    fn delete_orphans(&self, orphans: &[String]) -> RepoResult<usize> {
        let cascade = SqliteCourseRepository::new(self.conn).delete_courses(orphans)?;
        debug!(
            "event=sync_cascade module=sync entity=course groups={} course_members={} group_members={}",
            cascade.groups, cascade.course_members, cascade.group_members
        );
        Ok(cascade.courses)
    }
}

pub(crate) struct GroupPass<'conn> {
    conn: &'conn Connection,
}

impl<'conn> GroupPass<'conn> {
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ReconcilePass for GroupPass<'_> {
    type Key = GroupKey;
    type Item = GroupItem;

    const ENTITY: &'static str = "group";

    fn existing_keys(&self) -> RepoResult<Vec<GroupKey>> {
        SqliteGroupRepository::new(self.conn).list_group_keys()
    }

    fn apply(&self, item: &GroupItem) -> RepoResult<ItemOutcome<GroupKey>> {
        let group = Group::new(
            item.vle_course_id.as_str(),
            item.vle_group_id.as_str(),
            item.name.as_str(),
        );
        let outcome = SqliteGroupRepository::new(self.conn).upsert_group(&group)?;
        Ok(ItemOutcome::Applied(group.key(), outcome))
    }

    fn delete_orphans(&self, orphans: &[GroupKey]) -> RepoResult<usize> {
        let filter = GroupFilter::new(orphans.iter().cloned())?;
        let cascade = SqliteGroupRepository::new(self.conn).delete_groups(&filter)?;
        debug!(
            "event=sync_cascade module=sync entity=group group_members={}",
            cascade.group_members
        );
        Ok(cascade.groups)
    }
}

pub(crate) struct CourseMemberPass<'conn> {
    conn: &'conn Connection,
}

impl<'conn> CourseMemberPass<'conn> {
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ReconcilePass for CourseMemberPass<'_> {
    type Key = MembershipId;
    type Item = CourseMemberItem;

    const ENTITY: &'static str = "course_member";

    fn existing_keys(&self) -> RepoResult<Vec<MembershipId>> {
        SqliteCourseMemberRepository::new(self.conn).list_course_member_ids()
    }

    fn apply(&self, item: &CourseMemberItem) -> RepoResult<ItemOutcome<MembershipId>> {
        let Some(user) = SqliteUserDirectory::new(self.conn).find_user_by_username(&item.username)?
        else {
            debug!(
                "event=sync_skip module=sync entity=course_member reason=unknown_user vle_course_id={}",
                item.vle_course_id
            );
            return Ok(ItemOutcome::Skipped);
        };

        let (id, outcome) = SqliteCourseMemberRepository::new(self.conn).upsert_course_member(
            user.id,
            &item.vle_course_id,
            item.is_tutor,
        )?;
        Ok(ItemOutcome::Applied(id, outcome))
    }

    fn delete_orphans(&self, orphans: &[MembershipId]) -> RepoResult<usize> {
        SqliteCourseMemberRepository::new(self.conn).delete_course_members_by_id(orphans)
    }
}

pub(crate) struct GroupMemberPass<'conn> {
    conn: &'conn Connection,
}

impl<'conn> GroupMemberPass<'conn> {
    pub(crate) fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ReconcilePass for GroupMemberPass<'_> {
    type Key = MembershipId;
    type Item = GroupMemberItem;

    const ENTITY: &'static str = "group_member";

    fn existing_keys(&self) -> RepoResult<Vec<MembershipId>> {
        SqliteGroupMemberRepository::new(self.conn).list_group_member_ids()
    }

    fn apply(&self, item: &GroupMemberItem) -> RepoResult<ItemOutcome<MembershipId>> {
        let Some(user) = SqliteUserDirectory::new(self.conn).find_user_by_username(&item.username)?
        else {
            debug!(
                "event=sync_skip module=sync entity=group_member reason=unknown_user vle_course_id={} vle_group_id={}",
                item.vle_course_id, item.vle_group_id
            );
            return Ok(ItemOutcome::Skipped);
        };

        let (id, outcome) = SqliteGroupMemberRepository::new(self.conn)
            .get_or_create_group_member(user.id, &item.vle_course_id, &item.vle_group_id)?;
        Ok(ItemOutcome::Applied(id, outcome))
    }

    fn delete_orphans(&self, orphans: &[MembershipId]) -> RepoResult<usize> {
        SqliteGroupMemberRepository::new(self.conn).delete_group_members_by_id(orphans)
    }
}
