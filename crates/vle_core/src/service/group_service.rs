//! Group use-case service.
//!
//! # Invariants
//! - A group member is only created for a user who is already a member of
//!   the group's course. The check happens at add time only.
//! - Groups cannot be moved to another course.

use crate::filter::group_filter::GroupFilter;
use crate::model::group::{Group, GroupKey};
use crate::repo::course_member_repo::{CourseMemberRepository, SqliteCourseMemberRepository};
use crate::repo::group_member_repo::{GroupMemberRepository, SqliteGroupMemberRepository};
use crate::repo::group_repo::{GroupRepository, SqliteGroupRepository};
use crate::repo::user_repo::{SqliteUserDirectory, UserDirectory};
use crate::repo::RepoError;
use crate::service::course_service::ensure_course_exists;
use crate::service::requests::{
    CreateGroupRequest, DeleteGroupRequest, GroupMembersRequest, UpdateGroupRequest,
};
use crate::service::{
    begin_write, ServiceError, ServiceResult, GROUP_CREATED, GROUP_DELETED, GROUP_MEMBERS_ADDED,
    GROUP_MEMBERS_REMOVED, GROUP_UPDATED,
};
use log::info;
use rusqlite::Connection;

const GROUP_KEY_FIELDS: &str = "vle_course_id and vle_group_id";

/// Group mutation service over a borrowed connection.
pub struct GroupService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> GroupService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates a group inside an existing course.
    pub fn create_group(&self, request: &CreateGroupRequest) -> ServiceResult<&'static str> {
        if request.vle_course_id.is_empty()
            || request.vle_group_id.is_empty()
            || request.name.is_empty()
        {
            return Err(ServiceError::MissingFields("vle_course_id, vle_group_id, name"));
        }

        let tx = begin_write(self.conn)?;
        ensure_course_exists(&tx, &request.vle_course_id)?;
        let groups = SqliteGroupRepository::new(&tx);
        if groups.group_exists(&request.vle_course_id, &request.vle_group_id)? {
            return Err(ServiceError::GroupAlreadyExists);
        }
        groups.create_group(&Group::new(
            request.vle_course_id.as_str(),
            request.vle_group_id.as_str(),
            request.name.as_str(),
        ))?;
        tx.commit()?;

        info!(
            "event=group_create module=service status=ok vle_course_id={} vle_group_id={}",
            request.vle_course_id, request.vle_group_id
        );
        Ok(GROUP_CREATED)
    }

    /// Renames a group id within its course and re-keys its members.
    pub fn update_group(&self, request: &UpdateGroupRequest) -> ServiceResult<&'static str> {
        if request.vle_course_id.is_empty()
            || request.old_vle_group_id.is_empty()
            || request.vle_group_id.is_empty()
            || request.name.is_empty()
        {
            return Err(ServiceError::MissingFields(
                "vle_course_id, old_vle_group_id, vle_group_id, name",
            ));
        }

        let tx = begin_write(self.conn)?;
        let groups = SqliteGroupRepository::new(&tx);
        if !groups.group_exists(&request.vle_course_id, &request.old_vle_group_id)? {
            return Err(ServiceError::GroupNotFound(
                "vle_course_id and old_vle_group_id",
            ));
        }
        groups.rename_group(
            &request.vle_course_id,
            &request.old_vle_group_id,
            &request.vle_group_id,
            &request.name,
        )?;
        tx.commit()?;

        info!(
            "event=group_update module=service status=ok vle_course_id={} old_vle_group_id={} vle_group_id={}",
            request.vle_course_id, request.old_vle_group_id, request.vle_group_id
        );
        Ok(GROUP_UPDATED)
    }

    /// Deletes a group and its members.
    pub fn delete_group(&self, request: &DeleteGroupRequest) -> ServiceResult<&'static str> {
        if request.vle_course_id.is_empty() || request.vle_group_id.is_empty() {
            return Err(ServiceError::MissingFields(GROUP_KEY_FIELDS));
        }

        let tx = begin_write(self.conn)?;
        let groups = SqliteGroupRepository::new(&tx);
        if !groups.group_exists(&request.vle_course_id, &request.vle_group_id)? {
            return Err(ServiceError::GroupNotFound(GROUP_KEY_FIELDS));
        }
        let filter = GroupFilter::new([GroupKey::new(
            request.vle_course_id.as_str(),
            request.vle_group_id.as_str(),
        )])
        .map_err(RepoError::from)?;
        let cascade = groups.delete_groups(&filter)?;
        tx.commit()?;

        info!(
            "event=group_delete module=service status=ok vle_course_id={} vle_group_id={} group_members={}",
            request.vle_course_id, request.vle_group_id, cascade.group_members
        );
        Ok(GROUP_DELETED)
    }

    /// Adds each resolvable course member to the group.
    ///
    /// Unknown usernames and users outside the course are skipped.
    pub fn add_group_members(&self, request: &GroupMembersRequest) -> ServiceResult<&'static str> {
        ensure_group_members_fields(request)?;

        let tx = begin_write(self.conn)?;
        ensure_group_scope_exists(&tx, request)?;

        let users = SqliteUserDirectory::new(&tx);
        let course_members = SqliteCourseMemberRepository::new(&tx);
        let group_members = SqliteGroupMemberRepository::new(&tx);
        let mut added = 0usize;
        let mut not_in_course = 0usize;
        for username in &request.usernames {
            let Some(user) = users.find_user_by_username(username)? else {
                continue;
            };
            if !course_members.is_course_member(user.id, &request.vle_course_id)? {
                not_in_course += 1;
                continue;
            }
            if !group_members.is_group_member(
                user.id,
                &request.vle_course_id,
                &request.vle_group_id,
            )? {
                group_members.create_group_member(
                    user.id,
                    &request.vle_course_id,
                    &request.vle_group_id,
                )?;
                added += 1;
            }
        }
        tx.commit()?;

        info!(
            "event=group_members_add module=service status=ok vle_course_id={} vle_group_id={} added={added} not_in_course={not_in_course}",
            request.vle_course_id, request.vle_group_id
        );
        Ok(GROUP_MEMBERS_ADDED)
    }

    /// Removes each resolvable user from the group.
    pub fn remove_group_members(
        &self,
        request: &GroupMembersRequest,
    ) -> ServiceResult<&'static str> {
        ensure_group_members_fields(request)?;

        let tx = begin_write(self.conn)?;
        ensure_group_scope_exists(&tx, request)?;

        let users = SqliteUserDirectory::new(&tx);
        let group_members = SqliteGroupMemberRepository::new(&tx);
        let mut removed = 0usize;
        for username in &request.usernames {
            if let Some(user) = users.find_user_by_username(username)? {
                removed += group_members.delete_group_member(
                    user.id,
                    &request.vle_course_id,
                    &request.vle_group_id,
                )?;
            }
        }
        tx.commit()?;

        info!(
            "event=group_members_remove module=service status=ok vle_course_id={} vle_group_id={} removed={removed}",
            request.vle_course_id, request.vle_group_id
        );
        Ok(GROUP_MEMBERS_REMOVED)
    }
}

fn ensure_group_members_fields(request: &GroupMembersRequest) -> ServiceResult<()> {
    if request.vle_course_id.is_empty()
        || request.vle_group_id.is_empty()
        || request.usernames.is_empty()
    {
        return Err(ServiceError::MissingFields(
            "vle_course_id, vle_group_id, usernames",
        ));
    }
    Ok(())
}

fn ensure_group_scope_exists(conn: &Connection, request: &GroupMembersRequest) -> ServiceResult<()> {
    ensure_course_exists(conn, &request.vle_course_id)?;
    if !SqliteGroupRepository::new(conn).group_exists(&request.vle_course_id, &request.vle_group_id)? {
        return Err(ServiceError::GroupNotFound(GROUP_KEY_FIELDS));
    }
    Ok(())
}
