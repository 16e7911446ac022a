//! Course use-case service.
//!
//! # Responsibility
//! - Create, rename and delete courses with their cascades.
//! - Add/remove course members and toggle the tutor flag.
//!
//! # Invariants
//! - Removing a course member also removes that user's group memberships in
//!   the same course.
//! - Unknown usernames in member lists are skipped, never reported.

use crate::model::course::Course;
use crate::repo::course_member_repo::{CourseMemberRepository, SqliteCourseMemberRepository};
use crate::repo::course_repo::{CourseRepository, SqliteCourseRepository};
use crate::repo::group_member_repo::{GroupMemberRepository, SqliteGroupMemberRepository};
use crate::repo::user_repo::{SqliteUserDirectory, UserDirectory};
use crate::service::requests::{
    CourseMembersRequest, CreateCourseRequest, DeleteCourseRequest, TutorRequest,
    UpdateCourseRequest,
};
use crate::service::{
    begin_write, ServiceError, ServiceResult, COURSE_CREATED, COURSE_DELETED,
    COURSE_MEMBERS_ADDED, COURSE_MEMBERS_REMOVED, COURSE_UPDATED, TUTOR_ADDED, TUTOR_REMOVED,
};
use log::info;
use rusqlite::Connection;

/// Course mutation service over a borrowed connection.
pub struct CourseService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> CourseService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates a course with no children.
    pub fn create_course(&self, request: &CreateCourseRequest) -> ServiceResult<&'static str> {
        if request.vle_course_id.is_empty() || request.name.is_empty() {
            return Err(ServiceError::MissingFields("vle_course_id and name"));
        }

        let tx = begin_write(self.conn)?;
        let courses = SqliteCourseRepository::new(&tx);
        if courses.course_exists(&request.vle_course_id)? {
            return Err(ServiceError::CourseAlreadyExists);
        }
        courses.create_course(&Course::new(
            request.vle_course_id.as_str(),
            request.name.as_str(),
        ))?;
        tx.commit()?;

        info!(
            "event=course_create module=service status=ok vle_course_id={}",
            request.vle_course_id
        );
        Ok(COURSE_CREATED)
    }

    /// Renames a course key and re-keys its groups and memberships.
    ///
    /// Memberships survive the rename; nothing is deleted and recreated.
    pub fn update_course(&self, request: &UpdateCourseRequest) -> ServiceResult<&'static str> {
        if request.old_vle_course_id.is_empty()
            || request.vle_course_id.is_empty()
            || request.name.is_empty()
        {
            return Err(ServiceError::MissingFields(
                "old_vle_course_id, vle_course_id, name",
            ));
        }

        let tx = begin_write(self.conn)?;
        let courses = SqliteCourseRepository::new(&tx);
        if !courses.course_exists(&request.old_vle_course_id)? {
            return Err(ServiceError::CourseNotFound("old_vle_course_id"));
        }
        courses.rename_course(
            &request.old_vle_course_id,
            &Course::new(request.vle_course_id.as_str(), request.name.as_str()),
        )?;
        tx.commit()?;

        info!(
            "event=course_update module=service status=ok old_vle_course_id={} vle_course_id={}",
            request.old_vle_course_id, request.vle_course_id
        );
        Ok(COURSE_UPDATED)
    }

    /// Deletes a course with its groups and memberships.
    pub fn delete_course(&self, request: &DeleteCourseRequest) -> ServiceResult<&'static str> {
        if request.vle_course_id.is_empty() {
            return Err(ServiceError::MissingFields("vle_course_id"));
        }

        let tx = begin_write(self.conn)?;
        let courses = SqliteCourseRepository::new(&tx);
        if !courses.course_exists(&request.vle_course_id)? {
            return Err(ServiceError::CourseNotFound("vle_course_id"));
        }
        let cascade = courses.delete_courses(std::slice::from_ref(&request.vle_course_id))?;
        tx.commit()?;

        info!(
            "event=course_delete module=service status=ok vle_course_id={} groups={} course_members={} group_members={}",
            request.vle_course_id, cascade.groups, cascade.course_members, cascade.group_members
        );
        Ok(COURSE_DELETED)
    }

    /// Enrols each resolvable user; existing members are left untouched.
    pub fn add_course_members(&self, request: &CourseMembersRequest) -> ServiceResult<&'static str> {
        ensure_course_members_fields(request)?;

        let tx = begin_write(self.conn)?;
        ensure_course_exists(&tx, &request.vle_course_id)?;

        let users = SqliteUserDirectory::new(&tx);
        let members = SqliteCourseMemberRepository::new(&tx);
        let mut added = 0usize;
        let mut skipped = 0usize;
        for username in &request.usernames {
            let Some(user) = users.find_user_by_username(username)? else {
                skipped += 1;
                continue;
            };
            if !members.is_course_member(user.id, &request.vle_course_id)? {
                members.create_course_member(user.id, &request.vle_course_id, false)?;
                added += 1;
            }
        }
        tx.commit()?;

        info!(
            "event=course_members_add module=service status=ok vle_course_id={} added={added} unknown_users={skipped}",
            request.vle_course_id
        );
        Ok(COURSE_MEMBERS_ADDED)
    }

    /// Removes each resolvable user from the course and from its groups.
    pub fn remove_course_members(
        &self,
        request: &CourseMembersRequest,
    ) -> ServiceResult<&'static str> {
        ensure_course_members_fields(request)?;

        let tx = begin_write(self.conn)?;
        ensure_course_exists(&tx, &request.vle_course_id)?;

        let users = SqliteUserDirectory::new(&tx);
        let course_members = SqliteCourseMemberRepository::new(&tx);
        let group_members = SqliteGroupMemberRepository::new(&tx);
        let mut removed = 0usize;
        let mut removed_from_groups = 0usize;
        for username in &request.usernames {
            let Some(user) = users.find_user_by_username(username)? else {
                continue;
            };
            removed += course_members.delete_course_member(user.id, &request.vle_course_id)?;
            removed_from_groups +=
                group_members.delete_group_members_in_course(user.id, &request.vle_course_id)?;
        }
        tx.commit()?;

        info!(
            "event=course_members_remove module=service status=ok vle_course_id={} removed={removed} group_members_removed={removed_from_groups}",
            request.vle_course_id
        );
        Ok(COURSE_MEMBERS_REMOVED)
    }

    /// Marks an existing course member as tutor.
    pub fn add_tutor(&self, request: &TutorRequest) -> ServiceResult<&'static str> {
        self.set_tutor(request, true)?;
        Ok(TUTOR_ADDED)
    }

    /// Clears the tutor flag; the membership itself is kept.
    pub fn remove_tutor(&self, request: &TutorRequest) -> ServiceResult<&'static str> {
        self.set_tutor(request, false)?;
        Ok(TUTOR_REMOVED)
    }

    // Checks the user and the membership only, not the course.
    fn set_tutor(&self, request: &TutorRequest, is_tutor: bool) -> ServiceResult<()> {
        if request.vle_course_id.is_empty() || request.username.is_empty() {
            return Err(ServiceError::MissingFields("vle_course_id and username"));
        }

        let tx = begin_write(self.conn)?;
        let user = SqliteUserDirectory::new(&tx)
            .find_user_by_username(&request.username)?
            .ok_or(ServiceError::UserNotFound)?;
        let members = SqliteCourseMemberRepository::new(&tx);
        if !members.is_course_member(user.id, &request.vle_course_id)? {
            return Err(ServiceError::NotCourseMember);
        }
        members.set_tutor(user.id, &request.vle_course_id, is_tutor)?;
        tx.commit()?;

        info!(
            "event=tutor_set module=service status=ok vle_course_id={} is_tutor={is_tutor}",
            request.vle_course_id
        );
        Ok(())
    }
}

fn ensure_course_members_fields(request: &CourseMembersRequest) -> ServiceResult<()> {
    if request.vle_course_id.is_empty() || request.usernames.is_empty() {
        return Err(ServiceError::MissingFields("vle_course_id and usernames"));
    }
    Ok(())
}

pub(crate) fn ensure_course_exists(conn: &Connection, vle_course_id: &str) -> ServiceResult<()> {
    if !SqliteCourseRepository::new(conn).course_exists(vle_course_id)? {
        return Err(ServiceError::CourseNotFound("vle_course_id"));
    }
    Ok(())
}
