//! Course and group membership records.
//!
//! # Invariants
//! - `(user_id, vle_course_id)` is unique for course members.
//! - `(user_id, vle_course_id, vle_group_id)` is unique for group members.
//! - `id` is a local surrogate used only for orphan deletion.

use crate::model::group::GroupKey;
use crate::model::user::{User, UserId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Local surrogate id of a membership row.
pub type MembershipId = i64;

/// A user's relationship to a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseMember {
    pub id: MembershipId,
    pub user_id: UserId,
    pub vle_course_id: String,
    pub is_tutor: bool,
}

/// A user's relationship to one group inside a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: MembershipId,
    pub user_id: UserId,
    pub vle_course_id: String,
    pub vle_group_id: String,
}

impl GroupMember {
    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(self.vle_course_id.as_str(), self.vle_group_id.as_str())
    }
}

/// Operator-facing rendering of a course member with its user.
pub struct CourseMemberLabel<'a> {
    pub member: &'a CourseMember,
    pub user: &'a User,
}

impl Display for CourseMemberLabel<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let relation = if self.member.is_tutor {
            "tutor in"
        } else {
            "member of"
        };
        write!(
            f,
            "\"{}\" is a {} course \"{}\"",
            self.user.full_name(),
            relation,
            self.member.vle_course_id
        )
    }
}

/// Operator-facing rendering of a group member with its user.
pub struct GroupMemberLabel<'a> {
    pub member: &'a GroupMember,
    pub user: &'a User,
}

impl Display for GroupMemberLabel<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "\"{}\" is a member of group \"{}\" (in course \"{}\")",
            self.user.full_name(),
            self.member.vle_group_id,
            self.member.vle_course_id
        )
    }
}
