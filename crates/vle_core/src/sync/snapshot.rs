//! Snapshot wire types as served by the VLE messaging endpoint.

use serde::{Deserialize, Serialize};

/// Authoritative state of all four mirrored record sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub course_kv_store: Vec<CourseItem>,
    pub group_kv_store: Vec<GroupItem>,
    pub course_member: Vec<CourseMemberItem>,
    pub group_member: Vec<GroupMemberItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseItem {
    pub vle_course_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupItem {
    pub vle_course_id: String,
    pub vle_group_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseMemberItem {
    pub username: String,
    pub vle_course_id: String,
    pub is_tutor: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMemberItem {
    pub username: String,
    pub vle_course_id: String,
    pub vle_group_id: String,
}
