//! Request shapes for mutation services.
//!
//! Field names follow the VLE push API. Absent and `null` fields decode as
//! empty so the services can report them through the missing-field contract.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CreateCourseRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub vle_course_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpdateCourseRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub old_vle_course_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub vle_course_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DeleteCourseRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub vle_course_id: String,
}

/// Shared by add/remove course members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CourseMembersRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub vle_course_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub usernames: Vec<String>,
}

/// Shared by add/remove tutor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TutorRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub vle_course_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CreateGroupRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub vle_course_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub vle_group_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpdateGroupRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub vle_course_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub old_vle_group_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub vle_group_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DeleteGroupRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub vle_course_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub vle_group_id: String,
}

/// Shared by add/remove group members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GroupMembersRequest {
    #[serde(deserialize_with = "null_as_empty")]
    pub vle_course_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub vle_group_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub usernames: Vec<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
