//! Membership expansion.
//!
//! # Responsibility
//! - Resolve user ids, group ids and course ids into the set of reachable
//!   user ids.
//!
//! # Invariants
//! - Pure read; nothing is written.
//! - Output is ascending and duplicate-free.
//! - An empty group or course list skips that lookup entirely.

use crate::filter::group_filter::GroupFilter;
use crate::model::group::GroupKey;
use crate::model::user::UserId;
use crate::repo::course_member_repo::{CourseMemberRepository, SqliteCourseMemberRepository};
use crate::repo::group_member_repo::{GroupMemberRepository, SqliteGroupMemberRepository};
use crate::repo::RepoError;
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input for membership expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandQuery {
    /// Separator between course id and group id in `group_ids` entries.
    pub delimiter: String,
    pub user_ids: Vec<UserId>,
    /// `"<course><delimiter><group>"` entries.
    pub group_ids: Vec<String>,
    pub course_ids: Vec<String>,
}

/// Errors from membership expansion.
#[derive(Debug)]
pub enum ExpandError {
    /// The delimiter is empty, so group ids cannot be split.
    EmptyDelimiter,
    /// A group id entry does not contain the delimiter.
    MalformedGroupId(String),
    Repo(RepoError),
}

impl Display for ExpandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDelimiter => write!(f, "group id delimiter must not be empty"),
            Self::MalformedGroupId(value) => {
                write!(f, "group id `{value}` does not contain the delimiter")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExpandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ExpandError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Returns the sorted union of direct users, group members and course members.
pub fn expand_user_ids(conn: &Connection, query: &ExpandQuery) -> Result<Vec<UserId>, ExpandError> {
    let mut ids: BTreeSet<UserId> = query.user_ids.iter().copied().collect();

    if !query.group_ids.is_empty() {
        let pairs = parse_group_ids(&query.delimiter, &query.group_ids)?;
        let filter = GroupFilter::new(pairs).map_err(RepoError::from)?;
        ids.extend(SqliteGroupMemberRepository::new(conn).user_ids_in_groups(&filter)?);
    }

    if !query.course_ids.is_empty() {
        ids.extend(SqliteCourseMemberRepository::new(conn).user_ids_in_courses(&query.course_ids)?);
    }

    Ok(ids.into_iter().collect())
}

/// Splits each entry at the first delimiter occurrence.
pub fn parse_group_ids(delimiter: &str, group_ids: &[String]) -> Result<Vec<GroupKey>, ExpandError> {
    if delimiter.is_empty() {
        return Err(ExpandError::EmptyDelimiter);
    }
    group_ids
        .iter()
        .map(|value| {
            value
                .split_once(delimiter)
                .map(|(course, group)| GroupKey::new(course, group))
                .ok_or_else(|| ExpandError::MalformedGroupId(value.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{parse_group_ids, ExpandError};
    use crate::model::group::GroupKey;

    #[test]
    fn group_ids_split_at_first_delimiter() {
        let parsed = parse_group_ids("::", &["001::a".to_string(), "002::b::c".to_string()]).unwrap();
        assert_eq!(
            parsed,
            vec![GroupKey::new("001", "a"), GroupKey::new("002", "b::c")]
        );
    }

    #[test]
    fn group_id_without_delimiter_is_rejected() {
        let err = parse_group_ids("::", &["001".to_string()]).unwrap_err();
        assert!(matches!(err, ExpandError::MalformedGroupId(value) if value == "001"));
    }

    #[test]
    fn empty_delimiter_is_rejected() {
        let err = parse_group_ids("", &["001::a".to_string()]).unwrap_err();
        assert!(matches!(err, ExpandError::EmptyDelimiter));
    }
}
