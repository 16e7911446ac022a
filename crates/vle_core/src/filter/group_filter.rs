//! Group pair filter.
//!
//! # Invariants
//! - A filter always holds at least one pair. Matching nothing and matching
//!   everything are indistinguishable once negated, so callers must guard
//!   emptiness before building one.
//! - `Matching` and `Excluding` read the same pair list and are exact
//!   complements over existing records.

use crate::model::group::GroupKey;
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors raised while building a group filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupFilterError {
    /// No `(course, group)` pairs were supplied.
    Empty,
}

impl Display for GroupFilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "group filter requires at least one (course, group) pair"),
        }
    }
}

impl Error for GroupFilterError {}

/// Which side of the predicate to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Records whose pair equals one of the filter pairs.
    Matching,
    /// Records whose pair equals none of the filter pairs.
    Excluding,
}

/// Predicate over records carrying a `(vle_course_id, vle_group_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFilter {
    pairs: Vec<GroupKey>,
}

impl GroupFilter {
    /// Builds a filter from an ordered, non-empty pair sequence.
    pub fn new<I>(pairs: I) -> Result<Self, GroupFilterError>
    where
        I: IntoIterator<Item = GroupKey>,
    {
        let pairs: Vec<GroupKey> = pairs.into_iter().collect();
        if pairs.is_empty() {
            return Err(GroupFilterError::Empty);
        }
        Ok(Self { pairs })
    }

    pub fn pairs(&self) -> &[GroupKey] {
        &self.pairs
    }

    /// Returns whether the pair equals one of the filter pairs.
    pub fn matches(&self, vle_course_id: &str, vle_group_id: &str) -> bool {
        self.pairs
            .iter()
            .any(|pair| pair.is(vle_course_id, vle_group_id))
    }

    /// Evaluates the predicate for `mode`.
    pub fn selects(&self, mode: FilterMode, vle_course_id: &str, vle_group_id: &str) -> bool {
        match mode {
            FilterMode::Matching => self.matches(vle_course_id, vle_group_id),
            FilterMode::Excluding => !self.matches(vle_course_id, vle_group_id),
        }
    }

    /// Renders the predicate as a parenthesised SQL fragment plus bind values.
    ///
    /// Column names are trusted identifiers supplied by repository code.
    pub fn to_sql(
        &self,
        mode: FilterMode,
        course_column: &str,
        group_column: &str,
    ) -> (String, Vec<Value>) {
        let mut values = Vec::with_capacity(self.pairs.len() * 2);
        let clauses = self
            .pairs
            .iter()
            .map(|pair| {
                values.push(Value::Text(pair.vle_course_id.clone()));
                values.push(Value::Text(pair.vle_group_id.clone()));
                format!("({course_column} = ? AND {group_column} = ?)")
            })
            .collect::<Vec<_>>()
            .join(" OR ");

        let sql = match mode {
            FilterMode::Matching => format!("({clauses})"),
            FilterMode::Excluding => format!("(NOT ({clauses}))"),
        };
        (sql, values)
    }

    /// Splits into sub-filters of at most `max_pairs` pairs.
    ///
    /// Only meaningful for `Matching`: the union of the chunks selects exactly
    /// what the whole filter selects.
    pub fn chunks(&self, max_pairs: usize) -> impl Iterator<Item = GroupFilter> + '_ {
        self.pairs.chunks(max_pairs.max(1)).map(|chunk| GroupFilter {
            pairs: chunk.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterMode, GroupFilter, GroupFilterError};
    use crate::model::group::GroupKey;
    use rusqlite::types::Value;

    fn sample() -> GroupFilter {
        GroupFilter::new(vec![GroupKey::new("001", "001"), GroupKey::new("002", "001")]).unwrap()
    }

    #[test]
    fn empty_pairs_are_rejected() {
        let err = GroupFilter::new(Vec::new()).unwrap_err();
        assert_eq!(err, GroupFilterError::Empty);
    }

    #[test]
    fn matching_and_excluding_are_complements() {
        let filter = sample();
        for (course, group) in [("001", "001"), ("001", "002"), ("002", "001"), ("002", "002")] {
            assert_ne!(
                filter.selects(FilterMode::Matching, course, group),
                filter.selects(FilterMode::Excluding, course, group)
            );
        }
        assert!(filter.matches("002", "001"));
        assert!(!filter.matches("001", "002"));
    }

    #[test]
    fn pair_equality_is_exact() {
        let filter = sample();
        assert!(!filter.matches("001 ", "001"));
        assert!(!filter.matches("0010", "01"));
    }

    #[test]
    fn sql_rendering_binds_pairs_in_order() {
        let (sql, values) = sample().to_sql(FilterMode::Excluding, "c", "g");
        assert_eq!(sql, "(NOT ((c = ? AND g = ?) OR (c = ? AND g = ?)))");
        assert_eq!(
            values,
            vec![
                Value::Text("001".to_string()),
                Value::Text("001".to_string()),
                Value::Text("002".to_string()),
                Value::Text("001".to_string()),
            ]
        );
    }

    #[test]
    fn chunks_cover_every_pair() {
        let filter = GroupFilter::new((0..5).map(|idx| GroupKey::new("c", idx.to_string()))).unwrap();
        let chunks = filter.chunks(2).collect::<Vec<_>>();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.iter().map(|chunk| chunk.pairs().len()).sum::<usize>(), 5);
    }
}
