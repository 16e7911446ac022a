//! Group key/value record and its composite key.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Composite `(vle_course_id, vle_group_id)` key shared by groups and group
/// members.
///
/// Ordering is lexicographic by course id, then group id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub vle_course_id: String,
    pub vle_group_id: String,
}

impl GroupKey {
    pub fn new(vle_course_id: impl Into<String>, vle_group_id: impl Into<String>) -> Self {
        Self {
            vle_course_id: vle_course_id.into(),
            vle_group_id: vle_group_id.into(),
        }
    }

    /// Exact string equality on both fields.
    pub fn is(&self, vle_course_id: &str, vle_group_id: &str) -> bool {
        self.vle_course_id == vle_course_id && self.vle_group_id == vle_group_id
    }
}

/// Group mirrored from the VLE. Belongs to the course named by its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub vle_course_id: String,
    pub vle_group_id: String,
    pub name: String,
}

impl Group {
    pub fn new(
        vle_course_id: impl Into<String>,
        vle_group_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            vle_course_id: vle_course_id.into(),
            vle_group_id: vle_group_id.into(),
            name: name.into(),
        }
    }

    pub fn key(&self) -> GroupKey {
        GroupKey::new(self.vle_course_id.as_str(), self.vle_group_id.as_str())
    }
}

impl Display for Group {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "vle_course_id, vle_group_id \"{}|{}\" has name \"{}\"",
            self.vle_course_id, self.vle_group_id, self.name
        )
    }
}
