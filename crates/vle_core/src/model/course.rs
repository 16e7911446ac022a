//! Course key/value record.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Course mirrored from the VLE, keyed by `vle_course_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub vle_course_id: String,
    pub name: String,
}

impl Course {
    pub fn new(vle_course_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            vle_course_id: vle_course_id.into(),
            name: name.into(),
        }
    }
}

impl Display for Course {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "vle_course_id \"{}\" has name \"{}\"",
            self.vle_course_id, self.name
        )
    }
}
