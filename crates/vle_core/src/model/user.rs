//! Identity-store user record.

use serde::{Deserialize, Serialize};

/// Identity-store primary key.
pub type UserId = i64;

/// User as seen through the read-only identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl User {
    /// First and last name joined by one space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
