use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Only `Some(true)` means the inbox is open. A missing value is treated as closed.
    pub is_accepting_messages: Option<bool>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn accepts_messages(&self) -> bool {
        self.is_accepting_messages == Some(true)
    }
}

/// An anonymous message. Always owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
