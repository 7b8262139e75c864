/// Database row types. These map directly to SQLite rows and stay
/// independent of the hushbox-types API models.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub is_accepting_messages: Option<bool>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
}

/// Result of a conditional append on the public send path.
#[derive(Debug)]
pub enum AppendOutcome {
    Appended(MessageRow),
    UserNotFound,
    NotAccepting,
}
