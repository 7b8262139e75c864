//! Message service: the operations behind the inbox endpoints.
//!
//! Every function takes the caller's identity as a plain argument. Authenticated
//! operations receive the user id from the session, never from the request body,
//! so one user cannot read or mutate another user's inbox through these calls.
//! Each mutation is a single store call and therefore atomic.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use hushbox_db::{AppendOutcome, Database, MessageRow, UserRow, parse_timestamp};
use hushbox_types::models::{Message, User};

#[derive(Debug, Error)]
pub enum InboxError {
    #[error("{0}")]
    InvalidInput(&'static str),

    #[error("User not found")]
    UserNotFound,

    #[error("Message not found or already deleted")]
    MessageNotFound,

    #[error("User is not accepting messages")]
    NotAccepting,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub fn acceptance_status(db: &Database, user_id: Uuid) -> Result<bool, InboxError> {
    let user = db
        .get_user_by_id(&user_id.to_string())?
        .ok_or(InboxError::UserNotFound)?;
    Ok(user_from_row(user).accepts_messages())
}

pub fn set_acceptance_status(db: &Database, user_id: Uuid, accepting: bool) -> Result<User, InboxError> {
    let row = db
        .set_accepting_messages(&user_id.to_string(), accepting)?
        .ok_or(InboxError::UserNotFound)?;
    Ok(user_from_row(row))
}

/// The caller's messages, newest first. An empty inbox is `Ok(vec![])`.
pub fn list_messages(db: &Database, user_id: Uuid) -> Result<Vec<Message>, InboxError> {
    let rows = db
        .list_messages(&user_id.to_string())?
        .ok_or(InboxError::UserNotFound)?;
    Ok(rows.into_iter().map(message_from_row).collect())
}

pub fn delete_message(db: &Database, user_id: Uuid, message_id: &str) -> Result<(), InboxError> {
    if db.delete_message(&user_id.to_string(), message_id)? {
        Ok(())
    } else {
        Err(InboxError::MessageNotFound)
    }
}

/// Public send path. Input is validated before the store is touched.
pub fn send_message(
    db: &Database,
    username: Option<&str>,
    content: Option<&str>,
) -> Result<Message, InboxError> {
    const REQUIRED: &str = "Username and message content are required";

    let username = username.filter(|u| !u.is_empty()).ok_or(InboxError::InvalidInput(REQUIRED))?;
    let content = content
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(InboxError::InvalidInput(REQUIRED))?;

    let message_id = Uuid::new_v4();
    match db.append_message_if_accepting(username, &message_id.to_string(), content, Utc::now())? {
        AppendOutcome::Appended(row) => Ok(message_from_row(row)),
        AppendOutcome::UserNotFound => Err(InboxError::UserNotFound),
        AppendOutcome::NotAccepting => Err(InboxError::NotAccepting),
    }
}

/// Only the flag is exposed; never message content or counts.
pub fn public_acceptance_status(db: &Database, username: &str) -> Result<bool, InboxError> {
    let user = db
        .get_user_by_username(username)?
        .ok_or(InboxError::UserNotFound)?;
    Ok(user_from_row(user).accepts_messages())
}

fn user_from_row(row: UserRow) -> User {
    User {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt user id '{}': {}", row.id, e);
            Uuid::default()
        }),
        created_at: timestamp_or_default(&row.created_at, &row.id),
        username: row.username,
        is_accepting_messages: row.is_accepting_messages,
    }
}

fn message_from_row(row: MessageRow) -> Message {
    Message {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt message id '{}': {}", row.id, e);
            Uuid::default()
        }),
        created_at: timestamp_or_default(&row.created_at, &row.id),
        content: row.content,
    }
}

fn timestamp_or_default(raw: &str, owner: &str) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or_else(|e| {
        warn!("Corrupt created_at '{}' on '{}': {}", raw, owner, e);
        DateTime::default()
    })
}
