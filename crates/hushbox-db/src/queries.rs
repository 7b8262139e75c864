use crate::models::{AppendOutcome, MessageRow, UserRow};
use crate::{Database, format_timestamp, parse_timestamp};
use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::{Connection, ErrorCode};

const USER_COLUMNS: &str = "id, username, password, is_accepting_messages, created_at";

impl Database {
    // -- Users --

    /// Insert a new user. Returns `false` if the username is already taken.
    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<bool> {
        let created_at = format_timestamp(Utc::now());
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, password, created_at) VALUES (?1, ?2, ?3, ?4)",
                (id, username, password_hash, &created_at),
            );

            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Remove a user. Their messages go with them via the foreign key cascade.
    pub fn delete_user(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }

    /// Set the acceptance flag and return the updated row, or `None` if no
    /// user has this id. Writing the current value again still succeeds.
    pub fn set_accepting_messages(&self, user_id: &str, accepting: bool) -> Result<Option<UserRow>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let matched = tx.execute(
                "UPDATE users SET is_accepting_messages = ?2 WHERE id = ?1",
                rusqlite::params![user_id, accepting],
            )?;
            if matched == 0 {
                return Ok(None);
            }
            let row = query_user(&tx, "id", user_id)?;
            tx.commit()?;
            Ok(row)
        })
    }

    // -- Messages --

    /// Messages owned by `user_id`, newest first. Equal timestamps keep
    /// insertion order. `None` if the user does not exist.
    pub fn list_messages(&self, user_id: &str) -> Result<Option<Vec<MessageRow>>> {
        self.with_conn(|conn| {
            if query_user(conn, "id", user_id)?.is_none() {
                return Ok(None);
            }
            query_messages(conn, user_id).map(Some)
        })
    }

    /// The public send path as one transaction: resolve the username, check
    /// the flag, append. A concurrent toggle can never interleave between the
    /// check and the insert.
    pub fn append_message_if_accepting(
        &self,
        username: &str,
        message_id: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<AppendOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(user) = query_user(&tx, "username", username)? else {
                return Ok(AppendOutcome::UserNotFound);
            };
            if user.is_accepting_messages != Some(true) {
                return Ok(AppendOutcome::NotAccepting);
            }

            let latest: Option<String> = tx
                .query_row(
                    "SELECT MAX(created_at) FROM messages WHERE user_id = ?1",
                    [&user.id],
                    |row| row.get(0),
                )?;

            // Keep created_at strictly increasing per user
            let mut created_at = now;
            if let Some(latest) = latest.as_deref() {
                let latest = parse_timestamp(latest)?;
                if created_at <= latest {
                    created_at = latest + TimeDelta::microseconds(1);
                }
            }
            let created_at = format_timestamp(created_at);

            tx.execute(
                "INSERT INTO messages (id, user_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
                (message_id, &user.id, content, &created_at),
            )?;
            tx.commit()?;

            Ok(AppendOutcome::Appended(MessageRow {
                id: message_id.to_string(),
                user_id: user.id,
                content: content.to_string(),
                created_at,
            }))
        })
    }

    /// Remove one message from the owner's list. Returns `false` when the
    /// owner has no message with this id, whether it never existed, was
    /// already deleted, or belongs to someone else.
    pub fn delete_message(&self, user_id: &str, message_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM messages WHERE id = ?1 AND user_id = ?2",
                [message_id, user_id],
            )?;
            Ok(removed > 0)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                is_accepting_messages: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_messages(conn: &Connection, user_id: &str) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, content, created_at
         FROM messages
         WHERE user_id = ?1
         ORDER BY created_at DESC, rowid ASC",
    )?;

    let rows = stmt
        .query_map([user_id], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                content: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
