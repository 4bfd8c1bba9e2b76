use crate::models::UserRow;
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CreateUserError {
    #[error("username '{0}' is taken")]
    UsernameTaken(String),

    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        image_url: Option<&str>,
    ) -> std::result::Result<(), CreateUserError> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, password, image_url) VALUES (?1, ?2, ?3, ?4)",
                (id, username, password_hash, image_url),
            );
            match inserted {
                Ok(_) => Ok(Ok(())),
                // UNIQUE(username) lost to a concurrent registration
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    Ok(Err(CreateUserError::UsernameTaken(username.to_string())))
                }
                Err(e) => Err(e.into()),
            }
        })?
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, password, image_url, created_at FROM users WHERE username = ?1",
            )?;
            Ok(stmt.query_row([username], map_user).optional()?)
        })
    }

    pub fn user_exists(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| user_exists(conn, id))
    }

    /// Everyone except `id`, for the conversation picker.
    pub fn list_users_except(&self, id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, password, image_url, created_at
                 FROM users
                 WHERE id <> ?1
                 ORDER BY username",
            )?;

            let rows = stmt
                .query_map([id], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

pub(crate) fn user_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        image_url: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
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
