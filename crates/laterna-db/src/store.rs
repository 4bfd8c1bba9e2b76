//! Message store: append-only persistence of direct messages and
//! per-conversation retrieval.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use laterna_types::models::Message;

use crate::Database;
use crate::models::MessageRow;
use crate::queries::user_exists;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid message: {0}")]
    Validation(String),

    #[error("user {0} does not exist")]
    NotFound(Uuid),

    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl Database {
    /// Store a new message from `sender` to `receiver`.
    ///
    /// The receiver check and the insert happen under one writer lock, so a
    /// failed append never leaves a row behind.
    pub fn append_message(
        &self,
        sender: Uuid,
        receiver: Uuid,
        content: &str,
    ) -> Result<Message, StoreError> {
        if content.trim().is_empty() {
            return Err(StoreError::Validation("content must not be empty".into()));
        }
        if sender == receiver {
            return Err(StoreError::Validation("cannot message yourself".into()));
        }

        let message = Message {
            id: Uuid::new_v4(),
            sender_id: sender,
            receiver_id: receiver,
            content: content.to_string(),
            created_at: Utc::now().trunc_subsecs(6),
        };

        self.with_conn_mut(|conn| {
            if !user_exists(conn, &receiver.to_string())? {
                return Ok(Err(StoreError::NotFound(receiver)));
            }
            if !user_exists(conn, &sender.to_string())? {
                return Ok(Err(StoreError::NotFound(sender)));
            }

            conn.execute(
                "INSERT INTO messages (id, sender_id, receiver_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    message.id.to_string(),
                    sender.to_string(),
                    receiver.to_string(),
                    message.content,
                    encode_timestamp(message.created_at),
                ],
            )?;
            Ok(Ok(()))
        })??;

        debug!("Stored message {} ({} -> {})", message.id, sender, receiver);
        Ok(message)
    }

    /// All messages between `a` and `b` in either direction, oldest first.
    pub fn list_conversation(&self, a: Uuid, b: Uuid) -> Result<Vec<Message>, StoreError> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender_id, receiver_id, content, created_at
                 FROM messages
                 WHERE (sender_id = ?1 AND receiver_id = ?2)
                    OR (sender_id = ?2 AND receiver_id = ?1)
                 ORDER BY created_at ASC, rowid ASC",
            )?;

            let rows = stmt
                .query_map(rusqlite::params![a.to_string(), b.to_string()], |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        sender_id: row.get(1)?,
                        receiver_id: row.get(2)?,
                        content: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })?;

        rows.into_iter()
            .map(|row| decode_message(row).map_err(StoreError::Storage))
            .collect()
    }
}

fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_message(row: MessageRow) -> anyhow::Result<Message> {
    Ok(Message {
        id: row.id.parse()?,
        sender_id: row.sender_id.parse()?,
        receiver_id: row.receiver_id.parse()?,
        content: row.content,
        created_at: DateTime::parse_from_rfc3339(&row.created_at)?.with_timezone(&Utc),
    })
}
