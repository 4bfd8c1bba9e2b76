use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, messages)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                image_url   TEXT,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- created_at is fixed-width RFC3339 (micros, Z) so text order is time order.
            -- Rowid breaks ties in insertion order.
            CREATE TABLE messages (
                id           TEXT PRIMARY KEY,
                sender_id    TEXT NOT NULL REFERENCES users(id),
                receiver_id  TEXT NOT NULL REFERENCES users(id),
                content      TEXT NOT NULL CHECK (length(content) > 0),
                created_at   TEXT NOT NULL,
                CHECK (sender_id <> receiver_id)
            );

            CREATE INDEX idx_messages_pair
                ON messages(sender_id, receiver_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
