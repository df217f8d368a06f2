use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, Result as SqlResult, params};

use crate::common::Message;

/// How long a write waits for another process holding the file lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite file holding the message log of every collection.
///
/// All calls block; async callers go through `spawn_blocking`.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> SqlResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn in_memory() -> SqlResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> SqlResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL UNIQUE,
                collection TEXT NOT NULL,
                name TEXT NOT NULL,
                time TEXT NOT NULL,
                created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_messages_collection ON messages(collection, seq)",
            [],
        )?;

        Ok(Self { conn })
    }

    /// Append `message` to `collection` under `key`
    pub fn insert_message(&self, collection: &str, key: &str, message: &Message) -> SqlResult<()> {
        self.conn.execute(
            "INSERT INTO messages (key, collection, name, time) VALUES (?1, ?2, ?3, ?4)",
            params![key, collection, message.text(), message.time_label()],
        )?;
        Ok(())
    }

    /// Whole collection in insertion order
    pub fn messages(&self, collection: &str) -> SqlResult<Vec<Message>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, time
             FROM messages
             WHERE collection = ?1
             ORDER BY seq ASC",
        )?;

        let messages = stmt
            .query_map(params![collection], |row| {
                Ok(Message::stored(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                ))
            })?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(messages)
    }

    pub fn message_count(&self, collection: &str) -> SqlResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
