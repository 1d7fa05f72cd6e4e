//! SQLite-backed usage ledger.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, params};

use crate::types::QuestionId;

use super::{LedgerSink, PersistResult};

/// SQLite implementation of [`crate::persist::LedgerSink`].
pub struct SqliteSink {
    conn: Connection,
    label: String,
}

impl SqliteSink {
    /// Opens or creates a SQLite ledger at `path`.
    ///
    /// Enables WAL mode with `synchronous=FULL` so a committed mark survives power loss.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let label = path.display().to_string();
        let conn = Connection::open(path)?;
        Self::init_connection(conn, label)
    }

    /// Opens an in-memory SQLite ledger.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn, ":memory:".to_string())
    }

    fn init_connection(conn: Connection, label: String) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        Ok(Self { conn, label })
    }

    /// Timestamp at which `id` was marked, if it is present.
    pub fn marked_at_ms(&self, id: QuestionId) -> PersistResult<Option<u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT ts_ms FROM used_questions WHERE question_id = ?1")?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => {
                let ts: i64 = row.get(0)?;
                Ok(Some(ts as u64))
            }
            None => Ok(None),
        }
    }
}

impl LedgerSink for SqliteSink {
    fn load_ids(&mut self) -> PersistResult<Vec<QuestionId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT question_id FROM used_questions ORDER BY seq ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn append(&mut self, id: QuestionId) -> PersistResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO used_questions(question_id, ts_ms) VALUES (?1, ?2)",
            params![id, now_ms() as i64],
        )?;
        Ok(())
    }

    fn clear(&mut self) -> PersistResult<()> {
        self.conn.execute("DELETE FROM used_questions", [])?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.label)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
