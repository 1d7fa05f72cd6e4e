pub mod logfile;
pub mod sqlite;

use std::sync::{Arc, Mutex, PoisonError};

use crate::types::QuestionId;

pub use logfile::LogFileSink;
pub use sqlite::SqliteSink;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("line {line} is not a question id: `{content}`")]
    Corrupt { line: usize, content: String },
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Durable append-only storage behind [`crate::core::ledger::UsageLedger`].
///
/// `append` must not return `Ok` until the id survives a process crash.
pub trait LedgerSink: Send {
    /// Every persisted id in append order; may contain repeats.
    fn load_ids(&mut self) -> PersistResult<Vec<QuestionId>>;
    fn append(&mut self, id: QuestionId) -> PersistResult<()>;
    fn clear(&mut self) -> PersistResult<()>;
    fn describe(&self) -> String;
}

/// Non-durable sink. Clones share the same backing list.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    ids: Arc<Mutex<Vec<QuestionId>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: impl IntoIterator<Item = QuestionId>) -> Self {
        Self {
            ids: Arc::new(Mutex::new(ids.into_iter().collect())),
        }
    }

    /// Raw contents, including any repeats.
    pub fn snapshot(&self) -> Vec<QuestionId> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl LedgerSink for MemorySink {
    fn load_ids(&mut self) -> PersistResult<Vec<QuestionId>> {
        Ok(self.snapshot())
    }

    fn append(&mut self, id: QuestionId) -> PersistResult<()> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner).push(id);
        Ok(())
    }

    fn clear(&mut self) -> PersistResult<()> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner).clear();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
