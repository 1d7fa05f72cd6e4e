use std::{
    fs,
    path::{Path, PathBuf},
};

use hashbrown::HashSet;
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    persist::{LedgerSink, PersistError},
    question::Question,
    types::QuestionId,
};

use super::store::QuestionStore;

/// Set of published question ids, persisted through a [`LedgerSink`].
///
/// The ledger is the only writer of usage state. Every mutation reaches the
/// sink before the in-memory set changes, so a failed write leaves both sides
/// agreeing that the question is still unused.
pub struct UsageLedger {
    sink: Box<dyn LedgerSink>,
    order: Vec<QuestionId>,
    used: HashSet<QuestionId>,
}

impl UsageLedger {
    /// Loads the persisted ids from `sink`. A missing backing file is an empty ledger.
    pub fn open(sink: impl LedgerSink + 'static) -> Result<Self> {
        Self::open_boxed(Box::new(sink))
    }

    pub fn open_boxed(mut sink: Box<dyn LedgerSink>) -> Result<Self> {
        let raw = sink.load_ids()?;
        let mut ledger = Self {
            sink,
            order: Vec::with_capacity(raw.len()),
            used: HashSet::with_capacity(raw.len()),
        };
        for id in raw {
            if ledger.used.insert(id) {
                ledger.order.push(id);
            }
        }
        info!(
            ledger = %ledger.sink.describe(),
            used = ledger.order.len(),
            "loaded usage ledger"
        );
        Ok(ledger)
    }

    pub fn contains(&self, id: QuestionId) -> bool {
        self.used.contains(&id)
    }

    /// Records `id` as published. Returns `false` when it was already present.
    pub fn mark_used(&mut self, id: QuestionId) -> Result<bool> {
        if self.used.contains(&id) {
            debug!(id, "question already marked as used");
            return Ok(false);
        }
        self.sink.append(id)?;
        self.used.insert(id);
        self.order.push(id);
        info!(id, "marked question as used");
        Ok(true)
    }

    /// Clears every entry, making all questions eligible again.
    pub fn reset(&mut self) -> Result<()> {
        self.sink.clear()?;
        let cleared = self.order.len();
        self.used.clear();
        self.order.clear();
        warn!(cleared, "reset usage ledger, all questions available again");
        Ok(())
    }

    /// Used ids in the order they were first marked.
    pub fn used_ids(&self) -> &[QuestionId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Records of `store` not yet marked, in store order.
    pub fn unused<'a>(&'a self, store: &'a QuestionStore) -> impl Iterator<Item = &'a Question> + 'a {
        store.all().iter().filter(|q| !self.contains(q.id))
    }

    /// Writes every unused record of `store` to `destination` as a JSON array
    /// in the question file format. Returns the number of records written.
    pub fn export_unused(&self, store: &QuestionStore, destination: impl AsRef<Path>) -> Result<usize> {
        let destination = destination.as_ref();
        let unused: Vec<&Question> = self.unused(store).collect();
        let mut json = serde_json::to_vec_pretty(&unused).map_err(|e| Error::Format {
            source_name: destination.display().to_string(),
            detail: e.to_string(),
        })?;
        json.push(b'\n');

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(PersistError::from)?;
        }
        let staging = staging_path(destination);
        fs::write(&staging, &json).map_err(PersistError::from)?;
        fs::rename(&staging, destination).map_err(PersistError::from)?;

        info!(
            count = unused.len(),
            destination = %destination.display(),
            "exported unused questions"
        );
        Ok(unused.len())
    }
}

fn staging_path(destination: &Path) -> PathBuf {
    let mut name = destination.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    destination.with_file_name(name)
}
