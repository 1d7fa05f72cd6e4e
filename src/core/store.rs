use std::{fs, io, path::Path};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    error::{Error, Result},
    question::Question,
    types::QuestionId,
};

use super::validate::{ValidationError, validate_record};

/// What to do with a record that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Abort the whole load on the first invalid record.
    #[default]
    Strict,
    /// Drop invalid records, log each one, keep the rest in document order.
    Skip,
}

/// Read-only, document-ordered collection of validated questions.
#[derive(Debug, Default, Clone)]
pub struct QuestionStore {
    records: Vec<Question>,
    pos: HashMap<QuestionId, usize>,
    skipped: Vec<ValidationError>,
}

impl QuestionStore {
    /// Loads and validates the JSON array at `path`.
    pub fn load(path: impl AsRef<Path>, policy: ValidationPolicy) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => Error::NotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let store = Self::from_json_str(&path.display().to_string(), &content, policy)?;
        info!(
            path = %path.display(),
            loaded = store.len(),
            skipped = store.skipped.len(),
            "loaded question store"
        );
        Ok(store)
    }

    /// Parses and validates an in-memory JSON document.
    pub fn from_json_str(source_name: &str, json: &str, policy: ValidationPolicy) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(|e| Error::Format {
            source_name: source_name.to_string(),
            detail: e.to_string(),
        })?;
        let Value::Array(values) = value else {
            return Err(Error::Format {
                source_name: source_name.to_string(),
                detail: "expected a JSON array of question records".to_string(),
            });
        };
        Self::from_values(values, policy)
    }

    /// Validates raw records in order, applying `policy` to invalid ones.
    ///
    /// Duplicate ids are rejected under every policy.
    pub fn from_values(values: Vec<Value>, policy: ValidationPolicy) -> Result<Self> {
        let mut store = Self::default();
        for (index, value) in values.into_iter().enumerate() {
            match validate_record(index, value) {
                Ok(question) => store.push(index, question)?,
                Err(err) if policy == ValidationPolicy::Skip => {
                    warn!(error = %err, "skipping invalid question record");
                    store.skipped.push(err);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(store)
    }

    /// Builds a store from already-typed records, checking id uniqueness.
    pub fn from_records(records: impl IntoIterator<Item = Question>) -> Result<Self> {
        let mut store = Self::default();
        for (index, question) in records.into_iter().enumerate() {
            store.push(index, question)?;
        }
        Ok(store)
    }

    /// All records in document order.
    pub fn all(&self) -> &[Question] {
        &self.records
    }

    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.pos.get(&id).map(|&i| &self.records[i])
    }

    pub fn contains(&self, id: QuestionId) -> bool {
        self.pos.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records dropped under [`ValidationPolicy::Skip`].
    pub fn skipped(&self) -> &[ValidationError] {
        &self.skipped
    }

    fn push(&mut self, index: usize, question: Question) -> Result<()> {
        if let Some(&first) = self.pos.get(&question.id) {
            return Err(ValidationError {
                index,
                id: Some(question.id),
                field: "id",
                reason: format!("duplicates the id of an earlier record (store position {first})"),
            }
            .into());
        }
        self.pos.insert(question.id, self.records.len());
        self.records.push(question);
        Ok(())
    }
}
