use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    question::Question,
    types::QuestionId,
};

use super::{ledger::UsageLedger, store::QuestionStore};

/// Aggregate usage counts for one store/ledger pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageStats {
    pub total: usize,
    /// Store records present in the ledger.
    pub used: usize,
    pub remaining: usize,
    /// `used / total` as a percentage rounded to two decimals.
    pub percentage_used: f64,
    pub by_difficulty: BTreeMap<String, usize>,
    pub remaining_by_difficulty: BTreeMap<String, usize>,
    /// Ledger ids with no matching store record, e.g. after a question was deleted.
    pub unknown_used: usize,
}

/// Picks the next eligible question. Holds no state of its own.
///
/// Selection scans the store in document order and returns the first record
/// absent from the ledger, so reordering the question file reorders publishing.
#[derive(Clone, Copy)]
pub struct QuestionSelector<'a> {
    store: &'a QuestionStore,
    ledger: &'a UsageLedger,
}

impl<'a> QuestionSelector<'a> {
    pub fn new(store: &'a QuestionStore, ledger: &'a UsageLedger) -> Self {
        Self { store, ledger }
    }

    /// First unused record in store order. Does not mark it.
    pub fn select_next(&self) -> Result<&'a Question> {
        let ledger = self.ledger;
        let Some(question) = self.store.all().iter().find(|q| !ledger.contains(q.id)) else {
            warn!(total = self.store.len(), "all questions have been used");
            return Err(Error::Exhausted {
                total: self.store.len(),
            });
        };

        info!(id = question.id, "selected question");
        debug!(
            difficulty = %question.difficulty,
            captions = question.captions.len(),
            descriptions = question.descriptions.len(),
            hashtags = question.hashtags.len(),
            "selected question metadata"
        );
        Ok(question)
    }

    pub fn get(&self, id: QuestionId) -> Option<&'a Question> {
        self.store.get(id)
    }

    pub fn get_stats(&self) -> UsageStats {
        let total = self.store.len();
        let mut used = 0usize;
        let mut by_difficulty = BTreeMap::new();
        let mut remaining_by_difficulty = BTreeMap::new();

        for q in self.store.all() {
            *by_difficulty.entry(q.difficulty.clone()).or_insert(0) += 1;
            if self.ledger.contains(q.id) {
                used += 1;
            } else {
                *remaining_by_difficulty.entry(q.difficulty.clone()).or_insert(0) += 1;
            }
        }

        let unknown_used = self
            .ledger
            .used_ids()
            .iter()
            .filter(|id| !self.store.contains(**id))
            .count();

        let percentage_used = if total > 0 {
            (used as f64 / total as f64 * 10_000.0).round() / 100.0
        } else {
            0.0
        };

        UsageStats {
            total,
            used,
            remaining: total - used,
            percentage_used,
            by_difficulty,
            remaining_by_difficulty,
            unknown_used,
        }
    }
}
