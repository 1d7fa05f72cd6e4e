//! Upload metadata handed from the selector to the rendering and upload stages.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{question::Question, types::QuestionId};

/// Chooses which caption or description variant a run publishes.
pub trait VariantStrategy: Send + Sync {
    /// Index into a variant list of length `count` (always at least one).
    fn pick(&self, question: &Question, count: usize) -> usize;
}

/// Always the first variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstVariant;

impl VariantStrategy for FirstVariant {
    fn pick(&self, _question: &Question, _count: usize) -> usize {
        0
    }
}

/// A fixed index, falling back to the first variant when out of range.
#[derive(Debug, Clone, Copy)]
pub struct NthVariant(pub usize);

impl VariantStrategy for NthVariant {
    fn pick(&self, _question: &Question, count: usize) -> usize {
        if self.0 < count { self.0 } else { 0 }
    }
}

/// Spreads variants across questions by id.
#[derive(Debug, Clone, Copy, Default)]
pub struct RotateById;

impl VariantStrategy for RotateById {
    fn pick(&self, question: &Question, count: usize) -> usize {
        question.id.rem_euclid(count.max(1) as i64) as usize
    }
}

/// Config-file form of the built-in strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantChoice {
    #[default]
    First,
    Rotate,
    Index(usize),
}

impl VariantStrategy for VariantChoice {
    fn pick(&self, question: &Question, count: usize) -> usize {
        match *self {
            Self::First => FirstVariant.pick(question, count),
            Self::Rotate => RotateById.pick(question, count),
            Self::Index(n) => NthVariant(n).pick(question, count),
        }
    }
}

/// Platform-neutral metadata for one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishMetadata {
    pub question_id: QuestionId,
    pub caption: String,
    pub description: String,
    pub hashtags: Vec<String>,
}

impl PublishMetadata {
    /// Builds metadata using the default (first) caption and description.
    pub fn for_question(question: &Question) -> Self {
        Self::with_strategies(question, &FirstVariant, &FirstVariant)
    }

    pub fn with_strategies(
        question: &Question,
        captions: &dyn VariantStrategy,
        descriptions: &dyn VariantStrategy,
    ) -> Self {
        let caption = pick_variant(question, &question.captions, captions);
        let description = pick_variant(question, &question.descriptions, descriptions);
        debug!(id = question.id, %caption, "built publish metadata");
        Self {
            question_id: question.id,
            caption,
            description,
            hashtags: question.hashtags.clone(),
        }
    }

    /// Description followed by a blank line and the space-separated hashtags.
    pub fn full_description(&self) -> String {
        if self.hashtags.is_empty() {
            return self.description.clone();
        }
        format!("{}\n\n{}", self.description, self.hashtags.join(" "))
    }
}

fn pick_variant(question: &Question, variants: &[String], strategy: &dyn VariantStrategy) -> String {
    if variants.is_empty() {
        return String::new();
    }
    let idx = strategy.pick(question, variants.len()).min(variants.len() - 1);
    variants[idx].clone()
}

/// Spoiler-safe solution block: explanation first, then the answer, then a call to action.
pub fn solution_text(question: &Question) -> String {
    format!(
        "📝 Solution:\n{}\n\n✅ Correct Answer: {} ({})\n\nFollow for daily practice! 📚",
        question.explanation,
        question.answer,
        question.answer_text()
    )
}
