//! Question record as published by the pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{AnswerKey, OPTION_COUNT, QuestionId};

/// Fully validated, self-contained quiz question plus its publishing metadata.
///
/// Records are only produced by [`crate::core::store::QuestionStore`] loading
/// or by [`crate::core::validate::validate_record`], so every invariant
/// (four options, a valid answer key, non-empty variants, bounded hashtags)
/// already holds when a downstream stage sees one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier.
    pub id: QuestionId,
    /// Difficulty tag; an open set used for grouping only.
    pub difficulty: String,
    /// Question text.
    pub question: String,
    /// Answer choices in display order.
    pub options: [String; OPTION_COUNT],
    /// Correct option.
    pub answer: AnswerKey,
    /// Explanation shown after the answer.
    pub explanation: String,
    /// Caption variants; the first is the default.
    pub captions: Vec<String>,
    /// Description variants; the first is the default.
    pub descriptions: Vec<String>,
    /// Hashtags appended to upload metadata.
    pub hashtags: Vec<String>,
    /// Fields the pipeline does not interpret, kept so exports match the input shape.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Question {
    /// Text of the correct option.
    pub fn answer_text(&self) -> &str {
        &self.options[self.answer.index()]
    }

    /// Default caption variant.
    pub fn default_caption(&self) -> &str {
        self.captions.first().map(String::as_str).unwrap_or_default()
    }

    /// Default description variant.
    pub fn default_description(&self) -> &str {
        self.descriptions.first().map(String::as_str).unwrap_or_default()
    }
}
