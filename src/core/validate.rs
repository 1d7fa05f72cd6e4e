//! Schema check applied once per record at load time.

use std::fmt;

use hashbrown::HashSet;
use serde_json::{Map, Value};

use crate::{
    question::Question,
    types::{AnswerKey, MAX_HASHTAGS, MIN_HASHTAGS, OPTION_COUNT, QuestionId},
};

/// Fields every record must carry, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 9] = [
    "id",
    "difficulty",
    "question",
    "options",
    "answer",
    "explanation",
    "captions",
    "descriptions",
    "hashtags",
];

/// A record that breaks a schema invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Position in the source document.
    pub index: usize,
    /// Record id, when it could be read.
    pub id: Option<QuestionId>,
    /// Offending field.
    pub field: &'static str,
    /// Violated invariant.
    pub reason: String,
}

impl ValidationError {
    fn new(index: usize, id: Option<QuestionId>, field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            index,
            id,
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(
                f,
                "question id {id} (record #{}): field `{}` {}",
                self.index, self.field, self.reason
            ),
            None => write!(
                f,
                "question at record #{} (id unknown): field `{}` {}",
                self.index, self.field, self.reason
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Checks one raw record and converts it into a [`Question`].
pub fn validate_record(index: usize, value: Value) -> Result<Question, ValidationError> {
    let Value::Object(mut map) = value else {
        return Err(ValidationError::new(index, None, "record", "must be a JSON object"));
    };

    let id = map.get("id").and_then(Value::as_i64);
    let fail = |field: &'static str, reason: String| ValidationError::new(index, id, field, reason);

    for field in REQUIRED_FIELDS {
        if !map.contains_key(field) {
            return Err(fail(field, "is missing".to_string()));
        }
    }
    let Some(id) = id else {
        return Err(fail("id", "must be an integer".to_string()));
    };

    let difficulty = take_text(&mut map, "difficulty").map_err(|r| fail("difficulty", r))?;
    let question = take_text(&mut map, "question").map_err(|r| fail("question", r))?;
    let explanation = take_text(&mut map, "explanation").map_err(|r| fail("explanation", r))?;

    let options = take_text_list(&mut map, "options").map_err(|r| fail("options", r))?;
    if options.len() != OPTION_COUNT {
        return Err(fail(
            "options",
            format!("must have exactly {OPTION_COUNT} items, found {}", options.len()),
        ));
    }
    let dup = {
        let mut seen = HashSet::new();
        options.iter().find(|o| !seen.insert(o.as_str())).cloned()
    };
    if let Some(dup) = dup {
        return Err(fail("options", format!("must be distinct, `{dup}` appears twice")));
    }
    let options: [String; OPTION_COUNT] = options
        .try_into()
        .map_err(|_| fail("options", format!("must have exactly {OPTION_COUNT} items")))?;

    let answer = match map.remove("answer") {
        Some(Value::String(s)) => AnswerKey::parse(&s)
            .ok_or_else(|| fail("answer", format!("must be A, B, C, or D, found `{s}`")))?,
        _ => return Err(fail("answer", "must be A, B, C, or D".to_string())),
    };

    let captions = take_text_list(&mut map, "captions").map_err(|r| fail("captions", r))?;
    if captions.is_empty() {
        return Err(fail("captions", "must be a non-empty array".to_string()));
    }
    let descriptions = take_text_list(&mut map, "descriptions").map_err(|r| fail("descriptions", r))?;
    if descriptions.is_empty() {
        return Err(fail("descriptions", "must be a non-empty array".to_string()));
    }

    let hashtags = take_text_list(&mut map, "hashtags").map_err(|r| fail("hashtags", r))?;
    if !(MIN_HASHTAGS..=MAX_HASHTAGS).contains(&hashtags.len()) {
        return Err(fail(
            "hashtags",
            format!(
                "must have between {MIN_HASHTAGS} and {MAX_HASHTAGS} items, found {}",
                hashtags.len()
            ),
        ));
    }

    map.remove("id");

    Ok(Question {
        id,
        difficulty,
        question,
        options,
        answer,
        explanation,
        captions,
        descriptions,
        hashtags,
        extra: map,
    })
}

fn take_text(map: &mut Map<String, Value>, field: &str) -> Result<String, String> {
    match map.remove(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(Value::String(_)) => Err("must not be empty".to_string()),
        _ => Err("must be a string".to_string()),
    }
}

fn take_text_list(map: &mut Map<String, Value>, field: &str) -> Result<Vec<String>, String> {
    let Some(Value::Array(items)) = map.remove(field) else {
        return Err("must be an array of strings".to_string());
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) if !s.trim().is_empty() => Ok(s),
            Value::String(_) => Err(format!("item {i} must not be empty")),
            _ => Err(format!("item {i} must be a string")),
        })
        .collect()
}
