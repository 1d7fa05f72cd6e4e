//! Quiz question selection with a durable usage ledger, plus the pipeline
//! that renders, publishes, and records one question per run.
//!
//! # Examples
//!
//! Selecting and marking with an in-memory ledger:
//! ```
//! use quizreel::{
//!     core::{ledger::UsageLedger, selector::QuestionSelector, store::{QuestionStore, ValidationPolicy}},
//!     persist::MemorySink,
//! };
//!
//! let json = r##"[{
//!     "id": 7, "difficulty": "easy", "question": "2 + 2 = ?",
//!     "options": ["3", "4", "5", "22"], "answer": "B",
//!     "explanation": "Two plus two is four.",
//!     "captions": ["Quick maths"], "descriptions": ["Warm-up question"],
//!     "hashtags": ["#a", "#b", "#c", "#d", "#e"]
//! }]"##;
//! let store = QuestionStore::from_json_str("inline", json, ValidationPolicy::Strict).expect("store");
//! let mut ledger = UsageLedger::open(MemorySink::new()).expect("ledger");
//!
//! let id = QuestionSelector::new(&store, &ledger).select_next().expect("select").id;
//! assert_eq!(id, 7);
//! ledger.mark_used(id).expect("mark");
//! assert!(QuestionSelector::new(&store, &ledger).select_next().is_err());
//! ```
#![warn(missing_docs)]

/// Configuration file model.
pub mod config;
/// Store, ledger, and selector.
pub mod core;
/// Error taxonomy.
pub mod error;
/// Subscriber setup and log helpers.
pub mod logging;
/// Ledger persistence backends.
pub mod persist;
/// Single-run publishing pipeline.
pub mod pipeline;
/// Upload metadata and variant strategies.
pub mod publish;
/// Question record.
pub mod question;
/// Shared primitive types.
pub mod types;

pub use error::{Error, ErrorKind, Result};
