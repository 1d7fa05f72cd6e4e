//! Question store, usage ledger, and selection.

/// Usage ledger over a persistence sink.
pub mod ledger;
/// Next-question selection and usage statistics.
pub mod selector;
/// Validated, document-ordered question store.
pub mod store;
/// Per-record schema validation.
pub mod validate;
