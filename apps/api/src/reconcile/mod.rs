// Parsed-data reconciliation: confidence-scored candidate fields from an
// uploaded resume, projected onto the section model as a batch of edits.
// Commit is all-or-nothing via the engine's apply_all.

pub mod merge;
pub mod models;

pub use merge::{reconcile, Reconciled};
pub use models::{ConfidenceBand, ParsedField, ParsedResume};
