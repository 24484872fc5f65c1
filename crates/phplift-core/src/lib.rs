//! phplift-core: Core abstractions for textual PHP rewriting
//!
//! This crate provides:
//! - `Edit`: A byte-range code modification
//! - `apply_edits()`: Function to apply non-overlapping edits in one pass

mod edit;

pub use edit::{apply_edits, Edit, EditError};
