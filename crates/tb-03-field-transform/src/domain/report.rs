//! # Transform Report
//!
//! Per-field failures collected while transforming one document. A failure
//! never aborts the document; the field keeps its previous value.

use super::errors::TransformError;
use std::fmt;

/// Which transform a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Mask,
    Encrypt,
    Decrypt,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Mask => f.write_str("mask"),
            Operation::Encrypt => f.write_str("encrypt"),
            Operation::Decrypt => f.write_str("decrypt"),
        }
    }
}

/// One field that could not be transformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    pub path: String,
    pub operation: Operation,
    pub error: TransformError,
}

/// Outcome of transforming one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    /// Values rewritten by mask, encrypt or decrypt.
    pub transformed: usize,
    failures: Vec<FieldFailure>,
}

impl TransformReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed field.
    pub fn record(&mut self, path: impl Into<String>, operation: Operation, error: TransformError) {
        self.failures.push(FieldFailure {
            path: path.into(),
            operation,
            error,
        });
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: TransformReport) {
        self.transformed += other.transformed;
        self.failures.extend(other.failures);
    }

    pub fn failures(&self) -> &[FieldFailure] {
        &self.failures
    }

    /// No field failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
