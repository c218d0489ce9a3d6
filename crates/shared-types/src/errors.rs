//! # Error Types
//!
//! Errors raised while handling shared types.

use thiserror::Error;

/// Errors raised while parsing an element path expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The expression contained no steps.
    #[error("Empty path expression")]
    Empty,

    /// A step between two separators was empty (e.g. `a//b`).
    #[error("Empty step in path expression: {0}")]
    EmptyStep(String),

    /// An attribute step (`@name`) appeared before the last step.
    #[error("Attribute step must be last in path expression: {0}")]
    MisplacedAttribute(String),
}
