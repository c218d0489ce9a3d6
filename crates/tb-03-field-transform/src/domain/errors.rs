//! # Domain Errors
//!
//! Mask template errors and per-field transform failures.

use thiserror::Error;

/// Errors from parsing or rendering a mask template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaskError {
    /// A `{` without its closing `}`.
    #[error("Unclosed placeholder starting at {position}")]
    UnclosedPlaceholder { position: usize },

    /// A quoted section without its closing quote.
    #[error("Unterminated quote starting at {position}")]
    UnterminatedQuote { position: usize },

    /// `{}` or a placeholder with only whitespace.
    #[error("Empty placeholder at {position}")]
    EmptyPlaceholder { position: usize },

    /// Placeholders may only refer to argument 0, the field value.
    #[error("Unsupported placeholder argument '{0}'")]
    UnsupportedArgument(String),

    /// A placeholder format other than `date` or `number`.
    #[error("Unknown placeholder format '{0}'")]
    UnknownFormat(String),

    /// `{date}` or `{number}` without a pattern.
    #[error("Missing pattern for {0} placeholder")]
    MissingPattern(&'static str),

    /// A date pattern letter that is recognised but not supported.
    #[error("Unsupported date pattern letter '{0}'")]
    UnsupportedDateField(char),

    /// A date pattern letter with no meaning.
    #[error("Illegal date pattern letter '{0}'")]
    IllegalDateField(char),

    /// A number pattern that cannot be interpreted.
    #[error("Invalid number pattern '{0}'")]
    InvalidNumberPattern(String),

    /// A positional run length that is not a number.
    #[error("Invalid run length in positional mask at {position}")]
    InvalidRunLength { position: usize },

    /// The field value is not a `yyyyMMdd HH:mm:ss` timestamp.
    #[error("Value '{0}' is not a yyyyMMdd HH:mm:ss timestamp")]
    InvalidDate(String),

    /// The field value is not a decimal number.
    #[error("Value '{0}' is not a decimal number")]
    InvalidNumber(String),
}

/// Why a single field could not be transformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The mask template failed to parse or render.
    #[error("Mask failed: {0}")]
    Mask(#[from] MaskError),

    /// The encryption capability rejected the value.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// The encryption capability could not decrypt the value.
    #[error("Decryption failed: {0}")]
    Decryption(String),
}
