//! # Mask Templates
//!
//! A template is tokenized once into `MaskToken`s and rendered against each
//! field value. Positional templates replace or copy runs of characters;
//! message templates mix literal text with `{0}`, `{date,...}` and
//! `{number,...}` placeholders.

pub mod date;
pub mod number;
pub mod positional;
pub mod tokenizer;

use super::context::MaskContext;
use super::errors::MaskError;
pub use date::DatePattern;
pub use number::NumberPattern;
pub use tokenizer::{MaskToken, RunLength};

/// A parsed mask template.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskTemplate {
    tokens: Vec<MaskToken>,
    positional: bool,
}

impl MaskTemplate {
    /// Parse a template.
    ///
    /// # Errors
    ///
    /// Returns `MaskError` describing the first syntax problem.
    pub fn parse(template: &str) -> Result<Self, MaskError> {
        let tokens = tokenizer::tokenize(template)?;
        let positional = tokenizer::is_positional(&tokens);
        Ok(Self { tokens, positional })
    }

    pub fn tokens(&self) -> &[MaskToken] {
        &self.tokens
    }

    #[must_use]
    pub fn is_positional(&self) -> bool {
        self.positional
    }

    /// Render the template against a field value.
    ///
    /// # Errors
    ///
    /// Returns `MaskError::InvalidDate` or `MaskError::InvalidNumber` when a
    /// placeholder cannot read the value.
    pub fn render(&self, value: &str, context: &MaskContext) -> Result<String, MaskError> {
        if self.positional {
            return Ok(positional::render(&self.tokens, value));
        }

        let mut out = String::new();
        for token in &self.tokens {
            match token {
                MaskToken::Literal(text) => out.push_str(text),
                MaskToken::Value => out.push_str(value),
                MaskToken::Date(pattern) => out.push_str(&pattern.render(value, &context.zone)?),
                MaskToken::Number(pattern) => {
                    out.push_str(&pattern.render(value, &context.currency_symbol)?);
                }
                MaskToken::Mask { .. } | MaskToken::Copy(_) | MaskToken::Skip(_) => {}
            }
        }
        Ok(out)
    }
}

/// Parse and render in one step.
///
/// # Errors
///
/// Returns any parse or render error.
pub fn apply_mask(template: &str, value: &str, context: &MaskContext) -> Result<String, MaskError> {
    MaskTemplate::parse(template)?.render(value, context)
}
