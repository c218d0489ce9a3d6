//! # Mask Tokenizer
//!
//! Splits a template into `MaskToken`s. Two template shapes exist:
//!
//! - **Positional**: the whole template is a run of `C{n}` tokens, e.g.
//!   `A{2}#{2}X{0}#{2}Y{1}`.
//! - **Message**: free text with `{...}` placeholders, e.g.
//!   `Paid {0,number,¤#,##0.00} on {date,dd MMM yyyy}`.
//!
//! Anything that is not entirely positional is read as a message template.

use super::date::DatePattern;
use super::number::NumberPattern;
use crate::domain::errors::MaskError;

/// Positional run character that copies source characters.
pub const COPY: char = '#';

/// Positional run character that skips source characters.
pub const SKIP: char = '>';

/// How many source characters a positional token spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLength {
    /// Exactly this many characters.
    Fixed(usize),
    /// Whatever the fixed tokens leave over (`{0}`).
    Fill,
}

/// One token of a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskToken {
    /// Text emitted verbatim.
    Literal(String),
    /// The raw field value (`{0}`).
    Value,
    /// The field value reformatted as a date.
    Date(DatePattern),
    /// The field value reformatted as a number.
    Number(NumberPattern),
    /// Emit `mask` once per consumed source character.
    Mask { mask: char, run: RunLength },
    /// Copy source characters.
    Copy(RunLength),
    /// Skip source characters.
    Skip(usize),
}

/// Tokenize a template.
///
/// # Errors
///
/// Returns `MaskError` for unclosed placeholders or quotes, unsupported
/// placeholder arguments or formats, and invalid date or number patterns.
pub fn tokenize(template: &str) -> Result<Vec<MaskToken>, MaskError> {
    match positional(template) {
        Some(tokens) => Ok(tokens),
        None => message(template),
    }
}

/// Whether the template is in positional form.
pub fn is_positional(tokens: &[MaskToken]) -> bool {
    !tokens.is_empty()
        && tokens.iter().all(|t| {
            matches!(
                t,
                MaskToken::Mask { .. } | MaskToken::Copy(_) | MaskToken::Skip(_)
            )
        })
}

/// Parse `C{n}C{n}...`; `None` when the template has any other shape.
fn positional(template: &str) -> Option<Vec<MaskToken>> {
    let chars: Vec<char> = template.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let run_char = chars[i];
        if run_char == '{' || run_char == '}' || chars.get(i + 1) != Some(&'{') {
            return None;
        }
        let close = chars[i + 2..].iter().position(|c| *c == '}')? + i + 2;
        let digits: String = chars[i + 2..close].iter().collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let count: usize = digits.parse().ok()?;
        let run = if count == 0 {
            RunLength::Fill
        } else {
            RunLength::Fixed(count)
        };

        tokens.push(match run_char {
            COPY => MaskToken::Copy(run),
            SKIP => MaskToken::Skip(count),
            mask => MaskToken::Mask { mask, run },
        });
        i = close + 1;
    }

    (!tokens.is_empty()).then_some(tokens)
}

fn message(template: &str) -> Result<Vec<MaskToken>, MaskError> {
    let chars: Vec<char> = template.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\'' if chars.get(i + 1) == Some(&'\'') => {
                literal.push('\'');
                i += 2;
            }
            '\'' => {
                let start = i;
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(MaskError::UnterminatedQuote { position: start }),
                        Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                            literal.push('\'');
                            i += 2;
                        }
                        Some('\'') => {
                            i += 1;
                            break;
                        }
                        Some(c) => {
                            literal.push(*c);
                            i += 1;
                        }
                    }
                }
            }
            '{' => {
                let close = placeholder_end(&chars, i)?;
                let body: String = chars[i + 1..close].iter().collect();
                if !literal.is_empty() {
                    tokens.push(MaskToken::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(placeholder(&body, i)?);
                i = close + 1;
            }
            c => {
                literal.push(c);
                i += 1;
            }
        }
    }

    if !literal.is_empty() {
        tokens.push(MaskToken::Literal(literal));
    }
    Ok(tokens)
}

/// Index of the `}` closing the placeholder opened at `open`. Quoted text
/// inside the placeholder may contain braces.
fn placeholder_end(chars: &[char], open: usize) -> Result<usize, MaskError> {
    let mut quoted = false;
    let mut depth = 0usize;
    for (offset, c) in chars[open + 1..].iter().enumerate() {
        match c {
            '\'' => quoted = !quoted,
            '{' if !quoted => depth += 1,
            '}' if !quoted && depth == 0 => return Ok(open + 1 + offset),
            '}' if !quoted => depth -= 1,
            _ => {}
        }
    }
    Err(MaskError::UnclosedPlaceholder { position: open })
}

/// `0`, `0,date,PAT`, `date,PAT`, `0,number,PAT` or `number,PAT`.
fn placeholder(body: &str, position: usize) -> Result<MaskToken, MaskError> {
    if body.trim().is_empty() {
        return Err(MaskError::EmptyPlaceholder { position });
    }

    let (head, rest) = match body.split_once(',') {
        Some((head, rest)) => (head.trim(), Some(rest)),
        None => (body.trim(), None),
    };

    let (format, pattern) = if head.chars().all(|c| c.is_ascii_digit()) {
        if head != "0" {
            return Err(MaskError::UnsupportedArgument(head.to_string()));
        }
        let Some(rest) = rest else {
            return Ok(MaskToken::Value);
        };
        match rest.split_once(',') {
            Some((format, pattern)) => (format.trim(), Some(pattern)),
            None => (rest.trim(), None),
        }
    } else {
        (head, rest)
    };

    match format {
        "date" => {
            let pattern = pattern.ok_or(MaskError::MissingPattern("date"))?;
            Ok(MaskToken::Date(DatePattern::parse(pattern)?))
        }
        "number" => {
            let pattern = pattern.ok_or(MaskError::MissingPattern("number"))?;
            Ok(MaskToken::Number(NumberPattern::parse(pattern.trim())?))
        }
        other => Err(MaskError::UnknownFormat(other.to_string())),
    }
}
