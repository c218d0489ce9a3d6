//! # Date Patterns
//!
//! Conventional date-format pattern letters. Runs of the same letter form a
//! field; the run length selects the width or the text style. Text in single
//! quotes is literal, `''` is a quote, and any other non-letter is copied.
//!
//! | Letter | Field | Letter | Field |
//! |--------|-------|--------|-------|
//! | `G` | era (`AD`/`BC`) | `a` | `AM`/`PM` |
//! | `y` | year (`yy` two digits) | `H` | hour 0-23 |
//! | `M` | month (`MMM` short, `MMMM` long name) | `k` | hour 1-24 |
//! | `d` | day of month | `K` | hour 0-11 |
//! | `D` | day of year | `h` | hour 1-12 |
//! | `E` | day name (`EEEE` long) | `m` | minute |
//! | `F` | day-of-week occurrence in month | `s` | second |
//! | `u` | ISO day number (Monday = 1) | `S` | millisecond |
//! | `z` | zone abbreviation (`zzzz` long name) | `Z` | `-0400` |
//! | `X` | `-04`, `-0400`, `-04:00` (`Z` at UTC) | | |
//!
//! Week-based letters (`w`, `W`, `Y`) are rejected.

use super::super::context::DisplayZone;
use super::super::errors::MaskError;
use chrono::{Datelike, NaiveDateTime, Timelike};

/// Layout of source timestamps.
pub const SOURCE_FORMAT: &str = "%Y%m%d %H:%M:%S";

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum DateToken {
    Literal(String),
    Field { letter: char, width: usize },
}

/// A parsed date pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    tokens: Vec<DateToken>,
}

impl DatePattern {
    /// Parse a pattern.
    ///
    /// # Errors
    ///
    /// Returns `MaskError` for unknown or unsupported letters and unclosed
    /// quotes.
    pub fn parse(pattern: &str) -> Result<Self, MaskError> {
        let chars: Vec<char> = pattern.chars().collect();
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c == '\'' {
                if chars.get(i + 1) == Some(&'\'') {
                    literal.push('\'');
                    i += 2;
                    continue;
                }
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
                        Some(other) => {
                            literal.push(*other);
                            i += 1;
                        }
                    }
                }
                continue;
            }

            if c.is_ascii_alphabetic() {
                check_letter(c)?;
                let mut width = 1;
                while chars.get(i + width) == Some(&c) {
                    width += 1;
                }
                if !literal.is_empty() {
                    tokens.push(DateToken::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(DateToken::Field { letter: c, width });
                i += width;
                continue;
            }

            literal.push(c);
            i += 1;
        }

        if !literal.is_empty() {
            tokens.push(DateToken::Literal(literal));
        }
        Ok(Self { tokens })
    }

    /// Render a `yyyyMMdd HH:mm:ss` value. The value is wall-clock time in
    /// `zone`.
    ///
    /// # Errors
    ///
    /// Returns `MaskError::InvalidDate` when the value does not parse.
    pub fn render(&self, value: &str, zone: &DisplayZone) -> Result<String, MaskError> {
        let timestamp = NaiveDateTime::parse_from_str(value.trim(), SOURCE_FORMAT)
            .map_err(|_| MaskError::InvalidDate(value.to_string()))?;

        let mut out = String::new();
        for token in &self.tokens {
            match token {
                DateToken::Literal(text) => out.push_str(text),
                DateToken::Field { letter, width } => {
                    out.push_str(&render_field(*letter, *width, &timestamp, zone));
                }
            }
        }
        Ok(out)
    }
}

fn check_letter(letter: char) -> Result<(), MaskError> {
    match letter {
        'G' | 'y' | 'M' | 'd' | 'D' | 'E' | 'F' | 'u' | 'a' | 'H' | 'k' | 'K' | 'h' | 'm'
        | 's' | 'S' | 'z' | 'Z' | 'X' => Ok(()),
        'w' | 'W' | 'Y' | 'L' => Err(MaskError::UnsupportedDateField(letter)),
        other => Err(MaskError::IllegalDateField(other)),
    }
}

fn pad(value: u32, width: usize) -> String {
    format!("{value:0width$}")
}

fn text(full: &str, width: usize) -> String {
    if width >= 4 {
        full.to_string()
    } else {
        full.chars().take(3).collect()
    }
}

fn render_field(letter: char, width: usize, ts: &NaiveDateTime, zone: &DisplayZone) -> String {
    let (ce, year_of_era) = ts.year_ce();
    match letter {
        'G' => if ce { "AD" } else { "BC" }.to_string(),
        'y' if width == 2 => pad(year_of_era % 100, 2),
        'y' => pad(year_of_era, width),
        'M' if width >= 3 => text(MONTHS[ts.month0() as usize], width),
        'M' => pad(ts.month(), width),
        'd' => pad(ts.day(), width),
        'D' => pad(ts.ordinal(), width),
        'E' => text(DAYS[ts.weekday().num_days_from_monday() as usize], width),
        'F' => pad((ts.day() - 1) / 7 + 1, width),
        'u' => pad(ts.weekday().number_from_monday(), width),
        'a' => if ts.hour() < 12 { "AM" } else { "PM" }.to_string(),
        'H' => pad(ts.hour(), width),
        'k' => pad(if ts.hour() == 0 { 24 } else { ts.hour() }, width),
        'K' => pad(ts.hour() % 12, width),
        'h' => pad(if ts.hour() % 12 == 0 { 12 } else { ts.hour() % 12 }, width),
        'm' => pad(ts.minute(), width),
        's' => pad(ts.second(), width),
        'S' => pad(ts.nanosecond() / 1_000_000, width),
        'z' if width >= 4 => zone.long_name(),
        'z' => zone.abbreviation().to_string(),
        'Z' => zone.offset_string(false),
        'X' if zone.offset_seconds() == 0 => "Z".to_string(),
        'X' => match width {
            1 => zone.offset_string(false)[..3].to_string(),
            2 => zone.offset_string(false),
            _ => zone.offset_string(true),
        },
        _ => String::new(),
    }
}
