//! # Mask Context
//!
//! Locale-like settings that mask rendering depends on: the zone timestamps
//! are displayed in and the currency symbol number patterns print for `¤`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default currency symbol.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// A `TB_DISPLAY_ZONE` value that does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid display zone '{0}', expected UTC or NAME±HH:MM")]
pub struct ZoneParseError(pub String);

/// Zone that source timestamps are read in and rendered with.
///
/// Written as `UTC`, `GMT` or `NAME±HH:MM` (for example `EDT-04:00`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayZone {
    abbreviation: String,
    offset_seconds: i32,
}

impl DisplayZone {
    /// Coordinated Universal Time.
    pub fn utc() -> Self {
        Self {
            abbreviation: "UTC".to_string(),
            offset_seconds: 0,
        }
    }

    /// A named fixed offset from UTC.
    ///
    /// # Errors
    ///
    /// Returns `ZoneParseError` for an empty name or an offset of a day or
    /// more.
    pub fn fixed(abbreviation: impl Into<String>, offset_seconds: i32) -> Result<Self, ZoneParseError> {
        let abbreviation = abbreviation.into();
        if abbreviation.trim().is_empty() || offset_seconds.abs() >= 86_400 {
            return Err(ZoneParseError(format!("{abbreviation}{offset_seconds}")));
        }
        Ok(Self {
            abbreviation,
            offset_seconds,
        })
    }

    /// Short name rendered by `z`.
    pub fn abbreviation(&self) -> &str {
        &self.abbreviation
    }

    /// Long name rendered by `zzzz`. Well-known abbreviations map to their
    /// names, others fall back to `GMT±HH:MM`.
    pub fn long_name(&self) -> String {
        let known = match self.abbreviation.as_str() {
            "UTC" => Some("Coordinated Universal Time"),
            "GMT" => Some("Greenwich Mean Time"),
            "EST" => Some("Eastern Standard Time"),
            "EDT" => Some("Eastern Daylight Time"),
            "CST" => Some("Central Standard Time"),
            "CDT" => Some("Central Daylight Time"),
            "MST" => Some("Mountain Standard Time"),
            "MDT" => Some("Mountain Daylight Time"),
            "PST" => Some("Pacific Standard Time"),
            "PDT" => Some("Pacific Daylight Time"),
            "CET" => Some("Central European Time"),
            "CEST" => Some("Central European Summer Time"),
            _ => None,
        };
        match known {
            Some(name) => name.to_string(),
            None => format!("GMT{}", self.offset_string(true)),
        }
    }

    /// Offset from UTC in seconds.
    pub fn offset_seconds(&self) -> i32 {
        self.offset_seconds
    }

    /// `±HHMM`, or `±HH:MM` with `colon`.
    pub fn offset_string(&self, colon: bool) -> String {
        let sign = if self.offset_seconds < 0 { '-' } else { '+' };
        let minutes = self.offset_seconds.abs() / 60;
        let (hours, minutes) = (minutes / 60, minutes % 60);
        if colon {
            format!("{sign}{hours:02}:{minutes:02}")
        } else {
            format!("{sign}{hours:02}{minutes:02}")
        }
    }
}

impl Default for DisplayZone {
    fn default() -> Self {
        Self::utc()
    }
}

impl FromStr for DisplayZone {
    type Err = ZoneParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.eq_ignore_ascii_case("UTC") || text.eq_ignore_ascii_case("GMT") || text == "Z" {
            let mut zone = Self::utc();
            if text.eq_ignore_ascii_case("GMT") {
                zone.abbreviation = "GMT".to_string();
            }
            return Ok(zone);
        }

        let invalid = || ZoneParseError(s.to_string());
        let split = text.find(['+', '-']).ok_or_else(invalid)?;
        let (name, offset) = text.split_at(split);
        let negative = offset.starts_with('-');
        let (hours, minutes) = offset[1..].split_once(':').ok_or_else(invalid)?;
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if hours > 23 || minutes > 59 {
            return Err(invalid());
        }

        let seconds = (hours * 60 + minutes) * 60;
        Self::fixed(name, if negative { -seconds } else { seconds }).map_err(|_| invalid())
    }
}

impl TryFrom<String> for DisplayZone {
    type Error = ZoneParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DisplayZone> for String {
    fn from(zone: DisplayZone) -> Self {
        zone.to_string()
    }
}

impl fmt::Display for DisplayZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.offset_seconds == 0 && (self.abbreviation == "UTC" || self.abbreviation == "GMT") {
            f.write_str(&self.abbreviation)
        } else {
            write!(f, "{}{}", self.abbreviation, self.offset_string(true))
        }
    }
}

/// Settings shared by every mask a transformer renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskContext {
    pub zone: DisplayZone,
    pub currency_symbol: String,
}

impl MaskContext {
    pub fn new(zone: DisplayZone, currency_symbol: impl Into<String>) -> Self {
        Self {
            zone,
            currency_symbol: currency_symbol.into(),
        }
    }
}

impl Default for MaskContext {
    fn default() -> Self {
        Self::new(DisplayZone::utc(), DEFAULT_CURRENCY_SYMBOL)
    }
}
