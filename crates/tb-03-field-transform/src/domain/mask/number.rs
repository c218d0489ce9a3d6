//! # Number Patterns
//!
//! Decimal patterns in the conventional `prefix #,##0.00 suffix` shape.
//!
//! - `0` is a required digit, `#` an optional one
//! - `,` groups the integer part; the group size is the digit count after
//!   the last `,`
//! - `.` separates the fraction; `0`s after it set the minimum fraction
//!   digits, `0`s and `#`s together the maximum
//! - `¤` in a prefix or suffix prints the currency symbol, `%` multiplies the
//!   value by 100
//! - text in single quotes is literal; anything after `;` is ignored
//!
//! Values are handled as digit strings and rounded half-even, so large
//! amounts never lose precision.

use super::super::errors::MaskError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Affix {
    Literal(String),
    Currency,
}

/// A parsed number pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberPattern {
    prefix: Vec<Affix>,
    suffix: Vec<Affix>,
    min_integer: usize,
    min_fraction: usize,
    max_fraction: usize,
    grouping: Option<usize>,
    percent: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Prefix,
    Number,
    Suffix,
}

impl NumberPattern {
    /// Parse a pattern.
    ///
    /// # Errors
    ///
    /// Returns `MaskError::InvalidNumberPattern` when the pattern has no digit
    /// placeholders, splits its digits around text, misplaces `,` or repeats
    /// `.`, and `MaskError::UnterminatedQuote` for an unclosed quote.
    pub fn parse(pattern: &str) -> Result<Self, MaskError> {
        let invalid = || MaskError::InvalidNumberPattern(pattern.to_string());
        let chars: Vec<char> = pattern.chars().collect();

        let mut prefix = Vec::new();
        let mut suffix = Vec::new();
        let mut number = String::new();
        let mut percent = false;
        let mut phase = Phase::Prefix;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c == ';' {
                break;
            }

            if matches!(c, '#' | '0' | ',' | '.') {
                match phase {
                    Phase::Prefix | Phase::Number => {
                        phase = Phase::Number;
                        number.push(c);
                        i += 1;
                        continue;
                    }
                    Phase::Suffix => return Err(invalid()),
                }
            }

            if phase == Phase::Number {
                phase = Phase::Suffix;
            }
            let affix = if phase == Phase::Prefix {
                &mut prefix
            } else {
                &mut suffix
            };

            match c {
                '\'' => {
                    let (literal, next) = quoted(&chars, i)?;
                    push_literal(affix, &literal);
                    i = next;
                    continue;
                }
                '¤' => affix.push(Affix::Currency),
                '%' => {
                    percent = true;
                    push_literal(affix, "%");
                }
                other => push_literal(affix, &other.to_string()),
            }
            i += 1;
        }

        let (integer, fraction) = match number.split_once('.') {
            Some((integer, fraction)) => (integer, fraction),
            None => (number.as_str(), ""),
        };
        if fraction.contains(['.', ',']) || !number.contains(['#', '0']) {
            return Err(invalid());
        }

        let grouping = match integer.rfind(',') {
            Some(last) => {
                let size = integer[last + 1..].len();
                if size == 0 {
                    return Err(invalid());
                }
                Some(size)
            }
            None => None,
        };

        Ok(Self {
            prefix,
            suffix,
            min_integer: integer.matches('0').count(),
            min_fraction: fraction.matches('0').count(),
            max_fraction: fraction.len(),
            grouping,
            percent,
        })
    }

    /// Render a decimal string.
    ///
    /// # Errors
    ///
    /// Returns `MaskError::InvalidNumber` when the value is not a plain
    /// decimal (`-1234.5`, `+7`, `.25`).
    pub fn render(&self, value: &str, currency_symbol: &str) -> Result<String, MaskError> {
        let (negative, mut integer, mut fraction) =
            split_decimal(value).ok_or_else(|| MaskError::InvalidNumber(value.to_string()))?;

        if self.percent {
            while fraction.len() < 2 {
                fraction.push(0);
            }
            integer.extend(fraction.drain(..2));
        }

        round_half_even(&mut integer, &mut fraction, self.max_fraction);

        while fraction.len() > self.min_fraction && fraction.last() == Some(&0) {
            fraction.pop();
        }
        while fraction.len() < self.min_fraction {
            fraction.push(0);
        }

        let first_significant = integer.iter().position(|d| *d != 0).unwrap_or(integer.len());
        integer.drain(..first_significant);
        let zero = integer.is_empty() && fraction.iter().all(|d| *d == 0);

        let mut integer_text: String = integer.iter().map(|d| char::from(b'0' + d)).collect();
        let floor = if fraction.is_empty() {
            self.min_integer.max(1)
        } else {
            self.min_integer
        };
        while integer_text.len() < floor {
            integer_text.insert(0, '0');
        }
        if let Some(size) = self.grouping {
            integer_text = group(&integer_text, size);
        }

        let mut out = String::new();
        if negative && !zero {
            out.push('-');
        }
        render_affix(&mut out, &self.prefix, currency_symbol);
        out.push_str(&integer_text);
        if !fraction.is_empty() {
            out.push('.');
            out.extend(fraction.iter().map(|d| char::from(b'0' + d)));
        }
        render_affix(&mut out, &self.suffix, currency_symbol);
        Ok(out)
    }
}

fn quoted(chars: &[char], start: usize) -> Result<(String, usize), MaskError> {
    if chars.get(start + 1) == Some(&'\'') {
        return Ok(("'".to_string(), start + 2));
    }
    let mut literal = String::new();
    let mut i = start + 1;
    loop {
        match chars.get(i) {
            None => return Err(MaskError::UnterminatedQuote { position: start }),
            Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                literal.push('\'');
                i += 2;
            }
            Some('\'') => return Ok((literal, i + 1)),
            Some(c) => {
                literal.push(*c);
                i += 1;
            }
        }
    }
}

fn push_literal(affix: &mut Vec<Affix>, text: &str) {
    if let Some(Affix::Literal(existing)) = affix.last_mut() {
        existing.push_str(text);
    } else {
        affix.push(Affix::Literal(text.to_string()));
    }
}

fn render_affix(out: &mut String, affix: &[Affix], currency_symbol: &str) {
    for part in affix {
        match part {
            Affix::Literal(text) => out.push_str(text),
            Affix::Currency => out.push_str(currency_symbol),
        }
    }
}

/// `(negative, integer digits, fraction digits)` of a plain decimal.
fn split_decimal(value: &str) -> Option<(bool, Vec<u8>, Vec<u8>)> {
    let text = value.trim();
    let (negative, unsigned) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if integer.is_empty() && fraction.is_empty() {
        return None;
    }
    let digits = |s: &str| -> Option<Vec<u8>> {
        s.bytes()
            .map(|b| b.is_ascii_digit().then(|| b - b'0'))
            .collect()
    };
    Some((negative, digits(integer)?, digits(fraction)?))
}

fn round_half_even(integer: &mut Vec<u8>, fraction: &mut Vec<u8>, scale: usize) {
    if fraction.len() <= scale {
        return;
    }
    let dropped = fraction.split_off(scale);
    let first = dropped[0];
    let rest_nonzero = dropped[1..].iter().any(|d| *d != 0);
    let last_kept = fraction.last().or(integer.last()).copied().unwrap_or(0);

    let round_up = first > 5 || (first == 5 && (rest_nonzero || last_kept % 2 == 1));
    if !round_up {
        return;
    }

    for digit in fraction.iter_mut().rev() {
        if *digit == 9 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
    for digit in integer.iter_mut().rev() {
        if *digit == 9 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
    integer.insert(0, 1);
}

fn group(digits: &str, size: usize) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / size);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % size == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(pattern: &str, value: &str) -> String {
        NumberPattern::parse(pattern).unwrap().render(value, "$").unwrap()
    }

    #[test]
    fn test_currency_grouping() {
        assert_eq!(render("¤#,##0.00", "1234567.891"), "$1,234,567.89");
        assert_eq!(render("¤#,##0.00", "-12.5"), "-$12.50");
        assert_eq!(render("#,##0", "999"), "999");
        assert_eq!(render("#,####", "123456789"), "1,2345,6789");
        assert_eq!(
            NumberPattern::parse("#,##0.00 ¤").unwrap().render("1000", "EUR").unwrap(),
            "1,000.00 EUR"
        );
    }

    #[test]
    fn test_half_even_rounding() {
        assert_eq!(render("0.00", "0.125"), "0.12");
        assert_eq!(render("0.00", "0.135"), "0.14");
        assert_eq!(render("0.00", "0.1251"), "0.13");
        assert_eq!(render("#", "2.5"), "2");
        assert_eq!(render("#", "3.5"), "4");
        assert_eq!(render("0.0", "9.96"), "10.0");
        assert_eq!(render("0", "-0.4"), "0");
    }

    #[test]
    fn test_digit_counts() {
        assert_eq!(render("000000", "42"), "000042");
        assert_eq!(render("#.##", "0.5"), ".5");
        assert_eq!(render("#.##", "0"), "0");
        assert_eq!(render("0.###", "1.5000"), "1.5");
        assert_eq!(render("0.00", "7"), "7.00");
        assert_eq!(
            render("#,##0.00", "123456789012345678901234.5"),
            "123,456,789,012,345,678,901,234.50"
        );
    }

    #[test]
    fn test_percent_and_literals() {
        assert_eq!(render("0.###%", "0.12345"), "12.345%");
        assert_eq!(render("0%", "1"), "100%");
        assert_eq!(render("'#'0", "5"), "#5");
        assert_eq!(render("0.00 'USD'", "3"), "3.00 USD");
        assert_eq!(render("0.00;(0.00)", "3"), "3.00");
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(
            NumberPattern::parse("abc"),
            Err(MaskError::InvalidNumberPattern(_))
        ));
        assert!(matches!(
            NumberPattern::parse("0 x 0"),
            Err(MaskError::InvalidNumberPattern(_))
        ));
        assert!(matches!(
            NumberPattern::parse("#,.00"),
            Err(MaskError::InvalidNumberPattern(_))
        ));
        assert!(matches!(
            NumberPattern::parse("0.0.0"),
            Err(MaskError::InvalidNumberPattern(_))
        ));

        let pattern = NumberPattern::parse("0.00").unwrap();
        for bad in ["", "-", "12a", "1.2.3", "."] {
            assert!(matches!(
                pattern.render(bad, "$"),
                Err(MaskError::InvalidNumber(_))
            ));
        }
    }
}
