//! # Positional Masks
//!
//! Walks the tokens left to right, consuming source characters as it goes.
//! The first fill token spans `len - sum(fixed runs)` characters; later fill
//! tokens span nothing. Characters left over after the last token are
//! dropped, and runs past the end of the value stop at the end.

use super::tokenizer::{MaskToken, RunLength};

/// Render positional tokens against a value.
pub fn render(tokens: &[MaskToken], value: &str) -> String {
    let source: Vec<char> = value.chars().collect();

    let fixed: usize = tokens
        .iter()
        .map(|t| match t {
            MaskToken::Mask {
                run: RunLength::Fixed(n),
                ..
            }
            | MaskToken::Copy(RunLength::Fixed(n))
            | MaskToken::Skip(n) => *n,
            _ => 0,
        })
        .sum();
    let mut fill = Some(source.len().saturating_sub(fixed));

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;

    for token in tokens {
        let span = |run: &RunLength, fill: &mut Option<usize>| match run {
            RunLength::Fixed(n) => *n,
            RunLength::Fill => fill.take().unwrap_or(0),
        };

        match token {
            MaskToken::Mask { mask, run } => {
                let n = span(run, &mut fill).min(source.len() - cursor);
                out.extend(std::iter::repeat(*mask).take(n));
                cursor += n;
            }
            MaskToken::Copy(run) => {
                let n = span(run, &mut fill).min(source.len() - cursor);
                out.extend(&source[cursor..cursor + n]);
                cursor += n;
            }
            MaskToken::Skip(n) => {
                cursor += (*n).min(source.len() - cursor);
            }
            MaskToken::Literal(_) | MaskToken::Value | MaskToken::Date(_) | MaskToken::Number(_) => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::super::tokenizer::tokenize;
    use super::*;
    use proptest::prelude::*;

    fn mask(template: &str, value: &str) -> String {
        render(&tokenize(template).unwrap(), value)
    }

    #[test]
    fn test_fill_then_copy() {
        assert_eq!(mask("Y{0}#{4}", "0000000000000000"), "YYYYYYYYYYYY0000");
        assert_eq!(mask("Y{0}#{4}", "4111111111111111"), "YYYYYYYYYYYY1111");
    }

    #[test]
    fn test_compound() {
        assert_eq!(mask("A{2}#{2}X{0}#{2}Y{1}", "0124456789"), "AA24XXX78Y");
    }

    #[test]
    fn test_copy_fill_and_skip() {
        assert_eq!(mask("#{6}X{0}#{4}", "4000123412341234"), "400012XXXXXX1234");
        assert_eq!(mask(">{2}#{0}", "0012345"), "12345");
        assert_eq!(mask("#{2}>{4}#{2}", "ab----cd"), "abcd");
    }

    #[test]
    fn test_only_first_fill_spans() {
        assert_eq!(mask("X{0}Y{0}#{2}", "123456"), "XXXX56");
    }

    #[test]
    fn test_short_and_long_values() {
        assert_eq!(mask("Y{0}#{4}", "12"), "12");
        assert_eq!(mask("#{2}X{4}", "123"), "12X");
        assert_eq!(mask("#{2}", "123456"), "12");
        assert_eq!(mask("Y{0}", ""), "");
    }

    proptest! {
        #[test]
        fn prop_pan_mask_keeps_length_and_last_four(pan in "[0-9]{4,19}") {
            let out = mask("Y{0}#{4}", &pan);
            let split = pan.len() - 4;

            prop_assert_eq!(out.len(), pan.len());
            prop_assert!(out[..split].chars().all(|c| c == 'Y'));
            prop_assert_eq!(&out[split..], &pan[split..]);
        }
    }
}
