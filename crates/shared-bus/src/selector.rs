//! # Message Selectors
//!
//! Parses and evaluates the boolean filter expressions channels subscribe
//! with. Evaluation only looks at envelope header properties.
//!
//! ## Grammar
//!
//! ```text
//! selector := <empty> | or
//! or       := and ( "OR" and )*
//! and      := unary ( "AND" unary )*
//! unary    := "NOT" unary | primary
//! primary  := "(" or ")"
//!           | ident "=" literal
//!           | ident "<>" literal
//!           | ident [ "NOT" ] "IN" "(" literal ( "," literal )* ")"
//! literal  := "'" ( any char | "''" )* "'"
//! ```
//!
//! Keywords are case-insensitive. A comparison against a property the
//! message does not carry is false.

use shared_types::ProtocolMessage;
use std::fmt;
use thiserror::Error;

/// Errors from selector parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// A string literal was not closed.
    #[error("Unterminated string literal starting at {position}")]
    UnterminatedString { position: usize },

    /// A character that cannot start any token.
    #[error("Unexpected character '{found}' at {position}")]
    UnexpectedChar { position: usize, found: char },

    /// A token that does not fit the grammar at this point.
    #[error("Unexpected token '{found}' at {position}, expected {expected}")]
    UnexpectedToken {
        position: usize,
        found: String,
        expected: &'static str,
    },

    /// The expression ended early.
    #[error("Unexpected end of selector, expected {expected}")]
    UnexpectedEnd { expected: &'static str },
}

/// A parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Empty selector: every message matches.
    All,
    /// A boolean expression over header properties.
    Expr(Expr),
}

/// Boolean expression over header properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Or(Vec<Expr>),
    And(Vec<Expr>),
    Not(Box<Expr>),
    Eq { property: String, value: String },
    Ne { property: String, value: String },
    In { property: String, values: Vec<String>, negated: bool },
}

impl Selector {
    /// Parse a selector expression. Blank input yields `Selector::All`.
    ///
    /// # Errors
    ///
    /// Returns `SelectorError` if the expression does not follow the grammar.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Ok(Selector::All);
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_or()?;
        if let Some(extra) = parser.peek() {
            return Err(SelectorError::UnexpectedToken {
                position: extra.position,
                found: extra.kind.to_string(),
                expected: "end of selector",
            });
        }
        Ok(Selector::Expr(expr))
    }

    /// Whether `message` satisfies this selector.
    #[must_use]
    pub fn matches(&self, message: &ProtocolMessage) -> bool {
        match self {
            Selector::All => true,
            Selector::Expr(expr) => expr.evaluate(message),
        }
    }
}

impl Expr {
    /// Evaluate against a message's header properties.
    #[must_use]
    pub fn evaluate(&self, message: &ProtocolMessage) -> bool {
        match self {
            Expr::Or(terms) => terms.iter().any(|t| t.evaluate(message)),
            Expr::And(terms) => terms.iter().all(|t| t.evaluate(message)),
            Expr::Not(inner) => !inner.evaluate(message),
            Expr::Eq { property, value } => message.property(property) == Some(value.as_str()),
            Expr::Ne { property, value } => message
                .property(property)
                .is_some_and(|actual| actual != value.as_str()),
            Expr::In {
                property,
                values,
                negated,
            } => match message.property(property) {
                Some(actual) => values.iter().any(|v| v == actual) != *negated,
                None => false,
            },
        }
    }
}

// =============================================================================
// TOKENIZER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Ident(String),
    Literal(String),
    LParen,
    RParen,
    Comma,
    Eq,
    Ne,
    And,
    Or,
    Not,
    In,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => f.write_str(name),
            TokenKind::Literal(value) => write!(f, "'{value}'"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Eq => f.write_str("="),
            TokenKind::Ne => f.write_str("<>"),
            TokenKind::And => f.write_str("AND"),
            TokenKind::Or => f.write_str("OR"),
            TokenKind::Not => f.write_str("NOT"),
            TokenKind::In => f.write_str("IN"),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    position: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, SelectorError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;
        let kind = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '(' => {
                i += 1;
                TokenKind::LParen
            }
            ')' => {
                i += 1;
                TokenKind::RParen
            }
            ',' => {
                i += 1;
                TokenKind::Comma
            }
            '=' => {
                i += 1;
                TokenKind::Eq
            }
            '<' if chars.get(i + 1) == Some(&'>') => {
                i += 2;
                TokenKind::Ne
            }
            '\'' => {
                let mut value = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(SelectorError::UnterminatedString { position: start }),
                        Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                            value.push('\'');
                            i += 2;
                        }
                        Some('\'') => {
                            i += 1;
                            break;
                        }
                        Some(other) => {
                            value.push(*other);
                            i += 1;
                        }
                    }
                }
                TokenKind::Literal(value)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match word.to_ascii_uppercase().as_str() {
                    "AND" => TokenKind::And,
                    "OR" => TokenKind::Or,
                    "NOT" => TokenKind::Not,
                    "IN" => TokenKind::In,
                    _ => TokenKind::Ident(word),
                }
            }
            other => {
                return Err(SelectorError::UnexpectedChar {
                    position: start,
                    found: other,
                })
            }
        };
        tokens.push(Token {
            kind,
            position: start,
        });
    }

    Ok(tokens)
}

// =============================================================================
// PARSER
// =============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self, expected: &'static str) -> Result<Token, SelectorError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(SelectorError::UnexpectedEnd { expected })?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is_some_and(|t| &t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<(), SelectorError> {
        let token = self.next(expected)?;
        if token.kind == kind {
            Ok(())
        } else {
            Err(unexpected(&token, expected))
        }
    }

    fn parse_or(&mut self) -> Result<Expr, SelectorError> {
        let mut terms = vec![self.parse_and()?];
        while self.eat(&TokenKind::Or) {
            terms.push(self.parse_and()?);
        }
        Ok(collapse(terms, Expr::Or))
    }

    fn parse_and(&mut self) -> Result<Expr, SelectorError> {
        let mut terms = vec![self.parse_unary()?];
        while self.eat(&TokenKind::And) {
            terms.push(self.parse_unary()?);
        }
        Ok(collapse(terms, Expr::And))
    }

    fn parse_unary(&mut self) -> Result<Expr, SelectorError> {
        if self.eat(&TokenKind::Not) {
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, SelectorError> {
        let token = self.next("'(' or property name")?;
        match token.kind {
            TokenKind::LParen => {
                let inner = self.parse_or()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Ident(property) => self.parse_comparison(property),
            _ => Err(unexpected(&token, "'(' or property name")),
        }
    }

    fn parse_comparison(&mut self, property: String) -> Result<Expr, SelectorError> {
        let op = self.next("comparison operator")?;
        match op.kind {
            TokenKind::Eq => Ok(Expr::Eq {
                property,
                value: self.parse_literal()?,
            }),
            TokenKind::Ne => Ok(Expr::Ne {
                property,
                value: self.parse_literal()?,
            }),
            TokenKind::In => self.parse_in_list(property, false),
            TokenKind::Not => {
                self.expect(TokenKind::In, "IN")?;
                self.parse_in_list(property, true)
            }
            _ => Err(unexpected(&op, "comparison operator")),
        }
    }

    fn parse_in_list(&mut self, property: String, negated: bool) -> Result<Expr, SelectorError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut values = vec![self.parse_literal()?];
        while self.eat(&TokenKind::Comma) {
            values.push(self.parse_literal()?);
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Expr::In {
            property,
            values,
            negated,
        })
    }

    fn parse_literal(&mut self) -> Result<String, SelectorError> {
        let token = self.next("string literal")?;
        match token.kind {
            TokenKind::Literal(value) => Ok(value),
            _ => Err(unexpected(&token, "string literal")),
        }
    }
}

fn collapse(mut terms: Vec<Expr>, wrap: fn(Vec<Expr>) -> Expr) -> Expr {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        wrap(terms)
    }
}

fn unexpected(token: &Token, expected: &'static str) -> SelectorError {
    SelectorError::UnexpectedToken {
        position: token.position,
        found: token.kind.to_string(),
        expected,
    }
}
