//! # Protocol Document Tree
//!
//! Protocol messages travel as element trees. The bridge never parses or
//! renders the upstream text encoding itself; it only reads and rewrites
//! already-decoded trees.
//!
//! ## Paths
//!
//! Fields are addressed with `ElementPath` expressions:
//!
//! | Expression | Meaning |
//! |------------|---------|
//! | `CH/acctID` | child `CH`, then its child `acctID` |
//! | `/ThreeDSecure/Message/VERes` | anchored at the document root element |
//! | `Merchant/@id` | attribute `id` of child `Merchant` |
//!
//! Relative expressions are evaluated against a context element (normally the
//! message root). When several siblings share a step name, lookups return the
//! first match while visitors walk every match.

use crate::errors::PathError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A name/value attribute of an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// A node of the protocol document tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Element {
    /// Tag name.
    pub name: String,
    /// Attributes in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    /// Text content, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Child elements in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl Element {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder: set the text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: add or replace an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder: append a child element.
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child element.
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Text content, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Add or replace an attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    /// First child with the given tag name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First child with the given tag name, mutably.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// First child element regardless of name.
    pub fn first_child(&self) -> Option<&Element> {
        self.children.first()
    }

    /// Resolve the element part of `path` (any trailing attribute step is
    /// ignored). Absolute paths must start with this element's own name.
    pub fn resolve(&self, path: &ElementPath) -> Option<&Element> {
        let steps = path.relative_steps(&self.name)?;
        steps
            .iter()
            .try_fold(self, |current, step| current.child(step))
    }

    /// Mutable variant of [`Element::resolve`].
    pub fn resolve_mut(&mut self, path: &ElementPath) -> Option<&mut Element> {
        let steps: Vec<String> = path.relative_steps(&self.name)?.to_vec();
        let mut current = self;
        for step in &steps {
            current = current.child_mut(step)?;
        }
        Some(current)
    }

    /// Value addressed by `path`: the attribute for `@name` paths, otherwise
    /// the element's text.
    pub fn value_at(&self, path: &ElementPath) -> Option<&str> {
        let element = self.resolve(path)?;
        match path.attribute() {
            Some(attr) => element.attribute(attr),
            None => element.text(),
        }
    }

    /// Invoke `f` on every value addressed by `path`, walking every sibling
    /// that matches a step. Elements without text (or without the addressed
    /// attribute) are skipped. Returns the number of values visited.
    pub fn for_each_value_mut<F>(&mut self, path: &ElementPath, mut f: F) -> usize
    where
        F: FnMut(&mut String),
    {
        let Some(steps) = path.relative_steps(&self.name).map(<[String]>::to_vec) else {
            return 0;
        };
        let mut visited = 0;
        visit_values(self, &steps, path.attribute(), &mut f, &mut visited);
        visited
    }
}

fn visit_values<F>(
    element: &mut Element,
    steps: &[String],
    attribute: Option<&str>,
    f: &mut F,
    visited: &mut usize,
) where
    F: FnMut(&mut String),
{
    let Some((head, rest)) = steps.split_first() else {
        let value = match attribute {
            Some(name) => element
                .attributes
                .iter_mut()
                .find(|a| a.name == name)
                .map(|a| &mut a.value),
            None => element.text.as_mut(),
        };
        if let Some(value) = value {
            f(value);
            *visited += 1;
        }
        return;
    };

    for child in element.children.iter_mut().filter(|c| &c.name == head) {
        visit_values(child, rest, attribute, f, visited);
    }
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ElementPath {
    absolute: bool,
    steps: Vec<String>,
    attribute: Option<String>,
}

impl ElementPath {
    /// Parse a path expression.
    ///
    /// # Errors
    ///
    /// Returns `PathError` for empty expressions, empty steps and attribute
    /// steps that are not last.
    pub fn parse(expr: &str) -> Result<Self, PathError> {
        let trimmed = expr.trim();
        if trimmed.is_empty() || trimmed == "/" {
            return Err(PathError::Empty);
        }

        let absolute = trimmed.starts_with('/');
        let body = trimmed.trim_start_matches('/');
        let raw: Vec<&str> = body.split('/').collect();

        let mut steps = Vec::with_capacity(raw.len());
        let mut attribute = None;
        for (i, step) in raw.iter().enumerate() {
            let step = step.trim();
            if step.is_empty() {
                return Err(PathError::EmptyStep(expr.to_string()));
            }
            if let Some(name) = step.strip_prefix('@') {
                if i + 1 != raw.len() || name.is_empty() {
                    return Err(PathError::MisplacedAttribute(expr.to_string()));
                }
                attribute = Some(name.to_string());
            } else {
                steps.push(step.to_string());
            }
        }

        Ok(Self {
            absolute,
            steps,
            attribute,
        })
    }

    /// Element steps, excluding any attribute step.
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Trailing attribute name, if the path addresses an attribute.
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    /// Whether the path is anchored at the document root.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Last element step name (the addressed element's tag).
    pub fn leaf(&self) -> Option<&str> {
        self.steps.last().map(String::as_str)
    }

    /// Steps to walk from a context element named `context_name`. For
    /// absolute paths the first step must name the context element itself.
    fn relative_steps(&self, context_name: &str) -> Option<&[String]> {
        if !self.absolute {
            return Some(&self.steps);
        }
        match self.steps.split_first() {
            Some((first, rest)) if first == context_name => Some(rest),
            _ => None,
        }
    }
}

impl FromStr for ElementPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ElementPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ElementPath> for String {
    fn from(path: ElementPath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("/")?;
        }
        f.write_str(&self.steps.join("/"))?;
        if let Some(attr) = &self.attribute {
            if !self.steps.is_empty() {
                f.write_str("/")?;
            }
            write!(f, "@{attr}")?;
        }
        Ok(())
    }
}
