//! Minimal element selectors: `tag`, `[attr]`, `[attr=value]` and combinations

use std::fmt;
use std::str::FromStr;

use crate::error::DomError;

/// One attribute condition inside a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeMatch {
    /// `[name]`
    Present(String),
    /// `[name=value]`
    Equals(String, String),
}

impl AttributeMatch {
    /// Attribute name the condition inspects
    pub fn name(&self) -> &str {
        match self {
            AttributeMatch::Present(name) | AttributeMatch::Equals(name, _) => name,
        }
    }
}

/// A compound selector matched against a single element.
///
/// # Example
///
/// ```
/// use resumable::Selector;
///
/// let sel: Selector = r#"button[q\:id="a b"][disabled]"#.parse().unwrap();
/// assert_eq!(sel.tag(), Some("button"));
/// assert_eq!(sel.attributes().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    attributes: Vec<AttributeMatch>,
}

impl Selector {
    /// Selector matching elements with the given tag name
    pub fn tag_name(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            attributes: Vec::new(),
        }
    }

    /// Selector matching elements carrying `name`
    pub fn has_attribute(name: impl Into<String>) -> Self {
        Self::default().and_has_attribute(name)
    }

    /// Selector matching elements whose `name` equals `value`
    pub fn attribute_eq(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::default().and_attribute_eq(name, value)
    }

    /// Add an `[name]` condition
    pub fn and_has_attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(AttributeMatch::Present(name.into()));
        self
    }

    /// Add an `[name=value]` condition
    pub fn and_attribute_eq(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .push(AttributeMatch::Equals(name.into(), value.into()));
        self
    }

    /// Tag condition, if any (`None` also covers `*`)
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Attribute conditions in source order
    pub fn attributes(&self) -> &[AttributeMatch] {
        &self.attributes
    }

    /// Check the selector against an element's tag and attribute lookup.
    pub fn matches_with<'a>(&self, tag: &str, get: impl Fn(&str) -> Option<&'a str>) -> bool {
        if let Some(expected) = &self.tag {
            if !expected.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        self.attributes.iter().all(|cond| match cond {
            AttributeMatch::Present(name) => get(name).is_some(),
            AttributeMatch::Equals(name, value) => get(name) == Some(value.as_str()),
        })
    }

    /// Parse a selector string.
    pub fn parse(input: &str) -> Result<Self, DomError> {
        let invalid = |reason: &str| DomError::InvalidSelector {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut chars = input.trim().chars().peekable();
        let mut selector = Selector::default();

        let tag = read_ident(&mut chars, &['[', ']', '=']);
        if tag.is_empty() && chars.peek().is_none() {
            return Err(invalid("empty selector"));
        }
        if !tag.is_empty() && tag != "*" {
            selector.tag = Some(tag);
        }

        while let Some(c) = chars.next() {
            if c != '[' {
                return Err(invalid("expected '['"));
            }
            let name = read_ident(&mut chars, &['=', ']']);
            if name.is_empty() {
                return Err(invalid("missing attribute name"));
            }
            match chars.next() {
                Some(']') => selector.attributes.push(AttributeMatch::Present(name)),
                Some('=') => {
                    let value = match chars.peek() {
                        Some(&q) if q == '"' || q == '\'' => {
                            chars.next();
                            let mut value = String::new();
                            loop {
                                match chars.next() {
                                    Some('\\') => {
                                        if let Some(escaped) = chars.next() {
                                            value.push(escaped);
                                        }
                                    }
                                    Some(c) if c == q => break,
                                    Some(c) => value.push(c),
                                    None => return Err(invalid("unterminated string")),
                                }
                            }
                            value
                        }
                        _ => read_ident(&mut chars, &[']']),
                    };
                    if chars.next() != Some(']') {
                        return Err(invalid("expected ']'"));
                    }
                    selector
                        .attributes
                        .push(AttributeMatch::Equals(name, value));
                }
                _ => return Err(invalid("expected ']' or '='")),
            }
        }

        Ok(selector)
    }
}

/// Read identifier characters up to one of `stops`, honoring `\` escapes.
fn read_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, stops: &[char]) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if stops.contains(&c) {
            break;
        }
        chars.next();
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag.as_deref().unwrap_or("*"))?;
        for cond in &self.attributes {
            match cond {
                AttributeMatch::Present(name) => write!(f, "[{}]", name)?,
                AttributeMatch::Equals(name, value) => write!(f, "[{}={:?}]", name, value)?,
            }
        }
        Ok(())
    }
}
