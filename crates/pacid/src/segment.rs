//! # Identifier Segments
//!
//! One `/`-separated token of a PAC-ID identifier: a bare `VALUE` or a keyed
//! `KEY:VALUE`. Validation runs once at construction and stays on the node.

use std::fmt;

use serde::Serialize;

use pacid_core::charset::{
    char_patterns, disallowed_chars, hsegment_violations, is_recommended_segment_char, quote_chars,
};
use pacid_core::{Diagnostics, KeyTable, Level, ParseError, Validated};

use crate::tables::Tables;

/// A bare or keyed identifier segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdSegment {
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    value: String,
    #[serde(skip)]
    diagnostics: Diagnostics,
}

impl IdSegment {
    /// Build a segment, checking it against the builtin well-known keys.
    pub fn new(key: Option<String>, value: impl Into<String>) -> Self {
        Self::with_keys(key, value, &Tables::shared().keys)
    }

    /// Build a bare segment.
    pub fn bare(value: impl Into<String>) -> Self {
        Self::new(None, value)
    }

    /// Build a keyed segment.
    pub fn keyed(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(Some(key.into()), value)
    }

    /// Build a segment, checking it against `keys`.
    pub fn with_keys(key: Option<String>, value: impl Into<String>, keys: &KeyTable) -> Self {
        let value = value.into();
        let mut diagnostics = Diagnostics::new();

        if let Some(k) = &key {
            check_part(&mut diagnostics, k, &format!("id segment key {k}"), "key");
            if !keys.contains(k) {
                let m = diagnostics
                    .message(
                        Level::Recommendation,
                        format!("id segment key {k}"),
                        format!("{k} is not a well known segment key. It is RECOMMENDED to use well-known keys."),
                    )
                    .with_highlight(format!("{k}:"));
                diagnostics.push(m);
            }
        }
        if value.is_empty() {
            diagnostics.add(
                Level::Error,
                "id segment value",
                "Segment value must not be empty.",
            );
        }
        check_part(&mut diagnostics, &value, &format!("id segment value {value}"), "value");

        Self {
            key,
            value,
            diagnostics,
        }
    }

    /// Split a raw token on its `:`. More than one `:` is ambiguous.
    pub fn parse(token: &str, keys: &KeyTable) -> Result<Self, ParseError> {
        let mut parts = token.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(value), None, _) => Ok(Self::with_keys(None, value, keys)),
            (Some(key), Some(value), None) => {
                Ok(Self::with_keys(Some(key.to_string()), value, keys))
            }
            _ => Err(ParseError::AmbiguousSegment {
                segment: token.to_string(),
            }),
        }
    }

    /// The explicit key, if any.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether this segment opens a category (`-KEY`).
    pub fn is_category_marker(&self) -> bool {
        self.value.starts_with('-')
    }

    /// `KEY:VALUE` or `VALUE`.
    pub fn serialize(&self) -> String {
        match &self.key {
            Some(k) => format!("{k}:{}", self.value),
            None => self.value.clone(),
        }
    }

    /// Characters this segment contributes to the identifier length.
    pub(crate) fn wire_len(&self) -> usize {
        self.key.as_ref().map_or(0, |k| k.chars().count() + 1) + self.value.chars().count()
    }
}

fn check_part(diagnostics: &mut Diagnostics, text: &str, source: &str, what: &str) {
    let illegal = hsegment_violations(text);
    if !illegal.is_empty() {
        let m = diagnostics
            .message(
                Level::Error,
                source,
                format!(
                    "{} must not be used. The segment {what} must be a valid hsegment",
                    quote_chars(&illegal)
                ),
            )
            .with_highlight(text)
            .with_highlight_sub(char_patterns(&illegal));
        diagnostics.push(m);
    }

    let discouraged = disallowed_chars(text, is_recommended_segment_char);
    if !discouraged.is_empty() {
        let m = diagnostics
            .message(
                Level::Recommendation,
                source,
                format!(
                    "Characters {} should not be used. Characters SHOULD be limited to upper case letters (A-Z), numbers (0-9), '-' and '+'",
                    quote_chars(&discouraged)
                ),
            )
            .with_highlight(text)
            .with_highlight_sub(char_patterns(&discouraged));
        diagnostics.push(m);
    }

    if text.contains(':') {
        let m = diagnostics
            .message(
                Level::Recommendation,
                source,
                format!("Character ':' should not be used in segment {what}, since this character is used to separate key and value this can lead to undefined behaviour."),
            )
            .with_highlight(text)
            .with_highlight_sub([":"]);
        diagnostics.push(m);
    }
}

impl fmt::Display for IdSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl Validated for IdSegment {
    fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}
