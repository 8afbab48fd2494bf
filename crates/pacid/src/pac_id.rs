//! # PAC-ID
//!
//! An issuer plus an ordered list of identifier segments. Extensions are held
//! one level up, on [`PacUrl`](crate::url::PacUrl).

use std::collections::HashSet;

use serde::Serialize;

use pacid_core::charset::{char_patterns, disallowed_chars, is_domain_name, is_recommended_issuer_char, quote_chars};
use pacid_core::{Diagnostics, Level, Validated};

use crate::segment::IdSegment;

/// Longest identifier, in characters, that stays valid.
pub const MAX_IDENTIFIER_LEN: usize = 256;

/// An issuer and its identifier segments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacId {
    issuer: String,
    segments: Vec<IdSegment>,
    #[serde(skip)]
    diagnostics: Diagnostics,
}

impl PacId {
    /// Assemble and validate. Duplicate keys are a recommendation here.
    pub fn new(issuer: impl Into<String>, segments: Vec<IdSegment>) -> Self {
        let issuer = issuer.into();
        let mut diagnostics = Diagnostics::new();
        validate_identifier(&mut diagnostics, &issuer, &segments);

        let mut seen = HashSet::new();
        for key in segments.iter().filter_map(IdSegment::key) {
            if !seen.insert(key) {
                let m = diagnostics
                    .message(
                        Level::Recommendation,
                        format!("identifier {key}"),
                        format!("Duplicate segment key {key}. This will probably lead to undefined behaviour"),
                    )
                    .with_highlight(format!("{key}:"));
                diagnostics.push(m);
            }
        }

        Self {
            issuer,
            segments,
            diagnostics,
        }
    }

    /// The issuing domain.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Identifier segments in order.
    pub fn segments(&self) -> &[IdSegment] {
        &self.segments
    }

    /// Value of the first segment keyed `key`.
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.segments
            .iter()
            .find(|s| s.key() == Some(key))
            .map(IdSegment::value)
    }

    /// `/`-joined identifier, without the issuer.
    pub fn identifier(&self) -> String {
        join_segments(&self.segments)
    }
}

impl Validated for PacId {
    fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn visit_children(&self, visit: &mut dyn FnMut(&dyn Validated)) {
        for s in &self.segments {
            visit(s);
        }
    }
}

/// `/`-joined wire form of `segments`.
pub(crate) fn join_segments(segments: &[IdSegment]) -> String {
    segments
        .iter()
        .map(IdSegment::serialize)
        .collect::<Vec<_>>()
        .join("/")
}

/// Issuer and identifier checks shared by plain and categorized identifiers.
pub(crate) fn validate_identifier(diagnostics: &mut Diagnostics, issuer: &str, segments: &[IdSegment]) {
    if !is_domain_name(issuer) {
        let m = diagnostics
            .message(Level::Error, "PAC-ID", "Issuer must be a valid domain name.")
            .with_highlight(issuer);
        diagnostics.push(m);
    }
    let discouraged = disallowed_chars(issuer, is_recommended_issuer_char);
    if !discouraged.is_empty() {
        let m = diagnostics
            .message(
                Level::Recommendation,
                "PAC-ID",
                format!(
                    "Characters {} should not be used. Issuer SHOULD contain only the characters A-Z, 0-9, -, and .",
                    quote_chars(&discouraged)
                ),
            )
            .with_highlight(issuer)
            .with_highlight_sub(char_patterns(&discouraged));
        diagnostics.push(m);
    }

    if segments.is_empty() {
        diagnostics.add(
            Level::Error,
            "identifier",
            "Identifier must contain at least one segment.",
        );
        return;
    }

    let len = segments.iter().map(IdSegment::wire_len).sum::<usize>() + segments.len() - 1;
    if len > MAX_IDENTIFIER_LEN {
        diagnostics.add(
            Level::Error,
            "identifier",
            format!("Identifier is {len} characters long, Identifier must not exceed {MAX_IDENTIFIER_LEN} characters."),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_pac_id() {
        let p = PacId::new(
            "METTORIUS.COM",
            vec![IdSegment::keyed("21", "1234"), IdSegment::keyed("240", "BAL500")],
        );
        assert!(p.is_valid(), "{:?}", p.all_messages());
        assert_eq!(p.identifier(), "21:1234/240:BAL500");
        assert_eq!(p.value_of("240"), Some("BAL500"));
    }

    #[test]
    fn test_issuer_must_be_domain() {
        let p = PacId::new("LOCALHOST", vec![IdSegment::bare("A")]);
        assert!(!p.is_valid());
        assert_eq!(p.errors()[0].text, "Issuer must be a valid domain name.");
    }

    #[test]
    fn test_lowercase_issuer_is_recommendation() {
        let p = PacId::new("mettorius.com", vec![IdSegment::bare("A")]);
        assert!(p.is_valid());
        assert_eq!(p.own_messages().len(), 1);
        assert_eq!(p.own_messages()[0].level, Level::Recommendation);
    }

    #[test]
    fn test_no_segments_is_error() {
        let p = PacId::new("METTORIUS.COM", vec![]);
        assert!(!p.is_valid());
        assert_eq!(p.errors()[0].text, "Identifier must contain at least one segment.");
    }

    #[test]
    fn test_length_limit() {
        let exact = PacId::new("X.COM", vec![IdSegment::bare("A".repeat(MAX_IDENTIFIER_LEN))]);
        assert!(exact.is_valid());

        let over = PacId::new(
            "X.COM",
            vec![IdSegment::bare("A".repeat(200)), IdSegment::keyed("21", "1".repeat(53))],
        );
        assert!(!over.is_valid());
        assert_eq!(
            over.errors()[0].text,
            "Identifier is 257 characters long, Identifier must not exceed 256 characters."
        );
        assert_eq!(over.segments().len(), 2);
    }

    #[test]
    fn test_duplicate_keys_are_recommendation() {
        let p = PacId::new(
            "X.COM",
            vec![IdSegment::keyed("21", "1"), IdSegment::keyed("21", "2")],
        );
        assert!(p.is_valid());
        assert!(p
            .warnings()
            .iter()
            .any(|m| m.text.starts_with("Duplicate segment key 21")));
    }
}
