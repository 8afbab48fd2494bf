//! # T-REX Segments
//!
//! A T-REX blob is a `+`-joined list of segments. Each segment is either a
//! scalar `KEY$TYPE:VALUE` ([`ValueSegment`]) or a table
//! `KEY$$COL$TYPE:…::CELL:…::…` ([`TableSegment`]).
//!
//! Parsing only fails when a segment matches neither grammar. Everything
//! else (bad key characters, unknown units, values that break their type's
//! grammar) is recorded as a diagnostic on the segment.

use serde::Serialize;

use pacid_core::charset::{char_patterns, disallowed_chars, is_trex_key_char, quote_chars};
use pacid_core::{Diagnostics, Level, LookupError, ParseError, UnitTable, Validated};

use crate::table::TableSegment;
use crate::value::{TrexType, TrexValue};

/// A scalar segment `KEY$TYPE:VALUE`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueSegment {
    key: String,
    value_type: TrexType,
    value: TrexValue,
    #[serde(skip)]
    diagnostics: Diagnostics,
}

impl ValueSegment {
    /// Build a segment from a key, a type tag and the raw value, validating all three.
    pub fn new(
        key: impl Into<String>,
        type_tag: &str,
        raw: impl Into<String>,
        units: &UnitTable,
    ) -> Self {
        let value_type = TrexType::parse(type_tag);
        let value = TrexValue::typed(&value_type, raw);
        Self::validated(key.into(), value_type, value, units)
    }

    /// Build a segment from a non-numeric value; the type follows from the value class.
    ///
    /// Numeric values need a unit and go through [`quantity`](Self::quantity);
    /// here they fall back to `C62` (dimensionless one).
    pub fn from_value(key: impl Into<String>, value: TrexValue, units: &UnitTable) -> Self {
        let value_type = value
            .natural_type()
            .unwrap_or_else(|| TrexType::Quantity("C62".to_string()));
        Self::validated(key.into(), value_type, value, units)
    }

    /// Build a numeric segment in an active unit.
    pub fn quantity(
        key: impl Into<String>,
        value: TrexValue,
        unit: &str,
        units: &UnitTable,
    ) -> Result<Self, LookupError> {
        units.require_active(unit)?;
        Ok(Self::validated(
            key.into(),
            TrexType::Quantity(unit.to_string()),
            value,
            units,
        ))
    }

    fn validated(key: String, value_type: TrexType, value: TrexValue, units: &UnitTable) -> Self {
        let mut diagnostics = Diagnostics::new();
        validate_key(&mut diagnostics, &key, &format!("TREX segment key {key}"), "Segment");

        if !value_type.is_valid(units) {
            let m = diagnostics
                .message(
                    Level::Error,
                    format!("TREX value segment {key}"),
                    value_type.invalid_message(),
                )
                .with_highlight(value_type.as_str());
            diagnostics.push(m);
        }
        if !value.matches_type(&value_type) {
            let m = diagnostics
                .message(
                    Level::Error,
                    format!("TREX value segment {key}"),
                    format!(
                        "Type mismatch: {} value for declared type {value_type}",
                        value.kind()
                    ),
                )
                .with_highlight(value.raw());
            diagnostics.push(m);
        }
        for problem in value.problems() {
            let m = diagnostics
                .message(
                    Level::Error,
                    format!("TREX {} value {}", value.kind(), value.raw()),
                    problem.text,
                )
                .with_highlight(value.raw())
                .with_highlight_sub(problem.culprits);
            diagnostics.push(m);
        }

        Self {
            key,
            value_type,
            value,
            diagnostics,
        }
    }

    /// Segment key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Declared type.
    pub fn value_type(&self) -> &TrexType {
        &self.value_type
    }

    /// The value.
    pub fn value(&self) -> &TrexValue {
        &self.value
    }

    /// `KEY$TYPE:VALUE`.
    pub fn serialize(&self) -> String {
        format!("{}${}:{}", self.key, self.value_type, self.value)
    }

    /// Try the scalar grammar. `None` means the text is not a scalar segment.
    pub fn parse(s: &str, units: &UnitTable) -> Option<Self> {
        let dollar = find_from(s, "$", 1)?;
        let (key, rest) = (&s[..dollar], &s[dollar + 1..]);
        let colon = find_from(rest, ":", 1)?;
        let (type_tag, raw) = (&rest[..colon], &rest[colon + 1..]);
        if raw.is_empty() {
            return None;
        }
        Some(Self::new(key, type_tag, raw, units))
    }
}

impl Validated for ValueSegment {
    fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// One segment of a T-REX blob.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "segment", rename_all = "snake_case")]
pub enum TrexSegment {
    /// `KEY$TYPE:VALUE`.
    Value(ValueSegment),
    /// `KEY$$HEADER::ROW::ROW…`.
    Table(TableSegment),
}

impl TrexSegment {
    /// Parse one segment. The table grammar is tried first.
    pub fn parse(s: &str, units: &UnitTable) -> Result<Self, ParseError> {
        if let Some(table) = TableSegment::parse(s, units) {
            return Ok(Self::Table(table));
        }
        if let Some(value) = ValueSegment::parse(s, units) {
            return Ok(Self::Value(value));
        }
        Err(ParseError::UnrecognizedTrexSegment {
            segment: s.to_string(),
        })
    }

    /// Segment key.
    pub fn key(&self) -> &str {
        match self {
            Self::Value(v) => v.key(),
            Self::Table(t) => t.key(),
        }
    }

    /// Wire form of the segment.
    pub fn serialize(&self) -> String {
        match self {
            Self::Value(v) => v.serialize(),
            Self::Table(t) => t.serialize(),
        }
    }

    /// The scalar segment, if this is one.
    pub fn as_value(&self) -> Option<&ValueSegment> {
        match self {
            Self::Value(v) => Some(v),
            Self::Table(_) => None,
        }
    }

    /// The table segment, if this is one.
    pub fn as_table(&self) -> Option<&TableSegment> {
        match self {
            Self::Table(t) => Some(t),
            Self::Value(_) => None,
        }
    }
}

impl Validated for TrexSegment {
    fn diagnostics(&self) -> &Diagnostics {
        match self {
            Self::Value(v) => v.diagnostics(),
            Self::Table(t) => t.diagnostics(),
        }
    }

    fn visit_children(&self, visit: &mut dyn FnMut(&dyn Validated)) {
        match self {
            Self::Value(v) => v.visit_children(visit),
            Self::Table(t) => t.visit_children(visit),
        }
    }
}

/// Byte index of the first `needle` starting at or after `from`.
pub(crate) fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    // `from` may fall inside a multi-byte character.
    let start = (from..=haystack.len()).find(|i| haystack.is_char_boundary(*i))?;
    haystack[start..].find(needle).map(|i| i + start)
}

/// ERROR for key characters outside `[A-Z0-9.-]`.
pub(crate) fn validate_key(diagnostics: &mut Diagnostics, key: &str, source: &str, what: &str) {
    let bad = disallowed_chars(key, is_trex_key_char);
    if !bad.is_empty() {
        let m = diagnostics
            .message(
                Level::Error,
                source,
                format!("{what} key contains invalid characters: {}", quote_chars(&bad)),
            )
            .with_highlight(format!("{key}$"))
            .with_highlight_sub(char_patterns(&bad));
        diagnostics.push(m);
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A well-formed scalar segment serializes back to its input.
        #[test]
        fn scalar_roundtrip(
            key in "[A-Z0-9.-]{1,8}",
            tag in prop_oneof![
                Just("T.D"), Just("T.B"), Just("T.A"), Just("T.T"),
                Just("T.X"), Just("E"), Just("HUR"), Just("KGM")
            ],
            raw in "[A-Z0-9.-]{1,12}",
        ) {
            let s = format!("{key}${tag}:{raw}");
            let seg = ValueSegment::parse(&s, &UnitTable::builtin()).unwrap();
            prop_assert_eq!(seg.serialize(), s);
        }
    }
}
