//! # T-REX Container
//!
//! An ordered list of segments with unique keys, serialized as the
//! `+`-joined segment serializations.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use pacid_core::{ConversionError, Diagnostics, Level, ParseError, UnitTable, Validated};

use crate::segment::TrexSegment;
use crate::value::NativeValue;

/// A parsed T-REX blob.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trex {
    segments: Vec<TrexSegment>,
    #[serde(skip)]
    diagnostics: Diagnostics,
}

/// A segment's content as native values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NativeSegment {
    /// Scalar segment.
    Value(NativeValue),
    /// Table segment, cells row by row.
    Table {
        /// Column keys in order.
        columns: Vec<String>,
        /// Rows of cells.
        rows: Vec<Vec<NativeValue>>,
    },
}

impl Trex {
    /// Assemble a container. Duplicate keys are recorded as errors.
    pub fn new(segments: Vec<TrexSegment>) -> Self {
        let mut diagnostics = Diagnostics::new();
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for s in &segments {
            if !seen.insert(s.key()) && reported.insert(s.key()) {
                let m = diagnostics
                    .message(
                        Level::Error,
                        "TREX",
                        format!("Duplicate segment key: {}", s.key()),
                    )
                    .with_highlight(s.key());
                diagnostics.push(m);
            }
        }
        Self {
            segments,
            diagnostics,
        }
    }

    /// Parse a blob. Line breaks and one leading `*` are ignored.
    pub fn parse(data: &str, units: &UnitTable) -> Result<Self, ParseError> {
        tracing::debug!(len = data.len(), "parsing T-REX");
        let cleaned: String = data.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();
        let cleaned = cleaned.strip_prefix('*').unwrap_or(&cleaned);
        if cleaned.is_empty() {
            return Err(ParseError::EmptyTrex);
        }
        let segments = cleaned
            .split('+')
            .map(|s| TrexSegment::parse(s, units))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(segments))
    }

    /// Segments in order.
    pub fn segments(&self) -> &[TrexSegment] {
        &self.segments
    }

    /// The first segment with `key`.
    pub fn segment(&self, key: &str) -> Option<&TrexSegment> {
        self.segments.iter().find(|s| s.key() == key)
    }

    /// Segment keys in order.
    pub fn keys(&self) -> Vec<&str> {
        self.segments.iter().map(TrexSegment::key).collect()
    }

    /// Wire form.
    pub fn serialize(&self) -> String {
        self.segments
            .iter()
            .map(TrexSegment::serialize)
            .collect::<Vec<_>>()
            .join("+")
    }

    /// One segment per line, one table row per line.
    pub fn pretty(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                TrexSegment::Value(v) => v.serialize(),
                TrexSegment::Table(t) => t.pretty(),
            })
            .collect::<Vec<_>>()
            .join("\n+")
    }

    /// Every segment converted to native values, keyed by segment key.
    pub fn to_native_map(&self) -> Result<BTreeMap<String, NativeSegment>, ConversionError> {
        let mut out = BTreeMap::new();
        for s in &self.segments {
            let native = match s {
                TrexSegment::Value(v) => NativeSegment::Value(v.value().to_native()?),
                TrexSegment::Table(t) => NativeSegment::Table {
                    columns: t.column_keys().into_iter().map(String::from).collect(),
                    rows: t.to_native_rows()?,
                },
            };
            out.entry(s.key().to_string()).or_insert(native);
        }
        Ok(out)
    }
}

impl Validated for Trex {
    fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn visit_children(&self, visit: &mut dyn FnMut(&dyn Validated)) {
        for s in &self.segments {
            visit(s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{TrexType, TrexValue};

    fn parse(s: &str) -> Trex {
        Trex::parse(s, &UnitTable::builtin()).unwrap()
    }

    #[test]
    fn test_parse_scalars() {
        let t = parse("A$T.A:ASDFAS+B$T.B:T");
        let a = t.segment("A").and_then(TrexSegment::as_value).unwrap();
        assert_eq!(a.value_type(), &TrexType::Alphanumeric);
        assert_eq!(a.value().raw(), "ASDFAS");
        let b = t.segment("B").and_then(TrexSegment::as_value).unwrap();
        assert_eq!(b.value(), &TrexValue::Bool("T".to_string()));
        assert!(t.is_valid());
        assert_eq!(t.keys(), vec!["A", "B"]);
    }

    #[test]
    fn test_empty_is_structural_error() {
        let units = UnitTable::builtin();
        assert_eq!(Trex::parse("", &units), Err(ParseError::EmptyTrex));
        assert_eq!(Trex::parse("*\n", &units), Err(ParseError::EmptyTrex));
    }

    #[test]
    fn test_line_breaks_and_star_ignored() {
        let t = parse("*A$T.A:X\n+B$T.B:F");
        assert_eq!(t.serialize(), "A$T.A:X+B$T.B:F");
    }

    #[test]
    fn test_unrecognized_segment_fails_whole_blob() {
        let err = Trex::parse("A$T.A:X+JUNK", &UnitTable::builtin()).unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedTrexSegment { .. }));
    }

    #[test]
    fn test_duplicate_keys_reported_once() {
        let t = parse("A$T.A:X+A$T.A:Y+A$T.B:T");
        assert!(!t.is_valid());
        assert_eq!(t.errors().len(), 1);
        assert_eq!(t.segments().len(), 3);
    }

    #[test]
    fn test_nested_messages_collected() {
        let t = parse("A$T.B:X+TAB$$C£$T.A::A");
        let errors = t.errors();
        assert!(errors.iter().any(|m| m.source == "TREX bool value X"));
        assert!(errors.iter().any(|m| m.source == "TREX table column C£"));
    }

    #[test]
    fn test_native_map() {
        let t = parse("TIME$HUR:25+OK$T.B:T+TAB$$X$T.A::A::B");
        let map = t.to_native_map().unwrap();
        assert_eq!(map["TIME"], NativeSegment::Value(NativeValue::Integer(25)));
        assert_eq!(map["OK"], NativeSegment::Value(NativeValue::Bool(true)));
        assert_eq!(
            map["TAB"],
            NativeSegment::Table {
                columns: vec!["X".to_string()],
                rows: vec![
                    vec![NativeValue::Text("A".into())],
                    vec![NativeValue::Text("B".into())]
                ],
            }
        );
    }

    #[test]
    fn test_pretty() {
        let t = parse("A$T.A:X+TAB$$X$T.A::A::B");
        assert_eq!(t.pretty(), "A$T.A:X\n+TAB$$X$T.A::\n  A::\n  B");
    }

    #[test]
    fn test_json_shape() {
        let t = parse("A$HUR:1");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["segments"][0]["segment"], "value");
        assert_eq!(json["segments"][0]["value_type"], "HUR");
        assert_eq!(json["segments"][0]["value"]["kind"], "numeric");
    }
}
