//! # Well-Known Segment Keys
//!
//! A small set of short keys with an agreed meaning. Using any other key is
//! legal; it only earns a recommendation, since a reader cannot interpret it
//! without out-of-band knowledge.
//!
//! The builtin table is compiled in. [`KeyTable`] lets a caller extend or
//! replace it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LookupError;

/// A segment key with an agreed meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WellKnownKey {
    /// `01`: Global Trade Item Number.
    #[serde(rename = "01")]
    Gtin,
    /// `10`: batch or lot number.
    #[serde(rename = "10")]
    Batch,
    /// `20`: container code.
    #[serde(rename = "20")]
    ContainerCode,
    /// `21`: serial number.
    #[serde(rename = "21")]
    Serial,
    /// `240`: additional product identifier, typically a model number.
    #[serde(rename = "240")]
    AdditionalIdentifier,
    /// `RNR`: absolute run number.
    #[serde(rename = "RNR")]
    RunIdAbsolute,
    /// `SMP`: sample id.
    #[serde(rename = "SMP")]
    SampleId,
    /// `EXP`: experiment id.
    #[serde(rename = "EXP")]
    ExperimentId,
    /// `RST`: result id.
    #[serde(rename = "RST")]
    ResultId,
    /// `MTD`: method id.
    #[serde(rename = "MTD")]
    MethodId,
    /// `RPT`: report id.
    #[serde(rename = "RPT")]
    ReportId,
    /// `TS`: timestamp.
    #[serde(rename = "TS")]
    Timestamp,
    /// `V`: version.
    #[serde(rename = "V")]
    Version,
}

impl WellKnownKey {
    /// Returns all well-known keys in table order.
    pub fn all_keys() -> &'static [WellKnownKey] {
        &[
            Self::Gtin,
            Self::Batch,
            Self::ContainerCode,
            Self::Serial,
            Self::AdditionalIdentifier,
            Self::RunIdAbsolute,
            Self::SampleId,
            Self::ExperimentId,
            Self::ResultId,
            Self::MethodId,
            Self::ReportId,
            Self::Timestamp,
            Self::Version,
        ]
    }

    /// The key as written in a segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gtin => "01",
            Self::Batch => "10",
            Self::ContainerCode => "20",
            Self::Serial => "21",
            Self::AdditionalIdentifier => "240",
            Self::RunIdAbsolute => "RNR",
            Self::SampleId => "SMP",
            Self::ExperimentId => "EXP",
            Self::ResultId => "RST",
            Self::MethodId => "MTD",
            Self::ReportId => "RPT",
            Self::Timestamp => "TS",
            Self::Version => "V",
        }
    }

    /// Human-readable meaning.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gtin => "GTIN",
            Self::Batch => "Batch",
            Self::ContainerCode => "Container Code",
            Self::Serial => "Serial Number",
            Self::AdditionalIdentifier => "Additional Identifier",
            Self::RunIdAbsolute => "Run ID (absolute)",
            Self::SampleId => "Sample ID",
            Self::ExperimentId => "Experiment ID",
            Self::ResultId => "Result ID",
            Self::MethodId => "Method ID",
            Self::ReportId => "Report ID",
            Self::Timestamp => "Timestamp",
            Self::Version => "Version",
        }
    }
}

impl fmt::Display for WellKnownKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WellKnownKey {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all_keys()
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| LookupError::UnknownKey { key: s.to_string() })
    }
}

/// Read-only key → label lookup used by segment validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTable {
    labels: BTreeMap<String, String>,
}

impl KeyTable {
    /// The compiled-in well-known keys.
    pub fn builtin() -> Self {
        let labels = WellKnownKey::all_keys()
            .iter()
            .map(|k| (k.as_str().to_string(), k.label().to_string()))
            .collect();
        Self { labels }
    }

    /// A table without any key.
    pub fn empty() -> Self {
        Self {
            labels: BTreeMap::new(),
        }
    }

    /// Add or replace a key.
    pub fn with_key(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(key.into(), label.into());
        self
    }

    /// True if `key` is known.
    pub fn contains(&self, key: &str) -> bool {
        self.labels.contains_key(key)
    }

    /// Label of a known key.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Iterate over `(key, label)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for KeyTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_keys_unique() {
        let mut seen = std::collections::HashSet::new();
        for k in WellKnownKey::all_keys() {
            assert!(seen.insert(k.as_str()), "Duplicate key: {k}");
        }
        assert_eq!(seen.len(), 13);
    }

    #[test]
    fn test_as_str_roundtrip() {
        for key in WellKnownKey::all_keys() {
            let parsed: WellKnownKey = key.as_str().parse().unwrap();
            assert_eq!(*key, parsed);
        }
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = "XYZ".parse::<WellKnownKey>().unwrap_err();
        assert_eq!(
            err,
            LookupError::UnknownKey {
                key: "XYZ".to_string()
            }
        );
    }

    #[test]
    fn test_serde_uses_wire_key() {
        let json = serde_json::to_string(&WellKnownKey::AdditionalIdentifier).unwrap();
        assert_eq!(json, "\"240\"");
        let back: WellKnownKey = serde_json::from_str("\"SMP\"").unwrap();
        assert_eq!(back, WellKnownKey::SampleId);
    }

    #[test]
    fn test_key_table_builtin_and_extension() {
        let table = KeyTable::builtin();
        assert!(table.contains("21"));
        assert_eq!(table.label("01"), Some("GTIN"));
        assert!(!table.contains("KEY"));

        let table = table.with_key("KEY", "Custom");
        assert_eq!(table.label("KEY"), Some("Custom"));
        assert!(KeyTable::empty().iter().next().is_none());
    }
}
