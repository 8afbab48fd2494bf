//! # UNECE Unit Codes
//!
//! T-REX numeric values carry their unit as a UN/ECE Recommendation 20
//! common code (`HUR` hour, `KGM` kilogram, `C62` dimensionless one, …).
//! Only codes in the active state are valid T-REX types.
//!
//! The builtin table is a compiled-in subset of the recommendation covering
//! the units laboratories commonly report. Callers needing the full dataset
//! load it themselves and build a [`UnitTable`] from it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LookupError;

/// One UNECE common code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Common code, e.g. `"KGM"`.
    pub code: String,
    /// Unit name, e.g. `"kilogram"`.
    pub name: String,
    /// Symbol, e.g. `"kg"`. Empty when the recommendation defines none.
    pub symbol: String,
    /// False for deprecated or deleted codes.
    pub active: bool,
}

impl Unit {
    /// Build an active unit.
    pub fn new(code: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            symbol: symbol.into(),
            active: true,
        }
    }

    /// Mark the unit as deprecated.
    pub fn deprecated(mut self) -> Self {
        self.active = false;
        self
    }
}

const BUILTIN_ACTIVE: &[(&str, &str, &str)] = &[
    // time
    ("SEC", "second [unit of time]", "s"),
    ("MIN", "minute [unit of time]", "min"),
    ("HUR", "hour", "h"),
    ("DAY", "day", "d"),
    ("WEE", "week", "wk"),
    ("MON", "month", "mo"),
    ("ANN", "year", "y"),
    ("C26", "millisecond", "ms"),
    // count
    ("C62", "one", "1"),
    ("H87", "piece", ""),
    ("P1", "percent", "%"),
    // length
    ("MTR", "metre", "m"),
    ("KMT", "kilometre", "km"),
    ("CMT", "centimetre", "cm"),
    ("MMT", "millimetre", "mm"),
    ("4H", "micrometre (micron)", "µm"),
    ("C45", "nanometre", "nm"),
    ("C63", "parsec", "pc"),
    // area, volume
    ("MTK", "square metre", "m²"),
    ("MTQ", "cubic metre", "m³"),
    ("CMQ", "cubic centimetre", "cm³"),
    ("LTR", "litre", "l"),
    ("MLT", "millilitre", "ml"),
    ("4G", "microlitre", "µl"),
    // mass
    ("KGM", "kilogram", "kg"),
    ("GRM", "gram", "g"),
    ("MGM", "milligram", "mg"),
    ("MC", "microgram", "µg"),
    ("TNE", "tonne (metric ton)", "t"),
    // temperature
    ("CEL", "degree Celsius", "°C"),
    ("KEL", "kelvin", "K"),
    ("FAH", "degree Fahrenheit", "°F"),
    // pressure
    ("PAL", "pascal", "Pa"),
    ("KPA", "kilopascal", "kPa"),
    ("BAR", "bar [unit of pressure]", "bar"),
    ("MBR", "millibar", "mbar"),
    // mechanics, energy
    ("NEU", "newton", "N"),
    ("JOU", "joule", "J"),
    ("KJO", "kilojoule", "kJ"),
    ("WTT", "watt", "W"),
    ("KWT", "kilowatt", "kW"),
    ("KWH", "kilowatt hour", "kW·h"),
    ("RPM", "revolutions per minute", "r/min"),
    ("MTS", "metre per second", "m/s"),
    ("KMH", "kilometre per hour", "km/h"),
    // electricity, frequency, light
    ("AMP", "ampere", "A"),
    ("VLT", "volt", "V"),
    ("OHM", "ohm", "Ω"),
    ("HTZ", "hertz", "Hz"),
    ("KHZ", "kilohertz", "kHz"),
    ("MHZ", "megahertz", "MHz"),
    ("CDL", "candela", "cd"),
    ("LUX", "lux", "lx"),
    // amount of substance, concentration
    ("MOL", "mole", "mol"),
    ("C18", "millimole", "mmol"),
    ("M1", "milligram per litre", "mg/l"),
    ("GL", "gram per litre", "g/l"),
];

// Package-type codes moved to Recommendation 21 and are deleted from 20.
const BUILTIN_DEPRECATED: &[(&str, &str, &str)] = &[
    ("BX", "box", ""),
    ("CT", "carton", ""),
    ("PK", "pack", ""),
];

/// Read-only unit lookup, keyed by common code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitTable {
    units: BTreeMap<String, Unit>,
}

impl UnitTable {
    /// The compiled-in subset.
    pub fn builtin() -> Self {
        let active = BUILTIN_ACTIVE
            .iter()
            .map(|(code, name, symbol)| Unit::new(*code, *name, *symbol));
        let deprecated = BUILTIN_DEPRECATED
            .iter()
            .map(|(code, name, symbol)| Unit::new(*code, *name, *symbol).deprecated());
        Self::from_units(active.chain(deprecated))
    }

    /// Build a table from arbitrary units. A later duplicate code wins.
    pub fn from_units(units: impl IntoIterator<Item = Unit>) -> Self {
        Self {
            units: units.into_iter().map(|u| (u.code.clone(), u)).collect(),
        }
    }

    /// Look a code up, active or not.
    pub fn get(&self, code: &str) -> Option<&Unit> {
        self.units.get(code)
    }

    /// True if `code` exists and is active.
    pub fn is_active_code(&self, code: &str) -> bool {
        self.get(code).is_some_and(|u| u.active)
    }

    /// The unit for an active code.
    pub fn require_active(&self, code: &str) -> Result<&Unit, LookupError> {
        self.get(code)
            .filter(|u| u.active)
            .ok_or_else(|| LookupError::UnknownUnit {
                code: code.to_string(),
            })
    }

    /// All active codes in code order.
    pub fn active_codes(&self) -> impl Iterator<Item = &str> {
        self.units
            .values()
            .filter(|u| u.active)
            .map(|u| u.code.as_str())
    }

    /// Number of entries, active or not.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns true if the table has no entry.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_contains_lab_units() {
        let table = UnitTable::builtin();
        for code in ["HUR", "C62", "C63", "GRM", "KGM", "CEL", "MLT"] {
            assert!(table.is_active_code(code), "{code} should be active");
        }
        assert_eq!(table.get("KGM").map(|u| u.symbol.as_str()), Some("kg"));
    }

    #[test]
    fn test_unknown_and_deprecated_are_inactive() {
        let table = UnitTable::builtin();
        assert!(!table.is_active_code("HIP"));
        assert!(!table.is_active_code("W70"));
        assert!(!table.is_active_code("HURR"));
        assert!(table.get("BX").is_some());
        assert!(!table.is_active_code("BX"));
        assert!(table.require_active("BX").is_err());
    }

    #[test]
    fn test_builtin_codes_unique() {
        let total = BUILTIN_ACTIVE.len() + BUILTIN_DEPRECATED.len();
        assert_eq!(UnitTable::builtin().len(), total);
    }

    #[test]
    fn test_custom_table() {
        let table = UnitTable::from_units([Unit::new("XYZ", "custom", "x")]);
        assert!(table.is_active_code("XYZ"));
        assert!(!table.is_active_code("HUR"));
        assert_eq!(table.active_codes().collect::<Vec<_>>(), vec!["XYZ"]);
        assert!(!table.is_empty());
    }
}
