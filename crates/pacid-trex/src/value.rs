//! # T-REX Values — Types and Per-Type Grammar
//!
//! A T-REX value is raw text tagged with one of seven value classes. The text
//! is kept exactly as parsed so serialization is lossless even for invalid
//! input; [`TrexValue::problems`] reports every way it breaks the grammar of
//! its class.
//!
//! | Type tag | Class          | Grammar                                   |
//! |----------|----------------|-------------------------------------------|
//! | unit     | `Numeric`      | `-?\d+(\.\d+)?(E-?\d+)?`                  |
//! | `T.D`    | `Date`         | `[YYYYMMDD][THHMM[SS][.mmm]]`, not empty   |
//! | `T.B`    | `Bool`         | `T` or `F`                                |
//! | `T.A`    | `Alphanumeric` | `[A-Z0-9.-]*`                             |
//! | `T.T`    | `Text`         | base36 token of UTF-8 text                |
//! | `T.X`    | `Binary`       | base36 token of raw bytes                 |
//! | `E`      | `Error`        | `[A-Z0-9.-]*`                             |

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Serialize, Serializer};

use pacid_core::base36;
use pacid_core::charset::{char_patterns, disallowed_chars, quote_chars};
use pacid_core::{ConversionError, UnitTable};

/// Declared type of a value segment or table column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrexType {
    /// `T.D`: date, time or date-time.
    Date,
    /// `T.B`: boolean.
    Bool,
    /// `T.A`: upper-case alphanumeric text.
    Alphanumeric,
    /// `T.T`: arbitrary text, base36 encoded.
    Text,
    /// `T.X`: binary data, base36 encoded.
    Binary,
    /// `E`: error placeholder.
    Error,
    /// Numeric quantity in the given UNECE unit.
    Quantity(String),
}

impl TrexType {
    /// The six tags that are not unit codes.
    pub fn fixed_tags() -> &'static [&'static str] {
        &["T.D", "T.B", "T.A", "T.T", "T.X", "E"]
    }

    /// Classify a type tag. Anything that is not a fixed tag is taken as a unit code.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "T.D" => Self::Date,
            "T.B" => Self::Bool,
            "T.A" => Self::Alphanumeric,
            "T.T" => Self::Text,
            "T.X" => Self::Binary,
            "E" => Self::Error,
            unit => Self::Quantity(unit.to_string()),
        }
    }

    /// The tag as written on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Date => "T.D",
            Self::Bool => "T.B",
            Self::Alphanumeric => "T.A",
            Self::Text => "T.T",
            Self::Binary => "T.X",
            Self::Error => "E",
            Self::Quantity(unit) => unit,
        }
    }

    /// Fixed tags are always valid; unit codes only when active in `units`.
    pub fn is_valid(&self, units: &UnitTable) -> bool {
        match self {
            Self::Quantity(unit) => units.is_active_code(unit),
            _ => true,
        }
    }

    /// Message text for an invalid tag.
    pub(crate) fn invalid_message(&self) -> String {
        format!(
            "Type '{}' is invalid. Must be 'T.D', 'T.B', 'T.A', 'T.T', 'T.X', 'E' or a UNECE unit",
            self.as_str()
        )
    }
}

impl fmt::Display for TrexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TrexType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One grammar violation of a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueProblem {
    /// Description.
    pub text: String,
    /// Offending substrings of the raw value.
    pub culprits: Vec<String>,
}

impl ValueProblem {
    fn new(text: String) -> Self {
        Self {
            text,
            culprits: Vec::new(),
        }
    }

    fn with_culprits(text: String, culprits: Vec<String>) -> Self {
        Self { text, culprits }
    }
}

/// A raw value tagged with its class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TrexValue {
    /// Number; the unit is carried by the segment or column type.
    Numeric(String),
    /// Date, time or date-time.
    Date(String),
    /// `T` or `F`.
    Bool(String),
    /// Upper-case alphanumeric text.
    Alphanumeric(String),
    /// Base36 encoded UTF-8 text.
    Text(String),
    /// Base36 encoded bytes.
    Binary(String),
    /// Error placeholder.
    Error(String),
}

impl TrexValue {
    /// Tag `raw` with the class implied by `value_type`.
    pub fn typed(value_type: &TrexType, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match value_type {
            TrexType::Date => Self::Date(raw),
            TrexType::Bool => Self::Bool(raw),
            TrexType::Alphanumeric => Self::Alphanumeric(raw),
            TrexType::Text => Self::Text(raw),
            TrexType::Binary => Self::Binary(raw),
            TrexType::Error => Self::Error(raw),
            TrexType::Quantity(_) => Self::Numeric(raw),
        }
    }

    /// The raw text.
    pub fn raw(&self) -> &str {
        match self {
            Self::Numeric(v)
            | Self::Date(v)
            | Self::Bool(v)
            | Self::Alphanumeric(v)
            | Self::Text(v)
            | Self::Binary(v)
            | Self::Error(v) => v,
        }
    }

    /// Consumes self and returns the raw text.
    pub fn into_raw(self) -> String {
        match self {
            Self::Numeric(v)
            | Self::Date(v)
            | Self::Bool(v)
            | Self::Alphanumeric(v)
            | Self::Text(v)
            | Self::Binary(v)
            | Self::Error(v) => v,
        }
    }

    /// Lower-case class name used in messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::Date(_) => "date",
            Self::Bool(_) => "bool",
            Self::Alphanumeric(_) => "alphanumeric",
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
            Self::Error(_) => "error",
        }
    }

    /// The declared type this value class belongs to. Numbers have none of
    /// their own; their unit lives on the segment.
    pub fn natural_type(&self) -> Option<TrexType> {
        match self {
            Self::Numeric(_) => None,
            Self::Date(_) => Some(TrexType::Date),
            Self::Bool(_) => Some(TrexType::Bool),
            Self::Alphanumeric(_) => Some(TrexType::Alphanumeric),
            Self::Text(_) => Some(TrexType::Text),
            Self::Binary(_) => Some(TrexType::Binary),
            Self::Error(_) => Some(TrexType::Error),
        }
    }

    /// True if the class agrees with `value_type`.
    pub fn matches_type(&self, value_type: &TrexType) -> bool {
        matches!(
            (self, value_type),
            (Self::Numeric(_), TrexType::Quantity(_))
                | (Self::Date(_), TrexType::Date)
                | (Self::Bool(_), TrexType::Bool)
                | (Self::Alphanumeric(_), TrexType::Alphanumeric)
                | (Self::Text(_), TrexType::Text)
                | (Self::Binary(_), TrexType::Binary)
                | (Self::Error(_), TrexType::Error)
        )
    }

    /// Every grammar violation of the raw text. Empty means valid.
    pub fn problems(&self) -> Vec<ValueProblem> {
        let mut out = Vec::new();
        match self {
            Self::Numeric(v) => {
                let bad = disallowed_chars(v, |c| c.is_ascii_digit() || matches!(c, '.' | '-' | 'E'));
                if !bad.is_empty() {
                    out.push(ValueProblem::with_culprits(
                        format!(
                            "Characters {} are not allowed in quantity segment",
                            quote_chars(&bad)
                        ),
                        char_patterns(&bad),
                    ));
                }
                if !is_number(v) {
                    out.push(ValueProblem::new(format!("{v} cannot be converted to number")));
                }
            }
            Self::Date(v) => match parse_date_time(v) {
                Ok(_) => {}
                Err(DateProblem::Format) => out.push(ValueProblem::new(format!(
                    "{v} is not in a valid format. Valid format for date: YYYYMMDD; \
                     Valid for time: THHMM, THHMMSS, THHMMSS.SSS; \
                     Datetime any combination of valid date and time"
                ))),
                Err(DateProblem::Calendar) => {
                    out.push(ValueProblem::new(format!("{v} is no valid date or time.")))
                }
            },
            Self::Bool(v) => {
                if v != "T" && v != "F" {
                    out.push(ValueProblem::with_culprits(
                        format!("{v} is no valid boolean. Must be T or F"),
                        v.chars().map(String::from).collect(),
                    ));
                }
            }
            Self::Alphanumeric(v) => {
                if v.chars().any(|c| c.is_ascii_lowercase()) {
                    out.push(ValueProblem::new(
                        "Lower case characters are not allowed.".to_string(),
                    ));
                }
                let bad = disallowed_chars(v, pacid_core::charset::is_trex_key_char);
                if !bad.is_empty() {
                    out.push(ValueProblem::with_culprits(
                        format!(
                            "Characters {} are not allowed in alphanumeric segment",
                            quote_chars(&bad)
                        ),
                        char_patterns(&bad),
                    ));
                }
            }
            Self::Text(v) | Self::Binary(v) => {
                let bad = disallowed_chars(v, |c| c.is_ascii_uppercase() || c.is_ascii_digit());
                if !bad.is_empty() {
                    out.push(ValueProblem::with_culprits(
                        format!(
                            "Characters {} are not allowed in {} segment. Base36 encoding only allows A-Z0-9",
                            quote_chars(&bad),
                            self.kind()
                        ),
                        char_patterns(&bad),
                    ));
                }
            }
            Self::Error(v) => {
                let bad = disallowed_chars(v, pacid_core::charset::is_trex_key_char);
                if !bad.is_empty() {
                    out.push(ValueProblem::with_culprits(
                        format!(
                            "Characters {} are not allowed in error segment",
                            quote_chars(&bad)
                        ),
                        char_patterns(&bad),
                    ));
                }
            }
        }
        out
    }

    /// True if [`problems`](Self::problems) is empty.
    pub fn is_valid(&self) -> bool {
        self.problems().is_empty()
    }

    /// Convert to a native value. Fails for values with grammar problems and
    /// for text that does not decode to UTF-8.
    pub fn to_native(&self) -> Result<NativeValue, ConversionError> {
        if !self.is_valid() {
            return Err(ConversionError::InvalidValue {
                value: self.raw().to_string(),
                kind: self.kind().to_string(),
            });
        }
        let invalid = || ConversionError::InvalidValue {
            value: self.raw().to_string(),
            kind: self.kind().to_string(),
        };
        match self {
            Self::Numeric(v) => {
                if !v.contains(['.', 'E']) {
                    if let Ok(i) = v.parse::<i64>() {
                        return Ok(NativeValue::Integer(i));
                    }
                }
                v.parse::<f64>()
                    .map(NativeValue::Float)
                    .map_err(|_| invalid())
            }
            Self::Date(v) => match parse_date_time(v) {
                Ok(DateTimeValue::Date(d)) => Ok(NativeValue::Date(d)),
                Ok(DateTimeValue::Time(t)) => Ok(NativeValue::Time(t)),
                Ok(DateTimeValue::DateTime(dt)) => Ok(NativeValue::DateTime(dt)),
                Err(_) => Err(invalid()),
            },
            Self::Bool(v) => Ok(NativeValue::Bool(v == "T")),
            Self::Alphanumeric(v) => Ok(NativeValue::Text(v.clone())),
            Self::Text(v) => Ok(NativeValue::Text(base36::decode(v)?)),
            Self::Binary(v) => Ok(NativeValue::Bytes(base36::decode_bytes(v)?)),
            Self::Error(v) => Ok(NativeValue::Error(v.clone())),
        }
    }

    /// `T` or `F`.
    pub fn boolean(value: bool) -> Self {
        Self::Bool(if value { "T" } else { "F" }.to_string())
    }

    /// Arbitrary text, base36 encoded.
    pub fn text(value: &str) -> Self {
        Self::Text(base36::encode(value).into_string())
    }

    /// Alphanumeric when every character is in `[A-Z0-9.-]`, base36 text otherwise.
    pub fn alphanumeric_or_text(value: &str) -> Self {
        if value.chars().all(pacid_core::charset::is_trex_key_char) {
            Self::Alphanumeric(value.to_string())
        } else {
            Self::text(value)
        }
    }

    /// Raw bytes, base36 encoded.
    pub fn binary(value: &[u8]) -> Self {
        Self::Binary(base36::encode_bytes(value).into_string())
    }

    /// `YYYYMMDD`.
    pub fn date(value: NaiveDate) -> Self {
        Self::Date(value.format("%Y%m%d").to_string())
    }

    /// `THHMM`, `THHMMSS` or `THHMMSS.mmm`, the shortest that is exact to the millisecond.
    pub fn time(value: NaiveTime) -> Self {
        Self::Date(format_time(value))
    }

    /// `YYYYMMDD` followed by the time as in [`time`](Self::time).
    pub fn date_time(value: NaiveDateTime) -> Self {
        Self::Date(format!(
            "{}{}",
            value.date().format("%Y%m%d"),
            format_time(value.time())
        ))
    }

    /// Integer quantity.
    pub fn integer(value: i64) -> Self {
        Self::Numeric(value.to_string())
    }

    /// Decimal quantity. NaN and infinities have no representation.
    pub fn number(value: f64) -> Result<Self, ConversionError> {
        if !value.is_finite() {
            return Err(ConversionError::NonFinite(value.to_string()));
        }
        Ok(Self::Numeric(value.to_string()))
    }
}

impl fmt::Display for TrexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw())
    }
}

/// A T-REX value as a native Rust value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum NativeValue {
    /// Numeric value without `.` or exponent that fits an `i64`.
    Integer(i64),
    /// Any other numeric value.
    Float(f64),
    /// Date only.
    Date(NaiveDate),
    /// Time only.
    Time(NaiveTime),
    /// Date and time.
    DateTime(NaiveDateTime),
    /// Boolean.
    Bool(bool),
    /// Alphanumeric or decoded text.
    Text(String),
    /// Decoded binary.
    Bytes(Vec<u8>),
    /// Error placeholder text.
    Error(String),
}

fn format_time(value: NaiveTime) -> String {
    let millis = value.nanosecond() / 1_000_000;
    if value.nanosecond() != 0 {
        format!("{}.{millis:03}", value.format("T%H%M%S"))
    } else if value.second() != 0 {
        value.format("T%H%M%S").to_string()
    } else {
        value.format("T%H%M").to_string()
    }
}

/// Full match of `-?\d+(\.\d+)?(E-?\d+)?`.
fn is_number(v: &str) -> bool {
    fn digits(s: &str) -> usize {
        s.bytes().take_while(u8::is_ascii_digit).count()
    }

    let mut rest = v.strip_prefix('-').unwrap_or(v);
    let n = digits(rest);
    if n == 0 {
        return false;
    }
    rest = &rest[n..];
    if let Some(frac) = rest.strip_prefix('.') {
        let n = digits(frac);
        if n == 0 {
            return false;
        }
        rest = &frac[n..];
    }
    if let Some(exp) = rest.strip_prefix('E') {
        let exp = exp.strip_prefix('-').unwrap_or(exp);
        let n = digits(exp);
        if n == 0 {
            return false;
        }
        rest = &exp[n..];
    }
    rest.is_empty()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateTimeValue {
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateProblem {
    Format,
    Calendar,
}

fn fixed_digits(s: &str, at: usize, len: usize) -> Option<u32> {
    let part = s.get(at..at + len)?;
    if part.bytes().all(|b| b.is_ascii_digit()) {
        part.parse().ok()
    } else {
        None
    }
}

struct TimeParts {
    hour: u32,
    minute: u32,
    second: u32,
    milli: u32,
}

fn split_time(s: &str) -> Option<TimeParts> {
    let t = s.strip_prefix('T')?;
    let hour = fixed_digits(t, 0, 2)?;
    let minute = fixed_digits(t, 2, 2)?;
    let mut at = 4;
    let second = match fixed_digits(t, at, 2) {
        Some(s) => {
            at += 2;
            s
        }
        None => 0,
    };
    let mut milli = 0;
    if t.get(at..at + 1) == Some(".") {
        milli = fixed_digits(t, at + 1, 3)?;
        at += 4;
    }
    (at == t.len()).then_some(TimeParts {
        hour,
        minute,
        second,
        milli,
    })
}

fn parse_date_time(v: &str) -> Result<DateTimeValue, DateProblem> {
    let (date_part, rest) = if v.starts_with(|c: char| c.is_ascii_digit()) {
        let year = fixed_digits(v, 0, 4).ok_or(DateProblem::Format)?;
        let month = fixed_digits(v, 4, 2).ok_or(DateProblem::Format)?;
        let day = fixed_digits(v, 6, 2).ok_or(DateProblem::Format)?;
        (Some((year, month, day)), &v[8..])
    } else {
        (None, v)
    };
    let time_part = if rest.is_empty() {
        None
    } else {
        Some(split_time(rest).ok_or(DateProblem::Format)?)
    };

    let date = match date_part {
        Some((y, m, d)) => Some(
            i32::try_from(y)
                .ok()
                .and_then(|y| NaiveDate::from_ymd_opt(y, m, d))
                .ok_or(DateProblem::Calendar)?,
        ),
        None => None,
    };
    let time = match time_part {
        Some(t) => Some(
            NaiveTime::from_hms_milli_opt(t.hour, t.minute, t.second, t.milli)
                .ok_or(DateProblem::Calendar)?,
        ),
        None => None,
    };

    match (date, time) {
        (Some(d), Some(t)) => Ok(DateTimeValue::DateTime(d.and_time(t))),
        (Some(d), None) => Ok(DateTimeValue::Date(d)),
        (None, Some(t)) => Ok(DateTimeValue::Time(t)),
        (None, None) => Err(DateProblem::Format),
    }
}
