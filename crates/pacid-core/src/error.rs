//! # Error Types — Structural Failures vs. Aggregated Diagnostics
//!
//! The PAC-ID stack has two failure channels and they never mix:
//!
//! - **Structural** failures mean the text cannot be tokenized at all. They
//!   are returned immediately as [`ParseError`] (or [`Base36Error`] for the
//!   text codec) and no partial value exists.
//! - **Semantic** problems are recorded as leveled
//!   [`ValidationMessage`](crate::diagnostics::ValidationMessage)s on the node
//!   that raised them. They only become an error when a caller asks for strict
//!   behaviour, in which case every message is wrapped in one
//!   [`ValidationFailed`].
//!
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.

use std::fmt;

use thiserror::Error;

use crate::diagnostics::ValidationMessage;

/// Top-level error type for the PAC-ID stack.
#[derive(Error, Debug)]
pub enum PacError {
    /// The input could not be tokenized.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A base36 token could not be decoded.
    #[error("base36 error: {0}")]
    Base36(#[from] Base36Error),

    /// The input parsed, but strict validation was requested and failed.
    #[error(transparent)]
    Validation(#[from] ValidationFailed),

    /// A lookup table has no entry for the requested code.
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// A value could not be converted to or from a native representation.
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),
}

/// Structural failure while tokenizing a PAC-ID, an extension, or a T-REX blob.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing precedes the first `/`, so there is no issuer.
    #[error("missing issuer in {input:?}")]
    MissingIssuer {
        /// The offending input.
        input: String,
    },

    /// The issuer is not followed by a `/` and an identifier.
    #[error("missing identifier after issuer in {input:?}")]
    MissingIdentifier {
        /// The offending input.
        input: String,
    },

    /// An identifier segment contains more than one `:`.
    #[error("ambiguous segment {segment:?}: more than one ':'")]
    AmbiguousSegment {
        /// The raw segment text.
        segment: String,
    },

    /// A T-REX blob was empty.
    #[error("T-REX must be a string of non-zero length")]
    EmptyTrex,

    /// A T-REX segment matches neither the scalar nor the table grammar.
    #[error("T-REX segment {segment:?} is neither a value segment nor a table")]
    UnrecognizedTrexSegment {
        /// The raw segment text.
        segment: String,
    },

    /// An extension could not be split into name, type and data.
    #[error("malformed extension {extension:?}: {reason}")]
    MalformedExtension {
        /// The raw extension text.
        extension: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Failure to decode a base36 token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Base36Error {
    /// Decoding needs at least one digit.
    #[error("base36 token is empty")]
    Empty,

    /// A character outside `[0-9A-Za-z]` was found.
    #[error("invalid base36 digit {character:?} in {token:?}")]
    InvalidDigit {
        /// The offending token.
        token: String,
        /// The first character that is not a base36 digit.
        character: char,
    },

    /// The reconstructed bytes are not valid UTF-8.
    #[error("base36 token {token:?} does not decode to valid UTF-8")]
    InvalidUtf8 {
        /// The offending token.
        token: String,
    },
}

/// A code is missing from one of the read-only lookup tables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Not a well-known segment key.
    #[error("unknown well-known key: {key:?}")]
    UnknownKey {
        /// The requested key.
        key: String,
    },

    /// Not an active UNECE common code.
    #[error("unknown or inactive unit code: {code:?}")]
    UnknownUnit {
        /// The requested code.
        code: String,
    },
}

/// A T-REX value cannot be turned into a native value, or the reverse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The raw text does not follow the grammar of its type.
    #[error("{value:?} is not a valid {kind} value")]
    InvalidValue {
        /// The raw value text.
        value: String,
        /// The T-REX type it was read as.
        kind: String,
    },

    /// Floating point input that has no T-REX representation.
    #[error("number {0} is not finite")]
    NonFinite(String),

    /// A text or binary value is not a decodable base36 token.
    #[error(transparent)]
    Base36(#[from] Base36Error),
}

/// Strict validation failed; carries every message of the rejected tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub struct ValidationFailed {
    messages: Vec<ValidationMessage>,
}

impl ValidationFailed {
    /// Wrap the full message list of an invalid node.
    pub fn new(messages: Vec<ValidationMessage>) -> Self {
        Self { messages }
    }

    /// All messages, errors and recommendations alike.
    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_messages(self) -> Vec<ValidationMessage> {
        self.messages
    }
}

impl fmt::Display for ValidationFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self
            .messages
            .iter()
            .filter(|m| m.level.is_error())
            .count();
        write!(f, "validation failed with {errors} error(s)")?;
        for m in &self.messages {
            write!(f, "\n  {m}")?;
        }
        Ok(())
    }
}
