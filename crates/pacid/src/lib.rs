//! # pacid — PAC-ID Identifiers
//!
//! Parses, validates and re-serializes PAC-ID URLs:
//!
//! ```text
//! HTTPS://PAC.METTORIUS.COM/-MD/240:BAL500/21:1234*1T*WEIGHT$KGM:12.5
//! ```
//!
//! - [`segment`]: one `KEY:VALUE` or bare `VALUE` identifier segment.
//! - [`pac_id`]: issuer plus segments, with identifier-level checks.
//! - [`category`]: PAC-CAT categories, schemas, positional and keyed fill.
//! - [`pac_cat`]: an identifier read as a sequence of categories.
//! - [`extension`]: the `*NAME$TYPE/DATA` envelope and its payloads.
//! - [`registry`]: extension type → decoder.
//! - [`url`]: the [`Parser`], its options, and URL rendering.
//! - [`tables`]: injected lookups: units, well-known keys, category schemas.
//!
//! ## Key Design Principles
//!
//! 1. **Representable when malformed.** Anything that tokenizes becomes a tree.
//!    Problems are diagnostics on the node that raised them, read through
//!    [`Validated`]. Only untokenizable input is an `Err`.
//!
//! 2. **Lossless by default.** Segments keep the form they were written in.
//!    [`Notation::Preserve`] gives the input back; `Short` and `Long`
//!    regenerate known categories.
//!
//! 3. **Closed payloads, open registry.** Built-in extension payloads are enum
//!    variants. New extension types are added by registering a decoder that
//!    returns [`ExtensionPayload::Custom`].
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Library code logs through `tracing` and never installs a subscriber.

pub mod category;
pub mod extension;
pub mod pac_cat;
pub mod pac_id;
pub mod registry;
pub mod segment;
pub mod tables;
pub mod url;

pub use category::{Category, CategoryBuilder, CategoryField, CategorySchema, CategorySchemas, FieldSpec};
pub use extension::{CustomExtension, DisplayNameExtension, Extension, ExtensionPayload, TrexExtension};
pub use pac_cat::PacCat;
pub use pac_id::{PacId, MAX_IDENTIFIER_LEN};
pub use registry::{Decoder, ExtensionRegistry};
pub use segment::IdSegment;
pub use tables::Tables;
pub use url::{parse, Notation, ParseOptions, ParsedId, PacUrl, Parser, SerializeOptions};

// The layers below, for callers that only depend on this crate.
pub use pacid_core::{
    base36, Diagnostics, KeyTable, Level, PacError, ParseError, Report, UnitTable, Validated,
    ValidationFailed, ValidationMessage,
};
pub use pacid_trex::{Trex, TrexSegment, TrexType, TrexValue};
