//! # pacid-trex — Typed Data Inside an Identifier
//!
//! T-REX packs typed scalars and tables into the restricted character set of
//! a PAC-ID extension:
//!
//! ```text
//! WEIGHT$KGM:12.5+DONE$T.B:T+LOG$$T$T.D:V$CEL::T0800:21.5::T0900:22
//! ```
//!
//! - [`value`]: type tags, value classes and their grammars, native conversion.
//! - [`segment`]: scalar segments and the segment sum type.
//! - [`table`]: table segments and their shape checks.
//! - [`trex`]: the `+`-joined container.
//!
//! Unit codes are checked against an injected [`pacid_core::UnitTable`].
//!
//! ## Round Trip
//!
//! Raw text is kept verbatim in every value, so `serialize(parse(s)) == s` for
//! every input either grammar accepts, valid or not.

pub mod segment;
pub mod table;
pub mod trex;
pub mod value;

pub use segment::{TrexSegment, ValueSegment};
pub use table::{ColumnHeader, TableSegment};
pub use trex::{NativeSegment, Trex};
pub use value::{NativeValue, TrexType, TrexValue, ValueProblem};
