//! # pacid-core — Foundational Types for the PAC-ID Stack
//!
//! The leaf crate of the workspace. It holds what every layer above needs and
//! nothing that knows about identifiers or T-REX grammar.
//!
//! ## Key Design Principles
//!
//! 1. **Two failure channels.** Structural failures are `Result` errors
//!    ([`ParseError`], [`Base36Error`]). Semantic problems are leveled
//!    [`ValidationMessage`]s owned by the node that raised them, aggregated on
//!    demand through the [`Validated`] trait.
//!
//! 2. **Identity-based aggregation.** Every node's [`Diagnostics`] carries a
//!    [`NodeId`]. Collecting messages over a tree visits each identity once, so
//!    shared or cloned sub-trees never report twice.
//!
//! 3. **Injected lookups.** Well-known keys and unit codes live in
//!    [`KeyTable`] and [`UnitTable`] values with a `builtin()` constructor.
//!    Nothing reads a global table.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `pacid-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod base36;
pub mod charset;
pub mod diagnostics;
pub mod error;
pub mod keys;
pub mod units;

// Re-export primary types for ergonomic imports.
pub use base36::Base36;
pub use diagnostics::{Diagnostics, Level, NodeId, Report, Validated, ValidationMessage};
pub use error::{Base36Error, ConversionError, LookupError, PacError, ParseError, ValidationFailed};
pub use keys::{KeyTable, WellKnownKey};
pub use units::{Unit, UnitTable};
