//! # pacid-cli — PAC-ID Command-Line Interface
//!
//! A thin surface over the `pacid` library.
//!
//! ## Subcommands
//!
//! - `parse`: print the parsed tree of a URL
//! - `validate`: print diagnostics; exit status 1 when invalid
//! - `serialize`: re-render a URL in preserve, short or long notation
//! - `encode` / `decode`: base36 text codec
//! - `trex`: inspect a T-REX blob
//!
//! ## Crate Policy
//!
//! - Argument structs are separated from handlers.
//! - Handlers write to a caller-supplied sink and delegate to the library.

pub mod codec;
pub mod options;
pub mod parse;
pub mod serialize;
pub mod trex;
pub mod validate;
