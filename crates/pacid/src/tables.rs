//! # Lookup Tables
//!
//! The read-only data every parser and validator consults: unit codes for
//! T-REX numeric types, well-known segment keys, and category schemas.
//!
//! Tables are passed by reference. [`Tables::shared`] hands out a process-wide
//! builtin instance initialized on first use; tests and callers with their own
//! data build a [`Tables`] value and inject it instead.

use std::sync::OnceLock;

use pacid_core::{KeyTable, UnitTable};

use crate::category::CategorySchemas;

/// The lookups used while parsing and validating.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    /// UNECE unit codes.
    pub units: UnitTable,
    /// Well-known identifier segment keys.
    pub keys: KeyTable,
    /// Category schemas by category key.
    pub categories: CategorySchemas,
}

impl Tables {
    /// The compiled-in tables.
    pub fn builtin() -> Self {
        Self {
            units: UnitTable::builtin(),
            keys: KeyTable::builtin(),
            categories: CategorySchemas::builtin(),
        }
    }

    /// A process-wide builtin instance, built once.
    pub fn shared() -> &'static Tables {
        static SHARED: OnceLock<Tables> = OnceLock::new();
        SHARED.get_or_init(Tables::builtin)
    }
}
