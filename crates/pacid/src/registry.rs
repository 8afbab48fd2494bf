//! # Extension Registry
//!
//! Maps an extension type to the decoder that turns the generic envelope into
//! a richer payload. The default registry knows `N` (display name) and `TREX`.
//! Callers register more without touching the envelope grammar.
//!
//! A decoder that fails leaves the generic envelope in place and records the
//! failure on it as an error, so the rest of the URL stays usable.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use pacid_core::{Level, PacError, ParseError};
use pacid_trex::Trex;

use crate::extension::{DisplayNameExtension, Extension, DISPLAY_NAME, TREX_TYPE};
use crate::tables::Tables;

/// Re-interprets a generic extension as a richer one.
pub type Decoder = Arc<dyn Fn(&Extension, &Tables) -> Result<Extension, PacError> + Send + Sync>;

/// Extension type → decoder.
#[derive(Clone)]
pub struct ExtensionRegistry {
    decoders: BTreeMap<String, Decoder>,
}

impl ExtensionRegistry {
    /// A registry without any decoder.
    pub fn empty() -> Self {
        Self {
            decoders: BTreeMap::new(),
        }
    }

    /// Register `decoder` for `ext_type`, replacing any previous one.
    pub fn register<F>(&mut self, ext_type: impl Into<String>, decoder: F) -> &mut Self
    where
        F: Fn(&Extension, &Tables) -> Result<Extension, PacError> + Send + Sync + 'static,
    {
        self.decoders.insert(ext_type.into(), Arc::new(decoder));
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<F>(mut self, ext_type: impl Into<String>, decoder: F) -> Self
    where
        F: Fn(&Extension, &Tables) -> Result<Extension, PacError> + Send + Sync + 'static,
    {
        self.register(ext_type, decoder);
        self
    }

    /// Whether a decoder exists for `ext_type`.
    pub fn contains(&self, ext_type: &str) -> bool {
        self.decoders.contains_key(ext_type)
    }

    /// Registered types, sorted.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.decoders.keys().map(String::as_str)
    }

    /// Run the decoder registered for the extension's type.
    ///
    /// Extensions without type or without decoder are returned unchanged.
    pub fn decode(&self, extension: Extension, tables: &Tables) -> Extension {
        let Some(decoder) = extension.ext_type().and_then(|t| self.decoders.get(t)) else {
            return extension;
        };
        tracing::debug!(
            name = extension.name().unwrap_or_default(),
            ext_type = extension.ext_type().unwrap_or_default(),
            "decoding extension"
        );
        match decoder(&extension, tables) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(extension = %extension, error = %e, "extension decoding failed");
                let text = format!(
                    "Extension could not be decoded as type {}: {e}",
                    extension.ext_type().unwrap_or_default()
                );
                extension.with_message(Level::Error, text)
            }
        }
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::empty()
            .with(DISPLAY_NAME, decode_display_name)
            .with(TREX_TYPE, decode_trex)
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("types", &self.types().collect::<Vec<_>>())
            .finish()
    }
}

/// Decode the data as a base36 display name.
///
/// Any name other than `N` is replaced by `N` and noted as a warning.
pub fn decode_display_name(extension: &Extension, _tables: &Tables) -> Result<Extension, PacError> {
    let data = extension.data();
    let payload = DisplayNameExtension::decode(&data).map_err(|e| ParseError::MalformedExtension {
        extension: extension.serialize(),
        reason: e.to_string(),
    })?;
    let decoded = Extension::display_name(payload.display_name());
    match extension.name() {
        Some(DISPLAY_NAME) => Ok(decoded),
        other => {
            let name = other.unwrap_or_default();
            tracing::warn!(name, "display name extension with unexpected name, using N");
            Ok(decoded.with_message(
                Level::Warning,
                format!("Name {name} was given, but this extension should only be used with name \"N\". The name was replaced"),
            ))
        }
    }
}

/// Decode the data as T-REX, checking units against `tables`.
pub fn decode_trex(extension: &Extension, tables: &Tables) -> Result<Extension, PacError> {
    let trex = Trex::parse(&extension.data(), &tables.units)?;
    Ok(Extension::trex(extension.name().unwrap_or("SUM"), trex))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacid_core::Validated;

    fn generic(name: &str, ext_type: &str, data: &str) -> Extension {
        Extension::new(Some(name.to_string()), Some(ext_type.to_string()), data)
    }

    #[test]
    fn test_default_types() {
        let r = ExtensionRegistry::default();
        assert_eq!(r.types().collect::<Vec<_>>(), vec!["N", "TREX"]);
        assert!(!ExtensionRegistry::empty().contains("N"));
    }

    #[test]
    fn test_display_name_decoding() {
        let r = ExtensionRegistry::default();
        let ext = r.decode(generic("N", "N", "1T"), Tables::shared());
        assert_eq!(ext.as_display_name(), Some("A"));
        assert!(ext.own_messages().is_empty());
    }

    #[test]
    fn test_display_name_with_other_name_warns() {
        let r = ExtensionRegistry::default();
        let ext = r.decode(generic("X", "N", "1T"), Tables::shared());
        assert_eq!(ext.name(), Some("N"));
        assert!(ext.is_valid());
        assert_eq!(ext.warnings()[0].level, Level::Warning);
    }

    #[test]
    fn test_trex_decoding() {
        let r = ExtensionRegistry::default();
        let ext = r.decode(generic("SUM", "TREX", "A$T.A:X+B$HUR:1"), Tables::shared());
        assert_eq!(ext.as_trex().map(Trex::keys), Some(vec!["A", "B"]));
        assert_eq!(ext.data(), "A$T.A:X+B$HUR:1");
    }

    #[test]
    fn test_failed_decoding_keeps_envelope() {
        let r = ExtensionRegistry::default();
        let ext = r.decode(generic("SUM", "TREX", "DEF"), Tables::shared());
        assert_eq!(ext.data(), "DEF");
        assert!(ext.as_trex().is_none());
        assert!(!ext.is_valid());
        assert!(ext.errors()[0].text.starts_with("Extension could not be decoded as type TREX"));
    }

    #[test]
    fn test_unknown_type_untouched() {
        let r = ExtensionRegistry::default();
        let ext = generic("FOO", "BAR", "DATA");
        assert_eq!(r.decode(ext.clone(), Tables::shared()), ext);
    }

    #[test]
    fn test_closure_decoder() {
        let mut r = ExtensionRegistry::empty();
        r.register("UP", |e: &Extension, _: &Tables| {
            Ok(Extension::new(
                e.name().map(String::from),
                e.ext_type().map(String::from),
                e.data().to_uppercase(),
            ))
        });
        let ext = r.decode(generic("X", "UP", "abc"), Tables::shared());
        assert_eq!(ext.data(), "ABC");
    }
}
