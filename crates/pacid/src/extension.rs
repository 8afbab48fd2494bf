//! # Extension Envelope
//!
//! Everything after the first `*` of a PAC-ID URL is a `*`-separated list of
//! extensions. Each is `NAME$TYPE/DATA`, or bare `DATA` at the first two
//! positions, where `(N, N)` and `(SUM, TREX)` are implied. The first explicit
//! `NAME$TYPE/` prefix switches the implied names off for everything after it.
//!
//! The envelope keeps `DATA` opaque. Decoders in the
//! [`ExtensionRegistry`](crate::registry::ExtensionRegistry) turn it into a
//! richer [`ExtensionPayload`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use pacid_core::{base36, Base36Error, Diagnostics, Level, Validated};
use pacid_trex::Trex;

/// Implied `(name, type)` of a bare extension, by position.
pub const POSITIONAL_DEFAULTS: [(&str, &str); 2] = [("N", "N"), ("SUM", "TREX")];

/// Name and type of the display-name extension.
pub const DISPLAY_NAME: &str = "N";

/// Type of T-REX extensions.
pub const TREX_TYPE: &str = "TREX";

/// An extension type supplied by a caller.
///
/// Registered decoders produce these; the envelope keeps them behind an `Arc`
/// and reaches the concrete type through [`as_any`](Self::as_any).
pub trait CustomExtension: fmt::Debug + Send + Sync + 'static {
    /// Wire form of the data part.
    fn data(&self) -> String;

    /// For downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Structured form for JSON output.
    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::String(self.data())
    }

    /// The extension as a diagnostics node, if it carries any.
    fn as_validated(&self) -> Option<&dyn Validated> {
        None
    }
}

/// A human readable display name, base36 encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayNameExtension {
    display_name: String,
}

impl DisplayNameExtension {
    /// Wrap a display name.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }

    /// Decode a base36 data token.
    pub fn decode(data: &str) -> Result<Self, Base36Error> {
        base36::decode(data).map(Self::new)
    }

    /// The display name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Wire form.
    pub fn data(&self) -> String {
        base36::encode(&self.display_name).into_string()
    }
}

/// T-REX data carried in an extension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrexExtension {
    trex: Trex,
}

impl TrexExtension {
    /// Wrap a T-REX container.
    pub fn new(trex: Trex) -> Self {
        Self { trex }
    }

    /// The container.
    pub fn trex(&self) -> &Trex {
        &self.trex
    }

    /// Wire form.
    pub fn data(&self) -> String {
        self.trex.serialize()
    }
}

/// What an extension's data was decoded into.
#[derive(Debug, Clone)]
pub enum ExtensionPayload {
    /// Opaque data; no decoder ran or none matched.
    Generic(String),
    /// `N` display name.
    DisplayName(DisplayNameExtension),
    /// `TREX` data.
    Trex(TrexExtension),
    /// A caller-registered type.
    Custom(Arc<dyn CustomExtension>),
}

impl ExtensionPayload {
    /// Wire form of the data part.
    pub fn data(&self) -> String {
        match self {
            Self::Generic(data) => data.clone(),
            Self::DisplayName(d) => d.data(),
            Self::Trex(t) => t.data(),
            Self::Custom(c) => c.data(),
        }
    }
}

impl PartialEq for ExtensionPayload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Generic(a), Self::Generic(b)) => a == b,
            (Self::DisplayName(a), Self::DisplayName(b)) => a == b,
            (Self::Trex(a), Self::Trex(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => a.data() == b.data(),
            _ => false,
        }
    }
}

/// One extension of a PAC-ID URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    name: Option<String>,
    ext_type: Option<String>,
    payload: ExtensionPayload,
    diagnostics: Diagnostics,
}

impl Extension {
    /// A generic extension. Name and type come as a pair; having neither is
    /// legal but discouraged.
    pub fn new(name: Option<String>, ext_type: Option<String>, data: impl Into<String>) -> Self {
        Self::with_payload(name, ext_type, ExtensionPayload::Generic(data.into()))
    }

    /// A display-name extension.
    pub fn display_name(display_name: impl Into<String>) -> Self {
        Self::with_payload(
            Some(DISPLAY_NAME.to_string()),
            Some(DISPLAY_NAME.to_string()),
            ExtensionPayload::DisplayName(DisplayNameExtension::new(display_name)),
        )
    }

    /// A T-REX extension named `name`.
    pub fn trex(name: impl Into<String>, trex: Trex) -> Self {
        Self::with_payload(
            Some(name.into()),
            Some(TREX_TYPE.to_string()),
            ExtensionPayload::Trex(TrexExtension::new(trex)),
        )
    }

    /// An extension carrying a caller-defined payload.
    pub fn custom(
        name: impl Into<String>,
        ext_type: impl Into<String>,
        payload: Arc<dyn CustomExtension>,
    ) -> Self {
        Self::with_payload(
            Some(name.into()),
            Some(ext_type.into()),
            ExtensionPayload::Custom(payload),
        )
    }

    fn with_payload(name: Option<String>, ext_type: Option<String>, payload: ExtensionPayload) -> Self {
        let mut diagnostics = Diagnostics::new();
        let source = format!("Extension {}", name.as_deref().unwrap_or_default());
        match (&name, &ext_type) {
            (Some(_), None) => diagnostics.add(
                Level::Error,
                source,
                "Extension has a name, but no type. Name and type must be given together",
            ),
            (None, Some(t)) => diagnostics.add(
                Level::Error,
                source,
                format!("Extension has type {t}, but no name. Name and type must be given together"),
            ),
            (None, None) => diagnostics.add(
                Level::Recommendation,
                source,
                "Extensions has no name and type. It is RECOMMENDED to specify name and type.",
            ),
            (Some(_), Some(_)) => {}
        }
        Self {
            name,
            ext_type,
            payload,
            diagnostics,
        }
    }

    /// Record a message on this extension.
    pub(crate) fn with_message(mut self, level: Level, text: impl Into<String>) -> Self {
        let source = format!("Extension {}", self.name.as_deref().unwrap_or_default());
        let data = self.data();
        let m = self.diagnostics.message(level, source, text).with_highlight(data);
        self.diagnostics.push(m);
        self
    }

    /// Extension name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Extension type.
    pub fn ext_type(&self) -> Option<&str> {
        self.ext_type.as_deref()
    }

    /// The decoded payload.
    pub fn payload(&self) -> &ExtensionPayload {
        &self.payload
    }

    /// Wire form of the data part.
    pub fn data(&self) -> String {
        self.payload.data()
    }

    /// The display name, for a decoded `N` extension.
    pub fn as_display_name(&self) -> Option<&str> {
        match &self.payload {
            ExtensionPayload::DisplayName(d) => Some(d.display_name()),
            _ => None,
        }
    }

    /// The container, for a decoded `TREX` extension.
    pub fn as_trex(&self) -> Option<&Trex> {
        match &self.payload {
            ExtensionPayload::Trex(t) => Some(t.trex()),
            _ => None,
        }
    }

    /// The caller-defined payload, if it is a `T`.
    pub fn as_custom<T: CustomExtension>(&self) -> Option<&T> {
        match &self.payload {
            ExtensionPayload::Custom(c) => c.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// `NAME$TYPE/DATA`, or bare `DATA` when name or type is missing.
    pub fn serialize(&self) -> String {
        match (&self.name, &self.ext_type) {
            (Some(n), Some(t)) => format!("{n}${t}/{}", self.data()),
            _ => self.data(),
        }
    }

    /// Split one raw extension into its parts.
    ///
    /// The prefix is the longest `NAME$TYPE/` that still leaves data behind;
    /// without one the whole text is data.
    pub fn split_envelope(raw: &str) -> (Option<(&str, &str)>, &str) {
        let Some(slash) = raw
            .char_indices()
            .filter(|(i, c)| *c == '/' && *i + 1 < raw.len())
            .map(|(i, _)| i)
            .last()
        else {
            return (None, raw);
        };
        let dollar = raw[..slash]
            .char_indices()
            .filter(|(i, c)| *c == '$' && *i >= 1 && *i + 1 < slash)
            .map(|(i, _)| i)
            .last();
        match dollar {
            Some(d) => (Some((&raw[..d], &raw[d + 1..slash])), &raw[slash + 1..]),
            None => (None, raw),
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl Serialize for Extension {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Extension", 4)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("type", &self.ext_type)?;
        s.serialize_field("data", &self.data())?;
        match &self.payload {
            ExtensionPayload::Generic(_) => {}
            ExtensionPayload::DisplayName(d) => s.serialize_field("display_name", d.display_name())?,
            ExtensionPayload::Trex(t) => s.serialize_field("trex", t.trex())?,
            ExtensionPayload::Custom(c) => s.serialize_field("custom", &c.to_json())?,
        }
        s.end()
    }
}

impl Validated for Extension {
    fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn visit_children(&self, visit: &mut dyn FnMut(&dyn Validated)) {
        match &self.payload {
            ExtensionPayload::Trex(t) => visit(t.trex()),
            ExtensionPayload::Custom(c) => {
                if let Some(v) = c.as_validated() {
                    visit(v);
                }
            }
            ExtensionPayload::Generic(_) | ExtensionPayload::DisplayName(_) => {}
        }
    }
}

/// Split the `*`-separated extension tail into generic extensions.
///
/// Empty pieces are skipped but still count as positions.
pub fn parse_extensions(tail: &str) -> Vec<Extension> {
    let mut defaults_active = true;
    let mut out = Vec::new();
    for (position, raw) in tail.split('*').enumerate() {
        if raw.is_empty() {
            continue;
        }
        let (prefix, data) = Extension::split_envelope(raw);
        let ext = match prefix {
            Some((name, ext_type)) => {
                defaults_active = false;
                Extension::new(Some(name.to_string()), Some(ext_type.to_string()), data)
            }
            None => match POSITIONAL_DEFAULTS.get(position).filter(|_| defaults_active) {
                Some((name, ext_type)) => {
                    Extension::new(Some(name.to_string()), Some(ext_type.to_string()), data)
                }
                None => Extension::new(None, None, data)
                    .with_message(Level::Error, "Extension must have name and type"),
            },
        };
        out.push(ext);
    }
    out
}

/// Extensions in wire form, each preceded by `*`.
///
/// With `short`, the first two extensions are written as bare data when they
/// carry their positional default and the bare form reads back the same way.
/// The first extension that cannot be shortened ends shortening.
pub fn serialize_extensions(extensions: &[Extension], short: bool) -> String {
    let mut short = short;
    let mut out = String::new();
    for (i, ext) in extensions.iter().enumerate() {
        out.push('*');
        if short {
            let next_is_bare = extensions.get(i + 1).is_some_and(|e| e.name().is_none());
            let shortenable = POSITIONAL_DEFAULTS.get(i).is_some_and(|(n, t)| {
                ext.name() == Some(*n) && ext.ext_type() == Some(*t)
            });
            let data = ext.data();
            if shortenable && !(i == 0 && next_is_bare) && Extension::split_envelope(&data).0.is_none() {
                out.push_str(&data);
                continue;
            }
            short = false;
        }
        out.push_str(&ext.serialize());
    }
    out
}
