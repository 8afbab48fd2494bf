//! # PAC-ID URLs
//!
//! Parsing and serialization of the full URL form:
//!
//! ```text
//! [HTTPS://][PAC.]ISSUER/SEGMENT[/SEGMENT…][*EXTENSION[*EXTENSION…]]
//! ```
//!
//! ## Failure Channels
//!
//! Only input that cannot be tokenized fails the parse: no issuer, no `/`
//! after the issuer, or a segment with two `:`. Everything else is recorded as
//! diagnostics on the returned tree. [`Parser::parse_strict`] (or
//! [`ParseOptions::strict`]) turns an invalid tree into
//! [`PacError::Validation`].
//!
//! ## Round Trip
//!
//! With [`Notation::Preserve`], `parse(to_url(x)) == x` for every parsed `x`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use pacid_core::{Diagnostics, PacError, ParseError, Validated};

use crate::extension::{parse_extensions, serialize_extensions, Extension};
use crate::pac_cat::PacCat;
use crate::pac_id::{join_segments, PacId};
use crate::registry::ExtensionRegistry;
use crate::segment::IdSegment;
use crate::tables::Tables;

const SCHEME: &str = "HTTPS://";
const HOST_PREFIX: &str = "PAC.";

/// How identifier segments and extensions are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notation {
    /// Identifier as written; extensions shortened where possible.
    #[default]
    Preserve,
    /// Category fields without keys where possible; extensions shortened.
    Short,
    /// Every category field and extension fully keyed.
    Long,
}

impl Notation {
    /// All notations.
    pub fn all_notations() -> &'static [Notation] {
        &[Self::Preserve, Self::Short, Self::Long]
    }

    /// Lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preserve => "preserve",
            Self::Short => "short",
            Self::Long => "long",
        }
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Notation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all_notations()
            .iter()
            .copied()
            .find(|n| n.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown notation {s:?}, expected preserve, short or long"))
    }
}

/// URL rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializeOptions {
    /// Segment and extension notation.
    pub notation: Notation,
    /// Upper-case the whole URL.
    pub uppercase_only: bool,
}

/// What the parser does beyond tokenizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Interpret identifiers that open with a category marker as PAC-CAT.
    pub try_pac_cat: bool,
    /// Run registered decoders over the extensions.
    pub decode_extensions: bool,
    /// Fail with the full message list when the result is invalid.
    pub strict: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            try_pac_cat: true,
            decode_extensions: true,
            strict: false,
        }
    }
}

/// The identifier part of a URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParsedId {
    /// Plain segments.
    Plain(PacId),
    /// Segments grouped into categories.
    Categorized(PacCat),
}

impl ParsedId {
    /// The issuing domain.
    pub fn issuer(&self) -> &str {
        match self {
            Self::Plain(p) => p.issuer(),
            Self::Categorized(c) => c.issuer(),
        }
    }

    /// Identifier segments in `notation`. Plain identifiers ignore it.
    pub fn to_segments(&self, notation: Notation) -> Vec<IdSegment> {
        match self {
            Self::Plain(p) => p.segments().to_vec(),
            Self::Categorized(c) => c.to_segments(notation),
        }
    }

    /// The categorized form, if the identifier has one.
    pub fn as_pac_cat(&self) -> Option<&PacCat> {
        match self {
            Self::Categorized(c) => Some(c),
            Self::Plain(_) => None,
        }
    }

    /// The plain form, converting a categorized identifier back.
    pub fn to_pac_id(&self) -> PacId {
        match self {
            Self::Plain(p) => p.clone(),
            Self::Categorized(c) => c.to_pac_id(),
        }
    }
}

impl Validated for ParsedId {
    fn diagnostics(&self) -> &Diagnostics {
        match self {
            Self::Plain(p) => p.diagnostics(),
            Self::Categorized(c) => c.diagnostics(),
        }
    }

    fn visit_children(&self, visit: &mut dyn FnMut(&dyn Validated)) {
        match self {
            Self::Plain(p) => p.visit_children(visit),
            Self::Categorized(c) => c.visit_children(visit),
        }
    }
}

/// A parsed PAC-ID URL: identifier plus extensions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacUrl {
    id: ParsedId,
    extensions: Vec<Extension>,
    #[serde(skip)]
    diagnostics: Diagnostics,
}

impl PacUrl {
    /// Combine an identifier with extensions.
    pub fn new(id: ParsedId, extensions: Vec<Extension>) -> Self {
        Self {
            id,
            extensions,
            diagnostics: Diagnostics::new(),
        }
    }

    /// The identifier.
    pub fn id(&self) -> &ParsedId {
        &self.id
    }

    /// Extensions in order.
    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    /// The first extension named `name`.
    pub fn extension(&self, name: &str) -> Option<&Extension> {
        self.extensions.iter().find(|e| e.name() == Some(name))
    }

    /// Every extension of type `ext_type`.
    pub fn extensions_of_type<'a>(&'a self, ext_type: &'a str) -> impl Iterator<Item = &'a Extension> + 'a {
        self.extensions
            .iter()
            .filter(move |e| e.ext_type() == Some(ext_type))
    }

    /// Render as a URL.
    pub fn to_url(&self, options: &SerializeOptions) -> String {
        let segments = self.id.to_segments(options.notation);
        let mut url = format!("{SCHEME}{HOST_PREFIX}{}/{}", self.id.issuer(), join_segments(&segments));
        url.push_str(&serialize_extensions(
            &self.extensions,
            options.notation != Notation::Long,
        ));
        if options.uppercase_only {
            url.make_ascii_uppercase();
        }
        url
    }

    /// The tree as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for PacUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url(&SerializeOptions::default()))
    }
}

impl Validated for PacUrl {
    fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn visit_children(&self, visit: &mut dyn FnMut(&dyn Validated)) {
        visit(&self.id);
        for e in &self.extensions {
            visit(e);
        }
    }
}

/// URL parser with its tables, extension decoders and options.
#[derive(Debug, Clone)]
pub struct Parser {
    tables: Tables,
    registry: ExtensionRegistry,
    options: ParseOptions,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Builtin tables, default decoders, default options.
    pub fn new() -> Self {
        Self {
            tables: Tables::builtin(),
            registry: ExtensionRegistry::default(),
            options: ParseOptions::default(),
        }
    }

    /// Use `tables` for lookups.
    pub fn with_tables(mut self, tables: Tables) -> Self {
        self.tables = tables;
        self
    }

    /// Use `registry` for extension decoding.
    pub fn with_registry(mut self, registry: ExtensionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Use `options`.
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// The lookup tables in use.
    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    /// The options in use.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse a URL. Fails on structural errors, and on validation errors when
    /// the options ask for strictness.
    pub fn parse(&self, url: &str) -> Result<PacUrl, PacError> {
        let parsed = self.parse_lenient(url)?;
        if self.options.strict {
            parsed.ensure_valid()?;
        }
        Ok(parsed)
    }

    /// Parse a URL and fail unless it is valid.
    pub fn parse_strict(&self, url: &str) -> Result<PacUrl, PacError> {
        let parsed = self.parse_lenient(url)?;
        parsed.ensure_valid()?;
        Ok(parsed)
    }

    fn parse_lenient(&self, url: &str) -> Result<PacUrl, PacError> {
        tracing::debug!(url, "parsing PAC-ID URL");
        let (id_part, tail) = match url.split_once('*') {
            Some((id, tail)) => (id, Some(tail)),
            None => (url, None),
        };

        let pac_id = self.parse_pac_id(id_part)?;
        let categorized = self
            .options
            .try_pac_cat
            .then(|| PacCat::try_from_pac_id(&pac_id, &self.tables))
            .flatten();
        let id = match categorized {
            Some(cat) => ParsedId::Categorized(cat),
            None => ParsedId::Plain(pac_id),
        };

        let mut extensions = tail.map(parse_extensions).unwrap_or_default();
        if self.options.decode_extensions {
            extensions = extensions
                .into_iter()
                .map(|e| self.registry.decode(e, &self.tables))
                .collect();
        }
        Ok(PacUrl::new(id, extensions))
    }

    /// Parse the identifier part only (everything before the first `*`).
    pub fn parse_pac_id(&self, input: &str) -> Result<PacId, ParseError> {
        let rest = strip_prefix_ignore_case(input, SCHEME);
        let rest = strip_prefix_ignore_case(rest, HOST_PREFIX);

        let Some((issuer, identifier)) = rest.split_once('/') else {
            return Err(if rest.is_empty() {
                ParseError::MissingIssuer {
                    input: input.to_string(),
                }
            } else {
                ParseError::MissingIdentifier {
                    input: input.to_string(),
                }
            });
        };
        if issuer.is_empty() {
            return Err(ParseError::MissingIssuer {
                input: input.to_string(),
            });
        }

        let identifier = identifier.strip_prefix('/').unwrap_or(identifier);
        let segments = if identifier.is_empty() {
            Vec::new()
        } else {
            identifier
                .split('/')
                .map(|token| IdSegment::parse(token, &self.tables.keys))
                .collect::<Result<Vec<_>, _>>()?
        };
        Ok(PacId::new(issuer, segments))
    }
}

/// Parse with the default parser.
pub fn parse(url: &str) -> Result<PacUrl, PacError> {
    Parser::new().parse(url)
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> &'a str {
    match s.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &s[prefix.len()..],
        _ => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacid_core::Level;

    fn parse_url(url: &str) -> PacUrl {
        Parser::new().parse(url).unwrap()
    }

    fn render(url: &PacUrl, notation: Notation) -> String {
        url.to_url(&SerializeOptions {
            notation,
            uppercase_only: false,
        })
    }

    #[test]
    fn test_prefix_stripping() {
        for url in [
            "HTTPS://PAC.METTORIUS.COM/21:1234",
            "https://pac.METTORIUS.COM/21:1234",
            "PAC.METTORIUS.COM/21:1234",
            "METTORIUS.COM/21:1234",
        ] {
            let p = parse_url(url);
            assert_eq!(p.id().issuer(), "METTORIUS.COM", "{url}");
            assert_eq!(p.to_string(), "HTTPS://PAC.METTORIUS.COM/21:1234");
        }
    }

    #[test]
    fn test_structural_errors() {
        let parser = Parser::new();
        assert!(matches!(
            parser.parse("HTTPS://PAC."),
            Err(PacError::Parse(ParseError::MissingIssuer { .. }))
        ));
        assert!(matches!(
            parser.parse("HTTPS://PAC./21:1"),
            Err(PacError::Parse(ParseError::MissingIssuer { .. }))
        ));
        assert!(matches!(
            parser.parse("HTTPS://PAC.METTORIUS.COM"),
            Err(PacError::Parse(ParseError::MissingIdentifier { .. }))
        ));
        assert!(matches!(
            parser.parse("HTTPS://PAC.METTORIUS.COM/A:B:C"),
            Err(PacError::Parse(ParseError::AmbiguousSegment { .. }))
        ));
    }

    #[test]
    fn test_empty_identifier_is_diagnostic() {
        let p = parse_url("HTTPS://PAC.METTORIUS.COM/");
        assert!(!p.is_valid());
        assert!(p.id().to_segments(Notation::Preserve).is_empty());
    }

    #[test]
    fn test_doubled_slash_after_issuer() {
        let p = parse_url("HTTPS://PAC.METTORIUS.COM//21:1234");
        assert_eq!(p.to_string(), "HTTPS://PAC.METTORIUS.COM/21:1234");
    }

    #[test]
    fn test_pac_cat_detection() {
        let p = parse_url("HTTPS://PAC.METTORIUS.COM/-MD/240:B-800/21:12345");
        assert!(p.id().as_pac_cat().is_some());

        let plain = Parser::new()
            .with_options(ParseOptions {
                try_pac_cat: false,
                ..ParseOptions::default()
            })
            .parse("HTTPS://PAC.METTORIUS.COM/-MD/240:B-800/21:12345")
            .unwrap();
        assert!(plain.id().as_pac_cat().is_none());
    }

    #[test]
    fn test_notations() {
        let base = "HTTPS://PAC.METTORIUS.COM/";
        let keyed = parse_url(&format!("{base}-MD/240:B-800/21:12345"));
        assert_eq!(render(&keyed, Notation::Preserve), format!("{base}-MD/240:B-800/21:12345"));
        assert_eq!(render(&keyed, Notation::Short), format!("{base}-MD/B-800/12345"));

        let bare = parse_url(&format!("{base}-MD/B-800/12345"));
        assert_eq!(render(&bare, Notation::Preserve), format!("{base}-MD/B-800/12345"));
        assert_eq!(render(&bare, Notation::Long), format!("{base}-MD/240:B-800/21:12345"));
    }

    #[test]
    fn test_uppercase_only() {
        let p = parse_url("pac.mettorius.com/abc");
        let url = p.to_url(&SerializeOptions {
            notation: Notation::Preserve,
            uppercase_only: true,
        });
        assert_eq!(url, "HTTPS://PAC.METTORIUS.COM/ABC");
    }

    #[test]
    fn test_strict_parsing() {
        let parser = Parser::new();
        let err = parser.parse_strict("HTTPS://PAC.METTORIUS.COM/-MD/KEY:VAL").unwrap_err();
        match err {
            PacError::Validation(v) => assert!(v
                .messages()
                .iter()
                .any(|m| m.level == Level::Error && m.text.contains("Model Number"))),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(parser.parse("HTTPS://PAC.METTORIUS.COM/-MD/KEY:VAL").is_ok());

        let strict = Parser::new().with_options(ParseOptions {
            strict: true,
            ..ParseOptions::default()
        });
        assert!(strict.parse("HTTPS://PAC.METTORIUS.COM/-MD/KEY:VAL").is_err());
    }

    #[test]
    fn test_extension_lookup() {
        let p = parse_url("HTTPS://PAC.METTORIUS.COM/21:1*1T*A$T.A:X*FOO$T/DATA*BAR$T/MORE");
        assert_eq!(p.extension("N").and_then(Extension::as_display_name), Some("A"));
        assert!(p.extension("SUM").and_then(Extension::as_trex).is_some());
        assert_eq!(p.extensions_of_type("T").count(), 2);
    }

    #[test]
    fn test_notation_from_str() {
        assert_eq!("SHORT".parse::<Notation>(), Ok(Notation::Short));
        assert!("tiny".parse::<Notation>().is_err());
        for n in Notation::all_notations() {
            assert_eq!(n.as_str().parse::<Notation>(), Ok(*n));
        }
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let o: ParseOptions = serde_json::from_str(r#"{"strict": true}"#).unwrap();
        assert!(o.strict && o.try_pac_cat && o.decode_extensions);
    }
}
