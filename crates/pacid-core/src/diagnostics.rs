//! # Diagnostics — Leveled Validation Messages
//!
//! Every structured node of the PAC-ID stack (identifier segments, PAC-IDs,
//! categories, extensions, T-REX segments, …) owns a [`Diagnostics`] list.
//! Parsing and construction never fail on a semantic problem: the node is
//! built, and the problem is recorded next to it as a [`ValidationMessage`].
//!
//! ## Aggregation
//!
//! The [`Validated`] trait exposes a node's own messages plus a way to visit
//! its child nodes. [`Validated::all_messages`] walks the tree and collects
//! everything, visiting each [`NodeId`] at most once. A node that is reachable
//! along two paths (a segment that is both part of the identifier and of a
//! category view, or a cloned sub-tree) therefore reports its messages once.
//!
//! "Valid" means no [`Level::Error`] message anywhere in the subtree.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationFailed;

/// Severity of a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// The node is **invalid**.
    Error,
    /// The node is valid, but something was silently reinterpreted.
    Warning,
    /// The node is valid, but a recommendation of the format is not followed.
    Recommendation,
    /// The node is valid; something of interest was noticed.
    Info,
}

impl Level {
    /// Returns all levels from most to least severe.
    pub fn all_levels() -> &'static [Level] {
        &[Self::Error, Self::Warning, Self::Recommendation, Self::Info]
    }

    /// Upper-case label used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Recommendation => "RECOMMENDATION",
            Self::Info => "INFO",
        }
    }

    /// True only for [`Level::Error`].
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one diagnostics-carrying node.
///
/// Clones of a node share its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Generate a fresh node identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// One problem found on one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationMessage {
    /// Node that raised the message.
    pub source_id: NodeId,
    /// Human-readable location, e.g. `"id segment key 21"`.
    pub source: String,
    /// Severity.
    pub level: Level,
    /// Description of the problem.
    pub text: String,
    /// Text span of the serialized node the message refers to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub highlight: String,
    /// Substrings of `highlight` that are the actual culprits.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlight_sub: Vec<String>,
}

impl ValidationMessage {
    /// Create a message without highlighting.
    pub fn new(
        source_id: NodeId,
        source: impl Into<String>,
        level: Level,
        text: impl Into<String>,
    ) -> Self {
        Self {
            source_id,
            source: source.into(),
            level,
            text: text.into(),
            highlight: String::new(),
            highlight_sub: Vec::new(),
        }
    }

    /// Set the highlighted span.
    pub fn with_highlight(mut self, highlight: impl Into<String>) -> Self {
        self.highlight = highlight.into();
        self
    }

    /// Set the culprit substrings within the highlighted span.
    pub fn with_highlight_sub<I, S>(mut self, sub: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.highlight_sub = sub.into_iter().map(Into::into).collect();
        self
    }

    /// Return `text` with every occurrence of the highlighted patterns wrapped
    /// by `mark`.
    ///
    /// The culprit substrings are used when present, the whole highlight
    /// otherwise. Longer patterns win over shorter ones starting at the same
    /// position.
    pub fn emphasize_in(&self, text: &str, mark: impl Fn(&str) -> String) -> String {
        let mut patterns: Vec<&str> = if self.highlight_sub.is_empty() {
            vec![self.highlight.as_str()]
        } else {
            self.highlight_sub.iter().map(String::as_str).collect()
        };
        patterns.retain(|p| !p.is_empty());
        patterns.sort_by(|a, b| b.len().cmp(&a.len()));
        if patterns.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(c) = rest.chars().next() {
            if let Some(p) = patterns.iter().find(|p| rest.starts_with(**p)) {
                out.push_str(&mark(p));
                rest = &rest[p.len()..];
            } else {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
        out
    }
}

/// Two messages are equal when they describe the same problem; the raising
/// node's identity is not compared.
impl PartialEq for ValidationMessage {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
            && self.level == other.level
            && self.text == other.text
            && self.highlight == other.highlight
            && self.highlight_sub == other.highlight_sub
    }
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}: {}", self.level, self.source, self.text)
    }
}

/// The message list owned by one node.
///
/// Equality compares the messages only, so two independently parsed copies of
/// the same input compare equal.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    node: NodeId,
    messages: Vec<ValidationMessage>,
}

impl Diagnostics {
    /// An empty list with a fresh node identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity of the owning node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Start a message stamped with this node's identity.
    pub fn message(
        &self,
        level: Level,
        source: impl Into<String>,
        text: impl Into<String>,
    ) -> ValidationMessage {
        ValidationMessage::new(self.node, source, level, text)
    }

    /// Record a message. An identical message already present is not added twice.
    pub fn push(&mut self, message: ValidationMessage) {
        if !self.messages.contains(&message) {
            self.messages.push(message);
        }
    }

    /// Shorthand for `push(message(level, source, text))`.
    pub fn add(&mut self, level: Level, source: impl Into<String>, text: impl Into<String>) {
        let m = self.message(level, source, text);
        self.push(m);
    }

    /// Messages recorded on this node only.
    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    /// Returns true if no message was recorded.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the number of recorded messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

impl PartialEq for Diagnostics {
    fn eq(&self, other: &Self) -> bool {
        self.messages == other.messages
    }
}

/// A node that carries diagnostics and may own child nodes.
pub trait Validated {
    /// The node's own message list.
    fn diagnostics(&self) -> &Diagnostics;

    /// Call `visit` once for every directly owned child node.
    fn visit_children(&self, _visit: &mut dyn FnMut(&dyn Validated)) {}

    /// Messages recorded on this node only.
    fn own_messages(&self) -> &[ValidationMessage] {
        self.diagnostics().messages()
    }

    /// Own messages followed by those of all descendants, each node visited once.
    fn all_messages(&self) -> Vec<ValidationMessage> {
        let mut visited = HashSet::new();
        let mut out = Vec::new();
        collect(self, &mut visited, &mut out);
        out
    }

    /// All error-level messages in the subtree.
    fn errors(&self) -> Vec<ValidationMessage> {
        self.all_messages()
            .into_iter()
            .filter(|m| m.level.is_error())
            .collect()
    }

    /// All messages in the subtree that are not errors.
    fn warnings(&self) -> Vec<ValidationMessage> {
        self.all_messages()
            .into_iter()
            .filter(|m| !m.level.is_error())
            .collect()
    }

    /// No error anywhere in the subtree.
    fn is_valid(&self) -> bool {
        !self.all_messages().iter().any(|m| m.level.is_error())
    }

    /// Turn an invalid subtree into one aggregate error carrying every message.
    fn ensure_valid(&self) -> Result<(), ValidationFailed> {
        let messages = self.all_messages();
        if messages.iter().any(|m| m.level.is_error()) {
            Err(ValidationFailed::new(messages))
        } else {
            Ok(())
        }
    }
}

fn collect<V: Validated + ?Sized>(
    node: &V,
    visited: &mut HashSet<NodeId>,
    out: &mut Vec<ValidationMessage>,
) {
    if !visited.insert(node.diagnostics().node()) {
        return;
    }
    out.extend(node.own_messages().iter().cloned());
    node.visit_children(&mut |child| collect(child, visited, out));
}

/// Plain-text rendering of a message list, most severe first.
///
/// When given the serialized form of the validated node, each entry also shows
/// that text with the message's highlight marked as `»…«`.
pub struct Report<'a> {
    messages: &'a [ValidationMessage],
    context: Option<&'a str>,
}

impl<'a> Report<'a> {
    /// Report over `messages`.
    pub fn new(messages: &'a [ValidationMessage]) -> Self {
        Self {
            messages,
            context: None,
        }
    }

    /// Also render the highlight inside `serialized`.
    pub fn with_context(mut self, serialized: &'a str) -> Self {
        self.context = Some(serialized);
        self
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.messages.is_empty() {
            return f.write_str("All clear!");
        }
        let mut first = true;
        for level in Level::all_levels() {
            for m in self.messages.iter().filter(|m| m.level == *level) {
                if !first {
                    writeln!(f)?;
                }
                first = false;
                write!(f, "{} in {}\n  {}", m.level, m.source, m.text)?;
                if let Some(ctx) = self.context {
                    write!(f, "\n  {}", m.emphasize_in(ctx, |s| format!("»{s}«")))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf {
        diagnostics: Diagnostics,
    }

    impl Validated for Leaf {
        fn diagnostics(&self) -> &Diagnostics {
            &self.diagnostics
        }
    }

    struct Branch {
        diagnostics: Diagnostics,
        children: Vec<Leaf>,
        shared: Option<Leaf>,
    }

    impl Validated for Branch {
        fn diagnostics(&self) -> &Diagnostics {
            &self.diagnostics
        }

        fn visit_children(&self, visit: &mut dyn FnMut(&dyn Validated)) {
            for c in &self.children {
                visit(c);
            }
            if let Some(s) = &self.shared {
                visit(s);
            }
        }
    }

    fn leaf(level: Level, text: &str) -> Leaf {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add(level, "leaf", text);
        Leaf { diagnostics }
    }

    #[test]
    fn test_push_deduplicates_identical_messages() {
        let mut d = Diagnostics::new();
        d.add(Level::Error, "x", "bad");
        d.add(Level::Error, "x", "bad");
        d.add(Level::Recommendation, "x", "bad");
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn test_all_messages_includes_children() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add(Level::Info, "branch", "own");
        let b = Branch {
            diagnostics,
            children: vec![leaf(Level::Recommendation, "a"), leaf(Level::Error, "b")],
            shared: None,
        };
        let all = b.all_messages();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].text, "own");
        assert!(!b.is_valid());
        assert_eq!(b.errors().len(), 1);
        assert_eq!(b.warnings().len(), 2);
        assert_eq!(b.own_messages().len(), 1);
    }

    #[test]
    fn test_shared_identity_visited_once() {
        let child = leaf(Level::Error, "twice");
        let clone = Leaf {
            diagnostics: child.diagnostics.clone(),
        };
        let b = Branch {
            diagnostics: Diagnostics::new(),
            children: vec![child],
            shared: Some(clone),
        };
        assert_eq!(b.all_messages().len(), 1);
    }

    #[test]
    fn test_valid_without_errors() {
        let b = Branch {
            diagnostics: Diagnostics::new(),
            children: vec![leaf(Level::Recommendation, "only a hint")],
            shared: None,
        };
        assert!(b.is_valid());
        assert!(b.ensure_valid().is_ok());
    }

    #[test]
    fn test_ensure_valid_carries_all_messages() {
        let b = Branch {
            diagnostics: Diagnostics::new(),
            children: vec![leaf(Level::Recommendation, "hint"), leaf(Level::Error, "bad")],
            shared: None,
        };
        let err = b.ensure_valid().unwrap_err();
        assert_eq!(err.messages().len(), 2);
    }

    #[test]
    fn test_message_equality_ignores_source_id() {
        let a = ValidationMessage::new(NodeId::new(), "s", Level::Error, "t");
        let b = ValidationMessage::new(NodeId::new(), "s", Level::Error, "t");
        assert_eq!(a, b);
    }

    #[test]
    fn test_emphasize_prefers_longest_pattern() {
        let m = ValidationMessage::new(NodeId::new(), "s", Level::Error, "t")
            .with_highlight("AB")
            .with_highlight_sub(["a", "ab"]);
        let out = m.emphasize_in("xaby-a", |s| format!("[{s}]"));
        assert_eq!(out, "x[ab]y-[a]");
    }

    #[test]
    fn test_emphasize_falls_back_to_highlight() {
        let m = ValidationMessage::new(NodeId::new(), "s", Level::Error, "t").with_highlight("£");
        assert_eq!(m.emphasize_in("A£B", |s| format!("<{s}>")), "A<£>B");
    }

    #[test]
    fn test_report_orders_by_level() {
        let node = NodeId::new();
        let msgs = vec![
            ValidationMessage::new(node, "b", Level::Recommendation, "hint"),
            ValidationMessage::new(node, "a", Level::Error, "bad"),
        ];
        let s = Report::new(&msgs).to_string();
        let err_pos = s.find("ERROR").unwrap();
        let rec_pos = s.find("RECOMMENDATION").unwrap();
        assert!(err_pos < rec_pos);
        assert_eq!(Report::new(&[]).to_string(), "All clear!");
    }

    #[test]
    fn test_level_serde_snake_case() {
        let json = serde_json::to_string(&Level::Recommendation).unwrap();
        assert_eq!(json, "\"recommendation\"");
    }
}
