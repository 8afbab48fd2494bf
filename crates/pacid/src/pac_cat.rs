//! # PAC-CAT
//!
//! A PAC-ID whose identifier is an ordered sequence of categories. An
//! identifier qualifies when its first segment is a category marker; each
//! later marker opens the next category.

use serde::Serialize;

use pacid_core::{Diagnostics, Validated};

use crate::category::Category;
use crate::pac_id::{join_segments, validate_identifier, PacId};
use crate::segment::IdSegment;
use crate::tables::Tables;
use crate::url::Notation;

/// An issuer and its categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacCat {
    issuer: String,
    categories: Vec<Category>,
    #[serde(skip)]
    diagnostics: Diagnostics,
}

impl PacCat {
    /// Interpret a PAC-ID as categories.
    ///
    /// Returns `None` when the identifier does not start with a category
    /// marker, so no segment would be left outside a category.
    pub fn try_from_pac_id(pac_id: &PacId, tables: &Tables) -> Option<Self> {
        let segments = pac_id.segments();
        if !segments.first()?.is_category_marker() {
            tracing::trace!(issuer = pac_id.issuer(), "identifier does not open a category");
            return None;
        }

        let mut runs: Vec<Vec<IdSegment>> = Vec::new();
        for s in segments {
            if s.is_category_marker() {
                runs.push(vec![s.clone()]);
            } else if let Some(run) = runs.last_mut() {
                run.push(s.clone());
            }
        }
        tracing::trace!(categories = runs.len(), "split identifier into categories");

        let categories = runs
            .into_iter()
            .filter_map(|run| Category::from_segments(run, tables))
            .collect();
        Some(Self::from_categories(pac_id.issuer(), categories))
    }

    /// Assemble a PAC-CAT from categories.
    pub fn from_categories(issuer: impl Into<String>, categories: Vec<Category>) -> Self {
        let issuer = issuer.into();
        let mut diagnostics = Diagnostics::new();
        let segments: Vec<IdSegment> = categories
            .iter()
            .flat_map(|c| c.segments().iter().cloned())
            .collect();
        validate_identifier(&mut diagnostics, &issuer, &segments);
        Self {
            issuer,
            categories,
            diagnostics,
        }
    }

    /// The issuing domain.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Categories in order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// The first category with `key`.
    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key() == key)
    }

    /// Identifier segments in `notation`. Preserve yields them as written.
    pub fn to_segments(&self, notation: Notation) -> Vec<IdSegment> {
        self.categories
            .iter()
            .flat_map(|c| match notation {
                Notation::Preserve => c.segments().to_vec(),
                Notation::Short => c.to_segments(true),
                Notation::Long => c.to_segments(false),
            })
            .collect()
    }

    /// `/`-joined identifier as written, without the issuer.
    pub fn identifier(&self) -> String {
        join_segments(&self.to_segments(Notation::Preserve))
    }

    /// The plain PAC-ID with the segments as written.
    pub fn to_pac_id(&self) -> PacId {
        PacId::new(self.issuer.as_str(), self.to_segments(Notation::Preserve))
    }
}

impl Validated for PacCat {
    fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn visit_children(&self, visit: &mut dyn FnMut(&dyn Validated)) {
        for c in &self.categories {
            visit(c);
        }
    }
}
