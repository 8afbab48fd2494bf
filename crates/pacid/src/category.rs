//! # PAC-CAT Categories
//!
//! A category is a run of identifier segments led by a `-KEY` marker. When the
//! key has a known schema, the members are mapped onto its fields:
//!
//! 1. **Positional fill.** Bare members fill schema fields in order, up to the
//!    first member that carries an explicit key.
//! 2. **Keyed fill.** Remaining members whose key is the alias of a field
//!    still unset fill that field.
//! 3. Everything left over becomes an additional segment, in original order.
//!
//! ## Schemas
//!
//! Schemas are plain data: an ordered list of `(alias, name, label,
//! mandatory)` per category key, compiled in and looked up through
//! [`CategorySchemas`]. Callers may add their own.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use pacid_core::{Diagnostics, Level, Validated};

use crate::segment::IdSegment;
use crate::tables::Tables;

/// One field of a category schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// The segment key that addresses this field, e.g. `240`.
    pub alias: String,
    /// Field name, e.g. `model_number`.
    pub name: String,
    /// Human label used in messages, e.g. `Model Number`.
    pub label: String,
    /// A category missing this field is invalid.
    pub mandatory: bool,
}

impl FieldSpec {
    /// Describe a field.
    pub fn new(
        alias: impl Into<String>,
        name: impl Into<String>,
        label: impl Into<String>,
        mandatory: bool,
    ) -> Self {
        Self {
            alias: alias.into(),
            name: name.into(),
            label: label.into(),
            mandatory,
        }
    }
}

/// The ordered fields of one category key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySchema {
    key: String,
    fields: Vec<FieldSpec>,
}

impl CategorySchema {
    /// A schema for `key` with `fields` in positional order.
    pub fn new(key: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }

    /// The category key, e.g. `-MD`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Fields in positional order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Position of the field addressed by `alias_or_name`.
    pub fn position(&self, alias_or_name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.alias == alias_or_name || f.name == alias_or_name)
    }
}

type FieldRow = (&'static str, &'static str, &'static str, bool);

const MATERIAL_DEVICE: &[FieldRow] = &[
    ("240", "model_number", "Model Number", true),
    ("21", "serial_number", "Serial Number", true),
];

const MATERIAL_SUBSTANCE: &[FieldRow] = &[
    ("240", "product_number", "Product Number", true),
    ("10", "batch_number", "Batch Number", false),
    ("20", "container_size", "Container Size", false),
    ("21", "container_number", "Container Number", false),
    ("250", "aliquot", "Aliquot", false),
];

const MATERIAL_CONSUMABLE: &[FieldRow] = &[
    ("240", "product_number", "Product Number", true),
    ("10", "batch_number", "Batch Number", false),
    ("20", "packing_size", "Packing Size", false),
    ("21", "serial_number", "Serial Number", false),
    ("250", "aliquot", "Aliquot", false),
];

const DATA: &[FieldRow] = &[("21", "id", "ID", true)];

const BUILTIN: &[(&str, &[FieldRow])] = &[
    ("-MD", MATERIAL_DEVICE),
    ("-MS", MATERIAL_SUBSTANCE),
    ("-MC", MATERIAL_CONSUMABLE),
    ("-MM", MATERIAL_CONSUMABLE),
    ("-DM", DATA),
    ("-DR", DATA),
    ("-DC", DATA),
    ("-DP", DATA),
    ("-DS", DATA),
];

/// Category schemas by category key.
#[derive(Debug, Clone, Default)]
pub struct CategorySchemas {
    schemas: BTreeMap<String, Arc<CategorySchema>>,
}

impl CategorySchemas {
    /// The predefined material (`-M*`) and data (`-D*`) categories.
    pub fn builtin() -> Self {
        BUILTIN.iter().fold(Self::empty(), |acc, (key, rows)| {
            let fields = rows
                .iter()
                .map(|(alias, name, label, mandatory)| FieldSpec::new(*alias, *name, *label, *mandatory))
                .collect();
            acc.with_schema(CategorySchema::new(*key, fields))
        })
    }

    /// No schemas; every category maps generically.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add or replace the schema for its key.
    pub fn with_schema(mut self, schema: CategorySchema) -> Self {
        self.schemas.insert(schema.key.clone(), Arc::new(schema));
        self
    }

    /// The schema for `key`.
    pub fn get(&self, key: &str) -> Option<&Arc<CategorySchema>> {
        self.schemas.get(key)
    }

    /// Known category keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }
}

/// A schema field and the value it received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryField {
    /// Segment key of the field.
    pub alias: String,
    /// Field name.
    pub name: String,
    /// Assigned value, if any.
    pub value: Option<String>,
}

impl CategoryField {
    /// The value, treating an empty string as unset.
    pub fn filled(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }
}

/// One category of a PAC-CAT.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    key: String,
    #[serde(skip)]
    schema: Option<Arc<CategorySchema>>,
    fields: Vec<CategoryField>,
    additional_segments: Vec<IdSegment>,
    #[serde(skip)]
    segments: Vec<IdSegment>,
    #[serde(skip)]
    diagnostics: Diagnostics,
}

impl Category {
    /// Map a segment run onto its schema. The first segment is the marker.
    ///
    /// Returns `None` for an empty run.
    pub fn from_segments(segments: Vec<IdSegment>, tables: &Tables) -> Option<Self> {
        let (marker, members) = segments.split_first()?;
        let key = marker.value().to_string();
        let schema = tables.categories.get(&key).cloned();

        let (fields, additional_segments) = match &schema {
            Some(schema) => map_members(schema, members),
            None => {
                tracing::trace!(category = %key, "no schema, mapping generically");
                (Vec::new(), members.to_vec())
            }
        };

        Some(Self::assemble(key, schema, fields, additional_segments, segments))
    }

    /// Start a category built field by field.
    pub fn builder(key: impl Into<String>) -> CategoryBuilder {
        CategoryBuilder {
            key: key.into(),
            values: Vec::new(),
            additional: Vec::new(),
        }
    }

    fn assemble(
        key: String,
        schema: Option<Arc<CategorySchema>>,
        fields: Vec<CategoryField>,
        additional_segments: Vec<IdSegment>,
        segments: Vec<IdSegment>,
    ) -> Self {
        let mut diagnostics = Diagnostics::new();
        let source = format!("Category {key}");

        match &schema {
            None => {
                let m = diagnostics
                    .message(
                        Level::Recommendation,
                        source.as_str(),
                        format!("Category key {key} is not a well known key. It is recommended to use well known keys only"),
                    )
                    .with_highlight(key.as_str());
                diagnostics.push(m);
            }
            Some(schema) => {
                for (spec, field) in schema.fields.iter().zip(&fields) {
                    if spec.mandatory && field.filled().is_none() {
                        let m = diagnostics
                            .message(
                                Level::Error,
                                source.as_str(),
                                format!("Category key {key} is missing mandatory field {}", spec.label),
                            )
                            .with_highlight(key.as_str());
                        diagnostics.push(m);
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        for k in segments.iter().skip(1).filter_map(IdSegment::key) {
            if !seen.insert(k) {
                let m = diagnostics
                    .message(
                        Level::Error,
                        source.as_str(),
                        format!("Duplicate key {k} in category {key}"),
                    )
                    .with_highlight(format!("{k}:"));
                diagnostics.push(m);
            }
        }

        Self {
            key,
            schema,
            fields,
            additional_segments,
            segments,
            diagnostics,
        }
    }

    /// The category key, e.g. `-MD`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The schema the members were mapped onto, if the key is known.
    pub fn schema(&self) -> Option<&CategorySchema> {
        self.schema.as_deref()
    }

    /// Whether a schema was found for the key.
    pub fn is_known(&self) -> bool {
        self.schema.is_some()
    }

    /// Schema fields in order, with their values.
    pub fn fields(&self) -> &[CategoryField] {
        &self.fields
    }

    /// Value of the field addressed by alias or name. Empty values read as unset.
    pub fn field(&self, alias_or_name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.alias == alias_or_name || f.name == alias_or_name)
            .and_then(CategoryField::filled)
    }

    /// Members that no schema field took.
    pub fn additional_segments(&self) -> &[IdSegment] {
        &self.additional_segments
    }

    /// The segments as written, marker first.
    pub fn segments(&self) -> &[IdSegment] {
        &self.segments
    }

    /// Regenerate the segments from the mapped fields.
    ///
    /// With `short`, field keys are left out until the first unset field; from
    /// there on every field is keyed. The marker is always bare, additional
    /// segments follow verbatim.
    pub fn to_segments(&self, short: bool) -> Vec<IdSegment> {
        let mut omit = short;
        let mut out = vec![IdSegment::bare(self.key.as_str())];
        for field in &self.fields {
            match field.filled() {
                Some(v) if omit => out.push(IdSegment::bare(v)),
                Some(v) => out.push(IdSegment::keyed(field.alias.as_str(), v)),
                None => omit = false,
            }
        }
        out.extend(self.additional_segments.iter().cloned());
        out
    }
}

impl Validated for Category {
    fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn visit_children(&self, visit: &mut dyn FnMut(&dyn Validated)) {
        for s in &self.segments {
            visit(s);
        }
        for s in &self.additional_segments {
            visit(s);
        }
    }
}

fn map_members(schema: &CategorySchema, members: &[IdSegment]) -> (Vec<CategoryField>, Vec<IdSegment>) {
    let mut values: Vec<Option<String>> = vec![None; schema.fields.len()];
    let mut consumed = vec![false; members.len()];

    for (i, member) in members.iter().take(values.len()).enumerate() {
        if member.key().is_some() {
            break;
        }
        values[i] = Some(member.value().to_string());
        consumed[i] = true;
    }
    tracing::trace!(
        category = %schema.key,
        positional = consumed.iter().filter(|c| **c).count(),
        "positional fill done"
    );

    for (j, member) in members.iter().enumerate() {
        if consumed[j] {
            continue;
        }
        let Some(i) = member.key().and_then(|k| schema.fields.iter().position(|f| f.alias == k)) else {
            continue;
        };
        if values[i].as_deref().map_or(true, str::is_empty) {
            values[i] = Some(member.value().to_string());
            consumed[j] = true;
        }
    }

    let fields = schema
        .fields
        .iter()
        .zip(values)
        .map(|(spec, value)| CategoryField {
            alias: spec.alias.clone(),
            name: spec.name.clone(),
            value,
        })
        .collect();
    let additional = members
        .iter()
        .zip(consumed)
        .filter(|(_, c)| !c)
        .map(|(m, _)| m.clone())
        .collect();
    (fields, additional)
}

/// Programmatic construction of a [`Category`].
#[derive(Debug, Clone)]
pub struct CategoryBuilder {
    key: String,
    values: Vec<(String, String)>,
    additional: Vec<IdSegment>,
}

impl CategoryBuilder {
    /// Set a schema field by alias or name. An empty value leaves it unset.
    pub fn field(mut self, alias_or_name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.push((alias_or_name.into(), value.into()));
        self
    }

    /// Append a segment that no schema field takes.
    pub fn additional(mut self, segment: IdSegment) -> Self {
        self.additional.push(segment);
        self
    }

    /// Finish the category. Its written form is the fully keyed one.
    ///
    /// Values for fields the schema does not have are kept as keyed
    /// additional segments, ahead of the explicit ones.
    pub fn build(self, tables: &Tables) -> Category {
        let schema = tables.categories.get(&self.key).cloned();
        let keyed = |k: &str, v: &str| IdSegment::with_keys(Some(k.to_string()), v, &tables.keys);

        let mut values: Vec<Option<String>> = schema
            .as_ref()
            .map(|s| vec![None; s.fields.len()])
            .unwrap_or_default();
        let mut additional = Vec::new();
        for (name, value) in &self.values {
            match schema.as_ref().and_then(|s| s.position(name)) {
                Some(i) => values[i] = Some(value.clone()).filter(|v| !v.is_empty()),
                None => additional.push(keyed(name, value)),
            }
        }
        additional.extend(self.additional);

        let fields: Vec<CategoryField> = match &schema {
            Some(s) => s
                .fields
                .iter()
                .zip(values)
                .map(|(spec, value)| CategoryField {
                    alias: spec.alias.clone(),
                    name: spec.name.clone(),
                    value,
                })
                .collect(),
            None => Vec::new(),
        };

        let mut segments = vec![IdSegment::with_keys(None, self.key.as_str(), &tables.keys)];
        segments.extend(
            fields
                .iter()
                .filter_map(|f| f.filled().map(|v| keyed(&f.alias, v))),
        );
        segments.extend(additional.iter().cloned());

        Category::assemble(self.key, schema, fields, additional, segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacid_core::KeyTable;

    fn segs(s: &str) -> Vec<IdSegment> {
        let keys = KeyTable::builtin();
        s.split('/').map(|t| IdSegment::parse(t, &keys).unwrap()).collect()
    }

    fn category(s: &str) -> Category {
        Category::from_segments(segs(s), &Tables::builtin()).unwrap()
    }

    fn keys_of(segments: &[IdSegment]) -> Vec<Option<&str>> {
        segments.iter().map(IdSegment::key).collect()
    }

    #[test]
    fn test_builtin_schemas() {
        let schemas = CategorySchemas::builtin();
        assert_eq!(
            schemas.keys().collect::<Vec<_>>(),
            vec!["-DC", "-DM", "-DP", "-DR", "-DS", "-MC", "-MD", "-MM", "-MS"]
        );
        let mm = schemas.get("-MM").unwrap();
        assert_eq!(mm.key(), "-MM");
        assert_eq!(mm.fields()[2].name, "packing_size");
        assert_eq!(schemas.get("-MS").unwrap().fields()[2].name, "container_size");
    }

    #[test]
    fn test_positional_fill() {
        let c = category("-MD/0/1");
        assert_eq!(c.field("240"), Some("0"));
        assert_eq!(c.field("serial_number"), Some("1"));
        assert!(c.additional_segments().is_empty());
        assert!(c.is_valid());
    }

    #[test]
    fn test_positional_fill_stops_at_first_key() {
        let c = category("-MS/0/1/KEY:2/3/4");
        assert_eq!(c.field("240"), Some("0"));
        assert_eq!(c.field("10"), Some("1"));
        assert_eq!(c.field("20"), None);
        let extra = c.additional_segments();
        assert_eq!(keys_of(extra), vec![Some("KEY"), None, None]);
        assert_eq!(extra.iter().map(IdSegment::value).collect::<Vec<_>>(), vec!["2", "3", "4"]);
    }

    #[test]
    fn test_keyed_fill_any_order() {
        let c = category("-MD/21:1234/KEY:VAL/240:BAL500");
        assert!(c.is_valid(), "{:?}", c.all_messages());
        assert_eq!(c.field("model_number"), Some("BAL500"));
        assert_eq!(c.field("serial_number"), Some("1234"));
        assert_eq!(c.additional_segments().len(), 1);
        assert_eq!(c.additional_segments()[0].serialize(), "KEY:VAL");
    }

    #[test]
    fn test_missing_mandatory_fields() {
        let c = category("-MD/KEY:VAL");
        assert!(!c.is_valid());
        let texts: Vec<String> = c.errors().into_iter().map(|m| m.text).collect();
        assert!(texts.contains(&"Category key -MD is missing mandatory field Model Number".to_string()));
        assert!(texts.contains(&"Category key -MD is missing mandatory field Serial Number".to_string()));
    }

    #[test]
    fn test_unknown_category_is_generic() {
        let c = category("-XY/A/B:C");
        assert!(!c.is_known());
        assert!(c.is_valid());
        assert!(c.fields().is_empty());
        assert_eq!(c.additional_segments().len(), 2);
        assert!(c.own_messages()[0].text.starts_with("Category key -XY is not a well known key"));
    }

    #[test]
    fn test_duplicate_keys_in_category() {
        let c = category("-DR/21:A/21:B");
        assert!(!c.is_valid());
        assert!(c.errors().iter().any(|m| m.text == "Duplicate key 21 in category -DR"));
        assert_eq!(c.field("id"), Some("A"));
        assert_eq!(c.additional_segments()[0].value(), "B");
    }

    #[test]
    fn test_long_and_short_segments() {
        let c = category("-MD/240:B-800/21:12345");
        let long: Vec<String> = c.to_segments(false).iter().map(IdSegment::serialize).collect();
        assert_eq!(long, vec!["-MD", "240:B-800", "21:12345"]);
        let short: Vec<String> = c.to_segments(true).iter().map(IdSegment::serialize).collect();
        assert_eq!(short, vec!["-MD", "B-800", "12345"]);
    }

    #[test]
    fn test_empty_field_disables_omission_for_good() {
        let c = Category::builder("-MS")
            .field("product_number", "X67678")
            .field("batch_number", "9999")
            .field("aliquot", "2")
            .additional(IdSegment::keyed("K1", "V1"))
            .additional(IdSegment::bare("V2"))
            .build(&Tables::builtin());
        let short: Vec<String> = c.to_segments(true).iter().map(IdSegment::serialize).collect();
        assert_eq!(short, vec!["-MS", "X67678", "9999", "250:2", "K1:V1", "V2"]);
    }

    #[test]
    fn test_builder_matches_parse() {
        let tables = Tables::builtin();
        let built = Category::builder("-MD")
            .field("240", "BAL500")
            .field("serial_number", "1234")
            .build(&tables);
        assert_eq!(
            built.segments().iter().map(IdSegment::serialize).collect::<Vec<_>>(),
            vec!["-MD", "240:BAL500", "21:1234"]
        );
        assert_eq!(built, category("-MD/240:BAL500/21:1234"));
    }

    #[test]
    fn test_builder_unknown_field_becomes_additional() {
        let c = Category::builder("-DR")
            .field("id", "X")
            .field("RNR", "7")
            .build(&Tables::builtin());
        assert_eq!(c.additional_segments()[0].serialize(), "RNR:7");
    }

    #[test]
    fn test_custom_schema() {
        let mut tables = Tables::builtin();
        tables.categories = tables.categories.with_schema(CategorySchema::new(
            "-XP",
            vec![FieldSpec::new("SMP", "sample", "Sample", true)],
        ));
        let c = Category::from_segments(segs("-XP/S-1"), &tables).unwrap();
        assert!(c.is_known());
        assert_eq!(c.field("sample"), Some("S-1"));
    }
}
