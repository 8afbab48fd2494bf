//! # T-REX Tables
//!
//! `KEY$$COL1$TYPE1:COL2$TYPE2::R1C1:R1C2::R2C1:R2C2`
//!
//! `$$` ends the table key, the first `::` ends the header, further `::`
//! separate rows and `:` separates columns and cells. Every cell is tagged
//! with its column's type when parsed.
//!
//! The table cross-checks its shape: each row must have exactly one cell per
//! column, and each cell must be of its column's class and satisfy that
//! class's grammar. Cells beyond the header width are kept (as error
//! placeholders) so that serialization stays lossless.

use serde::Serialize;

use pacid_core::{ConversionError, Diagnostics, Level, UnitTable, Validated};

use crate::segment::{find_from, validate_key};
use crate::value::{NativeValue, TrexType, TrexValue};

/// Column header `KEY$TYPE`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnHeader {
    key: String,
    value_type: Option<TrexType>,
    #[serde(skip)]
    diagnostics: Diagnostics,
}

impl ColumnHeader {
    /// Header from its parts. `type_tag` is `None` when the header has no `$`.
    pub fn new(key: impl Into<String>, type_tag: Option<&str>, units: &UnitTable) -> Self {
        let key = key.into();
        let value_type = type_tag.map(TrexType::parse);
        let mut diagnostics = Diagnostics::new();
        let source = format!("TREX table column {key}");
        validate_key(&mut diagnostics, &key, &source, "Column header");
        match &value_type {
            None => {
                let m = diagnostics
                    .message(Level::Error, &source, format!("Column {key} has no type"))
                    .with_highlight(&key);
                diagnostics.push(m);
            }
            Some(t) if !t.is_valid(units) => {
                let m = diagnostics
                    .message(Level::Error, &source, t.invalid_message())
                    .with_highlight(t.as_str());
                diagnostics.push(m);
            }
            Some(_) => {}
        }
        Self {
            key,
            value_type,
            diagnostics,
        }
    }

    /// Header with a known type.
    pub fn typed(key: impl Into<String>, value_type: &TrexType, units: &UnitTable) -> Self {
        Self::new(key, Some(value_type.as_str()), units)
    }

    /// Column key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Declared type, if any.
    pub fn value_type(&self) -> Option<&TrexType> {
        self.value_type.as_ref()
    }

    /// Type the column's cells are read as. Untyped columns read as numbers.
    pub fn cell_type(&self) -> TrexType {
        self.value_type
            .clone()
            .unwrap_or_else(|| TrexType::Quantity(String::new()))
    }

    /// `KEY$TYPE`, or the bare key for an untyped column.
    pub fn serialize(&self) -> String {
        match &self.value_type {
            Some(t) => format!("{}${t}", self.key),
            None => self.key.clone(),
        }
    }
}

impl Validated for ColumnHeader {
    fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// A table segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSegment {
    key: String,
    columns: Vec<ColumnHeader>,
    rows: Vec<Vec<TrexValue>>,
    #[serde(skip)]
    diagnostics: Diagnostics,
}

impl TableSegment {
    /// Assemble a table and cross-check its shape.
    pub fn new(key: impl Into<String>, columns: Vec<ColumnHeader>, rows: Vec<Vec<TrexValue>>) -> Self {
        let key = key.into();
        let source = format!("Table {key}");
        let mut diagnostics = Diagnostics::new();
        validate_key(&mut diagnostics, &key, &source, "Table");

        for (i, row) in rows.iter().enumerate() {
            let row_text = serialize_row(row);
            if row.len() != columns.len() {
                let m = diagnostics
                    .message(
                        Level::Error,
                        &source,
                        format!(
                            "Size mismatch: Table row {i} contains {} elements. Expected size is {}",
                            row.len(),
                            columns.len()
                        ),
                    )
                    .with_highlight(&row_text);
                diagnostics.push(m);
            }

            for (cell, column) in row.iter().zip(&columns) {
                let expected = column.cell_type();
                if !cell.matches_type(&expected) {
                    let m = diagnostics
                        .message(
                            Level::Error,
                            &source,
                            format!(
                                "Type mismatch: Table row {i}, column {} is of wrong type. \
                                 According to the header it should be {expected}",
                                column.key()
                            ),
                        )
                        .with_highlight(&row_text)
                        .with_highlight_sub([cell.raw()]);
                    diagnostics.push(m);
                }
                for problem in cell.problems() {
                    let sub = if problem.culprits.is_empty() {
                        vec![cell.raw().to_string()]
                    } else {
                        problem.culprits
                    };
                    let m = diagnostics
                        .message(Level::Error, &source, problem.text)
                        .with_highlight(&row_text)
                        .with_highlight_sub(sub);
                    diagnostics.push(m);
                }
            }
        }

        Self {
            key,
            columns,
            rows,
            diagnostics,
        }
    }

    /// Try the table grammar. `None` means the text is not a table.
    pub fn parse(s: &str, units: &UnitTable) -> Option<Self> {
        let dd = find_from(s, "$$", 1)?;
        let (key, after) = (&s[..dd], &s[dd + 2..]);
        let sep = find_from(after, "::", 1)?;
        let (header, body) = (&after[..sep], &after[sep + 2..]);
        if body.is_empty() {
            return None;
        }

        let columns: Vec<ColumnHeader> = header
            .split(':')
            .map(|h| match h.split_once('$') {
                Some((k, t)) => ColumnHeader::new(k, Some(t), units),
                None => ColumnHeader::new(h, None, units),
            })
            .collect();
        let rows = body
            .split("::")
            .map(|row| {
                row.split(':')
                    .enumerate()
                    .map(|(j, cell)| match columns.get(j) {
                        Some(c) => TrexValue::typed(&c.cell_type(), cell),
                        None => TrexValue::Error(cell.to_string()),
                    })
                    .collect()
            })
            .collect();
        Some(Self::new(key, columns, rows))
    }

    /// Table key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Column headers in order.
    pub fn columns(&self) -> &[ColumnHeader] {
        &self.columns
    }

    /// Rows of cells.
    pub fn rows(&self) -> &[Vec<TrexValue>] {
        &self.rows
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the header.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Column keys in order.
    pub fn column_keys(&self) -> Vec<&str> {
        self.columns.iter().map(ColumnHeader::key).collect()
    }

    fn column_index(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.key() == key)
    }

    /// All cells of a column, top to bottom. Rows too short to have the cell are skipped.
    pub fn column(&self, key: &str) -> Option<Vec<&TrexValue>> {
        let j = self.column_index(key)?;
        Some(self.rows.iter().filter_map(|r| r.get(j)).collect())
    }

    /// One cell.
    pub fn cell(&self, row: usize, column: &str) -> Option<&TrexValue> {
        let j = self.column_index(column)?;
        self.rows.get(row)?.get(j)
    }

    /// All rows as native values.
    pub fn to_native_rows(&self) -> Result<Vec<Vec<NativeValue>>, ConversionError> {
        self.rows
            .iter()
            .map(|r| r.iter().map(TrexValue::to_native).collect())
            .collect()
    }

    /// Wire form.
    pub fn serialize(&self) -> String {
        format!("{}$${}::{}", self.key, self.serialize_header(), self.serialize_body("::"))
    }

    /// Header line followed by one line per row.
    pub fn pretty(&self) -> String {
        format!(
            "{}$${}::\n  {}",
            self.key,
            self.serialize_header(),
            self.serialize_body("::\n  ")
        )
    }

    fn serialize_header(&self) -> String {
        self.columns
            .iter()
            .map(ColumnHeader::serialize)
            .collect::<Vec<_>>()
            .join(":")
    }

    fn serialize_body(&self, row_separator: &str) -> String {
        self.rows
            .iter()
            .map(|r| serialize_row(r))
            .collect::<Vec<_>>()
            .join(row_separator)
    }
}

impl Validated for TableSegment {
    fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn visit_children(&self, visit: &mut dyn FnMut(&dyn Validated)) {
        for c in &self.columns {
            visit(c);
        }
    }
}

fn serialize_row(row: &[TrexValue]) -> String {
    row.iter().map(TrexValue::raw).collect::<Vec<_>>().join(":")
}
