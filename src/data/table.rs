//! Tabular container with delimiter auto-detection and typed columns.
//!
//! Uploaded tables arrive as loosely formatted CSV/TSV bytes. Parsing tries
//! an ordered list of delimiter strategies, then a single classification
//! pass tags every column as numeric, categorical, or free text. The tag is
//! computed once per table construction and reused by the normalizer and
//! the aesthetic selector instead of re-inspecting raw cells.

use crate::error::{PcaVizError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Highest cardinality at which a non-numeric column still counts as
/// categorical for plot encodings.
pub const MAX_CATEGORICAL_LEVELS: usize = 20;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Numeric cell.
    Number(f64),
    /// Text cell.
    Text(String),
    /// Empty or NA cell.
    Missing,
}

impl Value {
    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Try to get as a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the cell as it appears in an identifier axis or a tabular
    /// export. Integral numbers print without a trailing `.0` so a numeric
    /// id column can still match a textual expression header.
    pub fn render(&self) -> String {
        match self {
            Value::Number(v) => format_number(*v),
            Value::Text(s) => s.clone(),
            Value::Missing => String::new(),
        }
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// Tagged column classification.
///
/// `Numeric` columns parse entirely as floats (missing cells allowed).
/// `Categorical` columns are non-numeric with 2 to
/// [`MAX_CATEGORICAL_LEVELS`] distinct non-missing values; everything else
/// is `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
    Text,
}

/// A named column of equal-length cells with its classification tag.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    values: Vec<Value>,
    ctype: ColumnType,
}

impl Column {
    /// Build a column from typed values, classifying it.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let ctype = classify(&values);
        Self {
            name: name.into(),
            values,
            ctype,
        }
    }

    /// Build a column from raw string cells, inferring numeric vs text.
    ///
    /// Empty and `NA`/`na` cells become [`Value::Missing`]. A column whose
    /// non-missing cells all parse as floats is stored numerically.
    pub fn from_raw(name: impl Into<String>, raw: Vec<String>) -> Self {
        let all_numeric = raw
            .iter()
            .all(|cell| is_missing_cell(cell) || cell.trim().parse::<f64>().is_ok());

        let values = raw
            .into_iter()
            .map(|cell| {
                let trimmed = cell.trim();
                if is_missing_cell(trimmed) {
                    Value::Missing
                } else if all_numeric {
                    match trimmed.parse::<f64>() {
                        Ok(v) => Value::Number(v),
                        Err(_) => Value::Missing,
                    }
                } else {
                    Value::Text(trimmed.to_string())
                }
            })
            .collect();

        Self::new(name, values)
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cell values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Classification tag.
    pub fn column_type(&self) -> ColumnType {
        self.ctype
    }

    /// Whether the column is numeric.
    pub fn is_numeric(&self) -> bool {
        self.ctype == ColumnType::Numeric
    }

    /// Number of distinct non-missing values.
    pub fn cardinality(&self) -> usize {
        self.values
            .iter()
            .filter(|v| !v.is_missing())
            .map(|v| v.render())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Whether every rendered value is distinct. Two missing cells count
    /// as duplicates.
    pub fn all_distinct(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.values.len());
        self.values.iter().all(|v| seen.insert(v.render()))
    }
}

fn is_missing_cell(cell: &str) -> bool {
    let t = cell.trim();
    t.is_empty() || t == "NA" || t == "na"
}

fn classify(values: &[Value]) -> ColumnType {
    let numeric = values
        .iter()
        .all(|v| matches!(v, Value::Number(_) | Value::Missing));
    if numeric {
        return ColumnType::Numeric;
    }
    let cardinality = values
        .iter()
        .filter(|v| !v.is_missing())
        .map(|v| v.render())
        .collect::<HashSet<_>>()
        .len();
    if (2..=MAX_CATEGORICAL_LEVELS).contains(&cardinality) {
        ColumnType::Categorical
    } else {
        ColumnType::Text
    }
}

/// A designated identifier axis, distinct from the data columns.
#[derive(Debug, Clone)]
pub struct Index {
    name: String,
    labels: Vec<String>,
}

impl Index {
    /// Build an index from a name and ordered labels.
    pub fn new(name: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            name: name.into(),
            labels,
        }
    }

    /// Name of the promoted column.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered identifier labels.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// An ordered sequence of named, typed, equal-length columns with an
/// optional identifier axis.
#[derive(Debug, Clone)]
pub struct Table {
    index: Option<Index>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Create a table, validating equal column lengths and unique names.
    pub fn new(index: Option<Index>, columns: Vec<Column>) -> Result<Self> {
        let n_rows = match (&index, columns.first()) {
            (Some(idx), _) => idx.labels().len(),
            (None, Some(col)) => col.values().len(),
            (None, None) => 0,
        };

        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name().to_string()) {
                return Err(PcaVizError::DuplicateColumn(col.name().to_string()));
            }
            if col.values().len() != n_rows {
                return Err(PcaVizError::Parse(format!(
                    "column '{}' has {} rows, expected {}",
                    col.name(),
                    col.values().len(),
                    n_rows
                )));
            }
        }
        if let Some(idx) = &index {
            if seen.contains(idx.name()) {
                return Err(PcaVizError::DuplicateColumn(idx.name().to_string()));
            }
        }

        Ok(Self {
            index,
            columns,
            n_rows,
        })
    }

    /// Parse uploaded tabular bytes with delimiter auto-detection.
    ///
    /// Ordered strategies: tab-delimited first (expression matrices are
    /// usually TSV); when the tab parse yields exactly one column the
    /// bytes are re-parsed comma-delimited, and when the tab parse fails
    /// outright the comma parse is attempted directly. A failure of the
    /// final strategy surfaces as the parse error.
    pub fn read(bytes: &[u8]) -> Result<Self> {
        match Self::parse_delimited(bytes, b'\t') {
            Ok(table) if table.n_columns() == 1 => Self::parse_delimited(bytes, b','),
            Ok(table) => Ok(table),
            Err(_) => Self::parse_delimited(bytes, b','),
        }
    }

    /// Load a table from a file path with delimiter auto-detection.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::read(&bytes)
    }

    fn parse_delimited(bytes: &[u8], delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(PcaVizError::Parse("table has no columns".to_string()));
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record?;
            for (col, field) in record.iter().enumerate() {
                cells[col].push(field.to_string());
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, raw)| Column::from_raw(name, raw))
            .collect();

        Self::new(None, columns)
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of data columns (the identifier axis is not a column).
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// All columns in table order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Check if a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// The identifier axis, if resolved.
    pub fn index(&self) -> Option<&Index> {
        self.index.as_ref()
    }

    /// Identifier labels, if an axis is resolved.
    pub fn index_labels(&self) -> Option<&[String]> {
        self.index.as_ref().map(|i| i.labels())
    }

    /// Row labels: the identifier axis when resolved, positional otherwise.
    pub fn row_labels(&self) -> Vec<String> {
        match &self.index {
            Some(idx) => idx.labels().to_vec(),
            None => (0..self.n_rows).map(|i| i.to_string()).collect(),
        }
    }

    /// Promote a column to the identifier axis, removing it from the
    /// data columns. Distinctness is the caller's policy, not enforced
    /// here.
    pub fn set_index(mut self, name: &str) -> Result<Self> {
        let pos = self
            .columns
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| PcaVizError::SampleMismatch(format!(
                "cannot promote unknown column '{}' to identifier axis",
                name
            )))?;
        let col = self.columns.remove(pos);
        let labels = col.values().iter().map(|v| v.render()).collect();
        self.index = Some(Index::new(col.name().to_string(), labels));
        Ok(self)
    }

    /// Subset rows by identifier label, in the given order. Column
    /// classification is recomputed for the subset.
    pub fn select_rows(&self, labels: &[String]) -> Result<Self> {
        let index = self.index.as_ref().ok_or_else(|| {
            PcaVizError::SampleMismatch("table has no identifier axis".to_string())
        })?;

        let positions: HashMap<&str, usize> = index
            .labels()
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();

        let mut rows = Vec::with_capacity(labels.len());
        for label in labels {
            let pos = positions.get(label.as_str()).ok_or_else(|| {
                PcaVizError::SampleMismatch(format!("sample '{}' not found in metadata", label))
            })?;
            rows.push(*pos);
        }

        let columns = self
            .columns
            .iter()
            .map(|col| {
                let values = rows.iter().map(|&r| col.values()[r].clone()).collect();
                Column::new(col.name().to_string(), values)
            })
            .collect();

        Self::new(
            Some(Index::new(index.name().to_string(), labels.to_vec())),
            columns,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tsv() {
        let bytes = b"gene\tS1\tS2\ng1\t1\t2\ng2\t3\t4\n";
        let table = Table::read(bytes).unwrap();
        assert_eq!(table.n_columns(), 3);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.column("S1").unwrap().column_type(), ColumnType::Numeric);
    }

    #[test]
    fn test_parse_csv_fallback_on_single_column() {
        let bytes = b"gene,S1,S2\ng1,1,2\ng2,3,4\n";
        let table = Table::read(bytes).unwrap();
        assert_eq!(table.n_columns(), 3);
        assert_eq!(
            table.column("gene").unwrap().values()[0],
            Value::Text("g1".to_string())
        );
    }

    #[test]
    fn test_parse_single_column_tsv_stays_single() {
        let bytes = b"only\na\nb\n";
        let table = Table::read(bytes).unwrap();
        assert_eq!(table.n_columns(), 1);
        assert_eq!(table.n_rows(), 2);
    }

    #[test]
    fn test_parse_empty_input_fails() {
        assert!(Table::read(b"").is_err());
    }

    #[test]
    fn test_ragged_tsv_falls_back_to_comma() {
        // The tab strategy rejects the ragged row; the comma strategy sees
        // one comma-free column per line and accepts.
        let bytes = b"a\tb\n1\t2\t3\n";
        let table = Table::read(bytes).unwrap();
        assert_eq!(table.n_columns(), 1);
    }

    #[test]
    fn test_ragged_rows_fail_both_strategies() {
        let bytes = b"a,b\n1,2,3\n";
        assert!(Table::read(bytes).is_err());
    }

    #[test]
    fn test_duplicate_header_rejected() {
        let bytes = b"id\tx\tx\ns1\t1\t2\n";
        assert!(matches!(
            Table::read(bytes),
            Err(PcaVizError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_missing_cells() {
        let bytes = b"id\tage\ns1\t25\ns2\tNA\ns3\t\n";
        let table = Table::read(bytes).unwrap();
        let age = table.column("age").unwrap();
        assert_eq!(age.column_type(), ColumnType::Numeric);
        assert!(age.values()[1].is_missing());
        assert!(age.values()[2].is_missing());
    }

    #[test]
    fn test_classification() {
        let mut raw = String::from("grp\tage\tnote\n");
        for i in 0..25 {
            let grp = if i % 2 == 0 { "a" } else { "b" };
            raw.push_str(&format!("{}\t{}\tnote_{}\n", grp, 20 + i, i));
        }
        let table = Table::read(raw.as_bytes()).unwrap();
        assert_eq!(
            table.column("grp").unwrap().column_type(),
            ColumnType::Categorical
        );
        assert_eq!(
            table.column("age").unwrap().column_type(),
            ColumnType::Numeric
        );
        // 25 distinct values is past the categorical ceiling.
        assert_eq!(
            table.column("note").unwrap().column_type(),
            ColumnType::Text
        );
    }

    #[test]
    fn test_constant_text_column_is_text() {
        let bytes = b"id\tsite\ns1\tlab\ns2\tlab\ns3\tlab\n";
        let table = Table::read(bytes).unwrap();
        assert_eq!(
            table.column("site").unwrap().column_type(),
            ColumnType::Text
        );
    }

    #[test]
    fn test_set_index() {
        let bytes = b"sample\tgroup\ns1\ta\ns2\tb\n";
        let table = Table::read(bytes).unwrap().set_index("sample").unwrap();
        assert_eq!(table.n_columns(), 1);
        assert_eq!(table.index().unwrap().name(), "sample");
        assert_eq!(table.index_labels().unwrap(), &["s1", "s2"]);
    }

    #[test]
    fn test_numeric_index_renders_integral() {
        let bytes = b"id\tx\n1\t5\n2\t6\n";
        let table = Table::read(bytes).unwrap().set_index("id").unwrap();
        assert_eq!(table.index_labels().unwrap(), &["1", "2"]);
    }

    #[test]
    fn test_row_labels_positional_without_index() {
        let bytes = b"x\ty\n1\t2\n3\t4\n";
        let table = Table::read(bytes).unwrap();
        assert_eq!(table.row_labels(), vec!["0", "1"]);
    }

    #[test]
    fn test_select_rows_order_and_reclassification() {
        let bytes = b"sample\tgroup\ns1\ta\ns2\tb\ns3\ta\ns4\tb\n";
        let table = Table::read(bytes).unwrap().set_index("sample").unwrap();
        let subset = table
            .select_rows(&["s3".to_string(), "s1".to_string()])
            .unwrap();
        assert_eq!(subset.index_labels().unwrap(), &["s3", "s1"]);
        // Both retained rows are group "a": cardinality 1 is no longer
        // categorical.
        assert_eq!(
            subset.column("group").unwrap().column_type(),
            ColumnType::Text
        );
    }

    #[test]
    fn test_select_rows_unknown_label() {
        let bytes = b"sample\tgroup\ns1\ta\ns2\tb\n";
        let table = Table::read(bytes).unwrap().set_index("sample").unwrap();
        assert!(table.select_rows(&["nope".to_string()]).is_err());
    }

    #[test]
    fn test_all_distinct() {
        let col = Column::from_raw("c", vec!["a".into(), "b".into(), "a".into()]);
        assert!(!col.all_distinct());
        let col = Column::from_raw("c", vec!["a".into(), "b".into(), "c".into()]);
        assert!(col.all_distinct());
    }
}
