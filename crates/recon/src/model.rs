use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A single cell value as loaded from a source document.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Bool(bool),
    Missing,
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// An ordered table: one column list shared by every row.
///
/// Rows are stored positionally (`rows[i][j]` is column `columns[j]`), so the
/// schema is held once and every record iterates in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Empty dataset with a defined schema.
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// Build a dataset, rejecting rows whose width differs from the schema.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, ReconError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(ReconError::RaggedRow {
                    row: i,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), ReconError> {
        if row.len() != self.columns.len() {
            return Err(ReconError::RaggedRow {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Ordered `(column, value)` view of one record.
    pub fn record(&self, index: usize) -> Option<Record<'_>> {
        self.rows.get(index).map(|values| Record { columns: &self.columns, values })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|values| Record { columns: &self.columns, values })
    }

    /// Values of a single column, top to bottom.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |r| &r[index])
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<Value>> {
        &mut self.rows
    }
}

/// Borrowed view of one row paired with its dataset's column names.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Record<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.columns.iter().position(|c| c == column).map(|i| &self.values[i])
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }
}

// ---------------------------------------------------------------------------
// Selection + mode
// ---------------------------------------------------------------------------

/// Key column per dataset. The two names need not agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySelector {
    pub col1: String,
    pub col2: String,
}

impl KeySelector {
    pub fn new(col1: impl Into<String>, col2: impl Into<String>) -> Self {
        Self { col1: col1.into(), col2: col2.into() }
    }
}

/// Which partitions a reconciliation returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Inner equi-join only.
    #[serde(alias = "inner")]
    Exact,
    #[default]
    #[serde(alias = "full")]
    FullOuter,
    /// Records present in the second dataset but not the first.
    #[serde(alias = "missing_in_1")]
    MissingInFirst,
    /// Records present in the first dataset but not the second.
    #[serde(alias = "missing_in_2")]
    MissingInSecond,
}

impl MatchMode {
    /// Name used by the upload form and job files.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Exact => "inner",
            Self::FullOuter => "full",
            Self::MissingInFirst => "missing_in_1",
            Self::MissingInSecond => "missing_in_2",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Unrecognized match mode string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMode(pub String);

impl fmt::Display for UnknownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown match mode '{}' (expected inner, full, missing_in_1, missing_in_2)",
            self.0
        )
    }
}

impl std::error::Error for UnknownMode {}

impl FromStr for MatchMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "inner" | "exact" => Ok(Self::Exact),
            "full" | "full_outer" => Ok(Self::FullOuter),
            "missing_in_1" | "missing_in_first" => Ok(Self::MissingInFirst),
            "missing_in_2" | "missing_in_second" => Ok(Self::MissingInSecond),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

/// How missing key values take part in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingKeys {
    /// Missing renders as the literal `nan` and matches like any other text,
    /// including a genuine `nan` on the other side.
    #[default]
    Sentinel,
    /// Missing never matches; the record lands in its side's unmatched partition.
    NeverMatch,
}

// ---------------------------------------------------------------------------
// Join output
// ---------------------------------------------------------------------------

/// Which inputs a joined row was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    Both,
    LeftOnly,
    RightOnly,
}

/// One row of the join: indices into dataset1/dataset2 plus its tag.
///
/// Rows reference their inputs instead of copying them; values are only
/// materialized when partitions are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinRow {
    pub left: Option<usize>,
    pub right: Option<usize>,
    pub provenance: Provenance,
}

impl JoinRow {
    pub fn both(left: usize, right: usize) -> Self {
        Self { left: Some(left), right: Some(right), provenance: Provenance::Both }
    }

    pub fn left_only(left: usize) -> Self {
        Self { left: Some(left), right: None, provenance: Provenance::LeftOnly }
    }

    pub fn right_only(right: usize) -> Self {
        Self { left: None, right: Some(right), provenance: Provenance::RightOnly }
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// The three partitions of a reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub matched: Dataset,
    pub unmatched_first: Dataset,
    pub unmatched_second: Dataset,
}

impl MatchResult {
    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            matched: self.matched.len(),
            unmatched_first: self.unmatched_first.len(),
            unmatched_second: self.unmatched_second.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSummary {
    pub matched: usize,
    pub unmatched_first: usize,
    pub unmatched_second: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_wire_names() {
        assert_eq!("inner".parse::<MatchMode>().unwrap(), MatchMode::Exact);
        assert_eq!("full".parse::<MatchMode>().unwrap(), MatchMode::FullOuter);
        assert_eq!("missing_in_1".parse::<MatchMode>().unwrap(), MatchMode::MissingInFirst);
        assert_eq!("missing-in-2".parse::<MatchMode>().unwrap(), MatchMode::MissingInSecond);
        assert!("left".parse::<MatchMode>().is_err());
        assert_eq!(MatchMode::default(), MatchMode::FullOuter);
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = Dataset::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![Value::from("x")]],
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::RaggedRow { row: 0, expected: 2, found: 1 }));
    }

    #[test]
    fn record_view_preserves_column_order() {
        let ds = Dataset::from_rows(
            vec!["id".into(), "name".into()],
            vec![vec![Value::from(1i64), Value::from("Alice")]],
        )
        .unwrap();
        let rec = ds.record(0).unwrap();
        let cols: Vec<&str> = rec.iter().map(|(c, _)| c).collect();
        assert_eq!(cols, vec!["id", "name"]);
        assert_eq!(rec.get("name"), Some(&Value::from("Alice")));
        assert!(rec.get("missing").is_none());
    }
}
