// Turns tagged join rows into the three output datasets.
//
// The provenance tag lives on `JoinRow`, never in a column, so it cannot
// reach an output schema. Column naming follows relational-merge rules:
// a key shared by name appears once, other name collisions get `_x`/`_y`.

use crate::matcher::side_value;
use crate::model::{Dataset, JoinRow, MatchMode, MatchResult, Provenance, Value};

pub const LEFT_SUFFIX: &str = "_x";
pub const RIGHT_SUFFIX: &str = "_y";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnSource {
    Left(usize),
    Right(usize),
    /// Key column with the same name on both sides: left value, else right.
    SharedKey { left: usize, right: usize },
}

/// Output schema of a join and where each output column reads from.
#[derive(Debug, Clone)]
pub struct JoinLayout {
    columns: Vec<String>,
    sources: Vec<ColumnSource>,
}

impl JoinLayout {
    pub fn new(left: &Dataset, right: &Dataset, left_key: usize, right_key: usize) -> Self {
        let left_cols = left.columns();
        let right_cols = right.columns();
        let shared_key = left_cols[left_key] == right_cols[right_key];

        let mut columns = Vec::with_capacity(left_cols.len() + right_cols.len());
        let mut sources = Vec::with_capacity(left_cols.len() + right_cols.len());

        for (i, name) in left_cols.iter().enumerate() {
            if shared_key && i == left_key {
                columns.push(name.clone());
                sources.push(ColumnSource::SharedKey { left: left_key, right: right_key });
                continue;
            }
            let collides = right_cols
                .iter()
                .enumerate()
                .any(|(j, r)| r == name && !(shared_key && j == right_key));
            columns.push(if collides { format!("{name}{LEFT_SUFFIX}") } else { name.clone() });
            sources.push(ColumnSource::Left(i));
        }

        for (j, name) in right_cols.iter().enumerate() {
            if shared_key && j == right_key {
                continue;
            }
            let collides = left_cols
                .iter()
                .enumerate()
                .any(|(i, l)| l == name && !(shared_key && i == left_key));
            columns.push(if collides { format!("{name}{RIGHT_SUFFIX}") } else { name.clone() });
            sources.push(ColumnSource::Right(j));
        }

        Self { columns, sources }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn materialize(&self, left: &Dataset, right: &Dataset, row: &JoinRow) -> Vec<Value> {
        self.sources
            .iter()
            .map(|source| match *source {
                ColumnSource::Left(i) => side_value(left, row.left, i),
                ColumnSource::Right(j) => side_value(right, row.right, j),
                ColumnSource::SharedKey { left: li, right: rj } => match row.left {
                    Some(_) => side_value(left, row.left, li),
                    None => side_value(right, row.right, rj),
                },
            })
            .collect()
    }
}

/// Which provenance tags each partition keeps under a mode.
fn keeps(mode: MatchMode, provenance: Provenance) -> bool {
    matches!(
        (mode, provenance),
        (MatchMode::Exact, Provenance::Both)
            | (MatchMode::FullOuter, _)
            | (MatchMode::MissingInFirst, Provenance::RightOnly)
            | (MatchMode::MissingInSecond, Provenance::LeftOnly)
    )
}

/// Split join rows by tag into (matched, unmatched in first, unmatched in second),
/// keeping only the partitions `mode` asks for. Row order follows `rows`.
///
/// Every partition carries the full join schema, including empty ones.
pub fn partition(
    left: &Dataset,
    right: &Dataset,
    layout: &JoinLayout,
    rows: &[JoinRow],
    mode: MatchMode,
) -> MatchResult {
    let mut matched = Vec::new();
    let mut unmatched_first = Vec::new();
    let mut unmatched_second = Vec::new();

    for row in rows.iter().filter(|r| keeps(mode, r.provenance)) {
        let values = layout.materialize(left, right, row);
        match row.provenance {
            Provenance::Both => matched.push(values),
            Provenance::LeftOnly => unmatched_first.push(values),
            Provenance::RightOnly => unmatched_second.push(values),
        }
    }

    MatchResult {
        matched: build(layout, matched),
        unmatched_first: build(layout, unmatched_first),
        unmatched_second: build(layout, unmatched_second),
    }
}

fn build(layout: &JoinLayout, rows: Vec<Vec<Value>>) -> Dataset {
    let mut ds = Dataset::new(layout.columns.clone());
    *ds.rows_mut() = rows;
    ds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ds(cols: &[&str]) -> Dataset {
        Dataset::new(cols.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn shared_key_appears_once() {
        let left = ds(&["k", "v"]);
        let right = ds(&["k", "w"]);
        let layout = JoinLayout::new(&left, &right, 0, 0);
        assert_eq!(layout.columns(), &["k", "v", "w"]);
    }

    #[test]
    fn distinct_keys_both_retained_and_collisions_suffixed() {
        let left = ds(&["id", "name", "amount"]);
        let right = ds(&["ref", "name", "id"]);
        let layout = JoinLayout::new(&left, &right, 0, 0);
        assert_eq!(
            layout.columns(),
            &["id_x", "name_x", "amount", "ref", "name_y", "id_y"]
        );
    }

    #[test]
    fn shared_key_value_taken_from_present_side() {
        let left = Dataset::from_rows(
            vec!["k".into(), "v".into()],
            vec![vec![Value::from("A"), Value::from(1i64)]],
        )
        .unwrap();
        let right = Dataset::from_rows(
            vec!["k".into(), "w".into()],
            vec![vec![Value::from("B"), Value::from("x")]],
        )
        .unwrap();
        let layout = JoinLayout::new(&left, &right, 0, 0);
        let rows = [JoinRow::left_only(0), JoinRow::right_only(0)];
        let result = partition(&left, &right, &layout, &rows, MatchMode::FullOuter);

        assert_eq!(
            result.unmatched_first.rows()[0],
            vec![Value::from("A"), Value::from(1i64), Value::Missing]
        );
        assert_eq!(
            result.unmatched_second.rows()[0],
            vec![Value::from("B"), Value::Missing, Value::from("x")]
        );
    }

    #[test]
    fn mode_filter_table() {
        use MatchMode::*;
        use Provenance::*;
        let table = [
            (Exact, [true, false, false]),
            (FullOuter, [true, true, true]),
            (MissingInFirst, [false, false, true]),
            (MissingInSecond, [false, true, false]),
        ];
        for (mode, expected) in table {
            assert_eq!(
                [keeps(mode, Both), keeps(mode, LeftOnly), keeps(mode, RightOnly)],
                expected,
                "mode {mode}"
            );
        }
    }

    #[test]
    fn empty_partitions_keep_schema() {
        let left = ds(&["k"]);
        let right = ds(&["j"]);
        let layout = JoinLayout::new(&left, &right, 0, 0);
        let result = partition(&left, &right, &layout, &[], MatchMode::FullOuter);
        assert!(result.matched.is_empty());
        assert_eq!(result.unmatched_second.columns(), &["k", "j"]);
    }
}
