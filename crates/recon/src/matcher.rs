use std::collections::{HashMap, HashSet};

use crate::model::{Dataset, JoinRow, Value};
use crate::normalize::key_of;

/// Group row indices of `dataset` by normalized key, preserving row order
/// inside each group. Rows whose key never matches are left out.
fn build_index(dataset: &Dataset, key: usize) -> HashMap<&str, Vec<usize>> {
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, row) in dataset.rows().iter().enumerate() {
        if let Some(k) = key_of(row, key) {
            index.entry(k).or_default().push(i);
        }
    }
    index
}

/// Inner equi-join. Every left row pairs with every right row sharing its key,
/// in left order then right order.
pub fn inner_join(left: &Dataset, right: &Dataset, left_key: usize, right_key: usize) -> Vec<JoinRow> {
    let index = build_index(right, right_key);
    let mut out = Vec::new();

    for (li, row) in left.rows().iter().enumerate() {
        if let Some(group) = key_of(row, left_key).and_then(|k| index.get(k)) {
            out.extend(group.iter().map(|&ri| JoinRow::both(li, ri)));
        }
    }

    out
}

/// Full outer equi-join with provenance.
///
/// Output order: left rows in order (each expanded over its matching right
/// group, or emitted once as `left_only`), then `right_only` rows in right order.
pub fn outer_join(left: &Dataset, right: &Dataset, left_key: usize, right_key: usize) -> Vec<JoinRow> {
    let index = build_index(right, right_key);
    let mut seen_left: HashSet<&str> = HashSet::new();
    let mut out = Vec::with_capacity(left.len().max(right.len()));

    for (li, row) in left.rows().iter().enumerate() {
        let key = key_of(row, left_key);
        if let Some(k) = key {
            seen_left.insert(k);
        }
        match key.and_then(|k| index.get(k)) {
            Some(group) => out.extend(group.iter().map(|&ri| JoinRow::both(li, ri))),
            None => out.push(JoinRow::left_only(li)),
        }
    }

    for (ri, row) in right.rows().iter().enumerate() {
        let found = key_of(row, right_key).is_some_and(|k| seen_left.contains(k));
        if !found {
            out.push(JoinRow::right_only(ri));
        }
    }

    out
}

/// Materialize a dataset-1 or dataset-2 value for a join row, `Missing` when
/// that side is absent.
pub(crate) fn side_value(dataset: &Dataset, row: Option<usize>, col: usize) -> Value {
    match row {
        Some(r) => dataset.rows()[r][col].clone(),
        None => Value::Missing,
    }
}
