use log::debug;

use crate::config::MatchOptions;
use crate::error::{ReconError, Side};
use crate::matcher::{inner_join, outer_join};
use crate::model::{Dataset, KeySelector, MatchMode, MatchResult};
use crate::normalize::{normalize_key_column, warn_sentinel_collisions, KeyStats};
use crate::partition::{partition, JoinLayout};

/// Reconcile two datasets on one key column each, with default options
/// for everything but the mode.
pub fn run(
    first: &Dataset,
    second: &Dataset,
    keys: &KeySelector,
    mode: MatchMode,
) -> Result<MatchResult, ReconError> {
    run_with(first, second, keys, &MatchOptions { mode, ..MatchOptions::default() })
}

/// Reconcile two datasets: normalize both key columns, join, partition.
///
/// Fails only when a key column is absent; empty inputs are fine.
pub fn run_with(
    first: &Dataset,
    second: &Dataset,
    keys: &KeySelector,
    options: &MatchOptions,
) -> Result<MatchResult, ReconError> {
    let left = normalize_key_column(first, &keys.col1, Side::First, options.missing_keys)?;
    let right = normalize_key_column(second, &keys.col2, Side::Second, options.missing_keys)?;

    // normalize_key_column already verified both columns exist
    let left_key = left.column_index(&keys.col1).ok_or_else(|| missing(Side::First, &keys.col1, first))?;
    let right_key = right.column_index(&keys.col2).ok_or_else(|| missing(Side::Second, &keys.col2, second))?;

    warn_sentinel_collisions(
        KeyStats::of(first, left_key),
        KeyStats::of(second, right_key),
        options.missing_keys,
    );

    let rows = match options.mode {
        // Inner join is enough; the unmatched partitions are never returned.
        MatchMode::Exact => inner_join(&left, &right, left_key, right_key),
        _ => outer_join(&left, &right, left_key, right_key),
    };

    let layout = JoinLayout::new(&left, &right, left_key, right_key);
    let result = partition(&left, &right, &layout, &rows, options.mode);

    let s = result.summary();
    debug!(
        "matched {} x {} rows on '{}'/'{}' ({}): {} matched, {} only in file 1, {} only in file 2",
        first.len(),
        second.len(),
        keys.col1,
        keys.col2,
        options.mode,
        s.matched,
        s.unmatched_first,
        s.unmatched_second,
    );

    Ok(result)
}

fn missing(side: Side, column: &str, dataset: &Dataset) -> ReconError {
    ReconError::MissingColumn {
        side,
        column: column.to_string(),
        available: dataset.columns().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MissingKeys, Value};
    use std::cell::RefCell;
    use std::sync::Once;

    thread_local! {
        static WARNINGS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    /// Records warnings per test thread.
    struct CaptureLog;

    impl log::Log for CaptureLog {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::Level::Warn
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                WARNINGS.with(|w| w.borrow_mut().push(record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: CaptureLog = CaptureLog;
    static INIT: Once = Once::new();

    fn captured_warnings(f: impl FnOnce()) -> Vec<String> {
        INIT.call_once(|| {
            let _ = log::set_logger(&CAPTURE);
            log::set_max_level(log::LevelFilter::Warn);
        });
        WARNINGS.with(|w| w.borrow_mut().clear());
        f();
        WARNINGS.with(|w| w.borrow_mut().drain(..).collect())
    }

    fn table(cols: &[&str], rows: Vec<Vec<Value>>) -> Dataset {
        Dataset::from_rows(cols.iter().map(|c| c.to_string()).collect(), rows).unwrap()
    }

    #[test]
    fn exact_matches_typed_keys() {
        let first = table(&["id", "amount"], vec![vec![Value::from(42i64), Value::from(10.5)]]);
        let second = table(&["ref"], vec![vec![Value::from("42")], vec![Value::from("43")]]);
        let result = run(&first, &second, &KeySelector::new("id", "ref"), MatchMode::Exact).unwrap();

        assert_eq!(result.matched.len(), 1);
        assert_eq!(result.matched.columns(), &["id", "amount", "ref"]);
        assert_eq!(
            result.matched.rows()[0],
            vec![Value::from("42"), Value::from(10.5), Value::from("42")]
        );
        assert!(result.unmatched_first.is_empty());
        assert!(result.unmatched_second.is_empty());
    }

    #[test]
    fn missing_key_column_fails() {
        let first = table(&["id"], vec![]);
        let second = table(&["ref"], vec![]);
        let err = run(&first, &second, &KeySelector::new("id", "nope"), MatchMode::FullOuter).unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { side: Side::Second, .. }));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn sentinel_policy_matches_missing_with_literal_nan() {
        let first = table(&["k"], vec![vec![Value::Missing]]);
        let second = table(&["k"], vec![vec![Value::from("nan")]]);
        let keys = KeySelector::new("k", "k");

        let result = run(&first, &second, &keys, MatchMode::FullOuter).unwrap();
        assert_eq!(result.matched.len(), 1);

        let options = MatchOptions { mode: MatchMode::FullOuter, missing_keys: MissingKeys::NeverMatch };
        let result = run_with(&first, &second, &keys, &options).unwrap();
        assert!(result.matched.is_empty());
        assert_eq!(result.unmatched_first.rows()[0], vec![Value::Missing]);
        assert_eq!(result.unmatched_second.rows()[0], vec![Value::from("nan")]);
    }

    #[test]
    fn missing_key_meeting_literal_nan_on_other_side_warns() {
        let first = table(&["k"], vec![vec![Value::Missing]]);
        let second = table(&["k"], vec![vec![Value::from("nan")]]);
        let keys = KeySelector::new("k", "k");

        let mut matched = 0;
        let warnings = captured_warnings(|| {
            matched = run(&first, &second, &keys, MatchMode::FullOuter).unwrap().matched.len();
        });
        assert_eq!(matched, 1);
        assert_eq!(warnings.len(), 1, "{warnings:?}");
        assert!(warnings[0].contains("literal 'nan'"));
    }

    #[test]
    fn no_collision_warning_without_literal_nan() {
        let first = table(&["k"], vec![vec![Value::Missing], vec![Value::from("A")]]);
        let second = table(&["k"], vec![vec![Value::Missing]]);
        let keys = KeySelector::new("k", "k");

        let warnings = captured_warnings(|| {
            run(&first, &second, &keys, MatchMode::FullOuter).unwrap();
        });
        assert!(warnings.is_empty(), "{warnings:?}");

        let nan_first = table(&["k"], vec![vec![Value::from("nan")]]);
        let options = MatchOptions { mode: MatchMode::FullOuter, missing_keys: MissingKeys::NeverMatch };
        let warnings = captured_warnings(|| {
            run_with(&nan_first, &second, &keys, &options).unwrap();
        });
        assert!(warnings.is_empty(), "{warnings:?}");
    }
}
