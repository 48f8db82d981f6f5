// Key normalization: both key columns are rendered through one text rule
// before comparison, so an id typed as a number in one file and as text in
// the other still compares equal.

use log::{debug, warn};

use crate::error::{ReconError, Side};
use crate::model::{Dataset, MissingKeys, Value};

/// Text that a missing key renders to under [`MissingKeys::Sentinel`].
pub const MISSING_SENTINEL: &str = "nan";

/// Canonical text form of a value.
pub fn canonical_text(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Number(n) => number_text(*n),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Missing => MISSING_SENTINEL.to_string(),
    }
}

/// Integers without decimals, everything else shortest round-trip.
pub fn number_text(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Copy of `dataset` with every value of `column` replaced by its canonical text.
///
/// Under [`MissingKeys::NeverMatch`] missing values are kept as `Missing` so the
/// matcher can tell them apart from a literal `nan`.
pub fn normalize_key_column(
    dataset: &Dataset,
    column: &str,
    side: Side,
    policy: MissingKeys,
) -> Result<Dataset, ReconError> {
    let idx = dataset.column_index(column).ok_or_else(|| ReconError::MissingColumn {
        side,
        column: column.to_string(),
        available: dataset.columns().to_vec(),
    })?;

    let mut out = dataset.clone();
    let mut missing = 0usize;

    for row in out.rows_mut().iter_mut() {
        let replacement = match &row[idx] {
            Value::Missing => {
                missing += 1;
                match policy {
                    MissingKeys::Sentinel => Some(Value::Text(MISSING_SENTINEL.to_string())),
                    MissingKeys::NeverMatch => None,
                }
            }
            Value::Text(_) => None,
            other => Some(Value::Text(canonical_text(other))),
        };
        if let Some(value) = replacement {
            row[idx] = value;
        }
    }

    debug!(
        "normalized key column '{column}' in {} ({} rows, {missing} missing)",
        side.as_str(),
        out.len()
    );

    Ok(out)
}

/// How many keys of one column are missing or already render as the sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyStats {
    pub missing: usize,
    pub literal_sentinel: usize,
}

impl KeyStats {
    /// Count over the raw (not yet normalized) key column.
    pub fn of(dataset: &Dataset, idx: usize) -> Self {
        dataset.column_values(idx).fold(Self::default(), |mut stats, value| {
            match value {
                Value::Missing => stats.missing += 1,
                Value::Text(s) if s == MISSING_SENTINEL => stats.literal_sentinel += 1,
                Value::Number(n) if n.is_nan() => stats.literal_sentinel += 1,
                _ => {}
            }
            stats
        })
    }
}

/// Warn when a missing key can meet a genuine `nan` key, on either side or
/// across sides. Returns whether a warning was logged.
pub fn warn_sentinel_collisions(first: KeyStats, second: KeyStats, policy: MissingKeys) -> bool {
    if policy == MissingKeys::NeverMatch {
        return false;
    }
    let missing = first.missing + second.missing;
    let literal = first.literal_sentinel + second.literal_sentinel;
    if missing == 0 || literal == 0 {
        return false;
    }
    warn!(
        "{missing} missing key(s) (file 1: {}, file 2: {}) will match {literal} literal '{MISSING_SENTINEL}' key(s) (file 1: {}, file 2: {}); use never_match to keep them apart",
        first.missing, second.missing, first.literal_sentinel, second.literal_sentinel
    );
    true
}

/// Normalized key of one row, or `None` when it must never match.
pub(crate) fn key_of(row: &[Value], idx: usize) -> Option<&str> {
    match &row[idx] {
        Value::Text(s) => Some(s.as_str()),
        _ => None,
    }
}
