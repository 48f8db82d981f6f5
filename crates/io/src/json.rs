// JSON wire format for the preview path

use serde::Serialize;
use serde_json::{Map, Number, Value as JsonValue};

use sheetmatch_recon::sanitize::sanitize_value;
use sheetmatch_recon::{Dataset, MatchResult, Value};

/// Largest integer an f64 holds exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

pub type JsonRecord = Map<String, JsonValue>;

#[derive(Debug, Clone, Serialize)]
pub struct ColumnsResponse {
    pub columns1: Vec<String>,
    pub columns2: Vec<String>,
}

impl ColumnsResponse {
    pub fn new(first: &Dataset, second: &Dataset) -> Self {
        Self {
            columns1: first.columns().to_vec(),
            columns2: second.columns().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResponse {
    pub matched: Vec<JsonRecord>,
    pub unmatched1: Vec<JsonRecord>,
    pub unmatched2: Vec<JsonRecord>,
}

impl MatchResponse {
    /// Encode all three partitions; missing values become `""`.
    pub fn new(result: &MatchResult) -> Self {
        Self {
            matched: records(&result.matched),
            unmatched1: records(&result.unmatched_first),
            unmatched2: records(&result.unmatched_second),
        }
    }
}

/// One JSON object per row, keys in column order.
pub fn records(dataset: &Dataset) -> Vec<JsonRecord> {
    dataset
        .records()
        .map(|record| {
            record
                .iter()
                .map(|(column, value)| (column.to_string(), json_value(&sanitize_value(value))))
                .collect()
        })
        .collect()
}

/// Integral numbers encode as JSON integers, the rest as floats.
fn json_value(value: &Value) -> JsonValue {
    match value {
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
            JsonValue::Number(Number::from(*n as i64))
        }
        Value::Number(n) => Number::from_f64(*n)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(String::new())),
        Value::Missing => JsonValue::String(String::new()),
    }
}
