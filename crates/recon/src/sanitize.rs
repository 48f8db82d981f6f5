// Missing values have no JSON representation on the preview path; they are
// replaced by an empty string before encoding. The xlsx writer keeps them as
// native blanks and never goes through here.

use crate::model::{Dataset, Value};

pub fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::Missing => Value::Text(String::new()),
        Value::Number(n) if !n.is_finite() => Value::Text(String::new()),
        other => other.clone(),
    }
}

/// Copy of `dataset` with every missing value replaced by `""`.
pub fn sanitize(dataset: &Dataset) -> Dataset {
    let mut out = Dataset::new(dataset.columns().to_vec());
    *out.rows_mut() = dataset
        .rows()
        .iter()
        .map(|row| row.iter().map(sanitize_value).collect())
        .collect();
    out
}
