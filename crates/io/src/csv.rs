// CSV/TSV import

use std::io::Read;
use std::path::Path;

use sheetmatch_recon::{Dataset, Value};

use crate::{build_dataset, source_name, LoadError};

pub fn import(path: &Path) -> Result<Dataset, LoadError> {
    let name = source_name(path);
    let content = read_file_as_utf8(path).map_err(|e| LoadError::new(&name, e))?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&name, &content, delimiter)
}

pub fn import_tsv(path: &Path) -> Result<Dataset, LoadError> {
    let name = source_name(path);
    let content = read_file_as_utf8(path).map_err(|e| LoadError::new(&name, e))?;
    import_from_string(&name, &content, b'\t')
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Score: (lines with the same field count as line 1) * field_count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(s)),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Type a raw CSV field the way a spreadsheet would have.
pub fn infer_value(field: &str) -> Value {
    if field.is_empty() {
        return Value::Missing;
    }
    match field {
        "True" | "TRUE" | "true" => return Value::Bool(true),
        "False" | "FALSE" | "false" => return Value::Bool(false),
        _ => {}
    }
    // "nan"/"inf" parse as f64 but are text in a CSV
    let looks_numeric = field
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
    match field.parse::<f64>() {
        Ok(n) if looks_numeric && n.is_finite() => Value::Number(n),
        _ => Value::Text(field.to_string()),
    }
}

fn import_from_string(name: &str, content: &str, delimiter: u8) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header: Vec<Value> = match records.next() {
        Some(record) => record
            .map_err(|e| LoadError::new(name, e.to_string()))?
            .iter()
            .map(|h| if h.is_empty() { Value::Missing } else { Value::text(h) })
            .collect(),
        None => return Err(LoadError::new(name, "no header row")),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(|e| LoadError::new(name, e.to_string()))?;
        rows.push(record.iter().map(infer_value).collect());
    }

    build_dataset(name, &header, rows)
}
