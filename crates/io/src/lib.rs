// File I/O: dataset loaders and result writers around the recon engine

pub mod csv;
pub mod json;
pub mod xlsx;

use std::fmt;
use std::path::Path;

use sheetmatch_recon::normalize::canonical_text;
use sheetmatch_recon::{Dataset, Value};

/// A dataset source could not be turned into a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    /// File name (or other label) of the source that failed.
    pub source_name: String,
    /// Underlying parser message.
    pub message: String,
}

impl LoadError {
    pub fn new(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { source_name: source_name.into(), message: message.into() }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot read {}: {}", self.source_name, self.message)
    }
}

impl std::error::Error for LoadError {}

/// Load a dataset from disk, choosing the reader by file extension.
///
/// `.csv`/`.txt` are sniffed for their delimiter, `.tsv`/`.tab` are tab
/// separated, anything else goes to the spreadsheet reader.
pub fn load(path: &Path) -> Result<Dataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" | "txt" => csv::import(path),
        "tsv" | "tab" => csv::import_tsv(path),
        _ => xlsx::import(path),
    }
}

/// Display name for a path in error messages.
pub(crate) fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Turn a raw header row into unique column names.
///
/// Blank headers become `Unnamed: <index>`; a repeated name gets `.1`, `.2`, ...
/// appended in order of appearance.
pub(crate) fn header_names(raw: &[Value]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(raw.len());
    for (i, cell) in raw.iter().enumerate() {
        let base = match cell {
            Value::Missing => format!("Unnamed: {i}"),
            Value::Text(s) if s.trim().is_empty() => format!("Unnamed: {i}"),
            other => canonical_text(other),
        };
        let mut name = base.clone();
        let mut n = 1;
        while names.contains(&name) {
            name = format!("{base}.{n}");
            n += 1;
        }
        names.push(name);
    }
    names
}

/// Assemble a dataset from a header row and raw data rows.
///
/// Short rows are padded with `Missing`; fully blank rows are dropped.
pub(crate) fn build_dataset(
    source: &str,
    header: &[Value],
    rows: impl IntoIterator<Item = Vec<Value>>,
) -> Result<Dataset, LoadError> {
    let columns = header_names(header);
    let width = columns.len();
    let mut dataset = Dataset::new(columns);
    let mut blank = 0usize;

    for (i, mut row) in rows.into_iter().enumerate() {
        if row.iter().all(Value::is_missing) {
            blank += 1;
            continue;
        }
        if row.len() > width {
            return Err(LoadError::new(
                source,
                format!("row {}: expected {width} fields, found {}", i + 2, row.len()),
            ));
        }
        row.resize(width, Value::Missing);
        dataset
            .push_row(row)
            .map_err(|e| LoadError::new(source, e.to_string()))?;
    }

    if blank > 0 {
        log::warn!("{source}: skipped {blank} blank rows");
    }
    log::debug!("{source}: loaded {} rows x {width} columns", dataset.len());
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::sync::Once;

    thread_local! {
        static WARNINGS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

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

    #[test]
    fn header_names_fill_and_dedupe() {
        let raw = vec![
            Value::from("id"),
            Value::Missing,
            Value::from("id"),
            Value::Number(2024.0),
            Value::from("id"),
            Value::from("  "),
        ];
        assert_eq!(
            header_names(&raw),
            vec!["id", "Unnamed: 1", "id.1", "2024", "id.2", "Unnamed: 5"]
        );
    }

    #[test]
    fn build_pads_and_skips_blank_rows() {
        let header = vec![Value::from("a"), Value::from("b")];
        let rows = vec![
            vec![Value::from("x")],
            vec![Value::Missing, Value::Missing],
            vec![Value::from("y"), Value::from(1.0)],
        ];
        let ds = build_dataset("t.csv", &header, rows).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows()[0], vec![Value::from("x"), Value::Missing]);
    }

    #[test]
    fn skipped_blank_rows_warn() {
        let header = vec![Value::from("a")];
        let rows = vec![vec![Value::Missing], vec![Value::from("x")], vec![Value::Missing]];

        let mut loaded = 0;
        let warnings = captured_warnings(|| {
            loaded = build_dataset("gaps.csv", &header, rows).unwrap().len();
        });
        assert_eq!(loaded, 1);
        assert_eq!(warnings, vec!["gaps.csv: skipped 2 blank rows".to_string()]);
    }

    #[test]
    fn build_rejects_wide_rows() {
        let header = vec![Value::from("a")];
        let err = build_dataset("t.csv", &header, vec![vec![Value::from("x"), Value::from("y")]])
            .unwrap_err();
        assert_eq!(err.source_name, "t.csv");
        assert!(err.message.contains("expected 1 fields"));
    }

    #[test]
    fn load_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.TSV");
        std::fs::write(&path, "id\tname\n1\tAlice\n").unwrap();
        let ds = load(&path).unwrap();
        assert_eq!(ds.columns(), &["id", "name"]);
    }

    #[test]
    fn load_missing_file_is_load_error() {
        let err = load(Path::new("/nonexistent/dir/book.xlsx")).unwrap_err();
        assert_eq!(err.source_name, "book.xlsx");
    }
}
