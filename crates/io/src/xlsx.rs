// Spreadsheet import (xlsx, xls, xlsb, ods) and result export (xlsx only)
//
// Import: first worksheet, first row of the used range is the header.
// Export: one sheet per non-empty partition, written to an in-memory buffer.

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets};
use chrono::NaiveDateTime;
use log::debug;
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet, XlsxError};
use sheetmatch_recon::{Dataset, MatchResult, Value};

use crate::{build_dataset, source_name, LoadError};

/// Download name of the exported document.
pub const EXPORT_FILENAME: &str = "comparison_results.xlsx";

/// MIME type of the exported document.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const SHEET_MATCHED: &str = "Matched Rows";
pub const SHEET_UNMATCHED_FIRST: &str = "Unmatched in File 1";
pub const SHEET_UNMATCHED_SECOND: &str = "Unmatched in File 2";

/// Excel worksheet limits
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Import the first sheet of a spreadsheet file.
pub fn import(path: &Path) -> Result<Dataset, LoadError> {
    let name = source_name(path);
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| LoadError::new(&name, format!("Failed to open spreadsheet: {e}")))?;
    read_first_sheet(&mut workbook, &name)
}

/// Import the first sheet of a spreadsheet held in memory (e.g. an upload).
pub fn import_bytes(name: &str, bytes: &[u8]) -> Result<Dataset, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| LoadError::new(name, format!("Failed to open spreadsheet: {e}")))?;
    read_first_sheet(&mut workbook, name)
}

fn read_first_sheet<RS: Read + Seek>(workbook: &mut Sheets<RS>, name: &str) -> Result<Dataset, LoadError> {
    let sheet_names = workbook.sheet_names();
    let first = sheet_names
        .first()
        .ok_or_else(|| LoadError::new(name, "Excel file contains no sheets"))?;

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| LoadError::new(name, format!("Failed to read sheet '{first}': {e}")))?;

    let (height, width) = range.get_size();
    // Range start offset (data may not begin at A1); leading empty columns stay as columns
    let (_, start_col) = range.start().unwrap_or((0, 0));
    debug!("{name}: sheet '{first}' is {height}x{width}, first column {start_col}");

    let row_values = |cells: &[Data]| -> Vec<Value> {
        let mut values = vec![Value::Missing; start_col as usize];
        values.extend(cells.iter().map(cell_value));
        values
    };

    let mut rows = range.rows();
    let header: Vec<Value> = match rows.next() {
        Some(cells) => row_values(cells),
        None => return Err(LoadError::new(name, format!("sheet '{first}' is empty"))),
    };

    build_dataset(name, &header, rows.map(row_values))
}

/// Map a calamine cell onto the dataset value model.
pub fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Missing,
        Data::String(s) => {
            if s.is_empty() {
                Value::Missing
            } else {
                Value::Text(s.clone())
            }
        }
        Data::Float(n) => Value::Number(*n),
        Data::Int(n) => Value::Number(*n as f64),
        Data::Bool(b) => Value::Bool(*b),
        // #N/A, #DIV/0! and friends carry no comparable value
        Data::Error(_) => Value::Missing,
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => Value::Text(datetime_text(&ndt)),
            None => Value::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => Value::Text(s.clone()),
        Data::DurationIso(s) => Value::Text(s.clone()),
    }
}

fn datetime_text(ndt: &NaiveDateTime) -> String {
    ndt.format("%Y-%m-%d %H:%M:%S").to_string()
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ExportError {
    /// Every partition is empty; a workbook needs at least one sheet.
    NothingToExport,
    /// A partition does not fit in a worksheet.
    TooLarge { sheet: &'static str, rows: usize, cols: usize },
    Xlsx(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NothingToExport => write!(f, "nothing to export: all result partitions are empty"),
            Self::TooLarge { sheet, rows, cols } => {
                write!(f, "sheet '{sheet}' is too large for xlsx ({rows} rows x {cols} columns)")
            }
            Self::Xlsx(msg) => write!(f, "xlsx write failed: {msg}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<XlsxError> for ExportError {
    fn from(e: XlsxError) -> Self {
        Self::Xlsx(e.to_string())
    }
}

/// An exported workbook ready to hand to the caller.
#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub filename: &'static str,
    pub content_type: &'static str,
    /// Sheets written, in order.
    pub sheets: Vec<&'static str>,
    pub bytes: Vec<u8>,
}

/// Write the non-empty partitions of `result` as named sheets.
pub fn export(result: &MatchResult) -> Result<ExportDocument, ExportError> {
    let partitions = [
        (SHEET_MATCHED, &result.matched),
        (SHEET_UNMATCHED_FIRST, &result.unmatched_first),
        (SHEET_UNMATCHED_SECOND, &result.unmatched_second),
    ];

    let mut xlsx_workbook = XlsxWorkbook::new();
    let header_format = Format::new().set_bold();
    let mut sheets = Vec::new();

    for (sheet_name, dataset) in partitions {
        if dataset.is_empty() {
            continue;
        }
        if dataset.len() + 1 > MAX_ROWS || dataset.columns().len() > MAX_COLS {
            return Err(ExportError::TooLarge {
                sheet: sheet_name,
                rows: dataset.len(),
                cols: dataset.columns().len(),
            });
        }
        let worksheet = xlsx_workbook.add_worksheet().set_name(sheet_name)?;
        write_sheet(worksheet, dataset, &header_format)?;
        sheets.push(sheet_name);
    }

    if sheets.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let bytes = xlsx_workbook.save_to_buffer()?;
    debug!("exported {} sheets ({} bytes)", sheets.len(), bytes.len());

    Ok(ExportDocument {
        filename: EXPORT_FILENAME,
        content_type: XLSX_CONTENT_TYPE,
        sheets,
        bytes,
    })
}

/// Header row in bold, then one row per record. Missing values stay blank.
fn write_sheet(worksheet: &mut Worksheet, dataset: &Dataset, header_format: &Format) -> Result<(), XlsxError> {
    for (col, name) in dataset.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, header_format)?;
    }

    for (r, row) in dataset.rows().iter().enumerate() {
        let row32 = (r + 1) as u32;
        for (c, value) in row.iter().enumerate() {
            let col16 = c as u16;
            match value {
                Value::Text(s) => {
                    worksheet.write_string(row32, col16, s)?;
                }
                Value::Number(n) if n.is_finite() => {
                    worksheet.write_number(row32, col16, *n)?;
                }
                Value::Bool(b) => {
                    worksheet.write_boolean(row32, col16, *b)?;
                }
                Value::Number(_) | Value::Missing => {}
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}
