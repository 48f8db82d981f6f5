//! Request boundary: validates a request, runs load → match → encode/export,
//! and classifies every failure. Each call is independent; nothing is kept
//! between calls, and a failed call produces no partial output.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{error, info};
use sheetmatch_io::json::{ColumnsResponse, MatchResponse};
use sheetmatch_io::xlsx::{self, ExportDocument};
use sheetmatch_io::LoadError;
use sheetmatch_recon::{
    Dataset, KeySelector, MatchJob, MatchMode, MatchOptions, MatchResult, MissingKeys, ReconError,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ServiceError {
    /// Required request fields absent; nothing was loaded.
    InputMissing(Vec<&'static str>),
    /// Job file could not be parsed or validated.
    InvalidJob(ReconError),
    Load(LoadError),
    Match(ReconError),
    /// Anything else. `detail` is logged, never shown to the caller.
    Unclassified { stage: &'static str, detail: String },
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InputMissing(_) => "input_missing",
            Self::InvalidJob(_) => "invalid_job",
            Self::Load(_) => "load_error",
            Self::Match(_) => "match_error",
            Self::Unclassified { .. } => "unclassified",
        }
    }

    /// Message safe to hand back to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::Unclassified { stage, .. } => format!("an error occurred during {stage}"),
            other => other.to_string(),
        }
    }

    pub(crate) fn unclassified(stage: &'static str, detail: impl fmt::Display) -> Self {
        let detail = detail.to_string();
        error!("{stage} failed: {detail}");
        Self::Unclassified { stage, detail }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputMissing(fields) => write!(f, "missing required input: {}", fields.join(", ")),
            Self::InvalidJob(e) => write!(f, "{e}"),
            Self::Load(e) => write!(f, "{e}"),
            Self::Match(e) => write!(f, "{e}"),
            Self::Unclassified { stage, detail } => write!(f, "{stage} failed: {detail}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<LoadError> for ServiceError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

impl From<ReconError> for ServiceError {
    fn from(e: ReconError) -> Self {
        Self::Match(e)
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ColumnsRequest {
    pub file1: Option<PathBuf>,
    pub file2: Option<PathBuf>,
}

/// A match or export request. Mode is optional and defaults to full outer.
#[derive(Debug, Clone, Default)]
pub struct MatchRequest {
    pub file1: Option<PathBuf>,
    pub file2: Option<PathBuf>,
    pub col1: Option<String>,
    pub col2: Option<String>,
    pub mode: Option<MatchMode>,
    pub missing_keys: MissingKeys,
}

impl From<&MatchJob> for MatchRequest {
    fn from(job: &MatchJob) -> Self {
        Self {
            file1: job.file1.clone(),
            file2: job.file2.clone(),
            col1: job.col1.clone(),
            col2: job.col2.clone(),
            mode: job.mode,
            missing_keys: job.missing_keys,
        }
    }
}

struct ValidMatch<'a> {
    file1: &'a Path,
    file2: &'a Path,
    keys: KeySelector,
    options: MatchOptions,
}

fn require_files<'a>(
    file1: &'a Option<PathBuf>,
    file2: &'a Option<PathBuf>,
    missing: &mut Vec<&'static str>,
) -> Option<(&'a Path, &'a Path)> {
    if file1.is_none() {
        missing.push("file1");
    }
    if file2.is_none() {
        missing.push("file2");
    }
    Some((file1.as_deref()?, file2.as_deref()?))
}

impl MatchRequest {
    fn validate(&self) -> Result<ValidMatch<'_>, ServiceError> {
        let mut missing = Vec::new();
        let files = require_files(&self.file1, &self.file2, &mut missing);
        let col1 = self.col1.as_deref().filter(|c| !c.is_empty());
        let col2 = self.col2.as_deref().filter(|c| !c.is_empty());
        if col1.is_none() {
            missing.push("col1");
        }
        if col2.is_none() {
            missing.push("col2");
        }

        match (files, col1, col2) {
            (Some((file1, file2)), Some(col1), Some(col2)) if missing.is_empty() => Ok(ValidMatch {
                file1,
                file2,
                keys: KeySelector::new(col1, col2),
                options: MatchOptions {
                    mode: self.mode.unwrap_or_default(),
                    missing_keys: self.missing_keys,
                },
            }),
            _ => Err(ServiceError::InputMissing(missing)),
        }
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

fn load_pair(file1: &Path, file2: &Path) -> Result<(Dataset, Dataset), ServiceError> {
    let first = sheetmatch_io::load(file1)?;
    let second = sheetmatch_io::load(file2)?;
    Ok((first, second))
}

/// Column names of both sources.
pub fn list_columns(req: &ColumnsRequest) -> Result<ColumnsResponse, ServiceError> {
    let mut missing = Vec::new();
    let (file1, file2) = require_files(&req.file1, &req.file2, &mut missing)
        .ok_or(ServiceError::InputMissing(missing))?;
    let (first, second) = load_pair(file1, file2)?;
    Ok(ColumnsResponse::new(&first, &second))
}

/// Validate, load both sources and run the engine.
pub fn reconcile(req: &MatchRequest) -> Result<MatchResult, ServiceError> {
    let valid = req.validate()?;
    let (first, second) = load_pair(valid.file1, valid.file2)?;
    let result = sheetmatch_recon::run_with(&first, &second, &valid.keys, &valid.options)?;

    let s = result.summary();
    info!(
        "{} vs {} ({}): {} matched, {} only in file 1, {} only in file 2",
        valid.file1.display(),
        valid.file2.display(),
        valid.options.mode,
        s.matched,
        s.unmatched_first,
        s.unmatched_second,
    );
    Ok(result)
}

/// Preview path: all three partitions, missing values as `""`.
pub fn match_records(req: &MatchRequest) -> Result<MatchResponse, ServiceError> {
    reconcile(req).map(|result| MatchResponse::new(&result))
}

/// Export path: an xlsx document with one sheet per non-empty partition.
pub fn export(req: &MatchRequest) -> Result<ExportDocument, ServiceError> {
    let result = reconcile(req)?;
    export_result(&result)
}

pub fn export_result(result: &MatchResult) -> Result<ExportDocument, ServiceError> {
    xlsx::export(result).map_err(|e| ServiceError::unclassified("export", e))
}
