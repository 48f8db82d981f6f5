use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ReconError;
use crate::model::{MatchMode, MissingKeys};

// ---------------------------------------------------------------------------
// Engine options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    pub mode: MatchMode,
    pub missing_keys: MissingKeys,
}

// ---------------------------------------------------------------------------
// Job file
// ---------------------------------------------------------------------------

/// A reconciliation job read from a `.match.toml` file.
///
/// Every request field is optional here; absent ones are reported by the
/// caller as missing input rather than as a parse failure.
///
/// ```toml
/// file1 = "bank.xlsx"
/// file2 = "ledger.xlsx"
/// col1 = "Reference"
/// col2 = "Txn ID"
/// mode = "full"
///
/// [output]
/// xlsx = "comparison_results.xlsx"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchJob {
    #[serde(default)]
    pub file1: Option<PathBuf>,
    #[serde(default)]
    pub file2: Option<PathBuf>,
    #[serde(default)]
    pub col1: Option<String>,
    #[serde(default)]
    pub col2: Option<String>,
    #[serde(default)]
    pub mode: Option<MatchMode>,
    #[serde(default)]
    pub missing_keys: MissingKeys,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<PathBuf>,
    #[serde(default)]
    pub xlsx: Option<PathBuf>,
}

impl MatchJob {
    pub fn from_toml(s: &str) -> Result<Self, ReconError> {
        let job: MatchJob = toml::from_str(s).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        job.validate()?;
        Ok(job)
    }

    fn validate(&self) -> Result<(), ReconError> {
        for (field, value) in [("col1", &self.col1), ("col2", &self.col2)] {
            if let Some(v) = value {
                if v.is_empty() {
                    return Err(ReconError::ConfigValidation(format!("{field} must not be empty")));
                }
            }
        }
        Ok(())
    }

    /// Resolve relative input/output paths against the job file's directory.
    pub fn resolve_paths(&mut self, base_dir: &Path) {
        let resolve = |p: &mut Option<PathBuf>| {
            if let Some(path) = p {
                if path.is_relative() {
                    *path = base_dir.join(&*path);
                }
            }
        };
        resolve(&mut self.file1);
        resolve(&mut self.file2);
        resolve(&mut self.output.json);
        resolve(&mut self.output.xlsx);
    }

    pub fn options(&self) -> MatchOptions {
        MatchOptions {
            mode: self.mode.unwrap_or_default(),
            missing_keys: self.missing_keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_job() {
        let job = MatchJob::from_toml(
            r#"
file1 = "a.xlsx"
file2 = "b.csv"
col1 = "id"
col2 = "ref"
mode = "missing_in_2"
missing_keys = "never_match"

[output]
json = "out.json"
"#,
        )
        .unwrap();
        assert_eq!(job.file1.as_deref(), Some(Path::new("a.xlsx")));
        assert_eq!(job.options().mode, MatchMode::MissingInSecond);
        assert_eq!(job.options().missing_keys, MissingKeys::NeverMatch);
        assert_eq!(job.output.json.as_deref(), Some(Path::new("out.json")));
        assert!(job.output.xlsx.is_none());
    }

    #[test]
    fn mode_defaults_to_full_outer() {
        let job = MatchJob::from_toml("file1 = \"a.xlsx\"").unwrap();
        assert_eq!(job.options().mode, MatchMode::FullOuter);
        assert_eq!(job.options().missing_keys, MissingKeys::Sentinel);
        assert!(job.col1.is_none());
    }

    #[test]
    fn unknown_mode_is_parse_error() {
        let err = MatchJob::from_toml("mode = \"left\"").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn unknown_field_rejected() {
        let err = MatchJob::from_toml("key = \"id\"").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn empty_column_rejected() {
        let err = MatchJob::from_toml("col1 = \"\"").unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
    }

    #[test]
    fn relative_paths_resolve_against_job_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut job = MatchJob::from_toml(
            "file1 = \"a.xlsx\"\nfile2 = \"/abs/b.xlsx\"\n[output]\nxlsx = \"out/result.xlsx\"",
        )
        .unwrap();
        job.resolve_paths(dir.path());
        assert_eq!(job.file1.unwrap(), dir.path().join("a.xlsx"));
        assert_eq!(job.file2.unwrap(), PathBuf::from("/abs/b.xlsx"));
        assert_eq!(job.output.xlsx.unwrap(), dir.path().join("out/result.xlsx"));
    }
}
