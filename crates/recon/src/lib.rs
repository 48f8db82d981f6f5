//! `sheetmatch-recon`: key-column reconciliation of two tabular datasets.
//!
//! Pure engine crate: receives pre-loaded datasets, returns the matched and
//! unmatched partitions. No file IO.

pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod partition;
pub mod sanitize;

pub use config::{MatchJob, MatchOptions};
pub use engine::{run, run_with};
pub use error::{ReconError, Side};
pub use model::{Dataset, KeySelector, MatchMode, MatchResult, MissingKeys, Record, Value};
