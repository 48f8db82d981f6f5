//! Boundary layer for the `sheetmatch` binary: request validation,
//! the columns/match/export operations and exit-code classification.

pub mod exit_codes;
pub mod service;
