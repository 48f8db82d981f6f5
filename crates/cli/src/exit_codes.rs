//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | Unclassified failure                     |
//! | 2       | Universal        | Usage error (bad args, missing input)    |
//! | 3-9     | match            | Load and matching failures               |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `service_exit_code`

use serde::Serialize;

use crate::service::ServiceError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Unclassified failure during matching or export (details are logged).
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, required input absent, unreadable job file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Match (3-9)
// =============================================================================

/// A dataset source could not be parsed into a table.
pub const EXIT_LOAD: u8 = 3;

/// A key column does not exist in its dataset.
pub const EXIT_MATCH: u8 = 4;

/// Map a ServiceError to its exit code.
pub fn service_exit_code(err: &ServiceError) -> u8 {
    match err {
        ServiceError::InputMissing(_) | ServiceError::InvalidJob(_) => EXIT_USAGE,
        ServiceError::Load(_) => EXIT_LOAD,
        ServiceError::Match(_) => EXIT_MATCH,
        ServiceError::Unclassified { .. } => EXIT_ERROR,
    }
}

/// Structured error output for `--json` callers.
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub error: String,
    pub kind: &'static str,
    pub exit_code: u8,
}

impl ErrorOutput {
    pub fn from_service_error(err: &ServiceError) -> Self {
        Self {
            error: err.public_message(),
            kind: err.kind(),
            exit_code: service_exit_code(err),
        }
    }
}
