use std::fmt;

/// Which input a column or record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::First => "file 1",
            Side::Second => "file 2",
        }
    }
}

#[derive(Debug)]
pub enum ReconError {
    /// Key column not present in the dataset's schema.
    MissingColumn { side: Side, column: String, available: Vec<String> },
    /// Row width does not match the dataset's column count.
    RaggedRow { row: usize, expected: usize, found: usize },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Job validation error (bad mode, empty column name, etc.).
    ConfigValidation(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { side, column, available } => {
                write!(f, "{}: no column named '{column}'", side.as_str())?;
                if !available.is_empty() {
                    write!(f, " (available: {})", available.join(", "))?;
                }
                Ok(())
            }
            Self::RaggedRow { row, expected, found } => {
                write!(f, "row {row}: expected {expected} values, found {found}")
            }
            Self::ConfigParse(msg) => write!(f, "job parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "job validation error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
