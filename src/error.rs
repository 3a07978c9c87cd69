// src/error.rs

use thiserror::Error;

/// The only failure `clean()` reports: the raw table cannot be used at all.
/// Row-level problems are counted in `CleanStats` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("required column `{column}` not found (available: {})", available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
}
