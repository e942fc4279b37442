use std::path::PathBuf;

use thiserror::Error;

use crate::llm_client::LlmError;
use crate::models::RowWidthError;

/// Fatal errors of a scoring run. Unparseable model replies are not here:
/// they are recovered row by row and never abort the run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to load table from {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Malformed table {} at line {line}: {source}", .path.display())]
    MalformedRow {
        path: PathBuf,
        line: u64,
        #[source]
        source: RowWidthError,
    },

    #[error("Table has no '{column}' column")]
    MissingColumn { column: &'static str },

    #[error("Model call failed on row {row}: {source}")]
    RemoteCall {
        row: usize,
        #[source]
        source: LlmError,
    },

    #[error("Failed to save table to {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
