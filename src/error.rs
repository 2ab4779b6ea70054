use thiserror::Error;

/// Everything that can abort a load. No variant is recovered internally;
/// all of them surface to the caller, which logs and terminates the run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source not found: {0}")]
    SourceNotFound(String),

    #[error("source contains no header row")]
    SourceEmpty,

    #[error("header defines no columns")]
    EmptyHeader,

    #[error("row {row}: expected {expected} fields, found {found}")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("chunk size must be a positive integer")]
    InvalidChunkSize,

    #[error("statement execution failed: {0}")]
    ExecutionFailed(#[from] rusqlite::Error),

    #[error("reading source record: {0}")]
    Record(#[from] csv::Error),
}
