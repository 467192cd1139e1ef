use thiserror::Error;

/// Errors raised while reading a transaction export.
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("CSV export is empty")]
    Empty,

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("Malformed CSV: {0}")]
    Malformed(#[from] csv::Error),
}
