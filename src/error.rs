use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to read CSV: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    #[error("JSON encoding error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("Failed to read CSV: no header row found")]
    EmptyInput,

    #[error("Failed to read CSV: row {row} has {found} fields, header declares {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("Unknown report '{0}'")]
    UnknownReport(String),

    #[error("Top N must be between 5 and 50, got {value}")]
    TopNOutOfRange { value: usize },
}

pub type Result<T> = std::result::Result<T, ReportError>;
