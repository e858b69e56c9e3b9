use thiserror::Error;

/// Reasons a raw association cannot become an `AssociationRecord`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A required field is absent or null
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// Main error type for biokg
#[derive(Error, Debug)]
pub enum BiokgError {
    /// Malformed association record
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Association source failures (only surfaced outside the traversal core)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tabular secondary source errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A traversal was cancelled between iterations
    #[error("Traversal cancelled")]
    Cancelled,
}

/// Convenient Result type using BiokgError
pub type Result<T> = std::result::Result<T, BiokgError>;
