//! Error types for catalog access and chapter normalization.

/// Error types for syllabus operations.
#[derive(Debug, thiserror::Error)]
pub enum SyllabusError {
    /// A chapter record is missing its number or name
    #[error("Malformed chapter record: {0}")]
    MalformedChapter(String),

    /// Transport-level catalog failure
    #[error("Catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Catalog answered with a non-success status
    #[error("Catalog returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Catalog payload could not be decoded
    #[error("Invalid catalog payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A class level string could not be parsed
    #[error("Invalid class level: {0}")]
    InvalidClassLevel(String),
}
