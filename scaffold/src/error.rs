//! Error types for the prerequisite walk.

use syllabus::SyllabusError;

use crate::store::BlobKey;

/// Error types for scaffold operations.
#[derive(Debug, thiserror::Error)]
pub enum ScaffoldError {
    /// Blob store I/O failure
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted blob could not be encoded or decoded
    #[error("Invalid persisted payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Catalog collaborator failure
    #[error("Catalog error: {0}")]
    Catalog(#[from] SyllabusError),

    /// Oracle collaborator failure
    #[error("Oracle error: {0}")]
    Oracle(#[from] scaffold_agent::LlmError),

    /// A confirmation referenced a level with no persisted render batch
    #[error("No render-item batch persisted for level {0}")]
    MissingBatch(u32),

    /// An expected blob is absent from the store
    #[error("Missing blob: {0}")]
    MissingBlob(BlobKey),

    /// The oracle produced a paper with no questions
    #[error("Generated paper contains no questions")]
    EmptyPaper,
}
