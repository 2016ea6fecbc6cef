use thiserror::Error;

/// Main error type for sifter operations
#[derive(Error, Debug)]
pub enum SifterError {
    #[error("Query syntax error at position {position}: {message}")]
    QuerySyntax { position: usize, message: String },

    #[error("Commit failed: {0}")]
    Commit(String),

    #[error("Reader used after its generation was released")]
    StaleGenerationAccess,

    #[error("Index store is closed")]
    StoreClosed,

    #[error("Another writer holds the index write lock")]
    WriterLocked,

    #[error("Index corrupted: {0}")]
    Corrupted(String),

    #[error("Incompatible index format: version {actual}, expected <= {expected}")]
    IncompatibleFormat { expected: u32, actual: u32 },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid facet: {0}")]
    InvalidFacet(String),

    #[error("Match set belongs to generation {actual}, searcher is bound to {expected}")]
    GenerationMismatch { expected: u64, actual: u64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for sifter operations
pub type Result<T> = std::result::Result<T, SifterError>;

impl SifterError {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        SifterError::QuerySyntax {
            position,
            message: message.into(),
        }
    }

    /// Check if the failed operation may be retried with a fresh writer
    pub fn is_retriable(&self) -> bool {
        matches!(self, SifterError::Commit(_) | SifterError::WriterLocked)
    }
}
