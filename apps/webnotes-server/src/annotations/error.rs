//! Annotation store errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Annotation text is empty")]
    EmptyText,

    #[error("Note annotation without note text")]
    MissingNote,

    #[error("Highlight annotation cannot carry a note")]
    NoteOnHighlight,

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Annotation writer is not running")]
    WriterUnavailable,
}

impl StoreError {
    /// Errors caused by the submitted record rather than by storage
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StoreError::EmptyText | StoreError::MissingNote | StoreError::NoteOnHighlight
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
