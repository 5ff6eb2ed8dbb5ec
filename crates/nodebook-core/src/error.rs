//! Error types for Nodebook Core
//!
//! None of these reach the caller of an execution; they surface from
//! document loading, configuration and explicit lookups.

use crate::types::CellKey;

/// Main core error type
#[derive(Debug, thiserror::Error)]
pub enum NodebookError {
    /// Notebook JSON could not be parsed
    #[error("invalid notebook: {0}")]
    InvalidNotebook(String),

    /// Notebook JSON failed to (de)serialize
    #[error("notebook serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Cell key not present in the document
    #[error("unknown cell: {0}")]
    UnknownCell(CellKey),

    /// Index outside the document
    #[error("cell index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl NodebookError {
    /// Whether the error came from a bad document rather than the environment
    #[inline]
    #[must_use]
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidNotebook(_)
                | Self::Serialization(_)
                | Self::UnknownCell(_)
                | Self::IndexOutOfRange { .. }
        )
    }
}
