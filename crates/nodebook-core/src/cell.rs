//! Cells and their persisted metadata record

use crate::types::{CellKey, CellKind, NodeName};
use serde::{Deserialize, Serialize};

/// Persisted per-cell metadata.
///
/// Serialized under the nbformat metadata keys `node_name` / `node_exists`.
/// Keys written by other tools are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellMetadata {
    /// Persisted node identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<NodeName>,

    /// Persisted graph membership flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_exists: Option<bool>,

    /// Everything else in the metadata object
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One executable (or not) unit in the notebook
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Transient document key
    pub key: CellKey,
    /// Cell type
    pub kind: CellKind,
    /// Source text
    pub source: String,
    /// Persisted metadata
    pub metadata: CellMetadata,
}

impl Cell {
    /// New cell with a fresh key and empty metadata
    #[must_use]
    pub fn new(kind: CellKind, source: impl Into<String>) -> Self {
        Self {
            key: CellKey::generate(),
            kind,
            source: source.into(),
            metadata: CellMetadata::default(),
        }
    }

    /// New code cell
    #[must_use]
    pub fn code(source: impl Into<String>) -> Self {
        Self::new(CellKind::Code, source)
    }

    /// New markdown cell
    #[must_use]
    pub fn markdown(source: impl Into<String>) -> Self {
        Self::new(CellKind::Markdown, source)
    }

    /// Replace the generated key
    #[must_use]
    pub fn with_key(mut self, key: CellKey) -> Self {
        self.key = key;
        self
    }

    /// Pre-populate persisted metadata
    #[must_use]
    pub fn with_metadata(mut self, metadata: CellMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether the source is blank after trimming
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.source.trim().is_empty()
    }
}
