//! Ordered notebook document
//!
//! Holds cells in document order. Position is always derived from the
//! order here; nothing else stores it.

use crate::cell::{Cell, CellMetadata};
use crate::error::NodebookError;
use crate::types::{CellKey, CellKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// Ordered collection of cells
#[derive(Debug, Clone, Default)]
pub struct Notebook {
    cells: Vec<Cell>,
    /// Per-cell nbformat fields we do not interpret (outputs, execution_count, ...)
    cell_extras: HashMap<CellKey, Map<String, Value>>,
    /// Top-level nbformat fields we do not interpret
    document_extras: Map<String, Value>,
}

/// nbformat cell as stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct IpynbCell {
    cell_type: CellKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default)]
    metadata: CellMetadata,
    source: IpynbSource,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum IpynbSource {
    Text(String),
    Lines(Vec<String>),
}

impl IpynbSource {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Lines(lines) => lines.concat(),
        }
    }
}

impl Notebook {
    /// Empty notebook
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notebook from cells in order
    #[must_use]
    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            ..Self::default()
        }
    }

    /// Parse an nbformat v4 document
    ///
    /// # Errors
    /// Returns `NodebookError::InvalidNotebook` when `cells` is missing or
    /// not an array, and `NodebookError::Serialization` for malformed cells.
    pub fn from_ipynb_str(text: &str) -> Result<Self, NodebookError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(mut document) = value else {
            return Err(NodebookError::InvalidNotebook(
                "top level is not an object".to_string(),
            ));
        };
        let raw_cells = match document.remove("cells") {
            Some(Value::Array(cells)) => cells,
            Some(_) => {
                return Err(NodebookError::InvalidNotebook(
                    "`cells` is not an array".to_string(),
                ))
            }
            None => return Err(NodebookError::InvalidNotebook("missing `cells`".to_string())),
        };

        let mut notebook = Self {
            document_extras: document,
            ..Self::default()
        };
        for raw in raw_cells {
            let parsed: IpynbCell = serde_json::from_value(raw)?;
            let key = parsed.id.map_or_else(CellKey::generate, CellKey::new);
            if !parsed.rest.is_empty() {
                notebook.cell_extras.insert(key.clone(), parsed.rest);
            }
            notebook.cells.push(Cell {
                key,
                kind: parsed.cell_type,
                source: parsed.source.into_text(),
                metadata: parsed.metadata,
            });
        }
        tracing::debug!("Loaded notebook with {} cells", notebook.cells.len());
        Ok(notebook)
    }

    /// Render back to an nbformat v4 value
    ///
    /// # Errors
    /// Propagates serialization failures of cell metadata.
    pub fn to_ipynb_value(&self) -> Result<Value, NodebookError> {
        let mut cells = Vec::with_capacity(self.cells.len());
        for cell in &self.cells {
            let rest = self.cell_extras.get(&cell.key).cloned().unwrap_or_default();
            let raw = IpynbCell {
                cell_type: cell.kind,
                id: Some(cell.key.as_str().to_string()),
                metadata: cell.metadata.clone(),
                source: IpynbSource::Text(cell.source.clone()),
                rest,
            };
            cells.push(serde_json::to_value(raw)?);
        }
        let mut document = self.document_extras.clone();
        document.insert("cells".to_string(), Value::Array(cells));
        Ok(Value::Object(document))
    }

    /// Read and parse an `.ipynb` file
    ///
    /// # Errors
    /// `NodebookError::Io` if unreadable, otherwise as [`Notebook::from_ipynb_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NodebookError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!("Loading notebook from {}", path.as_ref().display());
        Self::from_ipynb_str(&text)
    }

    /// Write the document as pretty-printed nbformat JSON
    ///
    /// # Errors
    /// Serialization or filesystem failures.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), NodebookError> {
        let text = serde_json::to_string_pretty(&self.to_ipynb_value()?)?;
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    /// All cells in document order
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Mutable access to all cells
    #[inline]
    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Number of cells
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the notebook has no cells
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Current position of a cell
    #[must_use]
    pub fn find_cell_index(&self, key: &CellKey) -> Option<usize> {
        self.cells.iter().position(|cell| &cell.key == key)
    }

    /// Cell at a position
    #[inline]
    #[must_use]
    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Mutable cell at a position
    #[inline]
    pub fn cell_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.cells.get_mut(index)
    }

    /// Cell by key
    #[must_use]
    pub fn get(&self, key: &CellKey) -> Option<&Cell> {
        self.cells.iter().find(|cell| &cell.key == key)
    }

    /// First cell matching a predicate
    pub fn find<P>(&self, predicate: P) -> Option<&Cell>
    where
        P: FnMut(&&Cell) -> bool,
    {
        self.cells.iter().find(predicate)
    }

    /// Append a cell, returning its key
    pub fn push(&mut self, cell: Cell) -> CellKey {
        let key = cell.key.clone();
        self.cells.push(cell);
        key
    }

    /// Insert a cell at a position
    ///
    /// # Errors
    /// `IndexOutOfRange` when `index > len`.
    pub fn insert(&mut self, index: usize, cell: Cell) -> Result<CellKey, NodebookError> {
        if index > self.cells.len() {
            return Err(NodebookError::IndexOutOfRange {
                index,
                len: self.cells.len(),
            });
        }
        let key = cell.key.clone();
        self.cells.insert(index, cell);
        Ok(key)
    }

    /// Move a cell to a new position; identity and metadata travel with it
    ///
    /// # Errors
    /// `UnknownCell` if the key is absent, `IndexOutOfRange` if `to >= len`.
    pub fn move_cell(&mut self, key: &CellKey, to: usize) -> Result<(), NodebookError> {
        let from = self
            .find_cell_index(key)
            .ok_or_else(|| NodebookError::UnknownCell(key.clone()))?;
        if to >= self.cells.len() {
            return Err(NodebookError::IndexOutOfRange {
                index: to,
                len: self.cells.len(),
            });
        }
        let cell = self.cells.remove(from);
        self.cells.insert(to, cell);
        Ok(())
    }

    /// Remove a cell
    pub fn remove(&mut self, key: &CellKey) -> Option<Cell> {
        let index = self.find_cell_index(key)?;
        self.cell_extras.remove(key);
        Some(self.cells.remove(index))
    }
}
