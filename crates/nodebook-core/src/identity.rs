//! Identity Manager
//!
//! Owns the typed per-cell node record (`identity`, `participates`) and
//! mirrors it into each cell's persisted metadata. The document layer only
//! ever refers to a cell by its opaque [`CellKey`].

use crate::cell::Cell;
use crate::notebook::Notebook;
use crate::types::{CellKey, NodeName};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Node record for one cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    /// Stable node identity, assigned once
    pub identity: NodeName,
    /// Whether the cell's last run followed the lineage protocol
    pub participates: bool,
}

/// Shared identity -> cell lookup
///
/// Cloned into result callbacks so a payload addressed to a node can be
/// routed back to the cell currently carrying that identity.
#[derive(Debug, Clone, Default)]
pub struct NodeDirectory {
    inner: Arc<RwLock<HashMap<NodeName, CellKey>>>,
}

impl NodeDirectory {
    /// Cell carrying the given identity
    #[must_use]
    pub fn lookup(&self, node: &NodeName) -> Option<CellKey> {
        self.inner.read().get(node).cloned()
    }

    /// Number of known identities
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the directory is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    fn bind(&self, node: NodeName, key: CellKey) {
        self.inner.write().insert(node, key);
    }

    fn unbind(&self, node: &NodeName, key: &CellKey) {
        let mut inner = self.inner.write();
        if inner.get(node) == Some(key) {
            inner.remove(node);
        }
    }
}

/// Assigns and tracks stable node identities
#[derive(Debug, Default)]
pub struct IdentityManager {
    records: HashMap<CellKey, NodeRecord>,
    directory: NodeDirectory,
}

impl IdentityManager {
    /// Empty manager
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load-time pass over every code cell.
    ///
    /// Cells with a persisted `node_name` adopt it; all others take their
    /// current key as identity and start outside the graph. Runtime state
    /// behind the identities is not recovered.
    pub fn initialize(&mut self, notebook: &mut Notebook) {
        let mut adopted = 0usize;
        let mut assigned = 0usize;
        for cell in notebook.cells_mut().iter_mut().filter(|c| c.kind.is_code()) {
            if let Some(name) = cell.metadata.node_name.clone() {
                let participates = cell.metadata.node_exists.unwrap_or(false);
                self.bind(cell, name, participates);
                adopted += 1;
            } else {
                let name = NodeName::from(&cell.key);
                cell.metadata.node_name = Some(name.clone());
                cell.metadata.node_exists = Some(false);
                self.bind(cell, name, false);
                assigned += 1;
            }
        }
        tracing::info!("Initialized identities: {} adopted, {} assigned", adopted, assigned);
    }

    /// Identity for a cell, assigning one on first use.
    ///
    /// A cell unknown to the manager gets its own key as identity, even if
    /// it carries persisted metadata (a pasted copy does). Only
    /// [`IdentityManager::initialize`] adopts persisted names.
    pub fn ensure_identity(&mut self, cell: &mut Cell) -> NodeName {
        if let Some(record) = self.records.get(&cell.key) {
            return record.identity.clone();
        }
        let name = NodeName::from(&cell.key);
        if cell.metadata.node_name.as_ref().is_some_and(|old| old != &name) {
            tracing::debug!("Cell {} carried a foreign identity; reassigning", cell.key);
        }
        cell.metadata.node_name = Some(name.clone());
        cell.metadata.node_exists = Some(false);
        tracing::debug!("Assigned identity {} to cell {}", name, cell.key);
        self.bind(cell, name.clone(), false);
        name
    }

    /// Record whether the cell's latest run joined the graph and persist it
    pub fn mark_participating(&mut self, cell: &mut Cell, participates: bool) {
        let identity = self.ensure_identity(cell);
        if let Some(record) = self.records.get_mut(&cell.key) {
            record.participates = participates;
        }
        cell.metadata.node_name = Some(identity);
        cell.metadata.node_exists = Some(participates);
    }

    /// Whether the cell currently participates; unknown cells do not
    #[must_use]
    pub fn participates(&self, key: &CellKey) -> bool {
        self.records.get(key).is_some_and(|r| r.participates)
    }

    /// Identity of a cell, if one was assigned
    #[must_use]
    pub fn identity(&self, key: &CellKey) -> Option<&NodeName> {
        self.records.get(key).map(|r| &r.identity)
    }

    /// Full record for a cell
    #[must_use]
    pub fn record(&self, key: &CellKey) -> Option<&NodeRecord> {
        self.records.get(key)
    }

    /// Drop the record of a removed cell and its directory route
    pub fn forget(&mut self, key: &CellKey) -> Option<NodeRecord> {
        let record = self.records.remove(key)?;
        self.directory.unbind(&record.identity, key);
        Some(record)
    }

    /// Shared identity lookup handle
    #[must_use]
    pub fn directory(&self) -> NodeDirectory {
        self.directory.clone()
    }

    fn bind(&mut self, cell: &Cell, identity: NodeName, participates: bool) {
        self.directory.bind(identity.clone(), cell.key.clone());
        self.records.insert(
            cell.key.clone(),
            NodeRecord {
                identity,
                participates,
            },
        );
    }
}
