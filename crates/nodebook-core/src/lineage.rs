//! Lineage index: nearest preceding participating cell
//!
//! A snapshot of document order keyed by position. The parent of a cell
//! is the closest earlier code cell that currently participates; cells at
//! or after the executing position are never considered.

use crate::identity::IdentityManager;
use crate::notebook::Notebook;
use crate::types::{CellKind, NodeName};
use std::collections::BTreeMap;

/// State of one position at snapshot time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSlot {
    /// Cell type
    pub kind: CellKind,
    /// Identity, if one was assigned
    pub identity: Option<NodeName>,
    /// Graph membership
    pub participates: bool,
}

impl NodeSlot {
    fn is_candidate(&self) -> bool {
        self.kind.is_code() && self.participates && self.identity.is_some()
    }
}

/// Position-ordered view of graph membership
#[derive(Debug, Clone, Default)]
pub struct LineageIndex {
    slots: BTreeMap<usize, NodeSlot>,
}

impl LineageIndex {
    /// Empty index
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the notebook as the identity manager currently sees it
    #[must_use]
    pub fn build(notebook: &Notebook, identities: &IdentityManager) -> Self {
        let slots = notebook
            .cells()
            .iter()
            .enumerate()
            .map(|(position, cell)| {
                let slot = NodeSlot {
                    kind: cell.kind,
                    identity: identities.identity(&cell.key).cloned(),
                    participates: identities.participates(&cell.key),
                };
                (position, slot)
            })
            .collect();
        Self { slots }
    }

    /// Record (or overwrite) the slot at a position
    pub fn insert(&mut self, position: usize, slot: NodeSlot) {
        self.slots.insert(position, slot);
    }

    /// Number of positions in the snapshot
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the snapshot is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Closest position before `position` holding a participating code cell
    #[must_use]
    pub fn nearest_participating_before(&self, position: usize) -> Option<(usize, &NodeName)> {
        self.slots
            .range(..position)
            .rev()
            .find(|(_, slot)| slot.is_candidate())
            .and_then(|(pos, slot)| slot.identity.as_ref().map(|id| (*pos, id)))
    }

    /// Parent identity for the cell at `position`; `None` makes it a root
    #[must_use]
    pub fn parent_of(&self, position: usize) -> Option<&NodeName> {
        self.nearest_participating_before(position).map(|(_, id)| id)
    }
}
