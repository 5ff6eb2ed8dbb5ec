//! Correlation of dispatched requests with their cells
//!
//! Tracks at most one pending message per cell. Each dispatch gets a
//! one-shot completion keyed by `(kernel, msg_id)` that resolves exactly
//! once; superseding a cell drops its entry so a late result for the old
//! message finds nothing.

use nodebook_core::{CellKey, KernelId, MsgId, NodeName};
use std::collections::HashMap;
use tokio::sync::oneshot;

/// Delivered when a dispatched request finishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Kernel that ran the request
    pub kernel: KernelId,
    /// Message that finished
    pub msg_id: MsgId,
    /// Node identity of the cell
    pub node: NodeName,
}

/// Handle returned for a dispatched execution
#[derive(Debug)]
pub struct DispatchTicket {
    /// Backend operation id
    pub msg_id: MsgId,
    /// Node identity of the executed cell
    pub node: NodeName,
    /// Resolves on finish; errors if the run was superseded
    pub completion: oneshot::Receiver<Completion>,
}

impl DispatchTicket {
    /// Wait for completion; `None` if superseded or the session went away
    pub async fn finished(self) -> Option<Completion> {
        self.completion.await.ok()
    }
}

#[derive(Debug)]
struct Waiter {
    cell: CellKey,
    node: NodeName,
    done: oneshot::Sender<Completion>,
}

/// A resolved correlation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Cell that issued the request
    pub cell: CellKey,
    /// Completion sent to the ticket
    pub completion: Completion,
}

/// Pending-operation bookkeeping for a session
#[derive(Debug, Default)]
pub struct CorrelationTable {
    pending: HashMap<CellKey, MsgId>,
    msg_cells: HashMap<MsgId, CellKey>,
    waiters: HashMap<(KernelId, MsgId), Waiter>,
}

impl CorrelationTable {
    /// Empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending operation of a cell
    #[must_use]
    pub fn pending(&self, cell: &CellKey) -> Option<&MsgId> {
        self.pending.get(cell)
    }

    /// Cell that issued a message
    #[must_use]
    pub fn cell_for(&self, msg_id: &MsgId) -> Option<&CellKey> {
        self.msg_cells.get(msg_id)
    }

    /// Number of unresolved completions
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.waiters.len()
    }

    /// Forget the cell's pending operation; returns it so the caller can
    /// clear kernel-side callbacks
    pub fn supersede(&mut self, cell: &CellKey) -> Option<MsgId> {
        let old = self.pending.remove(cell)?;
        self.msg_cells.remove(&old);
        self.waiters.retain(|(_, msg), _| msg != &old);
        Some(old)
    }

    /// Abandon every run tracked against `kernel`.
    ///
    /// Returns the dropped messages with their cells; their tickets resolve
    /// to `None` and later finishes for them find nothing.
    pub fn abandon_kernel(&mut self, kernel: KernelId) -> Vec<(MsgId, CellKey)> {
        let keys: Vec<_> = self
            .waiters
            .keys()
            .filter(|(owner, _)| *owner == kernel)
            .cloned()
            .collect();
        let mut dropped = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(waiter) = self.waiters.remove(&key) else {
                continue;
            };
            let (_, msg_id) = key;
            if self.pending.get(&waiter.cell) == Some(&msg_id) {
                self.pending.remove(&waiter.cell);
            }
            self.msg_cells.remove(&msg_id);
            dropped.push((msg_id, waiter.cell));
        }
        dropped
    }

    /// Track a freshly dispatched message and open its completion
    pub fn track(
        &mut self,
        kernel: KernelId,
        msg_id: MsgId,
        cell: CellKey,
        node: NodeName,
    ) -> oneshot::Receiver<Completion> {
        debug_assert!(!self.pending.contains_key(&cell), "cell must be superseded first");
        let (done, rx) = oneshot::channel();
        self.pending.insert(cell.clone(), msg_id.clone());
        self.msg_cells.insert(msg_id.clone(), cell.clone());
        self.waiters.insert((kernel, msg_id), Waiter { cell, node, done });
        rx
    }

    /// Resolve `(kernel, msg_id)` once; later calls find nothing
    pub fn resolve(&mut self, kernel: KernelId, msg_id: &MsgId) -> Option<Resolved> {
        let waiter = self.waiters.remove(&(kernel, msg_id.clone()))?;
        if self.pending.get(&waiter.cell) == Some(msg_id) {
            self.pending.remove(&waiter.cell);
        }
        self.msg_cells.remove(msg_id);

        let completion = Completion {
            kernel,
            msg_id: msg_id.clone(),
            node: waiter.node,
        };
        // Receiver may be gone; the notification still counts.
        let _ = waiter.done.send(completion.clone());
        Some(Resolved {
            cell: waiter.cell,
            completion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (KernelId, CellKey, NodeName) {
        (KernelId::new(), CellKey::new("c1"), NodeName::new("n1"))
    }

    #[test]
    fn resolves_exactly_once() {
        let (kernel, cell, node) = ids();
        let mut table = CorrelationTable::new();
        let msg = MsgId::new("m1");
        let mut rx = table.track(kernel, msg.clone(), cell.clone(), node.clone());

        assert_eq!(table.pending(&cell), Some(&msg));
        assert_eq!(table.cell_for(&msg), Some(&cell));

        let resolved = table.resolve(kernel, &msg).unwrap();
        assert_eq!(resolved.cell, cell);
        assert_eq!(rx.try_recv().unwrap().node, node);

        assert!(table.resolve(kernel, &msg).is_none());
        assert!(table.pending(&cell).is_none());
        assert!(table.cell_for(&msg).is_none());
        assert_eq!(table.waiting(), 0);
    }

    #[test]
    fn superseded_message_never_resolves() {
        let (kernel, cell, node) = ids();
        let mut table = CorrelationTable::new();
        let first = MsgId::new("m1");
        let mut old_rx = table.track(kernel, first.clone(), cell.clone(), node.clone());

        assert_eq!(table.supersede(&cell), Some(first.clone()));
        let second = MsgId::new("m2");
        let mut new_rx = table.track(kernel, second.clone(), cell.clone(), node);

        assert!(table.resolve(kernel, &first).is_none());
        assert!(old_rx.try_recv().is_err());

        assert!(table.resolve(kernel, &second).is_some());
        assert!(new_rx.try_recv().is_ok());
    }

    #[test]
    fn key_includes_kernel() {
        let (kernel, cell, node) = ids();
        let mut table = CorrelationTable::new();
        let msg = MsgId::new("m1");
        let _rx = table.track(kernel, msg.clone(), cell, node);

        assert!(table.resolve(KernelId::new(), &msg).is_none());
        assert!(table.resolve(kernel, &msg).is_some());
    }

    #[test]
    fn abandon_kernel_drops_only_its_runs() {
        let (kernel, cell, node) = ids();
        let other = KernelId::new();
        let mut table = CorrelationTable::new();
        let mut old_rx = table.track(kernel, MsgId::new("m1"), cell.clone(), node.clone());
        let _keep = table.track(other, MsgId::new("m2"), CellKey::new("c2"), node);

        let dropped = table.abandon_kernel(kernel);
        assert_eq!(dropped, vec![(MsgId::new("m1"), cell.clone())]);
        assert!(table.pending(&cell).is_none());
        assert!(table.cell_for(&MsgId::new("m1")).is_none());
        assert!(old_rx.try_recv().is_err());
        assert_eq!(table.waiting(), 1);
        assert!(table.resolve(kernel, &MsgId::new("m1")).is_none());
    }

    #[test]
    fn supersede_without_pending_is_noop() {
        let mut table = CorrelationTable::new();
        assert!(table.supersede(&CellKey::new("c")).is_none());
    }

    #[tokio::test]
    async fn ticket_awaits_completion() {
        let (kernel, cell, node) = ids();
        let mut table = CorrelationTable::new();
        let msg = MsgId::new("m1");
        let ticket = DispatchTicket {
            msg_id: msg.clone(),
            node: node.clone(),
            completion: table.track(kernel, msg.clone(), cell, node),
        };
        table.resolve(kernel, &msg);
        let done = ticket.finished().await.unwrap();
        assert_eq!(done.msg_id, msg);
    }
}
