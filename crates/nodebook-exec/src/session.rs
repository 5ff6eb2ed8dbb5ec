//! Notebook session: the intercepted execute path
//!
//! A session owns the document, the identity records, the correlation
//! table and the observer hub, and talks to a kernel and a view. All work
//! happens on the caller's thread; `execute` returns as soon as the
//! request is submitted and results are observed through callbacks and
//! [`Session::handle_finished`].

use crate::backend::{Callbacks, ExecuteOptions, Kernel};
use crate::correlation::{CorrelationTable, DispatchTicket};
use crate::events::{EventHub, ExecutionEvent};
use crate::strategy::{ExecutionStrategy, Lineage, StrategyContext};
use crate::view::{prompt_callback, CellView};
use nodebook_core::{
    Cell, CellKey, IdentityManager, InputPrompt, KernelId, MsgId, NodeName, Notebook, NodebookConfig,
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// What happened to an execute request
#[derive(Debug)]
pub enum ExecuteOutcome {
    /// No kernel attached; nothing was done
    NoKernel,
    /// Key not in the document
    UnknownCell,
    /// Not a code cell
    NotCode,
    /// Blank source; prompt reset, nothing dispatched
    Empty,
    /// Request submitted
    Dispatched(DispatchTicket),
}

impl ExecuteOutcome {
    /// Ticket for a dispatched request
    #[must_use]
    pub fn ticket(self) -> Option<DispatchTicket> {
        match self {
            Self::Dispatched(ticket) => Some(ticket),
            _ => None,
        }
    }

    /// Whether a request reached the kernel
    #[must_use]
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched(_))
    }
}

/// A notebook bound to a view, an optional kernel and a strategy
pub struct Session<S = Lineage> {
    notebook: Notebook,
    identities: IdentityManager,
    kernel: Option<Arc<dyn Kernel>>,
    view: Arc<dyn CellView>,
    strategy: S,
    correlation: CorrelationTable,
    events: EventHub,
    config: NodebookConfig,
}

impl Session<Lineage> {
    /// Lineage-aware session over `notebook`
    #[must_use]
    pub fn new(notebook: Notebook, view: Arc<dyn CellView>, config: NodebookConfig) -> Self {
        Self::with_strategy(notebook, view, config, Lineage::default())
    }
}

impl<S: ExecutionStrategy> Session<S> {
    /// Session with an explicit strategy; identities are initialized here
    #[must_use]
    pub fn with_strategy(
        mut notebook: Notebook,
        view: Arc<dyn CellView>,
        config: NodebookConfig,
        strategy: S,
    ) -> Self {
        let mut identities = IdentityManager::new();
        identities.initialize(&mut notebook);
        tracing::info!("Session ready with {} strategy", strategy.name());
        Self {
            notebook,
            identities,
            kernel: None,
            view,
            strategy,
            correlation: CorrelationTable::new(),
            events: EventHub::new(),
            config,
        }
    }

    /// Connect a kernel, detaching any previous one first
    pub fn attach_kernel(&mut self, kernel: Arc<dyn Kernel>) {
        self.detach_kernel();
        tracing::info!("Kernel {} attached", kernel.id());
        self.kernel = Some(kernel);
    }

    /// Disconnect the kernel.
    ///
    /// Runs still in flight on it are abandoned: their callbacks are
    /// cleared on the outgoing kernel, so nothing it sends later reaches
    /// the view, and no finished notification is emitted for them.
    pub fn detach_kernel(&mut self) -> Option<Arc<dyn Kernel>> {
        let kernel = self.kernel.take()?;
        for (msg_id, cell) in self.correlation.abandon_kernel(kernel.id()) {
            tracing::debug!("Abandoning {} for cell {}", msg_id, cell);
            kernel.clear_callbacks_for_msg(&msg_id);
            self.view.set_running(&cell, false);
        }
        tracing::info!("Kernel {} detached", kernel.id());
        Some(kernel)
    }

    /// Receive started / finished notifications
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ExecutionEvent> {
        self.events.subscribe()
    }

    /// The document
    #[must_use]
    pub fn notebook(&self) -> &Notebook {
        &self.notebook
    }

    /// Mutable document (editing, moving, inserting cells)
    pub fn notebook_mut(&mut self) -> &mut Notebook {
        &mut self.notebook
    }

    /// Remove a cell from the document.
    ///
    /// Its pending run is superseded and its identity route dropped, so
    /// prompt payloads addressed to it are no longer delivered.
    pub fn remove_cell(&mut self, cell: &CellKey) -> Option<Cell> {
        let removed = self.notebook.remove(cell)?;
        if let Some(old) = self.correlation.supersede(cell) {
            if let Some(kernel) = &self.kernel {
                kernel.clear_callbacks_for_msg(&old);
            }
        }
        if let Some(record) = self.identities.forget(cell) {
            tracing::debug!("Removed cell {} ({})", cell, record.identity);
        }
        Some(removed)
    }

    /// Identity records
    #[must_use]
    pub fn identities(&self) -> &IdentityManager {
        &self.identities
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &NodebookConfig {
        &self.config
    }

    /// In-flight message of a cell
    #[must_use]
    pub fn pending_operation(&self, cell: &CellKey) -> Option<&MsgId> {
        self.correlation.pending(cell)
    }

    /// Cell that issued a message
    #[must_use]
    pub fn cell_for_msg(&self, msg_id: &MsgId) -> Option<&CellKey> {
        self.correlation.cell_for(msg_id)
    }

    /// Execute with the configured `stop_on_error`
    pub fn execute_default(&mut self, cell: &CellKey) -> ExecuteOutcome {
        let stop_on_error = self.config.stop_on_error;
        self.execute(cell, stop_on_error)
    }

    /// Run a cell through the strategy and dispatch it.
    ///
    /// Never fails: environment problems are logged and reported through
    /// the outcome.
    pub fn execute(&mut self, cell: &CellKey, stop_on_error: bool) -> ExecuteOutcome {
        let Some(kernel) = self.kernel.clone() else {
            tracing::warn!("Can't execute cell {} since kernel is not set", cell);
            return ExecuteOutcome::NoKernel;
        };
        let Some(position) = self.notebook.find_cell_index(cell) else {
            tracing::warn!("Can't execute unknown cell {}", cell);
            return ExecuteOutcome::UnknownCell;
        };
        let Some(current) = self.notebook.cell(position) else {
            return ExecuteOutcome::UnknownCell;
        };
        if !current.kind.is_code() {
            tracing::debug!("Skipping non-code cell {}", cell);
            return ExecuteOutcome::NotCode;
        }
        if current.is_blank() {
            self.show_prompt(cell, InputPrompt::Unset);
            return ExecuteOutcome::Empty;
        }

        self.view.clear_output(cell);
        if let Some(old) = self.correlation.supersede(cell) {
            tracing::debug!("Superseding {} for cell {}", old, cell);
            kernel.clear_callbacks_for_msg(&old);
        }
        self.show_prompt(cell, InputPrompt::Running);
        self.view.set_running(cell, true);

        let mut callbacks = Callbacks::new();
        callbacks.set_payload(
            self.config.prompt_slot.clone(),
            prompt_callback(self.view.clone(), self.identities.directory()),
        );

        let node = match self.notebook.cell_mut(position) {
            Some(target) => self.identities.ensure_identity(target),
            None => return ExecuteOutcome::UnknownCell,
        };
        let prepared = self.strategy.prepare(&StrategyContext {
            notebook: &self.notebook,
            identities: &self.identities,
            position,
            node: &node,
        });

        let options = ExecuteOptions {
            silent: self.config.silent,
            store_history: self.config.store_history,
            stop_on_error,
        };
        let msg_id = kernel.execute(&prepared.code, callbacks, options);
        tracing::info!("Dispatched {} as {}", node, msg_id);

        if let (Some(participates), Some(target)) =
            (prepared.participates, self.notebook.cell_mut(position))
        {
            self.identities.mark_participating(target, participates);
        }

        let completion = self
            .correlation
            .track(kernel.id(), msg_id.clone(), cell.clone(), node.clone());
        self.events.emit(&ExecutionEvent::Started {
            node: node.clone(),
            cell: cell.clone(),
        });

        ExecuteOutcome::Dispatched(DispatchTicket {
            msg_id,
            node,
            completion,
        })
    }

    /// Kernel reported that a request finished.
    ///
    /// Emits one finished notification for a tracked `(kernel, msg_id)` and
    /// forgets it; superseded or unknown messages are ignored.
    pub fn handle_finished(&mut self, kernel: KernelId, msg_id: &MsgId) -> bool {
        let Some(resolved) = self.correlation.resolve(kernel, msg_id) else {
            tracing::debug!("Ignoring finish for untracked message {}", msg_id);
            return false;
        };
        self.view.set_running(&resolved.cell, false);
        self.events.emit(&ExecutionEvent::Finished {
            node: resolved.completion.node,
            cell: resolved.cell,
        });
        true
    }

    /// Identity of a cell, if assigned
    #[must_use]
    pub fn identity(&self, cell: &CellKey) -> Option<&NodeName> {
        self.identities.identity(cell)
    }

    fn show_prompt(&self, cell: &CellKey, prompt: InputPrompt) {
        if let Err(e) = self.view.set_input_prompt(cell, prompt) {
            tracing::warn!("Failed to set prompt for {}: {}", cell, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingKernel;
    use crate::view::TracingView;

    fn session(sources: &[&str]) -> (Session, Vec<CellKey>, Arc<RecordingKernel>) {
        let mut notebook = Notebook::new();
        let keys = sources.iter().map(|s| notebook.push(Cell::code(*s))).collect();
        let mut session = Session::new(notebook, Arc::new(TracingView), NodebookConfig::new());
        let kernel = Arc::new(RecordingKernel::new());
        session.attach_kernel(kernel.clone());
        (session, keys, kernel)
    }

    #[test]
    fn no_kernel_is_a_noop() {
        let mut notebook = Notebook::new();
        let key = notebook.push(Cell::code("x = 1"));
        let mut session = Session::new(notebook, Arc::new(TracingView), NodebookConfig::new());

        assert!(matches!(session.execute_default(&key), ExecuteOutcome::NoKernel));
        assert!(!session.identities().participates(&key));
    }

    #[test]
    fn blank_cell_is_not_dispatched() {
        let (mut session, keys, kernel) = session(&["   \n"]);
        assert!(matches!(session.execute_default(&keys[0]), ExecuteOutcome::Empty));
        assert!(kernel.requests().is_empty());
    }

    #[test]
    fn markdown_cells_do_not_run() {
        let (mut session, _, kernel) = session(&[]);
        let key = session.notebook_mut().push(Cell::markdown("# hi"));
        assert!(matches!(session.execute_default(&key), ExecuteOutcome::NotCode));
        assert!(kernel.requests().is_empty());
    }

    #[test]
    fn dispatch_marks_participation_and_tracks_message() {
        let (mut session, keys, kernel) = session(&["a = 1"]);
        let ticket = session.execute(&keys[0], false).ticket().unwrap();

        assert!(session.identities().participates(&keys[0]));
        assert_eq!(session.pending_operation(&keys[0]), Some(&ticket.msg_id));
        assert_eq!(session.cell_for_msg(&ticket.msg_id), Some(&keys[0]));

        let request = kernel.last_request().unwrap();
        assert!(!request.options.stop_on_error);
        assert!(request.options.store_history);
        assert!(!request.options.silent);
    }

    #[test]
    fn finished_clears_pending() {
        let (mut session, keys, kernel) = session(&["a = 1"]);
        let ticket = session.execute_default(&keys[0]).ticket().unwrap();

        assert!(session.handle_finished(kernel.id(), &ticket.msg_id));
        assert!(session.pending_operation(&keys[0]).is_none());
        assert!(!session.handle_finished(kernel.id(), &ticket.msg_id));
    }

    #[test]
    fn detach_abandons_in_flight_runs() {
        let (mut session, keys, kernel) = session(&["a = 1"]);
        let ticket = session.execute_default(&keys[0]).ticket().unwrap();

        let detached = session.detach_kernel().unwrap();
        assert_eq!(detached.id(), kernel.id());
        assert!(!kernel.has_callbacks(&ticket.msg_id));
        assert!(session.pending_operation(&keys[0]).is_none());
        assert!(!session.handle_finished(kernel.id(), &ticket.msg_id));
        assert!(session.detach_kernel().is_none());
    }

    #[test]
    fn remove_cell_forgets_identity_and_run() {
        let (mut session, keys, kernel) = session(&["a = 1", "b = a"]);
        let ticket = session.execute_default(&keys[0]).ticket().unwrap();
        let node = ticket.node.clone();

        let removed = session.remove_cell(&keys[0]).unwrap();
        assert_eq!(removed.key, keys[0]);
        assert!(session.identity(&keys[0]).is_none());
        assert!(session.identities().directory().lookup(&node).is_none());
        assert!(!kernel.has_callbacks(&ticket.msg_id));
        assert!(session.remove_cell(&keys[0]).is_none());

        session.execute_default(&keys[1]);
        let code = kernel.last_request().unwrap().code;
        assert!(code.starts_with(&format!("%%execute_cell {} \n", keys[1])));
    }

    #[test]
    fn verbatim_session_sends_raw_source() {
        let mut notebook = Notebook::new();
        let key = notebook.push(Cell::code("a = 1"));
        let mut session = Session::with_strategy(
            notebook,
            Arc::new(TracingView),
            NodebookConfig::new(),
            crate::strategy::Verbatim,
        );
        let kernel = Arc::new(RecordingKernel::new());
        session.attach_kernel(kernel.clone());

        assert!(session.execute_default(&key).is_dispatched());
        assert_eq!(kernel.last_request().unwrap().code, "a = 1");
        assert!(!session.identities().participates(&key));
        assert!(session.identity(&key).is_some());
    }
}
