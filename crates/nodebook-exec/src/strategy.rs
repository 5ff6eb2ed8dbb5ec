//! Execution strategies
//!
//! A strategy turns a cell into the text that is dispatched and decides
//! what happens to the cell's graph membership. [`Verbatim`] is the plain
//! behaviour; [`Lineage`] wraps another strategy and adds the
//! `%%execute_cell` protocol on top of it.

use nodebook_core::{
    rewrite_source, Cell, Directive, ExecuteCellHeader, IdentityManager, LineageIndex, NodeName,
    Notebook,
};
use std::fmt;

/// Everything a strategy may look at for one run
pub struct StrategyContext<'a> {
    /// Document at dispatch time
    pub notebook: &'a Notebook,
    /// Identity and membership records
    pub identities: &'a IdentityManager,
    /// Current position of the executing cell
    pub position: usize,
    /// Identity of the executing cell (already assigned)
    pub node: &'a NodeName,
}

impl StrategyContext<'_> {
    /// The executing cell
    ///
    /// # Panics
    /// If `position` is outside the notebook, which the session never allows.
    #[must_use]
    pub fn cell(&self) -> &Cell {
        &self.notebook.cells()[self.position]
    }

    /// Source text of the executing cell
    #[must_use]
    pub fn source(&self) -> &str {
        &self.cell().source
    }
}

/// Result of preparing a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedExecution {
    /// Text handed to the kernel
    pub code: String,
    /// New membership flag; `None` leaves it unchanged
    pub participates: Option<bool>,
    /// Lineage header, when one was injected
    pub header: Option<ExecuteCellHeader>,
}

/// How a cell becomes a kernel request
pub trait ExecutionStrategy: Send + Sync + fmt::Debug {
    /// Build the request for the cell in `ctx`
    fn prepare(&self, ctx: &StrategyContext<'_>) -> PreparedExecution;

    /// Strategy name (for logs)
    fn name(&self) -> &'static str;
}

/// Send the source unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl ExecutionStrategy for Verbatim {
    fn prepare(&self, ctx: &StrategyContext<'_>) -> PreparedExecution {
        PreparedExecution {
            code: ctx.source().to_string(),
            participates: None,
            header: None,
        }
    }

    fn name(&self) -> &'static str {
        "verbatim"
    }
}

/// Lineage-aware decorator around an inner strategy
///
/// Opted-out runs (`#pragma nodebook off`) go to the inner strategy and
/// leave the graph; everything else is rewritten with the resolved parent
/// and joins it.
#[derive(Debug, Clone, Default)]
pub struct Lineage<S = Verbatim> {
    inner: S,
}

impl<S: ExecutionStrategy> Lineage<S> {
    /// Wrap an inner strategy
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// The wrapped strategy
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: ExecutionStrategy> ExecutionStrategy for Lineage<S> {
    fn prepare(&self, ctx: &StrategyContext<'_>) -> PreparedExecution {
        if Directive::opts_out(ctx.source()) {
            tracing::info!("Running {} outside nodebook", ctx.node);
            let mut prepared = self.inner.prepare(ctx);
            prepared.participates = Some(false);
            return prepared;
        }

        let index = LineageIndex::build(ctx.notebook, ctx.identities);
        let parent = index.parent_of(ctx.position).cloned();
        tracing::debug!(
            "Resolved parent of {}: {}",
            ctx.node,
            parent.as_ref().map_or("<root>", NodeName::as_str)
        );

        let header = ExecuteCellHeader::new(ctx.node.clone(), parent);
        PreparedExecution {
            code: rewrite_source(ctx.source(), &header),
            participates: Some(true),
            header: Some(header),
        }
    }

    fn name(&self) -> &'static str {
        "lineage"
    }
}
