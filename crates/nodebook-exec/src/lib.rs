//! Nodebook Execution Interceptor
//!
//! Replaces plain "run this cell" with a lineage-aware variant:
//! 1. Resolve the cell's stable identity
//! 2. Find the nearest preceding participating cell as parent
//! 3. Rewrite the source with an `%%execute_cell <self> <parent>` header
//! 4. Dispatch to the kernel and correlate the result by message id
//!
//! The rewriting is an [`ExecutionStrategy`] chosen at construction:
//! [`Verbatim`] sends raw source, [`Lineage`] decorates an inner strategy.
//!
//! # Example
//!
//! ```rust,ignore
//! use nodebook_exec::{RecordingKernel, Session, TracingView};
//! use nodebook_core::{Cell, Notebook, NodebookConfig};
//! use std::sync::Arc;
//!
//! let mut notebook = Notebook::new();
//! let key = notebook.push(Cell::code("x = 1"));
//!
//! let mut session = Session::new(notebook, Arc::new(TracingView), NodebookConfig::new());
//! let kernel = Arc::new(RecordingKernel::new());
//! session.attach_kernel(kernel.clone());
//!
//! let outcome = session.execute_default(&key);
//! ```

#![warn(unreachable_pub)]

pub mod backend;
pub mod correlation;
pub mod error;
pub mod events;
pub mod plan;
pub mod recording;
pub mod session;
pub mod strategy;
pub mod view;

// Re-exports for convenience
pub use backend::{Callbacks, ExecuteOptions, Kernel, PayloadCallback};
pub use correlation::{Completion, CorrelationTable, DispatchTicket};
pub use error::{DeliveryError, ViewError};
pub use events::{EventHub, ExecutionEvent};
pub use plan::{identity_rows, plan_notebook, IdentityRow, Plan, PlanRecord};
pub use recording::{DispatchedRequest, RecordingKernel};
pub use session::{ExecuteOutcome, Session};
pub use strategy::{ExecutionStrategy, Lineage, PreparedExecution, StrategyContext, Verbatim};
pub use view::{CellView, TracingView};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving a session
    pub use crate::{
        CellView, ExecuteOutcome, ExecutionEvent, Kernel, Lineage, RecordingKernel, Session,
        Verbatim,
    };
    pub use nodebook_core::{Cell, CellKey, Notebook, NodebookConfig};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
