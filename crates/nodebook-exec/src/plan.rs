//! Dry runs over a whole notebook
//!
//! Every code cell is executed in document order against a
//! [`RecordingKernel`], each run is finished immediately, and the
//! dispatched payloads are collected. Backs the `nodebook` binary.

use crate::backend::Kernel;
use crate::recording::RecordingKernel;
use crate::session::{ExecuteOutcome, Session};
use crate::view::TracingView;
use nodebook_core::{decode_payload, Notebook, NodebookConfig};
use serde::Serialize;
use std::sync::Arc;

/// One dispatched cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanRecord {
    /// Document key
    pub cell: String,
    /// Node identity
    pub node: String,
    /// Parent named in the lineage header; `None` for roots and opt-outs
    pub parent: Option<String>,
    /// Membership after the run
    pub participates: bool,
    /// Text sent to the kernel
    pub code: String,
}

/// Result of a dry run
#[derive(Debug)]
pub struct Plan {
    /// Dispatched cells in order
    pub records: Vec<PlanRecord>,
    /// Document with identities and membership persisted
    pub notebook: Notebook,
}

/// Identity of one code cell after load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityRow {
    /// Position in the document
    pub position: usize,
    /// Node identity
    pub node: String,
    /// Persisted membership
    pub participates: bool,
}

/// Run every code cell once and collect what was dispatched
pub async fn plan_notebook(notebook: Notebook, config: NodebookConfig) -> Plan {
    let keys: Vec<_> = notebook
        .cells()
        .iter()
        .filter(|c| c.kind.is_code())
        .map(|c| c.key.clone())
        .collect();

    let mut session = Session::new(notebook, Arc::new(TracingView), config);
    let kernel = Arc::new(RecordingKernel::new());
    session.attach_kernel(kernel.clone());

    let mut records = Vec::new();
    for key in &keys {
        let ExecuteOutcome::Dispatched(ticket) = session.execute_default(key) else {
            continue;
        };
        session.handle_finished(kernel.id(), &ticket.msg_id);
        let msg_id = ticket.msg_id.clone();
        if ticket.finished().await.is_none() {
            tracing::warn!("Run {} did not complete", msg_id);
        }

        let Some(request) = kernel.last_request() else {
            continue;
        };
        let parent = decode_payload(&request.code)
            .and_then(|decoded| decoded.header.parent)
            .map(|p| p.to_string());
        records.push(PlanRecord {
            cell: key.to_string(),
            node: session
                .identity(key)
                .map(ToString::to_string)
                .unwrap_or_default(),
            parent,
            participates: session.identities().participates(key),
            code: request.code,
        });
    }
    tracing::info!("Planned {} of {} code cells", records.len(), keys.len());

    session.detach_kernel();
    Plan {
        records,
        notebook: session.notebook().clone(),
    }
}

/// Identities as assigned or adopted at load
#[must_use]
pub fn identity_rows(notebook: Notebook) -> Vec<IdentityRow> {
    let session = Session::new(notebook, Arc::new(TracingView), NodebookConfig::new());
    session
        .notebook()
        .cells()
        .iter()
        .enumerate()
        .filter_map(|(position, cell)| {
            let record = session.identities().record(&cell.key)?;
            Some(IdentityRow {
                position,
                node: record.identity.to_string(),
                participates: record.participates,
            })
        })
        .collect()
}
