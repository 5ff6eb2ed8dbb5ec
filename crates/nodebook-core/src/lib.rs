//! Nodebook Core
//!
//! Data model and pure logic behind lineage-aware cell execution:
//! - Stable node identities for cells, independent of position
//! - Graph membership tracking (`participates`)
//! - Nearest-participating-parent resolution over document order
//! - `#pragma nodebook` directive parsing
//! - `%%execute_cell` payload rewriting
//!
//! # Example
//!
//! ```rust
//! use nodebook_core::{Cell, IdentityManager, LineageIndex, Notebook};
//!
//! let mut notebook = Notebook::new();
//! notebook.push(Cell::code("x = 1"));
//! notebook.push(Cell::code("y = x + 1"));
//!
//! let mut identities = IdentityManager::new();
//! identities.initialize(&mut notebook);
//!
//! let index = LineageIndex::build(&notebook, &identities);
//! assert!(index.parent_of(1).is_none());
//! ```

#![warn(unreachable_pub)]

pub mod cell;
pub mod config;
pub mod directive;
pub mod error;
pub mod identity;
pub mod lineage;
pub mod notebook;
pub mod payload;
pub mod prompt;
pub mod types;

// Re-exports for convenience
pub use cell::{Cell, CellMetadata};
pub use config::NodebookConfig;
pub use directive::{Directive, Mode};
pub use error::NodebookError;
pub use identity::{IdentityManager, NodeDirectory, NodeRecord};
pub use lineage::LineageIndex;
pub use notebook::Notebook;
pub use payload::{decode_payload, rewrite_source, split_cell_magic, DecodedPayload, ExecuteCellHeader};
pub use prompt::{InputPrompt, PromptError, PromptPayload};
pub use types::{CellKey, CellKind, KernelId, MsgId, NodeName};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
