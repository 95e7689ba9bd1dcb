//! Hierarchical architecture graphs and the operations an agent uses to edit them.
//!
//! The tree is plain data ([`GraphNode`], [`GraphEdge`]). Every mutation in [`ops`] takes
//! the current tree by reference and returns a new one, so a failed call never disturbs
//! the caller's last-known-good tree.

pub mod batch;
pub mod error;
pub mod invariants;
pub mod layout;
pub mod lookup;
pub mod model;
pub mod operation;
pub mod ops;
pub mod rules;
pub mod session;
pub mod settings;

pub use batch::{batch_update, batch_update_validated, BatchReport, OperationResult, OperationStatus};
pub use error::{ErrorKind, GraphError, Result};
pub use invariants::{check_invariants, ensure_invariants, InvariantViolation};
pub use layout::{Direction, HierarchyHandling, LayoutAdapter, LayoutError, LayoutOptions};
pub use lookup::{
    find_common_ancestor, find_edge, find_node, find_parent, path_to_node,
};
pub use model::{GraphEdge, GraphNode, ROOT_ID};
pub use operation::{Operation, RawOperation};
pub use rules::{OPERATIONS, RULES};
pub use session::GraphSession;
pub use settings::{ai_configured, read_settings, write_settings, AiSettings, Settings};
