use thiserror::Error;

use crate::invariants::InvariantViolation;

pub type Result<T> = std::result::Result<T, GraphError>;

/// Coarse classification of a [`GraphError`], used when reporting back to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ReferenceNotFound,
    UnknownOperationName,
    StructuralViolation,
    DuplicateId,
    InvalidArguments,
}

/// Every failure a primitive can report. The tree is left unchanged whenever one is returned.
///
/// Messages name the role and id that failed so the driving agent can correct the
/// reference on its next turn.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("parent node '{0}' not found")]
    ParentNotFound(String),

    #[error("node '{0}' not found")]
    NodeNotFound(String),

    #[error("new parent node '{0}' not found")]
    NewParentNotFound(String),

    #[error("source node '{0}' not found")]
    SourceNotFound(String),

    #[error("target node '{0}' not found")]
    TargetNotFound(String),

    #[error("edge '{0}' not found")]
    EdgeNotFound(String),

    #[error("group '{0}' not found")]
    GroupNotFound(String),

    #[error("node id '{0}' already exists")]
    DuplicateNodeId(String),

    #[error("edge id '{0}' already exists")]
    DuplicateEdgeId(String),

    #[error("the root node '{0}' cannot be deleted")]
    CannotDeleteRoot(String),

    #[error("the root node '{0}' cannot be moved")]
    CannotMoveRoot(String),

    #[error("the root node '{0}' cannot be ungrouped")]
    CannotUngroupRoot(String),

    #[error("cannot move node '{node_id}' under '{new_parent_id}': the new parent is inside the node's own subtree")]
    MoveIntoOwnSubtree {
        node_id: String,
        new_parent_id: String,
    },

    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("invalid arguments for '{operation}': {reason}")]
    InvalidArguments { operation: String, reason: String },

    #[error("graph violates {count} invariant(s), first: {first}")]
    InvalidGraph {
        count: usize,
        first: InvariantViolation,
    },
}

impl GraphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ParentNotFound(_)
            | Self::NodeNotFound(_)
            | Self::NewParentNotFound(_)
            | Self::SourceNotFound(_)
            | Self::TargetNotFound(_)
            | Self::EdgeNotFound(_)
            | Self::GroupNotFound(_) => ErrorKind::ReferenceNotFound,
            Self::DuplicateNodeId(_) | Self::DuplicateEdgeId(_) => ErrorKind::DuplicateId,
            Self::CannotDeleteRoot(_)
            | Self::CannotMoveRoot(_)
            | Self::CannotUngroupRoot(_)
            | Self::MoveIntoOwnSubtree { .. }
            | Self::InvalidGraph { .. } => ErrorKind::StructuralViolation,
            Self::UnknownOperation(_) => ErrorKind::UnknownOperationName,
            Self::InvalidArguments { .. } => ErrorKind::InvalidArguments,
        }
    }

    pub(crate) fn invalid(operation: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}
