//! A versioned slot holding the current tree.
//!
//! Every structural change bumps the revision. Layout results computed from an older
//! snapshot are refused instead of overwriting newer edits.

use tracing::info;

use crate::batch::{batch_update_validated, BatchReport};
use crate::error::Result;
use crate::invariants::ensure_invariants;
use crate::layout::{same_structure, LayoutAdapter, LayoutError, LayoutOptions};
use crate::model::GraphNode;
use crate::operation::{Operation, RawOperation};

#[derive(Debug, Clone, PartialEq)]
pub struct GraphSession {
    tree: GraphNode,
    revision: u64,
    laid_out: Option<GraphNode>,
}

impl Default for GraphSession {
    fn default() -> Self {
        Self::new(GraphNode::root())
    }
}

impl GraphSession {
    pub fn new(tree: GraphNode) -> Self {
        Self {
            tree,
            revision: 0,
            laid_out: None,
        }
    }

    pub fn tree(&self) -> &GraphNode {
        &self.tree
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The last accepted layout, if it still matches the current revision.
    pub fn laid_out(&self) -> Option<&GraphNode> {
        self.laid_out.as_ref()
    }

    /// Applies one operation; the tree and revision change only on success.
    pub fn apply(&mut self, op: &Operation) -> Result<Option<String>> {
        let mut next = self.tree.clone();
        let note = op.apply_in_place(&mut next)?;
        if next != self.tree {
            self.replace(next);
        }
        Ok(note)
    }

    /// Runs the validating batch against the current tree and keeps its result.
    /// The revision moves only if the tree actually changed.
    pub fn apply_batch(&mut self, operations: &[RawOperation]) -> BatchReport {
        let report = batch_update_validated(&self.tree, operations);
        if report.tree != self.tree {
            self.replace(report.tree.clone());
        }
        report
    }

    /// Swaps in a whole new tree, e.g. one loaded from disk.
    pub fn reset(&mut self, tree: GraphNode) -> Result<()> {
        ensure_invariants(&tree)?;
        self.replace(tree);
        Ok(())
    }

    /// The tree to hand to a layout engine, tagged with the revision it belongs to.
    pub fn snapshot(&self) -> (u64, GraphNode) {
        (self.revision, self.tree.clone())
    }

    /// Stores a layout result unless the tree changed since `revision` was snapshotted.
    pub fn accept_layout(
        &mut self,
        revision: u64,
        laid_out: GraphNode,
    ) -> std::result::Result<(), LayoutError> {
        if revision != self.revision {
            info!(
                got = revision,
                current = self.revision,
                "stale layout discarded"
            );
            return Err(LayoutError::StaleLayout {
                got: revision,
                current: self.revision,
            });
        }
        if !same_structure(&self.tree, &laid_out) {
            return Err(LayoutError::StructureChanged);
        }
        self.laid_out = Some(laid_out);
        Ok(())
    }

    /// Runs `adapter` on a snapshot and accepts the result.
    pub fn run_layout(
        &mut self,
        adapter: &dyn LayoutAdapter,
        options: &LayoutOptions,
    ) -> std::result::Result<(), LayoutError> {
        let (revision, snapshot) = self.snapshot();
        let laid_out = adapter.layout(&snapshot, options)?;
        self.accept_layout(revision, laid_out)
    }

    fn replace(&mut self, tree: GraphNode) {
        self.tree = tree;
        self.revision += 1;
        self.laid_out = None;
    }
}
