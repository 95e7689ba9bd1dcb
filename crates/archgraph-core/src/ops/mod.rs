//! The primitive mutations of the architecture tree.
//!
//! Every public function takes the current tree by reference and returns a new tree; the
//! caller's tree is never touched. On error nothing is returned but the error, so the
//! caller keeps its last-known-good tree. The `&mut` implementations in the submodules
//! validate every reference before they change anything.

pub(crate) mod edge;
pub(crate) mod group;
pub(crate) mod node;
mod reattach;

pub use group::GroupOutcome;
pub use reattach::reattach_edges;

use crate::error::{GraphError, Result};
use crate::lookup::find_parent_mut;
use crate::model::GraphNode;

/// Appends a new leaf `{id: name, label: name}` to `parent_id`.
pub fn add_node(tree: &GraphNode, name: &str, parent_id: &str) -> Result<GraphNode> {
    on_copy(tree, |root| node::add_node(root, name, parent_id))
}

/// Removes the node with its subtree and every edge that referenced any removed node.
pub fn delete_node(tree: &GraphNode, node_id: &str) -> Result<GraphNode> {
    on_copy(tree, |root| node::delete_node(root, node_id).map(drop))
}

/// Re-parents the node under `new_parent_id` and re-hosts the affected edges.
pub fn move_node(tree: &GraphNode, node_id: &str, new_parent_id: &str) -> Result<GraphNode> {
    on_copy(tree, |root| {
        node::move_node(root, node_id, new_parent_id).map(drop)
    })
}

/// Adds `source_id -> target_id` on the nearest common ancestor of both endpoints.
pub fn add_edge(
    tree: &GraphNode,
    edge_id: &str,
    source_id: &str,
    target_id: &str,
) -> Result<GraphNode> {
    on_copy(tree, |root| {
        edge::add_edge(root, edge_id, source_id, target_id, None)
    })
}

/// Like [`add_edge`] with a display label.
pub fn add_labeled_edge(
    tree: &GraphNode,
    edge_id: &str,
    source_id: &str,
    target_id: &str,
    label: &str,
) -> Result<GraphNode> {
    on_copy(tree, |root| {
        edge::add_edge(root, edge_id, source_id, target_id, Some(label))
    })
}

/// Removes the edge. An unknown `edge_id` is a no-op.
pub fn delete_edge(tree: &GraphNode, edge_id: &str) -> GraphNode {
    let mut next = tree.clone();
    edge::delete_edge(&mut next, edge_id);
    next
}

/// Points the edge at new endpoints and re-hosts it. An unknown `edge_id` is a no-op.
pub fn move_edge(
    tree: &GraphNode,
    edge_id: &str,
    new_source_id: &str,
    new_target_id: &str,
) -> Result<GraphNode> {
    on_copy(tree, |root| {
        edge::move_edge(root, edge_id, new_source_id, new_target_id).map(drop)
    })
}

/// Moves the listed nodes into a new group `group_id` appended to `parent_id`.
/// Unresolvable members are skipped; with no member left the tree comes back unchanged.
pub fn group_nodes<S: AsRef<str>>(
    tree: &GraphNode,
    node_ids: &[S],
    parent_id: &str,
    group_id: &str,
) -> Result<GraphNode> {
    let node_ids: Vec<&str> = node_ids.iter().map(|id| id.as_ref()).collect();
    on_copy(tree, |root| {
        group::group_nodes(root, &node_ids, parent_id, group_id).map(drop)
    })
}

/// Promotes the group's children to its parent and removes the group node.
pub fn remove_group(tree: &GraphNode, group_id: &str) -> Result<GraphNode> {
    on_copy(tree, |root| group::remove_group(root, group_id).map(drop))
}

fn on_copy(tree: &GraphNode, apply: impl FnOnce(&mut GraphNode) -> Result<()>) -> Result<GraphNode> {
    let mut next = tree.clone();
    apply(&mut next)?;
    Ok(next)
}

/// Takes the node out of its parent's children.
pub(crate) fn detach(root: &mut GraphNode, node_id: &str) -> Option<GraphNode> {
    let parent = find_parent_mut(root, node_id)?;
    let pos = parent.children.iter().position(|child| child.id == node_id)?;
    Some(parent.children.remove(pos))
}

pub(crate) fn require_id(operation: &str, role: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(GraphError::invalid(operation, format!("{role} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
