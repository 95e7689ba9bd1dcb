use std::collections::HashSet;

use tracing::debug;

use super::reattach::{reattach_edges_touching, remove_edges_touching};
use super::{detach, require_id};
use crate::error::{GraphError, Result};
use crate::lookup::{find_node, find_node_mut, subtree_contains};
use crate::model::GraphNode;

pub(crate) fn add_node(root: &mut GraphNode, name: &str, parent_id: &str) -> Result<()> {
    require_id("add_node", "nodename", name)?;
    if find_node(root, parent_id).is_none() {
        return Err(GraphError::ParentNotFound(parent_id.to_string()));
    }
    if find_node(root, name).is_some() {
        return Err(GraphError::DuplicateNodeId(name.to_string()));
    }
    let parent = find_node_mut(root, parent_id)
        .ok_or_else(|| GraphError::ParentNotFound(parent_id.to_string()))?;
    parent.children.push(GraphNode::new(name));
    debug!(node_id = name, parent_id, "node added");
    Ok(())
}

/// Detaches the node (and its subtree) and drops every edge that referenced any
/// node of the removed subtree. Returns the number of edges dropped.
pub(crate) fn delete_node(root: &mut GraphNode, node_id: &str) -> Result<usize> {
    if root.id == node_id {
        return Err(GraphError::CannotDeleteRoot(node_id.to_string()));
    }
    let removed =
        detach(root, node_id).ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;
    let removed_ids = removed.subtree_ids();
    let removed_ids: HashSet<&str> = removed_ids.iter().map(String::as_str).collect();
    let dropped = remove_edges_touching(root, &removed_ids);
    debug!(node_id, removed_nodes = removed_ids.len(), dropped_edges = dropped, "node deleted");
    Ok(dropped)
}

/// Re-parents the node and re-hosts the edges touching anything in its subtree.
/// Returns the number of re-hosted edges.
pub(crate) fn move_node(root: &mut GraphNode, node_id: &str, new_parent_id: &str) -> Result<usize> {
    if root.id == node_id {
        return Err(GraphError::CannotMoveRoot(node_id.to_string()));
    }
    let node =
        find_node(root, node_id).ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;
    if find_node(root, new_parent_id).is_none() {
        return Err(GraphError::NewParentNotFound(new_parent_id.to_string()));
    }
    if subtree_contains(node, new_parent_id) {
        return Err(GraphError::MoveIntoOwnSubtree {
            node_id: node_id.to_string(),
            new_parent_id: new_parent_id.to_string(),
        });
    }
    let moved_ids = node.subtree_ids();

    // Both lookups were validated above and the new parent lies outside the moved subtree.
    let node =
        detach(root, node_id).ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;
    let new_parent = find_node_mut(root, new_parent_id)
        .ok_or_else(|| GraphError::NewParentNotFound(new_parent_id.to_string()))?;
    new_parent.children.push(node);

    let moved_ids: HashSet<&str> = moved_ids.iter().map(String::as_str).collect();
    let rehosted = reattach_edges_touching(root, &moved_ids);
    debug!(node_id, new_parent_id, rehosted, "node moved");
    Ok(rehosted)
}
