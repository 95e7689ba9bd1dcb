use std::collections::HashSet;

use tracing::{debug, info};

use super::reattach::{reattach_edges_touching, remove_edges_touching};
use super::{detach, require_id};
use crate::error::{GraphError, Result};
use crate::lookup::{find_node, find_node_mut, find_parent, subtree_contains};
use crate::model::GraphNode;

/// What `group_nodes` did with each requested member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupOutcome {
    pub moved: Vec<String>,
    pub skipped: Vec<String>,
}

impl GroupOutcome {
    /// No member resolved, so no group was created.
    pub fn discarded(&self) -> bool {
        self.moved.is_empty()
    }
}

/// Wraps the listed nodes, wherever they currently live, in a new group under `parent_id`.
///
/// Members that are missing, repeated, the root, or an ancestor of `parent_id` are skipped.
/// If none is left, nothing changes.
pub(crate) fn group_nodes(
    root: &mut GraphNode,
    node_ids: &[&str],
    parent_id: &str,
    group_id: &str,
) -> Result<GroupOutcome> {
    require_id("group_nodes", "groupId", group_id)?;
    if find_node(root, parent_id).is_none() {
        return Err(GraphError::ParentNotFound(parent_id.to_string()));
    }
    if find_node(root, group_id).is_some() {
        return Err(GraphError::DuplicateNodeId(group_id.to_string()));
    }

    let mut group = GraphNode::new(group_id);
    let mut outcome = GroupOutcome::default();
    for &id in node_ids {
        let movable = id != root.id
            && !outcome.moved.iter().any(|moved| moved == id)
            && find_node(root, id).is_some_and(|node| !subtree_contains(node, parent_id));
        if !movable {
            debug!(group_id, member = id, "group member skipped");
            outcome.skipped.push(id.to_string());
            continue;
        }
        if let Some(node) = detach(root, id) {
            group.children.push(node);
            outcome.moved.push(id.to_string());
        }
    }

    if outcome.discarded() {
        info!(group_id, parent_id, "no member resolved, group discarded");
        return Ok(outcome);
    }

    let moved_ids = group.subtree_ids();
    let parent = find_node_mut(root, parent_id)
        .ok_or_else(|| GraphError::ParentNotFound(parent_id.to_string()))?;
    parent.children.push(group);

    let moved_ids: HashSet<&str> = moved_ids.iter().map(String::as_str).collect();
    let rehosted = reattach_edges_touching(root, &moved_ids);
    debug!(group_id, parent_id, members = outcome.moved.len(), rehosted, "group created");
    Ok(outcome)
}

/// Promotes the group's children to the group's parent and removes the group.
///
/// Edges the group hosted move to the parent; edges that pointed at the group
/// itself are dropped. Returns the ids of the promoted children.
pub(crate) fn remove_group(root: &mut GraphNode, group_id: &str) -> Result<Vec<String>> {
    if root.id == group_id {
        return Err(GraphError::CannotUngroupRoot(group_id.to_string()));
    }
    let parent_id = find_parent(root, group_id)
        .map(|parent| parent.id.clone())
        .ok_or_else(|| GraphError::GroupNotFound(group_id.to_string()))?;
    let group =
        detach(root, group_id).ok_or_else(|| GraphError::GroupNotFound(group_id.to_string()))?;

    let GraphNode {
        children, edges, ..
    } = group;
    let promoted: Vec<String> = children.iter().map(|child| child.id.clone()).collect();
    let moved_ids: Vec<String> = children.iter().flat_map(GraphNode::subtree_ids).collect();

    let group_only = HashSet::from([group_id]);
    let dropped = remove_edges_touching(root, &group_only);

    let parent = find_node_mut(root, &parent_id)
        .ok_or_else(|| GraphError::GroupNotFound(group_id.to_string()))?;
    parent
        .edges
        .extend(edges.into_iter().filter(|edge| !edge.touches(group_id)));
    parent.children.extend(children);

    let moved_ids: HashSet<&str> = moved_ids.iter().map(String::as_str).collect();
    let rehosted = reattach_edges_touching(root, &moved_ids);
    debug!(group_id, %parent_id, promoted = promoted.len(), dropped, rehosted, "group removed");
    Ok(promoted)
}
