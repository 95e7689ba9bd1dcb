use tracing::debug;

use super::require_id;
use crate::error::{GraphError, Result};
use crate::lookup::{expected_host, find_edge, find_node, find_node_mut};
use crate::model::{GraphEdge, GraphNode};

pub(crate) fn add_edge(
    root: &mut GraphNode,
    edge_id: &str,
    source_id: &str,
    target_id: &str,
    label: Option<&str>,
) -> Result<()> {
    require_id("add_edge", "edgeId", edge_id)?;
    ensure_endpoints(root, source_id, target_id)?;
    if find_edge(root, edge_id).is_some() {
        return Err(GraphError::DuplicateEdgeId(edge_id.to_string()));
    }

    let mut edge = GraphEdge::new(edge_id, source_id, target_id);
    edge.label = label.map(str::to_string);
    host_edge(root, edge)
}

/// Removes the edge wherever it is hosted. Returns whether anything was removed.
pub(crate) fn delete_edge(root: &mut GraphNode, edge_id: &str) -> bool {
    let removed = take_edge(root, edge_id).is_some();
    debug!(edge_id, removed, "delete edge");
    removed
}

/// Points the edge at new endpoints and re-hosts it. Returns `false` when the edge
/// does not exist, in which case nothing changes.
pub(crate) fn move_edge(
    root: &mut GraphNode,
    edge_id: &str,
    new_source_id: &str,
    new_target_id: &str,
) -> Result<bool> {
    if find_edge(root, edge_id).is_none() {
        debug!(edge_id, "move edge: edge not found, nothing to do");
        return Ok(false);
    }
    ensure_endpoints(root, new_source_id, new_target_id)?;

    let Some(mut edge) = take_edge(root, edge_id) else {
        return Ok(false);
    };
    edge.sources = vec![new_source_id.to_string()];
    edge.targets = vec![new_target_id.to_string()];
    host_edge(root, edge)?;
    Ok(true)
}

fn ensure_endpoints(root: &GraphNode, source_id: &str, target_id: &str) -> Result<()> {
    if find_node(root, source_id).is_none() {
        return Err(GraphError::SourceNotFound(source_id.to_string()));
    }
    if find_node(root, target_id).is_none() {
        return Err(GraphError::TargetNotFound(target_id.to_string()));
    }
    Ok(())
}

/// Appends `edge` to the nearest common ancestor of its endpoints. Endpoints must exist.
fn host_edge(root: &mut GraphNode, edge: GraphEdge) -> Result<()> {
    let host_id = expected_host(root, &edge)
        .map(|host| host.id.clone())
        .ok_or_else(|| {
            GraphError::invalid(
                "add_edge",
                format!("edge '{}' has no resolvable endpoints", edge.id),
            )
        })?;
    let host = find_node_mut(root, &host_id).ok_or(GraphError::NodeNotFound(host_id))?;
    debug!(edge_id = %edge.id, host_id = %host.id, "edge hosted");
    host.edges.push(edge);
    Ok(())
}

pub(crate) fn take_edge(node: &mut GraphNode, edge_id: &str) -> Option<GraphEdge> {
    if let Some(pos) = node.edges.iter().position(|edge| edge.id == edge_id) {
        return Some(node.edges.remove(pos));
    }
    node.children
        .iter_mut()
        .find_map(|child| take_edge(child, edge_id))
}
