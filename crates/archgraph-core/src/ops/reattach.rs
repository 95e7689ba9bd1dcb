use std::collections::HashSet;

use tracing::debug;

use crate::lookup::{collect_edges, expected_host, find_node_mut};
use crate::model::GraphNode;

struct Rehost {
    edge_id: String,
    from: String,
    to: String,
}

/// Moves every edge touching `node_id` onto the nearest common ancestor of its endpoints.
///
/// Run after any relocation of `node_id`. Returns the number of edges that changed host;
/// a second run with no structural change in between moves nothing.
pub fn reattach_edges(root: &mut GraphNode, node_id: &str) -> usize {
    reattach_edges_touching(root, &HashSet::from([node_id]))
}

pub(crate) fn reattach_edges_touching(root: &mut GraphNode, node_ids: &HashSet<&str>) -> usize {
    let tree: &GraphNode = root;
    let mut plan = Vec::new();
    for (edges, host) in collect_edges(tree) {
        for edge in edges
            .iter()
            .filter(|edge| edge.endpoints().any(|id| node_ids.contains(id)))
        {
            if edge.is_multi_endpoint() {
                debug!(edge_id = %edge.id, "re-hosting multi-endpoint edge on the ancestor of all endpoints");
            }
            // dangling or endpoint-less edges have no defined host and stay put
            let Some(new_host) = expected_host(tree, edge) else {
                continue;
            };
            if new_host.id != host.id {
                plan.push(Rehost {
                    edge_id: edge.id.clone(),
                    from: host.id.clone(),
                    to: new_host.id.clone(),
                });
            }
        }
    }

    let mut moved = 0;
    for Rehost { edge_id, from, to } in plan {
        let Some(old_host) = find_node_mut(root, &from) else {
            continue;
        };
        let Some(pos) = old_host.edges.iter().position(|edge| edge.id == edge_id) else {
            continue;
        };
        let edge = old_host.edges.remove(pos);
        match find_node_mut(root, &to) {
            Some(new_host) => new_host.edges.push(edge),
            None => root.edges.push(edge),
        }
        debug!(%edge_id, %from, %to, "edge re-hosted");
        moved += 1;
    }
    moved
}

/// Removes every edge, at any depth, that references one of `node_ids`.
pub(crate) fn remove_edges_touching(node: &mut GraphNode, node_ids: &HashSet<&str>) -> usize {
    let before = node.edges.len();
    node.edges
        .retain(|edge| !edge.endpoints().any(|id| node_ids.contains(id)));
    let mut removed = before - node.edges.len();
    for child in &mut node.children {
        removed += remove_edges_touching(child, node_ids);
    }
    removed
}
