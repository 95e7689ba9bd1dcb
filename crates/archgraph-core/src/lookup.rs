//! Read-only traversal over the node tree.
//!
//! Every lookup is a depth-first walk from the root; there is no id index. Diagrams
//! stay in the tens to low hundreds of nodes, so O(tree) per call is fine.

use crate::model::{GraphEdge, GraphNode};

/// The node with `id`, if any. Ids are unique, so the first match is the match.
pub fn find_node<'a>(root: &'a GraphNode, id: &str) -> Option<&'a GraphNode> {
    if root.id == id {
        return Some(root);
    }
    root.children.iter().find_map(|child| find_node(child, id))
}

pub(crate) fn find_node_mut<'a>(root: &'a mut GraphNode, id: &str) -> Option<&'a mut GraphNode> {
    if root.id == id {
        return Some(root);
    }
    root.children
        .iter_mut()
        .find_map(|child| find_node_mut(child, id))
}

/// The immediate parent of `id`. `None` when `id` is the root or absent.
pub fn find_parent<'a>(root: &'a GraphNode, id: &str) -> Option<&'a GraphNode> {
    if root.children.iter().any(|child| child.id == id) {
        return Some(root);
    }
    root.children.iter().find_map(|child| find_parent(child, id))
}

pub(crate) fn find_parent_mut<'a>(
    root: &'a mut GraphNode,
    id: &str,
) -> Option<&'a mut GraphNode> {
    if root.children.iter().any(|child| child.id == id) {
        return Some(root);
    }
    root.children
        .iter_mut()
        .find_map(|child| find_parent_mut(child, id))
}

/// Root-to-target path, both ends included.
pub fn path_to_node<'a>(root: &'a GraphNode, id: &str) -> Option<Vec<&'a GraphNode>> {
    let mut path = Vec::new();
    fill_path(root, id, &mut path).then_some(path)
}

fn fill_path<'a>(node: &'a GraphNode, id: &str, path: &mut Vec<&'a GraphNode>) -> bool {
    path.push(node);
    if node.id == id {
        return true;
    }
    for child in &node.children {
        if fill_path(child, id, path) {
            return true;
        }
    }
    path.pop();
    false
}

/// Nearest common ancestor of two nodes. A node counts as its own ancestor, so
/// the answer for `(a, a)` is `a` and for an ancestor/descendant pair it is the ancestor.
pub fn find_common_ancestor<'a>(
    root: &'a GraphNode,
    id_a: &str,
    id_b: &str,
) -> Option<&'a GraphNode> {
    find_common_ancestor_of(root, [id_a, id_b])
}

/// Nearest common ancestor of any number of nodes. `None` if the list is empty or
/// any id is missing from the tree.
pub fn find_common_ancestor_of<'a, 'b>(
    root: &'a GraphNode,
    ids: impl IntoIterator<Item = &'b str>,
) -> Option<&'a GraphNode> {
    let mut common: Option<Vec<&'a GraphNode>> = None;
    for id in ids {
        let path = path_to_node(root, id)?;
        common = Some(match common {
            None => path,
            Some(mut prefix) => {
                let shared = prefix
                    .iter()
                    .zip(&path)
                    .take_while(|(a, b)| a.id == b.id)
                    .count();
                prefix.truncate(shared);
                prefix
            }
        });
    }
    common?.last().copied()
}

/// Where `edge` belongs: the nearest common ancestor of all its endpoints.
pub fn expected_host<'a>(root: &'a GraphNode, edge: &GraphEdge) -> Option<&'a GraphNode> {
    find_common_ancestor_of(root, edge.endpoints())
}

/// Every node's edge list paired with the node hosting it.
pub fn collect_edges(root: &GraphNode) -> Vec<(&[GraphEdge], &GraphNode)> {
    let mut out = Vec::new();
    push_edges(root, &mut out);
    out
}

fn push_edges<'a>(node: &'a GraphNode, out: &mut Vec<(&'a [GraphEdge], &'a GraphNode)>) {
    out.push((node.edges.as_slice(), node));
    for child in &node.children {
        push_edges(child, out);
    }
}

/// The edge with `edge_id` together with its host.
pub fn find_edge<'a>(root: &'a GraphNode, edge_id: &str) -> Option<(&'a GraphEdge, &'a GraphNode)> {
    collect_edges(root).into_iter().find_map(|(edges, host)| {
        edges
            .iter()
            .find(|edge| edge.id == edge_id)
            .map(|edge| (edge, host))
    })
}

/// Whether `id` names `node` or one of its descendants.
pub fn subtree_contains(node: &GraphNode, id: &str) -> bool {
    find_node(node, id).is_some()
}
