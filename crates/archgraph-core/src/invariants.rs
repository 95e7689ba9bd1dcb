use std::collections::HashSet;
use std::fmt;

use crate::error::{GraphError, Result};
use crate::lookup::{collect_edges, expected_host, find_node};
use crate::model::GraphNode;

/// A structural problem found in a tree, usually one supplied from outside the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    DuplicateNodeId {
        node_id: String,
    },
    DuplicateEdgeId {
        edge_id: String,
    },
    MissingEndpoints {
        edge_id: String,
    },
    DanglingEndpoint {
        edge_id: String,
        node_id: String,
    },
    MisplacedEdge {
        edge_id: String,
        host_id: String,
        expected_host_id: String,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNodeId { node_id } => write!(f, "node id '{node_id}' is used twice"),
            Self::DuplicateEdgeId { edge_id } => write!(f, "edge id '{edge_id}' is used twice"),
            Self::MissingEndpoints { edge_id } => {
                write!(f, "edge '{edge_id}' needs at least one source and one target")
            }
            Self::DanglingEndpoint { edge_id, node_id } => {
                write!(f, "edge '{edge_id}' references missing node '{node_id}'")
            }
            Self::MisplacedEdge {
                edge_id,
                host_id,
                expected_host_id,
            } => write!(
                f,
                "edge '{edge_id}' is hosted on '{host_id}' but belongs on '{expected_host_id}'"
            ),
        }
    }
}

/// All violations of the tree invariants: unique node and edge ids, resolvable
/// endpoints, and every edge hosted at the nearest common ancestor of its endpoints.
pub fn check_invariants(root: &GraphNode) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    let mut seen_nodes = HashSet::new();
    for node_id in root.subtree_ids() {
        if !seen_nodes.insert(node_id.clone()) {
            violations.push(InvariantViolation::DuplicateNodeId { node_id });
        }
    }

    let mut seen_edges = HashSet::new();
    for (edges, host) in collect_edges(root) {
        for edge in edges {
            if !seen_edges.insert(edge.id.as_str()) {
                violations.push(InvariantViolation::DuplicateEdgeId {
                    edge_id: edge.id.clone(),
                });
            }
            if edge.sources.is_empty() || edge.targets.is_empty() {
                violations.push(InvariantViolation::MissingEndpoints {
                    edge_id: edge.id.clone(),
                });
                continue;
            }
            let missing: Vec<&str> = edge
                .endpoints()
                .filter(|id| find_node(root, id).is_none())
                .collect();
            if !missing.is_empty() {
                violations.extend(missing.into_iter().map(|node_id| {
                    InvariantViolation::DanglingEndpoint {
                        edge_id: edge.id.clone(),
                        node_id: node_id.to_string(),
                    }
                }));
                continue;
            }
            if let Some(expected) = expected_host(root, edge) {
                if expected.id != host.id {
                    violations.push(InvariantViolation::MisplacedEdge {
                        edge_id: edge.id.clone(),
                        host_id: host.id.clone(),
                        expected_host_id: expected.id.clone(),
                    });
                }
            }
        }
    }

    violations
}

pub fn ensure_invariants(root: &GraphNode) -> Result<()> {
    let mut violations = check_invariants(root);
    if violations.is_empty() {
        return Ok(());
    }
    let count = violations.len();
    Err(GraphError::InvalidGraph {
        count,
        first: violations.swap_remove(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GraphEdge;

    fn tree_with_edges(edges_on_root: Vec<GraphEdge>, edges_on_aws: Vec<GraphEdge>) -> GraphNode {
        GraphNode::root()
            .with_children(vec![
                GraphNode::new("ui").with_children(vec![GraphNode::new("webapp")]),
                GraphNode::new("aws")
                    .with_children(vec![GraphNode::new("api"), GraphNode::new("lambda")])
                    .with_edges(edges_on_aws),
            ])
            .with_edges(edges_on_root)
    }

    #[test]
    fn well_formed_tree_has_no_violations() {
        let tree = tree_with_edges(
            vec![GraphEdge::new("e0", "webapp", "api")],
            vec![GraphEdge::new("e1", "api", "lambda")],
        );
        assert!(check_invariants(&tree).is_empty());
        assert!(ensure_invariants(&tree).is_ok());
    }

    #[test]
    fn reports_misplaced_and_dangling_edges() {
        let tree = tree_with_edges(
            vec![
                GraphEdge::new("e1", "api", "lambda"),
                GraphEdge::new("e2", "webapp", "ghost"),
            ],
            vec![],
        );
        let violations = check_invariants(&tree);
        assert_eq!(
            violations,
            vec![
                InvariantViolation::MisplacedEdge {
                    edge_id: "e1".into(),
                    host_id: "root".into(),
                    expected_host_id: "aws".into(),
                },
                InvariantViolation::DanglingEndpoint {
                    edge_id: "e2".into(),
                    node_id: "ghost".into(),
                },
            ]
        );
    }

    #[test]
    fn reports_duplicate_ids() {
        let mut tree = tree_with_edges(
            vec![GraphEdge::new("e0", "webapp", "api")],
            vec![GraphEdge::new("e0", "api", "lambda")],
        );
        tree.children.push(GraphNode::new("api"));
        let violations = check_invariants(&tree);
        assert!(violations.contains(&InvariantViolation::DuplicateNodeId {
            node_id: "api".into()
        }));
        assert!(violations.contains(&InvariantViolation::DuplicateEdgeId {
            edge_id: "e0".into()
        }));
    }

    #[test]
    fn ensure_reports_count_and_first() {
        let mut edge = GraphEdge::new("e3", "api", "lambda");
        edge.targets.clear();
        let tree = tree_with_edges(vec![], vec![edge]);
        let err = ensure_invariants(&tree).expect_err("invalid");
        assert_eq!(
            err,
            GraphError::InvalidGraph {
                count: 1,
                first: InvariantViolation::MissingEndpoints {
                    edge_id: "e3".into()
                },
            }
        );
    }
}
