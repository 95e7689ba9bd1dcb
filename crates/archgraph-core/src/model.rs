use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved id of the tree root.
pub const ROOT_ID: &str = "root";

/// A node in the architecture tree. Matches the ELK-style JSON the renderers consume.
///
/// A node with no children renders as a box, a node with children as a container.
/// `edges` holds the edges this node hosts: every edge lives on the nearest common
/// ancestor of its endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<GraphNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<GraphEdge>,
    /// Rendering metadata (icon, style, groupIconName) and layout annotations
    /// (x, y, width, height). Carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GraphNode {
    /// A leaf whose label is its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            ..Default::default()
        }
    }

    /// An empty root node.
    pub fn root() -> Self {
        Self::new(ROOT_ID)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_children(mut self, children: Vec<GraphNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_edges(mut self, edges: Vec<GraphEdge>) -> Self {
        self.edges = edges;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(GraphNode::node_count).sum::<usize>()
    }

    /// Number of edges hosted anywhere in this subtree.
    pub fn edge_count(&self) -> usize {
        self.edges.len() + self.children.iter().map(GraphNode::edge_count).sum::<usize>()
    }

    /// Ids of every node in this subtree, depth-first, `self` first.
    pub fn subtree_ids(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.node_count());
        collect_ids(self, &mut out);
        out
    }
}

fn collect_ids(node: &GraphNode, out: &mut Vec<String>) {
    out.push(node.id.clone());
    for child in &node.children {
        collect_ids(child, out);
    }
}

/// A directed connection between nodes.
///
/// The wire format allows several sources and targets; every endpoint takes part in
/// deciding where the edge is hosted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Layout annotations (sections, bend points) and styling, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GraphEdge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sources: vec![source.into()],
            targets: vec![target.into()],
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// All sources followed by all targets.
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .chain(self.targets.iter())
            .map(String::as_str)
    }

    /// Whether `node_id` is one of this edge's sources or targets.
    pub fn touches(&self, node_id: &str) -> bool {
        self.endpoints().any(|id| id == node_id)
    }

    pub fn is_multi_endpoint(&self) -> bool {
        self.sources.len() > 1 || self.targets.len() > 1
    }
}
