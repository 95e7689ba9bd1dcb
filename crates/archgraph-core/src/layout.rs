//! The seam toward an external layout engine.
//!
//! No algorithm lives here. An adapter receives a snapshot of the tree and returns a copy
//! annotated with geometry (`x`, `y`, `width`, `height`, bend points, ...) carried in the
//! nodes' and edges' `extra` maps.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::GraphNode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Down,
    Up,
    #[default]
    Right,
    Left,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HierarchyHandling {
    #[default]
    IncludeChildren,
    SeparateChildren,
}

fn default_node_spacing() -> f64 {
    60.0
}

fn default_layer_spacing() -> f64 {
    50.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOptions {
    #[serde(default)]
    pub direction: Direction,
    /// Space between sibling nodes.
    #[serde(default = "default_node_spacing")]
    pub node_spacing: f64,
    /// Space between consecutive layers.
    #[serde(default = "default_layer_spacing")]
    pub layer_spacing: f64,
    #[serde(default)]
    pub hierarchy_handling: HierarchyHandling,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            node_spacing: default_node_spacing(),
            layer_spacing: default_layer_spacing(),
            hierarchy_handling: HierarchyHandling::default(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("layout engine failed: {0}")]
    Engine(String),
    #[error("layout result is for revision {got}, graph is at revision {current}")]
    StaleLayout { got: u64, current: u64 },
    #[error("layout result changed the graph structure")]
    StructureChanged,
}

pub trait LayoutAdapter {
    fn layout(&self, tree: &GraphNode, options: &LayoutOptions) -> Result<GraphNode, LayoutError>;
}

/// Whether `laid_out` has the same nodes, nesting and edges as `tree`, ignoring annotations.
pub fn same_structure(tree: &GraphNode, laid_out: &GraphNode) -> bool {
    tree.id == laid_out.id
        && tree.children.len() == laid_out.children.len()
        && tree.edges.len() == laid_out.edges.len()
        && tree.edges.iter().zip(&laid_out.edges).all(|(a, b)| {
            a.id == b.id && a.sources == b.sources && a.targets == b.targets
        })
        && tree
            .children
            .iter()
            .zip(&laid_out.children)
            .all(|(a, b)| same_structure(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_use_layout_engine_spelling() {
        let options = LayoutOptions::default();
        assert_eq!(
            serde_json::to_value(&options).expect("serialize"),
            json!({
                "direction": "RIGHT",
                "nodeSpacing": 60.0,
                "layerSpacing": 50.0,
                "hierarchyHandling": "INCLUDE_CHILDREN"
            })
        );
        let parsed: LayoutOptions =
            serde_json::from_value(json!({"direction": "DOWN"})).expect("parse");
        assert_eq!(parsed.direction, Direction::Down);
        assert_eq!(parsed.node_spacing, 60.0);
    }

    #[test]
    fn annotations_do_not_change_structure() {
        let tree = GraphNode::root().with_children(vec![GraphNode::new("api")]);
        let mut laid_out = tree.clone();
        laid_out.children[0].extra.insert("x".into(), json!(12.0));
        assert!(same_structure(&tree, &laid_out));

        laid_out.children.push(GraphNode::new("db"));
        assert!(!same_structure(&tree, &laid_out));
    }
}
