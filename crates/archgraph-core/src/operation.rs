//! Function-call shaped operations, as an agent emits them: `{"name": ..., "args": {...}}`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GraphError, Result};
use crate::lookup::{find_edge, find_node};
use crate::model::GraphNode;
use crate::ops::{edge, group, node};

/// An operation exactly as received. Parsed with [`Operation::parse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RawOperation {
    /// Operation name, e.g. "add_node"
    pub name: String,
    /// Operation arguments as a JSON object, e.g. {"nodename": "api", "parentId": "aws"}
    #[serde(default, alias = "arguments")]
    pub args: Value,
}

impl RawOperation {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddNodeArgs {
    /// Id (and initial label) of the new node
    #[serde(alias = "nodeName", alias = "node_name", alias = "name")]
    pub nodename: String,
    /// Id of the node to add the new node under
    #[serde(alias = "parent_id")]
    pub parent_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNodeArgs {
    /// Id of the node to delete, together with its subtree and connected edges
    #[serde(alias = "node_id")]
    pub node_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveNodeArgs {
    /// Id of the node to move
    #[serde(alias = "node_id")]
    pub node_id: String,
    /// Id of the node that becomes its parent
    #[serde(alias = "new_parent_id")]
    pub new_parent_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddEdgeArgs {
    /// Id of the new edge
    #[serde(alias = "edge_id")]
    pub edge_id: String,
    /// Id of the node the edge starts from
    #[serde(alias = "source_id")]
    pub source_id: String,
    /// Id of the node the edge points to
    #[serde(alias = "target_id")]
    pub target_id: String,
    /// Optional display label, e.g. "reads from"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEdgeArgs {
    /// Id of the edge to delete
    #[serde(alias = "edge_id")]
    pub edge_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveEdgeArgs {
    /// Id of the edge to reconnect
    #[serde(alias = "edge_id")]
    pub edge_id: String,
    /// Id of the new source node
    #[serde(alias = "new_source_id")]
    pub new_source_id: String,
    /// Id of the new target node
    #[serde(alias = "new_target_id")]
    pub new_target_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupNodesArgs {
    /// Ids of the nodes to wrap in the group; they may live anywhere in the tree
    #[serde(alias = "node_ids")]
    pub node_ids: Vec<String>,
    /// Id of the node the group is added under
    #[serde(alias = "parent_id")]
    pub parent_id: String,
    /// Id of the new group node
    #[serde(alias = "group_id")]
    pub group_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveGroupArgs {
    /// Id of the group to dissolve; its children move up to the group's parent
    #[serde(alias = "group_id")]
    pub group_id: String,
}

/// A parsed primitive operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    AddNode(AddNodeArgs),
    DeleteNode(DeleteNodeArgs),
    MoveNode(MoveNodeArgs),
    AddEdge(AddEdgeArgs),
    DeleteEdge(DeleteEdgeArgs),
    MoveEdge(MoveEdgeArgs),
    GroupNodes(GroupNodesArgs),
    RemoveGroup(RemoveGroupArgs),
}

impl Operation {
    pub const NAMES: [&'static str; 8] = [
        "add_node",
        "delete_node",
        "move_node",
        "add_edge",
        "delete_edge",
        "move_edge",
        "group_nodes",
        "remove_group",
    ];

    pub fn parse(raw: &RawOperation) -> Result<Self> {
        let name = raw.name.trim();
        let args = raw.args.clone();
        match name {
            "add_node" => decode(name, args).map(Self::AddNode),
            "delete_node" => decode(name, args).map(Self::DeleteNode),
            "move_node" => decode(name, args).map(Self::MoveNode),
            "add_edge" => decode(name, args).map(Self::AddEdge),
            "delete_edge" => decode(name, args).map(Self::DeleteEdge),
            "move_edge" => decode(name, args).map(Self::MoveEdge),
            "group_nodes" => decode(name, args).map(Self::GroupNodes),
            "remove_group" => decode(name, args).map(Self::RemoveGroup),
            _ => Err(GraphError::UnknownOperation(raw.name.clone())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AddNode(_) => "add_node",
            Self::DeleteNode(_) => "delete_node",
            Self::MoveNode(_) => "move_node",
            Self::AddEdge(_) => "add_edge",
            Self::DeleteEdge(_) => "delete_edge",
            Self::MoveEdge(_) => "move_edge",
            Self::GroupNodes(_) => "group_nodes",
            Self::RemoveGroup(_) => "remove_group",
        }
    }

    /// Checks that every id the operation refers to resolves in `root`.
    pub fn check_references(&self, root: &GraphNode) -> Result<()> {
        let node_exists = |id: &str| find_node(root, id).is_some();
        match self {
            Self::AddNode(args) => {
                if !node_exists(&args.parent_id) {
                    return Err(GraphError::ParentNotFound(args.parent_id.clone()));
                }
            }
            Self::DeleteNode(args) => {
                if !node_exists(&args.node_id) {
                    return Err(GraphError::NodeNotFound(args.node_id.clone()));
                }
            }
            Self::MoveNode(args) => {
                if !node_exists(&args.node_id) {
                    return Err(GraphError::NodeNotFound(args.node_id.clone()));
                }
                if !node_exists(&args.new_parent_id) {
                    return Err(GraphError::NewParentNotFound(args.new_parent_id.clone()));
                }
            }
            Self::AddEdge(args) => {
                if !node_exists(&args.source_id) {
                    return Err(GraphError::SourceNotFound(args.source_id.clone()));
                }
                if !node_exists(&args.target_id) {
                    return Err(GraphError::TargetNotFound(args.target_id.clone()));
                }
            }
            Self::DeleteEdge(args) => {
                if find_edge(root, &args.edge_id).is_none() {
                    return Err(GraphError::EdgeNotFound(args.edge_id.clone()));
                }
            }
            Self::MoveEdge(args) => {
                if find_edge(root, &args.edge_id).is_none() {
                    return Err(GraphError::EdgeNotFound(args.edge_id.clone()));
                }
                if !node_exists(&args.new_source_id) {
                    return Err(GraphError::SourceNotFound(args.new_source_id.clone()));
                }
                if !node_exists(&args.new_target_id) {
                    return Err(GraphError::TargetNotFound(args.new_target_id.clone()));
                }
            }
            Self::GroupNodes(args) => {
                if !node_exists(&args.parent_id) {
                    return Err(GraphError::ParentNotFound(args.parent_id.clone()));
                }
            }
            Self::RemoveGroup(args) => {
                if !node_exists(&args.group_id) {
                    return Err(GraphError::GroupNotFound(args.group_id.clone()));
                }
            }
        }
        Ok(())
    }

    /// Applies the operation to a fresh copy of `tree`.
    pub fn apply_to(&self, tree: &GraphNode) -> Result<GraphNode> {
        let mut next = tree.clone();
        self.apply_in_place(&mut next)?;
        Ok(next)
    }

    /// Applies the operation to `root`, which is left untouched on error.
    ///
    /// The `Some` note describes a partial or no-op outcome worth reporting to the agent.
    pub(crate) fn apply_in_place(&self, root: &mut GraphNode) -> Result<Option<String>> {
        match self {
            Self::AddNode(args) => {
                node::add_node(root, &args.nodename, &args.parent_id)?;
                Ok(None)
            }
            Self::DeleteNode(args) => {
                let dropped = node::delete_node(root, &args.node_id)?;
                Ok((dropped > 0).then(|| format!("removed {dropped} connected edge(s)")))
            }
            Self::MoveNode(args) => {
                let rehosted = node::move_node(root, &args.node_id, &args.new_parent_id)?;
                Ok((rehosted > 0).then(|| format!("re-hosted {rehosted} edge(s)")))
            }
            Self::AddEdge(args) => {
                edge::add_edge(
                    root,
                    &args.edge_id,
                    &args.source_id,
                    &args.target_id,
                    args.label.as_deref(),
                )?;
                Ok(None)
            }
            Self::DeleteEdge(args) => {
                let removed = edge::delete_edge(root, &args.edge_id);
                Ok((!removed).then(|| format!("edge '{}' not found, nothing removed", args.edge_id)))
            }
            Self::MoveEdge(args) => {
                let moved = edge::move_edge(
                    root,
                    &args.edge_id,
                    &args.new_source_id,
                    &args.new_target_id,
                )?;
                Ok((!moved).then(|| format!("edge '{}' not found, nothing moved", args.edge_id)))
            }
            Self::GroupNodes(args) => {
                let node_ids: Vec<&str> = args.node_ids.iter().map(String::as_str).collect();
                let outcome =
                    group::group_nodes(root, &node_ids, &args.parent_id, &args.group_id)?;
                if outcome.discarded() {
                    return Ok(Some(format!(
                        "group '{}' not created: none of the member ids resolved",
                        args.group_id
                    )));
                }
                Ok((!outcome.skipped.is_empty())
                    .then(|| format!("skipped members: {}", outcome.skipped.join(", "))))
            }
            Self::RemoveGroup(args) => {
                let promoted = group::remove_group(root, &args.group_id)?;
                Ok(Some(format!("promoted {} child node(s)", promoted.len())))
            }
        }
    }
}

fn decode<T: DeserializeOwned>(name: &str, args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| GraphError::invalid(name, e.to_string()))
}
