use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use archgraph_core::operation::{
    AddEdgeArgs, AddNodeArgs, DeleteEdgeArgs, DeleteNodeArgs, GroupNodesArgs, MoveEdgeArgs,
    MoveNodeArgs, RemoveGroupArgs,
};
use archgraph_core::{check_invariants, GraphNode, GraphSession, Operation, RawOperation};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_GRAPH: &str = "default";

// --- Request types ---

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct GraphRequest {
    /// Name of the graph to work on. Defaults to "default".
    #[serde(default)]
    pub graph: Option<String>,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ResetGraphRequest {
    /// Name of the graph to reset. Defaults to "default".
    #[serde(default)]
    pub graph: Option<String>,
    /// The complete tree as a JSON string: {id: "root", children: [...], edges: [...]}.
    /// Omit to start from an empty root.
    #[serde(default)]
    pub tree: Option<String>,
}

/// A primitive's arguments plus the graph they apply to.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct OnGraph<A> {
    /// Name of the graph to work on. Defaults to "default".
    #[serde(default)]
    pub graph: Option<String>,
    #[serde(flatten)]
    pub args: A,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct BatchUpdateRequest {
    /// Name of the graph to work on. Defaults to "default".
    #[serde(default)]
    pub graph: Option<String>,
    /// Operations to run in order, each {name, args}, e.g.
    /// {"name": "add_node", "args": {"nodename": "api", "parentId": "root"}}
    pub operations: Vec<RawOperation>,
}

// --- Server ---

#[derive(Clone)]
pub struct ArchgraphServer {
    graphs: Arc<Mutex<HashMap<String, GraphSession>>>,
    tool_router: ToolRouter<Self>,
}

impl Default for ArchgraphServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl ArchgraphServer {
    pub fn new() -> Self {
        Self {
            graphs: Arc::new(Mutex::new(HashMap::new())),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "List the graphs held by this server with their node and edge counts")]
    fn list_graphs(&self) -> Result<CallToolResult, McpError> {
        let graphs = self.graphs.lock().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = graphs
            .iter()
            .map(|(name, session)| {
                format!(
                    "{name} (revision {}, {} nodes, {} edges)",
                    session.revision(),
                    session.tree().node_count(),
                    session.tree().edge_count()
                )
            })
            .collect();
        names.sort();
        let text = if names.is_empty() {
            "No graphs yet. Any tool call creates the graph it names.".to_string()
        } else {
            names.join("\n")
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        description = "Get the full tree of a graph as JSON: {id, label, children?: [...], edges?: [{id, sources, targets, label?}]}. Every edge is listed on the nearest common ancestor of its endpoints."
    )]
    fn get_graph(
        &self,
        Parameters(req): Parameters<GraphRequest>,
    ) -> Result<CallToolResult, McpError> {
        let text = self.with_session(req.graph.as_deref(), |session| {
            tree_text(
                format!("Graph at revision {}", session.revision()),
                session.tree(),
            )
        });
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        description = "Replace a graph with the given tree, or with an empty root when no tree is passed. The tree is rejected if node or edge ids repeat, an edge references a missing node, or an edge is not on the nearest common ancestor of its endpoints."
    )]
    fn reset_graph(
        &self,
        Parameters(req): Parameters<ResetGraphRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond(self.reset(req.graph.as_deref(), req.tree.as_deref())))
    }

    #[tool(description = "Check a graph's structural invariants and list any violations")]
    fn validate_graph(
        &self,
        Parameters(req): Parameters<GraphRequest>,
    ) -> Result<CallToolResult, McpError> {
        let text = self.with_session(req.graph.as_deref(), |session| {
            let violations = check_invariants(session.tree());
            if violations.is_empty() {
                "No invariant violations.".to_string()
            } else {
                violations
                    .iter()
                    .map(|v| format!("- {v}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        });
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(description = "Get the modeling rules and the list of operations with their arguments")]
    fn get_rules(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(format!(
            "{}\n## Operations\n{}",
            archgraph_core::RULES,
            archgraph_core::OPERATIONS
        ))]))
    }

    #[tool(
        description = "Add a leaf node under parentId. nodename becomes both the id and the label and must not exist yet."
    )]
    fn add_node(
        &self,
        Parameters(req): Parameters<OnGraph<AddNodeArgs>>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond(self.apply(req.graph.as_deref(), Operation::AddNode(req.args))))
    }

    #[tool(
        description = "Delete a node together with its whole subtree and every edge connected to any deleted node"
    )]
    fn delete_node(
        &self,
        Parameters(req): Parameters<OnGraph<DeleteNodeArgs>>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond(self.apply(req.graph.as_deref(), Operation::DeleteNode(req.args))))
    }

    #[tool(
        description = "Move a node (with its subtree) under newParentId. Connected edges are moved to their new nearest common ancestor automatically."
    )]
    fn move_node(
        &self,
        Parameters(req): Parameters<OnGraph<MoveNodeArgs>>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond(self.apply(req.graph.as_deref(), Operation::MoveNode(req.args))))
    }

    #[tool(
        description = "Connect sourceId to targetId with a new edge. The edge is placed on the nearest common ancestor of both nodes."
    )]
    fn add_edge(
        &self,
        Parameters(req): Parameters<OnGraph<AddEdgeArgs>>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond(self.apply(req.graph.as_deref(), Operation::AddEdge(req.args))))
    }

    #[tool(description = "Delete an edge. Deleting an unknown edge changes nothing.")]
    fn delete_edge(
        &self,
        Parameters(req): Parameters<OnGraph<DeleteEdgeArgs>>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond(self.apply(req.graph.as_deref(), Operation::DeleteEdge(req.args))))
    }

    #[tool(description = "Reconnect an existing edge to new source and target nodes")]
    fn move_edge(
        &self,
        Parameters(req): Parameters<OnGraph<MoveEdgeArgs>>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond(self.apply(req.graph.as_deref(), Operation::MoveEdge(req.args))))
    }

    #[tool(
        description = "Wrap existing nodes, wherever they are, in a new group node under parentId. Ids that do not resolve are skipped; if none resolves no group is created."
    )]
    fn group_nodes(
        &self,
        Parameters(req): Parameters<OnGraph<GroupNodesArgs>>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond(self.apply(req.graph.as_deref(), Operation::GroupNodes(req.args))))
    }

    #[tool(
        description = "Dissolve a group: its children move up to the group's parent and the group node is removed. Edges to the group itself are removed."
    )]
    fn remove_group(
        &self,
        Parameters(req): Parameters<OnGraph<RemoveGroupArgs>>,
    ) -> Result<CallToolResult, McpError> {
        Ok(respond(self.apply(req.graph.as_deref(), Operation::RemoveGroup(req.args))))
    }

    #[tool(
        description = "Run several operations in order. Each operation's references are checked against the graph as it is at that point; failed operations are reported and skipped, the rest are kept. Returns a summary, per-operation results and the resulting tree."
    )]
    fn batch_update(
        &self,
        Parameters(req): Parameters<BatchUpdateRequest>,
    ) -> Result<CallToolResult, McpError> {
        let text = self.batch(req.graph.as_deref(), &req.operations);
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

impl ArchgraphServer {
    fn with_session<T>(&self, graph: Option<&str>, f: impl FnOnce(&mut GraphSession) -> T) -> T {
        let mut graphs = self.graphs.lock().unwrap_or_else(PoisonError::into_inner);
        let session = graphs
            .entry(graph.unwrap_or(DEFAULT_GRAPH).to_string())
            .or_default();
        f(session)
    }

    fn apply(&self, graph: Option<&str>, op: Operation) -> Result<String, String> {
        let name = op.name();
        self.with_session(graph, |session| match session.apply(&op) {
            Ok(note) => {
                debug!(op = name, revision = session.revision(), "operation applied");
                let line = match note {
                    Some(note) => format!("{name}: ok ({note})"),
                    None => format!("{name}: ok"),
                };
                Ok(tree_text(line, session.tree()))
            }
            Err(e) => Err(format!("{name} failed: {e}. The graph is unchanged.")),
        })
    }

    fn reset(&self, graph: Option<&str>, tree: Option<&str>) -> Result<String, String> {
        let tree = match tree {
            Some(raw) => serde_json::from_str::<GraphNode>(raw)
                .map_err(|e| format!("Invalid graph JSON: {e}"))?,
            None => GraphNode::root(),
        };
        self.with_session(graph, |session| {
            session.reset(tree).map_err(|e| e.to_string())?;
            info!(revision = session.revision(), "graph reset");
            Ok(tree_text(
                format!("Graph reset, revision {}", session.revision()),
                session.tree(),
            ))
        })
    }

    fn batch(&self, graph: Option<&str>, operations: &[RawOperation]) -> String {
        self.with_session(graph, |session| {
            let report = session.apply_batch(operations);
            let results = serde_json::to_string_pretty(&report.results)
                .unwrap_or_else(|e| format!("Serialization error: {e}"));
            tree_text(
                format!("{}\n\nResults:\n{results}", report.summary()),
                session.tree(),
            )
        })
    }
}

fn respond(outcome: Result<String, String>) -> CallToolResult {
    match outcome {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => CallToolResult::error(vec![Content::text(e)]),
    }
}

fn tree_text(headline: String, tree: &GraphNode) -> String {
    let json = serde_json::to_string_pretty(tree)
        .unwrap_or_else(|e| format!("Serialization error: {e}"));
    format!("{headline}\n\nGraph:\n{json}")
}

const INSTRUCTIONS: &str = r#"Archgraph holds hierarchical architecture graphs: a tree of nodes (systems, services, components, groups) rooted at "root", plus directed edges between nodes.

## Workflow
1. Call `get_graph` to see the current tree before editing it.
2. Prefer `batch_update` for anything larger than a single change. Operations run in order and may refer to ids created earlier in the same batch.
3. Read the summary of every response. Failed operations name the id and role that did not resolve; fix the reference and retry only those operations.
4. Every successful response contains the complete resulting tree. Use it as the source of truth for the next step instead of your memory of earlier turns.

Call `get_rules` for the full modeling rules and the list of operations."#;

#[tool_handler]
impl ServerHandler for ArchgraphServer {
    fn get_info(&self) -> ServerInfo {
        let instructions = format!(
            "{}\n\n## Modeling Rules\n{}",
            INSTRUCTIONS,
            archgraph_core::RULES
        );
        ServerInfo {
            instructions: Some(instructions.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archgraph_core::find_node;
    use serde_json::json;

    fn tree_of(server: &ArchgraphServer, graph: Option<&str>) -> GraphNode {
        server.with_session(graph, |session| session.tree().clone())
    }

    fn add_node(nodename: &str, parent_id: &str) -> Operation {
        Operation::AddNode(AddNodeArgs {
            nodename: nodename.into(),
            parent_id: parent_id.into(),
        })
    }

    #[test]
    fn success_returns_whole_tree() {
        let server = ArchgraphServer::new();
        let text = server.apply(None, add_node("aws", "root")).expect("apply");
        assert!(text.starts_with("add_node: ok"));
        let json = text.split("Graph:\n").nth(1).expect("tree section");
        let tree: GraphNode = serde_json::from_str(json).expect("tree json");
        assert!(find_node(&tree, "aws").is_some());
    }

    #[test]
    fn failure_names_the_reference_and_keeps_the_graph() {
        let server = ArchgraphServer::new();
        let err = server
            .apply(None, add_node("api", "nonexistent"))
            .expect_err("missing parent");
        assert_eq!(
            err,
            "add_node failed: parent node 'nonexistent' not found. The graph is unchanged."
        );
        assert_eq!(tree_of(&server, None), GraphNode::root());
    }

    #[test]
    fn tool_errors_are_flagged() {
        let server = ArchgraphServer::new();
        let result = server
            .remove_group(Parameters(OnGraph {
                graph: None,
                args: RemoveGroupArgs {
                    group_id: "ghost".into(),
                },
            }))
            .expect("tool result");
        assert_eq!(result.is_error, Some(true));
    }

    #[test]
    fn graphs_are_independent() {
        let server = ArchgraphServer::new();
        server.apply(Some("a"), add_node("api", "root")).expect("apply");
        assert!(find_node(&tree_of(&server, Some("a")), "api").is_some());
        assert!(find_node(&tree_of(&server, Some("b")), "api").is_none());
    }

    #[test]
    fn batch_reports_mixed_outcome() {
        let server = ArchgraphServer::new();
        let text = server.batch(
            None,
            &[
                RawOperation::new("add_node", json!({"nodename": "A", "parentId": "root"})),
                RawOperation::new("add_node", json!({"nodename": "B", "parentId": "nonexistent"})),
                RawOperation::new("add_edge", json!({"edgeId": "e1", "sourceId": "A", "targetId": "root"})),
            ],
        );
        assert!(text.starts_with("2 succeeded, 1 failed"));
        assert!(text.contains("\"status\": \"error\""));
        let tree = tree_of(&server, None);
        assert!(find_node(&tree, "A").is_some());
        assert!(archgraph_core::find_edge(&tree, "e1").is_some());
    }

    #[test]
    fn reset_validates_input() {
        let server = ArchgraphServer::new();
        let bad = json!({"id": "root", "children": [{"id": "a"}, {"id": "a"}]}).to_string();
        let err = server.reset(None, Some(&bad)).expect_err("duplicate ids");
        assert!(err.contains("used twice"), "{err}");

        let good = json!({
            "id": "root",
            "children": [{"id": "a", "x": 10}, {"id": "b"}],
            "edges": [{"id": "e0", "sources": ["a"], "targets": ["b"]}]
        })
        .to_string();
        server.reset(None, Some(&good)).expect("valid tree");
        let tree = tree_of(&server, None);
        assert_eq!(tree.children[0].extra.get("x"), Some(&json!(10)));
    }

    #[test]
    fn schemas_flatten_primitive_args() {
        let schema = schemars::schema_for!(OnGraph<AddNodeArgs>);
        let value = serde_json::to_value(&schema).expect("schema json");
        let properties = value["properties"].as_object().expect("properties");
        assert!(properties.contains_key("graph"));
        assert!(properties.contains_key("nodename"));
        assert!(properties.contains_key("parentId"));
    }
}
