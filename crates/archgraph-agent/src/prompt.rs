use archgraph_core::{BatchReport, GraphNode, OPERATIONS, RULES};

use crate::TurnContext;

/// Convert a tree to a compact indented outline for LLM consumption.
pub fn outline(tree: &GraphNode) -> String {
    let mut out = String::with_capacity(1024);
    outline_node(&mut out, tree, 0);
    out
}

fn outline_node(out: &mut String, node: &GraphNode, depth: usize) {
    out.push_str(&"  ".repeat(depth));
    out.push_str("- ");
    out.push_str(&node.id);
    if !node.label.is_empty() && node.label != node.id {
        out.push_str(" \"");
        out.push_str(&node.label);
        out.push('"');
    }
    out.push('\n');
    for edge in &node.edges {
        out.push_str(&"  ".repeat(depth + 1));
        out.push_str("~ ");
        out.push_str(&edge.id);
        out.push_str(": ");
        out.push_str(&edge.sources.join(","));
        out.push_str(" --");
        if let Some(label) = &edge.label {
            out.push('[');
            out.push_str(label);
            out.push(']');
        }
        out.push_str("--> ");
        out.push_str(&edge.targets.join(","));
        out.push('\n');
    }
    for child in &node.children {
        outline_node(out, child, depth + 1);
    }
}

pub fn system_prompt() -> String {
    format!(
        "You edit a hierarchical architecture diagram by emitting function calls. \
The diagram is a tree of nodes rooted at \"root\"; edges connect nodes anywhere in the tree.\n\n\
Available functions (arguments in braces):\n{OPERATIONS}\n\
Output ONLY a JSON array of calls. \
Each item: {{\"name\":\"<function>\",\"args\":{{...}}}}. \
Calls run in order, so later calls may use ids created by earlier ones. \
Only reference ids that exist in the current graph or that you create earlier in the same array. \
If the request needs no change, output [].\n\n\
## Modeling Rules\n{RULES}\n\
Output ONLY the JSON array, nothing else."
    )
}

pub fn user_message(ctx: &TurnContext, request: &str) -> String {
    let mut out = String::with_capacity(4096);

    if !ctx.history.is_empty() {
        out.push_str("PREVIOUS TURNS:\n");
        for exchange in &ctx.history {
            out.push_str("request: ");
            out.push_str(&exchange.request);
            out.push('\n');
            out.push_str("result: ");
            out.push_str(&exchange.feedback);
            out.push('\n');
        }
        out.push('\n');
    }

    out.push_str("CURRENT GRAPH (outline):\n");
    out.push_str(&outline(&ctx.graph));
    out.push_str("\nCURRENT GRAPH (JSON):\n");
    out.push_str(
        &serde_json::to_string(&ctx.graph).unwrap_or_else(|e| format!("Serialization error: {e}")),
    );
    out.push_str("\n\nREQUEST:\n");
    out.push_str(request);
    out
}

/// What the model is told about its previous calls, so it can correct failed references.
pub fn feedback_message(report: &BatchReport) -> String {
    if report.results.is_empty() {
        return "No operations were applied.".to_string();
    }
    let mut out = report.summary();
    let notes: Vec<String> = report
        .results
        .iter()
        .filter_map(|r| {
            r.note
                .as_ref()
                .map(|note| format!("operation {} ({}): {note}", r.operation_index + 1, r.name))
        })
        .collect();
    if !notes.is_empty() {
        out.push_str(". Notes: ");
        out.push_str(&notes.join("; "));
    }
    if report.failed() > 0 {
        out.push_str(". Failed operations changed nothing; retry them with corrected ids.");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Exchange;
    use archgraph_core::{batch_update_validated, GraphEdge, RawOperation};
    use serde_json::json;

    fn sample() -> GraphNode {
        GraphNode::root().with_children(vec![
            GraphNode::new("aws")
                .with_label("AWS")
                .with_children(vec![GraphNode::new("api"), GraphNode::new("db")])
                .with_edges(vec![GraphEdge::new("e0", "api", "db").with_label("reads")]),
        ])
    }

    #[test]
    fn outline_nests_nodes_and_edges() {
        assert_eq!(
            outline(&sample()),
            "- root\n  - aws \"AWS\"\n    ~ e0: api --[reads]--> db\n    - api\n    - db\n"
        );
    }

    #[test]
    fn system_prompt_lists_every_operation() {
        let prompt = system_prompt();
        for name in archgraph_core::Operation::NAMES {
            assert!(prompt.contains(name), "{name}");
        }
    }

    #[test]
    fn user_message_carries_history_graph_and_request() {
        let ctx = TurnContext {
            graph: sample(),
            history: vec![Exchange {
                request: "add a database".into(),
                reply: "[]".into(),
                feedback: "1 succeeded, 0 failed".into(),
            }],
        };
        let msg = user_message(&ctx, "connect api to db");
        assert!(msg.starts_with("PREVIOUS TURNS:\nrequest: add a database\n"));
        assert!(msg.contains("\"id\":\"aws\""));
        assert!(msg.ends_with("REQUEST:\nconnect api to db"));
    }

    #[test]
    fn feedback_lists_failures_and_notes() {
        let report = batch_update_validated(
            &GraphNode::root(),
            &[
                RawOperation::new("add_node", json!({"nodename": "a", "parentId": "root"})),
                RawOperation::new("delete_node", json!({"nodeId": "b"})),
            ],
        );
        let feedback = feedback_message(&report);
        assert!(feedback.starts_with("1 succeeded, 1 failed: operation 2 (delete_node): node 'b' not found"));
        assert!(feedback.ends_with("retry them with corrected ids."));
    }
}
