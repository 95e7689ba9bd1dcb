use rstest::{fixture, rstest};

use super::*;
use crate::invariants::check_invariants;
use crate::lookup::{find_edge, find_node, find_parent};
use crate::model::{GraphEdge, GraphNode};

#[fixture]
fn tree() -> GraphNode {
    GraphNode::root().with_children(vec![
        GraphNode::new("ui").with_children(vec![GraphNode::new("webapp")]),
        GraphNode::new("aws").with_children(vec![
            GraphNode::new("api"),
            GraphNode::new("lambda"),
            GraphNode::new("vector"),
            GraphNode::new("storage"),
        ]),
    ])
}

fn host_of<'a>(tree: &'a GraphNode, edge_id: &str) -> &'a str {
    find_edge(tree, edge_id)
        .map(|(_, host)| host.id.as_str())
        .expect("edge hosted somewhere")
}

fn child_ids(node: &GraphNode) -> Vec<&str> {
    node.children.iter().map(|child| child.id.as_str()).collect()
}

#[rstest]
fn add_node_appends_leaf(tree: GraphNode) {
    let next = add_node(&tree, "queue", "aws").expect("add");
    let aws = find_node(&next, "aws").expect("aws");
    assert_eq!(child_ids(aws).last(), Some(&"queue"));
    let queue = find_node(&next, "queue").expect("queue");
    assert_eq!(queue.label, "queue");
    assert!(queue.is_leaf());
    assert!(find_node(&tree, "queue").is_none());
}

#[rstest]
fn add_node_errors(tree: GraphNode) {
    assert_eq!(
        add_node(&tree, "queue", "gcp"),
        Err(GraphError::ParentNotFound("gcp".into()))
    );
    assert_eq!(
        add_node(&tree, "api", "ui"),
        Err(GraphError::DuplicateNodeId("api".into()))
    );
    assert!(matches!(
        add_node(&tree, "  ", "ui"),
        Err(GraphError::InvalidArguments { .. })
    ));
}

#[rstest]
fn edge_follows_moved_node(tree: GraphNode) {
    let with_edge = add_edge(&tree, "e0", "webapp", "api").expect("add edge");
    assert_eq!(host_of(&with_edge, "e0"), "root");

    let moved = move_node(&with_edge, "webapp", "aws").expect("move");
    assert_eq!(host_of(&moved, "e0"), "aws");
    assert!(find_node(&moved, "root").expect("root").edges.is_empty());
    assert!(check_invariants(&moved).is_empty());
}

#[rstest]
fn edge_between_siblings_is_hosted_by_parent(tree: GraphNode) {
    let next = add_labeled_edge(&tree, "e1", "api", "lambda", "invokes").expect("add");
    assert_eq!(host_of(&next, "e1"), "aws");
    let (edge, _) = find_edge(&next, "e1").expect("e1");
    assert_eq!(edge.label.as_deref(), Some("invokes"));
}

#[rstest]
fn self_loop_is_hosted_by_the_node(tree: GraphNode) {
    let next = add_edge(&tree, "loop", "api", "api").expect("add");
    assert_eq!(host_of(&next, "loop"), "api");
}

#[rstest]
#[case("nope", "api", GraphError::SourceNotFound("nope".into()))]
#[case("api", "nope", GraphError::TargetNotFound("nope".into()))]
fn add_edge_rejects_unknown_endpoints(
    tree: GraphNode,
    #[case] source: &str,
    #[case] target: &str,
    #[case] expected: GraphError,
) {
    assert_eq!(add_edge(&tree, "e1", source, target), Err(expected));
}

#[rstest]
fn add_edge_rejects_duplicate_id(tree: GraphNode) {
    let next = add_edge(&tree, "e1", "api", "lambda").expect("add");
    assert_eq!(
        add_edge(&next, "e1", "webapp", "api"),
        Err(GraphError::DuplicateEdgeId("e1".into()))
    );
}

#[rstest]
fn delete_node_cascades_over_subtree(tree: GraphNode) {
    let next = add_edge(&tree, "e0", "webapp", "api").expect("e0");
    let next = add_edge(&next, "e1", "api", "lambda").expect("e1");
    let next = add_edge(&next, "e2", "ui", "lambda").expect("e2");

    let deleted = delete_node(&next, "ui").expect("delete");
    assert!(find_node(&deleted, "ui").is_none());
    assert!(find_node(&deleted, "webapp").is_none());
    assert!(find_edge(&deleted, "e0").is_none());
    assert!(find_edge(&deleted, "e2").is_none());
    assert_eq!(host_of(&deleted, "e1"), "aws");
    assert!(check_invariants(&deleted).is_empty());
}

#[rstest]
fn delete_node_errors(tree: GraphNode) {
    assert_eq!(
        delete_node(&tree, "root"),
        Err(GraphError::CannotDeleteRoot("root".into()))
    );
    assert_eq!(
        delete_node(&tree, "ghost"),
        Err(GraphError::NodeNotFound("ghost".into()))
    );
}

#[rstest]
fn move_node_errors(tree: GraphNode) {
    assert_eq!(
        move_node(&tree, "root", "aws"),
        Err(GraphError::CannotMoveRoot("root".into()))
    );
    assert_eq!(
        move_node(&tree, "ghost", "aws"),
        Err(GraphError::NodeNotFound("ghost".into()))
    );
    assert_eq!(
        move_node(&tree, "api", "gcp"),
        Err(GraphError::NewParentNotFound("gcp".into()))
    );
    assert_eq!(
        move_node(&tree, "aws", "api"),
        Err(GraphError::MoveIntoOwnSubtree {
            node_id: "aws".into(),
            new_parent_id: "api".into(),
        })
    );
}

#[rstest]
fn delete_edge_is_noop_for_unknown_id(tree: GraphNode) {
    let next = add_edge(&tree, "e1", "api", "lambda").expect("add");
    assert_eq!(delete_edge(&next, "ghost"), next);
    let removed = delete_edge(&next, "e1");
    assert!(find_edge(&removed, "e1").is_none());
}

#[rstest]
fn move_edge_rewrites_endpoints_and_rehosts(tree: GraphNode) {
    let next = add_edge(&tree, "e1", "api", "lambda").expect("add");
    let moved = move_edge(&next, "e1", "webapp", "lambda").expect("move");
    let (edge, host) = find_edge(&moved, "e1").expect("e1");
    assert_eq!(edge.sources, vec!["webapp"]);
    assert_eq!(edge.targets, vec!["lambda"]);
    assert_eq!(host.id, "root");

    assert_eq!(move_edge(&next, "ghost", "api", "lambda"), Ok(next.clone()));
    assert_eq!(
        move_edge(&next, "e1", "api", "nope"),
        Err(GraphError::TargetNotFound("nope".into()))
    );
}

#[rstest]
fn group_wraps_members_under_parent(tree: GraphNode) {
    let next = group_nodes(&tree, &["vector", "storage"], "aws", "dataStore").expect("group");
    let aws = find_node(&next, "aws").expect("aws");
    assert_eq!(child_ids(aws), vec!["api", "lambda", "dataStore"]);
    let group = find_node(&next, "dataStore").expect("group");
    assert_eq!(child_ids(group), vec!["vector", "storage"]);
}

#[rstest]
fn group_pulls_members_from_anywhere_and_rehosts(tree: GraphNode) {
    let next = add_edge(&tree, "e0", "webapp", "api").expect("e0");
    let next = group_nodes(&next, &["webapp", "api"], "root", "frontDoor").expect("group");
    assert_eq!(find_parent(&next, "webapp").map(|p| p.id.as_str()), Some("frontDoor"));
    assert_eq!(host_of(&next, "e0"), "frontDoor");
    assert!(check_invariants(&next).is_empty());
}

#[rstest]
fn group_skips_unresolvable_members(tree: GraphNode) {
    let next = group_nodes(&tree, &["ghost", "aws", "api"], "aws", "g").expect("group");
    let group = find_node(&next, "g").expect("group");
    assert_eq!(child_ids(group), vec!["api"]);

    let unchanged = group_nodes(&tree, &["ghost"], "aws", "g").expect("group");
    assert_eq!(unchanged, tree);
}

#[rstest]
fn group_errors(tree: GraphNode) {
    assert_eq!(
        group_nodes(&tree, &["api"], "gcp", "g"),
        Err(GraphError::ParentNotFound("gcp".into()))
    );
    assert_eq!(
        group_nodes(&tree, &["api"], "aws", "lambda"),
        Err(GraphError::DuplicateNodeId("lambda".into()))
    );
}

#[rstest]
fn group_round_trip(tree: GraphNode) {
    let ids = ["vector", "storage"];
    let with_edge = add_edge(&tree, "e1", "vector", "storage").expect("edge");
    let grouped = group_nodes(&with_edge, &ids, "aws", "dataStore").expect("group");
    assert_eq!(host_of(&grouped, "e1"), "dataStore");

    let ungrouped = remove_group(&grouped, "dataStore").expect("ungroup");
    assert!(find_node(&ungrouped, "dataStore").is_none());
    let aws = find_node(&ungrouped, "aws").expect("aws");
    for id in ids {
        assert!(child_ids(aws).contains(&id), "{id} back under aws");
    }
    assert_eq!(host_of(&ungrouped, "e1"), "aws");
    assert!(check_invariants(&ungrouped).is_empty());
}

#[rstest]
fn remove_group_drops_edges_to_the_group(tree: GraphNode) {
    let grouped = group_nodes(&tree, &["vector"], "aws", "g").expect("group");
    let grouped = add_edge(&grouped, "e1", "api", "g").expect("edge");
    let ungrouped = remove_group(&grouped, "g").expect("ungroup");
    assert!(find_edge(&ungrouped, "e1").is_none());
}

#[rstest]
fn remove_group_errors(tree: GraphNode) {
    assert_eq!(
        remove_group(&tree, "root"),
        Err(GraphError::CannotUngroupRoot("root".into()))
    );
    assert_eq!(
        remove_group(&tree, "ghost"),
        Err(GraphError::GroupNotFound("ghost".into()))
    );
}

#[rstest]
fn reattach_is_idempotent(tree: GraphNode) {
    let mut next = add_edge(&tree, "e0", "webapp", "api").expect("edge");
    // Simulate a raw relocation that skipped re-hosting.
    let webapp = detach(&mut next, "webapp").expect("webapp");
    next.children[1].children.push(webapp);

    assert_eq!(reattach_edges(&mut next, "webapp"), 1);
    let once = next.clone();
    assert_eq!(reattach_edges(&mut next, "webapp"), 0);
    assert_eq!(next, once);
    assert_eq!(host_of(&next, "e0"), "aws");
}

#[rstest]
fn failed_operation_keeps_caller_tree(tree: GraphNode) {
    let snapshot = tree.clone();
    let _ = move_node(&tree, "aws", "api");
    let _ = add_edge(&tree, "e1", "api", "nope");
    assert_eq!(tree, snapshot);
}

#[test]
fn multi_endpoint_edge_hosted_at_common_ancestor_of_all() {
    let mut edge = GraphEdge::new("fan", "a", "b");
    edge.targets.push("c".into());
    let mut tree = GraphNode::root().with_children(vec![
        GraphNode::new("x").with_children(vec![GraphNode::new("a"), GraphNode::new("b")]),
        GraphNode::new("c"),
    ]);
    tree.children[0].edges.push(edge);
    assert_eq!(reattach_edges(&mut tree, "c"), 1);
    assert_eq!(host_of(&tree, "fan"), "root");
}
