/// Modeling rules for architecture graphs, shared by the MCP instructions and the agent prompt.
pub const RULES: &str = "\
1. Node ids are unique across the whole graph. The id you pass to add_node is also the node's \
initial label, so pick short, readable ids (\"api\", \"userDb\", \"frontend\").\n\
2. Nest by containment. A cloud account contains its services, a service contains its components. \
Put a node under the thing it runs inside of, not next to it.\n\
3. One edge per relationship. Edges represent a dependency or interaction, not individual calls. \
Do not add \"response\" edges back to the caller.\n\
4. Arrow direction = dependency. The edge points from the initiator toward the provider \
(\"webapp\" -> \"api\" -> \"userDb\").\n\
5. Edge placement is automatic. Every edge lives on the nearest common ancestor of its endpoints, \
and the engine moves edges when nodes move. Never try to place an edge yourself.\n\
6. Create before you reference. add_node the endpoints before add_edge, and the parent before its \
children. Operations run in order, so a later operation may use ids created earlier in the same batch.\n\
7. Group instead of re-creating. To cluster existing nodes use group_nodes; to dissolve a cluster use \
remove_group. Deleting and re-adding loses every connected edge.\n\
8. Deleting a node deletes its whole subtree and every edge touching any node in it.\n\
9. The root node (id \"root\") cannot be deleted, moved or ungrouped.\n\
10. Edge ids are unique too. Use descriptive ids such as \"webapp-api\".\n";

/// The primitive operations with their argument names, one per line.
pub const OPERATIONS: &str = "\
add_node {nodename, parentId}: add a leaf node under parentId\n\
delete_node {nodeId}: delete a node, its subtree and every connected edge\n\
move_node {nodeId, newParentId}: re-parent a node with its subtree\n\
add_edge {edgeId, sourceId, targetId, label?}: connect two nodes\n\
delete_edge {edgeId}: remove an edge\n\
move_edge {edgeId, newSourceId, newTargetId}: reconnect an edge\n\
group_nodes {nodeIds, parentId, groupId}: wrap existing nodes in a new group under parentId\n\
remove_group {groupId}: dissolve a group, its children move to the group's parent\n";
