//! # Traversal
//!
//! Kind-agnostic graph walks: bounded BFS subgraph extraction, fewest-edge
//! paths and undirected connected components.

use crate::graph::{Graph, GraphStore};
use crate::primitives::MAX_TRAVERSAL_DEPTH;
use crate::{Direction, Edge, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Result of a bounded traversal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subgraph {
    /// Every node reached within the depth bound, including the start.
    pub nodes: BTreeSet<NodeId>,
    /// Edges seen while expanding, restricted to those whose endpoints are
    /// both in `nodes`. Ordered by discovery.
    pub edges: Vec<Edge>,
}

impl Subgraph {
    /// Check if the traversal reached nothing (unknown start).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Generic traversal queries over a graph.
pub struct Traversal;

impl Traversal {
    /// BFS from `start` along outgoing edges of any kind, up to `depth` hops.
    ///
    /// A node first reached at hop `depth` is included but not expanded.
    /// The depth is clamped to `MAX_TRAVERSAL_DEPTH`. An unknown start
    /// yields an empty subgraph.
    pub fn traverse(graph: &Graph, start: &str, depth: usize) -> Subgraph {
        let depth = depth.min(MAX_TRAVERSAL_DEPTH);
        if !graph.node_exists(start) {
            return Subgraph::default();
        }

        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        let mut encountered = Vec::new();

        visited.insert(NodeId::new(start));
        queue.push_back((NodeId::new(start), 0usize));

        while let Some((current, current_depth)) = queue.pop_front() {
            if current_depth >= depth {
                continue;
            }

            for edge in graph.edges_of(current.as_str(), Direction::Out, None) {
                encountered.push(edge.clone());

                if visited.insert(edge.target.clone()) {
                    queue.push_back((edge.target.clone(), current_depth.saturating_add(1)));
                }
            }
        }

        encountered.retain(|edge| visited.contains(edge.target.as_str()));
        Subgraph {
            nodes: visited,
            edges: encountered,
        }
    }

    /// Fewest-edge path from `a` to `b` along outgoing edges of any kind.
    ///
    /// Returns the edge sequence (empty when `a == b`), or `None` when no
    /// route exists or either node is missing.
    pub fn find_path(graph: &Graph, a: &str, b: &str) -> Option<Vec<Edge>> {
        if !graph.node_exists(a) || !graph.node_exists(b) {
            return None;
        }
        if a == b {
            return Some(Vec::new());
        }

        // node -> edge that first reached it
        let mut via: BTreeMap<NodeId, Edge> = BTreeMap::new();
        let mut queue = VecDeque::new();
        queue.push_back(NodeId::new(a));

        while let Some(current) = queue.pop_front() {
            for edge in graph.edges_of(current.as_str(), Direction::Out, None) {
                if edge.target == *a || via.contains_key(edge.target.as_str()) {
                    continue;
                }
                via.insert(edge.target.clone(), edge.clone());
                if edge.target == *b {
                    return Some(unwind_edges(&via, a, b));
                }
                queue.push_back(edge.target.clone());
            }
        }
        None
    }

    /// Partition all nodes into components, treating every edge as
    /// undirected regardless of kind. Isolated nodes are singletons.
    ///
    /// Components are ordered by their smallest member.
    pub fn connected_components(graph: &Graph) -> Vec<BTreeSet<NodeId>> {
        let ids: Vec<NodeId> = graph.list_nodes().into_iter().collect();
        let position: BTreeMap<&str, usize> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let mut sets = DisjointSets::new(ids.len());
        for edge in graph.edges() {
            if let (Some(&s), Some(&t)) = (
                position.get(edge.source.as_str()),
                position.get(edge.target.as_str()),
            ) {
                sets.union(s, t);
            }
        }

        let mut groups: BTreeMap<usize, BTreeSet<NodeId>> = BTreeMap::new();
        for (i, id) in ids.iter().enumerate() {
            groups.entry(sets.find(i)).or_default().insert(id.clone());
        }

        let mut components: Vec<BTreeSet<NodeId>> = groups.into_values().collect();
        components.sort_by(|x, y| x.first().cmp(&y.first()));
        components
    }
}

/// Rebuild the edge path ending at `end` out of BFS parent edges.
fn unwind_edges(via: &BTreeMap<NodeId, Edge>, start: &str, end: &str) -> Vec<Edge> {
    let mut path = Vec::new();
    let mut current = end;
    while current != start {
        let Some(edge) = via.get(current) else {
            break;
        };
        path.push(edge.clone());
        current = edge.source.as_str();
    }
    path.reverse();
    path
}

/// Union-find over dense indices with path halving and union by size.
struct DisjointSets {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] = self.size[ra].saturating_add(self.size[rb]);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EdgeKind;
    use serde_json::json;

    fn set(list: &[&str]) -> BTreeSet<NodeId> {
        list.iter().map(|s| NodeId::new(*s)).collect()
    }

    fn graph_with(ids: &[&str], edges: &[(&str, EdgeKind, &str)]) -> Graph {
        let mut graph = Graph::new();
        for id in ids {
            graph.add_node(NodeId::new(*id), json!(null));
        }
        for (s, k, t) in edges {
            graph
                .add_edge(Edge::new(*s, k.clone(), *t), false)
                .expect("edge");
        }
        graph
    }

    /// a -> b -> c -> d with mixed kinds, plus isolated z
    fn linear() -> Graph {
        graph_with(
            &["a", "b", "c", "d", "z"],
            &[
                ("a", EdgeKind::Uses, "b"),
                ("b", EdgeKind::IsA, "c"),
                ("c", EdgeKind::HasA, "d"),
            ],
        )
    }

    #[test]
    fn traverse_respects_depth() {
        let graph = linear();
        assert_eq!(Traversal::traverse(&graph, "a", 0).nodes, set(&["a"]));
        assert_eq!(Traversal::traverse(&graph, "a", 1).nodes, set(&["a", "b"]));
        assert_eq!(
            Traversal::traverse(&graph, "a", 2).nodes,
            set(&["a", "b", "c"])
        );
    }

    #[test]
    fn traverse_edges_stay_inside_visited_set() {
        let graph = linear();
        let sub = Traversal::traverse(&graph, "a", 2);
        assert_eq!(sub.edges.len(), 2);
        assert!(
            sub.edges
                .iter()
                .all(|e| sub.nodes.contains(e.source.as_str()) && sub.nodes.contains(e.target.as_str()))
        );
    }

    #[test]
    fn traverse_follows_outgoing_only() {
        let graph = linear();
        assert_eq!(Traversal::traverse(&graph, "c", 5).nodes, set(&["c", "d"]));
    }

    #[test]
    fn traverse_unknown_start_is_empty() {
        let graph = linear();
        assert!(Traversal::traverse(&graph, "ghost", 3).is_empty());
    }

    #[test]
    fn traverse_handles_cycles() {
        let graph = graph_with(
            &["a", "b", "c"],
            &[
                ("a", EdgeKind::RelatedTo, "b"),
                ("b", EdgeKind::RelatedTo, "c"),
                ("c", EdgeKind::RelatedTo, "a"),
            ],
        );
        let sub = Traversal::traverse(&graph, "a", 10);
        assert_eq!(sub.nodes, set(&["a", "b", "c"]));
        assert_eq!(sub.edges.len(), 3);
    }

    #[test]
    fn find_path_returns_shortest_edge_sequence() {
        let graph = linear();
        let path = Traversal::find_path(&graph, "a", "c").expect("path");
        assert_eq!(path.len(), 2);
        assert_eq!(path[0].source, "a");
        assert_eq!(path[1].target, "c");
    }

    #[test]
    fn find_path_prefers_fewer_hops() {
        let graph = graph_with(
            &["a", "b", "c"],
            &[
                ("a", EdgeKind::Uses, "b"),
                ("b", EdgeKind::Uses, "c"),
                ("a", EdgeKind::RelatedTo, "c"),
            ],
        );
        let path = Traversal::find_path(&graph, "a", "c").expect("path");
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].kind, EdgeKind::RelatedTo);
    }

    #[test]
    fn find_path_missing_route_is_none() {
        let graph = linear();
        assert!(Traversal::find_path(&graph, "a", "z").is_none());
        assert!(Traversal::find_path(&graph, "d", "a").is_none());
        assert_eq!(Traversal::find_path(&graph, "a", "a"), Some(Vec::new()));
    }

    #[test]
    fn components_treat_edges_as_undirected() {
        let graph = graph_with(
            &["a1", "a2", "b1", "b2"],
            &[("a1", EdgeKind::Uses, "a2"), ("b2", EdgeKind::IsA, "b1")],
        );
        let components = Traversal::connected_components(&graph);
        assert_eq!(components, vec![set(&["a1", "a2"]), set(&["b1", "b2"])]);
    }

    #[test]
    fn isolated_nodes_are_singletons() {
        let graph = linear();
        let components = Traversal::connected_components(&graph);
        assert_eq!(components.len(), 2);
        assert!(components.contains(&set(&["z"])));
    }
}
