use std::collections::VecDeque;

use super::Forest;
use crate::graph::Adjacency;

/// Breadth-first tree over the undirected view of `adjacency`, covering the whole
/// component reachable from `focus`.
pub(in crate::engine) fn extract_focus(adjacency: &Adjacency, focus: usize) -> Forest {
    let mut forest = Forest::new(adjacency.node_count());
    if focus >= adjacency.node_count() {
        return forest;
    }

    forest.attach(focus, None);
    let mut queue = VecDeque::from([focus]);

    while let Some(current) = queue.pop_front() {
        let parent = forest.parent(current);
        for neighbor in adjacency.undirected(current) {
            if Some(neighbor.node) == parent || forest.contains(neighbor.node) {
                continue;
            }
            forest.attach(neighbor.node, Some(current));
            queue.push_back(neighbor.node);
        }
    }

    forest
}
