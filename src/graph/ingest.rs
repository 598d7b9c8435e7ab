use std::collections::HashMap;

use tracing::{debug, warn};

use super::model::{GraphSnapshot, Metadata, SnapshotNode};

#[derive(Clone, Debug)]
pub struct ResolvedLink {
    pub source: usize,
    pub target: usize,
    pub kind: String,
    pub metadata: Metadata,
}

/// Snapshot entities stored in an index arena with every link resolved to node indices.
#[derive(Clone, Debug, Default)]
pub struct GraphData {
    pub nodes: Vec<SnapshotNode>,
    pub links: Vec<ResolvedLink>,
    pub index_by_id: HashMap<String, usize>,
}

impl GraphData {
    /// Deduplicates nodes (first occurrence wins) and drops links with unknown or
    /// identical endpoints.
    pub fn ingest(snapshot: &GraphSnapshot) -> Self {
        let mut nodes = Vec::with_capacity(snapshot.nodes.len());
        let mut index_by_id = HashMap::with_capacity(snapshot.nodes.len());

        for node in &snapshot.nodes {
            if index_by_id.contains_key(&node.id) {
                warn!(id = %node.id, "dropping duplicate node id from snapshot");
                continue;
            }
            index_by_id.insert(node.id.clone(), nodes.len());
            nodes.push(node.clone());
        }

        let mut links = Vec::with_capacity(snapshot.links.len());
        let mut unresolved = 0usize;
        for link in &snapshot.links {
            let (Some(&source), Some(&target)) =
                (index_by_id.get(&link.source), index_by_id.get(&link.target))
            else {
                unresolved += 1;
                continue;
            };
            if source == target {
                unresolved += 1;
                continue;
            }

            links.push(ResolvedLink {
                source,
                target,
                kind: link.kind.clone(),
                metadata: link.metadata.clone(),
            });
        }

        if unresolved > 0 {
            debug!(count = unresolved, "excluded links without two distinct known endpoints");
        }

        Self {
            nodes,
            links,
            index_by_id,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.links.iter().map(|link| (link.source, link.target))
    }

    /// Re-indexed copy holding only the nodes flagged in `keep` and the links whose
    /// endpoints both survive.
    pub fn subgraph(&self, keep: &[bool]) -> Self {
        let mut remap = vec![usize::MAX; self.nodes.len()];
        let mut nodes = Vec::new();
        let mut index_by_id = HashMap::new();

        for (index, node) in self.nodes.iter().enumerate() {
            if !keep.get(index).copied().unwrap_or(false) {
                continue;
            }
            remap[index] = nodes.len();
            index_by_id.insert(node.id.clone(), nodes.len());
            nodes.push(node.clone());
        }

        let links = self
            .links
            .iter()
            .filter_map(|link| {
                let source = remap[link.source];
                let target = remap[link.target];
                (source != usize::MAX && target != usize::MAX).then(|| ResolvedLink {
                    source,
                    target,
                    kind: link.kind.clone(),
                    metadata: link.metadata.clone(),
                })
            })
            .collect();

        Self {
            nodes,
            links,
            index_by_id,
        }
    }
}
