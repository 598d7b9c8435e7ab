mod filter;
mod focus;
mod force;
mod tree;

use std::collections::HashMap;

use crate::graph::GraphData;

pub(super) use filter::{orphan_mask, search_mask};
pub(super) use focus::extract_focus;
pub(super) use force::{ForceStep, Mobility, anchor_targets, resolve_overlaps, step_forces};
pub(super) use tree::{build_hierarchy, place_forest};

/// Tree position of a node, keyed by node id in [`TreeInfo`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub level: usize,
}

pub type TreeInfo = HashMap<String, TreeEntry>;

#[derive(Clone, Debug)]
struct TreeSlot {
    parent: Option<usize>,
    children: Vec<usize>,
    level: usize,
}

/// Rooted trees over the indices of one [`GraphData`].
#[derive(Clone, Debug, Default)]
pub(super) struct Forest {
    slots: Vec<Option<TreeSlot>>,
    /// Nodes grouped by level, each level in traversal order so siblings stay adjacent.
    levels: Vec<Vec<usize>>,
}

impl Forest {
    fn new(node_count: usize) -> Self {
        Self {
            slots: vec![None; node_count],
            levels: Vec::new(),
        }
    }

    fn contains(&self, node: usize) -> bool {
        self.slots.get(node).is_some_and(Option::is_some)
    }

    fn attach(&mut self, node: usize, parent: Option<usize>) {
        let level = parent
            .and_then(|parent| self.slots[parent].as_ref())
            .map_or(0, |slot| slot.level + 1);

        if let Some(parent) = parent
            && let Some(slot) = self.slots[parent].as_mut()
        {
            slot.children.push(node);
        }

        self.slots[node] = Some(TreeSlot {
            parent,
            children: Vec::new(),
            level,
        });
        if self.levels.len() <= level {
            self.levels.resize_with(level + 1, Vec::new);
        }
        self.levels[level].push(node);
    }

    fn parent(&self, node: usize) -> Option<usize> {
        self.slots[node].as_ref().and_then(|slot| slot.parent)
    }

    pub(super) fn membership(&self) -> Vec<bool> {
        self.slots.iter().map(Option::is_some).collect()
    }

    pub(super) fn tree_info(&self, data: &GraphData) -> TreeInfo {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let slot = slot.as_ref()?;
                let entry = TreeEntry {
                    parent: slot.parent.map(|parent| data.nodes[parent].id.clone()),
                    children: slot
                        .children
                        .iter()
                        .map(|&child| data.nodes[child].id.clone())
                        .collect(),
                    level: slot.level,
                };
                Some((data.nodes[index].id.clone(), entry))
            })
            .collect()
    }
}
