use std::collections::{HashMap, VecDeque};

use eframe::egui::{Rect, Vec2, vec2};

use super::Forest;
use crate::engine::config::{TierSizes, TreeTuning, ViewConfig};
use crate::graph::{Adjacency, Direction, GraphData, Tier};

/// Builds one breadth-first tree per node of `root_tier`, walking `direction`.
///
/// Every visited node also adopts its unplaced top-tier neighbours found against the
/// walking direction, so each branch can terminate at an owning root. Roots are placed
/// before any traversal starts and are never re-parented.
pub(in crate::engine) fn build_hierarchy(
    data: &GraphData,
    adjacency: &Adjacency,
    root_tier: Tier,
    direction: Direction,
) -> Forest {
    let mut forest = Forest::new(data.node_count());
    let roots = data
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.tier == root_tier)
        .map(|(index, _)| index)
        .collect::<Vec<_>>();

    for &root in &roots {
        forest.attach(root, None);
    }

    for &root in &roots {
        let mut queue = VecDeque::from([root]);
        while let Some(current) = queue.pop_front() {
            for next in tree_neighbors(data, adjacency, current, direction) {
                if forest.contains(next) {
                    continue;
                }
                forest.attach(next, Some(current));
                queue.push_back(next);
            }
        }
    }

    forest
}

fn tree_neighbors(
    data: &GraphData,
    adjacency: &Adjacency,
    current: usize,
    direction: Direction,
) -> Vec<usize> {
    let primary = adjacency
        .neighbors(current, direction)
        .iter()
        .map(|neighbor| neighbor.node);
    let owners = adjacency
        .neighbors(current, direction.opposite())
        .iter()
        .map(|neighbor| neighbor.node)
        .filter(|&node| data.nodes[node].tier == Tier::TOP);

    primary.chain(owners).collect()
}

/// Column-per-level placement of every node whose ancestors are all expanded.
pub(in crate::engine) fn place_forest(
    forest: &Forest,
    data: &GraphData,
    view: &ViewConfig,
    sizes: &TierSizes,
    tuning: &TreeTuning,
    bounds: Rect,
) -> HashMap<String, Vec2> {
    let mut shown = vec![false; data.node_count()];
    let mut placements = HashMap::new();

    for (level, members) in forest.levels.iter().enumerate() {
        let visible = members
            .iter()
            .copied()
            .filter(|&node| match forest.parent(node) {
                None => true,
                Some(parent) => shown[parent] && view.is_expanded(&data.nodes[parent].id),
            })
            .collect::<Vec<_>>();
        if visible.is_empty() {
            break;
        }

        let largest = visible
            .iter()
            .map(|&node| sizes.radius(data.nodes[node].tier))
            .fold(0.0_f32, f32::max);
        let spacing = largest * 2.0 + tuning.label_height + tuning.sibling_padding;
        let x = bounds.left() + tuning.origin_x + level as f32 * tuning.level_width;
        let top = bounds.center().y - spacing * (visible.len() - 1) as f32 * 0.5;

        for (slot, &node) in visible.iter().enumerate() {
            shown[node] = true;
            placements.insert(
                data.nodes[node].id.clone(),
                vec2(x, top + slot as f32 * spacing),
            );
        }
    }

    placements
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Pos2, vec2};

    use super::*;
    use crate::graph::{GraphSnapshot, SnapshotLink, SnapshotNode};

    fn supply_chain() -> GraphData {
        GraphData::ingest(&GraphSnapshot {
            nodes: vec![
                SnapshotNode::new("acme", "Acme", Tier::Owner),
                SnapshotNode::new("broker", "Broker", Tier::Intermediary),
                SnapshotNode::new("cloud", "Cloud", Tier::Provider),
                SnapshotNode::new("bucket", "Bucket", Tier::Leaf),
                SnapshotNode::new("cdn", "CDN", Tier::Provider),
            ],
            links: vec![
                SnapshotLink::new("acme", "broker", "owns"),
                SnapshotLink::new("broker", "cloud", "uses"),
                SnapshotLink::new("cloud", "bucket", "hosts"),
                SnapshotLink::new("broker", "cdn", "uses"),
                SnapshotLink::new("cdn", "bucket", "serves"),
            ],
        })
    }

    fn adjacency(data: &GraphData) -> Adjacency {
        Adjacency::build(data.node_count(), data.edges())
    }

    #[test]
    fn downstream_tree_from_owner() {
        let data = supply_chain();
        let forest = build_hierarchy(&data, &adjacency(&data), Tier::Owner, Direction::Forward);
        let info = forest.tree_info(&data);

        assert_eq!(info["acme"].level, 0);
        assert_eq!(info["broker"].level, 1);
        assert_eq!(info["cloud"].level, 2);
        assert_eq!(info["bucket"].level, 3);
        assert_eq!(info["bucket"].parent.as_deref(), Some("cloud"));
        assert_eq!(info["broker"].children, vec!["cloud", "cdn"]);
    }

    #[test]
    fn visited_nodes_are_never_reparented() {
        let data = supply_chain();
        let forest = build_hierarchy(&data, &adjacency(&data), Tier::Owner, Direction::Forward);
        let info = forest.tree_info(&data);
        assert!(!info["cdn"].children.contains(&"bucket".to_owned()));
    }

    #[test]
    fn intermediary_root_reaches_owner_against_direction() {
        let data = supply_chain();
        let forest = build_hierarchy(
            &data,
            &adjacency(&data),
            Tier::Intermediary,
            Direction::Forward,
        );
        let info = forest.tree_info(&data);

        assert_eq!(info["broker"].level, 0);
        assert!(info["broker"].children.contains(&"acme".to_owned()));
        assert_eq!(info["acme"].parent.as_deref(), Some("broker"));
    }

    #[test]
    fn collapsed_nodes_hide_their_subtree() {
        let data = supply_chain();
        let forest = build_hierarchy(&data, &adjacency(&data), Tier::Owner, Direction::Forward);
        let mut view = ViewConfig::default();
        view.expanded_node_ids.insert("acme".to_owned());

        let bounds = Rect::from_min_size(Pos2::ZERO, vec2(1000.0, 600.0));
        let placed = place_forest(
            &forest,
            &data,
            &view,
            &TierSizes::default(),
            &TreeTuning::default(),
            bounds,
        );

        assert!(placed.contains_key("acme"));
        assert!(placed.contains_key("broker"));
        assert!(!placed.contains_key("cloud"));
    }

    #[test]
    fn siblings_are_spaced_by_largest_size() {
        let data = supply_chain();
        let forest = build_hierarchy(&data, &adjacency(&data), Tier::Owner, Direction::Forward);
        let sizes = TierSizes::default();
        let tuning = TreeTuning::default();
        let bounds = Rect::from_min_size(Pos2::ZERO, vec2(1000.0, 600.0));
        let placed = place_forest(&forest, &data, &ViewConfig::default(), &sizes, &tuning, bounds);

        let cloud = placed["cloud"];
        let cdn = placed["cdn"];
        assert_eq!(cloud.x, cdn.x);
        assert_eq!(cloud.x, tuning.origin_x + 2.0 * tuning.level_width);
        let minimum = sizes.provider * 2.0 + tuning.label_height + tuning.sibling_padding;
        assert!((cdn.y - cloud.y).abs() >= minimum - 1e-3);
        assert!(((cloud.y + cdn.y) * 0.5 - 300.0).abs() < 1e-3);
    }
}
