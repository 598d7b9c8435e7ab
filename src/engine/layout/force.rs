use std::f32::consts::{FRAC_PI_2, PI, TAU};

use eframe::egui::{Rect, Vec2, vec2};

use crate::engine::RenderGraph;
use crate::engine::config::ForceTuning;

/// Substituted for shorter distances before any division.
const MIN_DISTANCE: f32 = 0.01;
/// Extra gap added by the separation pass so float error cannot leave a pair touching.
const SEPARATION_SLACK: f32 = 0.05;

pub(in crate::engine) struct ForceStep<'a> {
    /// Excluded from force updates: anchors and nodes under drag.
    pub(in crate::engine) pinned: &'a [bool],
    /// Position a pinned node eases toward, if any.
    pub(in crate::engine) anchors: &'a [Option<Vec2>],
    pub(in crate::engine) alpha: f32,
    pub(in crate::engine) bounds: Rect,
}

fn separation_axis(delta: Vec2, distance: f32, a: usize, b: usize) -> Vec2 {
    if distance > MIN_DISTANCE {
        delta / distance
    } else {
        let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * TAU;
        vec2(angle.cos(), angle.sin())
    }
}

/// How freely a node may be moved by the final overlap pass. Of two overlapping
/// nodes the less constrained one gives way; equals split the push.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(in crate::engine) enum Mobility {
    Free,
    Anchored,
    /// Under an active drag.
    Held,
}

fn overlap_shares(a: Mobility, b: Mobility) -> (f32, f32) {
    use std::cmp::Ordering;

    match a.cmp(&b) {
        Ordering::Less => (1.0, 0.0),
        Ordering::Greater => (0.0, 1.0),
        Ordering::Equal if a == Mobility::Held => (0.0, 0.0),
        Ordering::Equal => (0.5, 0.5),
    }
}

/// How a push between two nodes is split when one of them cannot move.
fn shares(pinned_a: bool, pinned_b: bool) -> (f32, f32) {
    match (pinned_a, pinned_b) {
        (false, false) => (0.5, 0.5),
        (false, true) => (1.0, 0.0),
        (true, false) => (0.0, 1.0),
        (true, true) => (0.0, 0.0),
    }
}

fn min_distance(graph: &RenderGraph, a: usize, b: usize, tuning: &ForceTuning) -> f32 {
    graph.nodes[a].base_radius + graph.nodes[b].base_radius + tuning.min_separation
}

fn clamp_into(rect: Rect, position: Vec2) -> Vec2 {
    if rect.is_positive() {
        vec2(
            position.x.clamp(rect.left(), rect.right()),
            position.y.clamp(rect.top(), rect.bottom()),
        )
    } else {
        rect.center().to_vec2()
    }
}

/// Target slots for anchor-tier nodes: dead centre for one, a ring for several.
pub(in crate::engine) fn anchor_targets(
    graph: &RenderGraph,
    tuning: &ForceTuning,
    bounds: Rect,
) -> Vec<Option<Vec2>> {
    let mut targets = vec![None; graph.nodes.len()];
    let anchors = graph
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.tier == tuning.anchor_tier)
        .map(|(index, _)| index)
        .collect::<Vec<_>>();
    let center = bounds.center().to_vec2();

    if let [only] = anchors.as_slice() {
        targets[*only] = Some(center);
        return targets;
    }

    let count = anchors.len() as f32;
    let radius = tuning
        .anchor_ring_radius
        .max(ring_radius_floor(graph, &anchors, tuning));
    for (slot, &index) in anchors.iter().enumerate() {
        let angle = (slot as f32 / count) * TAU - FRAC_PI_2;
        targets[index] = Some(center + vec2(angle.cos(), angle.sin()) * radius);
    }
    targets
}

/// Smallest ring on which neighbouring anchor slots are at least the separation
/// distance apart (chord between slots = 2R sin(pi / n)).
fn ring_radius_floor(graph: &RenderGraph, anchors: &[usize], tuning: &ForceTuning) -> f32 {
    if anchors.len() < 2 {
        return 0.0;
    }
    let largest = anchors
        .iter()
        .map(|&index| graph.nodes[index].base_radius)
        .fold(0.0_f32, f32::max);
    let chord = 2.0 * largest + tuning.min_separation + SEPARATION_SLACK;
    chord / (2.0 * (PI / anchors.len() as f32).sin())
}

pub(in crate::engine) fn step_forces(
    graph: &mut RenderGraph,
    step: &ForceStep<'_>,
    tuning: &ForceTuning,
) {
    let node_count = graph.nodes.len();
    let mut impulses = vec![Vec2::ZERO; node_count];

    for i in 0..node_count {
        for j in (i + 1)..node_count {
            let (share_i, share_j) = shares(step.pinned[i], step.pinned[j]);
            if share_i == 0.0 && share_j == 0.0 {
                continue;
            }

            let delta = graph.nodes[i].world_pos - graph.nodes[j].world_pos;
            let raw_distance = delta.length();
            let axis = separation_axis(delta, raw_distance, i, j);
            let distance = raw_distance.max(MIN_DISTANCE);
            let required = min_distance(graph, i, j, tuning);

            let push = if distance < required {
                (required - distance) * tuning.collision_strength
            } else if distance < tuning.repulsion_cutoff {
                tuning.repulsion_strength * step.alpha / (distance * distance)
            } else {
                continue;
            };

            impulses[i] += axis * push * share_i;
            impulses[j] -= axis * push * share_j;
        }
    }

    for link in &graph.links {
        let (source, target) = (link.source, link.target);
        if source == target || source >= node_count || target >= node_count {
            continue;
        }

        let delta = graph.nodes[target].world_pos - graph.nodes[source].world_pos;
        let raw_distance = delta.length();
        let axis = separation_axis(delta, raw_distance, source, target);
        let stretch = (raw_distance.max(MIN_DISTANCE) - tuning.link_distance)
            * tuning.spring_strength
            * step.alpha;
        let (share_source, share_target) = shares(step.pinned[source], step.pinned[target]);

        impulses[source] += axis * stretch * share_source;
        impulses[target] -= axis * stretch * share_target;
    }

    let inner = step.bounds.shrink(tuning.bounds_padding);
    for (index, node) in graph.nodes.iter_mut().enumerate() {
        if step.pinned[index] {
            node.velocity = Vec2::ZERO;
            if let Some(target) = step.anchors[index] {
                node.world_pos += (target - node.world_pos) * tuning.anchor_ease;
            }
            continue;
        }

        node.velocity = (node.velocity + impulses[index]) * tuning.velocity_decay;
        node.world_pos = clamp_into(inner, node.world_pos + node.velocity);

        if !node.world_pos.is_finite() || !node.velocity.is_finite() {
            node.world_pos = step.bounds.center().to_vec2();
            node.velocity = Vec2::ZERO;
        }
    }
}

/// Pushes still-overlapping pairs apart along their connecting axis until none remain
/// or the pass budget runs out. Returns the number of pairs left overlapping, held
/// pairs included.
pub(in crate::engine) fn resolve_overlaps(
    graph: &mut RenderGraph,
    mobility: &[Mobility],
    tuning: &ForceTuning,
) -> usize {
    let node_count = graph.nodes.len();
    let mut remaining = 0;

    for _ in 0..=tuning.overlap_passes {
        remaining = 0;
        for i in 0..node_count {
            for j in (i + 1)..node_count {
                let delta = graph.nodes[i].world_pos - graph.nodes[j].world_pos;
                let raw_distance = delta.length();
                let required = min_distance(graph, i, j, tuning);
                if raw_distance >= required {
                    continue;
                }

                remaining += 1;
                let (share_i, share_j) = overlap_shares(mobility[i], mobility[j]);
                let axis = separation_axis(delta, raw_distance, i, j);
                let gap = required - raw_distance.max(0.0) + SEPARATION_SLACK;
                graph.nodes[i].world_pos += axis * gap * share_i;
                graph.nodes[j].world_pos -= axis * gap * share_j;
            }
        }

        if remaining == 0 {
            break;
        }
    }

    remaining
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Pos2, vec2};

    use super::*;
    use crate::engine::{RenderLink, RenderNode};
    use crate::graph::{Metadata, Tier};

    fn node(id: &str, tier: Tier, x: f32, y: f32) -> RenderNode {
        RenderNode {
            id: id.to_owned(),
            label: id.to_owned(),
            tier,
            metadata: Metadata::new(),
            world_pos: vec2(x, y),
            velocity: Vec2::ZERO,
            base_radius: 10.0,
        }
    }

    fn graph(nodes: Vec<RenderNode>, edges: &[(usize, usize)]) -> RenderGraph {
        let links = edges
            .iter()
            .map(|&(source, target)| RenderLink {
                source,
                target,
                kind: String::new(),
            })
            .collect();
        RenderGraph::new(nodes, links)
    }

    fn bounds() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(1000.0, 1000.0))
    }

    #[test]
    fn coincident_nodes_are_separated() {
        let tuning = ForceTuning::default();
        let mut graph = graph(
            vec![
                node("a", Tier::Leaf, 500.0, 500.0),
                node("b", Tier::Leaf, 500.0, 500.0),
            ],
            &[],
        );

        assert_eq!(
            resolve_overlaps(&mut graph, &[Mobility::Free, Mobility::Free], &tuning),
            0
        );
        let distance = (graph.nodes[0].world_pos - graph.nodes[1].world_pos).length();
        assert!(distance >= 20.0 + tuning.min_separation);
    }

    #[test]
    fn pinned_node_is_not_moved_by_forces() {
        let tuning = ForceTuning::default();
        let mut graph = graph(
            vec![
                node("a", Tier::Leaf, 500.0, 500.0),
                node("b", Tier::Leaf, 505.0, 500.0),
            ],
            &[(0, 1)],
        );
        let step = ForceStep {
            pinned: &[true, false],
            anchors: &[None, None],
            alpha: 1.0,
            bounds: bounds(),
        };

        step_forces(&mut graph, &step, &tuning);

        assert_eq!(graph.nodes[0].world_pos, vec2(500.0, 500.0));
        assert_eq!(graph.nodes[0].velocity, Vec2::ZERO);
        assert!(graph.nodes[1].world_pos.x > 505.0);
    }

    #[test]
    fn stretched_link_pulls_endpoints_together() {
        let tuning = ForceTuning {
            repulsion_strength: 0.0,
            ..ForceTuning::default()
        };
        let mut graph = graph(
            vec![
                node("a", Tier::Leaf, 100.0, 500.0),
                node("b", Tier::Leaf, 900.0, 500.0),
            ],
            &[(0, 1)],
        );
        let step = ForceStep {
            pinned: &[false, false],
            anchors: &[None, None],
            alpha: 1.0,
            bounds: bounds(),
        };

        step_forces(&mut graph, &step, &tuning);

        assert!(graph.nodes[0].world_pos.x > 100.0);
        assert!(graph.nodes[1].world_pos.x < 900.0);
    }

    #[test]
    fn positions_stay_inside_padded_bounds() {
        let tuning = ForceTuning::default();
        let mut graph = graph(
            vec![
                node("a", Tier::Leaf, 41.0, 41.0),
                node("b", Tier::Leaf, 41.5, 41.0),
            ],
            &[],
        );
        let step = ForceStep {
            pinned: &[false, false],
            anchors: &[None, None],
            alpha: 1.0,
            bounds: bounds(),
        };

        for _ in 0..20 {
            step_forces(&mut graph, &step, &tuning);
        }

        for node in &graph.nodes {
            assert!(node.world_pos.x >= tuning.bounds_padding);
            assert!(node.world_pos.y >= tuning.bounds_padding);
        }
    }

    #[test]
    fn anchors_take_centre_or_ring() {
        let tuning = ForceTuning::default();
        let single = graph(
            vec![
                node("o", Tier::Owner, 0.0, 0.0),
                node("l", Tier::Leaf, 0.0, 0.0),
            ],
            &[],
        );
        let targets = anchor_targets(&single, &tuning, bounds());
        assert_eq!(targets, vec![Some(vec2(500.0, 500.0)), None]);

        let ring = graph(
            vec![
                node("o1", Tier::Owner, 0.0, 0.0),
                node("o2", Tier::Owner, 0.0, 0.0),
            ],
            &[],
        );
        let targets = anchor_targets(&ring, &tuning, bounds());
        for target in targets.into_iter().flatten() {
            let radius = (target - vec2(500.0, 500.0)).length();
            assert!((radius - tuning.anchor_ring_radius).abs() < 1e-3);
        }
    }

    #[test]
    fn crowded_anchor_ring_widens_to_keep_slots_apart() {
        let tuning = ForceTuning::default();
        let owners = (0..24)
            .map(|index| node(&format!("o{index}"), Tier::Owner, 0.0, 0.0))
            .collect();
        let targets = anchor_targets(&graph(owners, &[]), &tuning, bounds())
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        let required = 20.0 + tuning.min_separation;
        for (index, a) in targets.iter().enumerate() {
            for b in &targets[index + 1..] {
                assert!((*a - *b).length() >= required);
            }
        }
    }

    #[test]
    fn overlapping_anchors_split_while_held_nodes_stay() {
        let tuning = ForceTuning::default();
        let mut graph = graph(
            vec![
                node("o1", Tier::Owner, 500.0, 500.0),
                node("o2", Tier::Owner, 504.0, 500.0),
                node("h", Tier::Leaf, 300.0, 300.0),
                node("l", Tier::Leaf, 302.0, 300.0),
            ],
            &[],
        );
        let mobility = [
            Mobility::Anchored,
            Mobility::Anchored,
            Mobility::Held,
            Mobility::Free,
        ];

        assert_eq!(resolve_overlaps(&mut graph, &mobility, &tuning), 0);
        assert!(graph.nodes[0].world_pos.x < 500.0);
        assert!(graph.nodes[1].world_pos.x > 504.0);
        assert_eq!(graph.nodes[2].world_pos, vec2(300.0, 300.0));
        let gap = (graph.nodes[3].world_pos - graph.nodes[2].world_pos).length();
        assert!(gap >= 20.0 + tuning.min_separation);
    }

    #[test]
    fn overlapping_held_pair_is_reported() {
        let tuning = ForceTuning::default();
        let mut graph = graph(
            vec![
                node("a", Tier::Leaf, 500.0, 500.0),
                node("b", Tier::Leaf, 501.0, 500.0),
            ],
            &[],
        );
        assert_eq!(
            resolve_overlaps(&mut graph, &[Mobility::Held, Mobility::Held], &tuning),
            1
        );
    }
}
