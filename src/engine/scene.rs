use eframe::egui::{Align2, Color32, Pos2, Stroke, Vec2, vec2};

use super::{GraphEngine, ViewTransform};
use crate::graph::{Tier, alert_count};

pub const EMPTY_PLACEHOLDER: &str = "No entities match the current filters.";

/// Bend of a connector as a fraction of its length.
const CURVATURE: f32 = 0.12;
const BADGE_RADIUS: f32 = 7.0;
const LABEL_SIZE: f32 = 12.0;

const LINK_COLOR: Color32 = Color32::from_rgb(92, 100, 112);
const LINK_HIGHLIGHT: Color32 = Color32::from_rgb(241, 146, 94);
const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const HOVER_COLOR: Color32 = Color32::from_rgb(255, 164, 101);
const FOCUS_COLOR: Color32 = Color32::from_rgb(103, 196, 255);
const OUTLINE_COLOR: Color32 = Color32::from_rgba_premultiplied(15, 15, 15, 190);
const LABEL_COLOR: Color32 = Color32::from_gray(238);
const BADGE_COLOR: Color32 = Color32::from_rgb(214, 64, 69);

/// What a pointer lands on when it hits a shape group.
#[derive(Clone, Debug, PartialEq)]
pub enum HitTarget {
    Node(String),
    Link { source: String, target: String },
}

/// Shapes in data space; the host applies [`Scene::transform`] when painting.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Circle {
        center: Pos2,
        radius: f32,
        fill: Color32,
        stroke: Stroke,
    },
    /// Quadratic connector: start, control, end.
    Curve { points: [Pos2; 3], stroke: Stroke },
    Text {
        pos: Pos2,
        text: String,
        size: f32,
        color: Color32,
        anchor: Align2,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShapeGroup {
    pub target: HitTarget,
    pub primitives: Vec<Primitive>,
}

/// Positioned in container screen space.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
    pub pos: Pos2,
    pub lines: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    pub transform: ViewTransform,
    /// Drawn first so nodes sit on top of connectors.
    pub links: Vec<ShapeGroup>,
    pub nodes: Vec<ShapeGroup>,
    pub tooltip: Option<Tooltip>,
    pub placeholder: Option<&'static str>,
}

impl Scene {
    pub fn node_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.iter().filter_map(|group| match &group.target {
            HitTarget::Node(id) => Some(id.as_str()),
            HitTarget::Link { .. } => None,
        })
    }
}

pub fn tier_color(tier: Tier) -> Color32 {
    match tier {
        Tier::Owner => Color32::from_rgb(118, 96, 214),
        Tier::Intermediary => Color32::from_rgb(55, 150, 215),
        Tier::Provider => Color32::from_rgb(66, 178, 128),
        Tier::Leaf => Color32::from_rgb(158, 166, 178),
    }
}

pub(crate) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(crate) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

/// Control point pushed off the chord's midpoint along its left normal.
fn curve_points(start: Vec2, end: Vec2) -> [Pos2; 3] {
    let chord = end - start;
    let length = chord.length();
    let normal = if length > f32::EPSILON {
        vec2(-chord.y, chord.x) / length
    } else {
        Vec2::ZERO
    };
    let control = (start + end) * 0.5 + normal * length * CURVATURE;
    [start.to_pos2(), control.to_pos2(), end.to_pos2()]
}

fn badge_text(count: u64) -> String {
    if count > 99 {
        "99+".to_owned()
    } else {
        count.to_string()
    }
}

pub(super) fn build_scene(engine: &GraphEngine) -> Scene {
    let graph = &engine.graph;
    let size = engine.viewport.size;
    let mut scene = Scene {
        width: size.x,
        height: size.y,
        transform: engine.viewport.transform(),
        links: Vec::with_capacity(graph.links.len()),
        nodes: Vec::with_capacity(graph.nodes.len()),
        tooltip: None,
        placeholder: None,
    };

    if graph.nodes.is_empty() {
        scene.placeholder = Some(EMPTY_PLACEHOLDER);
        return scene;
    }

    let selected = engine.selected.as_deref().and_then(|id| graph.index_of(id));
    let hovered = engine.interaction.hovered().and_then(|id| graph.index_of(id));
    let focus = engine
        .view
        .focus_node_id
        .as_deref()
        .and_then(|id| graph.index_of(id));

    let mut related = vec![selected.is_none(); graph.nodes.len()];
    if let Some(selected) = selected {
        related[selected] = true;
        for neighbor in graph.adjacency.undirected(selected) {
            related[neighbor.node] = true;
        }
    }

    for link in &graph.links {
        let incident = selected.is_some_and(|index| link.source == index || link.target == index);
        let stroke = if incident {
            Stroke::new(2.4, LINK_HIGHLIGHT)
        } else if selected.is_some() {
            Stroke::new(1.0, dim_color(LINK_COLOR, 0.45))
        } else {
            Stroke::new(1.4, LINK_COLOR)
        };

        let source = &graph.nodes[link.source];
        let target = &graph.nodes[link.target];
        scene.links.push(ShapeGroup {
            target: HitTarget::Link {
                source: source.id.clone(),
                target: target.id.clone(),
            },
            primitives: vec![Primitive::Curve {
                points: curve_points(source.world_pos, target.world_pos),
                stroke,
            }],
        });
    }

    let mut draw_order = (0..graph.nodes.len()).collect::<Vec<_>>();
    draw_order.sort_by(|&a, &b| {
        let emphasis = |index| Some(index) == selected || Some(index) == hovered;
        emphasis(a)
            .cmp(&emphasis(b))
            .then(graph.nodes[a].base_radius.total_cmp(&graph.nodes[b].base_radius))
    });

    for index in draw_order {
        let node = &graph.nodes[index];
        let center = node.world_pos.to_pos2();
        let radius = node.base_radius;

        let base = tier_color(node.tier);
        let fill = if Some(index) == selected {
            blend_color(base, SELECTED_COLOR, 0.55)
        } else if Some(index) == hovered {
            blend_color(base, HOVER_COLOR, 0.45)
        } else if related[index] {
            base
        } else {
            dim_color(base, 0.45)
        };
        let stroke = if Some(index) == selected {
            Stroke::new(3.0, SELECTED_COLOR)
        } else if Some(index) == hovered {
            Stroke::new(2.0, HOVER_COLOR)
        } else if Some(index) == focus {
            Stroke::new(2.0, FOCUS_COLOR)
        } else {
            Stroke::new(1.0, OUTLINE_COLOR)
        };
        let label_color = if related[index] {
            LABEL_COLOR
        } else {
            dim_color(LABEL_COLOR, 0.5)
        };

        let mut primitives = vec![
            Primitive::Circle {
                center,
                radius,
                fill,
                stroke,
            },
            Primitive::Text {
                pos: center + vec2(0.0, radius + 4.0),
                text: node.label.clone(),
                size: LABEL_SIZE,
                color: label_color,
                anchor: Align2::CENTER_TOP,
            },
        ];

        if let Some(count) = alert_count(&node.metadata) {
            let badge = center + vec2(radius, -radius) * std::f32::consts::FRAC_1_SQRT_2;
            primitives.push(Primitive::Circle {
                center: badge,
                radius: BADGE_RADIUS,
                fill: BADGE_COLOR,
                stroke: Stroke::new(1.0, OUTLINE_COLOR),
            });
            primitives.push(Primitive::Text {
                pos: badge,
                text: badge_text(count),
                size: 9.0,
                color: Color32::WHITE,
                anchor: Align2::CENTER_CENTER,
            });
        }

        scene.nodes.push(ShapeGroup {
            target: HitTarget::Node(node.id.clone()),
            primitives,
        });
    }

    if let (Some(index), Some(pointer)) = (hovered, engine.interaction.pointer()) {
        let node = &graph.nodes[index];
        let mut lines = vec![
            node.label.clone(),
            format!(
                "{} · {} connections",
                node.tier.label(),
                graph.adjacency.degree(index)
            ),
        ];
        if let Some(count) = alert_count(&node.metadata) {
            lines.push(format!("{count} alerts"));
        }

        let offset = engine.tuning.interaction.tooltip_offset;
        scene.tooltip = Some(Tooltip {
            pos: engine.viewport.clamp_to_container(pointer) + vec2(offset, offset),
            lines,
        });
    }

    scene
}
