use eframe::egui::{PointerButton, Pos2, Vec2};

use super::{EngineEvent, GraphEngine};
use crate::graph::Tier;

/// Raw pointer input forwarded by the host, in container-relative screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down { pos: Pos2, button: PointerButton },
    Move { pos: Pos2 },
    Up { pos: Pos2, button: PointerButton },
    DoubleClick { pos: Pos2 },
    Wheel { pos: Pos2, delta: f32 },
    Leave,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextAction {
    RerootAtType,
    FilterToType,
}

impl ContextAction {
    pub const ALL: [Self; 2] = [Self::RerootAtType, Self::FilterToType];

    pub fn label(self) -> &'static str {
        match self {
            Self::RerootAtType => "Re-root hierarchy at this type",
            Self::FilterToType => "Filter to only this type",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContextMenu {
    pub anchor: Pos2,
    pub node_id: String,
    pub tier: Tier,
}

#[derive(Clone, Debug, Default)]
enum Gesture {
    #[default]
    Idle,
    /// Pointer is down on a node but has not travelled the drag threshold yet.
    Pending { node: String, origin: Pos2 },
    Dragging {
        node: String,
        origin: Pos2,
        /// Connected component of the dragged node with start positions.
        members: Vec<(String, Vec2)>,
    },
    Panning {
        origin: Pos2,
        start_pan: Vec2,
        moved: bool,
    },
}

#[derive(Debug, Default)]
pub(super) struct Interaction {
    gesture: Gesture,
    hovered: Option<String>,
    pointer: Option<Pos2>,
    context_menu: Option<ContextMenu>,
}

impl Interaction {
    pub(super) fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub(super) fn pointer(&self) -> Option<Pos2> {
        self.pointer
    }

    pub(super) fn cancel_gesture(&mut self) {
        self.gesture = Gesture::Idle;
    }

    fn dragged_node(&self) -> Option<&str> {
        match &self.gesture {
            Gesture::Dragging { node, .. } => Some(node),
            _ => None,
        }
    }
}

impl GraphEngine {
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { pos, button } => self.pointer_down(pos, button),
            PointerEvent::Move { pos } => self.pointer_move(pos),
            PointerEvent::Up { pos, button } => self.pointer_up(pos, button),
            PointerEvent::DoubleClick { pos } => {
                if let Some(index) = self.node_at(pos) {
                    let id = self.graph.nodes[index].id.clone();
                    self.set_focus(Some(id));
                }
            }
            PointerEvent::Wheel { pos, delta } => {
                let interaction = &self.tuning.interaction;
                let factor = (1.0 + delta * interaction.wheel_sensitivity).clamp(
                    interaction.wheel_factor_min,
                    interaction.wheel_factor_max,
                );
                self.viewport.zoom_at(pos, factor, &self.tuning.interaction);
                self.push_viewport_event();
            }
            PointerEvent::Leave => {
                self.interaction.pointer = None;
                if self.interaction.dragged_node().is_none()
                    && self.interaction.hovered.take().is_some()
                {
                    self.refresh_orphans();
                }
            }
        }
    }

    pub fn hovered(&self) -> Option<&str> {
        self.interaction.hovered()
    }

    pub fn is_dragging(&self) -> bool {
        self.interaction.dragged_node().is_some()
    }

    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.interaction.context_menu.as_ref()
    }

    pub fn close_context_menu(&mut self) {
        self.interaction.context_menu = None;
    }

    pub fn choose_context_action(&mut self, action: ContextAction) {
        let Some(menu) = self.interaction.context_menu.take() else {
            return;
        };
        self.events.push(EngineEvent::ContextAction {
            action,
            node_id: menu.node_id,
            tier: menu.tier,
        });
    }

    /// Topmost node whose rendered circle contains `screen`.
    pub(crate) fn node_at(&self, screen: Pos2) -> Option<usize> {
        let transform = self.viewport.transform();
        self.graph
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let distance = transform.to_screen(node.world_pos).distance(screen);
                let reach = (node.base_radius * transform.zoom).max(4.0);
                (distance <= reach).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    fn pointer_down(&mut self, pos: Pos2, button: PointerButton) {
        self.interaction.pointer = Some(pos);
        match button {
            PointerButton::Primary => {
                self.interaction.context_menu = None;
                self.interaction.gesture = match self.node_at(pos) {
                    Some(index) => Gesture::Pending {
                        node: self.graph.nodes[index].id.clone(),
                        origin: pos,
                    },
                    None => Gesture::Panning {
                        origin: pos,
                        start_pan: self.viewport.pan,
                        moved: false,
                    },
                };
            }
            PointerButton::Middle => {
                self.interaction.context_menu = None;
                self.interaction.gesture = Gesture::Panning {
                    origin: pos,
                    start_pan: self.viewport.pan,
                    moved: false,
                };
            }
            PointerButton::Secondary => {
                self.interaction.context_menu = self.node_at(pos).map(|index| {
                    let node = &self.graph.nodes[index];
                    ContextMenu {
                        anchor: pos,
                        node_id: node.id.clone(),
                        tier: node.tier,
                    }
                });
            }
            _ => {}
        }
    }

    fn pointer_move(&mut self, pos: Pos2) {
        self.interaction.pointer = Some(pos);
        let threshold = self.tuning.interaction.drag_threshold;

        self.interaction.gesture = match std::mem::take(&mut self.interaction.gesture) {
            Gesture::Pending { node, origin } if (pos - origin).length() >= threshold => {
                let members = self.begin_drag(&node);
                self.apply_drag(&members, origin, pos);
                Gesture::Dragging {
                    node,
                    origin,
                    members,
                }
            }
            Gesture::Dragging {
                node,
                origin,
                members,
            } => {
                self.apply_drag(&members, origin, pos);
                Gesture::Dragging {
                    node,
                    origin,
                    members,
                }
            }
            Gesture::Panning {
                origin,
                start_pan,
                moved,
            } => {
                let offset = pos - origin;
                self.viewport.pan = start_pan + offset;
                Gesture::Panning {
                    origin,
                    start_pan,
                    moved: moved || offset.length() >= threshold,
                }
            }
            Gesture::Idle => {
                self.update_hover(pos);
                Gesture::Idle
            }
            pending => pending,
        };
    }

    fn pointer_up(&mut self, pos: Pos2, button: PointerButton) {
        self.interaction.pointer = Some(pos);

        match (std::mem::take(&mut self.interaction.gesture), button) {
            (Gesture::Pending { node, .. }, PointerButton::Primary) => {
                self.select(Some(node));
            }
            (Gesture::Dragging { members, .. }, PointerButton::Primary) => {
                for (id, _) in members {
                    self.pinned.remove(&id);
                }
                self.update_hover(pos);
            }
            (Gesture::Panning { moved, .. }, PointerButton::Primary | PointerButton::Middle) => {
                if moved {
                    self.push_viewport_event();
                } else if button == PointerButton::Primary {
                    self.select(None);
                }
            }
            (gesture, _) => self.interaction.gesture = gesture,
        }
    }

    fn update_hover(&mut self, pos: Pos2) {
        let hovered = self
            .node_at(pos)
            .map(|index| self.graph.nodes[index].id.clone());
        if hovered != self.interaction.hovered {
            self.interaction.hovered = hovered;
            self.refresh_orphans();
        }
    }

    fn begin_drag(&mut self, node: &str) -> Vec<(String, Vec2)> {
        let Some(index) = self.graph.index_of(node) else {
            return Vec::new();
        };

        let members = self
            .graph
            .adjacency
            .component(index)
            .into_iter()
            .map(|member| {
                let member = &self.graph.nodes[member];
                (member.id.clone(), member.world_pos)
            })
            .collect::<Vec<_>>();

        self.pinned.extend(members.iter().map(|(id, _)| id.clone()));
        self.interaction.hovered = Some(node.to_owned());
        self.interaction.context_menu = None;
        members
    }

    fn apply_drag(&mut self, members: &[(String, Vec2)], origin: Pos2, pos: Pos2) {
        let delta = (pos - origin) / self.viewport.zoom.max(f32::EPSILON);
        if !delta.is_finite() {
            return;
        }

        for (id, start) in members {
            if let Some(index) = self.graph.index_of(id) {
                let node = &mut self.graph.nodes[index];
                node.world_pos = *start + delta;
                node.velocity = Vec2::ZERO;
            }
        }
    }
}
