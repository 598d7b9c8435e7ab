use eframe::egui::epaint::QuadraticBezierShape;
use eframe::egui::{
    self, Align2, Color32, FontId, Key, Painter, Pos2, Rect, RichText, Sense, Ui, Vec2,
};

use crate::engine::{ContextAction, PointerEvent, Primitive, Scene, Tooltip};

use super::ViewModel;
use super::render_utils::{circle_visible, curve_visible, draw_background};

/// Labels smaller than this on screen are skipped.
const MIN_LABEL_PX: f32 = 7.0;

/// Any button press that does not land on the open context menu dismisses it,
/// wherever it happens in the window.
fn dismisses_menu(event: &egui::Event, menu_rect: Option<Rect>) -> bool {
    match (event, menu_rect) {
        (
            egui::Event::PointerButton {
                pos, pressed: true, ..
            },
            Some(menu),
        ) => !menu.contains(*pos),
        _ => false,
    }
}

fn paint_scene(painter: &Painter, rect: Rect, scene: &Scene) {
    if let Some(text) = scene.placeholder {
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            text,
            FontId::proportional(15.0),
            Color32::from_gray(180),
        );
        return;
    }

    let transform = scene.transform;
    let origin = rect.min.to_vec2();
    let to_screen = |point: Pos2| transform.to_screen(point.to_vec2()) + origin;

    for group in scene.links.iter().chain(&scene.nodes) {
        for primitive in &group.primitives {
            match primitive {
                Primitive::Circle {
                    center,
                    radius,
                    fill,
                    stroke,
                } => {
                    let center = to_screen(*center);
                    let radius = radius * transform.zoom;
                    if circle_visible(rect, center, radius) {
                        painter.circle(center, radius, *fill, *stroke);
                    }
                }
                Primitive::Curve { points, stroke } => {
                    let points = points.map(to_screen);
                    if curve_visible(rect, points, stroke.width) {
                        painter.add(QuadraticBezierShape::from_points_stroke(
                            points,
                            false,
                            Color32::TRANSPARENT,
                            *stroke,
                        ));
                    }
                }
                Primitive::Text {
                    pos,
                    text,
                    size,
                    color,
                    anchor,
                } => {
                    let size = size * transform.zoom;
                    let pos = to_screen(*pos);
                    if size >= MIN_LABEL_PX && rect.expand(120.0).contains(pos) {
                        painter.text(pos, *anchor, text, FontId::proportional(size), *color);
                    }
                }
            }
        }
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_canvas(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.engine.set_viewport_size(rect.size());
        self.forward_pointer(ui, rect, &response);

        let scene = self.engine.frame();
        draw_background(&painter, rect, scene.transform);
        paint_scene(&painter, rect, &scene);

        if let Some(tooltip) = &scene.tooltip {
            Self::draw_tooltip(ui, rect, tooltip);
        }
        self.draw_context_menu(ui, rect);

        if self.engine.hovered().is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        if self.engine.is_running() || self.engine.is_dragging() {
            ui.ctx().request_repaint();
        }
    }

    fn forward_pointer(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        let origin = rect.min.to_vec2();
        let local = |pos: Pos2| pos - origin;
        let menu_rect = self.menu_rect;
        let over_menu = |pos: Pos2| menu_rect.is_some_and(|menu| menu.contains(pos));

        let (events, scroll, any_down) = ui.input(|input| {
            (
                input.events.clone(),
                input.raw_scroll_delta.y,
                input.pointer.any_down(),
            )
        });

        if events
            .iter()
            .any(|event| dismisses_menu(event, menu_rect))
        {
            self.engine.close_context_menu();
        }

        let mut forwarded = Vec::new();
        for event in events {
            match event {
                egui::Event::PointerMoved(pos) if rect.contains(pos) || any_down => {
                    forwarded.push(PointerEvent::Move { pos: local(pos) });
                }
                egui::Event::PointerMoved(_) | egui::Event::PointerGone => {
                    forwarded.push(PointerEvent::Leave);
                }
                egui::Event::PointerButton {
                    pos,
                    button,
                    pressed: true,
                    ..
                } if rect.contains(pos) && !over_menu(pos) => {
                    forwarded.push(PointerEvent::Down {
                        pos: local(pos),
                        button,
                    });
                }
                egui::Event::PointerButton {
                    pos,
                    button,
                    pressed: false,
                    ..
                } => {
                    forwarded.push(PointerEvent::Up {
                        pos: local(pos),
                        button,
                    });
                }
                _ => {}
            }
        }

        if response.double_clicked()
            && let Some(pos) = response.interact_pointer_pos()
        {
            forwarded.push(PointerEvent::DoubleClick { pos: local(pos) });
        }

        if response.hovered()
            && scroll.abs() > f32::EPSILON
            && let Some(pos) = response.hover_pos()
        {
            forwarded.push(PointerEvent::Wheel {
                pos: local(pos),
                delta: scroll,
            });
        }

        if ui.input(|input| input.key_pressed(Key::Escape)) {
            self.engine.close_context_menu();
        }

        for event in forwarded {
            self.engine.handle_pointer(event);
        }
    }

    fn draw_tooltip(ui: &Ui, rect: Rect, tooltip: &Tooltip) {
        egui::Area::new(egui::Id::new("node_tooltip"))
            .fixed_pos(rect.min + tooltip.pos.to_vec2())
            .order(egui::Order::Tooltip)
            .interactable(false)
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    for (index, line) in tooltip.lines.iter().enumerate() {
                        if index == 0 {
                            ui.label(RichText::new(line).strong());
                        } else {
                            ui.small(line);
                        }
                    }
                });
            });
    }

    fn draw_context_menu(&mut self, ui: &Ui, rect: Rect) {
        let Some(menu) = self.engine.context_menu().cloned() else {
            self.menu_rect = None;
            return;
        };

        let title = self
            .engine
            .entity(&menu.node_id)
            .map_or_else(|| menu.node_id.clone(), |entity| entity.display_label().to_owned());
        let mut chosen = None;

        let area = egui::Area::new(egui::Id::new("node_context_menu"))
            .fixed_pos(rect.min + menu.anchor.to_vec2() + Vec2::splat(2.0))
            .order(egui::Order::Foreground)
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(RichText::new(title).strong());
                    ui.small(menu.tier.label());
                    ui.separator();
                    for action in ContextAction::ALL {
                        if ui.button(action.label()).clicked() {
                            chosen = Some(action);
                        }
                    }
                });
            });

        self.menu_rect = Some(area.response.rect);
        if let Some(action) = chosen {
            self.engine.choose_context_action(action);
            self.menu_rect = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Modifiers, PointerButton, pos2};

    use super::*;

    fn press(x: f32, y: f32) -> egui::Event {
        egui::Event::PointerButton {
            pos: pos2(x, y),
            button: PointerButton::Primary,
            pressed: true,
            modifiers: Modifiers::NONE,
        }
    }

    #[test]
    fn press_anywhere_but_the_menu_dismisses_it() {
        let menu = Some(Rect::from_min_max(pos2(100.0, 100.0), pos2(200.0, 180.0)));

        assert!(dismisses_menu(&press(5.0, 5.0), menu));
        assert!(dismisses_menu(&press(1300.0, 400.0), menu));
        assert!(!dismisses_menu(&press(150.0, 150.0), menu));
        assert!(!dismisses_menu(&press(5.0, 5.0), None));
    }

    #[test]
    fn release_does_not_dismiss_menu() {
        let menu = Some(Rect::from_min_max(pos2(100.0, 100.0), pos2(200.0, 180.0)));
        let release = egui::Event::PointerButton {
            pos: pos2(5.0, 5.0),
            button: PointerButton::Primary,
            pressed: false,
            modifiers: Modifiers::NONE,
        };
        assert!(!dismisses_menu(&release, menu));
    }
}
