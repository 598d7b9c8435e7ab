use std::ops::RangeInclusive;

use eframe::egui::{self, Key, Response, RichText, Ui};

use crate::engine::{LayoutMode, RootType, TraversalDimension, tier_color};
use crate::graph::Tier;

use super::super::ViewModel;

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f32,
    negative_secs: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

/// Arrow keys nudge a focused slider, speeding up the longer they are held.
fn apply_slider_arrow_acceleration(
    ui: &Ui,
    response: &Response,
    value: &mut f32,
    range: &RangeInclusive<f32>,
) -> bool {
    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });

    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return false;
    }

    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    hold_state.positive_secs = if increase_down {
        hold_state.positive_secs + delta_time
    } else {
        0.0
    };
    hold_state.negative_secs = if decrease_down {
        hold_state.negative_secs + delta_time
    } else {
        0.0
    };
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));

    let direction = (increase_down as i8) - (decrease_down as i8);
    if direction == 0 {
        return false;
    }

    let hold_secs = if direction > 0 {
        hold_state.positive_secs
    } else {
        hold_state.negative_secs
    };
    let (min, max) = (*range.start(), *range.end());
    let step = ((max - min) / 200.0).max(0.0005);
    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs);

    let old_value = *value;
    *value = (*value + direction as f32 * step * speed * delta_time).clamp(min, max);
    ui.ctx().request_repaint();
    (*value - old_value).abs() > f32::EPSILON
}

fn tuning_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: RangeInclusive<f32>,
    text: &str,
    hover: &str,
) -> bool {
    let response = ui
        .add(
            egui::Slider::new(value, range.clone())
                .text(text)
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text(hover);
    if response.hovered() {
        response.request_focus();
    }
    let dragged = response.changed();
    dragged | apply_slider_arrow_acceleration(ui, &response, value, &range)
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        let mut view = self.engine.view().clone();

        ui.label("Search (label or type)")
            .on_hover_text("Only entities whose label or type contains the text are laid out.");
        ui.text_edit_singleline(&mut view.search_text);

        ui.separator();

        ui.horizontal(|ui| {
            ui.label("Layout");
            for mode in [LayoutMode::Force, LayoutMode::Hierarchical] {
                ui.selectable_value(&mut view.layout_mode, mode, mode.label());
            }
        });

        ui.add_enabled_ui(view.layout_mode == LayoutMode::Hierarchical, |ui| {
            egui::ComboBox::from_label("Root type")
                .selected_text(view.root_type.label())
                .show_ui(ui, |ui| {
                    for root in RootType::ALL {
                        ui.selectable_value(&mut view.root_type, root, root.label());
                    }
                });

            ui.horizontal(|ui| {
                ui.label("Dimension");
                for dimension in [TraversalDimension::Downstream, TraversalDimension::Upstream] {
                    ui.selectable_value(&mut view.dimension, dimension, dimension.label())
                        .on_hover_text(match dimension {
                            TraversalDimension::Downstream => "Follow links source to target.",
                            TraversalDimension::Upstream => "Follow links target to source.",
                        });
                }
            });

            let collapsed = !view.expanded_node_ids.is_empty();
            if ui
                .add_enabled(collapsed, egui::Button::new("Expand all"))
                .clicked()
            {
                view.expanded_node_ids.clear();
            }
        });

        egui::ComboBox::from_label("Type filter")
            .selected_text(view.type_filter.map_or("any", Tier::label))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut view.type_filter, None, "any");
                for tier in Tier::ALL {
                    ui.selectable_value(&mut view.type_filter, Some(tier), tier.label());
                }
            });

        if let Some(focus) = view.focus_node_id.clone() {
            ui.horizontal(|ui| {
                ui.label(format!("Focused on {focus}"));
                if ui.small_button("Clear").clicked() {
                    view.focus_node_id = None;
                }
            });
        }

        self.submit_view(view);

        ui.separator();
        self.draw_tuning(ui);

        ui.separator();
        ui.label(RichText::new("Legend").strong());
        for tier in Tier::ALL {
            ui.horizontal(|ui| {
                let (rect, _) =
                    ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
                ui.painter()
                    .circle_filled(rect.center(), 6.0, tier_color(tier));
                ui.label(tier.label());
            });
        }
    }

    fn draw_tuning(&mut self, ui: &mut Ui) {
        let mut tuning = self.engine.tuning().clone();
        let mut changed = false;

        ui.collapsing("Force tuning", |ui| {
            let force = &mut tuning.force;
            changed |= tuning_slider(
                ui,
                &mut force.min_separation,
                0.0..=60.0,
                "Min separation",
                "Gap kept between circles, including room for labels.",
            );
            changed |= tuning_slider(
                ui,
                &mut force.repulsion_strength,
                0.0..=8_000.0,
                "Repulsion",
                "How strongly nearby nodes push away from each other.",
            );
            changed |= tuning_slider(
                ui,
                &mut force.link_distance,
                30.0..=400.0,
                "Link length",
                "Ideal distance between linked nodes.",
            );
            changed |= tuning_slider(
                ui,
                &mut force.spring_strength,
                0.0..=0.4,
                "Link spring",
                "How strongly links pull toward their ideal length.",
            );
            changed |= tuning_slider(
                ui,
                &mut force.collision_strength,
                0.1..=1.0,
                "Collision",
                "Share of an overlap corrected per tick.",
            );
            changed |= tuning_slider(
                ui,
                &mut force.velocity_decay,
                0.2..=0.95,
                "Velocity decay",
                "Fraction of velocity kept from one tick to the next.",
            );
            changed |= tuning_slider(
                ui,
                &mut force.alpha_decay,
                0.9..=0.995,
                "Cooling",
                "Per-tick alpha multiplier; higher settles more slowly.",
            );
        });

        ui.collapsing("Hierarchy tuning", |ui| {
            let tree = &mut tuning.tree;
            changed |= tuning_slider(
                ui,
                &mut tree.level_width,
                80.0..=480.0,
                "Level width",
                "Horizontal distance between tree levels.",
            );
            changed |= tuning_slider(
                ui,
                &mut tree.sibling_padding,
                0.0..=60.0,
                "Sibling padding",
                "Vertical gap between neighbouring rows.",
            );
        });

        if changed {
            self.engine.set_tuning(tuning);
        }
    }
}
