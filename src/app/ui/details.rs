use eframe::egui::{self, RichText, Ui};
use serde_json::Value;

use crate::engine::LayoutMode;
use crate::graph::alert_count;

use super::super::ViewModel;

fn metadata_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.engine.selected().map(str::to_owned) else {
            ui.label("Click a node to inspect it. Double-click to focus on it.");
            return;
        };

        let Some(entity) = self.engine.entity(&selected_id).cloned() else {
            ui.label("Selected entity is no longer part of the snapshot.");
            return;
        };

        ui.label(RichText::new(entity.display_label()).strong());
        ui.small(entity.id.as_str());
        ui.add_space(6.0);

        ui.label(format!("Type: {}", entity.tier.label()));
        if self.engine.node_position(&entity.id).is_some() {
            ui.label(format!(
                "Rendered links: {}",
                self.engine.rendered_degree(&entity.id)
            ));
        } else {
            ui.label("Not rendered with the current filters.");
        }
        if let Some(count) = alert_count(&entity.metadata) {
            ui.label(RichText::new(format!("Open alerts: {count}")).color(egui::Color32::from_rgb(
                232, 110, 110,
            )));
        }

        ui.add_space(6.0);
        let mut view = self.engine.view().clone();
        ui.horizontal(|ui| {
            let focused = view.focus_node_id.as_deref() == Some(entity.id.as_str());
            if ui
                .add_enabled(!focused, egui::Button::new("Focus"))
                .on_hover_text("Show only what is reachable from this node.")
                .clicked()
            {
                view.focus_node_id = Some(entity.id.clone());
            }
            if ui
                .add_enabled(view.focus_node_id.is_some(), egui::Button::new("Clear focus"))
                .clicked()
            {
                view.focus_node_id = None;
            }

            if view.layout_mode == LayoutMode::Hierarchical
                && self.engine.tree_info().contains_key(&entity.id)
            {
                let expanded = view.is_expanded(&entity.id);
                let label = if expanded { "Collapse" } else { "Expand" };
                if ui.button(label).clicked() {
                    if view.expanded_node_ids.is_empty() {
                        view.expanded_node_ids = self.engine.tree_info().keys().cloned().collect();
                    }
                    if expanded {
                        view.expanded_node_ids.remove(&entity.id);
                    } else {
                        view.expanded_node_ids.insert(entity.id.clone());
                    }
                }
            }
        });
        self.submit_view(view);

        if let Some(entry) = self.engine.tree_info().get(&entity.id).cloned() {
            ui.separator();
            ui.label(RichText::new("Tree position").strong());
            ui.label(format!("Level: {}", entry.level));

            let mut pending_selection = None;
            if let Some(parent) = &entry.parent {
                ui.horizontal(|ui| {
                    ui.label("Parent:");
                    if ui.link(parent.as_str()).clicked() {
                        pending_selection = Some(parent.clone());
                    }
                });
            }
            if !entry.children.is_empty() {
                ui.label(format!("Children ({})", entry.children.len()));
                egui::ScrollArea::vertical()
                    .id_salt("tree_children_scroll")
                    .max_height(160.0)
                    .show(ui, |ui| {
                        for child in &entry.children {
                            if ui.link(child.as_str()).clicked() {
                                pending_selection = Some(child.clone());
                            }
                        }
                    });
            }
            if pending_selection.is_some() {
                self.engine.select(pending_selection);
            }
        }

        ui.separator();
        ui.label(RichText::new("Metadata").strong());
        if entity.metadata.is_empty() {
            ui.label("No metadata on this entity.");
            return;
        }

        egui::Grid::new("metadata_grid")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                for (key, value) in &entity.metadata {
                    ui.label(key.as_str());
                    ui.label(metadata_text(value));
                    ui.end_row();
                }
            });
    }
}
