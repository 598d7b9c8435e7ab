use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

use super::config::InteractionTuning;

/// Root scene transform: `screen = data * zoom + pan`, with screen coordinates
/// relative to the top-left corner of the host container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub pan: Vec2,
    pub zoom: f32,
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        pan: Vec2::ZERO,
        zoom: 1.0,
    };

    pub fn to_screen(self, data: Vec2) -> Pos2 {
        (data * self.zoom + self.pan).to_pos2()
    }

    pub fn to_data(self, screen: Pos2) -> Vec2 {
        (screen.to_vec2() - self.pan) / self.zoom.max(f32::EPSILON)
    }

    pub fn inverse(self) -> Self {
        let zoom = self.zoom.max(f32::EPSILON);
        Self {
            pan: -self.pan / zoom,
            zoom: 1.0 / zoom,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Viewport {
    pub pan: Vec2,
    pub zoom: f32,
    pub size: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            size: vec2(1200.0, 800.0),
        }
    }
}

impl Viewport {
    pub fn transform(&self) -> ViewTransform {
        ViewTransform {
            pan: self.pan,
            zoom: self.zoom,
        }
    }

    /// Data-space rectangle the layout is allowed to use.
    pub fn bounds(&self) -> Rect {
        Rect::from_min_size(Pos2::ZERO, self.size)
    }

    pub fn set_transform(&mut self, pan: Vec2, zoom: f32, tuning: &InteractionTuning) {
        if pan.is_finite() {
            self.pan = pan;
        }
        if zoom.is_finite() {
            self.zoom = zoom.clamp(tuning.zoom_min, tuning.zoom_max);
        }
    }

    /// Rescales around `anchor` so the data point under it stays put.
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32, tuning: &InteractionTuning) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }

        let data_under_pointer = self.transform().to_data(anchor);
        let zoom = (self.zoom * factor).clamp(tuning.zoom_min, tuning.zoom_max);
        let pan = anchor.to_vec2() - data_under_pointer * zoom;
        if !pan.is_finite() {
            return;
        }

        self.zoom = zoom;
        self.pan = pan;
    }

    /// Fits the padded bounding box of `circles` (centre, radius) into the viewport,
    /// never zooming in past 1.0. Returns false when there is nothing to fit.
    pub fn fit_to_content(
        &mut self,
        circles: impl IntoIterator<Item = (Vec2, f32)>,
        tuning: &InteractionTuning,
    ) -> bool {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for (center, radius) in circles {
            if !center.is_finite() {
                continue;
            }
            let reach = radius + tuning.fit_label_padding;
            min = min.min(center - vec2(reach, reach));
            max = max.max(center + vec2(reach, reach));
        }

        if !min.is_finite() || !max.is_finite() || self.size.x <= 0.0 || self.size.y <= 0.0 {
            return false;
        }

        let box_size = (max - min).max(vec2(1.0, 1.0));
        let zoom = (self.size.x / box_size.x)
            .min(self.size.y / box_size.y)
            .min(1.0)
            .clamp(tuning.zoom_min, tuning.zoom_max);
        let box_center = (min + max) * 0.5;

        self.zoom = zoom;
        self.pan = self.size * 0.5 - box_center * zoom;
        true
    }

    pub fn clamp_to_container(&self, screen: Pos2) -> Pos2 {
        pos2(
            screen.x.max(0.0).min(self.size.x),
            screen.y.max(0.0).min(self.size.y),
        )
    }
}
