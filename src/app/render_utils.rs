use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, pos2};

use crate::engine::ViewTransform;

const GRID_STEP: f32 = 56.0;

/// Grid anchored in data space so it pans and zooms with the scene.
pub(super) fn draw_background(painter: &Painter, rect: Rect, transform: ViewTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let mut step = GRID_STEP * transform.zoom;
    while step < 20.0 {
        step *= 2.0;
    }
    let origin = rect.min + transform.pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([pos2(x, rect.top()), pos2(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([pos2(rect.left(), y), pos2(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// A quadratic curve stays inside the hull of its control points.
pub(super) fn curve_visible(rect: Rect, points: [Pos2; 3], padding: f32) -> bool {
    Rect::from_points(&points).expand(padding).intersects(rect)
}
