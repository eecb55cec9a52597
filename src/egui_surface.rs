//! [`Surface`] that paints the overlay through an `egui::Painter`.

use crate::annotation::Color4;
use crate::geometry::{Point, Rect};
use crate::render::Surface;

/// Paints in overlay pixel space, offset to where the base image sits on screen.
pub struct EguiSurface<'a> {
    painter: &'a egui::Painter,
    image_rect: egui::Rect,
}

impl<'a> EguiSurface<'a> {
    pub fn new(painter: &'a egui::Painter, image_rect: egui::Rect) -> Self {
        Self { painter, image_rect }
    }

    fn to_screen(&self, p: Point) -> egui::Pos2 {
        self.image_rect.min + egui::vec2(p.x, p.y)
    }

    /// Convert a screen position back into overlay pixel space.
    pub fn to_overlay(image_rect: egui::Rect, pos: egui::Pos2) -> Point {
        let rel = pos - image_rect.min;
        Point::new(rel.x, rel.y)
    }
}

impl Surface for EguiSurface<'_> {
    fn size(&self) -> (f32, f32) {
        (self.image_rect.width(), self.image_rect.height())
    }

    // egui rebuilds the frame from scratch, so there is nothing to erase.
    fn clear(&mut self) {}

    fn stroke_line(&mut self, from: Point, to: Point, width: f32, color: Color4) {
        self.painter.line_segment(
            [self.to_screen(from), self.to_screen(to)],
            egui::Stroke::new(width, color.to_egui()),
        );
    }

    fn stroke_rect(&mut self, rect: Rect, width: f32, color: Color4) {
        let screen = egui::Rect::from_min_max(self.to_screen(rect.min), self.to_screen(rect.max));
        self.painter.rect_stroke(
            screen,
            0.0,
            egui::Stroke::new(width, color.to_egui()),
            egui::StrokeKind::Middle,
        );
    }

    fn fill_triangle(&mut self, vertices: [Point; 3], color: Color4) {
        let points = vertices.iter().map(|p| self.to_screen(*p)).collect();
        self.painter.add(egui::Shape::convex_polygon(
            points,
            color.to_egui(),
            egui::Stroke::NONE,
        ));
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color4) {
        self.painter
            .circle_filled(self.to_screen(center), radius, color.to_egui());
    }

    fn draw_label(&mut self, center: Point, text: &str, height: f32, color: Color4) {
        self.painter.text(
            self.to_screen(center),
            egui::Align2::CENTER_CENTER,
            text,
            egui::FontId::proportional(height),
            color.to_egui(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_overlay_subtracts_image_origin() {
        let rect = egui::Rect::from_min_size(egui::pos2(100.0, 50.0), egui::vec2(400.0, 300.0));
        let p = EguiSurface::to_overlay(rect, egui::pos2(110.0, 75.0));
        assert_eq!(p, Point::new(10.0, 25.0));
    }
}
