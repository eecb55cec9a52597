//! Software [`Surface`] backed by a `tiny_skia::Pixmap`, used for the export
//! overlay. Badge labels are rasterized with `ab_glyph` from egui's bundled
//! monospace font.

use std::sync::OnceLock;

use ab_glyph::{point, Font, FontArc, OutlinedGlyph, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use tiny_skia::{FillRule, LineCap, Mask, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

use crate::annotation::Color4;
use crate::geometry::{Point, Rect};
use crate::render::Surface;

static LABEL_FONT: OnceLock<Option<FontArc>> = OnceLock::new();

fn label_font() -> Option<&'static FontArc> {
    LABEL_FONT
        .get_or_init(|| match FontArc::try_from_slice(epaint_default_fonts::HACK_REGULAR) {
            Ok(font) => Some(font),
            Err(e) => {
                log::error!("failed to parse label font: {e}");
                None
            }
        })
        .as_ref()
}

/// Transparent anti-aliased RGBA layer. Pixels are stored premultiplied.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixmap: Pixmap,
}

impl RasterSurface {
    /// `None` when either dimension is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Pixmap::new(width, height).map(|pixmap| Self { pixmap })
    }

    /// Straight-alpha copy of the layer for compositing with `image`.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut out = RgbaImage::new(self.pixmap.width(), self.pixmap.height());
        for (dst, src) in out.pixels_mut().zip(self.pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }

    fn stroke_path(&mut self, path: Option<Path>, width: f32, color: Color4, line_cap: LineCap) {
        let Some(path) = path else {
            return;
        };
        let stroke = Stroke {
            width,
            line_cap,
            ..Stroke::default()
        };
        self.pixmap.stroke_path(
            &path,
            &paint_for(color),
            &stroke,
            Transform::identity(),
            None,
        );
    }

    fn fill_path(&mut self, path: Option<Path>, color: Color4) {
        let Some(path) = path else {
            return;
        };
        self.pixmap.fill_path(
            &path,
            &paint_for(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
}

fn union_bounds(a: ab_glyph::Rect, b: ab_glyph::Rect) -> ab_glyph::Rect {
    ab_glyph::Rect {
        min: point(a.min.x.min(b.min.x), a.min.y.min(b.min.y)),
        max: point(a.max.x.max(b.max.x), a.max.y.max(b.max.y)),
    }
}

fn paint_for(color: Color4) -> Paint<'static> {
    let [r, g, b, a] = color.to_rgba8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

impl Surface for RasterSurface {
    fn size(&self) -> (f32, f32) {
        (self.pixmap.width() as f32, self.pixmap.height() as f32)
    }

    fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: f32, color: Color4) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.x, from.y);
        pb.line_to(to.x, to.y);
        self.stroke_path(pb.finish(), width, color, LineCap::Round);
    }

    fn stroke_rect(&mut self, rect: Rect, width: f32, color: Color4) {
        let mut pb = PathBuilder::new();
        pb.move_to(rect.min.x, rect.min.y);
        pb.line_to(rect.max.x, rect.min.y);
        pb.line_to(rect.max.x, rect.max.y);
        pb.line_to(rect.min.x, rect.max.y);
        pb.close();
        self.stroke_path(pb.finish(), width, color, LineCap::Butt);
    }

    fn fill_triangle(&mut self, vertices: [Point; 3], color: Color4) {
        let [a, b, c] = vertices;
        let mut pb = PathBuilder::new();
        pb.move_to(a.x, a.y);
        pb.line_to(b.x, b.y);
        pb.line_to(c.x, c.y);
        pb.close();
        self.fill_path(pb.finish(), color);
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color4) {
        self.fill_path(PathBuilder::from_circle(center.x, center.y, radius), color);
    }

    fn draw_label(&mut self, center: Point, text: &str, height: f32, color: Color4) {
        let Some(font) = label_font() else {
            return;
        };
        let scaled = font.as_scaled(PxScale::from(height));
        let mut caret = 0.0;
        let mut outlines: Vec<OutlinedGlyph> = Vec::new();
        for ch in text.chars() {
            let mut glyph = scaled.scaled_glyph(ch);
            glyph.position = point(caret, 0.0);
            caret += scaled.h_advance(glyph.id);
            outlines.extend(font.outline_glyph(glyph));
        }

        let Some(bounds) = outlines.iter().map(|g| g.px_bounds()).reduce(union_bounds) else {
            return;
        };
        let dx = (center.x - (bounds.min.x + bounds.max.x) / 2.0).round() as i64;
        let dy = (center.y - (bounds.min.y + bounds.max.y) / 2.0).round() as i64;

        let (w, h) = (self.pixmap.width(), self.pixmap.height());
        let Some(mut mask) = Mask::new(w, h) else {
            return;
        };
        let coverage = mask.data_mut();
        for glyph in &outlines {
            let origin = glyph.px_bounds().min;
            glyph.draw(|x, y, c| {
                let px = origin.x as i64 + x as i64 + dx;
                let py = origin.y as i64 + y as i64 + dy;
                if px < 0 || py < 0 || px >= w as i64 || py >= h as i64 {
                    return;
                }
                let i = py as usize * w as usize + px as usize;
                coverage[i] = coverage[i].max((c.clamp(0.0, 1.0) * 255.0).round() as u8);
            });
        }

        if let Some(area) = tiny_skia::Rect::from_xywh(0.0, 0.0, w as f32, h as f32) {
            self.pixmap.fill_rect(
                area,
                &paint_for(color),
                Transform::identity(),
                Some(&mask),
            );
        }
    }
}
