//! Two-layer render pipeline.
//!
//! The base layer is the source image, decoded and fitted once per session.
//! The overlay is repainted from scratch through a [`Surface`] after every
//! state change. The two are only merged by the exporter.

use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};

use crate::annotation::{Annotation, Color4, PaletteColor, PendingShape, Tool};
use crate::config::RenderStyle;
use crate::error::EngineError;
use crate::geometry::{arrow_head, fit_size, Point, Rect};

// ── Drawing surface ─────────────────────────────────────────────────────────

/// A 2D drawing target in overlay pixel space.
pub trait Surface {
    fn size(&self) -> (f32, f32);

    fn clear(&mut self);

    fn stroke_line(&mut self, from: Point, to: Point, width: f32, color: Color4);

    fn stroke_rect(&mut self, rect: Rect, width: f32, color: Color4) {
        let top_right = Point::new(rect.max.x, rect.min.y);
        let bottom_left = Point::new(rect.min.x, rect.max.y);
        self.stroke_line(rect.min, top_right, width, color);
        self.stroke_line(top_right, rect.max, width, color);
        self.stroke_line(rect.max, bottom_left, width, color);
        self.stroke_line(bottom_left, rect.min, width, color);
    }

    fn fill_triangle(&mut self, vertices: [Point; 3], color: Color4);

    fn fill_circle(&mut self, center: Point, radius: f32, color: Color4);

    /// Text centered on `center`, `height` pixels tall.
    fn draw_label(&mut self, center: Point, text: &str, height: f32, color: Color4);
}

// ── Base layer ──────────────────────────────────────────────────────────────

/// The fitted source image. It has no mutating methods: once built it is
/// never rasterized again.
#[derive(Debug, Clone)]
pub struct BaseLayer {
    title: String,
    source_size: (u32, u32),
    pixels: RgbaImage,
}

impl BaseLayer {
    /// Decode encoded image bytes and fit them into `max_size`.
    pub fn decode(title: &str, bytes: &[u8], max_size: (f32, f32)) -> Result<Self, EngineError> {
        let img = image::load_from_memory(bytes).map_err(|source| EngineError::ImageLoad {
            title: title.to_string(),
            source,
        })?;
        Ok(Self::from_image(title, &img, max_size))
    }

    pub fn from_image(title: &str, img: &DynamicImage, max_size: (f32, f32)) -> Self {
        let source_size = (img.width(), img.height());
        let (w, h) = fit_size(source_size.0, source_size.1, max_size.0, max_size.1);
        let rgba = img.to_rgba8();
        let pixels = if (w, h) == source_size {
            rgba
        } else {
            image::imageops::resize(&rgba, w, h, FilterType::Triangle)
        };
        log::info!(
            "base layer '{}' rasterized at {}x{} (source {}x{})",
            title,
            w,
            h,
            source_size.0,
            source_size.1
        );
        Self {
            title: title.to_string(),
            source_size,
            pixels,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn source_size(&self) -> (u32, u32) {
        self.source_size
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

// ── Overlay ─────────────────────────────────────────────────────────────────

/// Everything the overlay painter reads.
#[derive(Debug, Clone, Copy)]
pub struct OverlayView<'a> {
    pub annotations: &'a [Annotation],
    pub hover: Option<usize>,
    pub pending: Option<&'a PendingShape>,
}

impl<'a> OverlayView<'a> {
    /// Committed annotations only, as they appear in an export.
    pub fn committed(annotations: &'a [Annotation]) -> Self {
        Self {
            annotations,
            hover: None,
            pending: None,
        }
    }
}

/// Clear `surface` and repaint annotations, note badges, then the pending shape.
pub fn paint_overlay<S: Surface + ?Sized>(
    surface: &mut S,
    view: &OverlayView<'_>,
    style: &RenderStyle,
) {
    surface.clear();

    for (i, ann) in view.annotations.iter().enumerate() {
        if view.hover == Some(i) {
            let width = ann.line_width.px() + style.highlight_extra_width;
            paint_shape(surface, ann, style.highlight_color, width);
        } else {
            paint_shape(surface, ann, ann.color.color(), ann.line_width.px());
        }
    }

    for (i, ann) in view.annotations.iter().enumerate() {
        if ann.has_note() {
            paint_badge(surface, ann, i + 1, style);
        }
    }

    if let Some(pending) = view.pending {
        let preview = pending.preview();
        paint_shape(surface, &preview, preview.color.color(), preview.line_width.px());
    }
}

fn paint_shape<S: Surface + ?Sized>(surface: &mut S, ann: &Annotation, color: Color4, width: f32) {
    match ann.tool {
        Tool::Rectangle => surface.stroke_rect(ann.bounds(), width, color),
        Tool::Arrow => {
            surface.stroke_line(ann.start, ann.end, width, color);
            if let Some(head) = arrow_head(ann.start, ann.end, width) {
                surface.fill_triangle(head, color);
            }
        }
    }
}

/// Numbered disc at the shape's top-left corner, kept inside the surface.
fn paint_badge<S: Surface + ?Sized>(
    surface: &mut S,
    ann: &Annotation,
    number: usize,
    style: &RenderStyle,
) {
    let r = style.badge_radius;
    let (w, h) = surface.size();
    let corner = ann.bounds().min;
    let center = Point::new(clamp_into(corner.x, r, w - r), clamp_into(corner.y, r, h - r));
    let text_color = match ann.color {
        PaletteColor::White | PaletteColor::Yellow => PaletteColor::Black.color(),
        _ => style.badge_text_color,
    };
    surface.fill_circle(center, r, ann.color.color());
    surface.draw_label(center, &number.to_string(), r * 1.2, text_color);
}

// Unlike f32::clamp this tolerates lo > hi on surfaces smaller than a badge.
fn clamp_into(v: f32, lo: f32, hi: f32) -> f32 {
    v.max(lo).min(hi)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::annotation::LineWidth;

    /// Records draw calls instead of rasterizing them.
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub(crate) calls: Vec<String>,
    }

    impl Surface for Recorder {
        fn size(&self) -> (f32, f32) {
            (200.0, 100.0)
        }

        fn clear(&mut self) {
            self.calls.clear();
            self.calls.push("clear".into());
        }

        fn stroke_line(&mut self, from: Point, to: Point, width: f32, color: Color4) {
            self.calls.push(format!(
                "line {},{}->{},{} w{} {:?}",
                from.x,
                from.y,
                to.x,
                to.y,
                width,
                color.to_rgba8()
            ));
        }

        fn stroke_rect(&mut self, rect: Rect, width: f32, color: Color4) {
            self.calls.push(format!(
                "rect {},{}-{},{} w{} {:?}",
                rect.min.x,
                rect.min.y,
                rect.max.x,
                rect.max.y,
                width,
                color.to_rgba8()
            ));
        }

        fn fill_triangle(&mut self, _vertices: [Point; 3], _color: Color4) {
            self.calls.push("triangle".into());
        }

        fn fill_circle(&mut self, center: Point, _radius: f32, _color: Color4) {
            self.calls.push(format!("circle {},{}", center.x, center.y));
        }

        fn draw_label(&mut self, _center: Point, text: &str, _height: f32, _color: Color4) {
            self.calls.push(format!("label {text}"));
        }
    }

    fn ann(tool: Tool, a: (f32, f32), b: (f32, f32)) -> Annotation {
        Annotation::new(
            tool,
            Point::new(a.0, a.1),
            Point::new(b.0, b.1),
            PaletteColor::Red,
            LineWidth::Medium,
        )
    }

    #[test]
    fn test_paint_order_and_badges() {
        let mut first = ann(Tool::Rectangle, (10.0, 10.0), (50.0, 40.0));
        first.text = "one".into();
        let second = ann(Tool::Arrow, (60.0, 60.0), (100.0, 90.0));
        let anns = vec![first, second];
        let mut rec = Recorder::default();

        paint_overlay(&mut rec, &OverlayView::committed(&anns), &RenderStyle::default());

        assert_eq!(rec.calls[0], "clear");
        assert!(rec.calls[1].starts_with("rect 10,10-50,40 w4"));
        assert!(rec.calls[2].starts_with("line 60,60->100,90"));
        assert_eq!(rec.calls[3], "triangle");
        assert_eq!(rec.calls[4], "circle 10,10");
        assert_eq!(rec.calls[5], "label 1");
        assert_eq!(rec.calls.len(), 6);
    }

    #[test]
    fn test_hover_uses_highlight() {
        let anns = vec![ann(Tool::Rectangle, (10.0, 10.0), (50.0, 40.0))];
        let style = RenderStyle::default();
        let view = OverlayView {
            annotations: &anns,
            hover: Some(0),
            pending: None,
        };
        let mut rec = Recorder::default();
        paint_overlay(&mut rec, &view, &style);

        let expected = format!("w6 {:?}", style.highlight_color.to_rgba8());
        assert!(rec.calls[1].ends_with(&expected), "{}", rec.calls[1]);
    }

    #[test]
    fn test_pending_painted_last() {
        let anns = vec![ann(Tool::Rectangle, (10.0, 10.0), (50.0, 40.0))];
        let pending = PendingShape {
            tool: Tool::Rectangle,
            color: PaletteColor::Blue,
            line_width: LineWidth::Thin,
            start: Point::new(0.0, 0.0),
            current: Point::new(5.0, 5.0),
        };
        let view = OverlayView {
            annotations: &anns,
            hover: None,
            pending: Some(&pending),
        };
        let mut rec = Recorder::default();
        paint_overlay(&mut rec, &view, &RenderStyle::default());
        assert!(rec.calls.last().unwrap().starts_with("rect 0,0-5,5 w2"));
    }

    #[test]
    fn test_badge_numbers_follow_list_position() {
        let mut a = ann(Tool::Rectangle, (20.0, 20.0), (30.0, 30.0));
        let b = ann(Tool::Rectangle, (40.0, 40.0), (60.0, 60.0));
        let mut c = ann(Tool::Rectangle, (70.0, 20.0), (90.0, 30.0));
        a.text = "a".into();
        c.text = "c".into();
        let anns = vec![a, b, c];
        let mut rec = Recorder::default();
        paint_overlay(&mut rec, &OverlayView::committed(&anns), &RenderStyle::default());

        let labels: Vec<_> = rec.calls.iter().filter(|c| c.starts_with("label")).collect();
        assert_eq!(labels, vec!["label 1", "label 3"]);
    }

    #[test]
    fn test_badge_clamped_inside_surface() {
        let mut a = ann(Tool::Rectangle, (0.0, 0.0), (30.0, 30.0));
        a.text = "edge".into();
        let anns = vec![a];
        let mut rec = Recorder::default();
        paint_overlay(&mut rec, &OverlayView::committed(&anns), &RenderStyle::default());
        assert!(rec.calls.contains(&"circle 10,10".to_string()));
    }

    #[test]
    fn test_zero_length_arrow_has_no_head() {
        let anns = vec![ann(Tool::Arrow, (5.0, 5.0), (5.0, 5.0))];
        let mut rec = Recorder::default();
        paint_overlay(&mut rec, &OverlayView::committed(&anns), &RenderStyle::default());
        assert!(!rec.calls.contains(&"triangle".to_string()));
    }

    #[test]
    fn test_base_layer_fits_once() {
        let pixels = RgbaImage::from_pixel(400, 200, image::Rgba([9, 9, 9, 255]));
        let img = DynamicImage::ImageRgba8(pixels);
        let base = BaseLayer::from_image("wide", &img, (100.0, 100.0));
        assert_eq!((base.width(), base.height()), (100, 50));
        assert_eq!(base.source_size(), (400, 200));
        assert_eq!(base.title(), "wide");
    }

    #[test]
    fn test_base_layer_decode_failure() {
        let err = BaseLayer::decode("broken", b"not an image", (100.0, 100.0)).unwrap_err();
        assert!(matches!(err, EngineError::ImageLoad { ref title, .. } if title == "broken"));
    }
}
