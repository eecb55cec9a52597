//! Geometry and hit-testing on overlay pixel coordinates (origin top-left, y-down).

use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned rectangle stored as min/max corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    /// Normalized rectangle spanning two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn expand(&self, amount: f32) -> Self {
        Self {
            min: Point::new(self.min.x - amount, self.min.y - amount),
            max: Point::new(self.max.x + amount, self.max.y + amount),
        }
    }

    /// Edges are inclusive.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Scan order used when several padded boxes contain the pointer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickOrder {
    /// Last-drawn first, matching what is visually on top.
    #[default]
    Topmost,
    /// First match in list order.
    Oldest,
}

/// Whether `point` lies in the annotation's bounds grown by `padding`.
pub fn hit(point: Point, annotation: &Annotation, padding: f32) -> bool {
    annotation.bounds().expand(padding).contains(point)
}

/// Index of the annotation under `point`, if any.
pub fn pick(
    point: Point,
    annotations: &[Annotation],
    padding: f32,
    order: PickOrder,
) -> Option<usize> {
    let mut candidates = annotations.iter().enumerate();
    match order {
        PickOrder::Topmost => candidates
            .rev()
            .find(|(_, a)| hit(point, a, padding))
            .map(|(i, _)| i),
        PickOrder::Oldest => candidates.find(|(_, a)| hit(point, a, padding)).map(|(i, _)| i),
    }
}

/// Half-angle between the shaft and each edge of an arrow head.
const ARROW_HEAD_ANGLE: f32 = std::f32::consts::PI / 6.0;

/// Length of an arrow head for a given stroke width.
pub fn arrow_head_len(line_width: f32) -> f32 {
    10.0 + 2.0 * line_width
}

/// Vertices of the filled head at `end`, or `None` for a zero-length arrow.
pub fn arrow_head(start: Point, end: Point, line_width: f32) -> Option<[Point; 3]> {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    let angle = dy.atan2(dx);
    let len = arrow_head_len(line_width);
    let left = Point::new(
        end.x - len * (angle - ARROW_HEAD_ANGLE).cos(),
        end.y - len * (angle - ARROW_HEAD_ANGLE).sin(),
    );
    let right = Point::new(
        end.x - len * (angle + ARROW_HEAD_ANGLE).cos(),
        end.y - len * (angle + ARROW_HEAD_ANGLE).sin(),
    );
    Some([end, left, right])
}

/// Pixel size of an image fitted into `max_w` x `max_h` without enlarging it.
pub fn fit_size(image_w: u32, image_h: u32, max_w: f32, max_h: f32) -> (u32, u32) {
    if image_w == 0 || image_h == 0 {
        return (image_w, image_h);
    }
    let (w, h) = (image_w as f32, image_h as f32);
    let scale = (max_w / w).min(max_h / h).min(1.0);
    let fitted_w = (w * scale).floor().max(1.0) as u32;
    let fitted_h = (h * scale).floor().max(1.0) as u32;
    (fitted_w, fitted_h)
}
