//! Annotation data model: tools, palette, stroke widths and committed shapes.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

// ── Color ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color4 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color4 {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.a.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }

    pub fn to_egui(&self) -> egui::Color32 {
        let [r, g, b, a] = self.to_rgba8();
        egui::Color32::from_rgba_unmultiplied(r, g, b, a)
    }
}

impl Default for Color4 {
    fn default() -> Self {
        PaletteColor::Red.color()
    }
}

/// The fixed palette annotations pick their color from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteColor {
    #[default]
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Black,
    White,
}

impl PaletteColor {
    pub const ALL: [PaletteColor; 8] = [
        PaletteColor::Red,
        PaletteColor::Orange,
        PaletteColor::Yellow,
        PaletteColor::Green,
        PaletteColor::Blue,
        PaletteColor::Purple,
        PaletteColor::Black,
        PaletteColor::White,
    ];

    pub fn color(self) -> Color4 {
        match self {
            PaletteColor::Red => Color4::rgb(0xef, 0x44, 0x44),
            PaletteColor::Orange => Color4::rgb(0xf9, 0x73, 0x16),
            PaletteColor::Yellow => Color4::rgb(0xea, 0xb3, 0x08),
            PaletteColor::Green => Color4::rgb(0x22, 0xc5, 0x5e),
            PaletteColor::Blue => Color4::rgb(0x3b, 0x82, 0xf6),
            PaletteColor::Purple => Color4::rgb(0xa8, 0x55, 0xf7),
            PaletteColor::Black => Color4::rgb(0x00, 0x00, 0x00),
            PaletteColor::White => Color4::rgb(0xff, 0xff, 0xff),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PaletteColor::Red => "Red",
            PaletteColor::Orange => "Orange",
            PaletteColor::Yellow => "Yellow",
            PaletteColor::Green => "Green",
            PaletteColor::Blue => "Blue",
            PaletteColor::Purple => "Purple",
            PaletteColor::Black => "Black",
            PaletteColor::White => "White",
        }
    }
}

// ── Stroke width ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineWidth {
    Thin,
    #[default]
    Medium,
    Thick,
}

impl LineWidth {
    pub const ALL: [LineWidth; 3] = [LineWidth::Thin, LineWidth::Medium, LineWidth::Thick];

    /// Stroke width in overlay pixels.
    pub fn px(self) -> f32 {
        match self {
            LineWidth::Thin => 2.0,
            LineWidth::Medium => 4.0,
            LineWidth::Thick => 6.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LineWidth::Thin => "Thin",
            LineWidth::Medium => "Medium",
            LineWidth::Thick => "Thick",
        }
    }
}

// ── Shapes ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Rectangle,
    Arrow,
}

impl Tool {
    pub fn name(self) -> &'static str {
        match self {
            Tool::Rectangle => "Rectangle",
            Tool::Arrow => "Arrow",
        }
    }
}

/// Tool and style used for the next shape the user draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ToolSettings {
    pub tool: Tool,
    pub color: PaletteColor,
    pub line_width: LineWidth,
}

/// One committed shape. Its position in the session's list is its identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub tool: Tool,
    pub start: Point,
    pub end: Point,
    pub color: PaletteColor,
    pub line_width: LineWidth,
    /// Empty means no note.
    #[serde(default)]
    pub text: String,
}

impl Annotation {
    pub fn new(
        tool: Tool,
        start: Point,
        end: Point,
        color: PaletteColor,
        line_width: LineWidth,
    ) -> Self {
        Self {
            tool,
            start,
            end,
            color,
            line_width,
            text: String::new(),
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_corners(self.start, self.end)
    }

    pub fn has_note(&self) -> bool {
        !self.text.is_empty()
    }
}

/// A shape being dragged out; not part of the committed list until commit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingShape {
    pub tool: Tool,
    pub color: PaletteColor,
    pub line_width: LineWidth,
    pub start: Point,
    pub current: Point,
}

impl PendingShape {
    pub fn into_annotation(self, end: Point) -> Annotation {
        Annotation::new(self.tool, self.start, end, self.color, self.line_width)
    }

    /// Preview geometry as an annotation, for painting.
    pub fn preview(&self) -> Annotation {
        self.into_annotation(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_color_to_rgba8() {
        assert_eq!(PaletteColor::Red.color().to_rgba8(), [0xef, 0x44, 0x44, 0xff]);
        assert_eq!(PaletteColor::White.color().to_rgba8(), [255, 255, 255, 255]);
    }

    #[test]
    fn test_line_widths_increase() {
        let widths: Vec<f32> = LineWidth::ALL.iter().map(|w| w.px()).collect();
        assert!(widths.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_annotation_json_shape() {
        let ann = Annotation::new(
            Tool::Arrow,
            Point::new(1.0, 2.0),
            Point::new(3.0, 4.0),
            PaletteColor::Blue,
            LineWidth::Thick,
        );
        let json = serde_json::to_value(&ann).unwrap();
        assert_eq!(json["tool"], "arrow");
        assert_eq!(json["color"], "blue");
        assert_eq!(json["line_width"], "thick");
        assert_eq!(json["text"], "");
    }

    #[test]
    fn test_missing_text_defaults_to_empty() {
        let json = r#"{"tool":"rectangle","start":{"x":0,"y":0},"end":{"x":5,"y":5},
            "color":"red","line_width":"thin"}"#;
        let ann: Annotation = serde_json::from_str(json).unwrap();
        assert!(!ann.has_note());
    }

    #[test]
    fn test_pending_preview_uses_current_point() {
        let pending = PendingShape {
            tool: Tool::Rectangle,
            color: PaletteColor::Green,
            line_width: LineWidth::Thin,
            start: Point::new(5.0, 5.0),
            current: Point::new(20.0, 30.0),
        };
        let preview = pending.preview();
        assert_eq!(preview.end, Point::new(20.0, 30.0));
        assert_eq!(preview.color, PaletteColor::Green);
    }
}
