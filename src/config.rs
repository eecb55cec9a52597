//! Editor configuration.
//!
//! Every field has a default, so a config file only needs the settings it
//! changes. A missing file is not an error.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::annotation::Color4;
use crate::error::ConfigError;
use crate::geometry::PickOrder;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Pointer tolerance around a shape's bounding box, in pixels.
    #[serde(default = "default_hit_padding")]
    pub hit_padding: f32,

    #[serde(default)]
    pub pick_order: PickOrder,

    /// Drags shorter than this are treated as clicks.
    #[serde(default = "default_click_tolerance")]
    pub click_tolerance: f32,

    #[serde(default)]
    pub fit: FitBounds,

    #[serde(default)]
    pub style: RenderStyle,
}

fn default_hit_padding() -> f32 {
    10.0
}

fn default_click_tolerance() -> f32 {
    3.0
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            hit_padding: default_hit_padding(),
            pick_order: PickOrder::default(),
            click_tolerance: default_click_tolerance(),
            fit: FitBounds::default(),
            style: RenderStyle::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let config = Self::from_json(&data)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }
}

/// Fraction of the viewport the base image is fitted into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitBounds {
    pub width_fraction: f32,
    pub height_fraction: f32,
}

impl Default for FitBounds {
    fn default() -> Self {
        Self {
            width_fraction: 0.8,
            height_fraction: 0.7,
        }
    }
}

impl FitBounds {
    pub fn max_size(&self, viewport: (f32, f32)) -> (f32, f32) {
        (viewport.0 * self.width_fraction, viewport.1 * self.height_fraction)
    }
}

/// Overlay styling shared by the live view and the export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    pub highlight_color: Color4,
    /// Added to the stroke width of the hovered annotation.
    pub highlight_extra_width: f32,
    pub badge_radius: f32,
    pub badge_text_color: Color4,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            highlight_color: Color4::rgb(0xff, 0xd7, 0x00),
            highlight_extra_width: 2.0,
            badge_radius: 10.0,
            badge_text_color: Color4::rgb(0xff, 0xff, 0xff),
        }
    }
}
