//! Flatten the base layer and committed annotations into one PNG.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, RgbaImage};

use crate::annotation::Annotation;
use crate::config::RenderStyle;
use crate::error::EngineError;
use crate::raster::RasterSurface;
use crate::render::{paint_overlay, BaseLayer, OverlayView};

/// Flattened raster plus the structured annotation list for the host's legend.
#[derive(Debug, Clone)]
pub struct Export {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
    /// `data:image/png;base64,...`
    pub data_uri: String,
    pub annotations: Vec<Annotation>,
}

/// Composite `annotations` over `base`. Hover and pending state never reach
/// this function; callers pass the committed list only.
pub fn flatten(
    base: &BaseLayer,
    annotations: &[Annotation],
    style: &RenderStyle,
) -> Result<Export, EngineError> {
    if annotations.is_empty() {
        return Err(EngineError::EmptyExport);
    }

    let (width, height) = (base.width(), base.height());
    let mut overlay =
        RasterSurface::new(width, height).ok_or(EngineError::Surface { width, height })?;
    paint_overlay(&mut overlay, &OverlayView::committed(annotations), style);

    let mut merged = base.pixels().clone();
    image::imageops::overlay(&mut merged, &overlay.to_rgba_image(), 0, 0);

    let png = encode_png(&merged)?;
    let data_uri = format!("data:image/png;base64,{}", STANDARD.encode(&png));
    log::info!(
        "exported '{}': {}x{}, {} annotations, {} bytes",
        base.title(),
        merged.width(),
        merged.height(),
        annotations.len(),
        png.len()
    );

    Ok(Export {
        width: merged.width(),
        height: merged.height(),
        png,
        data_uri,
        annotations: annotations.to_vec(),
    })
}

fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{LineWidth, PaletteColor, Tool};
    use crate::geometry::Point;
    use image::{DynamicImage, Rgba};

    fn white_base(w: u32, h: u32) -> BaseLayer {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255])));
        BaseLayer::from_image("white", &img, (w as f32, h as f32))
    }

    fn rect() -> Annotation {
        Annotation::new(
            Tool::Rectangle,
            Point::new(10.0, 10.0),
            Point::new(50.0, 40.0),
            PaletteColor::Red,
            LineWidth::Medium,
        )
    }

    #[test]
    fn test_empty_export_is_rejected() {
        let base = white_base(20, 20);
        let err = flatten(&base, &[], &RenderStyle::default()).unwrap_err();
        assert!(matches!(err, EngineError::EmptyExport));
    }

    #[test]
    fn test_export_matches_base_dimensions() {
        let base = white_base(100, 80);
        let anns = vec![rect()];
        let export = flatten(&base, &anns, &RenderStyle::default()).unwrap();

        assert_eq!((export.width, export.height), (100, 80));
        assert_eq!(export.annotations, anns);

        let decoded = image::load_from_memory(&export.png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (100, 80));
        assert_eq!(decoded.get_pixel(10, 25).0, [0xef, 0x44, 0x44, 0xff]);
        assert_eq!(decoded.get_pixel(30, 25).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_export_leaves_base_untouched() {
        let base = white_base(60, 60);
        let before = base.pixels().clone();
        flatten(&base, &[rect()], &RenderStyle::default()).unwrap();
        assert_eq!(base.pixels(), &before);
    }

    #[test]
    fn test_data_uri_decodes_to_png() {
        let base = white_base(64, 48);
        let export = flatten(&base, &[rect()], &RenderStyle::default()).unwrap();
        let payload = export.data_uri.strip_prefix("data:image/png;base64,").unwrap();
        assert_eq!(STANDARD.decode(payload).unwrap(), export.png);
    }
}
