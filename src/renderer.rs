use std::io::Cursor;
use std::sync::Arc;

use egui::{Color32, Pos2, pos2};
use image::{ImageFormat, Rgba, RgbaImage};
use log::{debug, info};

use crate::geometry::{ImageSpace, distance_to_line_segment};
use crate::palette::StrokeStyle;
use crate::stroke::{ActiveStroke, Stroke};

/// Background the surface starts with
pub const BACKGROUND: Color32 = Color32::WHITE;

/// Immutable PNG snapshot of the surface
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedImage {
    bytes: Arc<[u8]>,
    width: u32,
    height: u32,
}

impl ExportedImage {
    pub const MIME_TYPE: &'static str = "image/png";

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Pixel buffer in image space.
///
/// The only way to change pixels is [`CanvasSurface::draw_segment`]; every
/// change bumps `version` so the shell knows when to re-upload its texture.
#[derive(Debug, Clone)]
pub struct CanvasSurface {
    pixels: RgbaImage,
    version: u64,
}

impl CanvasSurface {
    pub fn new(image_space: ImageSpace, background: Color32) -> Self {
        let [r, g, b, a] = background.to_srgba_unmultiplied();
        Self {
            pixels: RgbaImage::from_pixel(
                image_space.width,
                image_space.height,
                Rgba([r, g, b, a]),
            ),
            version: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color32> {
        (x < self.width() && y < self.height()).then(|| {
            let Rgba([r, g, b, a]) = *self.pixels.get_pixel(x, y);
            Color32::from_rgba_unmultiplied(r, g, b, a)
        })
    }

    /// Rasterize a round-capped segment with anti-aliased edges
    pub fn draw_segment(&mut self, from: Pos2, to: Pos2, style: StrokeStyle) {
        let radius = (style.width / 2.0).max(0.5);
        let (w, h) = (self.width() as f32, self.height() as f32);

        let min_x = (from.x.min(to.x) - radius - 1.0).floor().max(0.0);
        let min_y = (from.y.min(to.y) - radius - 1.0).floor().max(0.0);
        let max_x = (from.x.max(to.x) + radius + 1.0).ceil().min(w - 1.0);
        let max_y = (from.y.max(to.y) + radius + 1.0).ceil().min(h - 1.0);
        if max_x < min_x || max_y < min_y {
            return;
        }

        let [sr, sg, sb, _] = style.color.to_srgba_unmultiplied();
        for y in min_y as u32..=max_y as u32 {
            for x in min_x as u32..=max_x as u32 {
                let center = pos2(x as f32 + 0.5, y as f32 + 0.5);
                let distance = distance_to_line_segment(center, from, to);
                let coverage = (radius - distance + 0.5).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let pixel = self.pixels.get_pixel_mut(x, y);
                let Rgba([dr, dg, db, da]) = *pixel;
                let mix = |s: u8, d: u8| {
                    (s as f32 * coverage + d as f32 * (1.0 - coverage)).round() as u8
                };
                let alpha = (255.0 * coverage + da as f32 * (1.0 - coverage)).round() as u8;
                *pixel = Rgba([mix(sr, dr), mix(sg, dg), mix(sb, db), alpha]);
            }
        }
        self.version += 1;
    }

    /// Encode the current pixels as PNG
    pub fn export_png(&self) -> Result<ExportedImage, image::ImageError> {
        let mut buffer = Cursor::new(Vec::new());
        self.pixels.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(ExportedImage {
            bytes: buffer.into_inner().into(),
            width: self.width(),
            height: self.height(),
        })
    }
}

/// Owns the drawing surface and turns stroke calls into pixels.
///
/// Segments are rendered the moment a point is added, with the style captured
/// by `begin_stroke`. Points are clamped into the image.
#[derive(Debug)]
pub struct StrokeRenderer {
    image_space: ImageSpace,
    surface: CanvasSurface,
    active: Option<ActiveStroke>,
    strokes: Vec<Stroke>,
}

impl StrokeRenderer {
    pub fn new(image_space: ImageSpace) -> Self {
        Self {
            image_space,
            surface: CanvasSurface::new(image_space, BACKGROUND),
            active: None,
            strokes: Vec::new(),
        }
    }

    pub fn image_space(&self) -> ImageSpace {
        self.image_space
    }

    pub fn surface(&self) -> &CanvasSurface {
        &self.surface
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn active_stroke(&self) -> Option<&ActiveStroke> {
        self.active.as_ref()
    }

    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// Open a stroke. A stroke left open is committed first.
    pub fn begin_stroke(&mut self, style: StrokeStyle) {
        self.end_stroke();
        debug!("Begin stroke {:?}", style);
        self.active = Some(ActiveStroke::new(style));
    }

    /// Add a point to the open stroke. Without an open stroke this does nothing.
    pub fn extend_stroke(&mut self, point: Pos2) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let point = self.image_space.clamp(point);
        let style = active.style();
        // The first point stamps a dot so a stroke is visible before it moves.
        let from = active.add_point(point).unwrap_or(point);
        self.surface.draw_segment(from, point, style);
    }

    /// Close the open stroke. Returns true if one was open.
    pub fn end_stroke(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };
        let stroke = active.finish();
        info!(
            "Committed stroke: {} points, width {}",
            stroke.points().len(),
            stroke.width()
        );
        self.strokes.push(stroke);
        true
    }

    /// Snapshot of every pixel rendered so far. Never waits on the open
    /// stroke; its rendered segments are already part of the surface.
    pub fn export(&self) -> Result<ExportedImage, image::ImageError> {
        let exported = self.surface.export_png()?;
        info!(
            "Exported {}x{} canvas ({} bytes)",
            exported.width(),
            exported.height(),
            exported.len()
        );
        Ok(exported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(color: Color32, width: f32) -> StrokeStyle {
        StrokeStyle::new(color, width)
    }

    #[test]
    fn test_new_surface_is_background() {
        let renderer = StrokeRenderer::new(ImageSpace::new(4, 3));
        assert_eq!(renderer.surface().width(), 4);
        assert_eq!(renderer.surface().height(), 3);
        assert_eq!(renderer.surface().pixel(3, 2), Some(BACKGROUND));
        assert_eq!(renderer.surface().pixel(4, 0), None);
    }

    #[test]
    fn test_extend_before_begin_is_ignored() {
        let mut renderer = StrokeRenderer::new(ImageSpace::new(10, 10));
        renderer.extend_stroke(pos2(5.0, 5.0));

        assert_eq!(renderer.surface().version(), 0);
        assert!(!renderer.end_stroke());
        assert!(renderer.strokes().is_empty());
    }

    #[test]
    fn test_segment_is_rendered_immediately() {
        let mut renderer = StrokeRenderer::new(ImageSpace::new(20, 20));
        renderer.begin_stroke(style(Color32::RED, 3.0));
        renderer.extend_stroke(pos2(2.0, 10.5));
        renderer.extend_stroke(pos2(18.0, 10.5));

        // Not ended yet, pixels are already there
        assert_eq!(renderer.surface().pixel(10, 10), Some(Color32::RED));
        assert_eq!(renderer.surface().pixel(10, 2), Some(BACKGROUND));
        assert!(renderer.is_drawing());
    }

    #[test]
    fn test_points_are_clamped_into_image() {
        let mut renderer = StrokeRenderer::new(ImageSpace::new(10, 10));
        renderer.begin_stroke(style(Color32::BLACK, 2.0));
        renderer.extend_stroke(pos2(-50.0, 5.0));
        renderer.extend_stroke(pos2(500.0, 5.0));
        renderer.end_stroke();

        let stroke = &renderer.strokes()[0];
        assert_eq!(stroke.points(), &[pos2(0.0, 5.0), pos2(10.0, 5.0)]);
    }

    #[test]
    fn test_begin_commits_open_stroke() {
        let mut renderer = StrokeRenderer::new(ImageSpace::new(10, 10));
        renderer.begin_stroke(style(Color32::BLACK, 2.0));
        renderer.extend_stroke(pos2(1.0, 1.0));
        renderer.begin_stroke(style(Color32::RED, 2.0));

        assert_eq!(renderer.strokes().len(), 1);
        assert!(renderer.is_drawing());
    }

    #[test]
    fn test_export_is_png() {
        let renderer = StrokeRenderer::new(ImageSpace::new(8, 6));
        let exported = renderer.export().unwrap();

        assert_eq!((exported.width(), exported.height()), (8, 6));
        assert_eq!(&exported.bytes()[1..4], b"PNG");
        let decoded = image::load_from_memory(exported.bytes()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }
}
