/// Raster surface backed by a tiny-skia pixmap.
///
/// The surface is allocated at `logical size * scale` device pixels and
/// every drawing call takes logical coordinates; the scale is applied as a
/// uniform transform. An optional clip mask constrains all fills.
use tiny_skia::{
    BlendMode, FillRule, FilterQuality, Mask, Path, PathBuilder, Pixmap, PixmapPaint, Stroke,
    Transform,
};

use crate::fonts::FontFace;
use crate::rendering::layout::TextMeasure;
use crate::rendering::paint::solid;
use crate::style::Rgba;
use crate::{Error, Result};

/// Horizontal anchoring of a text run relative to its x coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

pub struct Canvas {
    pixmap: Pixmap,
    transform: Transform,
    clip: Option<Mask>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, scale: f32) -> Result<Self> {
        let device_w = (width as f32 * scale).round() as u32;
        let device_h = (height as f32 * scale).round() as u32;
        let pixmap = Pixmap::new(device_w, device_h).ok_or_else(|| {
            Error::RenderError(format!("Failed to allocate {}x{} surface", device_w, device_h))
        })?;
        Ok(Self {
            pixmap,
            transform: Transform::from_scale(scale, scale),
            clip: None,
        })
    }

    /// Device width in pixels.
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Device height in pixels.
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn fill_path(&mut self, path: &Path, color: Rgba) {
        self.pixmap.fill_path(
            path,
            &solid(color),
            FillRule::Winding,
            self.transform,
            self.clip.as_ref(),
        );
    }

    /// Stroke `path` with a line `width` logical pixels wide.
    pub fn stroke_path(&mut self, path: &Path, color: Rgba, width: f32) {
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap.stroke_path(
            path,
            &solid(color),
            &stroke,
            self.transform,
            self.clip.as_ref(),
        );
    }

    /// Restrict subsequent drawing to the interior of `path`.
    pub fn set_clip(&mut self, path: &Path) -> Result<()> {
        let mut mask = Mask::new(self.width(), self.height())
            .ok_or_else(|| Error::RenderError("Failed to allocate clip mask".into()))?;
        mask.fill_path(path, FillRule::Winding, true, self.transform);
        self.clip = Some(mask);
        Ok(())
    }

    pub fn reset_clip(&mut self) {
        self.clip = None;
    }

    /// Fill `text` with its baseline at `y`. Returns the advance width.
    pub fn fill_text(
        &mut self,
        font: &FontFace<'_>,
        text: &str,
        x: f32,
        y: f32,
        color: Rgba,
        align: TextAlign,
    ) -> f32 {
        let advance = font.measure(text);
        let mut pen_x = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - advance / 2.0,
        };

        let mut builder = PathBuilder::new();
        for ch in text.chars() {
            let glyph = font.glyph(ch);
            let mut pen = GlyphPen {
                builder: &mut builder,
                x: pen_x,
                y,
                scale: font.scale(),
            };
            // Glyphs without an outline (spaces) only advance the pen
            let _ = font.face().outline_glyph(glyph, &mut pen);
            pen_x += font.advance(glyph);
        }

        if let Some(path) = builder.finish() {
            self.fill_path(&path, color);
        }
        advance
    }

    /// Draw `image` scaled into the logical box `(x, y, width, height)`.
    pub fn draw_image(&mut self, image: &Pixmap, x: f32, y: f32, width: f32, height: f32) {
        let sx = width / image.width() as f32;
        let sy = height / image.height() as f32;
        let transform = self.transform.pre_translate(x, y).pre_scale(sx, sy);
        let paint = PixmapPaint {
            opacity: 1.0,
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Nearest,
        };
        self.pixmap
            .draw_pixmap(0, 0, image.as_ref(), &paint, transform, self.clip.as_ref());
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| Error::EncodeError(e.to_string()))
    }
}

/// Feeds font-unit outlines into a path, flipping y and moving the origin
/// to the pen position on the baseline.
struct GlyphPen<'a> {
    builder: &'a mut PathBuilder,
    x: f32,
    y: f32,
    scale: f32,
}

impl GlyphPen<'_> {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.x + x * self.scale, self.y - y * self.scale)
    }
}

impl ttf_parser::OutlineBuilder for GlyphPen<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::paint::rounded_rect;

    fn pixel(canvas: &Canvas, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let p = canvas.pixmap().pixel(x, y).unwrap().demultiply();
        (p.red(), p.green(), p.blue(), p.alpha())
    }

    #[test]
    fn surface_is_scaled() {
        let canvas = Canvas::new(100, 40, 2.0).unwrap();
        assert_eq!(canvas.width(), 200);
        assert_eq!(canvas.height(), 80);
    }

    #[test]
    fn fills_use_logical_coordinates() {
        let mut canvas = Canvas::new(10, 10, 2.0).unwrap();
        let path = rounded_rect(0.0, 0.0, 5.0, 10.0, 0.0).unwrap();
        canvas.fill_path(&path, Rgba::rgb(255, 0, 0));
        assert_eq!(pixel(&canvas, 2, 10), (255, 0, 0, 255));
        assert_eq!(pixel(&canvas, 15, 10).3, 0);
    }

    #[test]
    fn clip_constrains_fills() {
        let mut canvas = Canvas::new(10, 10, 1.0).unwrap();
        canvas
            .set_clip(&rounded_rect(0.0, 0.0, 5.0, 10.0, 0.0).unwrap())
            .unwrap();
        canvas.fill_path(&rounded_rect(0.0, 0.0, 10.0, 10.0, 0.0).unwrap(), Rgba::rgb(0, 0, 255));
        assert_eq!(pixel(&canvas, 1, 5), (0, 0, 255, 255));
        assert_eq!(pixel(&canvas, 8, 5).3, 0);

        canvas.reset_clip();
        canvas.fill_path(&rounded_rect(0.0, 0.0, 10.0, 10.0, 0.0).unwrap(), Rgba::rgb(0, 255, 0));
        assert_eq!(pixel(&canvas, 8, 5), (0, 255, 0, 255));
    }

    #[test]
    fn image_is_scaled_into_box() {
        let mut canvas = Canvas::new(20, 20, 2.0).unwrap();
        let mut image = Pixmap::new(4, 4).unwrap();
        image.fill(tiny_skia::Color::from_rgba8(0, 0, 0, 255));
        canvas.draw_image(&image, 5.0, 5.0, 10.0, 10.0);
        assert_eq!(pixel(&canvas, 12, 12), (0, 0, 0, 255));
        assert_eq!(pixel(&canvas, 8, 8).3, 0);
        assert_eq!(pixel(&canvas, 31, 31).3, 0);
    }

    #[test]
    fn encodes_png_signature() {
        let canvas = Canvas::new(4, 4, 1.0).unwrap();
        let png = canvas.encode_png().unwrap();
        assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
    }
}
