//! Card rasterization.
//!
//! [`CardRenderer::render`] draws, in order: the rounded card (border,
//! background, clip), the title, up to three description lines, the QR
//! block with its backdrop, and the caption under it. The output is a PNG
//! of the style's size times [`SCALE`]. No state survives a call.

pub mod layout;
pub mod paint;
pub mod raster;

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use sha2::{Digest, Sha256};

use crate::fonts::FontBook;
use crate::qr::QrProvider;
use crate::style::StyleRegistry;
use crate::{Result, ValidRequest};

use layout::{cap_lines, truncate_to_width, wrap_to_width};
use paint::rounded_rect;
use raster::{Canvas, TextAlign};

/// Supersampling factor between logical and device pixels.
pub const SCALE: f32 = 2.0;

/// Border thickness in device pixels.
const BORDER_PX: f32 = 1.0;

/// A finished card plus the text it shows.
#[derive(Debug, Clone)]
pub struct RenderedCard {
    /// PNG-encoded image
    pub png: Vec<u8>,
    /// Width in device pixels
    pub width: u32,
    /// Height in device pixels
    pub height: u32,
    pub title: String,
    pub description: String,
}

impl RenderedCard {
    /// Base64 of the UTF-8 title, safe to carry in an HTTP header.
    pub fn encoded_title(&self) -> String {
        STANDARD.encode(self.title.as_bytes())
    }

    pub fn encoded_description(&self) -> String {
        STANDARD.encode(self.description.as_bytes())
    }

    /// Hex SHA-256 of the PNG bytes.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.png))
    }
}

pub struct CardRenderer {
    fonts: Arc<FontBook>,
    qr: Arc<dyn QrProvider>,
}

impl CardRenderer {
    pub fn new(fonts: Arc<FontBook>, qr: Arc<dyn QrProvider>) -> Self {
        Self { fonts, qr }
    }

    pub fn render(
        &self,
        request: &ValidRequest,
        title: &str,
        description: &str,
    ) -> Result<RenderedCard> {
        let style = StyleRegistry::global().lookup(&request.style)?;
        let (width, height) = (style.width as f32, style.height as f32);
        debug!("Rendering {} card for {}", style.id, request.url);

        let mut canvas = Canvas::new(style.width, style.height, SCALE)?;

        // The border is stroked on an inset path so that it stays inside
        // the surface; the background fill then covers its inner half.
        let card = if style.has_border() {
            let inset = BORDER_PX / SCALE;
            let path = rounded_rect(
                inset,
                inset,
                width - 2.0 * inset,
                height - 2.0 * inset,
                style.corner_radius,
            )?;
            canvas.stroke_path(&path, style.border, 2.0 * inset);
            path
        } else {
            rounded_rect(0.0, 0.0, width, height, style.corner_radius)?
        };
        canvas.fill_path(&card, style.background);
        canvas.set_clip(&card)?;

        let max_width = style.text_max_width();
        let layout = &style.layout;

        let title_face = self.fonts.face(&style.title_font)?;
        let title_line = truncate_to_width(&printable(title), &title_face, max_width);
        canvas.fill_text(
            &title_face,
            &title_line,
            layout.title_x,
            layout.title_y,
            style.title_color,
            TextAlign::Left,
        );

        let description_face = self.fonts.face(&style.description_font)?;
        let description_text = printable(description);
        let lines = cap_lines(
            wrap_to_width(&description_text, &description_face, max_width),
            &description_face,
            max_width,
        );
        for (i, line) in lines.iter().enumerate() {
            canvas.fill_text(
                &description_face,
                line,
                layout.description_x,
                layout.description_y + i as f32 * layout.description_line_height,
                style.description_color,
                TextAlign::Left,
            );
        }

        let qr = &style.qr;
        let qr_x = width - qr.size - layout.qr_right_padding;
        let qr_y = layout.qr_top_padding;
        let backdrop = rounded_rect(
            qr_x - qr.padding,
            qr_y - qr.padding,
            qr.size + 2.0 * qr.padding,
            qr.size + 2.0 * qr.padding,
            qr.backdrop_radius,
        )?;
        canvas.fill_path(&backdrop, qr.light);

        let bitmap = self.qr.encode(
            &request.link,
            (qr.size * SCALE).round() as u32,
            qr.dark,
            qr.light,
        )?;
        canvas.draw_image(&bitmap, qr_x, qr_y, qr.size, qr.size);

        let caption_face = self.fonts.face(&qr.caption_font)?;
        canvas.fill_text(
            &caption_face,
            qr.caption,
            qr_x + qr.size / 2.0,
            qr_y + qr.size + qr.padding + qr.caption_offset,
            qr.caption_color,
            TextAlign::Center,
        );

        canvas.reset_clip();
        let png = canvas.encode_png()?;
        debug!("Encoded {}x{} card ({} bytes)", canvas.width(), canvas.height(), png.len());

        Ok(RenderedCard {
            png,
            width: canvas.width(),
            height: canvas.height(),
            title: title.to_string(),
            description: description.to_string(),
        })
    }
}

/// Control characters have no glyphs; draw them as spaces.
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}
