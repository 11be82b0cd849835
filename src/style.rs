//! Named, immutable card styles.
//!
//! Every style is fully spelled out; there is no inheritance between
//! entries. The registry is built once on first access and never mutated.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::{Error, Result};

/// Straight (non-premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_visible(&self) -> bool {
        self.a > 0
    }
}

/// Font request: family name, pixel size and weight (CSS scale, 100..900).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub family: &'static str,
    pub size: f32,
    pub weight: u16,
}

/// QR block appearance and the caption drawn underneath it.
#[derive(Debug, Clone, PartialEq)]
pub struct QrStyle {
    pub size: f32,
    pub dark: Rgba,
    pub light: Rgba,
    /// Padding of the light backdrop around the symbol, on every side
    pub padding: f32,
    pub backdrop_radius: f32,
    pub caption: &'static str,
    pub caption_color: Rgba,
    pub caption_font: FontSpec,
    /// Distance from the bottom edge of the backdrop to the caption baseline
    pub caption_offset: f32,
}

/// Layout offsets in logical pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub title_x: f32,
    pub title_y: f32,
    pub description_x: f32,
    pub description_y: f32,
    pub description_line_height: f32,
    pub qr_right_padding: f32,
    pub qr_top_padding: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleDefinition {
    pub id: &'static str,
    /// Display name for pickers and listings
    pub name: &'static str,
    pub summary: &'static str,
    pub width: u32,
    pub height: u32,
    pub corner_radius: f32,
    pub background: Rgba,
    /// Stroked around the card when its alpha is non-zero
    pub border: Rgba,
    pub title_font: FontSpec,
    pub title_color: Rgba,
    pub description_font: FontSpec,
    pub description_color: Rgba,
    pub qr: QrStyle,
    pub layout: Layout,
}

impl StyleDefinition {
    /// Width of the text column left of the QR block.
    pub fn text_max_width(&self) -> f32 {
        self.width as f32 - self.qr.size - 3.0 * self.layout.qr_right_padding
    }

    pub fn has_border(&self) -> bool {
        self.border.is_visible()
    }
}

const CJK_FAMILY: &str = "Noto Sans CJK SC";

fn white() -> StyleDefinition {
    StyleDefinition {
        id: "white",
        name: "简约白",
        summary: "简洁大方的白色背景",
        width: 500,
        height: 120,
        corner_radius: 6.0,
        background: Rgba::rgb(255, 255, 255),
        border: Rgba::rgb(229, 231, 235),
        title_font: FontSpec { family: CJK_FAMILY, size: 18.0, weight: 400 },
        title_color: Rgba::rgb(0x1F, 0x29, 0x37),
        description_font: FontSpec { family: CJK_FAMILY, size: 14.0, weight: 400 },
        description_color: Rgba::rgb(0x4B, 0x55, 0x63),
        qr: QrStyle {
            size: 82.0,
            dark: Rgba::rgb(0x1F, 0x29, 0x37),
            light: Rgba::rgb(0xFF, 0xFF, 0xFF),
            padding: 2.0,
            backdrop_radius: 4.0,
            caption: "长按或扫码访问",
            caption_color: Rgba::rgb(0x6B, 0x72, 0x80),
            caption_font: FontSpec { family: CJK_FAMILY, size: 12.0, weight: 400 },
            caption_offset: 14.0,
        },
        layout: Layout {
            title_x: 20.0,
            title_y: 35.0,
            description_x: 20.0,
            description_y: 65.0,
            description_line_height: 20.0,
            qr_right_padding: 20.0,
            qr_top_padding: 12.0,
        },
    }
}

fn wechat() -> StyleDefinition {
    StyleDefinition {
        id: "wechat",
        name: "微信绿",
        summary: "微信风格设计",
        width: 500,
        height: 120,
        corner_radius: 6.0,
        background: Rgba::rgb(7, 193, 96),
        border: Rgba::rgba(7, 193, 96, 0),
        title_font: FontSpec { family: CJK_FAMILY, size: 18.0, weight: 400 },
        title_color: Rgba::rgb(0xFF, 0xFF, 0xFF),
        description_font: FontSpec { family: CJK_FAMILY, size: 14.0, weight: 400 },
        description_color: Rgba::rgba(255, 255, 255, 230),
        qr: QrStyle {
            size: 82.0,
            dark: Rgba::rgb(0xFF, 0xFF, 0xFF),
            light: Rgba::rgb(0x07, 0xC1, 0x60),
            padding: 2.0,
            backdrop_radius: 4.0,
            caption: "长按或扫码访问",
            caption_color: Rgba::rgba(255, 255, 255, 230),
            caption_font: FontSpec { family: CJK_FAMILY, size: 12.0, weight: 400 },
            caption_offset: 14.0,
        },
        layout: Layout {
            title_x: 20.0,
            title_y: 35.0,
            description_x: 20.0,
            description_y: 65.0,
            description_line_height: 20.0,
            qr_right_padding: 20.0,
            qr_top_padding: 12.0,
        },
    }
}

/// Read-only table of styles keyed by id.
pub struct StyleRegistry {
    styles: BTreeMap<&'static str, StyleDefinition>,
}

static REGISTRY: Lazy<StyleRegistry> = Lazy::new(StyleRegistry::builtin);

impl StyleRegistry {
    fn builtin() -> Self {
        let styles = [white(), wechat()]
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        Self { styles }
    }

    /// The process-wide registry.
    pub fn global() -> &'static StyleRegistry {
        &REGISTRY
    }

    pub fn lookup(&self, id: &str) -> Result<&StyleDefinition> {
        self.styles
            .get(id)
            .ok_or_else(|| Error::UnknownStyle(id.to_string()))
    }

    /// Styles in id order.
    pub fn iter(&self) -> impl Iterator<Item = &StyleDefinition> {
        self.styles.values()
    }

    /// Every font spec referenced by any style (deduplicated).
    pub fn font_specs(&self) -> Vec<FontSpec> {
        let mut specs: Vec<FontSpec> = Vec::new();
        for style in self.iter() {
            for spec in [style.title_font, style.description_font, style.qr.caption_font] {
                if !specs.iter().any(|s| s.family == spec.family && s.weight == spec.weight) {
                    specs.push(spec);
                }
            }
        }
        specs
    }
}
