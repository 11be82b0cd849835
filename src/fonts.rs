//! Font assets: loaded once at startup, read-only afterwards.
//!
//! Configured font files are registered first, then (optionally) the
//! system fonts. Every font spec used by the style registry is resolved
//! up front and its bytes are kept in memory, so rendering never touches
//! the filesystem.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};

use crate::rendering::layout::TextMeasure;
use crate::style::{FontSpec, StyleRegistry};
use crate::{Error, Result};

/// Families tried after the requested one, before any installed face.
const FALLBACK_FAMILIES: &[&str] = &[
    "Noto Sans CJK SC",
    "Noto Sans SC",
    "Source Han Sans SC",
    "WenQuanYi Micro Hei",
    "Noto Sans",
    "DejaVu Sans",
    "Liberation Sans",
];

/// Character checked to tell whether a face can draw Chinese text.
const CJK_SAMPLE: char = '访';

/// Raw font bytes plus the face index inside them (for collections).
pub struct LoadedFont {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    family: String,
}

impl LoadedFont {
    pub fn from_data(data: Vec<u8>, index: u32) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, index)
            .map_err(|e| Error::FontError(format!("Invalid font data: {}", e)))?;
        let units_per_em = face.units_per_em();
        let family = face
            .names()
            .into_iter()
            .filter(|n| n.name_id == ttf_parser::name_id::FAMILY && n.is_unicode())
            .find_map(|n| n.to_string())
            .unwrap_or_default();
        Ok(Self {
            data,
            index,
            units_per_em,
            family,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| Error::FontError(format!("{}: {}", path.display(), e)))?;
        Self::from_data(data, 0)
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Whether the face has a real glyph for `ch`.
    pub fn covers(&self, ch: char) -> bool {
        ttf_parser::Face::parse(&self.data, self.index)
            .map(|face| face.glyph_index(ch).is_some())
            .unwrap_or(false)
    }

    /// A face scaled to `size` pixels per em.
    pub fn at_size(&self, size: f32) -> Result<FontFace<'_>> {
        let face = ttf_parser::Face::parse(&self.data, self.index)
            .map_err(|e| Error::FontError(e.to_string()))?;
        Ok(FontFace {
            face,
            scale: size / self.units_per_em as f32,
        })
    }
}

/// A parsed face at a fixed pixel size.
pub struct FontFace<'a> {
    face: ttf_parser::Face<'a>,
    scale: f32,
}

impl<'a> FontFace<'a> {
    pub fn face(&self) -> &ttf_parser::Face<'a> {
        &self.face
    }

    /// Pixels per font unit.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Glyph for `ch`, falling back to `.notdef`.
    pub fn glyph(&self, ch: char) -> ttf_parser::GlyphId {
        self.face.glyph_index(ch).unwrap_or(ttf_parser::GlyphId(0))
    }

    pub fn advance(&self, glyph: ttf_parser::GlyphId) -> f32 {
        self.face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * self.scale
    }
}

impl TextMeasure for FontFace<'_> {
    fn measure(&self, text: &str) -> f32 {
        text.chars().map(|ch| self.advance(self.glyph(ch))).sum()
    }
}

/// Fonts resolved for every spec the styles use.
pub struct FontBook {
    fonts: HashMap<(String, u16), Arc<LoadedFont>>,
    fallback: Arc<LoadedFont>,
}

impl FontBook {
    /// Load font assets. Fails when no usable font exists at all.
    pub fn load(font_paths: &[PathBuf], load_system_fonts: bool) -> Result<Self> {
        let mut db = fontdb::Database::new();
        for path in font_paths {
            if let Err(e) = db.load_font_file(path) {
                warn!("Skipping font {}: {}", path.display(), e);
            }
        }
        if load_system_fonts {
            db.load_system_fonts();
        }
        debug!("Font database holds {} faces", db.len());

        let fallback_id = db
            .faces()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| Error::FontError("no usable font found".into()))?;
        let fallback = Arc::new(load_face(&db, fallback_id)?);

        let mut fonts = HashMap::new();
        for spec in StyleRegistry::global().font_specs() {
            let families: Vec<fontdb::Family> = std::iter::once(spec.family)
                .chain(FALLBACK_FAMILIES.iter().copied())
                .map(fontdb::Family::Name)
                .chain(std::iter::once(fontdb::Family::SansSerif))
                .collect();
            let query = fontdb::Query {
                families: &families,
                weight: fontdb::Weight(spec.weight),
                ..fontdb::Query::default()
            };
            let font = match db.query(&query) {
                Some(id) => Arc::new(load_face(&db, id)?),
                None => {
                    warn!(
                        "Font family {:?} not found, using {:?}",
                        spec.family,
                        fallback.family()
                    );
                    fallback.clone()
                }
            };
            debug!("Font {:?}/{} -> {:?}", spec.family, spec.weight, font.family());
            if !font.covers(CJK_SAMPLE) {
                warn!(
                    "Font {:?} has no CJK glyphs; Chinese text will render as boxes. \
                     Install a CJK font or pass one explicitly.",
                    font.family()
                );
            }
            fonts.insert((spec.family.to_string(), spec.weight), font);
        }

        Ok(Self { fonts, fallback })
    }

    /// A book that serves a single font for every spec.
    pub fn from_font(font: LoadedFont) -> Self {
        Self {
            fonts: HashMap::new(),
            fallback: Arc::new(font),
        }
    }

    pub fn font(&self, spec: &FontSpec) -> &LoadedFont {
        self.fonts
            .get(&(spec.family.to_string(), spec.weight))
            .unwrap_or(&self.fallback)
    }

    pub fn face(&self, spec: &FontSpec) -> Result<FontFace<'_>> {
        self.font(spec).at_size(spec.size)
    }
}

fn load_face(db: &fontdb::Database, id: fontdb::ID) -> Result<LoadedFont> {
    let (data, index) = db
        .with_face_data(id, |data, index| (data.to_vec(), index))
        .ok_or_else(|| Error::FontError("font data unavailable".into()))?;
    LoadedFont::from_data(data, index)
}
