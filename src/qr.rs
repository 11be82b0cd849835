//! QR symbol bitmaps.

use qrcode::{Color, QrCode};
use tiny_skia::{ColorU8, Pixmap};

use crate::style::Rgba;
use crate::{Error, Result};

/// Produces a square bitmap encoding a URL.
pub trait QrProvider: Send + Sync {
    fn encode(&self, url: &str, pixel_size: u32, dark: Rgba, light: Rgba) -> Result<Pixmap>;
}

/// [`QrProvider`] backed by the `qrcode` crate, without a quiet zone.
///
/// The symbol is stretched to exactly `pixel_size` pixels using
/// nearest-module sampling, so the output size never depends on the
/// module count.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrCodeProvider;

impl QrProvider for QrCodeProvider {
    fn encode(&self, url: &str, pixel_size: u32, dark: Rgba, light: Rgba) -> Result<Pixmap> {
        let code = QrCode::new(url.as_bytes()).map_err(|e| Error::QrError(e.to_string()))?;
        let modules = code.width() as u32;
        let colors = code.to_colors();

        let mut pixmap = Pixmap::new(pixel_size, pixel_size)
            .ok_or_else(|| Error::QrError(format!("invalid QR size {}", pixel_size)))?;

        let dark = ColorU8::from_rgba(dark.r, dark.g, dark.b, dark.a).premultiply();
        let light = ColorU8::from_rgba(light.r, light.g, light.b, light.a).premultiply();

        let size = pixel_size as u64;
        for (i, px) in pixmap.pixels_mut().iter_mut().enumerate() {
            let (x, y) = (i as u64 % size, i as u64 / size);
            let mx = (x * modules as u64 / size) as usize;
            let my = (y * modules as u64 / size) as usize;
            *px = match colors[my * modules as usize + mx] {
                Color::Dark => dark,
                Color::Light => light,
            };
        }

        Ok(pixmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DARK: Rgba = Rgba::rgb(0, 0, 0);
    const LIGHT: Rgba = Rgba::rgb(255, 255, 255);

    #[test]
    fn bitmap_has_requested_size() {
        let img = QrCodeProvider
            .encode("https://example.com/", 164, DARK, LIGHT)
            .unwrap();
        assert_eq!(img.width(), 164);
        assert_eq!(img.height(), 164);
    }

    #[test]
    fn finder_pattern_corner_is_dark() {
        let img = QrCodeProvider
            .encode("https://example.com/", 164, DARK, LIGHT)
            .unwrap();
        let corner = img.pixel(0, 0).unwrap();
        assert_eq!(corner.red(), 0);
        assert_eq!(corner.alpha(), 255);
    }

    #[test]
    fn uses_both_colors() {
        let img = QrCodeProvider
            .encode("https://example.com/", 100, Rgba::rgb(255, 255, 255), Rgba::rgb(7, 193, 96))
            .unwrap();
        let greens = img.pixels().iter().filter(|p| p.green() == 193).count();
        let whites = img.pixels().iter().filter(|p| p.red() == 255).count();
        assert!(greens > 0 && whites > 0);
        assert_eq!(greens + whites, 100 * 100);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(QrCodeProvider.encode("https://example.com/", 0, DARK, LIGHT).is_err());
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = QrCodeProvider.encode("https://example.com/a", 64, DARK, LIGHT).unwrap();
        let b = QrCodeProvider.encode("https://example.com/a", 64, DARK, LIGHT).unwrap();
        assert_eq!(a.data(), b.data());
    }
}
