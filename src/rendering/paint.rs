/// Paint and path primitives shared by the card renderer.
use tiny_skia::{Paint, Path, PathBuilder};

use crate::style::Rgba;
use crate::{Error, Result};

/// Anti-aliased solid paint.
pub fn solid(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

/// Rounded rectangle with quadratic corners. The radius is clamped to half
/// the shorter side.
pub fn rounded_rect(x: f32, y: f32, width: f32, height: f32, radius: f32) -> Result<Path> {
    let degenerate = || {
        Error::RenderError(format!(
            "degenerate rounded rect {}x{} at ({}, {})",
            width, height, x, y
        ))
    };
    if !(width > 0.0 && height > 0.0) {
        return Err(degenerate());
    }

    let r = radius.max(0.0).min(width / 2.0).min(height / 2.0);
    let (right, bottom) = (x + width, y + height);

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.quad_to(right, y, right, y + r);
    pb.line_to(right, bottom - r);
    pb.quad_to(right, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.quad_to(x, bottom, x, bottom - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();

    pb.finish().ok_or_else(degenerate)
}
