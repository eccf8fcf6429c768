//! Text measurement and glyph outlines.
//!
//! The face is the first proportional font egui ships with, so text on the
//! canvas and text in the panels share metrics. When the face cannot be
//! parsed every character is assumed to advance 0.6 em.

use ab_glyph::{Font, FontArc, OutlineCurve};
use eframe::egui;
use std::sync::OnceLock;
use tiny_skia::{Path, PathBuilder};

const FALLBACK_ADVANCE: f32 = 0.6;
const ITALIC_SKEW: f32 = 0.2;

static FACE: OnceLock<Option<FontArc>> = OnceLock::new();

fn face() -> Option<&'static FontArc> {
    FACE.get_or_init(load_face).as_ref()
}

fn load_face() -> Option<FontArc> {
    let defs = egui::FontDefinitions::default();
    let name = defs.families.get(&egui::FontFamily::Proportional)?.first()?;
    let data = defs.font_data.get(name)?;
    match FontArc::try_from_vec(data.font.to_vec()) {
        Ok(face) => Some(face),
        Err(e) => {
            tracing::warn!("font {name} unusable, falling back to fixed advance: {e}");
            None
        }
    }
}

fn em_scale(face: &FontArc, size: f32) -> f32 {
    size / face.units_per_em().unwrap_or(1000.0)
}

/// Width of `text` at `size` pixels per em.
pub fn measure_text(text: &str, size: f32) -> f32 {
    let Some(face) = face() else {
        return text.chars().count() as f32 * size * FALLBACK_ADVANCE;
    };
    let scale = em_scale(face, size);
    let mut width = 0.0;
    let mut prev = None;
    for ch in text.chars() {
        let id = face.glyph_id(ch);
        if let Some(p) = prev {
            width += face.kern_unscaled(p, id);
        }
        width += face.h_advance_unscaled(id);
        prev = Some(id);
    }
    width * scale
}

/// Glyph outlines for `text` with its baseline starting at (`x`, `y`).
///
/// Returns `None` for empty or whitespace-only text and when no face is
/// available.
pub fn text_path(text: &str, x: f32, y: f32, size: f32, italic: bool) -> Option<Path> {
    let face = face()?;
    let scale = em_scale(face, size);
    let skew = if italic { ITALIC_SKEW } else { 0.0 };
    let mut pb = PathBuilder::new();
    let mut pen = 0.0;
    let mut prev = None;

    for ch in text.chars() {
        let id = face.glyph_id(ch);
        if let Some(p) = prev {
            pen += face.kern_unscaled(p, id);
        }
        if let Some(outline) = face.outline(id) {
            // Font units are y-up.
            let map = |p: ab_glyph::Point| {
                let gx = (pen + p.x) * scale;
                let gy = p.y * scale;
                (x + gx + gy * skew, y - gy)
            };
            let mut last: Option<(f32, f32)> = None;
            for curve in &outline.curves {
                let (start, end) = match curve {
                    OutlineCurve::Line(a, b) => (map(*a), map(*b)),
                    OutlineCurve::Quad(a, _, b) => (map(*a), map(*b)),
                    OutlineCurve::Cubic(a, _, _, b) => (map(*a), map(*b)),
                };
                let joined = last.is_some_and(|l| {
                    (l.0 - start.0).abs() < 1e-3 && (l.1 - start.1).abs() < 1e-3
                });
                if !joined {
                    if last.is_some() {
                        pb.close();
                    }
                    pb.move_to(start.0, start.1);
                }
                match curve {
                    OutlineCurve::Line(_, _) => pb.line_to(end.0, end.1),
                    OutlineCurve::Quad(_, c, _) => {
                        let c = map(*c);
                        pb.quad_to(c.0, c.1, end.0, end.1);
                    }
                    OutlineCurve::Cubic(_, c1, c2, _) => {
                        let (c1, c2) = (map(*c1), map(*c2));
                        pb.cubic_to(c1.0, c1.1, c2.0, c2.1, end.0, end.1);
                    }
                }
                last = Some(end);
            }
            if last.is_some() {
                pb.close();
            }
        }
        pen += face.h_advance_unscaled(id);
        prev = Some(id);
    }
    pb.finish()
}
