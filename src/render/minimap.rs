use super::{ImageCache, Surface, shapes};
use crate::editor::Editor;
use crate::model::{Bounds, Rgba};
use tiny_skia::{PathBuilder, Stroke, Transform};

pub const MINIMAP_PADDING: f32 = 5.0;
const MINIMAP_BACKGROUND: Rgba = Rgba::rgb(0x25, 0x25, 0x26);
const VIEWPORT_COLOR: Rgba = Rgba::rgb(0, 122, 204);

pub fn minimap_transform(frame: Bounds, width: f32, height: f32) -> Transform {
    let (fw, fh) = (frame.width.max(1.0), frame.height.max(1.0));
    let inner = 2.0 * MINIMAP_PADDING;
    let scale = ((width - inner) / fw).min((height - inner) / fh).max(0.0);
    Transform::from_translate(MINIMAP_PADDING, MINIMAP_PADDING)
        .pre_scale(scale, scale)
        .pre_translate(-frame.x, -frame.y)
}

/// Scaled copy of the visible layers framed on the content bounds plus the
/// viewport, with the viewport outlined. An empty document leaves it blank.
pub fn render_minimap(surface: &mut Surface, editor: &Editor, images: &mut ImageCache) {
    surface.clear(MINIMAP_BACKGROUND);
    let Some(content) = editor.doc.content_bounds() else {
        return;
    };
    let (vw, vh) = editor.viewport();
    let area = editor.view.visible_area(vw, vh);
    let frame = content.union(&area);
    let ts = minimap_transform(frame, surface.width() as f32, surface.height() as f32);
    for shape in editor.doc.visible_shapes() {
        shapes::draw_shape(surface.pixmap_mut(), shape, ts, images);
    }

    let Some(r) = shapes::rect(area) else {
        return;
    };
    // Stroke in minimap pixels so the outline stays legible at any scale.
    if let Some(path) = PathBuilder::from_rect(r).transform(ts) {
        let paint = shapes::solid(VIEWPORT_COLOR, 1.0);
        let outline = Stroke { width: 1.5, ..Default::default() };
        surface.pixmap_mut().stroke_path(&path, &paint, &outline, Transform::identity(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Tool;
    use crate::model::Point;

    #[test]
    fn transform_keeps_padding_and_aspect() {
        let frame = Bounds { x: 100.0, y: 40.0, width: 800.0, height: 600.0 };
        let ts = minimap_transform(frame, 210.0, 160.0);
        assert!((ts.sx - 0.25).abs() < 1e-6);
        assert_eq!(ts.sx, ts.sy);
        // The frame's corner lands on the padding.
        assert!((ts.tx - (5.0 - 25.0)).abs() < 1e-4);
        assert!((ts.ty - (5.0 - 10.0)).abs() < 1e-4);
    }

    #[test]
    fn empty_document_gives_blank_minimap() {
        let e = Editor::default();
        let mut s = Surface::new(100, 80).unwrap();
        render_minimap(&mut s, &e, &mut ImageCache::default());
        assert!(s.data().chunks(4).all(|px| px == [0x25, 0x25, 0x26, 255]));
    }

    #[test]
    fn shapes_and_viewport_are_drawn() {
        let mut e = Editor::default();
        e.set_viewport(400.0, 400.0);
        e.set_tool(Tool::Rectangle);
        e.pointer_down(Point::new(100.0, 100.0));
        e.pointer_up(Point::new(300.0, 300.0));
        let mut s = Surface::new(110, 110).unwrap();
        render_minimap(&mut s, &e, &mut ImageCache::default());
        // Scale is 0.25: the rectangle covers 30..80, the viewport 5..105.
        assert_eq!(s.pixel(55, 55), Some(Rgba::rgb(0x1a, 0x73, 0xe8)));
        let edge = s.pixel(5, 50).unwrap();
        assert!(edge.b > 150 && edge.r < 40, "{edge:?}");
    }

    #[test]
    fn distant_content_is_framed() {
        let mut e = Editor::default();
        e.set_viewport(400.0, 400.0);
        e.set_tool(Tool::Rectangle);
        e.pointer_down(Point::new(2000.0, 2000.0));
        e.pointer_up(Point::new(2400.0, 2400.0));
        let mut s = Surface::new(110, 110).unwrap();
        render_minimap(&mut s, &e, &mut ImageCache::default());
        // Frame is 0..2400, so the rectangle covers roughly 88..105.
        assert_eq!(s.pixel(96, 96), Some(Rgba::rgb(0x1a, 0x73, 0xe8)));
        assert_eq!(s.pixel(50, 50), Some(Rgba::rgb(0x25, 0x25, 0x26)));
    }
}
