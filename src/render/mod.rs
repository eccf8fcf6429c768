use crate::editor::{io, Editor, View};
use crate::error::{Error, Result};
use crate::model::{Document, Rgba};
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use tiny_skia::{Color, Pixmap, Transform};

mod minimap;
mod overlay;
mod shapes;

pub use minimap::render_minimap;

pub const CANVAS_BACKGROUND: Rgba = Rgba::rgb(0x1e, 0x1e, 0x1e);

pub(crate) fn color(c: Rgba, opacity: f32) -> Color {
    let a = (c.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
    Color::from_rgba8(c.r, c.g, c.b, a)
}

pub struct Surface {
    pixmap: Pixmap,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| Error::Png(format!("cannot allocate {width}x{height} surface")))?;
        Ok(Self { pixmap })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let (width, height) = (width.max(1), height.max(1));
        if self.width() != width || self.height() != height {
            *self = Self::new(width, height)?;
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn clear(&mut self, c: Rgba) {
        self.pixmap.fill(color(c, 1.0));
    }

    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Rgba::rgba(c.red(), c.green(), c.blue(), c.alpha()))
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap.encode_png().map_err(|e| Error::Png(e.to_string()))
    }

    pub(crate) fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }
}

const SOURCE_SAMPLE: usize = 64;

#[derive(Default)]
pub struct ImageCache {
    entries: HashMap<u64, (u64, Option<Pixmap>)>,
}

impl ImageCache {
    /// Length plus both ends of the data URL, so per-frame lookups stay
    /// cheap for large images.
    fn source_key(src: &str) -> u64 {
        let bytes = src.as_bytes();
        let n = bytes.len();
        let sample = n.min(SOURCE_SAMPLE);
        let mut h = DefaultHasher::new();
        n.hash(&mut h);
        bytes[..sample].hash(&mut h);
        bytes[n - sample..].hash(&mut h);
        h.finish()
    }

    pub fn get(&mut self, id: u64, src: &str) -> Option<&Pixmap> {
        let key = Self::source_key(src);
        let stale = self.entries.get(&id).is_none_or(|(k, _)| *k != key);
        if stale {
            let decoded = match io::decode_data_url(src).and_then(to_pixmap) {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!(id, "image shape not drawable: {e}");
                    None
                }
            };
            self.entries.insert(id, (key, decoded));
        }
        self.entries.get(&id).and_then(|(_, p)| p.as_ref())
    }

    pub fn retain_shapes(&mut self, doc: &Document) {
        self.entries.retain(|id, _| doc.find_shape(*id).is_some());
    }
}

fn to_pixmap(img: image::RgbaImage) -> Result<Pixmap> {
    let (w, h) = img.dimensions();
    let mut pixmap =
        Pixmap::new(w, h).ok_or_else(|| Error::Png(format!("cannot allocate {w}x{h} image")))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

fn camera(view: &View) -> Transform {
    let zoom = view.zoom();
    Transform::from_translate(view.pan.x, view.pan.y).pre_scale(zoom, zoom)
}

fn draw_layers(surface: &mut Surface, doc: &Document, ts: Transform, images: &mut ImageCache) {
    for shape in doc.visible_shapes() {
        shapes::draw_shape(surface.pixmap_mut(), shape, ts, images);
    }
}

/// Draws one editor frame: background, grid, guides, visible layers,
/// selection highlight and tool previews, in that order.
pub fn render_frame(surface: &mut Surface, editor: &Editor, images: &mut ImageCache) {
    surface.clear(CANVAS_BACKGROUND);
    let ts = camera(&editor.view);
    let visible = editor
        .view
        .visible_area(surface.width() as f32, surface.height() as f32);

    if editor.view.grid_visible {
        overlay::draw_grid(surface.pixmap_mut(), visible, ts);
    }
    if editor.view.guides_visible {
        overlay::draw_guides(surface.pixmap_mut(), &editor.view, visible, ts);
    }
    draw_layers(surface, &editor.doc, ts, images);
    if let Some(shape) = editor.selected() {
        overlay::draw_selection(surface.pixmap_mut(), shape, ts);
    }
    overlay::draw_preview(surface.pixmap_mut(), editor, ts);
}

pub fn render_export(
    doc: &Document,
    view: &View,
    width: u32,
    height: u32,
    images: &mut ImageCache,
) -> Result<Surface> {
    let mut surface = Surface::new(width, height)?;
    surface.clear(Rgba::WHITE);
    draw_layers(&mut surface, doc, camera(view), images);
    Ok(surface)
}

pub fn export_png(
    doc: &Document,
    view: &View,
    width: u32,
    height: u32,
    images: &mut ImageCache,
) -> Result<String> {
    let png = render_export(doc, view, width, height, images)?.encode_png()?;
    tracing::info!(width, height, bytes = png.len(), "png export");
    Ok(io::png_data_url(&png))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Tool;
    use crate::model::{Point, Shape, ShapeKind, Style};

    fn editor() -> Editor {
        let mut e = Editor::default();
        e.view.grid_visible = false;
        e.view.snap_to_grid = false;
        e
    }

    fn solid(fill: Rgba) -> Style {
        Style { fill: Some(fill), stroke_width: 0.0, ..Style::default() }
    }

    fn add_rect(e: &mut Editor, fill: Rgba, x: f32, y: f32, w: f32, h: f32) -> u64 {
        let shape = Shape::new(
            e.doc.next_shape_id(),
            e.doc.current_layer().id,
            ShapeKind::Rectangle { x, y, width: w, height: h },
            &solid(fill),
        );
        e.doc.push_shape(shape)
    }

    const RED: Rgba = Rgba::rgb(255, 0, 0);
    const GREEN: Rgba = Rgba::rgb(0, 255, 0);

    #[test]
    fn later_shapes_and_layers_paint_on_top() {
        let mut e = editor();
        add_rect(&mut e, RED, 10.0, 10.0, 40.0, 40.0);
        add_rect(&mut e, GREEN, 20.0, 20.0, 40.0, 40.0);
        let mut s = Surface::new(100, 100).unwrap();
        let mut images = ImageCache::default();
        render_frame(&mut s, &e, &mut images);
        assert_eq!(s.pixel(15, 15), Some(RED));
        assert_eq!(s.pixel(30, 30), Some(GREEN));

        e.doc.add_layer();
        add_rect(&mut e, RED, 25.0, 25.0, 10.0, 10.0);
        render_frame(&mut s, &e, &mut images);
        assert_eq!(s.pixel(30, 30), Some(RED));
    }

    #[test]
    fn hidden_layers_are_not_drawn() {
        let mut e = editor();
        add_rect(&mut e, RED, 0.0, 0.0, 50.0, 50.0);
        e.doc.set_visible(1, false);
        let mut s = Surface::new(60, 60).unwrap();
        render_frame(&mut s, &e, &mut ImageCache::default());
        assert_eq!(s.pixel(25, 25), Some(CANVAS_BACKGROUND));
    }

    #[test]
    fn camera_applies_pan_and_zoom() {
        let mut e = editor();
        add_rect(&mut e, RED, 0.0, 0.0, 10.0, 10.0);
        e.view.pan = Point::new(20.0, 20.0);
        e.view.set_zoom(2.0);
        let mut s = Surface::new(60, 60).unwrap();
        render_frame(&mut s, &e, &mut ImageCache::default());
        assert_eq!(s.pixel(5, 5), Some(CANVAS_BACKGROUND));
        assert_eq!(s.pixel(38, 38), Some(RED));
    }

    #[test]
    fn rotation_does_not_leak_to_siblings() {
        let mut e = editor();
        let first = add_rect(&mut e, RED, 10.0, 10.0, 20.0, 20.0);
        add_rect(&mut e, GREEN, 60.0, 10.0, 20.0, 20.0);
        if let Some(s) = e.doc.find_shape_mut(first) {
            s.rotation = 45.0;
        }
        let mut s = Surface::new(100, 50).unwrap();
        render_frame(&mut s, &e, &mut ImageCache::default());
        // Corner of the rotated square is empty, its center is filled.
        assert_eq!(s.pixel(11, 11), Some(CANVAS_BACKGROUND));
        assert_eq!(s.pixel(20, 20), Some(RED));
        assert_eq!(s.pixel(61, 11), Some(GREEN));
    }

    #[test]
    fn opacity_blends_with_background() {
        let mut e = editor();
        let id = add_rect(&mut e, Rgba::WHITE, 0.0, 0.0, 20.0, 20.0);
        e.select(Some(id));
        e.set_property(crate::editor::Property::Opacity, "50");
        e.select(None);
        let mut s = Surface::new(20, 20).unwrap();
        render_frame(&mut s, &e, &mut ImageCache::default());
        let p = s.pixel(10, 10).unwrap();
        assert!(p.r > 120 && p.r < 150, "got {p:?}");
    }

    #[test]
    fn export_uses_white_and_skips_grid() {
        let mut e = Editor::default();
        e.set_tool(Tool::Rectangle);
        let mut images = ImageCache::default();
        let surface = render_export(&e.doc, &e.view, 40, 40, &mut images).unwrap();
        assert_eq!(surface.pixel(20, 20), Some(Rgba::WHITE));
        assert!(surface.data().chunks(4).all(|px| px == [255, 255, 255, 255]));
        let url = export_png(&e.doc, &e.view, 40, 40, &mut images).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn image_shapes_draw_their_bitmap() {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]));
        let mut png = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png).unwrap();
        let imported = crate::editor::ImportedImage::decode(&png).unwrap();

        let mut e = editor();
        e.set_tool(Tool::Image);
        e.pointer_down(Point::new(0.0, 0.0));
        e.resolve_image(Some(imported));
        let mut s = Surface::new(120, 120).unwrap();
        let mut images = ImageCache::default();
        render_frame(&mut s, &e, &mut images);
        assert_eq!(s.pixel(101, 101), Some(Rgba::rgb(0, 0, 255)));
        assert_eq!(s.pixel(110, 110), Some(CANVAS_BACKGROUND));
    }

    #[test]
    fn image_cache_redecodes_when_the_source_changes() {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
        let mut png = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png).unwrap();
        let url = io::png_data_url(&png);
        let mut images = ImageCache::default();
        assert!(images.get(7, &url).is_some());
        assert!(images.get(7, "data:image/png;base64,AAAA").is_none());
        assert!(images.get(7, &url).is_some());
        assert_ne!(ImageCache::source_key(&url), ImageCache::source_key(&format!("{url}A")));
    }
}
