use super::shapes::{self, oval, polyline, rect, solid, stroke};
use super::ImageCache;
use crate::editor::view::GRID_SIZE;
use crate::editor::{tools, Editor, InProgress};
use crate::model::{Bounds, LineStyle, Point, Rgba, Shape, ShapeKind};
use tiny_skia::{FillRule, PathBuilder, Pixmap, Stroke, StrokeDash, Transform};

const GRID_COLOR: Rgba = Rgba::rgba(255, 255, 255, 13);
const GUIDE_COLOR: Rgba = Rgba::rgba(255, 0, 0, 128);
const SELECTION_COLOR: Rgba = Rgba::rgb(0, 122, 204);
const SELECTION_PADDING: f32 = 5.0;
const POLYGON_HINT: Rgba = Rgba::rgba(0, 122, 204, 128);
const BEZIER_HINT: Rgba = Rgba::rgba(0, 122, 204, 77);
const BEZIER_HANDLE: Rgba = Rgba::rgba(255, 0, 0, 128);
const BEZIER_HANDLE_RADIUS: f32 = 4.0;
const MAX_GRID_LINES: i64 = 4096;

fn dashed(width: f32) -> Stroke {
    Stroke { width, dash: StrokeDash::new(vec![5.0, 5.0], 0.0), ..Default::default() }
}

fn stroke_segment(pixmap: &mut Pixmap, a: Point, b: Point, c: Rgba, s: &Stroke, ts: Transform) {
    if let Some(path) = polyline(&[a, b], false) {
        pixmap.stroke_path(&path, &solid(c, 1.0), s, ts, None);
    }
}

/// Grid positions in `lo..=hi`. Spans needing more than
/// [`MAX_GRID_LINES`] lines yield nothing.
fn grid_lines(lo: f32, hi: f32) -> impl Iterator<Item = f32> {
    let first = (lo / GRID_SIZE).floor() as i64;
    let last = (hi / GRID_SIZE).floor() as i64;
    let indices = if last.saturating_sub(first) < MAX_GRID_LINES { first..=last } else { 1..=0 };
    indices.map(|i| i as f32 * GRID_SIZE)
}

pub(super) fn draw_grid(pixmap: &mut Pixmap, visible: Bounds, ts: Transform) {
    let mut pb = PathBuilder::new();
    for x in grid_lines(visible.x, visible.right()) {
        pb.move_to(x, visible.y);
        pb.line_to(x, visible.bottom());
    }
    for y in grid_lines(visible.y, visible.bottom()) {
        pb.move_to(visible.x, y);
        pb.line_to(visible.right(), y);
    }
    if let Some(path) = pb.finish() {
        pixmap.stroke_path(&path, &solid(GRID_COLOR, 1.0), &stroke(1.0, LineStyle::Solid), ts, None);
    }
}

pub(super) fn draw_guides(pixmap: &mut Pixmap, view: &crate::editor::View, visible: Bounds, ts: Transform) {
    let s = dashed(1.0);
    for &y in &view.horizontal_guides {
        let (a, b) = (Point::new(visible.x, y), Point::new(visible.right(), y));
        stroke_segment(pixmap, a, b, GUIDE_COLOR, &s, ts);
    }
    for &x in &view.vertical_guides {
        let (a, b) = (Point::new(x, visible.y), Point::new(x, visible.bottom()));
        stroke_segment(pixmap, a, b, GUIDE_COLOR, &s, ts);
    }
}

pub(super) fn draw_selection(pixmap: &mut Pixmap, shape: &Shape, ts: Transform) {
    let ts = shapes::shape_transform(shape, ts);
    let outline = match &shape.kind {
        ShapeKind::Circle { x, y, radius_x, radius_y } | ShapeKind::Arc { x, y, radius_x, radius_y, .. } => {
            oval(*x, *y, radius_x + SELECTION_PADDING, radius_y + SELECTION_PADDING)
        }
        _ => rect(shape.bounds().expand(SELECTION_PADDING)).map(PathBuilder::from_rect),
    };
    if let Some(path) = outline {
        pixmap.stroke_path(&path, &solid(SELECTION_COLOR, 1.0), &dashed(2.0), ts, None);
    }
}

fn draw_ghost(pixmap: &mut Pixmap, editor: &Editor, kind: ShapeKind, ts: Transform) {
    let ghost = Shape::new(0, editor.doc.current_layer_id, kind, &editor.style);
    shapes::draw_shape(pixmap, &ghost, ts, &mut ImageCache::default());
}

pub(super) fn draw_preview(pixmap: &mut Pixmap, editor: &Editor, ts: Transform) {
    match editor.in_progress() {
        Some(InProgress::Drag { start, current }) => {
            if let Some(kind) = tools::drag_shape_kind(editor.tool(), *start, *current) {
                draw_ghost(pixmap, editor, kind, ts);
            }
        }
        Some(InProgress::Pencil { points }) => {
            draw_ghost(pixmap, editor, ShapeKind::Path { points: points.clone() }, ts);
        }
        Some(InProgress::Polygon { points, current }) => {
            if let Some(path) = polyline(points, false).filter(|_| editor.style.stroke_width > 0.0) {
                let edges = stroke(editor.style.stroke_width, editor.style.stroke_style);
                pixmap.stroke_path(&path, &solid(editor.style.stroke, 1.0), &edges, ts, None);
            }
            if let Some(last) = points.last() {
                stroke_segment(pixmap, *last, *current, POLYGON_HINT, &dashed(1.0), ts);
            }
        }
        Some(InProgress::Bezier { points, current }) => {
            let hint = dashed(1.0);
            if let [start, control1, ..] = points.as_slice() {
                stroke_segment(pixmap, *start, *control1, BEZIER_HINT, &hint, ts);
            }
            if let Some(control2) = points.get(2) {
                stroke_segment(pixmap, *control2, *current, BEZIER_HINT, &hint, ts);
            }
            for p in points {
                if let Some(dot) = oval(p.x, p.y, BEZIER_HANDLE_RADIUS, BEZIER_HANDLE_RADIUS) {
                    pixmap.fill_path(&dot, &solid(BEZIER_HANDLE, 1.0), FillRule::Winding, ts, None);
                }
            }
        }
        Some(InProgress::Move { .. } | InProgress::Pan { .. }) | None => {}
    }
}
