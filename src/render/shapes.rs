use super::{ImageCache, color};
use crate::font;
use crate::model::{self, Bounds, FillPattern, LineStyle, Point, Rgba, Shape, ShapeKind};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_6, TAU};
use tiny_skia::{
    FillRule, FilterQuality, GradientStop, LinearGradient, Paint, Path, PathBuilder, Pixmap,
    PixmapPaint, RadialGradient, Rect, SpreadMode, Stroke, StrokeDash, Transform,
};

const GRADIENT_LIGHTEN: f32 = 30.0;
const ARROW_HEAD_BASE: f32 = 15.0;
const IMAGE_PLACEHOLDER: Rgba = Rgba::rgb(0x9a, 0xa0, 0xa6);

pub(super) fn solid(c: Rgba, opacity: f32) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color(c, opacity));
    paint.anti_alias = true;
    paint
}

pub(super) fn stroke(width: f32, style: LineStyle) -> Stroke {
    let mut stroke = Stroke { width, ..Default::default() };
    if let Some([on, off]) = style.dash_array() {
        stroke.dash = StrokeDash::new(vec![on, off], 0.0);
    }
    stroke
}

pub(super) fn rect(b: Bounds) -> Option<Rect> {
    Rect::from_xywh(b.x, b.y, b.width, b.height)
}

pub(super) fn oval(cx: f32, cy: f32, rx: f32, ry: f32) -> Option<Path> {
    PathBuilder::from_oval(Rect::from_xywh(cx - rx, cy - ry, rx * 2.0, ry * 2.0)?)
}

pub(super) fn polyline(points: &[Point], close: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

/// Elliptical arc sweeping clockwise on screen from `start` to `end`
/// radians, one cubic per quarter turn at most.
fn arc_path(cx: f32, cy: f32, rx: f32, ry: f32, start: f32, end: f32) -> Option<Path> {
    let raw = end - start;
    let sweep = if raw >= TAU { TAU } else { raw.rem_euclid(TAU) };
    if sweep == 0.0 {
        return None;
    }
    let at = |a: f32| (cx + rx * a.cos(), cy + ry * a.sin());
    let tangent = |a: f32| (-rx * a.sin(), ry * a.cos());

    let segments = (sweep / FRAC_PI_2).ceil().max(1.0) as u32;
    let step = sweep / segments as f32;
    let k = 4.0 / 3.0 * (step / 4.0).tan();

    let mut pb = PathBuilder::new();
    let (sx, sy) = at(start);
    pb.move_to(sx, sy);
    for i in 0..segments {
        let a0 = start + step * i as f32;
        let a1 = a0 + step;
        let (p0, d0) = (at(a0), tangent(a0));
        let (p1, d1) = (at(a1), tangent(a1));
        pb.cubic_to(
            p0.0 + k * d0.0,
            p0.1 + k * d0.1,
            p1.0 - k * d1.0,
            p1.1 - k * d1.1,
            p1.0,
            p1.1,
        );
    }
    pb.finish()
}

fn shape_path(kind: &ShapeKind, bounds: Bounds) -> Option<Path> {
    match kind {
        ShapeKind::Rectangle { .. } => Some(PathBuilder::from_rect(rect(bounds)?)),
        ShapeKind::Circle { x, y, radius_x, radius_y } => oval(*x, *y, *radius_x, *radius_y),
        ShapeKind::Triangle { x, y, width, height } => polyline(
            &[
                Point::new(*x, *y),
                Point::new(x + width / 2.0, y + height),
                Point::new(x + width, *y),
            ],
            true,
        ),
        ShapeKind::Polygon { points } => polyline(points, true),
        ShapeKind::Star { x, y, outer_radius, inner_radius, points, base_rotation } => polyline(
            &ShapeKind::star_vertices(*x, *y, *outer_radius, *inner_radius, *points, *base_rotation),
            true,
        ),
        ShapeKind::Line { x1, y1, x2, y2 } => {
            polyline(&[Point::new(*x1, *y1), Point::new(*x2, *y2)], false)
        }
        ShapeKind::Bezier { start, control1, control2, end } => {
            let mut pb = PathBuilder::new();
            pb.move_to(start.x, start.y);
            pb.cubic_to(control1.x, control1.y, control2.x, control2.y, end.x, end.y);
            pb.finish()
        }
        ShapeKind::Path { points } => polyline(points, false),
        ShapeKind::Arc { x, y, radius_x, radius_y, start_angle, end_angle } => {
            arc_path(*x, *y, *radius_x, *radius_y, *start_angle, *end_angle)
        }
        ShapeKind::Arrow { .. } | ShapeKind::Text { .. } | ShapeKind::Image { .. } => None,
    }
}

fn fill_paint(fill: Rgba, pattern: FillPattern, b: Bounds, opacity: f32) -> Paint<'static> {
    let mut paint = solid(fill, opacity);
    let stops = || {
        vec![
            GradientStop::new(0.0, color(fill, opacity)),
            GradientStop::new(1.0, color(model::lighten(fill, GRADIENT_LIGHTEN), opacity)),
        ]
    };
    let shader = match pattern {
        FillPattern::Solid => None,
        FillPattern::GradientHorizontal => LinearGradient::new(
            tiny_skia::Point::from_xy(b.x, b.y),
            tiny_skia::Point::from_xy(b.right(), b.y),
            stops(),
            SpreadMode::Pad,
            Transform::identity(),
        ),
        FillPattern::GradientVertical => LinearGradient::new(
            tiny_skia::Point::from_xy(b.x, b.y),
            tiny_skia::Point::from_xy(b.x, b.bottom()),
            stops(),
            SpreadMode::Pad,
            Transform::identity(),
        ),
        FillPattern::GradientRadial => {
            let c = b.center();
            let center = tiny_skia::Point::from_xy(c.x, c.y);
            RadialGradient::new(
                center,
                center,
                b.width.max(b.height),
                stops(),
                SpreadMode::Pad,
                Transform::identity(),
            )
        }
    };
    if let Some(shader) = shader {
        paint.shader = shader;
    }
    paint
}

fn stroke_with(pixmap: &mut Pixmap, path: &Path, shape: &Shape, ts: Transform) {
    if shape.stroke_width <= 0.0 {
        return;
    }
    let paint = solid(shape.stroke, shape.opacity);
    pixmap.stroke_path(path, &paint, &stroke(shape.stroke_width, shape.stroke_style), ts, None);
}

fn draw_arrow(pixmap: &mut Pixmap, shape: &Shape, from: Point, to: Point, ts: Transform) {
    if let Some(line) = polyline(&[from, to], false) {
        stroke_with(pixmap, &line, shape, ts);
    }
    let angle = (to.y - from.y).atan2(to.x - from.x);
    let len = ARROW_HEAD_BASE + 2.0 * shape.stroke_width;
    let wing = |a: f32| Point::new(to.x - len * a.cos(), to.y - len * a.sin());
    let head = [to, wing(angle - FRAC_PI_6), wing(angle + FRAC_PI_6)];
    if let Some(path) = polyline(&head, true) {
        let paint = solid(shape.stroke, shape.opacity);
        pixmap.fill_path(&path, &paint, FillRule::Winding, ts, None);
    }
}

fn draw_text(pixmap: &mut Pixmap, shape: &Shape, ts: Transform) {
    let ShapeKind::Text { x, y, text, font_size, bold, italic, underline, .. } = &shape.kind else {
        return;
    };
    let ink = shape.fill.unwrap_or(shape.stroke);
    let paint = solid(ink, shape.opacity);
    if let Some(glyphs) = font::text_path(text, *x, *y, *font_size, *italic) {
        pixmap.fill_path(&glyphs, &paint, FillRule::Winding, ts, None);
        if *bold {
            let weight = stroke((font_size / 24.0).max(0.5), LineStyle::Solid);
            pixmap.stroke_path(&glyphs, &paint, &weight, ts, None);
        }
    }
    if *underline {
        let width = font::measure_text(text, *font_size);
        let under = [Point::new(*x, y + 2.0), Point::new(x + width, y + 2.0)];
        if let Some(line) = polyline(&under, false) {
            pixmap.stroke_path(&line, &paint, &stroke(1.0, LineStyle::Solid), ts, None);
        }
    }
}

fn draw_image(pixmap: &mut Pixmap, shape: &Shape, ts: Transform, images: &mut ImageCache) {
    let ShapeKind::Image { x, y, width, height, src } = &shape.kind else {
        return;
    };
    match images.get(shape.id, src) {
        Some(bitmap) => {
            let sx = width / bitmap.width() as f32;
            let sy = height / bitmap.height() as f32;
            let paint = PixmapPaint {
                opacity: shape.opacity.clamp(0.0, 1.0),
                quality: FilterQuality::Bilinear,
                ..Default::default()
            };
            pixmap.draw_pixmap(0, 0, bitmap.as_ref(), &paint, ts.pre_translate(*x, *y).pre_scale(sx, sy), None);
        }
        None => {
            if let Some(r) = rect(shape.bounds()) {
                let paint = solid(IMAGE_PLACEHOLDER, shape.opacity);
                let outline = stroke(1.0, LineStyle::Dashed);
                pixmap.stroke_path(&PathBuilder::from_rect(r), &paint, &outline, ts, None);
            }
        }
    }
}

pub(super) fn shape_transform(shape: &Shape, ts: Transform) -> Transform {
    if shape.rotation == 0.0 {
        return ts;
    }
    let c = shape.rotation_center();
    ts.pre_concat(Transform::from_rotate_at(shape.rotation, c.x, c.y))
}

pub(super) fn draw_shape(pixmap: &mut Pixmap, shape: &Shape, ts: Transform, images: &mut ImageCache) {
    let ts = shape_transform(shape, ts);
    match &shape.kind {
        ShapeKind::Text { .. } => draw_text(pixmap, shape, ts),
        ShapeKind::Image { .. } => draw_image(pixmap, shape, ts, images),
        ShapeKind::Arrow { x1, y1, x2, y2 } => {
            draw_arrow(pixmap, shape, Point::new(*x1, *y1), Point::new(*x2, *y2), ts)
        }
        kind => {
            let bounds = shape.bounds();
            let Some(path) = shape_path(kind, bounds) else {
                return;
            };
            if let Some(fill) = shape.fill.filter(|_| kind.supports_fill()) {
                let paint = fill_paint(fill, shape.fill_pattern, bounds, shape.opacity);
                pixmap.fill_path(&path, &paint, FillRule::Winding, ts, None);
            }
            stroke_with(pixmap, &path, shape, ts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Style;

    fn canvas() -> Pixmap {
        Pixmap::new(100, 100).unwrap()
    }

    fn alpha(p: &Pixmap, x: u32, y: u32) -> u8 {
        p.pixel(x, y).unwrap().alpha()
    }

    fn shape(kind: ShapeKind) -> Shape {
        Shape::new(1, 1, kind, &Style::default())
    }

    #[test]
    fn quarter_arc_stays_in_its_quadrant() {
        let path = arc_path(0.0, 0.0, 10.0, 10.0, 0.0, FRAC_PI_2).unwrap();
        let b = path.bounds();
        assert!(b.left() >= -0.01 && b.top() >= -0.01);
        assert!((b.right() - 10.0).abs() < 0.01 && (b.bottom() - 10.0).abs() < 0.01);
    }

    #[test]
    fn backwards_arc_wraps_clockwise() {
        let path = arc_path(0.0, 0.0, 10.0, 10.0, FRAC_PI_2, 0.0).unwrap();
        // Three quarters of the ellipse, so it reaches the left edge.
        assert!(path.bounds().left() < -9.9);
        assert!(arc_path(0.0, 0.0, 10.0, 10.0, 1.0, 1.0).is_none());
    }

    #[test]
    fn triangle_apex_points_down() {
        let t = shape(ShapeKind::Triangle { x: 10.0, y: 10.0, width: 80.0, height: 80.0 });
        let mut p = canvas();
        draw_shape(&mut p, &t, Transform::identity(), &mut ImageCache::default());
        assert_eq!(alpha(&p, 50, 20), 255);
        assert_eq!(alpha(&p, 15, 80), 0);
    }

    #[test]
    fn lines_are_never_filled() {
        let mut l = shape(ShapeKind::Line { x1: 10.0, y1: 10.0, x2: 90.0, y2: 90.0 });
        l.fill = Some(Rgba::rgb(255, 0, 0));
        let mut p = canvas();
        draw_shape(&mut p, &l, Transform::identity(), &mut ImageCache::default());
        assert!(alpha(&p, 50, 50) > 0);
        assert_eq!(alpha(&p, 80, 20), 0);
    }

    #[test]
    fn arrow_head_is_filled_with_stroke_color() {
        let a = shape(ShapeKind::Arrow { x1: 0.0, y1: 50.0, x2: 90.0, y2: 50.0 });
        let mut p = canvas();
        draw_shape(&mut p, &a, Transform::identity(), &mut ImageCache::default());
        // Inside the head, off the shaft.
        let px = p.pixel(80, 53).unwrap().demultiply();
        assert_eq!((px.red(), px.green(), px.blue()), (0x20, 0x21, 0x24));
    }

    #[test]
    fn horizontal_gradient_lightens_to_the_right() {
        let mut r = shape(ShapeKind::Rectangle { x: 0.0, y: 0.0, width: 100.0, height: 100.0 });
        r.fill = Some(Rgba::rgb(0, 0, 0));
        r.fill_pattern = FillPattern::GradientHorizontal;
        r.stroke_width = 0.0;
        let mut p = canvas();
        draw_shape(&mut p, &r, Transform::identity(), &mut ImageCache::default());
        let left = p.pixel(2, 50).unwrap().red();
        let right = p.pixel(97, 50).unwrap().red();
        assert!(left < 10 && right > 60, "{left} {right}");
    }

    #[test]
    fn missing_image_draws_placeholder() {
        let img = shape(ShapeKind::Image {
            x: 10.0,
            y: 10.0,
            width: 50.0,
            height: 50.0,
            src: "not a data url".to_string(),
        });
        let mut p = canvas();
        draw_shape(&mut p, &img, Transform::identity(), &mut ImageCache::default());
        assert_eq!(alpha(&p, 35, 35), 0);
        assert!(p.pixels().iter().any(|c| c.alpha() > 0));
    }
}
