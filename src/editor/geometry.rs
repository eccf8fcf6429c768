use crate::error::{Error, Result};
use crate::model::{self, Axis, Point, Shape, ShapeKind};
use std::f32::consts::PI;

pub const LINE_HIT_TOLERANCE: f32 = 10.0;

/// Point containment. Triangles pick by their bounding box and rotation is
/// not taken into account.
pub fn hit_test(shape: &Shape, p: Point) -> bool {
    match &shape.kind {
        ShapeKind::Circle { x, y, radius_x, radius_y }
        | ShapeKind::Arc { x, y, radius_x, radius_y, .. } => {
            hit_test_ellipse(Point::new(*x, *y), *radius_x, *radius_y, p)
                .unwrap_or_else(|| shape.bounds().contains(p))
        }
        ShapeKind::Line { x1, y1, x2, y2 } | ShapeKind::Arrow { x1, y1, x2, y2 } => {
            model::distance_to_segment(p, Point::new(*x1, *y1), Point::new(*x2, *y2))
                < LINE_HIT_TOLERANCE
        }
        ShapeKind::Rectangle { .. }
        | ShapeKind::Triangle { .. }
        | ShapeKind::Text { .. }
        | ShapeKind::Image { .. }
        | ShapeKind::Polygon { .. }
        | ShapeKind::Star { .. }
        | ShapeKind::Bezier { .. }
        | ShapeKind::Path { .. } => shape.bounds().contains(p),
    }
}

fn hit_test_ellipse(center: Point, rx: f32, ry: f32, p: Point) -> Option<bool> {
    if rx.abs() <= f32::EPSILON || ry.abs() <= f32::EPSILON {
        return None;
    }
    let nx = (p.x - center.x) / rx;
    let ny = (p.y - center.y) / ry;
    Some(nx * nx + ny * ny <= 1.0)
}

pub fn translate(shape: &mut Shape, dx: f32, dy: f32) {
    match &mut shape.kind {
        ShapeKind::Rectangle { x, y, .. }
        | ShapeKind::Triangle { x, y, .. }
        | ShapeKind::Circle { x, y, .. }
        | ShapeKind::Arc { x, y, .. }
        | ShapeKind::Star { x, y, .. }
        | ShapeKind::Text { x, y, .. }
        | ShapeKind::Image { x, y, .. } => {
            *x += dx;
            *y += dy;
        }
        ShapeKind::Line { x1, y1, x2, y2 } | ShapeKind::Arrow { x1, y1, x2, y2 } => {
            *x1 += dx;
            *y1 += dy;
            *x2 += dx;
            *y2 += dy;
        }
        ShapeKind::Polygon { points } | ShapeKind::Path { points } => {
            for p in points {
                *p = p.offset(dx, dy);
            }
        }
        ShapeKind::Bezier { start, control1, control2, end } => {
            for p in [start, control1, control2, end] {
                *p = p.offset(dx, dy);
            }
        }
    }
}

fn scale_about(p: &mut Point, center: Point, factor: f32) {
    p.x = center.x + (p.x - center.x) * factor;
    p.y = center.y + (p.y - center.y) * factor;
}

pub fn scale(shape: &mut Shape, factor: f32) {
    let center = shape.bounds().center();
    match &mut shape.kind {
        ShapeKind::Rectangle { width, height, .. }
        | ShapeKind::Triangle { width, height, .. }
        | ShapeKind::Image { width, height, .. } => {
            *width *= factor;
            *height *= factor;
        }
        ShapeKind::Circle { radius_x, radius_y, .. } | ShapeKind::Arc { radius_x, radius_y, .. } => {
            *radius_x *= factor;
            *radius_y *= factor;
        }
        ShapeKind::Star { outer_radius, inner_radius, .. } => {
            *outer_radius *= factor;
            *inner_radius *= factor;
        }
        ShapeKind::Line { x1, y1, x2, y2 } | ShapeKind::Arrow { x1, y1, x2, y2 } => {
            let mut a = Point::new(*x1, *y1);
            let mut b = Point::new(*x2, *y2);
            scale_about(&mut a, center, factor);
            scale_about(&mut b, center, factor);
            (*x1, *y1, *x2, *y2) = (a.x, a.y, b.x, b.y);
        }
        ShapeKind::Polygon { points } | ShapeKind::Path { points } => {
            for p in points {
                scale_about(p, center, factor);
            }
        }
        ShapeKind::Bezier { start, control1, control2, end } => {
            for p in [start, control1, control2, end] {
                scale_about(p, center, factor);
            }
        }
        ShapeKind::Text { font_size, .. } => {
            *font_size *= factor;
        }
    }
}

/// Mirrors position fields about `center` on `axis` and negates rotation.
///
/// Stars, polygons, text, beziers and freehand paths are rejected unchanged.
pub fn flip(shape: &mut Shape, axis: Axis, center: Point) -> Result<()> {
    let mirror_x = |v: f32| 2.0 * center.x - v;
    let mirror_y = |v: f32| 2.0 * center.y - v;
    match (&mut shape.kind, axis) {
        (ShapeKind::Rectangle { x, width, .. }, Axis::Horizontal)
        | (ShapeKind::Image { x, width, .. }, Axis::Horizontal) => {
            *x = mirror_x(*x + *width);
        }
        (ShapeKind::Rectangle { y, height, .. }, Axis::Vertical)
        | (ShapeKind::Image { y, height, .. }, Axis::Vertical) => {
            *y = mirror_y(*y + *height);
        }
        (ShapeKind::Triangle { x, width, .. }, Axis::Horizontal) => {
            *x = mirror_x(*x);
            *width = -*width;
        }
        (ShapeKind::Triangle { y, height, .. }, Axis::Vertical) => {
            *y = mirror_y(*y);
            *height = -*height;
        }
        (ShapeKind::Circle { x, .. }, Axis::Horizontal) => {
            *x = mirror_x(*x);
        }
        (ShapeKind::Circle { y, .. }, Axis::Vertical) => {
            *y = mirror_y(*y);
        }
        (ShapeKind::Arc { x, start_angle, end_angle, .. }, Axis::Horizontal) => {
            *x = mirror_x(*x);
            (*start_angle, *end_angle) = (PI - *end_angle, PI - *start_angle);
        }
        (ShapeKind::Arc { y, start_angle, end_angle, .. }, Axis::Vertical) => {
            *y = mirror_y(*y);
            (*start_angle, *end_angle) = (-*end_angle, -*start_angle);
        }
        (ShapeKind::Line { x1, x2, .. }, Axis::Horizontal)
        | (ShapeKind::Arrow { x1, x2, .. }, Axis::Horizontal) => {
            *x1 = mirror_x(*x1);
            *x2 = mirror_x(*x2);
        }
        (ShapeKind::Line { y1, y2, .. }, Axis::Vertical)
        | (ShapeKind::Arrow { y1, y2, .. }, Axis::Vertical) => {
            *y1 = mirror_y(*y1);
            *y2 = mirror_y(*y2);
        }
        (kind, _) => {
            return Err(Error::UnsupportedTransform {
                op: "flip",
                kind: kind.label(),
            });
        }
    }
    shape.rotation = -shape.rotation;
    Ok(())
}
