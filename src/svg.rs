use crate::model::{self, Document, Shape, ShapeKind};
use std::fmt::Write as _;

fn rgba_to_svg(color: model::Rgba) -> String {
    if color.a == 255 {
        color.to_hex()
    } else {
        format!("rgba({},{},{},{:.3})", color.r, color.g, color.b, color.a as f32 / 255.0)
    }
}

fn dasharray(line_style: model::LineStyle) -> Option<String> {
    line_style.dash_array().map(|[on, off]| format!("{on} {off}"))
}

fn common_attrs(shape: &Shape) -> String {
    let fill = shape.fill.map(rgba_to_svg).unwrap_or_else(|| "white".to_string());
    let mut out = format!(
        r#"fill="{fill}" stroke="{}" stroke-width="{}""#,
        rgba_to_svg(shape.stroke),
        shape.stroke_width
    );
    if let Some(dash) = dasharray(shape.stroke_style) {
        let _ = write!(out, r#" stroke-dasharray="{dash}""#);
    }
    if shape.opacity < 1.0 {
        let _ = write!(out, r#" opacity="{}""#, shape.opacity);
    }
    if shape.rotation != 0.0 {
        let c = shape.rotation_center();
        let _ = write!(out, r#" transform="rotate({} {} {})""#, shape.rotation, c.x, c.y);
    }
    out
}

fn shape_to_svg(shape: &Shape) -> Option<String> {
    match &shape.kind {
        ShapeKind::Rectangle { x, y, width, height } => Some(format!(
            r#"<rect x="{x}" y="{y}" width="{width}" height="{height}" {}/>"#,
            common_attrs(shape)
        )),
        ShapeKind::Circle { x, y, radius_x, radius_y } => Some(format!(
            r#"<ellipse cx="{x}" cy="{y}" rx="{radius_x}" ry="{radius_y}" {}/>"#,
            common_attrs(shape)
        )),
        _ => None,
    }
}

/// Serializes visible rectangles and circles on a white `width` x `height`
/// page.
pub fn document_to_svg(doc: &Document, width: u32, height: u32) -> String {
    let mut out = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}">"#
    );
    out.push('\n');
    out.push_str(r#"<rect width="100%" height="100%" fill="white"/>"#);
    out.push('\n');
    let mut skipped = 0usize;
    for shape in doc.visible_shapes() {
        match shape_to_svg(shape) {
            Some(element) => {
                out.push_str(&element);
                out.push('\n');
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "svg export skipped shapes without an svg form");
    }
    out.push_str("</svg>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LineStyle, Style};

    fn doc_with(kinds: Vec<ShapeKind>) -> Document {
        let mut doc = Document::default();
        for (i, kind) in kinds.into_iter().enumerate() {
            doc.push_shape(Shape::new(i as u64 + 1, 1, kind, &Style::default()));
        }
        doc
    }

    #[test]
    fn exports_rectangles_and_circles_only() {
        let doc = doc_with(vec![
            ShapeKind::Rectangle { x: 10.0, y: 20.0, width: 30.0, height: 40.0 },
            ShapeKind::Circle { x: 5.0, y: 6.0, radius_x: 7.0, radius_y: 8.0 },
            ShapeKind::Line { x1: 0.0, y1: 0.0, x2: 1.0, y2: 1.0 },
        ]);
        let svg = document_to_svg(&doc, 800, 600);
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="800" height="600">"#));
        assert!(svg.contains(r##"<rect x="10" y="20" width="30" height="40" fill="#1a73e8""##));
        assert!(svg.contains(r#"<ellipse cx="5" cy="6" rx="7" ry="8""#));
        assert!(!svg.contains("<line"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn missing_fill_becomes_white_and_dash_is_kept() {
        let mut doc = doc_with(vec![ShapeKind::Rectangle { x: 0.0, y: 0.0, width: 1.0, height: 1.0 }]);
        let shape = &mut doc.layers[0].shapes[0];
        shape.fill = None;
        shape.stroke_style = LineStyle::Dashed;
        let svg = document_to_svg(&doc, 10, 10);
        assert!(svg.contains(r##"fill="white" stroke="#202124""##));
        assert!(svg.contains(r#"stroke-dasharray="10 5""#));
    }

    #[test]
    fn hidden_layers_are_skipped() {
        let mut doc = doc_with(vec![ShapeKind::Rectangle { x: 0.0, y: 0.0, width: 1.0, height: 1.0 }]);
        doc.layers[0].visible = false;
        assert!(!document_to_svg(&doc, 10, 10).contains("<rect x="));
    }
}
