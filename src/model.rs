use crate::error::{Error, Result};
use crate::font;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis-aligned box in document space. `width` and `height` are never negative.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn from_rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_corners(Point::new(x, y), Point::new(x + width, y + height))
    }

    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let (mut min, mut max) = (first, first);
        for p in it {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Self::from_corners(min, max))
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Self::from_corners(
            Point::new(self.x.min(other.x), self.y.min(other.y)),
            Point::new(self.right().max(other.right()), self.bottom().max(other.bottom())),
        )
    }

    pub fn expand(&self, pad: f32) -> Bounds {
        Self {
            x: self.x - pad,
            y: self.y - pad,
            width: self.width + pad * 2.0,
            height: self.height + pad * 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_color32(c: egui::Color32) -> Self {
        let [r, g, b, a] = c.to_srgba_unmultiplied();
        Self { r, g, b, a }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => {
                let nib = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
                Some(Self::rgb(nib(0)?, nib(1)?, nib(2)?))
            }
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> Self {
        c.to_hex()
    }
}

impl TryFrom<String> for Rgba {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        Rgba::from_hex(&s).ok_or_else(|| format!("invalid color {s:?}"))
    }
}

pub fn lighten(color: Rgba, percent: f32) -> Rgba {
    let amt = (2.55 * percent).round().clamp(0.0, 255.0) as u8;
    Rgba {
        r: color.r.saturating_add(amt),
        g: color.g.saturating_add(amt),
        b: color.b.saturating_add(amt),
        a: color.a,
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    pub const ALL: [LineStyle; 3] = [LineStyle::Solid, LineStyle::Dashed, LineStyle::Dotted];

    pub fn dash_array(self) -> Option<[f32; 2]> {
        match self {
            LineStyle::Solid => None,
            LineStyle::Dashed => Some([10.0, 5.0]),
            LineStyle::Dotted => Some([2.0, 4.0]),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LineStyle::Solid => "Solid",
            LineStyle::Dashed => "Dashed",
            LineStyle::Dotted => "Dotted",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum FillPattern {
    #[default]
    #[serde(rename = "solid")]
    Solid,
    #[serde(rename = "gradient-h")]
    GradientHorizontal,
    #[serde(rename = "gradient-v")]
    GradientVertical,
    #[serde(rename = "gradient-radial")]
    GradientRadial,
}

impl FillPattern {
    pub const ALL: [FillPattern; 4] = [
        FillPattern::Solid,
        FillPattern::GradientHorizontal,
        FillPattern::GradientVertical,
        FillPattern::GradientRadial,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FillPattern::Solid => "Solid",
            FillPattern::GradientHorizontal => "Horizontal gradient",
            FillPattern::GradientVertical => "Vertical gradient",
            FillPattern::GradientRadial => "Radial gradient",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    pub fill: Option<Rgba>,
    pub fill_pattern: FillPattern,
    pub stroke: Rgba,
    pub stroke_width: f32,
    pub stroke_style: LineStyle,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Some(Rgba::rgb(0x1a, 0x73, 0xe8)),
            fill_pattern: FillPattern::Solid,
            stroke: Rgba::rgb(0x20, 0x21, 0x24),
            stroke_width: 2.0,
            stroke_style: LineStyle::Solid,
        }
    }
}

pub const DEFAULT_FONT_SIZE: f32 = 16.0;
pub const DEFAULT_FONT_FAMILY: &str = "Arial";
pub const STAR_POINTS: u32 = 5;
pub const MAX_STAR_POINTS: u32 = 1000;
pub const STAR_INNER_RATIO: f32 = 0.4;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ShapeKind {
    Rectangle {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Circle {
        x: f32,
        y: f32,
        radius_x: f32,
        radius_y: f32,
    },
    /// Keeps the raw drag vector, so `width` and `height` may be negative.
    Triangle {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Polygon {
        points: Vec<Point>,
    },
    Star {
        x: f32,
        y: f32,
        outer_radius: f32,
        inner_radius: f32,
        points: u32,
        #[serde(default = "default_star_rotation")]
        base_rotation: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    Arrow {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    Bezier {
        start: Point,
        control1: Point,
        control2: Point,
        end: Point,
    },
    Path {
        points: Vec<Point>,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        font_size: f32,
        #[serde(default = "default_font_family")]
        font_family: String,
        #[serde(default)]
        bold: bool,
        #[serde(default)]
        italic: bool,
        #[serde(default)]
        underline: bool,
    },
    /// `src` holds the bitmap as a PNG data URL.
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        #[serde(default)]
        src: String,
    },
    Arc {
        x: f32,
        y: f32,
        radius_x: f32,
        radius_y: f32,
        start_angle: f32,
        end_angle: f32,
    },
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

fn default_star_rotation() -> f32 {
    -PI / 2.0
}

impl ShapeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle { .. } => "rectangle",
            ShapeKind::Circle { .. } => "circle",
            ShapeKind::Triangle { .. } => "triangle",
            ShapeKind::Polygon { .. } => "polygon",
            ShapeKind::Star { .. } => "star",
            ShapeKind::Line { .. } => "line",
            ShapeKind::Arrow { .. } => "arrow",
            ShapeKind::Bezier { .. } => "bezier",
            ShapeKind::Path { .. } => "path",
            ShapeKind::Text { .. } => "text",
            ShapeKind::Image { .. } => "image",
            ShapeKind::Arc { .. } => "arc",
        }
    }

    pub fn supports_fill(&self) -> bool {
        !matches!(
            self,
            ShapeKind::Line { .. } | ShapeKind::Arrow { .. } | ShapeKind::Arc { .. } | ShapeKind::Image { .. }
        )
    }

    pub fn takes_fill(&self) -> bool {
        !matches!(
            self,
            ShapeKind::Line { .. }
                | ShapeKind::Arrow { .. }
                | ShapeKind::Arc { .. }
                | ShapeKind::Image { .. }
                | ShapeKind::Bezier { .. }
                | ShapeKind::Path { .. }
        )
    }

    pub fn star_vertices(
        x: f32,
        y: f32,
        outer: f32,
        inner: f32,
        points: u32,
        rotation: f32,
    ) -> Vec<Point> {
        let n = points.clamp(2, MAX_STAR_POINTS);
        (0..n * 2)
            .map(|i| {
                let r = if i % 2 == 0 { outer } else { inner };
                let angle = i as f32 * PI / n as f32 + rotation;
                Point::new(x + r * angle.cos(), y + r * angle.sin())
            })
            .collect()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    /// Zero until the owning document assigns one.
    #[serde(default)]
    pub id: u64,
    pub layer_id: u64,
    #[serde(default = "default_stroke")]
    pub stroke: Rgba,
    #[serde(default)]
    pub stroke_width: f32,
    #[serde(default)]
    pub stroke_style: LineStyle,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default, deserialize_with = "optional_color")]
    pub fill: Option<Rgba>,
    #[serde(default)]
    pub fill_pattern: FillPattern,
    #[serde(flatten)]
    pub kind: ShapeKind,
}

fn default_opacity() -> f32 {
    1.0
}

fn default_stroke() -> Rgba {
    Style::default().stroke
}

/// `null`, `"transparent"` and `"none"` all mean no fill.
fn optional_color<'de, D>(deserializer: D) -> std::result::Result<Option<Rgba>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let Some(s) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match s.trim() {
        "" | "transparent" | "none" => Ok(None),
        other => Rgba::from_hex(other)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color {other:?}"))),
    }
}

impl Shape {
    pub fn new(id: u64, layer_id: u64, kind: ShapeKind, style: &Style) -> Self {
        let fill = match &kind {
            ShapeKind::Text { .. } => Some(style.stroke),
            k if k.takes_fill() => style.fill,
            _ => None,
        };
        Self {
            id,
            layer_id,
            stroke: style.stroke,
            stroke_width: style.stroke_width,
            stroke_style: style.stroke_style,
            opacity: 1.0,
            rotation: 0.0,
            fill,
            fill_pattern: style.fill_pattern,
            kind,
        }
    }

    pub fn bounds(&self) -> Bounds {
        match &self.kind {
            ShapeKind::Rectangle { x, y, width, height }
            | ShapeKind::Triangle { x, y, width, height }
            | ShapeKind::Image { x, y, width, height, .. } => {
                Bounds::from_rect(*x, *y, *width, *height)
            }
            ShapeKind::Circle { x, y, radius_x, radius_y }
            | ShapeKind::Arc { x, y, radius_x, radius_y, .. } => {
                let (rx, ry) = (radius_x.abs(), radius_y.abs());
                Bounds::from_rect(x - rx, y - ry, rx * 2.0, ry * 2.0)
            }
            ShapeKind::Polygon { points } | ShapeKind::Path { points } => {
                Bounds::from_points(points.iter().copied()).unwrap_or_default()
            }
            ShapeKind::Star { x, y, outer_radius, inner_radius, points, base_rotation } => {
                Bounds::from_points(ShapeKind::star_vertices(
                    *x,
                    *y,
                    *outer_radius,
                    *inner_radius,
                    *points,
                    *base_rotation,
                ))
                .unwrap_or_default()
            }
            ShapeKind::Line { x1, y1, x2, y2 } | ShapeKind::Arrow { x1, y1, x2, y2 } => {
                Bounds::from_corners(Point::new(*x1, *y1), Point::new(*x2, *y2))
            }
            ShapeKind::Bezier { start, control1, control2, end } => {
                Bounds::from_points([*start, *control1, *control2, *end]).unwrap_or_default()
            }
            ShapeKind::Text { x, y, text, font_size, .. } => {
                let w = font::measure_text(text, *font_size);
                Bounds::from_rect(*x, y - font_size, w, *font_size)
            }
        }
    }

    pub fn rotation_center(&self) -> Point {
        match &self.kind {
            ShapeKind::Circle { x, y, .. }
            | ShapeKind::Arc { x, y, .. }
            | ShapeKind::Star { x, y, .. } => Point::new(*x, *y),
            _ => self.bounds().center(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Layer {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
}

fn default_visible() -> bool {
    true
}

impl Layer {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            name: format!("Layer {id}"),
            shapes: Vec::new(),
            visible: true,
            locked: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub layers: Vec<Layer>,
    pub current_layer_id: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            layers: vec![Layer::new(1)],
            current_layer_id: 1,
        }
    }
}

impl Document {
    /// Appends a layer with a never-reused id and makes it current.
    pub fn add_layer(&mut self) -> &Layer {
        let id = self.layers.iter().map(|l| l.id).max().unwrap_or(0) + 1;
        self.layers.push(Layer::new(id));
        self.current_layer_id = id;
        &self.layers[self.layers.len() - 1]
    }

    fn current_index(&self) -> usize {
        self.layers
            .iter()
            .position(|l| l.id == self.current_layer_id)
            .unwrap_or(0)
    }

    pub fn current_layer(&self) -> &Layer {
        &self.layers[self.current_index()]
    }

    pub fn current_layer_mut(&mut self) -> &mut Layer {
        let idx = self.current_index();
        &mut self.layers[idx]
    }

    pub fn set_visible(&mut self, layer_id: u64, visible: bool) -> bool {
        match self.layers.iter_mut().find(|l| l.id == layer_id) {
            Some(layer) => {
                layer.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn set_current(&mut self, layer_id: u64) -> bool {
        if self.layers.iter().any(|l| l.id == layer_id) {
            self.current_layer_id = layer_id;
            true
        } else {
            false
        }
    }

    pub fn layer(&self, layer_id: u64) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == layer_id)
    }

    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.layers.iter().flat_map(|l| l.shapes.iter())
    }

    pub fn visible_shapes(&self) -> impl Iterator<Item = &Shape> {
        self.layers
            .iter()
            .filter(|l| l.visible)
            .flat_map(|l| l.shapes.iter())
    }

    pub fn shape_count(&self) -> usize {
        self.layers.iter().map(|l| l.shapes.len()).sum()
    }

    pub fn find_shape(&self, id: u64) -> Option<&Shape> {
        self.shapes().find(|s| s.id == id)
    }

    pub fn find_shape_mut(&mut self, id: u64) -> Option<&mut Shape> {
        self.layers
            .iter_mut()
            .flat_map(|l| l.shapes.iter_mut())
            .find(|s| s.id == id)
    }

    pub fn remove_shape(&mut self, id: u64) -> Option<Shape> {
        for layer in &mut self.layers {
            if let Some(idx) = layer.shapes.iter().position(|s| s.id == id) {
                return Some(layer.shapes.remove(idx));
            }
        }
        None
    }

    pub fn next_shape_id(&self) -> u64 {
        self.shapes().map(|s| s.id).max().unwrap_or(0) + 1
    }

    pub fn push_shape(&mut self, mut shape: Shape) -> u64 {
        let layer = self.current_layer_mut();
        shape.layer_id = layer.id;
        let id = shape.id;
        layer.shapes.push(shape);
        id
    }

    pub fn clear_shapes(&mut self) {
        for layer in &mut self.layers {
            layer.shapes.clear();
        }
    }

    pub fn content_bounds(&self) -> Option<Bounds> {
        self.shapes()
            .map(Shape::bounds)
            .reduce(|acc, b| acc.union(&b))
    }

    /// Checks the layer store invariants, repoints a stale current layer and
    /// numbers shapes stored without an id.
    pub fn validate(&mut self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(Error::InvalidDocument("document has no layers".to_string()));
        }
        let mut seen = std::collections::HashSet::new();
        let mut shape_ids = std::collections::HashSet::new();
        for layer in &self.layers {
            if !seen.insert(layer.id) {
                return Err(Error::InvalidDocument(format!(
                    "duplicate layer id {}",
                    layer.id
                )));
            }
            for shape in &layer.shapes {
                if shape.layer_id != layer.id {
                    return Err(Error::InvalidDocument(format!(
                        "shape {} claims layer {} but sits in layer {}",
                        shape.id, shape.layer_id, layer.id
                    )));
                }
                if shape.id != 0 && !shape_ids.insert(shape.id) {
                    return Err(Error::InvalidDocument(format!(
                        "duplicate shape id {}",
                        shape.id
                    )));
                }
                if let ShapeKind::Star { points, .. } = shape.kind {
                    if !(2..=MAX_STAR_POINTS).contains(&points) {
                        return Err(Error::InvalidDocument(format!(
                            "star {} has {points} points",
                            shape.id
                        )));
                    }
                }
            }
        }
        if !seen.contains(&self.current_layer_id) {
            self.current_layer_id = self.layers[0].id;
        }
        let mut next = self.next_shape_id();
        for shape in self.layers.iter_mut().flat_map(|l| l.shapes.iter_mut()) {
            if shape.id == 0 {
                shape.id = next;
                next += 1;
            }
        }
        Ok(())
    }
}

pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (abx, aby) = (b.x - a.x, b.y - a.y);
    let len2 = abx * abx + aby * aby;
    if len2 <= f32::EPSILON {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len2).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + abx * t, a.y + aby * t))
}
