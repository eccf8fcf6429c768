use super::{geometry, Editor, InProgress, PendingInput};
use crate::model::{Bounds, Point, ShapeKind, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, STAR_INNER_RATIO, STAR_POINTS};
use std::f32::consts::PI;

/// Distance from the first vertex that closes a polygon.
pub const POLYGON_CLOSE_DISTANCE: f32 = 10.0;
pub const IMAGE_ORIGIN: Point = Point::new(100.0, 100.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Select,
    Pan,
    Rectangle,
    Circle,
    Triangle,
    Polygon,
    Star,
    Line,
    Arrow,
    Bezier,
    Pencil,
    Text,
    Image,
    Arc,
}

impl Tool {
    pub const ALL: [Tool; 14] = [
        Tool::Select,
        Tool::Pan,
        Tool::Rectangle,
        Tool::Circle,
        Tool::Triangle,
        Tool::Polygon,
        Tool::Star,
        Tool::Line,
        Tool::Arrow,
        Tool::Bezier,
        Tool::Pencil,
        Tool::Text,
        Tool::Image,
        Tool::Arc,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tool::Select => "Select",
            Tool::Pan => "Pan",
            Tool::Rectangle => "Rectangle",
            Tool::Circle => "Circle",
            Tool::Triangle => "Triangle",
            Tool::Polygon => "Polygon",
            Tool::Star => "Star",
            Tool::Line => "Line",
            Tool::Arrow => "Arrow",
            Tool::Bezier => "Bezier",
            Tool::Pencil => "Pencil",
            Tool::Text => "Text",
            Tool::Image => "Image",
            Tool::Arc => "Arc",
        }
    }

    pub fn shortcut(self) -> char {
        match self {
            Tool::Select => 'v',
            Tool::Pan => 'h',
            Tool::Rectangle => 'r',
            Tool::Circle => 'c',
            Tool::Triangle => 't',
            Tool::Polygon => 'p',
            Tool::Star => 's',
            Tool::Line => 'l',
            Tool::Arrow => 'a',
            Tool::Bezier => 'b',
            Tool::Pencil => 'f',
            Tool::Text => 'x',
            Tool::Image => 'i',
            Tool::Arc => 'o',
        }
    }

    pub fn from_shortcut(c: char) -> Option<Tool> {
        let c = c.to_ascii_lowercase();
        Tool::ALL.into_iter().find(|t| t.shortcut() == c)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    Nothing,
    Committed(u64),
    Selected(Option<u64>),
    Preview,
    ViewChanged,
    /// The host must call [`Editor::resolve_text`] or [`Editor::resolve_image`].
    NeedsInput(PendingInput),
}

pub fn drag_shape_kind(tool: Tool, start: Point, end: Point) -> Option<ShapeKind> {
    let width = end.x - start.x;
    let height = end.y - start.y;
    let kind = match tool {
        Tool::Rectangle => {
            let b = Bounds::from_corners(start, end);
            ShapeKind::Rectangle { x: b.x, y: b.y, width: b.width, height: b.height }
        }
        Tool::Circle => ShapeKind::Circle {
            x: start.x + width / 2.0,
            y: start.y + height / 2.0,
            radius_x: width.abs() / 2.0,
            radius_y: height.abs() / 2.0,
        },
        Tool::Triangle => ShapeKind::Triangle { x: start.x, y: start.y, width, height },
        Tool::Star => {
            let outer = width.abs().min(height.abs()) / 2.0;
            ShapeKind::Star {
                x: start.x + width / 2.0,
                y: start.y + height / 2.0,
                outer_radius: outer,
                inner_radius: outer * STAR_INNER_RATIO,
                points: STAR_POINTS,
                base_rotation: -PI / 2.0,
            }
        }
        Tool::Line => ShapeKind::Line { x1: start.x, y1: start.y, x2: end.x, y2: end.y },
        Tool::Arrow => ShapeKind::Arrow { x1: start.x, y1: start.y, x2: end.x, y2: end.y },
        Tool::Arc => ShapeKind::Arc {
            x: start.x + width / 2.0,
            y: start.y + height / 2.0,
            radius_x: width.abs() / 2.0,
            radius_y: height.abs() / 2.0,
            start_angle: 0.0,
            end_angle: PI / 2.0,
        },
        _ => return None,
    };
    Some(kind)
}

impl Editor {
    pub fn set_tool(&mut self, tool: Tool) {
        if self.tool != tool {
            tracing::debug!(?tool, "tool changed");
        }
        self.tool = tool;
        self.in_progress = None;
        self.pending = None;
        self.status = Some(format!("Tool: {}", tool.label()));
    }

    pub fn cancel(&mut self) {
        self.in_progress = None;
        self.pending = None;
        self.selected = None;
    }

    fn to_doc(&self, screen: Point) -> Point {
        self.view.screen_to_doc(screen)
    }

    pub fn pointer_down(&mut self, screen: Point) -> Outcome {
        let raw = self.to_doc(screen);
        let at = self.view.snap_point(raw);
        self.pointer = Some(at);

        match self.tool {
            Tool::Select => {
                let hit = self.shape_at(raw);
                self.selected = hit;
                self.in_progress = hit.map(|_| InProgress::Move { anchor: at, moved: false });
                Outcome::Selected(hit)
            }
            Tool::Pan => {
                self.in_progress = Some(InProgress::Pan {
                    anchor: Point::new(screen.x - self.view.pan.x, screen.y - self.view.pan.y),
                });
                Outcome::Nothing
            }
            Tool::Polygon => self.polygon_press(at),
            Tool::Bezier => self.bezier_press(at),
            Tool::Pencil => {
                self.in_progress = Some(InProgress::Pencil { points: vec![at] });
                Outcome::Preview
            }
            Tool::Text => {
                let pending = PendingInput::Text { at };
                self.pending = Some(pending);
                Outcome::NeedsInput(pending)
            }
            Tool::Image => {
                self.pending = Some(PendingInput::Image);
                Outcome::NeedsInput(PendingInput::Image)
            }
            Tool::Rectangle
            | Tool::Circle
            | Tool::Triangle
            | Tool::Line
            | Tool::Arrow
            | Tool::Star
            | Tool::Arc => {
                self.in_progress = Some(InProgress::Drag { start: at, current: at });
                Outcome::Preview
            }
        }
    }

    fn polygon_press(&mut self, at: Point) -> Outcome {
        let Some(InProgress::Polygon { points, current }) = &mut self.in_progress else {
            self.in_progress = Some(InProgress::Polygon { points: vec![at], current: at });
            return Outcome::Preview;
        };
        if points.len() >= 3 && points[0].distance(at) < POLYGON_CLOSE_DISTANCE {
            return self.finish_polygon();
        }
        points.push(at);
        *current = at;
        Outcome::Preview
    }

    fn finish_polygon(&mut self) -> Outcome {
        match self.in_progress.take() {
            Some(InProgress::Polygon { points, .. }) if points.len() >= 3 => {
                let shape = self.new_shape(ShapeKind::Polygon { points });
                Outcome::Committed(self.commit_shape(shape))
            }
            other => {
                self.in_progress = other;
                Outcome::Nothing
            }
        }
    }

    fn bezier_press(&mut self, at: Point) -> Outcome {
        let Some(InProgress::Bezier { points, current }) = &mut self.in_progress else {
            self.in_progress = Some(InProgress::Bezier { points: vec![at], current: at });
            return Outcome::Preview;
        };
        if points.len() < 3 {
            points.push(at);
            *current = at;
            return Outcome::Preview;
        }
        let kind = ShapeKind::Bezier {
            start: points[0],
            control1: points[1],
            control2: points[2],
            end: at,
        };
        self.in_progress = None;
        let shape = self.new_shape(kind);
        Outcome::Committed(self.commit_shape(shape))
    }

    pub fn pointer_move(&mut self, screen: Point) -> Outcome {
        let at = self.view.snap_point(self.to_doc(screen));
        self.pointer = Some(at);

        let Some(state) = &mut self.in_progress else {
            return Outcome::Nothing;
        };
        match state {
            InProgress::Pan { anchor } => {
                self.view.pan = Point::new(screen.x - anchor.x, screen.y - anchor.y);
                Outcome::ViewChanged
            }
            InProgress::Move { anchor, moved } => {
                let (dx, dy) = (at.x - anchor.x, at.y - anchor.y);
                *anchor = at;
                if dx == 0.0 && dy == 0.0 {
                    return Outcome::Nothing;
                }
                *moved = true;
                if let Some(shape) = self.selected.and_then(|id| self.doc.find_shape_mut(id)) {
                    geometry::translate(shape, dx, dy);
                }
                Outcome::Preview
            }
            InProgress::Drag { current, .. }
            | InProgress::Polygon { current, .. }
            | InProgress::Bezier { current, .. } => {
                *current = at;
                Outcome::Preview
            }
            InProgress::Pencil { points } => {
                points.push(at);
                Outcome::Preview
            }
        }
    }

    pub fn pointer_up(&mut self, screen: Point) -> Outcome {
        let end = self.view.snap_point(self.to_doc(screen));
        self.pointer = Some(end);

        match self.in_progress.take() {
            Some(InProgress::Pan { .. }) => Outcome::ViewChanged,
            Some(InProgress::Move { moved, .. }) => {
                if moved {
                    self.status = Some("Moved".to_string());
                    self.commit();
                }
                Outcome::Selected(self.selected)
            }
            Some(InProgress::Drag { start, .. }) => match drag_shape_kind(self.tool, start, end) {
                Some(kind) => {
                    let shape = self.new_shape(kind);
                    Outcome::Committed(self.commit_shape(shape))
                }
                None => Outcome::Nothing,
            },
            Some(InProgress::Pencil { points }) => {
                if points.len() >= 2 {
                    let shape = self.new_shape(ShapeKind::Path { points });
                    Outcome::Committed(self.commit_shape(shape))
                } else {
                    Outcome::Nothing
                }
            }
            // Multi-press constructions survive the release.
            other @ Some(InProgress::Polygon { .. } | InProgress::Bezier { .. }) => {
                self.in_progress = other;
                Outcome::Nothing
            }
            None => Outcome::Nothing,
        }
    }

    pub fn double_click(&mut self, _screen: Point) -> Outcome {
        if self.tool == Tool::Polygon {
            self.finish_polygon()
        } else {
            Outcome::Nothing
        }
    }

    pub fn wheel(&mut self, delta_y: f32, modifier: bool) -> Outcome {
        if !modifier || delta_y == 0.0 {
            return Outcome::Nothing;
        }
        if delta_y > 0.0 {
            self.view.zoom_out();
        } else {
            self.view.zoom_in();
        }
        Outcome::ViewChanged
    }

    pub fn resolve_text(&mut self, text: Option<String>) -> Outcome {
        let Some(PendingInput::Text { at }) = self.pending.take() else {
            return Outcome::Nothing;
        };
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            return Outcome::Nothing;
        };
        let shape = self.new_shape(ShapeKind::Text {
            x: at.x,
            y: at.y,
            text,
            font_size: DEFAULT_FONT_SIZE,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            bold: false,
            italic: false,
            underline: false,
        });
        Outcome::Committed(self.commit_shape(shape))
    }

    pub fn resolve_image(&mut self, image: Option<super::ImportedImage>) -> Outcome {
        if self.pending.take() != Some(PendingInput::Image) {
            return Outcome::Nothing;
        }
        let Some(image) = image else {
            return Outcome::Nothing;
        };
        let shape = self.new_shape(ShapeKind::Image {
            x: IMAGE_ORIGIN.x,
            y: IMAGE_ORIGIN.y,
            width: image.width as f32,
            height: image.height as f32,
            src: image.data_url,
        });
        Outcome::Committed(self.commit_shape(shape))
    }

    pub fn shape_at(&self, p: Point) -> Option<u64> {
        self.doc
            .layers
            .iter()
            .rev()
            .filter(|l| l.visible)
            .flat_map(|l| l.shapes.iter().rev())
            .find(|s| geometry::hit_test(s, p))
            .map(|s| s.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::ImportedImage;
    use crate::model::Shape;

    fn editor() -> Editor {
        let mut e = Editor::default();
        e.view.snap_to_grid = false;
        e
    }

    fn pt(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    fn drag(e: &mut Editor, from: Point, to: Point) -> Outcome {
        e.pointer_down(from);
        e.pointer_move(to);
        e.pointer_up(to)
    }

    fn only_shape(e: &Editor) -> &Shape {
        assert_eq!(e.doc.shape_count(), 1);
        e.doc.shapes().next().unwrap()
    }

    #[test]
    fn rectangle_drag_normalizes() {
        let mut e = editor();
        e.set_tool(Tool::Rectangle);
        assert!(matches!(drag(&mut e, pt(120.0, 70.0), pt(20.0, 20.0)), Outcome::Committed(_)));
        assert_eq!(
            only_shape(&e).kind,
            ShapeKind::Rectangle { x: 20.0, y: 20.0, width: 100.0, height: 50.0 }
        );
        assert_eq!(e.history.len(), 2);
    }

    #[test]
    fn moves_do_not_commit_until_release() {
        let mut e = editor();
        e.set_tool(Tool::Circle);
        e.pointer_down(pt(0.0, 0.0));
        for i in 1..10 {
            e.pointer_move(pt(i as f32 * 5.0, i as f32 * 5.0));
        }
        assert_eq!(e.history.len(), 1);
        e.pointer_up(pt(40.0, 20.0));
        assert_eq!(e.history.len(), 2);
        assert_eq!(
            only_shape(&e).kind,
            ShapeKind::Circle { x: 20.0, y: 10.0, radius_x: 20.0, radius_y: 10.0 }
        );
    }

    #[test]
    fn zero_size_shapes_are_committed() {
        let mut e = editor();
        e.set_tool(Tool::Star);
        e.pointer_down(pt(50.0, 50.0));
        assert!(matches!(e.pointer_up(pt(50.0, 50.0)), Outcome::Committed(_)));
        assert_eq!(e.doc.shape_count(), 1);
    }

    #[test]
    fn press_is_grid_snapped() {
        let mut e = Editor::default();
        e.set_tool(Tool::Line);
        drag(&mut e, pt(9.0, 11.0), pt(52.0, 48.0));
        assert_eq!(only_shape(&e).kind, ShapeKind::Line { x1: 0.0, y1: 20.0, x2: 60.0, y2: 40.0 });
    }

    #[test]
    fn polygon_closes_near_first_vertex() {
        let mut e = editor();
        e.set_tool(Tool::Polygon);
        for p in [pt(0.0, 0.0), pt(50.0, 0.0), pt(50.0, 50.0)] {
            e.pointer_down(p);
            e.pointer_up(p);
        }
        assert!(matches!(e.pointer_down(pt(3.0, 3.0)), Outcome::Committed(_)));
        assert_eq!(
            only_shape(&e).kind,
            ShapeKind::Polygon { points: vec![pt(0.0, 0.0), pt(50.0, 0.0), pt(50.0, 50.0)] }
        );
        assert!(e.in_progress().is_none());
    }

    #[test]
    fn polygon_needs_three_vertices_to_close() {
        let mut e = editor();
        e.set_tool(Tool::Polygon);
        e.pointer_down(pt(0.0, 0.0));
        e.pointer_down(pt(50.0, 0.0));
        assert_eq!(e.pointer_down(pt(3.0, 3.0)), Outcome::Preview);
        assert_eq!(e.doc.shape_count(), 0);
        assert_eq!(e.double_click(pt(3.0, 3.0)), Outcome::Committed(1));
    }

    #[test]
    fn polygon_double_click_ignored_below_three() {
        let mut e = editor();
        e.set_tool(Tool::Polygon);
        e.pointer_down(pt(0.0, 0.0));
        e.pointer_down(pt(50.0, 0.0));
        assert_eq!(e.double_click(pt(50.0, 0.0)), Outcome::Nothing);
        assert!(matches!(e.in_progress(), Some(InProgress::Polygon { points, .. }) if points.len() == 2));
    }

    #[test]
    fn bezier_commits_on_fourth_press() {
        let mut e = editor();
        e.set_tool(Tool::Bezier);
        let presses = [pt(0.0, 0.0), pt(10.0, -20.0), pt(30.0, 20.0), pt(40.0, 0.0)];
        for p in &presses[..3] {
            assert_eq!(e.pointer_down(*p), Outcome::Preview);
            e.pointer_up(*p);
        }
        assert!(matches!(e.pointer_down(presses[3]), Outcome::Committed(_)));
        assert_eq!(
            only_shape(&e).kind,
            ShapeKind::Bezier {
                start: presses[0],
                control1: presses[1],
                control2: presses[2],
                end: presses[3],
            }
        );
        assert_eq!(only_shape(&e).fill, None);
    }

    #[test]
    fn tool_switch_discards_construction() {
        let mut e = editor();
        e.set_tool(Tool::Bezier);
        e.pointer_down(pt(0.0, 0.0));
        e.pointer_down(pt(10.0, 0.0));
        e.set_tool(Tool::Bezier);
        assert!(e.in_progress().is_none());
        e.pointer_down(pt(0.0, 0.0));
        assert_eq!(e.doc.shape_count(), 0);
    }

    #[test]
    fn pencil_needs_two_points() {
        let mut e = editor();
        e.set_tool(Tool::Pencil);
        e.pointer_down(pt(0.0, 0.0));
        assert_eq!(e.pointer_up(pt(0.0, 0.0)), Outcome::Nothing);
        e.pointer_down(pt(0.0, 0.0));
        e.pointer_move(pt(3.0, 4.0));
        e.pointer_move(pt(6.0, 1.0));
        assert!(matches!(e.pointer_up(pt(6.0, 1.0)), Outcome::Committed(_)));
        assert!(matches!(&only_shape(&e).kind, ShapeKind::Path { points } if points.len() == 3));
    }

    #[test]
    fn pencil_snaps_each_point() {
        let mut e = Editor::default();
        e.set_tool(Tool::Pencil);
        e.pointer_down(pt(1.0, 1.0));
        e.pointer_move(pt(18.0, 3.0));
        e.pointer_up(pt(18.0, 3.0));
        assert_eq!(
            only_shape(&e).kind,
            ShapeKind::Path { points: vec![pt(0.0, 0.0), pt(20.0, 0.0)] }
        );
    }

    #[test]
    fn select_drag_moves_and_commits_once() {
        let mut e = editor();
        e.set_tool(Tool::Rectangle);
        drag(&mut e, pt(10.0, 10.0), pt(110.0, 60.0));
        e.set_tool(Tool::Select);
        let id = only_shape(&e).id;
        assert_eq!(e.pointer_down(pt(50.0, 30.0)), Outcome::Selected(Some(id)));
        e.pointer_move(pt(55.0, 30.0));
        e.pointer_move(pt(60.0, 40.0));
        e.pointer_up(pt(60.0, 40.0));
        assert_eq!(e.history.len(), 3);
        assert_eq!(
            only_shape(&e).kind,
            ShapeKind::Rectangle { x: 20.0, y: 20.0, width: 100.0, height: 50.0 }
        );
    }

    #[test]
    fn click_without_move_does_not_commit() {
        let mut e = editor();
        e.set_tool(Tool::Rectangle);
        drag(&mut e, pt(10.0, 10.0), pt(110.0, 60.0));
        e.set_tool(Tool::Select);
        e.pointer_down(pt(50.0, 30.0));
        e.pointer_up(pt(50.0, 30.0));
        assert_eq!(e.history.len(), 2);
        assert_eq!(e.pointer_down(pt(500.0, 500.0)), Outcome::Selected(None));
        assert!(e.selected().is_none());
    }

    #[test]
    fn hit_prefers_topmost_layer_and_skips_hidden() {
        let mut e = editor();
        e.set_tool(Tool::Rectangle);
        drag(&mut e, pt(0.0, 0.0), pt(100.0, 100.0));
        let bottom = e.doc.next_shape_id() - 1;
        e.doc.add_layer();
        drag(&mut e, pt(0.0, 0.0), pt(100.0, 100.0));
        let top = e.doc.next_shape_id() - 1;
        assert_eq!(e.shape_at(pt(50.0, 50.0)), Some(top));
        e.doc.set_visible(2, false);
        assert_eq!(e.shape_at(pt(50.0, 50.0)), Some(bottom));
    }

    #[test]
    fn pan_follows_pointer() {
        let mut e = editor();
        e.set_tool(Tool::Pan);
        e.pointer_down(pt(100.0, 100.0));
        assert_eq!(e.pointer_move(pt(130.0, 90.0)), Outcome::ViewChanged);
        e.pointer_up(pt(130.0, 90.0));
        assert_eq!(e.view.pan, pt(30.0, -10.0));
        assert_eq!(e.history.len(), 1);
    }

    #[test]
    fn wheel_needs_modifier() {
        let mut e = editor();
        assert_eq!(e.wheel(120.0, false), Outcome::Nothing);
        e.wheel(120.0, true);
        assert!((e.view.zoom() - 0.9).abs() < 1e-5);
        e.wheel(-120.0, true);
        e.wheel(-120.0, true);
        assert!((e.view.zoom() - 1.1).abs() < 1e-5);
    }

    #[test]
    fn text_prompt_commits_or_cancels() {
        let mut e = editor();
        e.set_tool(Tool::Text);
        assert_eq!(
            e.pointer_down(pt(40.0, 80.0)),
            Outcome::NeedsInput(PendingInput::Text { at: pt(40.0, 80.0) })
        );
        assert_eq!(e.resolve_text(None), Outcome::Nothing);
        assert_eq!(e.doc.shape_count(), 0);

        e.pointer_down(pt(40.0, 80.0));
        assert_eq!(e.resolve_text(Some(String::new())), Outcome::Nothing);
        e.pointer_down(pt(40.0, 80.0));
        assert!(matches!(e.resolve_text(Some("Hi".into())), Outcome::Committed(_)));
        let shape = only_shape(&e);
        assert!(matches!(&shape.kind, ShapeKind::Text { font_size, bold: false, .. } if *font_size == 16.0));
        assert_eq!(shape.fill, Some(e.style.stroke));
    }

    #[test]
    fn image_lands_at_default_origin() {
        let mut e = editor();
        e.set_tool(Tool::Image);
        e.pointer_down(pt(300.0, 300.0));
        let image = ImportedImage { width: 64, height: 32, data_url: "data:image/png;base64,".into() };
        assert!(matches!(e.resolve_image(Some(image)), Outcome::Committed(_)));
        assert_eq!(
            only_shape(&e).bounds(),
            Bounds { x: 100.0, y: 100.0, width: 64.0, height: 32.0 }
        );
        assert_eq!(e.resolve_image(None), Outcome::Nothing);
    }
}
