use crate::model::{Document, Point, Shape, Style};

pub mod actions;
pub mod geometry;
pub mod history;
pub mod io;
pub mod tools;
pub mod view;

pub use actions::{Key, Modifiers, Property};
pub use history::History;
pub use io::ImportedImage;
pub use tools::{Outcome, Tool};
pub use view::View;

#[derive(Clone, Debug, PartialEq)]
pub enum InProgress {
    /// Select tool dragging the selection; `anchor` is the last snapped point.
    Move { anchor: Point, moved: bool },
    /// Pan tool; `anchor` is screen position minus pan at press.
    Pan { anchor: Point },
    Drag { start: Point, current: Point },
    Polygon { points: Vec<Point>, current: Point },
    Bezier { points: Vec<Point>, current: Point },
    Pencil { points: Vec<Point> },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PendingInput {
    Text { at: Point },
    Image,
}

pub struct Editor {
    pub doc: Document,
    pub history: History,
    pub view: View,
    pub style: Style,
    pub status: Option<String>,
    selected: Option<u64>,
    tool: Tool,
    in_progress: Option<InProgress>,
    pending: Option<PendingInput>,
    pointer: Option<Point>,
    viewport: (f32, f32),
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Style::default(), history::DEFAULT_LIMIT)
    }
}

impl Editor {
    pub fn new(style: Style, history_limit: usize) -> Self {
        let mut editor = Self {
            doc: Document::default(),
            history: History::with_limit(history_limit),
            view: View::default(),
            style,
            status: None,
            selected: None,
            tool: Tool::Select,
            in_progress: None,
            pending: None,
            pointer: None,
            viewport: (800.0, 600.0),
        };
        editor.commit();
        editor
    }

    pub fn commit(&mut self) {
        if let Err(e) = self.history.commit(&self.doc) {
            tracing::warn!("history commit failed: {e}");
            self.status = Some(e.to_string());
        }
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(doc) => {
                self.replace_document(doc);
                self.status = Some("Undo".to_string());
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(doc) => {
                self.replace_document(doc);
                self.status = Some("Redo".to_string());
                true
            }
            None => false,
        }
    }

    fn replace_document(&mut self, doc: Document) {
        self.doc = doc;
        self.selected = None;
        self.in_progress = None;
    }

    pub fn selected(&self) -> Option<&Shape> {
        self.doc.find_shape(self.selected?)
    }

    pub fn selected_id(&self) -> Option<u64> {
        self.selected.filter(|id| self.doc.find_shape(*id).is_some())
    }

    pub fn selected_mut(&mut self) -> Option<&mut Shape> {
        self.doc.find_shape_mut(self.selected?)
    }

    pub fn select(&mut self, id: Option<u64>) {
        self.selected = id.filter(|id| self.doc.find_shape(*id).is_some());
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn in_progress(&self) -> Option<&InProgress> {
        self.in_progress.as_ref()
    }

    pub fn pending(&self) -> Option<PendingInput> {
        self.pending
    }

    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    pub fn viewport(&self) -> (f32, f32) {
        self.viewport
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = (width.max(1.0), height.max(1.0));
    }

    pub fn fit_to_screen(&mut self) {
        if let Some(bounds) = self.doc.content_bounds() {
            let (w, h) = self.viewport;
            self.view.fit_to(bounds, w, h);
        }
    }

    fn new_shape(&self, kind: crate::model::ShapeKind) -> Shape {
        Shape::new(
            self.doc.next_shape_id(),
            self.doc.current_layer().id,
            kind,
            &self.style,
        )
    }

    fn commit_shape(&mut self, shape: Shape) -> u64 {
        let label = shape.kind.label();
        let id = self.doc.push_shape(shape);
        tracing::debug!(id, kind = label, "shape created");
        self.status = Some(format!("Created: {label}"));
        self.commit();
        id
    }
}
