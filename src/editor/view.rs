use crate::model::{Axis, Bounds, Point};

pub const GRID_SIZE: f32 = 20.0;
pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 5.0;
pub const ZOOM_STEP: f32 = 0.1;

#[derive(Clone, Debug, PartialEq)]
pub struct View {
    pub pan: Point,
    zoom: f32,
    pub grid_visible: bool,
    pub snap_to_grid: bool,
    pub guides_visible: bool,
    pub horizontal_guides: Vec<f32>,
    pub vertical_guides: Vec<f32>,
}

impl Default for View {
    fn default() -> Self {
        Self {
            pan: Point::default(),
            zoom: 1.0,
            grid_visible: true,
            snap_to_grid: true,
            guides_visible: true,
            horizontal_guides: Vec::new(),
            vertical_guides: Vec::new(),
        }
    }
}

impl View {
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_nan() {
            return;
        }
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_by(&mut self, delta: f32) {
        self.set_zoom(self.zoom + delta);
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(-ZOOM_STEP);
    }

    pub fn screen_to_doc(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan.x) / self.zoom,
            (screen.y - self.pan.y) / self.zoom,
        )
    }

    #[cfg(test)]
    pub fn doc_to_screen(&self, doc: Point) -> Point {
        Point::new(doc.x * self.zoom + self.pan.x, doc.y * self.zoom + self.pan.y)
    }

    /// Rounds half up to the nearest grid line when snapping is on.
    pub fn snap(&self, v: f32) -> f32 {
        if self.snap_to_grid {
            (v / GRID_SIZE + 0.5).floor() * GRID_SIZE
        } else {
            v
        }
    }

    pub fn snap_point(&self, p: Point) -> Point {
        Point::new(self.snap(p.x), self.snap(p.y))
    }

    pub fn toggle_grid(&mut self) {
        self.grid_visible = !self.grid_visible;
    }

    pub fn toggle_snap(&mut self) {
        self.snap_to_grid = !self.snap_to_grid;
    }

    pub fn toggle_guides(&mut self) {
        self.guides_visible = !self.guides_visible;
    }

    pub fn add_guide(&mut self, axis: Axis, position: f32) {
        match axis {
            Axis::Horizontal => self.horizontal_guides.push(position),
            Axis::Vertical => self.vertical_guides.push(position),
        }
    }

    pub fn clear_guides(&mut self) {
        self.horizontal_guides.clear();
        self.vertical_guides.clear();
    }

    pub fn visible_area(&self, width: f32, height: f32) -> Bounds {
        let top_left = self.screen_to_doc(Point::default());
        Bounds {
            x: top_left.x,
            y: top_left.y,
            width: width / self.zoom,
            height: height / self.zoom,
        }
    }

    pub fn fit_to(&mut self, content: Bounds, width: f32, height: f32) {
        let w = content.width.max(1.0);
        let h = content.height.max(1.0);
        self.set_zoom(0.9 * (width / w).min(height / h));
        self.pan = Point::new(
            (width - w * self.zoom) / 2.0 - content.x * self.zoom,
            (height - h * self.zoom) / 2.0 - content.y * self.zoom,
        );
    }

    pub fn reset_camera(&mut self) {
        self.pan = Point::default();
        self.zoom = 1.0;
    }
}
