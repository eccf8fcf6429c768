use super::{geometry, Editor, Tool};
use crate::model::{Axis, FillPattern, LineStyle, Rgba, ShapeKind};

pub const DUPLICATE_OFFSET: f32 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    X,
    Y,
    Width,
    Height,
    Rotation,
    Opacity,
    Text,
    FontSize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Delete,
    Backspace,
    Escape,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub command: bool,
    pub shift: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextFormat {
    Bold,
    Italic,
    Underline,
}

fn parse_number(value: &str) -> Option<f32> {
    value.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

fn assign(slot: &mut f32, v: f32) -> bool {
    let changed = *slot != v;
    *slot = v;
    changed
}

impl Editor {
    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.selected_id() else {
            return false;
        };
        self.doc.remove_shape(id);
        self.selected = None;
        self.status = Some("Deleted".to_string());
        self.commit();
        true
    }

    pub fn duplicate_selected(&mut self) -> Option<u64> {
        let mut copy = self.selected()?.clone();
        copy.id = self.doc.next_shape_id();
        geometry::translate(&mut copy, DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        let id = self.doc.push_shape(copy);
        self.selected = Some(id);
        self.status = Some("Duplicated".to_string());
        self.commit();
        Some(id)
    }

    pub fn clear_all(&mut self) -> bool {
        if self.doc.shape_count() == 0 {
            return false;
        }
        self.doc.clear_shapes();
        self.selected = None;
        self.in_progress = None;
        self.status = Some("Canvas cleared".to_string());
        self.commit();
        true
    }

    pub fn set_property(&mut self, property: Property, value: &str) -> bool {
        let Some(shape) = self.selected_mut() else {
            return false;
        };
        let changed = match property {
            Property::Text => match &mut shape.kind {
                ShapeKind::Text { text, .. } if text.as_str() != value => {
                    *text = value.to_string();
                    true
                }
                _ => false,
            },
            Property::X | Property::Y => {
                let Some(v) = parse_number(value) else {
                    return false;
                };
                let b = shape.bounds();
                let (dx, dy) = match property {
                    Property::X => (v - b.x, 0.0),
                    _ => (0.0, v - b.y),
                };
                geometry::translate(shape, dx, dy);
                dx != 0.0 || dy != 0.0
            }
            Property::Width | Property::Height => {
                let Some(v) = parse_number(value) else {
                    return false;
                };
                let is_width = property == Property::Width;
                match &mut shape.kind {
                    ShapeKind::Rectangle { width, height, .. }
                    | ShapeKind::Triangle { width, height, .. }
                    | ShapeKind::Image { width, height, .. } => {
                        assign(if is_width { width } else { height }, v)
                    }
                    ShapeKind::Circle { radius_x, radius_y, .. }
                    | ShapeKind::Arc { radius_x, radius_y, .. } => {
                        assign(if is_width { radius_x } else { radius_y }, v / 2.0)
                    }
                    _ => false,
                }
            }
            Property::Rotation => match parse_number(value) {
                Some(v) => assign(&mut shape.rotation, v),
                None => false,
            },
            Property::Opacity => match parse_number(value) {
                Some(v) => assign(&mut shape.opacity, (v / 100.0).clamp(0.0, 1.0)),
                None => false,
            },
            Property::FontSize => match (&mut shape.kind, parse_number(value)) {
                (ShapeKind::Text { font_size, .. }, Some(v)) if v > 0.0 => assign(font_size, v),
                _ => false,
            },
        };
        if changed {
            self.commit();
        } else {
            tracing::debug!(?property, value, "property edit ignored");
        }
        changed
    }

    pub fn set_stroke_color(&mut self, color: Rgba) {
        self.style.stroke = color;
        if let Some(shape) = self.selected_mut() {
            shape.stroke = color;
            self.commit();
        }
    }

    pub fn set_fill_color(&mut self, color: Option<Rgba>) {
        self.style.fill = color;
        if let Some(shape) = self.selected_mut() {
            if shape.kind.supports_fill() {
                shape.fill = color;
                self.commit();
            }
        }
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        let width = width.max(0.0);
        self.style.stroke_width = width;
        if let Some(shape) = self.selected_mut() {
            shape.stroke_width = width;
            self.commit();
        }
    }

    pub fn set_stroke_style(&mut self, style: LineStyle) {
        self.style.stroke_style = style;
        if let Some(shape) = self.selected_mut() {
            shape.stroke_style = style;
            self.commit();
        }
    }

    pub fn set_fill_pattern(&mut self, pattern: FillPattern) {
        self.style.fill_pattern = pattern;
        if let Some(shape) = self.selected_mut() {
            shape.fill_pattern = pattern;
            self.commit();
        }
    }

    pub fn rotate_selected(&mut self, degrees: f32) -> bool {
        match self.selected_mut() {
            Some(shape) if degrees.is_finite() => {
                shape.rotation = (shape.rotation + degrees).rem_euclid(360.0);
                self.commit();
                true
            }
            _ => false,
        }
    }

    pub fn scale_selected(&mut self, factor: f32) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            self.status = Some(format!("Invalid scale factor {factor}"));
            return false;
        }
        match self.selected_mut() {
            Some(shape) => {
                geometry::scale(shape, factor);
                self.commit();
                true
            }
            None => false,
        }
    }

    /// Mirrors the selection about its own center. Unsupported kinds are
    /// reported in the status line and left unchanged.
    pub fn flip_selected(&mut self, axis: Axis) -> bool {
        let Some(shape) = self.selected_mut() else {
            return false;
        };
        let center = shape.bounds().center();
        match geometry::flip(shape, axis, center) {
            Ok(()) => {
                self.commit();
                true
            }
            Err(e) => {
                tracing::debug!("{e}");
                self.status = Some(e.to_string());
                false
            }
        }
    }

    pub fn toggle_text_format(&mut self, format: TextFormat) -> bool {
        let Some(shape) = self.selected_mut() else {
            return false;
        };
        let ShapeKind::Text { bold, italic, underline, .. } = &mut shape.kind else {
            return false;
        };
        let flag = match format {
            TextFormat::Bold => bold,
            TextFormat::Italic => italic,
            TextFormat::Underline => underline,
        };
        *flag = !*flag;
        self.commit();
        true
    }

    pub fn add_layer(&mut self) -> u64 {
        let id = self.doc.add_layer().id;
        self.status = Some(format!("Layer {id} added"));
        self.commit();
        id
    }

    pub fn set_layer_visible(&mut self, layer_id: u64, visible: bool) -> bool {
        let changed = self.doc.set_visible(layer_id, visible);
        if changed && !visible {
            let hidden = self
                .selected()
                .is_some_and(|s| s.layer_id == layer_id);
            if hidden {
                self.selected = None;
            }
        }
        changed
    }

    pub fn set_current_layer(&mut self, layer_id: u64) -> bool {
        self.doc.set_current(layer_id)
    }

    /// Keyboard shortcuts. Command combinations win over tool letters.
    pub fn handle_key(&mut self, key: Key, mods: Modifiers) -> bool {
        if mods.command {
            return match key {
                Key::Char(c) => match c.to_ascii_lowercase() {
                    'z' if mods.shift => self.redo(),
                    'z' => self.undo(),
                    'y' => self.redo(),
                    'd' => self.duplicate_selected().is_some(),
                    _ => false,
                },
                _ => false,
            };
        }
        match key {
            Key::Delete | Key::Backspace => self.delete_selected(),
            Key::Escape => {
                self.cancel();
                true
            }
            Key::Char('g') | Key::Char('G') => {
                self.view.toggle_grid();
                true
            }
            Key::Char(c) => match Tool::from_shortcut(c) {
                Some(tool) => {
                    self.set_tool(tool);
                    true
                }
                None => false,
            },
        }
    }
}
