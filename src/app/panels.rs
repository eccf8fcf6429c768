use crate::editor::actions::TextFormat;
use crate::editor::{Editor, Property, Tool};
use crate::model::{self, FillPattern, LineStyle, Rgba, Shape, ShapeKind};
use eframe::egui;
use std::collections::HashMap;

pub(super) fn tool_button(ui: &mut egui::Ui, tool: Tool, editor: &mut Editor) {
    let active = editor.tool() == tool;
    let label = format!("{} ({})", tool.label(), tool.shortcut().to_ascii_uppercase());
    if ui.selectable_label(active, label).clicked() {
        editor.set_tool(tool);
    }
}

fn color_row(ui: &mut egui::Ui, rgba: Rgba) -> Option<Rgba> {
    let mut picked = None;
    ui.horizontal(|ui| {
        let presets = [
            egui::Color32::from_rgb(32, 33, 36),
            egui::Color32::from_rgb(26, 115, 232),
            egui::Color32::from_rgb(217, 48, 37),
            egui::Color32::from_rgb(30, 142, 62),
            egui::Color32::from_rgb(249, 171, 0),
            egui::Color32::from_rgb(255, 255, 255),
        ];
        for c in presets {
            if ui.add_sized([18.0, 18.0], egui::Button::new("").fill(c)).clicked() {
                picked = Some(Rgba::from_color32(c));
            }
        }
        let mut arr = [rgba.r, rgba.g, rgba.b, rgba.a];
        if ui.color_edit_button_srgba_unmultiplied(&mut arr).changed() {
            picked = Some(Rgba::rgba(arr[0], arr[1], arr[2], arr[3]));
        }
    });
    picked.filter(|c| *c != rgba)
}

/// Text buffers behind the properties panel, reloaded whenever the
/// selection or the selected shape's values change.
#[derive(Default)]
pub(super) struct PropertyEdits {
    source: Option<u64>,
    synced: HashMap<Property, String>,
    fields: HashMap<Property, String>,
    stroke_width: Option<f32>,
}

fn box_size(shape: &Shape) -> (f32, f32) {
    match &shape.kind {
        ShapeKind::Rectangle { width, height, .. }
        | ShapeKind::Triangle { width, height, .. }
        | ShapeKind::Image { width, height, .. } => (*width, *height),
        ShapeKind::Circle { radius_x, radius_y, .. } | ShapeKind::Arc { radius_x, radius_y, .. } => {
            (radius_x * 2.0, radius_y * 2.0)
        }
        _ => {
            let b = shape.bounds();
            (b.width, b.height)
        }
    }
}

fn resizable(shape: &Shape) -> bool {
    matches!(
        shape.kind,
        ShapeKind::Rectangle { .. }
            | ShapeKind::Triangle { .. }
            | ShapeKind::Image { .. }
            | ShapeKind::Circle { .. }
            | ShapeKind::Arc { .. }
    )
}

fn field_values(shape: &Shape) -> HashMap<Property, String> {
    let b = shape.bounds();
    let (w, h) = box_size(shape);
    let mut fields = HashMap::from([
        (Property::X, format!("{:.1}", b.x)),
        (Property::Y, format!("{:.1}", b.y)),
        (Property::Width, format!("{w:.1}")),
        (Property::Height, format!("{h:.1}")),
        (Property::Rotation, format!("{:.1}", shape.rotation)),
        (Property::Opacity, format!("{:.0}", shape.opacity * 100.0)),
    ]);
    if let ShapeKind::Text { text, font_size, .. } = &shape.kind {
        fields.insert(Property::Text, text.clone());
        fields.insert(Property::FontSize, format!("{font_size:.0}"));
    }
    fields
}

impl PropertyEdits {
    fn sync(&mut self, editor: &Editor) {
        let source = editor.selected_id();
        let fresh = editor.selected().map(field_values).unwrap_or_default();
        if source != self.source || fresh != self.synced {
            self.source = source;
            self.fields = fresh.clone();
            self.synced = fresh;
        }
    }

    fn is_edited(&self, property: Property) -> bool {
        self.fields.get(&property) != self.synced.get(&property)
    }

    /// One labelled field; the edit is applied on Enter or when focus leaves,
    /// and only if the text differs from the shape's value.
    fn field(&mut self, ui: &mut egui::Ui, editor: &mut Editor, property: Property, label: &str) {
        let Some(buffer) = self.fields.get_mut(&property) else {
            return;
        };
        let left = ui
            .horizontal(|ui| {
                ui.add_sized([70.0, 18.0], egui::Label::new(label));
                ui.add(egui::TextEdit::singleline(buffer).desired_width(90.0))
                    .lost_focus()
            })
            .inner;
        if !left || !self.is_edited(property) {
            return;
        }
        let applied = editor.set_property(property, &self.fields[&property]);
        if !applied {
            // Rejected input snaps back to the shape's value.
            self.synced.clear();
        }
    }
}

pub(super) fn properties_panel(ui: &mut egui::Ui, editor: &mut Editor, edits: &mut PropertyEdits) {
    edits.sync(editor);
    let Some(shape) = editor.selected().cloned() else {
        ui.label("Nothing selected");
        return;
    };
    ui.label(format!("{} #{}", shape.kind.label(), shape.id));
    edits.field(ui, editor, Property::X, "X");
    edits.field(ui, editor, Property::Y, "Y");
    if resizable(&shape) {
        edits.field(ui, editor, Property::Width, "Width");
        edits.field(ui, editor, Property::Height, "Height");
    }
    edits.field(ui, editor, Property::Rotation, "Rotation °");
    edits.field(ui, editor, Property::Opacity, "Opacity %");

    if let ShapeKind::Text { bold, italic, underline, .. } = shape.kind {
        ui.separator();
        ui.label("Text");
        edits.field(ui, editor, Property::Text, "Content");
        edits.field(ui, editor, Property::FontSize, "Font size");
        ui.horizontal(|ui| {
            if ui.selectable_label(bold, egui::RichText::new("B").strong()).clicked() {
                editor.toggle_text_format(TextFormat::Bold);
            }
            if ui.selectable_label(italic, egui::RichText::new("I").italics()).clicked() {
                editor.toggle_text_format(TextFormat::Italic);
            }
            if ui.selectable_label(underline, egui::RichText::new("U").underline()).clicked() {
                editor.toggle_text_format(TextFormat::Underline);
            }
        });
    }
}

/// Style of the selection, or of new shapes when nothing is selected.
pub(super) fn style_editor(ui: &mut egui::Ui, editor: &mut Editor, edits: &mut PropertyEdits) {
    let (stroke, fill, width, line_style, pattern, fillable) = match editor.selected() {
        Some(s) => (
            s.stroke,
            s.fill,
            s.stroke_width,
            s.stroke_style,
            s.fill_pattern,
            s.kind.supports_fill(),
        ),
        None => {
            let st = &editor.style;
            (st.stroke, st.fill, st.stroke_width, st.stroke_style, st.fill_pattern, true)
        }
    };

    ui.label("Stroke");
    if let Some(c) = color_row(ui, stroke) {
        editor.set_stroke_color(c);
    }
    let shown = edits.stroke_width.get_or_insert(width);
    let response = ui.add(egui::Slider::new(shown, 0.0..=20.0).text("Width"));
    if response.drag_stopped() || (response.changed() && !response.dragged()) {
        editor.set_stroke_width(*shown);
    }
    if !response.dragged() && !response.has_focus() {
        edits.stroke_width = None;
    }

    let mut next_style = line_style;
    egui::ComboBox::from_id_salt("line_style")
        .selected_text(next_style.label())
        .show_ui(ui, |ui| {
            for s in LineStyle::ALL {
                ui.selectable_value(&mut next_style, s, s.label());
            }
        });
    if next_style != line_style {
        editor.set_stroke_style(next_style);
    }

    if !fillable {
        return;
    }
    ui.separator();
    ui.label("Fill");
    let mut fill_enabled = fill.is_some();
    if ui.checkbox(&mut fill_enabled, "Enabled").changed() {
        editor.set_fill_color(fill_enabled.then(|| model::Style::default().fill).flatten());
    }
    if let Some(current) = fill {
        if let Some(c) = color_row(ui, current) {
            editor.set_fill_color(Some(c));
        }
        let mut next_pattern = pattern;
        egui::ComboBox::from_id_salt("fill_pattern")
            .selected_text(next_pattern.label())
            .show_ui(ui, |ui| {
                for p in FillPattern::ALL {
                    ui.selectable_value(&mut next_pattern, p, p.label());
                }
            });
        if next_pattern != pattern {
            editor.set_fill_pattern(next_pattern);
        }
    }
}

pub(super) fn layers_panel(ui: &mut egui::Ui, editor: &mut Editor) {
    let rows: Vec<(u64, String, bool, usize)> = editor
        .doc
        .layers
        .iter()
        .rev()
        .map(|l| (l.id, l.name.clone(), l.visible, l.shapes.len()))
        .collect();
    let current = editor.doc.current_layer_id;
    for (id, name, visible, count) in rows {
        ui.horizontal(|ui| {
            let mut shown = visible;
            if ui.checkbox(&mut shown, "").on_hover_text("Visible").changed() {
                editor.set_layer_visible(id, shown);
            }
            if ui
                .selectable_label(id == current, format!("{name} ({count})"))
                .clicked()
            {
                editor.set_current_layer(id);
            }
        });
    }
    if ui.button("Add layer").clicked() {
        editor.add_layer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Point;

    #[test]
    fn field_values_follow_the_shape() {
        let mut e = Editor::default();
        e.view.snap_to_grid = false;
        e.set_tool(Tool::Circle);
        e.pointer_down(Point::new(10.0, 10.0));
        e.pointer_up(Point::new(50.0, 30.0));
        let shape = e.doc.shapes().next().unwrap().clone();
        let fields = field_values(&shape);
        assert_eq!(fields[&Property::X], "10.0");
        assert_eq!(fields[&Property::Width], "40.0");
        assert_eq!(fields[&Property::Height], "20.0");
        assert_eq!(fields[&Property::Opacity], "100");
        assert!(!fields.contains_key(&Property::Text));
    }

    #[test]
    fn edits_reload_when_the_shape_changes() {
        let mut e = Editor::default();
        e.view.snap_to_grid = false;
        e.set_tool(Tool::Rectangle);
        e.pointer_down(Point::new(0.0, 0.0));
        e.pointer_up(Point::new(40.0, 40.0));
        let id = e.doc.shapes().next().unwrap().id;
        e.select(Some(id));
        let mut edits = PropertyEdits::default();
        edits.sync(&e);
        assert_eq!(edits.fields[&Property::Rotation], "0.0");
        e.set_property(Property::Rotation, "30");
        edits.sync(&e);
        assert_eq!(edits.fields[&Property::Rotation], "30.0");
    }

    #[test]
    fn untouched_fields_are_not_applied() {
        let mut e = Editor::default();
        e.view.snap_to_grid = false;
        e.set_tool(Tool::Rectangle);
        e.pointer_down(Point::new(0.0, 0.0));
        e.pointer_up(Point::new(33.333, 40.0));
        let id = e.doc.shapes().next().unwrap().id;
        e.select(Some(id));
        let mut edits = PropertyEdits::default();
        edits.sync(&e);
        assert_eq!(edits.fields[&Property::Width], "33.3");
        assert!(!edits.is_edited(Property::Width));
        edits.fields.insert(Property::Width, "40".to_string());
        assert!(edits.is_edited(Property::Width));
    }
}
