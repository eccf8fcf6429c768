use crate::editor::Tool;
use eframe::egui;

pub(super) fn draw_help_window(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("Help & Shortcuts")
        .open(open)
        .resizable(true)
        .default_width(460.0)
        .default_height(480.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Keyboard Shortcuts");
                ui.separator();

                ui.label("General");
                help_row(ui, "⌘S", "Save project (JSON)");
                help_row(ui, "⌘O", "Open project");
                help_row(ui, "⌘Z", "Undo");
                help_row(ui, "⌘⇧Z / ⌘Y", "Redo");
                help_row(ui, "⌘D", "Duplicate selected");
                help_row(ui, "Delete / Backspace", "Delete selected");
                help_row(ui, "Escape", "Cancel current shape and deselect");
                help_row(ui, "G", "Toggle grid");
                help_row(ui, "F1", "This window");

                ui.add_space(10.0);
                ui.label("Tools");
                for tool in Tool::ALL {
                    let key = tool.shortcut().to_ascii_uppercase().to_string();
                    help_row(ui, &key, tool.label());
                }

                ui.add_space(10.0);
                ui.label("Drawing");
                help_row(ui, "Drag", "Rectangle, circle, triangle, star, line, arrow, arc");
                help_row(ui, "Click", "Polygon vertex; click the first vertex to close");
                help_row(ui, "Double-click", "Finish polygon");
                help_row(ui, "Four clicks", "Bezier: start, two controls, end");
                help_row(ui, "⌘ + scroll", "Zoom in or out");

                ui.add_space(20.0);
                ui.heading("Files");
                ui.separator();
                ui.label("• Projects are JSON documents with layers and shapes");
                ui.label("• PNG export renders visible layers on white");
                ui.label("• SVG export covers rectangles and circles");
                ui.label("• Settings live in vectorpad.toml in the config directory, or settings.toml");
            });
        });
}

fn help_row(ui: &mut egui::Ui, shortcut: &str, description: &str) {
    ui.horizontal(|ui| {
        ui.add_sized(
            [120.0, 16.0],
            egui::Label::new(egui::RichText::new(shortcut).monospace().strong()),
        );
        ui.label(description);
    });
}
