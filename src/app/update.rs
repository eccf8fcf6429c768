use super::{MINIMAP_SIZE, VectorPadApp, help, panels, upload};
use crate::editor::tools::Outcome;
use crate::editor::{Key, Modifiers, PendingInput, Tool};
use crate::model::{Axis, Point};
use crate::render;
use eframe::egui;

const ROTATE_STEP: f32 = 15.0;
const SCALE_UP: f32 = 1.1;
const SCALE_DOWN: f32 = 0.9;

/// Editor key for an egui key press, if the editor cares about it.
fn editor_key(key: egui::Key) -> Option<Key> {
    match key {
        egui::Key::Delete => Some(Key::Delete),
        egui::Key::Backspace => Some(Key::Backspace),
        egui::Key::Escape => Some(Key::Escape),
        other => {
            let mut chars = other.name().chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => Some(Key::Char(c.to_ascii_lowercase())),
                _ => None,
            }
        }
    }
}

impl VectorPadApp {
    fn handle_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::NeedsInput(PendingInput::Text { .. }) => {
                self.text_prompt.open = true;
                self.text_prompt.buffer.clear();
            }
            Outcome::NeedsInput(PendingInput::Image) => self.pick_image(),
            _ => {}
        }
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        let (save, open, help) = ctx.input_mut(|i| {
            (
                i.consume_key(egui::Modifiers::COMMAND, egui::Key::S),
                i.consume_key(egui::Modifiers::COMMAND, egui::Key::O),
                i.consume_key(egui::Modifiers::NONE, egui::Key::F1),
            )
        });
        if save {
            self.save_project_dialog();
        }
        if open {
            self.open_project_dialog();
        }
        if help {
            self.show_help = true;
        }
        if ctx.wants_keyboard_input() || self.text_prompt.open {
            return;
        }
        let presses: Vec<(Key, Modifiers)> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key { key, pressed: true, repeat: false, modifiers, .. } => {
                        editor_key(*key).map(|k| {
                            (k, Modifiers { command: modifiers.command, shift: modifiers.shift })
                        })
                    }
                    _ => None,
                })
                .collect()
        });
        for (key, mods) in presses {
            self.editor.handle_key(key, mods);
        }
    }

    fn menu_bar(&mut self, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("New").clicked() {
                    self.new_document();
                    ui.close_menu();
                }
                if ui.button("Open... (⌘O)").clicked() {
                    self.open_project_dialog();
                    ui.close_menu();
                }
                if ui.button("Save... (⌘S)").clicked() {
                    self.save_project_dialog();
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Export PNG...").clicked() {
                    self.export_png_dialog();
                    ui.close_menu();
                }
                if ui.button("Export SVG...").clicked() {
                    self.export_svg_dialog();
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Save snapshot").clicked() {
                    self.save_snapshot();
                    ui.close_menu();
                }
                if ui.button("Restore snapshot").clicked() {
                    self.restore_snapshot();
                    ui.close_menu();
                }
                if ui.button("Discard snapshot").clicked() {
                    self.discard_snapshot();
                    ui.close_menu();
                }
            });
            ui.menu_button("Edit", |ui| {
                if ui
                    .add_enabled(self.editor.history.can_undo(), egui::Button::new("Undo (⌘Z)"))
                    .clicked()
                {
                    self.editor.undo();
                    ui.close_menu();
                }
                if ui
                    .add_enabled(self.editor.history.can_redo(), egui::Button::new("Redo (⌘⇧Z)"))
                    .clicked()
                {
                    self.editor.redo();
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Duplicate (⌘D)").clicked() {
                    self.editor.duplicate_selected();
                    ui.close_menu();
                }
                if ui.button("Delete").clicked() {
                    self.editor.delete_selected();
                    ui.close_menu();
                }
                if ui.button("Clear canvas").clicked() {
                    self.editor.clear_all();
                    ui.close_menu();
                }
            });
            ui.menu_button("Transform", |ui| {
                if ui.button(format!("Rotate {ROTATE_STEP}°")).clicked() {
                    self.editor.rotate_selected(ROTATE_STEP);
                    ui.close_menu();
                }
                if ui.button(format!("Rotate -{ROTATE_STEP}°")).clicked() {
                    self.editor.rotate_selected(-ROTATE_STEP);
                    ui.close_menu();
                }
                if ui.button("Scale up").clicked() {
                    self.editor.scale_selected(SCALE_UP);
                    ui.close_menu();
                }
                if ui.button("Scale down").clicked() {
                    self.editor.scale_selected(SCALE_DOWN);
                    ui.close_menu();
                }
                if ui.button("Flip horizontal").clicked() {
                    self.editor.flip_selected(Axis::Horizontal);
                    ui.close_menu();
                }
                if ui.button("Flip vertical").clicked() {
                    self.editor.flip_selected(Axis::Vertical);
                    ui.close_menu();
                }
            });
            ui.menu_button("View", |ui| {
                if ui.button("Zoom in").clicked() {
                    self.editor.view.zoom_in();
                    ui.close_menu();
                }
                if ui.button("Zoom out").clicked() {
                    self.editor.view.zoom_out();
                    ui.close_menu();
                }
                if ui.button("Fit to screen").clicked() {
                    self.editor.fit_to_screen();
                    ui.close_menu();
                }
                if ui.button("Reset view").clicked() {
                    self.editor.view.reset_camera();
                    ui.close_menu();
                }
                ui.separator();
                let view = &mut self.editor.view;
                let (mut grid, mut snap, mut guides) =
                    (view.grid_visible, view.snap_to_grid, view.guides_visible);
                let mut changed = false;
                if ui.checkbox(&mut grid, "Grid (G)").changed() {
                    view.toggle_grid();
                    changed = true;
                }
                if ui.checkbox(&mut snap, "Snap to grid").changed() {
                    view.toggle_snap();
                    changed = true;
                }
                if ui.checkbox(&mut guides, "Guides").changed() {
                    view.toggle_guides();
                    changed = true;
                }
                if changed {
                    self.persist_settings();
                }
                ui.separator();
                if ui.button("Add horizontal guide at pointer").clicked() {
                    if let Some(p) = self.editor.pointer() {
                        self.editor.view.add_guide(Axis::Horizontal, p.y);
                    }
                    ui.close_menu();
                }
                if ui.button("Add vertical guide at pointer").clicked() {
                    if let Some(p) = self.editor.pointer() {
                        self.editor.view.add_guide(Axis::Vertical, p.x);
                    }
                    ui.close_menu();
                }
                if ui.button("Clear guides").clicked() {
                    self.editor.view.clear_guides();
                    ui.close_menu();
                }
                ui.separator();
                ui.checkbox(&mut self.show_minimap, "Minimap");
            });
            ui.menu_button("Help", |ui| {
                if ui.button("Shortcuts (F1)").clicked() {
                    self.show_help = true;
                    ui.close_menu();
                }
            });
        });
    }

    fn canvas(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        let origin = rect.min;
        let (w, h) = (rect.width().max(1.0), rect.height().max(1.0));
        self.editor.set_viewport(w, h);
        let to_canvas = |p: egui::Pos2| Point::new(p.x - origin.x, p.y - origin.y);

        let (events, zoom, scroll, command) = ctx.input(|i| {
            (i.events.clone(), i.zoom_delta(), i.raw_scroll_delta.y, i.modifiers.command)
        });
        if response.hovered() {
            if zoom != 1.0 {
                self.editor.wheel(if zoom > 1.0 { -1.0 } else { 1.0 }, true);
            } else if scroll != 0.0 {
                self.editor.wheel(-scroll, command);
            }
        }

        for event in events {
            let outcome = match event {
                egui::Event::PointerButton { pos, button: egui::PointerButton::Primary, pressed, .. } => {
                    if pressed && rect.contains(pos) && response.contains_pointer() && !self.text_prompt.open {
                        self.editor.pointer_down(to_canvas(pos))
                    } else if !pressed {
                        self.editor.pointer_up(to_canvas(pos))
                    } else {
                        Outcome::Nothing
                    }
                }
                egui::Event::PointerMoved(pos) => self.editor.pointer_move(to_canvas(pos)),
                _ => Outcome::Nothing,
            };
            self.handle_outcome(outcome);
        }
        if response.double_clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                let outcome = self.editor.double_click(to_canvas(pos));
                self.handle_outcome(outcome);
            }
        }

        if let Err(e) = self.canvas.resize(w.round() as u32, h.round() as u32) {
            tracing::warn!("canvas resize failed: {e}");
            return;
        }
        render::render_frame(&mut self.canvas, &self.editor, &mut self.images);
        upload(ctx, &mut self.canvas_texture, "canvas", &self.canvas);
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        let painter = ui.painter_at(rect);
        if let Some(texture) = &self.canvas_texture {
            painter.image(texture.id(), rect, uv, egui::Color32::WHITE);
        }

        if self.show_minimap {
            render::render_minimap(&mut self.minimap, &self.editor, &mut self.images);
            upload(ctx, &mut self.minimap_texture, "minimap", &self.minimap);
            let size = egui::vec2(MINIMAP_SIZE.0 as f32, MINIMAP_SIZE.1 as f32);
            let mini = egui::Rect::from_min_size(rect.max - size - egui::vec2(10.0, 10.0), size);
            if let Some(texture) = &self.minimap_texture {
                painter.image(texture.id(), mini, uv, egui::Color32::WHITE);
                painter.rect_stroke(
                    mini,
                    0.0,
                    egui::Stroke::new(1.0, egui::Color32::from_gray(90)),
                    egui::StrokeKind::Outside,
                );
            }
        }
    }

    fn text_prompt_window(&mut self, ctx: &egui::Context) {
        if !self.text_prompt.open {
            return;
        }
        let mut answer: Option<Option<String>> = None;
        egui::Window::new("Enter text")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                let response = ui.text_edit_singleline(&mut self.text_prompt.buffer);
                response.request_focus();
                let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() || enter {
                        answer = Some(Some(self.text_prompt.buffer.clone()));
                    }
                    if ui.button("Cancel").clicked() || ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                        answer = Some(None);
                    }
                });
            });
        if let Some(text) = answer {
            self.text_prompt.open = false;
            self.editor.resolve_text(text);
        }
    }
}

impl eframe::App for VectorPadApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keyboard(ctx);

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            self.menu_bar(ui);
            ui.horizontal_wrapped(|ui| {
                for tool in Tool::ALL {
                    panels::tool_button(ui, tool, &mut self.editor);
                }
            });
        });

        egui::SidePanel::right("right_panel")
            .resizable(true)
            .min_width(220.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.heading("Properties");
                    ui.separator();
                    panels::properties_panel(ui, &mut self.editor, &mut self.property_edits);
                    ui.separator();
                    ui.heading("Style");
                    let style_before = self.editor.style;
                    panels::style_editor(ui, &mut self.editor, &mut self.property_edits);
                    if self.editor.style != style_before {
                        self.persist_settings();
                    }
                    ui.separator();
                    ui.heading("Layers");
                    panels::layers_panel(ui, &mut self.editor);
                });
            });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.editor.status.as_deref().unwrap_or("Ready"));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("Zoom: {:.0}%", self.editor.view.zoom() * 100.0));
                    ui.separator();
                    ui.label(format!("Shapes: {}", self.editor.doc.shape_count()));
                    ui.separator();
                    let history = &self.editor.history;
                    ui.label(format!("History: {}/{}", history.cursor() + 1, history.len()));
                    ui.separator();
                    if let Some(p) = self.editor.pointer() {
                        ui.label(format!("{:.0}, {:.0}", p.x, p.y));
                    }
                });
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.canvas(ui, ctx));

        self.text_prompt_window(ctx);
        help::draw_help_window(ctx, &mut self.show_help);
    }
}
