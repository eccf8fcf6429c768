use crate::editor::io::FileStorage;
use crate::editor::Editor;
use crate::error::Result;
use crate::render::{ImageCache, Surface};
use eframe::egui;
use std::path::PathBuf;

mod actions;
mod help;
mod panels;
mod settings;
mod update;

const MINIMAP_SIZE: (u32, u32) = (200, 150);
const SNAPSHOT_KEY: &str = "snapshot";

/// Text tool prompt, open while the editor waits for a string.
#[derive(Default)]
struct TextPrompt {
    open: bool,
    buffer: String,
}

pub struct VectorPadApp {
    editor: Editor,
    canvas: Surface,
    minimap: Surface,
    images: ImageCache,
    canvas_texture: Option<egui::TextureHandle>,
    minimap_texture: Option<egui::TextureHandle>,
    settings: settings::AppSettings,
    settings_path: PathBuf,
    storage: FileStorage,
    property_edits: panels::PropertyEdits,
    text_prompt: TextPrompt,
    show_help: bool,
    show_minimap: bool,
}

impl VectorPadApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Result<Self> {
        let settings_path = settings::config_path();
        let settings = settings::load_settings(&settings_path)
            .or_else(|| settings::load_settings(std::path::Path::new("settings.json")))
            .unwrap_or_default();
        tracing::info!(path = %settings_path.display(), "settings resolved");

        let mut editor = Editor::new(settings.style(), settings.history_limit);
        editor.view.snap_to_grid = settings.snap_to_grid;
        editor.view.grid_visible = settings.grid_visible;
        editor.view.guides_visible = settings.guides_visible;

        let storage_dir = dirs::data_dir()
            .map(|d| d.join("vectorpad"))
            .unwrap_or_else(|| PathBuf::from("vectorpad-data"));

        Ok(Self {
            editor,
            canvas: Surface::new(1, 1)?,
            minimap: Surface::new(MINIMAP_SIZE.0, MINIMAP_SIZE.1)?,
            images: ImageCache::default(),
            canvas_texture: None,
            minimap_texture: None,
            settings,
            settings_path,
            storage: FileStorage::new(storage_dir),
            property_edits: panels::PropertyEdits::default(),
            text_prompt: TextPrompt::default(),
            show_help: false,
            show_minimap: true,
        })
    }

    fn settings_snapshot(&self) -> settings::AppSettings {
        let view = &self.editor.view;
        settings::AppSettings {
            fill: self.editor.style.fill,
            stroke: self.editor.style.stroke,
            stroke_width: self.editor.style.stroke_width,
            snap_to_grid: view.snap_to_grid,
            grid_visible: view.grid_visible,
            guides_visible: view.guides_visible,
            ..self.settings.clone()
        }
    }

    fn persist_settings(&mut self) {
        self.settings = self.settings_snapshot();
        if let Err(e) = settings::save_settings(&self.settings_path, &self.settings) {
            tracing::warn!("settings save failed: {e}");
            self.editor.status = Some(format!("Settings save failed: {e}"));
        }
    }
}

/// Uploads a surface into `slot`, allocating the texture on first use.
fn upload(ctx: &egui::Context, slot: &mut Option<egui::TextureHandle>, name: &str, surface: &Surface) {
    let size = [surface.width() as usize, surface.height() as usize];
    let image = egui::ColorImage::from_rgba_premultiplied(size, surface.data());
    match slot {
        Some(texture) => texture.set(image, egui::TextureOptions::NEAREST),
        None => *slot = Some(ctx.load_texture(name, image, egui::TextureOptions::NEAREST)),
    }
}
