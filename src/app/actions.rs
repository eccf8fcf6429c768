use super::{SNAPSHOT_KEY, VectorPadApp};
use crate::editor::io::{self, ImportedImage, Storage};
use crate::editor::Editor;
use crate::error::{Error, Result};
use crate::{render, svg};
use std::path::Path;

impl VectorPadApp {
    pub(super) fn new_document(&mut self) {
        let view = self.editor.view.clone();
        self.editor = Editor::new(self.settings_snapshot().style(), self.settings.history_limit);
        self.editor.view = view;
        self.editor.status = Some("New document".to_string());
        self.images = render::ImageCache::default();
    }

    pub(super) fn save_project_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(file_name(&self.settings.project_path))
            .add_filter("JSON", &["json"])
            .save_file()
        else {
            return;
        };
        match self.write_project(&path) {
            Ok(()) => {
                self.settings.project_path = path.display().to_string();
                self.persist_settings();
                self.editor.status = Some(format!("Saved {}", path.display()));
            }
            Err(e) => {
                tracing::warn!("project save failed: {e}");
                self.editor.status = Some(format!("Save failed: {e}"));
            }
        }
    }

    fn write_project(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.editor.project_json()?)?;
        tracing::info!(path = %path.display(), "project written");
        Ok(())
    }

    pub(super) fn open_project_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new().add_filter("JSON", &["json"]).pick_file() else {
            return;
        };
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) => {
                self.editor.status = Some(format!("Read failed: {e}"));
                return;
            }
        };
        // The editor reports parse failures in its own status line.
        if self.editor.load_project_json(&json).is_ok() {
            self.images.retain_shapes(&self.editor.doc);
            self.settings.project_path = path.display().to_string();
            self.persist_settings();
        }
    }

    pub(super) fn export_png_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(file_name(&self.settings.png_path))
            .add_filter("PNG", &["png"])
            .save_file()
        else {
            return;
        };
        match self.write_png(&path) {
            Ok(()) => {
                self.settings.png_path = path.display().to_string();
                self.persist_settings();
                self.editor.status = Some(format!("Exported {}", path.display()));
            }
            Err(e) => {
                tracing::warn!("png export failed: {e}");
                self.editor.status = Some(format!("PNG export failed: {e}"));
            }
        }
    }

    fn write_png(&mut self, path: &Path) -> Result<()> {
        let (w, h) = self.export_size();
        let url = render::export_png(&self.editor.doc, &self.editor.view, w, h, &mut self.images)?;
        let png = io::data_url_bytes(&url)
            .ok_or_else(|| Error::Png("export produced a malformed data URL".to_string()))?;
        std::fs::write(path, png)?;
        Ok(())
    }

    /// The canvas size, falling back to the configured page size before the
    /// first frame.
    fn export_size(&self) -> (u32, u32) {
        if self.canvas.width() > 1 && self.canvas.height() > 1 {
            (self.canvas.width(), self.canvas.height())
        } else {
            (self.settings.export_width, self.settings.export_height)
        }
    }

    pub(super) fn export_svg_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(file_name(&self.settings.svg_path))
            .add_filter("SVG", &["svg"])
            .save_file()
        else {
            return;
        };
        let (w, h) = self.export_size();
        let text = svg::document_to_svg(&self.editor.doc, w, h);
        match std::fs::write(&path, text) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "svg export");
                self.settings.svg_path = path.display().to_string();
                self.persist_settings();
                self.editor.status = Some(format!("Exported {}", path.display()));
            }
            Err(e) => self.editor.status = Some(format!("SVG export failed: {e}")),
        }
    }

    /// Answers a pending image request from a file picker. Cancelling or an
    /// unreadable file resolves the request with nothing.
    pub(super) fn pick_image(&mut self) {
        let picked = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg"])
            .pick_file();
        let image = picked.and_then(|path| match read_image(&path) {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!(path = %path.display(), "image import failed: {e}");
                self.editor.status = Some(format!("Image import failed: {e}"));
                None
            }
        });
        self.editor.resolve_image(image);
    }

    pub(super) fn save_snapshot(&mut self) {
        if let Err(e) = self.editor.save_to(&mut self.storage, SNAPSHOT_KEY) {
            tracing::warn!("snapshot save failed: {e}");
            self.editor.status = Some(format!("Snapshot failed: {e}"));
        }
    }

    pub(super) fn restore_snapshot(&mut self) {
        match self.editor.load_from(&self.storage, SNAPSHOT_KEY) {
            Ok(true) => self.images.retain_shapes(&self.editor.doc),
            Ok(false) => self.editor.status = Some("No snapshot saved yet".to_string()),
            Err(e) => tracing::warn!("snapshot restore failed: {e}"),
        }
    }

    pub(super) fn discard_snapshot(&mut self) {
        match self.storage.remove(SNAPSHOT_KEY) {
            Ok(()) => self.editor.status = Some("Snapshot discarded".to_string()),
            Err(e) => {
                tracing::warn!("snapshot discard failed: {e}");
                self.editor.status = Some(format!("Discard failed: {e}"));
            }
        }
    }
}

/// Last path component, for pre-filling save dialogs.
fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn read_image(path: &Path) -> Result<ImportedImage> {
    ImportedImage::decode(&std::fs::read(path)?)
}
