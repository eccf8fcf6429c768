use crate::editor::history;
use crate::error::{Error, Result};
use crate::model::{self, Rgba};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "vectorpad.toml";
const LOCAL_CONFIG: &str = "settings.toml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(super) struct AppSettings {
    pub fill: Option<Rgba>,
    pub stroke: Rgba,
    pub stroke_width: f32,
    pub snap_to_grid: bool,
    pub grid_visible: bool,
    pub guides_visible: bool,
    pub history_limit: usize,
    pub project_path: String,
    pub png_path: String,
    pub svg_path: String,
    /// Page size used by PNG and SVG export.
    pub export_width: u32,
    pub export_height: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        let style = model::Style::default();
        Self {
            fill: style.fill,
            stroke: style.stroke,
            stroke_width: style.stroke_width,
            snap_to_grid: true,
            grid_visible: true,
            guides_visible: true,
            history_limit: history::DEFAULT_LIMIT,
            project_path: "design.json".to_string(),
            png_path: "design.png".to_string(),
            svg_path: "design.svg".to_string(),
            export_width: 800,
            export_height: 600,
        }
    }
}

impl AppSettings {
    pub fn style(&self) -> model::Style {
        model::Style {
            fill: self.fill,
            stroke: self.stroke,
            stroke_width: self.stroke_width,
            ..model::Style::default()
        }
    }
}

/// `$CONFIG_DIR/vectorpad.toml` when it exists, else `settings.toml` in the
/// working directory.
pub(super) fn config_path() -> PathBuf {
    if let Some(dir) = dirs::config_dir() {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            return path;
        }
    }
    PathBuf::from(LOCAL_CONFIG)
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "toml")
}

/// Reads `path` as TOML or JSON, trying the format its extension suggests
/// first. `None` when the file is missing or unreadable in both.
pub(super) fn load_settings(path: &Path) -> Option<AppSettings> {
    let s = std::fs::read_to_string(path).ok()?;
    let parsed = if is_toml(path) {
        toml::from_str::<AppSettings>(&s)
            .ok()
            .or_else(|| serde_json::from_str::<AppSettings>(&s).ok())
    } else {
        serde_json::from_str::<AppSettings>(&s)
            .ok()
            .or_else(|| toml::from_str::<AppSettings>(&s).ok())
    };
    if parsed.is_none() {
        tracing::warn!(path = %path.display(), "settings file ignored: not valid toml or json");
    }
    parsed
}

pub(super) fn save_settings(path: &Path, settings: &AppSettings) -> Result<()> {
    let text = if is_toml(path) {
        toml::to_string_pretty(settings).map_err(|e| Error::Settings(e.to_string()))?
    } else {
        serde_json::to_string_pretty(settings)?
    };
    std::fs::write(path, text)?;
    tracing::debug!(path = %path.display(), "settings saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectorpad.toml");
        let settings = AppSettings {
            stroke_width: 3.5,
            snap_to_grid: false,
            history_limit: 10,
            ..AppSettings::default()
        };
        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path), Some(settings));
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "stroke = \"#ff0000\"\nexport_width = 1024\n").unwrap();
        let s = load_settings(&path).unwrap();
        assert_eq!(s.stroke, Rgba::rgb(255, 0, 0));
        assert_eq!(s.export_width, 1024);
        assert_eq!(s.history_limit, history::DEFAULT_LIMIT);
        assert_eq!(s.style().stroke, Rgba::rgb(255, 0, 0));
    }

    #[test]
    fn json_in_a_toml_file_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, r#"{"grid_visible": false}"#).unwrap();
        assert!(!load_settings(&path).unwrap().grid_visible);
    }

    #[test]
    fn garbage_and_missing_files_give_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(load_settings(&path), None);
        std::fs::write(&path, "[[[").unwrap();
        assert_eq!(load_settings(&path), None);
    }
}
