use super::Editor;
use crate::error::{Error, Result};
use crate::model::Document;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::io::Cursor;
use std::path::PathBuf;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Clone, Debug, PartialEq)]
pub struct ImportedImage {
    pub width: u32,
    pub height: u32,
    pub data_url: String,
}

impl ImportedImage {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
        Ok(Self {
            width,
            height,
            data_url: png_data_url(&png),
        })
    }
}

pub fn png_data_url(png: &[u8]) -> String {
    format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(png))
}

pub fn data_url_bytes(url: &str) -> Option<Vec<u8>> {
    let rest = url.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    if !meta.ends_with(";base64") {
        return None;
    }
    STANDARD.decode(payload.trim()).ok()
}

pub fn decode_data_url(url: &str) -> Result<image::RgbaImage> {
    let bytes = data_url_bytes(url)
        .ok_or_else(|| Error::InvalidDocument("image source is not a base64 data URL".to_string()))?;
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

pub fn to_project_json(doc: &Document) -> Result<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

pub fn parse_project(json: &str) -> Result<Document> {
    let mut doc: Document = serde_json::from_str(json)?;
    doc.validate()?;
    Ok(doc)
}

pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

impl Editor {
    /// Replaces the document with parsed project JSON. On failure nothing
    /// changes.
    pub fn load_project_json(&mut self, json: &str) -> Result<()> {
        let doc = match parse_project(json) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("project load rejected: {e}");
                self.status = Some("Error loading project file".to_string());
                return Err(e);
            }
        };
        tracing::info!(layers = doc.layers.len(), shapes = doc.shape_count(), "project loaded");
        self.replace_document(doc);
        self.pending = None;
        self.status = Some("Project loaded".to_string());
        self.commit();
        Ok(())
    }

    pub fn project_json(&self) -> Result<String> {
        to_project_json(&self.doc)
    }

    pub fn save_to(&mut self, storage: &mut dyn Storage, key: &str) -> Result<()> {
        let json = self.project_json()?;
        storage.set(key, &json)?;
        tracing::info!(key, "project saved");
        self.status = Some("Project saved".to_string());
        Ok(())
    }

    pub fn load_from(&mut self, storage: &dyn Storage, key: &str) -> Result<bool> {
        match storage.get(key)? {
            Some(json) => self.load_project_json(&json).map(|()| true),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Tool;
    use crate::model::{Point, Shape, ShapeKind};

    fn editor_with_shapes() -> Editor {
        let mut e = Editor::default();
        e.set_tool(Tool::Rectangle);
        e.pointer_down(Point::new(20.0, 20.0));
        e.pointer_up(Point::new(120.0, 80.0));
        e.add_layer();
        e.set_tool(Tool::Circle);
        e.pointer_down(Point::new(0.0, 0.0));
        e.pointer_up(Point::new(40.0, 40.0));
        e
    }

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 255]));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png).unwrap();
        png
    }

    #[test]
    fn project_json_shape() {
        let e = editor_with_shapes();
        let value: serde_json::Value = serde_json::from_str(&e.project_json().unwrap()).unwrap();
        assert_eq!(value["currentLayerId"], 2);
        assert_eq!(value["layers"][0]["shapes"][0]["type"], "rectangle");
        assert_eq!(value["layers"][1]["shapes"][0]["radiusX"], 20.0);
    }

    #[test]
    fn load_replaces_document_and_commits() {
        let source = editor_with_shapes();
        let json = source.project_json().unwrap();
        let mut e = Editor::default();
        e.load_project_json(&json).unwrap();
        assert_eq!(e.doc, source.doc);
        assert_eq!(e.history.len(), 2);
        assert!(e.selected().is_none());
        e.undo();
        assert_eq!(e.doc.shape_count(), 0);
    }

    #[test]
    fn malformed_load_leaves_state_alone() {
        let mut e = editor_with_shapes();
        let before = e.doc.clone();
        let entries = e.history.len();
        assert!(matches!(e.load_project_json("{not json"), Err(Error::Json(_))));
        assert!(matches!(
            e.load_project_json(r#"{"layers": [], "currentLayerId": 1}"#),
            Err(Error::InvalidDocument(_))
        ));
        assert_eq!(e.doc, before);
        assert_eq!(e.history.len(), entries);
        assert_eq!(e.status.as_deref(), Some("Error loading project file"));
    }

    #[test]
    fn stale_current_layer_is_repointed() {
        let doc = parse_project(
            r#"{"layers": [{"id": 3, "name": "Top", "shapes": [], "visible": true}], "currentLayerId": 9}"#,
        )
        .unwrap();
        assert_eq!(doc.current_layer_id, 3);
    }

    #[test]
    fn browser_era_projects_load() {
        let json = r##"{"layers": [{"id": 1, "name": "Layer 1", "visible": true, "locked": false, "shapes": [
            {"type": "rectangle", "x": 10, "y": 10, "width": 50, "height": 20, "fill": "transparent",
             "fillPattern": "solid", "stroke": "#000000", "strokeWidth": 2, "strokeStyle": "solid",
             "rotation": 0, "opacity": 1, "layerId": 1},
            {"type": "star", "x": 100, "y": 100, "outerRadius": 40, "innerRadius": 16, "points": 5,
             "fill": "#ff0000", "stroke": "#000000", "strokeWidth": 2, "strokeStyle": "solid",
             "opacity": 1, "layerId": 1},
            {"type": "path", "points": [{"x": 0, "y": 0}, {"x": 5, "y": 5}], "stroke": "#000000",
             "strokeWidth": 1, "strokeStyle": "solid", "layerId": 1},
            {"type": "image", "x": 100, "y": 100, "width": 64, "height": 32, "image": {},
             "opacity": 1, "layerId": 1}
        ]}], "currentLayerId": 1}"##;
        let mut e = Editor::default();
        e.load_project_json(json).unwrap();
        let shapes: Vec<&Shape> = e.doc.shapes().collect();
        assert_eq!(shapes.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(shapes[0].fill, None);
        assert_eq!(shapes[1].fill, Some(crate::model::Rgba::rgb(255, 0, 0)));
        assert!(matches!(
            shapes[1].kind,
            ShapeKind::Star { base_rotation, .. } if (base_rotation + std::f32::consts::FRAC_PI_2).abs() < 1e-6
        ));
        assert_eq!(shapes[2].fill, None);
        assert!(matches!(&shapes[3].kind, ShapeKind::Image { src, .. } if src.is_empty()));
        assert_eq!(shapes[3].stroke_width, 0.0);
        assert_eq!(e.doc.next_shape_id(), 5);
    }

    #[test]
    fn missing_ids_follow_existing_ones() {
        let doc = parse_project(
            r##"{"layers": [{"id": 1, "name": "L", "shapes": [
                {"type": "line", "x1": 0, "y1": 0, "x2": 5, "y2": 5, "stroke": "#000", "strokeWidth": 1, "layerId": 1},
                {"id": 7, "type": "line", "x1": 0, "y1": 0, "x2": 5, "y2": 5, "stroke": "#000", "strokeWidth": 1, "layerId": 1}
            ]}], "currentLayerId": 1}"##,
        )
        .unwrap();
        let ids: Vec<u64> = doc.shapes().map(|s| s.id).collect();
        assert_eq!(ids, vec![8, 7]);
    }

    #[test]
    fn oversized_star_is_rejected() {
        let json = r##"{"layers": [{"id": 1, "name": "L", "shapes": [
            {"id": 1, "type": "star", "x": 0, "y": 0, "outerRadius": 10, "innerRadius": 4,
             "points": 4294967295, "stroke": "#000", "strokeWidth": 1, "layerId": 1}
        ]}], "currentLayerId": 1}"##;
        let mut e = editor_with_shapes();
        let before = e.doc.clone();
        assert!(matches!(e.load_project_json(json), Err(Error::InvalidDocument(_))));
        assert_eq!(e.doc, before);
    }

    #[test]
    fn memory_storage_round_trip() {
        let mut storage = MemoryStorage::default();
        let mut e = editor_with_shapes();
        e.save_to(&mut storage, "project").unwrap();
        let mut other = Editor::default();
        assert!(other.load_from(&storage, "project").unwrap());
        assert_eq!(other.doc, e.doc);
        storage.remove("project").unwrap();
        assert!(!other.load_from(&storage, "project").unwrap());
    }

    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("projects"));
        assert_eq!(storage.get("a/b").unwrap(), None);
        storage.set("a/b", "{}").unwrap();
        assert_eq!(storage.get("a/b").unwrap().as_deref(), Some("{}"));
        storage.remove("a/b").unwrap();
        storage.remove("a/b").unwrap();
        assert_eq!(storage.get("a/b").unwrap(), None);
    }

    #[test]
    fn imported_image_keeps_natural_size() {
        let image = ImportedImage::decode(&tiny_png()).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert!(image.data_url.starts_with(PNG_DATA_URL_PREFIX));
        let decoded = decode_data_url(&image.data_url).unwrap();
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn garbage_image_is_an_error() {
        assert!(matches!(ImportedImage::decode(b"nope"), Err(Error::Image(_))));
        assert!(decode_data_url("http://example.com/a.png").is_err());
    }
}
