use thiserror::Error;

/// Errors raised at the editor's collaborator boundaries.
///
/// None of these leave the document or history in a partial state; callers
/// report them through the status line and carry on.
#[derive(Error, Debug)]
pub enum Error {
    /// Project JSON could not be parsed or serialized
    #[error("Parse failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image bytes could not be decoded
    #[error("Image decode failed: {0}")]
    Image(#[from] image::ImageError),

    /// Raster surface could not be allocated or encoded
    #[error("PNG export failed: {0}")]
    Png(String),

    /// Parsed document violates a layer store invariant
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Transform is not defined for this shape kind
    #[error("{op} is not supported for {kind}")]
    UnsupportedTransform {
        /// The transform name, e.g. "flip".
        op: &'static str,
        /// The shape kind label.
        kind: &'static str,
    },

    /// Settings file could not be written
    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, Error>;
