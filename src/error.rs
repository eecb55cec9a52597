//! Error types for the annotation engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the annotation engine.
///
/// Only decode and encode failures are meant to reach the user. `OutOfRange`
/// reflects a stale index after a UI race and callers degrade it to a no-op.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The source image could not be decoded; the session does not open.
    #[error("failed to load image '{title}': {source}")]
    ImageLoad {
        title: String,
        #[source]
        source: image::ImageError,
    },

    /// The source image file could not be read.
    #[error("failed to read image {path:?}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An index referred to an annotation that no longer exists.
    #[error("annotation index {index} out of range (have {len})")]
    OutOfRange { index: usize, len: usize },

    /// Flattening or encoding the export failed. The session is preserved.
    #[error("export failed: {0}")]
    Export(#[from] image::ImageError),

    /// The overlay surface could not be allocated.
    #[error("cannot allocate a {width}x{height} drawing surface")]
    Surface { width: u32, height: u32 },

    /// Nothing to export.
    #[error("there are no annotations to export")]
    EmptyExport,

    /// The operation needs an open editing session.
    #[error("no editing session is open")]
    NoSession,
}

/// Errors from loading an [`EditorConfig`](crate::config::EditorConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
