//! Error types for the viewer.
//!
//! Loading, configuration and camera math return `ViewerResult<T>`.
//! Pick target resolution has its own `PickError`, since a failed pick is
//! skipped rather than propagated.

use thiserror::Error;

use crate::scene::ObjectId;

/// Errors raised while setting up or loading the scene.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Mesh file could not be parsed.
    #[error("Failed to parse mesh: {0}")]
    MeshParse(String),

    /// Mesh file extension is not one we know how to read.
    #[error("Unsupported mesh format: {0}")]
    UnsupportedFormat(String),

    /// Mesh parsed, but holds no triangles.
    #[error("Mesh contains no triangles")]
    EmptyMesh,

    /// Configuration file is malformed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The camera's view-projection matrix cannot be inverted.
    #[error("Camera view-projection matrix is not invertible")]
    DegenerateCamera,

    /// Asset request failed before any bytes were parsed.
    #[error("Failed to fetch asset: {0}")]
    Fetch(String),

    /// Graphics resource could not be created.
    #[error("Render error: {0}")]
    Render(String),
}

/// Reasons the nearest intersection cannot be recolored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PickError {
    #[error("intersection has no triangle")]
    MissingFace,

    #[error("object {0:?} is not part of the scene")]
    UnknownObject(ObjectId),

    #[error("face {face} is out of range for a geometry with {vertices} vertices")]
    FaceOutOfRange { face: usize, vertices: usize },

    /// The hit object does not render per-vertex colors (e.g. a wireframe overlay).
    #[error("object {0:?} has no per-vertex color attribute")]
    NoColorAttribute(ObjectId),
}

/// Convenience alias for `Result<T, ViewerError>`.
pub type ViewerResult<T> = Result<T, ViewerError>;
