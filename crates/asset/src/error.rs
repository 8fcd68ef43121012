//! Error kinds for importing and flattening models.

use std::path::PathBuf;

use thiserror::Error;

/// Raised by the flattener when the imported data references something that
/// does not exist. Always fatal to the current load.
#[derive(Debug, Error)]
pub enum FlattenError {
    #[error(
        "node '{node}' (#{ordinal}) references mesh {index}, but the scene only has {mesh_count} meshes"
    )]
    InvalidMeshReference {
        node: String,
        ordinal: usize,
        index: usize,
        mesh_count: usize,
    },

    #[error(
        "mesh '{mesh}' face {face} references vertex {index}, but the mesh only has {vertex_count} vertices"
    )]
    InvalidVertexReference {
        mesh: String,
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("mesh '{mesh}' face {face} has {len} indices; only triangles are supported")]
    NonTriangularFace { mesh: String, face: usize, len: usize },

    #[error("mesh '{mesh}' has {found} {attribute} for {expected} vertices")]
    AttributeLengthMismatch {
        mesh: String,
        attribute: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("mesh '{mesh}' has {vertex_count} vertices, more than a u32 index can address")]
    TooManyVertices { mesh: String, vertex_count: usize },
}

/// Raised by an [`Importer`](crate::import::Importer) before flattening runs.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source:#}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("import of {} produced no usable scene: {reason}", path.display())]
    Incomplete { path: PathBuf, reason: String },

    #[error("unsupported model format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },
}

/// Anything that can go wrong while turning a file into a [`ModelData`](crate::mesh::ModelData).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Flatten(#[from] FlattenError),
}

pub type FlattenResult<T> = Result<T, FlattenError>;
