//! Importer seam: turns a file into an [`ImportedScene`].

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::{error::ImportError, obj, scene::ImportedScene};

/// Post-processing requested from an importer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImportFlags {
    /// Split polygons with more than three corners into triangles.
    pub triangulate: bool,
    /// Replace texture `v` with `1 - v`.
    pub flip_uvs: bool,
}

impl Default for ImportFlags {
    fn default() -> Self {
        Self {
            triangulate: true,
            flip_uvs: false,
        }
    }
}

/// Produces a scene graph and mesh table from a model file.
///
/// A failed import must never be flattened; there is no partial result.
pub trait Importer {
    /// Whether this importer understands `path` (usually by extension).
    fn supports(&self, path: &Path) -> bool;

    fn import(&self, path: &Path, flags: ImportFlags) -> Result<ImportedScene, ImportError>;
}

/// Importer for Wavefront `.obj` files.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjImporter;

impl Importer for ObjImporter {
    fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("obj"))
    }

    fn import(&self, path: &Path, flags: ImportFlags) -> Result<ImportedScene, ImportError> {
        if !self.supports(path) {
            return Err(ImportError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let root_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "obj".to_owned());

        let scene = obj::load_obj_from_reader(BufReader::new(file), &root_name, flags)
            .map_err(|source| ImportError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if scene.meshes.is_empty() {
            return Err(ImportError::Incomplete {
                path: PathBuf::from(path),
                reason: "file contains no faces".to_owned(),
            });
        }

        log::debug!(
            "Imported {}: {} meshes, {} mesh references",
            path.display(),
            scene.meshes.len(),
            scene.root.mesh_reference_count()
        );
        Ok(scene)
    }
}
