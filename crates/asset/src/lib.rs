//! Model loading: importer seam, scene graph, and flattening into
//! renderer-ready meshes.
//!
//! An [`Importer`](import::Importer) turns a file into an
//! [`ImportedScene`](scene::ImportedScene); [`flatten`](flatten::flatten)
//! bakes every node transform into its meshes and returns a
//! [`ModelData`](mesh::ModelData) the caller owns.

pub mod convert;
pub mod error;
pub mod flatten;
pub mod import;
pub mod mesh;
pub mod model;
pub mod obj;
pub mod scene;

pub use convert::{NormalTransform, convert_mesh};
pub use error::{FlattenError, ImportError, LoadError};
pub use flatten::{flatten, flatten_scene};
pub use import::{ImportFlags, Importer, ObjImporter};
pub use mesh::{Aabb, MeshData, MeshVertex, ModelData};
pub use model::{LoadOptions, load_model};
pub use scene::{ImportedScene, SceneNode, SourceMesh};
