//! Import + flatten in one call.

use std::path::Path;

use corelib::{Mat4, Vec3, transform::Transform};

use crate::{
    convert::NormalTransform,
    error::LoadError,
    flatten::{flatten_scene, scene_bounds},
    import::{ImportFlags, Importer},
    mesh::{ModelData, fit_scale},
    scene::{ImportedScene, SceneNode},
};

/// Knobs for [`load_model`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoadOptions {
    pub flags: ImportFlags,
    /// Uniform scale applied as the root's inherited transform.
    pub scale: f32,
    /// When set, overrides `scale` so the largest side of the baked model's
    /// bounds equals this value.
    pub fit_to: Option<f32>,
    pub normals: NormalTransform,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            flags: ImportFlags::default(),
            scale: 1.0,
            fit_to: None,
            normals: NormalTransform::default(),
        }
    }
}

/// Root transform for `scene` under `options`.
///
/// The fit factor is measured on an unscaled bake and then applied as the
/// innermost factor, beneath every node transform. It is exact as long as
/// node transforms carry no translation, which holds for OBJ imports. For
/// hierarchies with translated nodes the translations are not scaled, so the
/// fitted model only approximates `fit_to`; a warning is logged in that case.
pub fn initial_transform(scene: &ImportedScene, options: &LoadOptions) -> Result<Mat4, LoadError> {
    let scale = match options.fit_to {
        Some(target) => {
            let translated = translated_node_count(&scene.root);
            if translated > 0 {
                log::warn!(
                    "{} nodes carry a translation; fit to {} is approximate",
                    translated,
                    target
                );
            }
            match scene_bounds(&scene.root, &scene.meshes, Mat4::IDENTITY)? {
                Some(bounds) => fit_scale(&bounds, target),
                None => 1.0,
            }
        }
        None => options.scale,
    };
    Ok(Transform::uniform_scale(scale).matrix())
}

/// Nodes whose local transform has a non-zero translation.
pub fn translated_node_count(root: &SceneNode) -> usize {
    let mut count = 0;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.transform.w_axis.truncate() != Vec3::ZERO {
            count += 1;
        }
        stack.extend(node.children.iter());
    }
    count
}

/// Import `path` with `importer` and flatten the result.
///
/// Import failures are returned before any flattening happens; flatten
/// failures discard everything built so far.
pub fn load_model(
    importer: &dyn Importer,
    path: &Path,
    options: &LoadOptions,
) -> Result<ModelData, LoadError> {
    log::info!("Loading model from {:?}", path);
    let scene = importer.import(path, options.flags)?;

    let root_transform = initial_transform(&scene, options)?;
    let model = flatten_scene(&scene, root_transform, options.normals)?;

    log::info!(
        "Loaded {} meshes ({} vertices, {} triangles) from {:?}",
        model.meshes.len(),
        model.vertex_count(),
        model.triangle_count(),
        path
    );
    Ok(model)
}
