//! Scene flattening: walks the node tree and emits one baked mesh per
//! mesh reference, in depth-first pre-order.

use corelib::Mat4;

use crate::{
    convert::{NormalTransform, convert_mesh},
    error::{FlattenError, FlattenResult},
    mesh::{Aabb, ModelData},
    scene::{ImportedScene, SceneNode, SourceMesh},
};

/// Depth-first pre-order walk with an explicit stack.
///
/// `visit` receives each node, its pre-order ordinal and its effective
/// transform `node.transform * inherited`. Children inherit that product and
/// are visited in index order. Stops at the first error.
pub fn walk<'a, F>(root: &'a SceneNode, initial_transform: Mat4, mut visit: F) -> FlattenResult<()>
where
    F: FnMut(&'a SceneNode, usize, &Mat4) -> FlattenResult<()>,
{
    let mut stack: Vec<(&SceneNode, Mat4)> = vec![(root, initial_transform)];
    let mut ordinal = 0usize;

    while let Some((node, inherited)) = stack.pop() {
        let effective = node.transform * inherited;
        visit(node, ordinal, &effective)?;
        // Reverse so the first child is popped next.
        stack.extend(node.children.iter().rev().map(|child| (child, effective)));
        ordinal += 1;
    }
    Ok(())
}

fn resolve<'m>(
    meshes: &'m [SourceMesh],
    node: &SceneNode,
    ordinal: usize,
    index: usize,
) -> FlattenResult<&'m SourceMesh> {
    meshes
        .get(index)
        .ok_or_else(|| FlattenError::InvalidMeshReference {
            node: node.name.clone(),
            ordinal,
            index,
            mesh_count: meshes.len(),
        })
}

/// Flatten the tree under `root` into a [`ModelData`].
///
/// `initial_transform` acts as the root's inherited transform. Meshes are
/// emitted root first, depth first, children in index order, so the output
/// is reproducible for a given input.
///
/// Fails on the first dangling mesh or vertex reference; nothing partial is
/// returned.
pub fn flatten(
    root: &SceneNode,
    meshes: &[SourceMesh],
    initial_transform: Mat4,
    normals: NormalTransform,
) -> FlattenResult<ModelData> {
    let mut out = Vec::with_capacity(root.mesh_reference_count());

    walk(root, initial_transform, |node, ordinal, effective| {
        log::debug!(
            "Node #{} '{}': {} meshes, {} children",
            ordinal,
            node.name,
            node.meshes.len(),
            node.children.len()
        );
        for &index in &node.meshes {
            let source = resolve(meshes, node, ordinal, index)?;
            out.push(convert_mesh(source, effective, normals)?);
        }
        Ok(())
    })?;

    Ok(ModelData::new(out))
}

/// Bounds of every referenced mesh position after baking, without building
/// any output meshes. `None` when the tree references no vertices.
pub fn scene_bounds(
    root: &SceneNode,
    meshes: &[SourceMesh],
    initial_transform: Mat4,
) -> FlattenResult<Option<Aabb>> {
    let mut bounds: Option<Aabb> = None;

    walk(root, initial_transform, |node, ordinal, effective| {
        for &index in &node.meshes {
            let source = resolve(meshes, node, ordinal, index)?;
            let baked = source.positions.iter().map(|&p| effective.transform_point3(p));
            if let Some(mesh_bounds) = Aabb::from_points(baked) {
                bounds = Some(match bounds {
                    Some(b) => b.union(mesh_bounds),
                    None => mesh_bounds,
                });
            }
        }
        Ok(())
    })?;

    Ok(bounds)
}

/// [`flatten`] over an importer result.
pub fn flatten_scene(
    scene: &ImportedScene,
    initial_transform: Mat4,
    normals: NormalTransform,
) -> FlattenResult<ModelData> {
    flatten(&scene.root, &scene.meshes, initial_transform, normals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{Vec3, transform::Transform, vec3};

    /// One triangle whose first vertex x-coordinate tags it.
    fn tagged(tag: f32) -> SourceMesh {
        SourceMesh::new(
            format!("tri{tag}"),
            vec![vec3(tag, 0.0, 0.0), vec3(tag, 1.0, 0.0), vec3(tag, 0.0, 1.0)],
            vec![vec![0, 1, 2]],
        )
    }

    fn first_x(model: &ModelData) -> Vec<f32> {
        model.meshes.iter().map(|m| m.vertices()[0].position[0]).collect()
    }

    fn sample_tree() -> (SceneNode, Vec<SourceMesh>) {
        let meshes = (0..4).map(|i| tagged(i as f32)).collect();
        let root = SceneNode::new("root")
            .with_mesh(0)
            .with_child(
                SceneNode::new("a")
                    .with_mesh(1)
                    .with_child(SceneNode::new("a0").with_mesh(3).with_mesh(2)),
            )
            .with_child(SceneNode::new("b").with_mesh(2).with_mesh(0));
        (root, meshes)
    }

    #[test]
    fn emits_every_reference_in_preorder() {
        let (root, meshes) = sample_tree();
        let model =
            flatten(&root, &meshes, Mat4::IDENTITY, NormalTransform::default()).expect("flatten");
        assert_eq!(model.meshes.len(), root.mesh_reference_count());
        assert_eq!(first_x(&model), vec![0.0, 1.0, 3.0, 2.0, 2.0, 0.0]);
    }

    #[test]
    fn flattening_is_deterministic() {
        let (root, meshes) = sample_tree();
        let t = Transform::from_trs(vec3(1.0, 2.0, 3.0), vec3(0.4, 0.1, 0.9), Vec3::splat(0.7))
            .matrix();
        let a = flatten(&root, &meshes, t, NormalTransform::default()).expect("first");
        let b = flatten(&root, &meshes, t, NormalTransform::default()).expect("second");
        assert_eq!(a, b);
    }

    #[test]
    fn child_composes_local_then_inherited() {
        let t1 = Transform::from_trs(vec3(1.0, 0.0, 0.0), vec3(0.0, 0.0, 0.5), Vec3::ONE).matrix();
        let t2 = Transform::from_trs(vec3(0.0, 2.0, 0.0), Vec3::ZERO, Vec3::splat(3.0)).matrix();
        let mesh = tagged(1.0);
        let root = SceneNode::new("root")
            .with_transform(t1)
            .with_child(SceneNode::new("child").with_transform(t2).with_mesh(0));

        let model = flatten(
            &root,
            std::slice::from_ref(&mesh),
            Mat4::IDENTITY,
            NormalTransform::default(),
        )
        .expect("flatten");
        assert_eq!(model.meshes.len(), 1);
        for (v, p) in model.meshes[0].vertices().iter().zip(&mesh.positions) {
            let expected = (t2 * t1).transform_point3(*p);
            assert!(Vec3::from_array(v.position).abs_diff_eq(expected, 1e-5));
        }
    }

    #[test]
    fn initial_transform_is_root_ancestor() {
        let s = Transform::uniform_scale(0.1).matrix();
        let root = SceneNode::new("root").with_mesh(0);
        let model = flatten(&root, &[tagged(5.0)], s, NormalTransform::default()).expect("flatten");
        let p = Vec3::from_array(model.meshes[0].vertices()[1].position);
        assert!(p.abs_diff_eq(vec3(0.5, 0.1, 0.0), 1e-6));
    }

    #[test]
    fn mesh_index_equal_to_table_len_fails() {
        let (mut root, meshes) = sample_tree();
        root.children[1].children.push(SceneNode::new("bad").with_mesh(meshes.len()));

        let err = flatten(&root, &meshes, Mat4::IDENTITY, NormalTransform::default()).unwrap_err();
        match err {
            FlattenError::InvalidMeshReference {
                node,
                ordinal,
                index,
                mesh_count,
            } => {
                assert_eq!(node, "bad");
                assert_eq!(ordinal, 4);
                assert_eq!(index, 4);
                assert_eq!(mesh_count, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn scene_bounds_match_flattened_bounds() {
        let (mut root, meshes) = sample_tree();
        root.children[0].transform =
            Transform::from_trs(vec3(0.0, -3.0, 1.0), vec3(0.2, 0.0, 0.0), Vec3::ONE).matrix();
        let s = Transform::uniform_scale(2.0).matrix();

        let baked = flatten(&root, &meshes, s, NormalTransform::default()).expect("flatten");
        let bounds = scene_bounds(&root, &meshes, s).expect("bounds").expect("non-empty");
        let expected = baked.bounds().expect("non-empty");
        assert!(bounds.min.abs_diff_eq(expected.min, 1e-6));
        assert!(bounds.max.abs_diff_eq(expected.max, 1e-6));
    }

    #[test]
    fn walk_visits_in_preorder() {
        let (root, _) = sample_tree();
        let mut names = Vec::new();
        walk(&root, Mat4::IDENTITY, |node, ordinal, _| {
            names.push((ordinal, node.name.as_str()));
            Ok(())
        })
        .expect("walk");
        assert_eq!(names, vec![(0, "root"), (1, "a"), (2, "a0"), (3, "b")]);
    }

    #[test]
    fn nodes_without_meshes_produce_nothing() {
        let root = SceneNode::new("root").with_child(SceneNode::new("empty"));
        let model = flatten(&root, &[], Mat4::IDENTITY, NormalTransform::default()).expect("flatten");
        assert!(model.is_empty());
    }

    #[test]
    fn deep_chains_do_not_recurse() {
        let mut node = SceneNode::new("leaf").with_mesh(0);
        for depth in 0..100_000 {
            node = SceneNode::new(format!("n{depth}")).with_child(node);
        }
        let model = flatten(&node, &[tagged(0.0)], Mat4::IDENTITY, NormalTransform::default())
            .expect("flatten");
        assert_eq!(model.meshes.len(), 1);
    }
}
