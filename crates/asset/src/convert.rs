//! Bakes a transform into a source mesh, producing renderer-ready data.

use corelib::{Mat3, Mat4, Vec2, Vec3, transform::normal_matrix};

use crate::{
    error::{FlattenError, FlattenResult},
    mesh::{MeshData, MeshVertex},
    scene::SourceMesh,
};

/// How normals are carried through a node transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NormalTransform {
    /// Inverse-transpose of the upper 3x3, then re-normalised. Correct under
    /// non-uniform scale and shear.
    #[default]
    InverseTranspose,
    /// Same linear part as positions, no re-normalisation. Only correct for
    /// rotations and uniform scale.
    SameAsPositions,
}

impl NormalTransform {
    fn apply(self, transform: &Mat4, normal_mat: &Mat3, n: Vec3) -> Vec3 {
        match self {
            Self::InverseTranspose => (*normal_mat * n).normalize_or_zero(),
            Self::SameAsPositions => transform.transform_vector3(n),
        }
    }
}

/// Convert `source` into a [`MeshData`] with `transform` baked into its
/// positions and normals. Texture coordinates pass through untouched.
pub fn convert_mesh(
    source: &SourceMesh,
    transform: &Mat4,
    normals: NormalTransform,
) -> FlattenResult<MeshData> {
    let vertex_count = source.vertex_count();
    if u32::try_from(vertex_count).is_err() {
        return Err(FlattenError::TooManyVertices {
            mesh: source.name.clone(),
            vertex_count,
        });
    }

    let source_normals = source.normals.as_deref();
    let source_uvs = source.primary_tex_coords();
    check_len(source, "normals", source_normals.map(<[Vec3]>::len))?;
    check_len(source, "texture coordinates", source_uvs.map(<[Vec2]>::len))?;

    let normal_mat = normal_matrix(transform);
    let vertices = source
        .positions
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let position = transform.transform_point3(p);
            let normal = source_normals
                .map(|ns| normals.apply(transform, &normal_mat, ns[i]))
                .unwrap_or(Vec3::ZERO);
            let uv = source_uvs.map(|uvs| uvs[i]).unwrap_or(Vec2::ZERO);
            MeshVertex::new(position.to_array(), normal.to_array(), uv.to_array())
        })
        .collect();

    let mut indices = Vec::with_capacity(source.faces.len() * 3);
    for (face_no, face) in source.faces.iter().enumerate() {
        if face.len() != 3 {
            return Err(FlattenError::NonTriangularFace {
                mesh: source.name.clone(),
                face: face_no,
                len: face.len(),
            });
        }
        for &index in face {
            if index as usize >= vertex_count {
                return Err(FlattenError::InvalidVertexReference {
                    mesh: source.name.clone(),
                    face: face_no,
                    index,
                    vertex_count,
                });
            }
            indices.push(index);
        }
    }

    Ok(MeshData::new(vertices, indices))
}

fn check_len(
    source: &SourceMesh,
    attribute: &'static str,
    found: Option<usize>,
) -> FlattenResult<()> {
    match found {
        Some(found) if found < source.vertex_count() => Err(FlattenError::AttributeLengthMismatch {
            mesh: source.name.clone(),
            attribute,
            expected: source.vertex_count(),
            found,
        }),
        _ => Ok(()),
    }
}
