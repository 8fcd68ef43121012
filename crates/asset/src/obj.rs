//! Wavefront OBJ parser producing an importer-side scene.
//!
//! Supports positions, normals, texture coordinates, negative indices and
//! `o`/`g` groups. Each non-empty group becomes one [`SourceMesh`] and one
//! child node of the root, in file order.

use std::{
    collections::HashMap,
    io::{self, BufRead},
};

use anyhow::{Context, Result, anyhow};
use corelib::{Vec2, Vec3, vec2, vec3};

use crate::{
    import::ImportFlags,
    scene::{Face, ImportedScene, SceneNode, SourceMesh},
};

const DEFAULT_GROUP: &str = "default";

/// Load an OBJ scene from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(
    reader: R,
    root_name: &str,
    flags: ImportFlags,
) -> Result<ImportedScene> {
    parse_obj(reader, root_name, flags)
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str, flags: ImportFlags) -> Result<ImportedScene> {
    parse_obj(io::Cursor::new(contents), "obj", flags)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
struct Key(usize, Option<usize>, Option<usize>);

/// Vertices are deduplicated per group on (position, uv, normal).
struct GroupBuilder {
    name: String,
    unique: HashMap<Key, u32>,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    has_normals: bool,
    has_uvs: bool,
    faces: Vec<Face>,
}

impl GroupBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unique: HashMap::new(),
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            has_normals: false,
            has_uvs: false,
            faces: Vec::new(),
        }
    }

    fn vertex(&mut self, key: Key, attrs: &Attributes, line_no: usize) -> Result<u32> {
        if let Some(&idx) = self.unique.get(&key) {
            return Ok(idx);
        }
        let Key(vi, vti, vni) = key;
        let position = attrs
            .positions
            .get(vi)
            .copied()
            .ok_or_else(|| anyhow!("Position index out of bounds on line {}", line_no + 1))?;
        let uv = vti.and_then(|i| attrs.texcoords.get(i).copied());
        let normal = vni.and_then(|i| attrs.normals.get(i).copied());

        let idx = u32::try_from(self.positions.len())
            .map_err(|_| anyhow!("Too many vertices in OBJ group (>{})", u32::MAX))?;
        self.positions.push(position);
        self.uvs.push(uv.unwrap_or(Vec2::ZERO));
        self.normals.push(normal.unwrap_or(Vec3::ZERO));
        self.has_uvs |= uv.is_some();
        self.has_normals |= normal.is_some();
        self.unique.insert(key, idx);
        Ok(idx)
    }

    fn finish(self) -> Option<SourceMesh> {
        if self.faces.is_empty() {
            return None;
        }
        let mut mesh = SourceMesh::new(self.name, self.positions, self.faces);
        if self.has_normals {
            mesh = mesh.with_normals(self.normals);
        }
        if self.has_uvs {
            mesh = mesh.with_tex_coords(0, self.uvs);
        }
        Some(mesh)
    }
}

/// File-global attribute pools; OBJ indices refer into these.
#[derive(Default)]
struct Attributes {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    texcoords: Vec<Vec2>,
}

fn parse_obj<R: BufRead>(reader: R, root_name: &str, flags: ImportFlags) -> Result<ImportedScene> {
    let mut attrs = Attributes::default();
    let mut group = GroupBuilder::new(DEFAULT_GROUP);
    let mut meshes: Vec<SourceMesh> = Vec::new();
    let mut skipped_polygons = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_no + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let tag = parts
            .next()
            .ok_or_else(|| anyhow!("Malformed OBJ line {}: '{}'", line_no + 1, trimmed))?;

        match tag {
            "v" => {
                let x = parse_f32(parts.next(), line_no, "x coordinate")?;
                let y = parse_f32(parts.next(), line_no, "y coordinate")?;
                let z = parse_f32(parts.next(), line_no, "z coordinate")?;
                attrs.positions.push(vec3(x, y, z));
            }
            "vt" => {
                let u = parse_f32(parts.next(), line_no, "u coordinate")?;
                let v = parse_f32(parts.next(), line_no, "v coordinate")?;
                let v = if flags.flip_uvs { 1.0 - v } else { v };
                attrs.texcoords.push(vec2(u, v));
            }
            "vn" => {
                let nx = parse_f32(parts.next(), line_no, "nx coordinate")?;
                let ny = parse_f32(parts.next(), line_no, "ny coordinate")?;
                let nz = parse_f32(parts.next(), line_no, "nz coordinate")?;
                attrs.normals.push(vec3(nx, ny, nz));
            }
            "o" | "g" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                let name = if name.is_empty() { DEFAULT_GROUP.to_owned() } else { name };
                let finished = std::mem::replace(&mut group, GroupBuilder::new(name));
                meshes.extend(finished.finish());
            }
            "f" => {
                let mut face: Face = Vec::new();
                for part in parts {
                    let (vi, vti, vni) = parse_face_vertex(
                        part,
                        attrs.positions.len(),
                        attrs.texcoords.len(),
                        attrs.normals.len(),
                        line_no,
                    )?;
                    face.push(group.vertex(Key(vi, vti, vni), &attrs, line_no)?);
                }

                if face.len() < 3 {
                    skipped_polygons += 1;
                    continue;
                }
                if flags.triangulate {
                    // Triangulate fan
                    for tri in 1..(face.len() - 1) {
                        group.faces.push(vec![face[0], face[tri], face[tri + 1]]);
                    }
                } else {
                    group.faces.push(face);
                }
            }
            _ => {
                // Ignore other directives (s/usemtl/mtllib/etc.)
            }
        }
    }
    meshes.extend(group.finish());

    if skipped_polygons > 0 {
        log::warn!("Skipped {} degenerate OBJ faces", skipped_polygons);
    }

    let root = meshes
        .iter()
        .enumerate()
        .fold(SceneNode::new(root_name), |root, (i, mesh)| {
            root.with_child(SceneNode::new(mesh.name.clone()).with_mesh(i))
        });

    Ok(ImportedScene { root, meshes })
}

fn parse_f32(value: Option<&str>, line_no: usize, what: &str) -> Result<f32> {
    let token = value.ok_or_else(|| anyhow!("Missing {} on line {}", what, line_no + 1))?;
    token
        .parse::<f32>()
        .with_context(|| format!("Failed to parse {} on line {}", what, line_no + 1))
}

fn parse_face_vertex(
    token: &str,
    pos_count: usize,
    tex_count: usize,
    norm_count: usize,
    line_no: usize,
) -> Result<(usize, Option<usize>, Option<usize>)> {
    let mut split = token.split('/');
    let pos = split
        .next()
        .ok_or_else(|| anyhow!("Malformed face element '{}' on line {}", token, line_no + 1))?;
    let pos_idx = resolve_index(pos, pos_count, line_no)?;

    let tex_idx = match split.next() {
        Some(value) if !value.is_empty() => Some(resolve_index(value, tex_count, line_no)?),
        _ => None,
    };

    let norm_idx = match split.next() {
        Some(value) if !value.is_empty() => Some(resolve_index(value, norm_count, line_no)?),
        _ => None,
    };

    Ok((pos_idx, tex_idx, norm_idx))
}

/// Maps a 1-based (or negative, end-relative) OBJ index onto `0..len`.
/// Parsed as i64 so indices past i32 still report as out of bounds rather
/// than as unparsable.
fn resolve_index(token: &str, len: usize, line_no: usize) -> Result<usize> {
    let raw = token
        .parse::<i64>()
        .with_context(|| format!("Invalid index '{}' on line {}", token, line_no + 1))?;

    let idx = match raw {
        0 => anyhow::bail!("OBJ indices are 1-based; found 0 on line {}", line_no + 1),
        r if r > 0 => usize::try_from(r - 1).ok(),
        r => usize::try_from(r.unsigned_abs())
            .ok()
            .and_then(|back| len.checked_sub(back)),
    };

    idx.filter(|&i| i < len).ok_or_else(|| {
        anyhow!(
            "OBJ index {} resolved out of bounds (len={}) on line {}",
            raw,
            len,
            line_no + 1
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_triangle() {
        let src = r#"
            v 0.0 0.0 0.0
            v 1.0 0.0 0.0
            v 0.0 1.0 0.0
            vn 0.0 0.0 1.0
            vt 0.0 0.0
            vt 1.0 0.0
            vt 0.0 1.0
            f 1/1/1 2/2/1 3/3/1
        "#;
        let scene = load_obj_from_str(src, ImportFlags::default()).expect("parse triangle");
        assert_eq!(scene.meshes.len(), 1);
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.name, DEFAULT_GROUP);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2]]);
        assert_eq!(mesh.normals.as_deref(), Some(&[Vec3::Z; 3][..]));
        assert_eq!(mesh.primary_tex_coords().map(<[Vec2]>::len), Some(3));
    }

    #[test]
    fn groups_become_child_nodes_in_file_order() {
        let src = "
            v 0 0 0
            v 1 0 0
            v 0 1 0
            v 1 1 0
            o first
            f 1 2 3
            g
            o second
            f 2 4 3
            f -4 -3 -1
        ";
        let scene = load_obj_from_str(src, ImportFlags::default()).expect("parse groups");
        let names: Vec<&str> = scene.meshes.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(scene.root.meshes.is_empty());
        assert_eq!(scene.root.children.len(), 2);
        assert_eq!(scene.root.children[1].name, "second");
        assert_eq!(scene.root.children[1].meshes, vec![1]);

        let second = &scene.meshes[1];
        assert!(second.normals.is_none());
        assert!(second.primary_tex_coords().is_none());
        // Vertices 2, 4, 3 then 1 are first seen in that order.
        assert_eq!(second.faces, vec![vec![0, 1, 2], vec![3, 0, 1]]);
    }

    #[test]
    fn quads_are_fan_triangulated_only_when_asked() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let tri = load_obj_from_str(src, ImportFlags::default()).expect("triangulated");
        assert_eq!(tri.meshes[0].faces, vec![vec![0, 1, 2], vec![0, 2, 3]]);

        let flags = ImportFlags {
            triangulate: false,
            ..ImportFlags::default()
        };
        let raw = load_obj_from_str(src, flags).expect("raw");
        assert_eq!(raw.meshes[0].faces, vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn flip_uvs_inverts_v() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0.25 0.25\nf 1/1 2/1 3/1\n";
        let flags = ImportFlags {
            flip_uvs: true,
            ..ImportFlags::default()
        };
        let scene = load_obj_from_str(src, flags).expect("parse");
        let uvs = scene.meshes[0].primary_tex_coords().expect("uvs");
        assert_eq!(uvs[0], vec2(0.25, 0.75));
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let err = load_obj_from_str("v 0 0 0\nf 1 2 3\n", ImportFlags::default()).unwrap_err();
        assert!(err.to_string().contains("out of bounds"));
    }

    #[test]
    fn index_resolution_handles_both_ends() {
        assert_eq!(resolve_index("1", 3, 0).expect("first"), 0);
        assert_eq!(resolve_index("-1", 3, 0).expect("last"), 2);
        assert_eq!(resolve_index("-3", 3, 0).expect("first from end"), 0);

        let err = resolve_index("-4", 3, 0).unwrap_err();
        assert!(err.to_string().contains("out of bounds"));
        let err = resolve_index("0", 3, 4).unwrap_err();
        assert!(err.to_string().contains("line 5"));
    }

    #[test]
    fn indices_past_i32_are_out_of_bounds_not_garbage() {
        for token in ["4294967296", "-9000000000"] {
            let err = resolve_index(token, 3, 0).unwrap_err();
            assert!(err.to_string().contains("out of bounds"), "{token}: {err}");
        }
        let err = resolve_index("1.5", 3, 0).unwrap_err();
        assert!(err.to_string().contains("Invalid index"));
    }

    #[test]
    fn geometry_free_file_yields_empty_scene() {
        let scene = load_obj_from_str("# nothing\nv 0 0 0\n", ImportFlags::default()).expect("parse");
        assert!(scene.meshes.is_empty());
        assert!(scene.root.children.is_empty());
    }
}
