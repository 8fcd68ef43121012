//! Importer-side scene graph: a tree of nodes referencing a shared mesh table.

use corelib::{Mat4, Vec2, Vec3};

/// Number of texture-coordinate channels a source mesh can carry.
pub const MAX_TEX_COORD_CHANNELS: usize = 8;

/// Ordered vertex indices of one polygon. Length 3 once triangulated.
pub type Face = Vec<u32>;

/// Mesh as handed over by an importer. Attribute arrays are indexed by vertex.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub tex_coords: [Option<Vec<Vec2>>; MAX_TEX_COORD_CHANNELS],
    pub faces: Vec<Face>,
}

impl SourceMesh {
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, faces: Vec<Face>) -> Self {
        Self {
            name: name.into(),
            positions,
            faces,
            ..Self::default()
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Attach texture coordinates to `channel`. Channels past
    /// [`MAX_TEX_COORD_CHANNELS`] are dropped with a warning.
    pub fn with_tex_coords(mut self, channel: usize, uvs: Vec<Vec2>) -> Self {
        match self.tex_coords.get_mut(channel) {
            Some(slot) => *slot = Some(uvs),
            None => log::warn!(
                "Mesh '{}': texture channel {} ignored (max {})",
                self.name,
                channel,
                MAX_TEX_COORD_CHANNELS
            ),
        }
        self
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Texture coordinates of the first channel, if present.
    #[inline]
    pub fn primary_tex_coords(&self) -> Option<&[Vec2]> {
        self.tex_coords[0].as_deref()
    }
}

/// Node of the scene tree. Children are owned exclusively by their parent.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub name: String,
    /// Transform relative to the parent node.
    pub transform: Mat4,
    /// Indices into the owning scene's mesh table.
    pub meshes: Vec<usize>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, index: usize) -> Self {
        self.meshes.push(index);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Number of mesh references in this subtree.
    pub fn mesh_reference_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += node.meshes.len();
            stack.extend(node.children.iter());
        }
        count
    }
}

// Deep trees would overflow the native stack with the derived drop glue.
impl Drop for SceneNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Importer output: scene tree plus the mesh table its nodes index into.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportedScene {
    pub root: SceneNode,
    pub meshes: Vec<SourceMesh>,
}
