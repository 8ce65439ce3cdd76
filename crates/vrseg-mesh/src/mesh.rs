// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Indexed triangle mesh with optional per-vertex attributes.

use thiserror::Error;

use crate::{Aabb, Rgba, Vec3};

/// Structural errors raised when a mesh would violate its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// A per-vertex attribute does not have one entry per vertex.
    #[error("{attribute} has {actual} entries, expected {expected}")]
    AttributeLength {
        /// Attribute name (`normals`, `uvs`, `colors`).
        attribute: &'static str,
        /// Number of vertices in the mesh.
        expected: usize,
        /// Number of entries supplied.
        actual: usize,
    },
    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {index} (vertex count {vertex_count})")]
    IndexOutOfRange {
        /// Triangle ordinal.
        triangle: usize,
        /// Offending vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
}

/// Indexed triangle mesh.
///
/// Invariants (checked on every constructor and setter):
/// - `normals`, `uvs`, and `colors`, when present, have exactly
///   `vertex_count()` entries.
/// - Every triangle index is `< vertex_count()`.
///
/// `version` starts at zero and is bumped by [`Mesh::commit`]; renderers
/// compare it against the last version they uploaded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    name: String,
    positions: Vec<[f32; 3]>,
    normals: Option<Vec<[f32; 3]>>,
    uvs: Option<Vec<[f32; 2]>>,
    colors: Option<Vec<Rgba>>,
    triangles: Vec<[u32; 3]>,
    bounds: Option<Aabb>,
    version: u64,
}

impl Mesh {
    /// Creates a mesh from positions and triangles. Bounds are computed
    /// immediately.
    pub fn new(
        name: impl Into<String>,
        positions: Vec<[f32; 3]>,
        triangles: Vec<[u32; 3]>,
    ) -> Result<Self, MeshError> {
        check_triangles(&triangles, positions.len())?;
        let bounds = Aabb::from_points(&positions);
        Ok(Self {
            name: name.into(),
            positions,
            normals: None,
            uvs: None,
            colors: None,
            triangles,
            bounds,
            version: 0,
        })
    }

    /// Attaches per-vertex normals.
    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Result<Self, MeshError> {
        check_len("normals", self.positions.len(), normals.len())?;
        self.normals = Some(normals);
        Ok(self)
    }

    /// Attaches per-vertex texture coordinates.
    pub fn with_uvs(mut self, uvs: Vec<[f32; 2]>) -> Result<Self, MeshError> {
        check_len("uvs", self.positions.len(), uvs.len())?;
        self.uvs = Some(uvs);
        Ok(self)
    }

    /// Attaches per-vertex colors.
    pub fn with_colors(mut self, colors: Vec<Rgba>) -> Result<Self, MeshError> {
        self.set_colors(colors)?;
        Ok(self)
    }

    /// Mesh name (diagnostics only).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the mesh.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Vertex positions in mesh-local space.
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Position of vertex `index` as a vector.
    pub fn position(&self, index: usize) -> Option<Vec3> {
        self.positions.get(index).copied().map(Vec3::from)
    }

    /// Per-vertex normals, if present.
    pub fn normals(&self) -> Option<&[[f32; 3]]> {
        self.normals.as_deref()
    }

    /// Per-vertex UVs, if present.
    pub fn uvs(&self) -> Option<&[[f32; 2]]> {
        self.uvs.as_deref()
    }

    /// Per-vertex colors, if present.
    pub fn colors(&self) -> Option<&[Rgba]> {
        self.colors.as_deref()
    }

    /// Mutable access to the color buffer for in-place recoloring.
    ///
    /// The buffer length cannot change through this slice, so the invariant
    /// holds. Call [`Mesh::commit`] afterwards so renderers notice.
    pub fn colors_mut(&mut self) -> Option<&mut [Rgba]> {
        self.colors.as_deref_mut()
    }

    /// Replaces the color buffer.
    pub fn set_colors(&mut self, colors: Vec<Rgba>) -> Result<(), MeshError> {
        check_len("colors", self.positions.len(), colors.len())?;
        self.colors = Some(colors);
        Ok(())
    }

    /// Fills the color buffer with `fill` when the mesh has none. Returns
    /// `true` if a buffer was created.
    pub fn ensure_colors(&mut self, fill: Rgba) -> bool {
        if self.colors.is_some() {
            return false;
        }
        self.colors = Some(vec![fill; self.positions.len()]);
        true
    }

    /// Triangle index triples.
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Replaces the triangle list; the vertex buffers are left untouched.
    pub fn set_triangles(&mut self, triangles: Vec<[u32; 3]>) -> Result<(), MeshError> {
        check_triangles(&triangles, self.positions.len())?;
        self.triangles = triangles;
        Ok(())
    }

    /// Cached bounds; `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Recomputes the cached bounds from the positions.
    pub fn recalculate_bounds(&mut self) {
        self.bounds = Aabb::from_points(&self.positions);
    }

    /// Replaces the normals with area-weighted vertex normals computed from
    /// the triangle list. Vertices referenced by no triangle get a zero normal.
    pub fn recalculate_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.positions.len()];
        for tri in &self.triangles {
            let [a, b, c] = tri.map(|i| Vec3::from(self.positions[i as usize]));
            // Unnormalised: magnitude is twice the triangle area.
            let face = b.sub(&a).cross(&c.sub(&a));
            for &i in tri {
                let slot = &mut accum[i as usize];
                *slot = slot.add(&face);
            }
        }
        self.normals = Some(accum.iter().map(|n| n.normalize().to_array()).collect());
    }

    /// Monotonic commit counter.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Marks the current buffers as the state renderers should display.
    pub fn commit(&mut self) -> u64 {
        self.version = self.version.wrapping_add(1);
        self.version
    }

    /// Re-checks every invariant.
    pub fn validate(&self) -> Result<(), MeshError> {
        let n = self.positions.len();
        if let Some(normals) = &self.normals {
            check_len("normals", n, normals.len())?;
        }
        if let Some(uvs) = &self.uvs {
            check_len("uvs", n, uvs.len())?;
        }
        if let Some(colors) = &self.colors {
            check_len("colors", n, colors.len())?;
        }
        check_triangles(&self.triangles, n)
    }
}

fn check_len(attribute: &'static str, expected: usize, actual: usize) -> Result<(), MeshError> {
    if expected == actual {
        Ok(())
    } else {
        Err(MeshError::AttributeLength {
            attribute,
            expected,
            actual,
        })
    }
}

fn check_triangles(triangles: &[[u32; 3]], vertex_count: usize) -> Result<(), MeshError> {
    for (triangle, tri) in triangles.iter().enumerate() {
        if let Some(&index) = tri.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::IndexOutOfRange {
                triangle,
                index,
                vertex_count,
            });
        }
    }
    Ok(())
}
