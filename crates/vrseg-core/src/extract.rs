// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Partitioning a labeled mesh into one submesh per label.
//!
//! A triangle belongs to a label only when all three of its vertices carry
//! that label. Triangles that straddle labels, or touch background, stay in
//! the source. Triangles whose vertices all belong to emitted labels but mix
//! them are dropped from the source and appear in no submesh.

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, warn};
use vrseg_mesh::{Mesh, MeshError, Rgba};

use crate::labels::LabelTable;
use crate::mask::VertexLabelMask;

/// Reasons extraction cannot start.
#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    /// The mesh has never been labeled.
    #[error("mesh `{0}` has not been labeled")]
    NotLabeled(String),
    /// The mask does not cover the mesh's vertices.
    #[error("mask has {mask} entries but mesh has {vertices} vertices")]
    MaskMismatch {
        /// Mask length.
        mask: usize,
        /// Mesh vertex count.
        vertices: usize,
    },
    /// Building a submesh failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// How detached vertices are colored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Copy the source mesh's vertex colors.
    #[default]
    Original,
    /// Fill with the label's color.
    LabelColor,
}

/// Vertices sharing one label, in first-occurrence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelGroup {
    /// Mask value.
    pub label: i32,
    /// Source vertex indices carrying the label, ascending.
    pub vertices: Vec<usize>,
}

/// One emitted submesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Submesh {
    /// Mask value the submesh was built from.
    pub label: i32,
    /// Compact mesh holding only this label's complete triangles.
    pub mesh: Mesh,
    /// `source_vertices[new] == old`.
    pub source_vertices: Vec<usize>,
}

/// Output of one extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Emitted submeshes, in label first-occurrence order.
    pub submeshes: Vec<Submesh>,
    /// Labels whose vertices form no complete triangle. Labels whose
    /// vertices no triangle references at all are left out.
    pub empty_labels: Vec<i32>,
    /// Source triangles that remain after detaching.
    pub residual_triangles: Vec<[u32; 3]>,
    /// Source triangles removed.
    pub removed_triangles: usize,
}

impl Extraction {
    /// Whether any submesh was produced.
    pub fn is_empty(&self) -> bool {
        self.submeshes.is_empty()
    }

    /// Copy of `source` reduced to the residual triangles. Vertex buffers are
    /// kept whole so indices stay valid.
    pub fn residual_mesh(&self, source: &Mesh) -> Result<Mesh, MeshError> {
        let mut mesh = source.clone();
        mesh.set_triangles(self.residual_triangles.clone())?;
        mesh.recalculate_bounds();
        Ok(mesh)
    }
}

/// Splits labeled meshes into per-label submeshes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmeshExtractor {
    colors: ColorMode,
}

impl SubmeshExtractor {
    /// Creates an extractor.
    pub fn new(colors: ColorMode) -> Self {
        Self { colors }
    }

    /// Color mode in effect.
    pub fn color_mode(&self) -> ColorMode {
        self.colors
    }

    /// Groups labeled vertices by label, ordered by each label's first vertex.
    /// Background is skipped.
    pub fn group_by_label(mask: &VertexLabelMask) -> Vec<LabelGroup> {
        let mut slot: FxHashMap<i32, usize> = FxHashMap::default();
        let mut groups: Vec<LabelGroup> = Vec::new();
        for (v, &label) in mask.as_slice().iter().enumerate() {
            if label < 0 {
                continue;
            }
            let g = *slot.entry(label).or_insert_with(|| {
                groups.push(LabelGroup {
                    label,
                    vertices: Vec::new(),
                });
                groups.len() - 1
            });
            groups[g].vertices.push(v);
        }
        groups
    }

    /// Partitions `mesh` by `mask`.
    ///
    /// The source is not modified; apply [`Extraction::residual_triangles`]
    /// to commit the split.
    pub fn extract(
        &self,
        mesh: &Mesh,
        mask: &VertexLabelMask,
        labels: &LabelTable,
    ) -> Result<Extraction, ExtractError> {
        if mesh.colors().is_none() {
            return Err(ExtractError::NotLabeled(mesh.name().to_owned()));
        }
        if mask.len() != mesh.vertex_count() {
            return Err(ExtractError::MaskMismatch {
                mask: mask.len(),
                vertices: mesh.vertex_count(),
            });
        }

        let groups = Self::group_by_label(mask);
        let slot: FxHashMap<i32, usize> =
            groups.iter().enumerate().map(|(i, g)| (g.label, i)).collect();
        let values = mask.as_slice();

        let mut per_group: Vec<Vec<[u32; 3]>> = vec![Vec::new(); groups.len()];
        let mut referenced = vec![false; mesh.vertex_count()];
        for tri in mesh.triangles() {
            for &i in tri {
                referenced[i as usize] = true;
            }
            let [a, b, c] = tri.map(|i| values[i as usize]);
            if a >= 0 && a == b && b == c {
                if let Some(&g) = slot.get(&a) {
                    per_group[g].push(*tri);
                }
            }
        }

        let mut extracted = vec![false; mesh.vertex_count()];
        let mut submeshes = Vec::new();
        let mut empty_labels = Vec::new();
        for (group, triangles) in groups.iter().zip(per_group) {
            if triangles.is_empty() {
                // Vertices left behind by an earlier detach are not a labeling gap.
                if !group.vertices.iter().any(|&v| referenced[v]) {
                    debug!(label = group.label, "label has no referenced vertices");
                    continue;
                }
                warn!(
                    label = group.label,
                    vertices = group.vertices.len(),
                    "no complete triangles found for label"
                );
                empty_labels.push(group.label);
                continue;
            }
            for &v in &group.vertices {
                extracted[v] = true;
            }
            let sub = self.build_submesh(mesh, group.label, &triangles, labels)?;
            debug!(
                label = group.label,
                vertices = sub.mesh.vertex_count(),
                triangles = sub.mesh.triangle_count(),
                "submesh built"
            );
            submeshes.push(sub);
        }

        let residual_triangles: Vec<[u32; 3]> = mesh
            .triangles()
            .iter()
            .filter(|tri| !tri.iter().all(|&i| extracted[i as usize]))
            .copied()
            .collect();
        let removed_triangles = mesh.triangle_count() - residual_triangles.len();

        Ok(Extraction {
            submeshes,
            empty_labels,
            residual_triangles,
            removed_triangles,
        })
    }

    fn build_submesh(
        &self,
        source: &Mesh,
        label: i32,
        triangles: &[[u32; 3]],
        labels: &LabelTable,
    ) -> Result<Submesh, ExtractError> {
        let mut remap: FxHashMap<u32, u32> = FxHashMap::default();
        let mut source_vertices: Vec<usize> = Vec::new();
        let mut local = Vec::with_capacity(triangles.len());
        for tri in triangles {
            local.push(tri.map(|old| {
                *remap.entry(old).or_insert_with(|| {
                    source_vertices.push(old as usize);
                    u32::try_from(source_vertices.len() - 1).unwrap_or(u32::MAX)
                })
            }));
        }

        let pick3 = |buf: &[[f32; 3]]| source_vertices.iter().map(|&i| buf[i]).collect::<Vec<_>>();
        let label_name = labels
            .for_mask_value(label)
            .map_or_else(|| format!("label{label}"), |l| l.name.clone());
        let mut mesh = Mesh::new(
            format!("{}_{label_name}", source.name()),
            pick3(source.positions()),
            local,
        )?;
        if let Some(normals) = source.normals() {
            mesh = mesh.with_normals(pick3(normals))?;
        } else {
            mesh.recalculate_normals();
        }
        if let Some(uvs) = source.uvs() {
            mesh = mesh.with_uvs(source_vertices.iter().map(|&i| uvs[i]).collect())?;
        }
        let colors: Option<Vec<Rgba>> = match self.colors {
            ColorMode::LabelColor => labels
                .for_mask_value(label)
                .map(|l| vec![l.color; source_vertices.len()]),
            ColorMode::Original => None,
        };
        let colors = colors.or_else(|| {
            source
                .colors()
                .map(|c| source_vertices.iter().map(|&i| c[i]).collect())
        });
        if let Some(colors) = colors {
            mesh = mesh.with_colors(colors)?;
        }

        Ok(Submesh {
            label,
            mesh,
            source_vertices,
        })
    }
}
