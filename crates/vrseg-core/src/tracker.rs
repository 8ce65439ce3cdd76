// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-object labeling state: pristine mesh, working copy, and mask.
//!
//! Each object gets exactly one working copy, created on first interaction.
//! Every later edit mutates that copy in place and bumps its version so the
//! host knows to re-upload.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info, warn};
use vrseg_mesh::{Mat4, Mesh, MeshError, Rgba, Vec3};

use crate::assembler::MaskUpdate;
use crate::config::PaintSettings;
use crate::labels::{LabelTable, PaintLabel};
use crate::mask::{Recolor, VertexLabelMask};
use crate::ObjectId;

/// Errors raised by the tracker.
#[derive(Debug, Error, PartialEq)]
pub enum TrackerError {
    /// The object has no labeling state.
    #[error("object {0} is not being labeled")]
    NotTracked(ObjectId),
    /// The paint selector names a label missing from the table.
    #[error("label {0} is not in the label table")]
    UnknownLabel(usize),
    /// A mesh edit was rejected.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Result of a paint action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOutcome {
    /// No vertex lies within the search distance of the hit.
    NoVertexInRange,
    /// At least the nearest vertex was painted.
    Painted {
        /// Vertex nearest the hit; reported to the server.
        nearest: usize,
        /// Number of vertices written.
        painted: usize,
        /// Mask value written.
        label: i32,
    },
}

#[derive(Debug, Clone)]
struct TrackedObject {
    original: Mesh,
    working: Mesh,
    mask: VertexLabelMask,
}

/// Owns labeling state for every object the user has touched.
#[derive(Debug, Default)]
pub struct VertexInteractionTracker {
    objects: BTreeMap<ObjectId, TrackedObject>,
    active: Option<ObjectId>,
    settings: PaintSettings,
}

impl VertexInteractionTracker {
    /// Creates an empty tracker.
    pub fn new(settings: PaintSettings) -> Self {
        Self {
            objects: BTreeMap::new(),
            active: None,
            settings,
        }
    }

    /// Paint settings in effect.
    pub fn settings(&self) -> &PaintSettings {
        &self.settings
    }

    /// Replaces the paint settings.
    pub fn set_settings(&mut self, settings: PaintSettings) {
        self.settings = settings;
    }

    /// Object most recently interacted with.
    pub fn active(&self) -> Option<ObjectId> {
        self.active
    }

    /// Whether `object` has labeling state.
    pub fn is_tracked(&self, object: ObjectId) -> bool {
        self.objects.contains_key(&object)
    }

    /// Tracked objects in id order.
    pub fn tracked(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    /// Makes a tracked object the active one. Returns `false` if `object` has
    /// no labeling state yet.
    pub fn focus(&mut self, object: ObjectId) -> bool {
        if self.objects.contains_key(&object) {
            self.active = Some(object);
            true
        } else {
            false
        }
    }

    /// Starts (or resumes) labeling `object`.
    ///
    /// On first interaction `mesh` is cloned twice: once as the restore
    /// point and once as the working copy, which is given a color buffer
    /// filled with `fill` if it lacks one. Returns `true` when new state was
    /// created.
    pub fn begin_interaction(&mut self, object: ObjectId, mesh: &Mesh, fill: Rgba) -> bool {
        self.active = Some(object);
        if self.objects.contains_key(&object) {
            return false;
        }
        let mut working = mesh.clone();
        working.set_name(format!("{} (labeled)", mesh.name()));
        working.ensure_colors(fill);
        working.commit();
        info!(%object, vertices = mesh.vertex_count(), "labeling started");
        self.objects.insert(
            object,
            TrackedObject {
                original: mesh.clone(),
                mask: VertexLabelMask::new(mesh.vertex_count()),
                working,
            },
        );
        true
    }

    /// Vertex nearest to `hit_world`, compared in world space.
    ///
    /// Only vertices within `max_vertex_search_distance` qualify. Ties keep
    /// the lowest index.
    pub fn find_nearest(
        &self,
        object: ObjectId,
        hit_world: Vec3,
        local_to_world: &Mat4,
    ) -> Result<Option<usize>, TrackerError> {
        let tracked = self.get(object)?;
        let max = self.settings.max_vertex_search_distance;
        let mut best: Option<(usize, f32)> = None;
        for (i, p) in tracked.working.positions().iter().enumerate() {
            let d = local_to_world.transform_point(&Vec3::from(*p)).distance(&hit_world);
            if d <= max && best.is_none_or(|(_, b)| d < b) {
                best = Some((i, d));
            }
        }
        Ok(best.map(|(i, _)| i))
    }

    /// Paints the vertex nearest the hit, plus its neighbourhood when
    /// `color_multiple_vertices` is set.
    ///
    /// The neighbourhood is every vertex within `vertex_color_radius` of the
    /// nearest vertex, measured in mesh-local space.
    pub fn paint_nearest(
        &mut self,
        object: ObjectId,
        hit_world: Vec3,
        local_to_world: &Mat4,
        label: PaintLabel,
        labels: &LabelTable,
    ) -> Result<PaintOutcome, TrackerError> {
        let color = match label {
            PaintLabel::Label(i) => labels
                .get(i)
                .map(|l| l.color)
                .ok_or(TrackerError::UnknownLabel(i))?,
            PaintLabel::Background => labels.background(),
        };
        let Some(nearest) = self.find_nearest(object, hit_world, local_to_world)? else {
            debug!(%object, "no vertex within search distance");
            return Ok(PaintOutcome::NoVertexInRange);
        };

        let settings = self.settings.clone();
        let tracked = self.get_mut(object)?;
        let targets: Vec<usize> = if settings.color_multiple_vertices {
            let positions = tracked.working.positions();
            let center = Vec3::from(positions[nearest]);
            positions
                .iter()
                .enumerate()
                .filter(|(_, p)| Vec3::from(**p).distance(&center) <= settings.vertex_color_radius)
                .map(|(i, _)| i)
                .collect()
        } else {
            vec![nearest]
        };

        let value = label.mask_value();
        tracked.mask.set_range(targets.iter().map(|&i| (i, value)));
        if let Some(colors) = tracked.working.colors_mut() {
            for &i in &targets {
                if let Some(c) = colors.get_mut(i) {
                    *c = color;
                }
            }
        }
        tracked.working.commit();
        self.active = Some(object);
        debug!(%object, nearest, painted = targets.len(), label = value, "painted");
        Ok(PaintOutcome::Painted {
            nearest,
            painted: targets.len(),
            label: value,
        })
    }

    /// Writes a streamed mask range. Colors are not touched until
    /// [`Self::on_stream_complete`].
    pub fn apply_remote_range(
        &mut self,
        object: ObjectId,
        update: &MaskUpdate,
    ) -> Result<usize, TrackerError> {
        let tracked = self.get_mut(object)?;
        let written = update.apply_to(&mut tracked.mask);
        let requested = update.end_index.saturating_sub(update.start_index);
        if written < requested {
            warn!(
                %object,
                chunk = update.chunk_index,
                requested,
                written,
                mask_len = tracked.mask.len(),
                "mask range truncated"
            );
        }
        Ok(written)
    }

    /// Pushes the whole mask into the working copy's colors.
    pub fn on_stream_complete(
        &mut self,
        object: ObjectId,
        labels: &LabelTable,
    ) -> Result<Recolor, TrackerError> {
        let tracked = self.get_mut(object)?;
        let report = tracked.mask.apply_to_mesh_colors(&mut tracked.working, labels);
        tracked.working.commit();
        info!(%object, recolored = report.recolored, "mask applied to mesh");
        Ok(report)
    }

    /// Replaces the working copy's triangles, keeping all vertex data.
    pub fn retain_triangles(
        &mut self,
        object: ObjectId,
        triangles: Vec<[u32; 3]>,
    ) -> Result<(), TrackerError> {
        let tracked = self.get_mut(object)?;
        tracked.working.set_triangles(triangles)?;
        tracked.working.recalculate_bounds();
        tracked.working.commit();
        Ok(())
    }

    /// Drops labeling state for `object` and returns its pristine mesh.
    pub fn restore(&mut self, object: ObjectId) -> Option<Mesh> {
        let tracked = self.objects.remove(&object)?;
        if self.active == Some(object) {
            self.active = None;
        }
        info!(%object, "labeling state discarded");
        Some(tracked.original)
    }

    /// Drops all labeling state; returns every pristine mesh.
    pub fn reset_all(&mut self) -> Vec<(ObjectId, Mesh)> {
        self.active = None;
        let restored: Vec<_> = std::mem::take(&mut self.objects)
            .into_iter()
            .map(|(id, t)| (id, t.original))
            .collect();
        if !restored.is_empty() {
            info!(objects = restored.len(), "all labeling state discarded");
        }
        restored
    }

    /// Current mask for `object`.
    pub fn mask(&self, object: ObjectId) -> Option<&VertexLabelMask> {
        self.objects.get(&object).map(|t| &t.mask)
    }

    /// Edited mesh for `object`.
    pub fn working_mesh(&self, object: ObjectId) -> Option<&Mesh> {
        self.objects.get(&object).map(|t| &t.working)
    }

    /// Pristine mesh for `object`.
    pub fn original_mesh(&self, object: ObjectId) -> Option<&Mesh> {
        self.objects.get(&object).map(|t| &t.original)
    }

    fn get(&self, object: ObjectId) -> Result<&TrackedObject, TrackerError> {
        self.objects.get(&object).ok_or(TrackerError::NotTracked(object))
    }

    fn get_mut(&mut self, object: ObjectId) -> Result<&mut TrackedObject, TrackerError> {
        self.objects
            .get_mut(&object)
            .ok_or(TrackerError::NotTracked(object))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn strip() -> Mesh {
        // Vertices along +X at 0.0, 0.3, 0.6, 1.5.
        Mesh::new(
            "strip",
            vec![[0.0, 0.0, 0.0], [0.3, 0.0, 0.0], [0.6, 0.0, 0.0], [1.5, 0.0, 0.0]],
            vec![[0, 1, 2], [1, 2, 3]],
        )
        .unwrap()
    }

    fn tracker(multi: bool) -> VertexInteractionTracker {
        VertexInteractionTracker::new(PaintSettings {
            color_multiple_vertices: multi,
            ..PaintSettings::default()
        })
    }

    #[test]
    fn first_interaction_creates_white_working_copy() {
        let mut t = tracker(true);
        let id = ObjectId(1);
        assert!(t.begin_interaction(id, &strip(), Rgba::WHITE));
        assert!(!t.begin_interaction(id, &strip(), Rgba::WHITE));
        let working = t.working_mesh(id).unwrap();
        assert!(working.colors().unwrap().iter().all(|c| *c == Rgba::WHITE));
        assert!(t.original_mesh(id).unwrap().colors().is_none());
        assert_eq!(t.mask(id).unwrap().labeled_count(), 0);
    }

    #[test]
    fn nearest_uses_world_space() {
        let mut t = tracker(false);
        let id = ObjectId(1);
        t.begin_interaction(id, &strip(), Rgba::WHITE);
        let shift = Mat4::translation(10.0, 0.0, 0.0);
        let hit = Vec3::new(10.55, 0.0, 0.0);
        assert_eq!(t.find_nearest(id, hit, &shift).unwrap(), Some(2));
        assert_eq!(t.find_nearest(id, hit, &Mat4::identity()).unwrap(), None);
    }

    #[test]
    fn radius_paint_is_local_space() {
        let mut t = tracker(true);
        let id = ObjectId(1);
        t.begin_interaction(id, &strip(), Rgba::WHITE);
        let out = t
            .paint_nearest(
                id,
                Vec3::new(0.0, 0.0, 0.0),
                &Mat4::identity(),
                PaintLabel::Label(1),
                &LabelTable::default(),
            )
            .unwrap();
        assert_eq!(
            out,
            PaintOutcome::Painted {
                nearest: 0,
                painted: 2,
                label: 1
            }
        );
        assert_eq!(t.mask(id).unwrap().as_slice(), &[1, 1, -1, -1]);
        let colors = t.working_mesh(id).unwrap().colors().unwrap();
        assert_eq!(colors[1], Rgba::GREEN);
        assert_eq!(colors[2], Rgba::WHITE);
    }

    #[test]
    fn background_paint_unlabels() {
        let mut t = tracker(false);
        let id = ObjectId(1);
        let labels = LabelTable::default();
        t.begin_interaction(id, &strip(), Rgba::WHITE);
        t.paint_nearest(id, Vec3::ZERO, &Mat4::identity(), PaintLabel::Label(0), &labels)
            .unwrap();
        t.paint_nearest(id, Vec3::ZERO, &Mat4::identity(), PaintLabel::Background, &labels)
            .unwrap();
        assert_eq!(t.mask(id).unwrap().get(0), Some(-1));
        assert_eq!(t.working_mesh(id).unwrap().colors().unwrap()[0], Rgba::WHITE);
    }

    #[test]
    fn unknown_label_is_rejected_before_painting() {
        let mut t = tracker(false);
        let id = ObjectId(1);
        t.begin_interaction(id, &strip(), Rgba::WHITE);
        let err = t
            .paint_nearest(id, Vec3::ZERO, &Mat4::identity(), PaintLabel::Label(9), &LabelTable::default())
            .unwrap_err();
        assert_eq!(err, TrackerError::UnknownLabel(9));
        assert_eq!(t.mask(id).unwrap().labeled_count(), 0);
    }

    #[test]
    fn edits_bump_version() {
        let mut t = tracker(false);
        let id = ObjectId(1);
        t.begin_interaction(id, &strip(), Rgba::WHITE);
        let v0 = t.working_mesh(id).unwrap().version();
        t.paint_nearest(id, Vec3::ZERO, &Mat4::identity(), PaintLabel::Label(0), &LabelTable::default())
            .unwrap();
        assert!(t.working_mesh(id).unwrap().version() > v0);
    }

    #[test]
    fn restore_returns_original_and_clears_active() {
        let mut t = tracker(false);
        let id = ObjectId(4);
        t.begin_interaction(id, &strip(), Rgba::WHITE);
        let original = t.restore(id).unwrap();
        assert_eq!(original, strip());
        assert_eq!(t.active(), None);
        assert!(t.restore(id).is_none());
        assert_eq!(
            t.apply_remote_range(id, &MaskUpdate {
                chunk_index: 0,
                start_index: 0,
                end_index: 1,
                values: vec![0],
            }),
            Err(TrackerError::NotTracked(id))
        );
    }
}
