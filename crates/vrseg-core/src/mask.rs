// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-vertex label storage.

use vrseg_mesh::Mesh;

use crate::labels::{LabelTable, BACKGROUND};

/// Result of a bulk write into a mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeWrite {
    /// Entries stored.
    pub written: usize,
    /// Entries dropped because their index was past the end of the mask.
    pub skipped: usize,
}

/// Result of pushing mask labels into a mesh's vertex colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Recolor {
    /// Vertices whose color was overwritten with a label color.
    pub recolored: usize,
    /// Labeled vertices whose label has no entry in the table.
    pub unknown_labels: usize,
}

/// One label per vertex; -1 is background.
///
/// The length is fixed at construction and matches the vertex count of the
/// mesh it labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLabelMask {
    values: Vec<i32>,
}

impl VertexLabelMask {
    /// A mask of `vertex_count` background entries.
    pub fn new(vertex_count: usize) -> Self {
        Self {
            values: vec![BACKGROUND; vertex_count],
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the mask covers zero vertices.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Label at `index`.
    pub fn get(&self, index: usize) -> Option<i32> {
        self.values.get(index).copied()
    }

    /// Raw view of all labels.
    pub fn as_slice(&self) -> &[i32] {
        &self.values
    }

    /// Number of entries that are not background.
    pub fn labeled_count(&self) -> usize {
        self.values.iter().filter(|&&v| v >= 0).count()
    }

    /// Writes one entry; out-of-range indices are ignored and reported as `false`.
    pub fn set(&mut self, index: usize, label: i32) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = label;
                true
            }
            None => false,
        }
    }

    /// Writes every `(index, label)` pair, skipping indices past the end.
    pub fn set_range<I>(&mut self, writes: I) -> RangeWrite
    where
        I: IntoIterator<Item = (usize, i32)>,
    {
        let mut report = RangeWrite::default();
        for (index, label) in writes {
            if self.set(index, label) {
                report.written += 1;
            } else {
                report.skipped += 1;
            }
        }
        report
    }

    /// Writes `values` into `[start, end)`.
    ///
    /// Writing stops at whichever comes first: `end`, the mask length, or the
    /// end of `values`. Returns how many entries were written.
    pub fn apply_range(&mut self, start: usize, end: usize, values: &[i32]) -> usize {
        let end = end.min(self.values.len());
        if start >= end {
            return 0;
        }
        let n = (end - start).min(values.len());
        self.values[start..start + n].copy_from_slice(&values[..n]);
        n
    }

    /// Overwrites the colors of labeled vertices with their label color.
    ///
    /// Background entries keep whatever color the mesh already has. A mesh
    /// without a color buffer is given one filled with the table background.
    /// Entries past the mesh's vertex count are ignored. The caller commits.
    pub fn apply_to_mesh_colors(&self, mesh: &mut Mesh, labels: &LabelTable) -> Recolor {
        mesh.ensure_colors(labels.background());
        let mut report = Recolor::default();
        let Some(colors) = mesh.colors_mut() else {
            return report;
        };
        for (color, &label) in colors.iter_mut().zip(&self.values) {
            if label < 0 {
                continue;
            }
            match labels.for_mask_value(label) {
                Some(l) => {
                    *color = l.color;
                    report.recolored += 1;
                }
                None => report.unknown_labels += 1,
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vrseg_mesh::Rgba;

    fn quad() -> Mesh {
        Mesh::new(
            "quad",
            vec![[0.0; 3], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn new_mask_is_all_background() {
        let mask = VertexLabelMask::new(3);
        assert_eq!(mask.as_slice(), &[-1, -1, -1]);
        assert_eq!(mask.labeled_count(), 0);
    }

    #[test]
    fn set_range_reports_skips() {
        let mut mask = VertexLabelMask::new(2);
        let report = mask.set_range([(0, 1), (5, 2), (1, 0)]);
        assert_eq!(report, RangeWrite { written: 2, skipped: 1 });
        assert_eq!(mask.as_slice(), &[1, 0]);
    }

    #[test]
    fn apply_range_clamps_to_mask_and_payload() {
        let mut mask = VertexLabelMask::new(4);
        assert_eq!(mask.apply_range(2, 10, &[7, 8, 9]), 2);
        assert_eq!(mask.as_slice(), &[-1, -1, 7, 8]);
        assert_eq!(mask.apply_range(0, 4, &[1]), 1);
        assert_eq!(mask.as_slice(), &[1, -1, 7, 8]);
        assert_eq!(mask.apply_range(3, 3, &[5]), 0);
        assert_eq!(mask.apply_range(9, 12, &[5]), 0);
    }

    #[test]
    fn colors_skip_background_and_unknown_labels() {
        let mut mesh = quad();
        let mut mask = VertexLabelMask::new(4);
        mask.set(0, 0);
        mask.set(1, 2);
        mask.set(3, 99);
        let report = mask.apply_to_mesh_colors(&mut mesh, &LabelTable::default());
        assert_eq!(report.recolored, 2);
        assert_eq!(report.unknown_labels, 1);
        let colors = mesh.colors().unwrap();
        assert_eq!(colors[0], Rgba::RED);
        assert_eq!(colors[1], Rgba::BLUE);
        assert_eq!(colors[2], Rgba::WHITE);
        assert_eq!(colors[3], Rgba::WHITE);
    }
}
