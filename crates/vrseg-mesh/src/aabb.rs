// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::math::Vec3;

/// Axis-aligned bounding box in mesh-local coordinates.
///
/// Invariant: `min` components are less than or equal to `max` components.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    min: Vec3,
    max: Vec3,
}

impl Aabb {
    /// Constructs an AABB from its minimum and maximum corners, or `None` if
    /// any component of `min` exceeds its counterpart in `max`.
    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Option<Self> {
        let a = min.to_array();
        let b = max.to_array();
        (a[0] <= b[0] && a[1] <= b[1] && a[2] <= b[2]).then_some(Self { min, max })
    }

    /// Returns the minimum corner.
    #[must_use]
    pub fn min(&self) -> Vec3 {
        self.min
    }

    /// Returns the maximum corner.
    #[must_use]
    pub fn max(&self) -> Vec3 {
        self.max
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        self.min.add(&self.max).scale(0.5)
    }

    /// Returns `true` if `point` lies inside or on the box.
    #[must_use]
    pub fn contains(&self, point: &Vec3) -> bool {
        let p = point.to_array();
        let mi = self.min.to_array();
        let ma = self.max.to_array();
        (0..3).all(|i| p[i] >= mi[i] && p[i] <= ma[i])
    }

    /// Builds the minimal AABB that contains all `points`; `None` when empty.
    #[must_use]
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a [f32; 3]>,
    {
        let mut iter = points.into_iter();
        let first = Vec3::from(*iter.next()?);
        let mut min = first;
        let mut max = first;
        for p in iter {
            let mi = min.to_array();
            let ma = max.to_array();
            min = Vec3::new(mi[0].min(p[0]), mi[1].min(p[1]), mi[2].min(p[2]));
            max = Vec3::new(ma[0].max(p[0]), ma[1].max(p[1]), ma[2].max(p[2]));
        }
        Some(Self { min, max })
    }
}
