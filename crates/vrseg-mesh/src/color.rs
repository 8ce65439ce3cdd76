// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

/// Linear RGBA color with `f32` components in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    /// Opaque white; the default color of unpainted vertices.
    pub const WHITE: Self = Self([1.0, 1.0, 1.0, 1.0]);
    /// Opaque red.
    pub const RED: Self = Self([1.0, 0.0, 0.0, 1.0]);
    /// Opaque green.
    pub const GREEN: Self = Self([0.0, 1.0, 0.0, 1.0]);
    /// Opaque blue.
    pub const BLUE: Self = Self([0.0, 0.0, 1.0, 1.0]);
    /// Opaque yellow (slightly warm, matching common engine palettes).
    pub const YELLOW: Self = Self([1.0, 0.92, 0.016, 1.0]);
    /// Opaque cyan.
    pub const CYAN: Self = Self([0.0, 1.0, 1.0, 1.0]);

    /// Creates a color from components.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([r, g, b, a])
    }

    /// Returns the components as an array.
    pub fn to_array(self) -> [f32; 4] {
        self.0
    }
}

impl From<[f32; 4]> for Rgba {
    fn from(value: [f32; 4]) -> Self {
        Self(value)
    }
}
