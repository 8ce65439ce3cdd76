// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deterministic math helpers used by vertex picking and normal generation.
//!
//! All operations round to `f32` to match the mesh buffers.

mod mat4;
mod vec3;

pub use mat4::Mat4;
pub use vec3::Vec3;

/// Global epsilon used by math routines when detecting degenerate values.
pub const EPSILON: f32 = 1e-6;
