// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mesh model for the VR segmentation client.
//!
//! This crate provides:
//! - Deterministic float32 vector/matrix math (`Vec3`, `Mat4`).
//! - Axis-aligned bounds (`Aabb`).
//! - The `Mesh` value type (positions, optional normals/UVs/colors, triangles)
//!   with validation and bounds/normal recomputation.
//!
//! # Design
//!
//! A `Mesh` is an explicitly owned buffer. Every committed mutation bumps its
//! `version`, which is what a rendering layer polls to pick up changes.

mod aabb;
mod color;
pub mod math;
mod mesh;

pub use aabb::Aabb;
pub use color::Rgba;
pub use math::{Mat4, Vec3};
pub use mesh::{Mesh, MeshError};
