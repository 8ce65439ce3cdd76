// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
//! Integration tests for the picking math (local-to-world transforms, bounds).

use core::f32::consts::FRAC_PI_2;
use vrseg_mesh::{Aabb, Mat4, Vec3};

fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
}

#[test]
fn trs_composition_applies_scale_then_rotation_then_translation() {
    let m = Mat4::translation(10.0, 0.0, 0.0)
        .multiply(&Mat4::rotation_y(FRAC_PI_2))
        .multiply(&Mat4::scale(2.0, 2.0, 2.0));
    // +Z scaled to 2, rotated by yaw 90° onto +X, then shifted.
    let p = m.transform_point(&Vec3::new(0.0, 0.0, 1.0));
    assert!(approx(p.to_array(), [12.0, 0.0, 0.0]), "got {p:?}");
}

#[test]
fn directions_ignore_translation() {
    let m = Mat4::translation(5.0, 5.0, 5.0);
    let d = m.transform_direction(&Vec3::new(0.0, 1.0, 0.0));
    assert_eq!(d.to_array(), [0.0, 1.0, 0.0]);
}

#[test]
fn mul_operator_matches_multiply() {
    let a = Mat4::scale(1.0, 2.0, 3.0);
    let b = Mat4::translation(1.0, 1.0, 1.0);
    assert_eq!((a * b).to_array(), a.multiply(&b).to_array());
}

#[test]
fn distance_is_symmetric() {
    let a = Vec3::new(0.0, 0.0, 0.0);
    let b = Vec3::new(0.3, 0.4, 0.0);
    assert!((a.distance(&b) - 0.5).abs() < 1e-6);
    assert!((b.distance(&a) - 0.5).abs() < 1e-6);
}

#[test]
fn degenerate_vectors_normalize_to_zero() {
    assert_eq!(Vec3::new(1e-9, 0.0, 0.0).normalize(), Vec3::ZERO);
}

#[test]
fn aabb_rejects_inverted_corners_and_empty_point_sets() {
    assert!(Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO).is_none());
    let none: [[f32; 3]; 0] = [];
    assert!(Aabb::from_points(&none).is_none());
}

#[test]
fn aabb_from_points_contains_every_point() {
    let pts = [[-1.0, 2.0, 0.5], [3.0, -4.0, 0.0], [0.0, 0.0, 9.0]];
    let b = Aabb::from_points(&pts).unwrap();
    for p in &pts {
        assert!(b.contains(&Vec3::from(*p)));
    }
    assert_eq!(b.center().to_array(), [1.0, -1.0, 4.5]);
}
