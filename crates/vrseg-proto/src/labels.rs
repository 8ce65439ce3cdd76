// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Label offset convention shared by both directions of the link.
//!
//! On the wire, 0 means background and `k > 0` means label `k - 1`. In the
//! client, -1 means background and `k >= 0` is an index into the label table.

/// Mask value for background / unlabeled vertices.
pub const BACKGROUND: i32 = -1;

/// Converts an inbound wire byte to a mask value.
pub fn wire_to_mask(value: u8) -> i32 {
    i32::from(value) - 1
}

/// Converts a mask value to the `object_id` sent with clicks.
pub fn mask_to_object_id(label: i32) -> i32 {
    label + 1
}
