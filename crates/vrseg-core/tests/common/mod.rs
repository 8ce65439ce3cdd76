// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use base64::Engine as _;
use vrseg_mesh::Mesh;
use vrseg_proto::MaskChunk;

/// Encodes mask values (-1 = background) the way the server does.
pub fn encode_mask(values: &[i32]) -> String {
    let bytes: Vec<u8> = values
        .iter()
        .map(|&v| u8::try_from(v + 1).unwrap())
        .collect();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Splits `values` into chunks of at most `size` entries.
pub fn split(values: &[i32], size: usize) -> Vec<MaskChunk> {
    let total = values.len().div_ceil(size) as u32;
    values
        .chunks(size)
        .enumerate()
        .map(|(i, part)| {
            let start = (i * size) as u32;
            MaskChunk {
                chunk_index: i as u32,
                total_chunks: total,
                start_index: start,
                end_index: start + part.len() as u32,
                data: encode_mask(part),
                compressed: false,
            }
        })
        .collect()
}

/// Flat grid of `n x n` vertices spaced 1.0 apart in the XZ plane.
pub fn grid(n: u32) -> Mesh {
    let mut positions = Vec::new();
    for z in 0..n {
        for x in 0..n {
            positions.push([x as f32, 0.0, z as f32]);
        }
    }
    let mut triangles = Vec::new();
    for z in 0..n - 1 {
        for x in 0..n - 1 {
            let i = z * n + x;
            triangles.push([i, i + n, i + 1]);
            triangles.push([i + 1, i + n, i + n + 1]);
        }
    }
    Mesh::new("grid", positions, triangles).unwrap()
}

/// The two-triangle quad `{(0,1,2), (1,2,3)}`.
pub fn quad() -> Mesh {
    Mesh::new(
        "quad",
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 1.0]],
        vec![[0, 1, 2], [1, 2, 3]],
    )
    .unwrap()
    .with_uvs(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]])
    .unwrap()
}
