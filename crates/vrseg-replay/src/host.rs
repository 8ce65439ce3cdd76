// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Headless host: procedural meshes in, JSON lines out.

use std::collections::BTreeMap;
use std::io::Write;

use tracing::{debug, info};
use vrseg_core::{DetachedId, DetachedMesh, HostError, ObjectId, SessionHost};
use vrseg_mesh::{Mesh, MeshError};
use vrseg_proto::{wire, LoadScene, OutboundMessage};

/// Flat `n x n` vertex grid, spaced 1.0 apart in the XZ plane.
#[allow(clippy::cast_precision_loss)]
pub fn grid_mesh(name: &str, n: u32) -> Result<Mesh, MeshError> {
    let n = n.max(2);
    let mut positions = Vec::with_capacity((n * n) as usize);
    for z in 0..n {
        for x in 0..n {
            positions.push([x as f32, 0.0, z as f32]);
        }
    }
    let mut triangles = Vec::with_capacity(((n - 1) * (n - 1) * 2) as usize);
    for z in 0..n - 1 {
        for x in 0..n - 1 {
            let i = z * n + x;
            triangles.push([i, i + n, i + 1]);
            triangles.push([i + 1, i + n, i + n + 1]);
        }
    }
    Mesh::new(name, positions, triangles)
}

/// Writes outbound messages as JSON lines to `out`.
pub struct ReplayHost<W> {
    out: W,
    grid: u32,
    meshes: BTreeMap<ObjectId, Mesh>,
    detached: BTreeMap<DetachedId, DetachedMesh>,
    next_detached: u64,
    presents: usize,
}

impl<W: Write> ReplayHost<W> {
    /// Creates a host that builds `grid x grid` meshes.
    pub fn new(out: W, grid: u32) -> Self {
        Self {
            out,
            grid,
            meshes: BTreeMap::new(),
            detached: BTreeMap::new(),
            next_detached: 0,
            presents: 0,
        }
    }

    /// Objects in the current scene.
    pub fn objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.meshes.keys().copied()
    }

    /// Live detached objects.
    pub fn detached_count(&self) -> usize {
        self.detached.len()
    }

    /// Number of mesh uploads requested.
    pub fn presents(&self) -> usize {
        self.presents
    }

    /// Output sink.
    pub fn out_mut(&mut self) -> &mut W {
        &mut self.out
    }
}

impl<W: Write> SessionHost for ReplayHost<W> {
    fn object_mesh(&self, object: ObjectId) -> Option<Mesh> {
        self.meshes.get(&object).cloned()
    }

    fn present_mesh(&mut self, object: ObjectId, mesh: &Mesh) {
        self.presents += 1;
        debug!(%object, version = mesh.version(), triangles = mesh.triangle_count(), "present");
    }

    fn load_scene(&mut self, scene: &LoadScene) -> Result<(), HostError> {
        let fail = |e: MeshError| HostError::SceneLoad {
            scene: scene.scene_name.clone(),
            reason: e.to_string(),
        };
        self.meshes.clear();
        if scene.objects.is_empty() {
            self.meshes
                .insert(ObjectId(0), grid_mesh(&scene.scene_name, self.grid).map_err(fail)?);
        }
        for obj in &scene.objects {
            let Ok(id) = u64::try_from(obj.id) else {
                debug!(id = obj.id, "skipping object with negative id");
                continue;
            };
            self.meshes
                .insert(ObjectId(id), grid_mesh(&obj.name, self.grid).map_err(fail)?);
        }
        info!(scene = %scene.scene_name, objects = self.meshes.len(), "scene geometry ready");
        Ok(())
    }

    fn send(&mut self, message: &OutboundMessage) -> Result<(), HostError> {
        let line = wire::encode_outbound(message).map_err(|e| HostError::Other(e.to_string()))?;
        writeln!(self.out, "{line}").map_err(|_| HostError::TransportClosed)
    }

    fn spawn_detached(&mut self, detached: DetachedMesh) -> Result<DetachedId, HostError> {
        self.next_detached += 1;
        let id = DetachedId(self.next_detached);
        info!(
            name = %detached.name,
            vertices = detached.mesh.vertex_count(),
            triangles = detached.mesh.triangle_count(),
            "spawned detached mesh"
        );
        self.detached.insert(id, detached);
        Ok(id)
    }

    fn destroy_detached(&mut self, id: DetachedId) {
        self.detached.remove(&id);
    }
}
