// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory host for headless testing.
//!
//! `MockHost` records every call so tests can assert on what the controller
//! asked the engine and the network to do.

use std::collections::BTreeMap;

use vrseg_mesh::Mesh;
use vrseg_proto::{LoadScene, OutboundMessage};

use crate::port::{DetachedId, DetachedMesh, HostError, SessionHost};
use crate::ObjectId;

/// Recording host.
#[derive(Debug, Default)]
pub struct MockHost {
    /// Scene objects the host can hand out.
    pub meshes: BTreeMap<ObjectId, Mesh>,
    /// Last mesh presented per object.
    pub presented: BTreeMap<ObjectId, Mesh>,
    /// Number of present calls.
    pub present_count: usize,
    /// Messages sent, in order.
    pub sent: Vec<OutboundMessage>,
    /// Scene names loaded, in order.
    pub loaded_scenes: Vec<String>,
    /// Live detached objects.
    pub detached: BTreeMap<DetachedId, DetachedMesh>,
    /// Destroyed detached ids, in order.
    pub destroyed: Vec<DetachedId>,
    /// Make `send` fail with `TransportClosed`.
    pub transport_closed: bool,
    /// Make `load_scene` fail.
    pub fail_scene_load: bool,
    next_detached: u64,
}

impl MockHost {
    /// Creates an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a scene object.
    pub fn with_object(mut self, object: ObjectId, mesh: Mesh) -> Self {
        self.meshes.insert(object, mesh);
        self
    }

    /// Mesh currently shown for `object`: the last presented one, else the scene mesh.
    pub fn shown(&self, object: ObjectId) -> Option<&Mesh> {
        self.presented.get(&object).or_else(|| self.meshes.get(&object))
    }
}

impl SessionHost for MockHost {
    fn object_mesh(&self, object: ObjectId) -> Option<Mesh> {
        self.meshes.get(&object).cloned()
    }

    fn present_mesh(&mut self, object: ObjectId, mesh: &Mesh) {
        self.present_count += 1;
        self.presented.insert(object, mesh.clone());
    }

    fn load_scene(&mut self, scene: &LoadScene) -> Result<(), HostError> {
        if self.fail_scene_load {
            return Err(HostError::SceneLoad {
                scene: scene.scene_name.clone(),
                reason: "mock failure".into(),
            });
        }
        self.loaded_scenes.push(scene.scene_name.clone());
        Ok(())
    }

    fn send(&mut self, message: &OutboundMessage) -> Result<(), HostError> {
        if self.transport_closed {
            return Err(HostError::TransportClosed);
        }
        self.sent.push(message.clone());
        Ok(())
    }

    fn spawn_detached(&mut self, detached: DetachedMesh) -> Result<DetachedId, HostError> {
        self.next_detached += 1;
        let id = DetachedId(self.next_detached);
        self.detached.insert(id, detached);
        Ok(id)
    }

    fn destroy_detached(&mut self, id: DetachedId) {
        if self.detached.remove(&id).is_some() {
            self.destroyed.push(id);
        }
    }
}
