// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Host port: everything the session needs from the engine and the network.

use thiserror::Error;
use vrseg_mesh::{Mat4, Mesh, Rgba, Vec3};
use vrseg_proto::{LoadScene, OutboundMessage};

use crate::ObjectId;

/// Failures reported by a host.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    /// The server link is down.
    #[error("transport closed")]
    TransportClosed,
    /// Loading scene geometry failed.
    #[error("scene `{scene}` failed to load: {reason}")]
    SceneLoad {
        /// Scene name from the request.
        scene: String,
        /// Host-supplied detail.
        reason: String,
    },
    /// Anything else the host wants to surface.
    #[error("{0}")]
    Other(String),
}

/// A ray hit on a scene object, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Object hit.
    pub object: ObjectId,
    /// Hit point in world space.
    pub point: Vec3,
    /// The object's local-to-world transform at hit time.
    pub local_to_world: Mat4,
}

/// Handle to a detached mesh the host spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DetachedId(pub u64);

/// Request to spawn a standalone object for one extracted label.
#[derive(Debug, Clone, PartialEq)]
pub struct DetachedMesh {
    /// Object the geometry came from; the host copies its transform.
    pub source: ObjectId,
    /// Mask value of the label.
    pub label: i32,
    /// Suggested object name.
    pub name: String,
    /// Geometry.
    pub mesh: Mesh,
    /// Material tint.
    pub tint: Rgba,
    /// Whether the user can pick it up.
    pub grabbable: bool,
    /// Extra scale applied while manipulating.
    pub scale: f32,
}

/// Engine and transport seam for [`crate::SceneSessionController`].
///
/// The controller never owns time, geometry loading, or sockets; the host
/// supplies them. Meshes passed to [`SessionHost::present_mesh`] carry a
/// version, and hosts may skip uploads whose version they already hold.
pub trait SessionHost {
    /// Current mesh of a scene object, if the host knows it.
    fn object_mesh(&self, object: ObjectId) -> Option<Mesh>;

    /// Displays `mesh` on `object`, replacing whatever it showed before.
    fn present_mesh(&mut self, object: ObjectId, mesh: &Mesh);

    /// Loads scene geometry.
    fn load_scene(&mut self, scene: &LoadScene) -> Result<(), HostError>;

    /// Sends a message to the server.
    fn send(&mut self, message: &OutboundMessage) -> Result<(), HostError>;

    /// Spawns a detached object.
    fn spawn_detached(&mut self, detached: DetachedMesh) -> Result<DetachedId, HostError>;

    /// Destroys a detached object. Unknown ids are ignored.
    fn destroy_detached(&mut self, id: DetachedId);
}
