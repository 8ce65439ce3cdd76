// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Client core for interactive VR mesh segmentation.
//!
//! The user paints labels onto mesh vertices with a ray; a remote server
//! streams refined label masks back in chunks; labeled regions can be split
//! off into standalone meshes. Everything here is headless: rendering,
//! input, and sockets live behind [`SessionHost`].
//!
//! - [`VertexLabelMask`]: one label per vertex.
//! - [`MaskChunkAssembler`]: out-of-order chunk reassembly with timeout.
//! - [`VertexInteractionTracker`]: per-object working copies and painting.
//! - [`SubmeshExtractor`]: per-label submeshes plus the residual source.
//! - [`SceneSessionController`]: wires the above to server messages.

pub mod assembler;
pub mod config;
pub mod extract;
pub mod labels;
pub mod mask;
pub mod mock;
pub mod port;
pub mod session;
pub mod tracker;

pub use assembler::{AssemblerState, ChunkOutcome, MaskChunkAssembler, MaskUpdate, StreamTimeout};
pub use config::{ConfigOrigin, DetachSettings, PaintSettings, SessionConfig, SessionConfigStore};
pub use extract::{ColorMode, ExtractError, Extraction, Submesh, SubmeshExtractor};
pub use labels::{Label, LabelTable, PaintLabel};
pub use mask::VertexLabelMask;
pub use port::{DetachedId, DetachedMesh, HostError, RayHit, SessionHost};
pub use session::{DetachReport, SceneSessionController, SessionError};
pub use tracker::{PaintOutcome, TrackerError, VertexInteractionTracker};

/// Host-assigned identity of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}
