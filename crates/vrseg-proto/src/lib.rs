// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire schema for the segmentation server link.
//!
//! Every frame is a JSON object whose `type` field names the message. The
//! transport (socket, framing) is not part of this crate; it only defines the
//! payloads and how to turn text into typed messages and back. See [`wire`].

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod labels;
pub mod wire;

/// Errors raised while decoding or encoding wire messages.
///
/// All of them are recoverable: the offending frame is dropped and the link
/// stays open.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// The frame is not valid JSON.
    #[error("malformed json: {0}")]
    Json(#[source] serde_json::Error),
    /// The frame has no string `type` field.
    #[error("message missing 'type' field")]
    MissingType,
    /// The `type` field names a message this client does not know.
    #[error("unknown message type: {0}")]
    UnknownType(String),
    /// A known message type with missing or ill-typed fields.
    #[error("invalid {ty} message: {source}")]
    InvalidMessage {
        /// Message type being decoded.
        ty: String,
        /// Underlying serde failure.
        #[source]
        source: serde_json::Error,
    },
    /// The chunk payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The chunk header is internally inconsistent.
    #[error("invalid chunk header: index {chunk_index} of {total_chunks}")]
    InvalidChunkHeader {
        /// Declared chunk index.
        chunk_index: u32,
        /// Declared chunk count.
        total_chunks: u32,
    },
    /// Serializing an outbound message failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Object entry listed by a `load_scene` message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SceneObject {
    /// Display name.
    #[serde(default = "unnamed")]
    pub name: String,
    /// Server-side object id.
    #[serde(default)]
    pub id: i64,
}

fn unnamed() -> String {
    "unnamed".into()
}

/// `load_scene` payload: the server switched to a new scene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadScene {
    /// Scene identifier; also selects the mesh to load.
    pub scene_name: String,
    /// Number of points the server holds for the scene.
    pub point_count: u64,
    /// Object the server currently segments.
    #[serde(default)]
    pub current_object: String,
    /// Whether the server runs in semantic (multi-class) mode.
    #[serde(default)]
    pub semantics_mode: bool,
    /// Objects present in the scene.
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

/// `update_mask_chunk` payload: one fragment of a label-mask update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaskChunk {
    /// Position of this chunk in its stream (0-based).
    pub chunk_index: u32,
    /// Number of chunks in the stream.
    pub total_chunks: u32,
    /// First vertex index covered.
    pub start_index: u32,
    /// One past the last vertex index covered.
    pub end_index: u32,
    /// Base64 payload, one byte per label value.
    pub data: String,
    /// Advisory flag; payload bytes are always one per value.
    #[serde(default)]
    pub compressed: bool,
}

impl MaskChunk {
    /// Rejects headers that cannot belong to any stream.
    pub fn check_header(&self) -> Result<(), ProtoError> {
        if self.total_chunks == 0 || self.chunk_index >= self.total_chunks {
            return Err(ProtoError::InvalidChunkHeader {
                chunk_index: self.chunk_index,
                total_chunks: self.total_chunks,
            });
        }
        Ok(())
    }

    /// Decodes the base64 payload into raw wire bytes.
    pub fn payload_bytes(&self) -> Result<Vec<u8>, ProtoError> {
        Ok(base64::engine::general_purpose::STANDARD.decode(self.data.as_bytes())?)
    }

    /// Decodes the payload into mask values (wire byte `v` becomes `v - 1`).
    pub fn mask_values(&self) -> Result<Vec<i32>, ProtoError> {
        Ok(self
            .payload_bytes()?
            .into_iter()
            .map(labels::wire_to_mask)
            .collect())
    }
}

/// Server → client messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Switch scenes; resets all client-side labeling state.
    LoadScene(LoadScene),
    /// A fragment of a streamed label mask.
    UpdateMaskChunk(MaskChunk),
    /// The server finished a segmentation pass (advisory).
    SegmentationComplete,
    /// The server acknowledged a click (advisory).
    ClickFeedback,
    /// The server reported a failure (advisory).
    Error {
        /// Human readable description.
        #[serde(default)]
        message: String,
    },
}

impl InboundMessage {
    /// Wire `type` string for this message.
    pub fn type_name(&self) -> &'static str {
        match self {
            InboundMessage::LoadScene(_) => "load_scene",
            InboundMessage::UpdateMaskChunk(_) => "update_mask_chunk",
            InboundMessage::SegmentationComplete => "segmentation_complete",
            InboundMessage::ClickFeedback => "click_feedback",
            InboundMessage::Error { .. } => "error",
        }
    }
}

/// Whether a click marks background or an object.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClickType {
    /// Negative click (label -1).
    Background,
    /// Positive click for a labeled object.
    Object,
}

/// Client → server messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// A vertex was painted by the user.
    Click {
        /// Background or object click.
        click_type: ClickType,
        /// Vertex index nearest to the ray hit.
        point_index: u32,
        /// `label + 1`; zero for background.
        object_id: i32,
    },
    /// Ask the server to advance to the next scene.
    NextScene,
    /// Acknowledge a `load_scene`.
    SceneLoaded {
        /// Scene that was loaded.
        scene_name: String,
        /// Point count echoed back from the request.
        point_count: u64,
    },
}

impl OutboundMessage {
    /// Builds a click for `point_index` painted with mask label `label`.
    pub fn click(point_index: u32, label: i32) -> Self {
        let click_type = if label == labels::BACKGROUND {
            ClickType::Background
        } else {
            ClickType::Object
        };
        OutboundMessage::Click {
            click_type,
            point_index,
            object_id: labels::mask_to_object_id(label),
        }
    }

    /// Wire `type` string for this message.
    pub fn type_name(&self) -> &'static str {
        match self {
            OutboundMessage::Click { .. } => "click",
            OutboundMessage::NextScene => "next_scene",
            OutboundMessage::SceneLoaded { .. } => "scene_loaded",
        }
    }
}
