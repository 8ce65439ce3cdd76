// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Text framing helpers: one JSON object per frame.

use serde_json::Value;

use crate::{InboundMessage, OutboundMessage, ProtoError};

const KNOWN_TYPES: [&str; 5] = [
    "load_scene",
    "update_mask_chunk",
    "segmentation_complete",
    "click_feedback",
    "error",
];

/// Decodes one inbound frame.
///
/// Distinguishes malformed JSON, a missing `type`, an unknown `type`, and a
/// known type with bad fields so callers can log precisely what was dropped.
pub fn decode_inbound(text: &str) -> Result<InboundMessage, ProtoError> {
    let value: Value = serde_json::from_str(text).map_err(ProtoError::Json)?;
    let ty = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtoError::MissingType)?
        .to_owned();
    if !KNOWN_TYPES.contains(&ty.as_str()) {
        return Err(ProtoError::UnknownType(ty));
    }
    serde_json::from_value(value).map_err(|source| ProtoError::InvalidMessage { ty, source })
}

/// Encodes one outbound frame as compact JSON.
pub fn encode_outbound(msg: &OutboundMessage) -> Result<String, ProtoError> {
    serde_json::to_string(msg).map_err(ProtoError::Encode)
}
