// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Transcript format: one JSON object per line.
//!
//! Lines with an `action` field are local user actions; anything else is a
//! server frame passed through verbatim. Blank lines and lines starting with
//! `#` are ignored.

use anyhow::{Context, Result};
use serde::Deserialize;

/// A local user action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Trigger press at a world-space point on an object.
    Paint {
        object: u64,
        point: [f32; 3],
        #[serde(default)]
        background: bool,
    },
    /// Advance to the next label.
    CycleLabel,
    /// Pick a label directly.
    SelectLabel { index: usize },
    /// Split an object by label.
    Detach { object: u64 },
    /// Remove every detached object.
    ClearDetached,
    /// Drop labeling state for an object.
    Restore { object: u64 },
    /// Ask the server for the next scene.
    NextScene,
    /// Advance the virtual clock.
    Wait { secs: f32 },
}

/// One transcript line.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Raw server frame.
    Server(String),
    /// Local action.
    Local(Action),
}

/// Parses a transcript line; `Ok(None)` for blanks and comments.
pub fn parse_step(line: &str) -> Result<Option<Step>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let value: serde_json::Value = serde_json::from_str(line).context("line is not JSON")?;
    if value.get("action").is_some() {
        let action = serde_json::from_value(value).context("unrecognised action")?;
        return Ok(Some(Step::Local(action)));
    }
    Ok(Some(Step::Server(line.to_owned())))
}
