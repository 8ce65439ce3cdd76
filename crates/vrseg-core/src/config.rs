// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Session configuration, persisted as one JSON document through a
//! [`ConfigStore`].

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};
use vrseg_app_core::config::{ConfigError, ConfigStore};
use vrseg_mesh::Rgba;

use crate::labels::{Label, LabelTable};

/// Store key of the session document.
pub const CONFIG_KEY: &str = "session";

const DEFAULT_CHUNK_TIMEOUT_SECS: f32 = 30.0;

/// Ray painting knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PaintSettings {
    /// Vertices farther than this (world units) from the hit are never picked.
    pub max_vertex_search_distance: f32,
    /// Paint radius around the picked vertex, in mesh-local units.
    pub vertex_color_radius: f32,
    /// Paint every vertex within `vertex_color_radius` instead of just the picked one.
    pub color_multiple_vertices: bool,
    /// Restore every labeled object before labeling a different one.
    pub reset_colors_on_new_selection: bool,
}

impl Default for PaintSettings {
    fn default() -> Self {
        Self {
            max_vertex_search_distance: 0.5,
            vertex_color_radius: 0.5,
            color_multiple_vertices: true,
            reset_colors_on_new_selection: false,
        }
    }
}

/// Submesh detachment knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetachSettings {
    /// Color detached vertices with their label color instead of copying the source colors.
    pub use_label_color: bool,
    /// Ask the host to make detached meshes grabbable.
    pub grabbable: bool,
    /// Extra scale applied to detached meshes.
    pub manipulation_scale: f32,
}

impl Default for DetachSettings {
    fn default() -> Self {
        Self {
            use_label_color: false,
            grabbable: true,
            manipulation_scale: 1.0,
        }
    }
}

/// Label entry as stored in config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelConfig {
    /// Display name.
    pub name: String,
    /// RGBA in `[0, 1]`.
    pub color: [f32; 4],
}

/// Everything the session controller reads from config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds without a chunk before an in-flight stream is abandoned.
    pub chunk_timeout_secs: f32,
    /// Ray painting knobs.
    pub paint: PaintSettings,
    /// Label palette, index-addressed.
    pub labels: Vec<LabelConfig>,
    /// Color used for unlabeled vertices and background painting.
    pub background_color: [f32; 4],
    /// Submesh detachment knobs.
    pub detach: DetachSettings,
    /// Seconds a surfaced notice stays visible.
    pub notice_ttl_secs: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let table = LabelTable::default();
        Self {
            chunk_timeout_secs: DEFAULT_CHUNK_TIMEOUT_SECS,
            paint: PaintSettings::default(),
            labels: table
                .iter()
                .map(|l| LabelConfig {
                    name: l.name.clone(),
                    color: l.color.to_array(),
                })
                .collect(),
            background_color: table.background().to_array(),
            detach: DetachSettings::default(),
            notice_ttl_secs: 6.0,
        }
    }
}

impl SessionConfig {
    /// Chunk timeout; negative or non-finite values fall back to the default.
    pub fn chunk_timeout(&self) -> Duration {
        secs_or(self.chunk_timeout_secs, DEFAULT_CHUNK_TIMEOUT_SECS)
    }

    /// Notice time-to-live.
    pub fn notice_ttl(&self) -> Duration {
        secs_or(self.notice_ttl_secs, 6.0)
    }

    /// Builds the runtime label table.
    pub fn label_table(&self) -> LabelTable {
        LabelTable::new(
            self.labels
                .iter()
                .map(|l| Label::new(l.name.clone(), Rgba(l.color)))
                .collect(),
            Rgba(self.background_color),
        )
    }
}

/// Where [`SessionConfigStore::load_or_init`] got its config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Read from the store.
    Stored,
    /// Nothing was stored; defaults were written.
    Initialized,
    /// The stored document was unreadable; defaults are used and the
    /// document is left for the user to fix.
    Fallback,
}

/// Typed access to the session document in a [`ConfigStore`].
#[derive(Debug)]
pub struct SessionConfigStore<S> {
    store: S,
}

impl<S: ConfigStore> SessionConfigStore<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads the stored session config, if any.
    pub fn load_session(&self) -> Result<Option<SessionConfig>, ConfigError> {
        let Some(bytes) = self.store.read(CONFIG_KEY)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| ConfigError::Json {
                key: CONFIG_KEY.to_owned(),
                source,
            })
    }

    /// Writes `config` as pretty JSON.
    pub fn save_session(&self, config: &SessionConfig) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(config).map_err(|source| ConfigError::Json {
            key: CONFIG_KEY.to_owned(),
            source,
        })?;
        self.store.write(CONFIG_KEY, &data)
    }

    /// Loads the session config, writing defaults on first run.
    ///
    /// Storage failures propagate; an undecodable document does not.
    pub fn load_or_init(&self) -> Result<(SessionConfig, ConfigOrigin), ConfigError> {
        match self.load_session() {
            Ok(Some(config)) => Ok((config, ConfigOrigin::Stored)),
            Ok(None) => {
                let config = SessionConfig::default();
                self.save_session(&config)?;
                info!(key = CONFIG_KEY, "wrote default session config");
                Ok((config, ConfigOrigin::Initialized))
            }
            Err(err @ ConfigError::Json { .. }) => {
                warn!(error = %err, "session config unreadable; using defaults");
                Ok((SessionConfig::default(), ConfigOrigin::Fallback))
            }
            Err(err) => Err(err),
        }
    }
}

fn secs_or(secs: f32, fallback: f32) -> Duration {
    Duration::try_from_secs_f32(secs).unwrap_or_else(|_| Duration::from_secs_f32(fallback))
}
