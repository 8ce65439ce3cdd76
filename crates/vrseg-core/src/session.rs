// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Session orchestration: routes server messages and user actions to the
//! tracker, the assembler, and the extractor.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};
use vrseg_app_core::notice::{NoticeKind, NoticeService, NoticeSource};
use vrseg_proto::{wire, InboundMessage, LoadScene, MaskChunk, OutboundMessage, ProtoError};

use crate::assembler::{AssemblerState, MaskChunkAssembler, StreamTimeout};
use crate::config::SessionConfig;
use crate::extract::{ColorMode, ExtractError, SubmeshExtractor};
use crate::labels::{LabelTable, PaintLabel};
use crate::mask::VertexLabelMask;
use crate::port::{DetachedId, DetachedMesh, HostError, RayHit, SessionHost};
use crate::tracker::{PaintOutcome, TrackerError, VertexInteractionTracker};
use crate::ObjectId;

const MAX_NOTICES: usize = 8;

/// Errors surfaced by the controller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// An inbound message or chunk was malformed.
    #[error(transparent)]
    Proto(#[from] ProtoError),
    /// Labeling state rejected the operation.
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    /// Extraction could not run.
    #[error(transparent)]
    Extract(#[from] ExtractError),
    /// The host failed.
    #[error(transparent)]
    Host(#[from] HostError),
    /// The host has no mesh for the hit object.
    #[error("no mesh for object {0}")]
    NoMesh(ObjectId),
    /// A label index outside the table was selected.
    #[error("label {index} out of range ({len} labels)")]
    LabelOutOfRange {
        /// Requested index.
        index: usize,
        /// Table length.
        len: usize,
    },
}

/// What a detach produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetachReport {
    /// Spawned objects, one per emitted label.
    pub spawned: Vec<DetachedId>,
    /// Labels with vertices but no complete triangle.
    pub empty_labels: Vec<i32>,
    /// Triangles removed from the source.
    pub removed_triangles: usize,
}

/// Drives one labeling session against a [`SessionHost`].
pub struct SceneSessionController<H> {
    host: H,
    config: SessionConfig,
    labels: LabelTable,
    tracker: VertexInteractionTracker,
    assembler: MaskChunkAssembler,
    extractor: SubmeshExtractor,
    current_label: usize,
    // Object receiving the in-flight mask stream, fixed when the stream opens.
    stream_target: Option<ObjectId>,
    detached: Vec<DetachedId>,
    scene: Option<LoadScene>,
    notices: NoticeService,
}

impl<H: SessionHost> SceneSessionController<H> {
    /// Creates a controller with no scene loaded.
    pub fn new(host: H, config: SessionConfig) -> Self {
        let extractor = SubmeshExtractor::new(if config.detach.use_label_color {
            ColorMode::LabelColor
        } else {
            ColorMode::Original
        });
        Self {
            host,
            labels: config.label_table(),
            tracker: VertexInteractionTracker::new(config.paint.clone()),
            assembler: MaskChunkAssembler::new(config.chunk_timeout()),
            extractor,
            current_label: 0,
            stream_target: None,
            detached: Vec::new(),
            scene: None,
            notices: NoticeService::new(MAX_NOTICES),
            config,
        }
    }

    /// The host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consumes the controller, returning the host.
    pub fn into_host(self) -> H {
        self.host
    }

    /// Configuration in effect.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Label palette.
    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Labeling state.
    pub fn tracker(&self) -> &VertexInteractionTracker {
        &self.tracker
    }

    /// Copy of the label mask for `object`.
    pub fn mask(&self, object: ObjectId) -> Option<VertexLabelMask> {
        self.tracker.mask(object).cloned()
    }

    /// Mask stream state.
    pub fn stream_state(&self) -> AssemblerState {
        self.assembler.state()
    }

    /// Object the in-flight mask stream is written to.
    pub fn stream_target(&self) -> Option<ObjectId> {
        self.stream_target
    }

    /// Last scene loaded successfully.
    pub fn scene(&self) -> Option<&LoadScene> {
        self.scene.as_ref()
    }

    /// Index of the label painted by [`Self::trigger`].
    pub fn current_label(&self) -> usize {
        self.current_label
    }

    /// Detached objects spawned since the last clear.
    pub fn detached(&self) -> &[DetachedId] {
        &self.detached
    }

    /// User-facing notices.
    pub fn notices(&self) -> &NoticeService {
        &self.notices
    }

    /// Decodes and handles one text frame from the server.
    pub fn handle_text(&mut self, text: &str, now: Instant) -> Result<(), SessionError> {
        let message = wire::decode_inbound(text).inspect_err(|err| {
            warn!(error = %err, "dropping inbound frame");
        })?;
        self.handle_message(message, now)
    }

    /// Handles one decoded server message.
    pub fn handle_message(
        &mut self,
        message: InboundMessage,
        now: Instant,
    ) -> Result<(), SessionError> {
        debug!(kind = message.type_name(), "inbound");
        match message {
            InboundMessage::LoadScene(scene) => self.load_scene(scene, now),
            InboundMessage::UpdateMaskChunk(chunk) => self.mask_chunk(&chunk, now),
            InboundMessage::SegmentationComplete => {
                info!("server reports segmentation complete");
                Ok(())
            }
            InboundMessage::ClickFeedback => {
                debug!("click acknowledged");
                Ok(())
            }
            InboundMessage::Error { message } => {
                warn!(%message, "server error");
                self.notify(
                    NoticeKind::Error,
                    NoticeSource::Server,
                    "Server error",
                    Some(message),
                    now,
                );
                Ok(())
            }
        }
    }

    /// Per-frame housekeeping: stream timeouts and notice expiry.
    pub fn tick(&mut self, now: Instant) -> Option<StreamTimeout> {
        let timed_out = self.assembler.tick(now);
        if let Some(t) = timed_out {
            self.stream_target = None;
            self.notify(
                NoticeKind::Warn,
                NoticeSource::Stream,
                "Mask update timed out",
                Some(format!("{}/{} chunks received", t.received, t.expected)),
                now,
            );
        }
        self.notices.expire(now);
        timed_out
    }

    /// Paints at a ray hit with the current label, or with background when
    /// `background` is set, and reports the click to the server.
    ///
    /// A failed send is surfaced as a notice; the local paint stands.
    pub fn trigger(
        &mut self,
        hit: &RayHit,
        background: bool,
        now: Instant,
    ) -> Result<PaintOutcome, SessionError> {
        let mut created = false;
        if !self.tracker.focus(hit.object) {
            if self.config.paint.reset_colors_on_new_selection {
                self.restore_all();
            }
            let mesh = self
                .host
                .object_mesh(hit.object)
                .ok_or(SessionError::NoMesh(hit.object))?;
            created = self
                .tracker
                .begin_interaction(hit.object, &mesh, self.labels.background());
        }

        let label = if background {
            PaintLabel::Background
        } else {
            PaintLabel::Label(self.current_label)
        };
        let outcome = self.tracker.paint_nearest(
            hit.object,
            hit.point,
            &hit.local_to_world,
            label,
            &self.labels,
        )?;

        if created || matches!(outcome, PaintOutcome::Painted { .. }) {
            self.present(hit.object);
        }
        match outcome {
            PaintOutcome::Painted { nearest, label, .. } => {
                let point_index = u32::try_from(nearest).unwrap_or(u32::MAX);
                if let Err(err) = self.send(&OutboundMessage::click(point_index, label), now) {
                    debug!(error = %err, point_index, "click not delivered; paint kept");
                }
            }
            PaintOutcome::NoVertexInRange => {
                info!(object = %hit.object, "no vertex near hit");
            }
        }
        Ok(outcome)
    }

    /// Advances the current label, wrapping around. Returns the new index.
    pub fn cycle_label(&mut self) -> usize {
        if !self.labels.is_empty() {
            self.current_label = (self.current_label + 1) % self.labels.len();
        }
        if let Some(label) = self.labels.get(self.current_label) {
            info!(index = self.current_label, name = %label.name, "label selected");
        }
        self.current_label
    }

    /// Selects a label by index.
    pub fn select_label(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.labels.len() {
            return Err(SessionError::LabelOutOfRange {
                index,
                len: self.labels.len(),
            });
        }
        self.current_label = index;
        Ok(())
    }

    /// Asks the server to advance to the next scene.
    pub fn request_next_scene(&mut self, now: Instant) -> Result<(), SessionError> {
        info!("requesting next scene");
        self.send(&OutboundMessage::NextScene, now)
    }

    /// Splits `object` into one detached object per label and strips the
    /// detached triangles from it.
    ///
    /// If the host fails to spawn a submesh, already spawned submeshes stay
    /// registered (and are removed by the next clear) and the source is left
    /// unchanged.
    pub fn detach(&mut self, object: ObjectId, now: Instant) -> Result<DetachReport, SessionError> {
        let (Some(mesh), Some(mask)) = (self.tracker.working_mesh(object), self.tracker.mask(object))
        else {
            let name = self
                .host
                .object_mesh(object)
                .map_or_else(|| object.to_string(), |m| m.name().to_owned());
            self.notify(NoticeKind::Warn, NoticeSource::Detach, "Object is not labeled", None, now);
            return Err(ExtractError::NotLabeled(name).into());
        };
        let extraction = self.extractor.extract(mesh, mask, &self.labels)?;

        for label in &extraction.empty_labels {
            let name = self
                .labels
                .for_mask_value(*label)
                .map_or_else(|| label.to_string(), |l| l.name.clone());
            self.notify(
                NoticeKind::Warn,
                NoticeSource::Detach,
                "No complete triangles found",
                Some(format!("label {name}")),
                now,
            );
        }
        if extraction.is_empty() {
            info!(%object, "nothing to detach");
            return Ok(DetachReport {
                empty_labels: extraction.empty_labels,
                ..DetachReport::default()
            });
        }

        let mut spawned = Vec::with_capacity(extraction.submeshes.len());
        for sub in extraction.submeshes {
            let tint = self
                .labels
                .for_mask_value(sub.label)
                .map_or(self.labels.background(), |l| l.color);
            let id = self.host.spawn_detached(DetachedMesh {
                source: object,
                label: sub.label,
                name: sub.mesh.name().to_owned(),
                mesh: sub.mesh,
                tint,
                grabbable: self.config.detach.grabbable,
                scale: self.config.detach.manipulation_scale,
            })?;
            self.detached.push(id);
            spawned.push(id);
        }

        self.tracker
            .retain_triangles(object, extraction.residual_triangles)?;
        self.present(object);
        info!(
            %object,
            submeshes = spawned.len(),
            removed = extraction.removed_triangles,
            "detached"
        );
        Ok(DetachReport {
            spawned,
            empty_labels: extraction.empty_labels,
            removed_triangles: extraction.removed_triangles,
        })
    }

    /// Destroys every detached object.
    pub fn clear_detached(&mut self) -> usize {
        let n = self.detached.len();
        for id in self.detached.drain(..) {
            self.host.destroy_detached(id);
        }
        if n > 0 {
            debug!(count = n, "detached objects cleared");
        }
        n
    }

    /// Drops labeling state for `object` and shows its original mesh again.
    pub fn restore(&mut self, object: ObjectId) -> bool {
        match self.tracker.restore(object) {
            Some(original) => {
                self.host.present_mesh(object, &original);
                true
            }
            None => false,
        }
    }

    /// Restores every labeled object. Returns how many were restored.
    pub fn restore_all(&mut self) -> usize {
        let restored = self.tracker.reset_all();
        for (object, mesh) in &restored {
            self.host.present_mesh(*object, mesh);
        }
        restored.len()
    }

    fn load_scene(&mut self, scene: LoadScene, now: Instant) -> Result<(), SessionError> {
        info!(
            scene = %scene.scene_name,
            points = scene.point_count,
            current = %scene.current_object,
            semantic = scene.semantics_mode,
            objects = scene.objects.len(),
            "load_scene"
        );
        for obj in &scene.objects {
            debug!(name = %obj.name, id = obj.id, "scene object");
        }
        self.restore_all();
        self.clear_detached();
        self.assembler.reset();
        self.stream_target = None;

        if let Err(err) = self.host.load_scene(&scene) {
            warn!(error = %err, "scene load failed");
            self.notify(
                NoticeKind::Error,
                NoticeSource::Scene,
                "Scene failed to load",
                Some(err.to_string()),
                now,
            );
            return Err(err.into());
        }
        let ack = OutboundMessage::SceneLoaded {
            scene_name: scene.scene_name.clone(),
            point_count: scene.point_count,
        };
        self.scene = Some(scene);
        self.send(&ack, now)
    }

    fn mask_chunk(&mut self, chunk: &MaskChunk, now: Instant) -> Result<(), SessionError> {
        let outcome = self.assembler.accept(chunk, now).inspect_err(|err| {
            warn!(error = %err, chunk = chunk.chunk_index, "dropping mask chunk");
        })?;
        if outcome.started {
            self.stream_target = self.tracker.active();
            debug!(object = ?self.stream_target, "mask stream target fixed");
        }
        let target = self.stream_target;
        if outcome.completed {
            self.stream_target = None;
        }
        let Some(object) = target.filter(|o| self.tracker.is_tracked(*o)) else {
            warn!(chunk = chunk.chunk_index, "mask chunk with no labeled object; not applied");
            return Ok(());
        };
        let written = self.tracker.apply_remote_range(object, &outcome.update)?;
        debug!(%object, written, "mask range applied");
        if outcome.completed {
            self.tracker.on_stream_complete(object, &self.labels)?;
            self.present(object);
        }
        Ok(())
    }

    fn present(&mut self, object: ObjectId) {
        if let Some(mesh) = self.tracker.working_mesh(object) {
            self.host.present_mesh(object, mesh);
        }
    }

    fn send(&mut self, message: &OutboundMessage, now: Instant) -> Result<(), SessionError> {
        debug!(kind = message.type_name(), "outbound");
        if let Err(err) = self.host.send(message) {
            warn!(error = %err, kind = message.type_name(), "send failed");
            self.notify(
                NoticeKind::Warn,
                NoticeSource::Server,
                "Server unreachable",
                Some(err.to_string()),
                now,
            );
            return Err(err.into());
        }
        Ok(())
    }

    fn notify(
        &mut self,
        kind: NoticeKind,
        source: NoticeSource,
        title: &str,
        body: Option<String>,
        now: Instant,
    ) {
        let ttl = self.config.notice_ttl();
        self.notices.push(kind, source, title, body, ttl, now);
    }
}
