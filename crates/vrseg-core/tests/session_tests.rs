// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

mod common;

use std::time::{Duration, Instant};

use serde_json::json;
use vrseg_app_core::notice::{NoticeKind, NoticeSource};
use vrseg_core::mock::MockHost;
use vrseg_core::{
    AssemblerState, ExtractError, ObjectId, PaintOutcome, RayHit, SceneSessionController,
    SessionConfig, SessionError,
};
use vrseg_mesh::{Mat4, Mesh, Rgba, Vec3};
use vrseg_proto::{ClickType, MaskChunk, OutboundMessage};

const GRID: ObjectId = ObjectId(1);
const QUAD: ObjectId = ObjectId(2);

fn controller(config: SessionConfig) -> SceneSessionController<MockHost> {
    let host = MockHost::new()
        .with_object(GRID, common::grid(5))
        .with_object(QUAD, common::quad());
    SceneSessionController::new(host, config)
}

fn hit(object: ObjectId, x: f32, y: f32, z: f32) -> RayHit {
    RayHit {
        object,
        point: Vec3::new(x, y, z),
        local_to_world: Mat4::identity(),
    }
}

fn chunk_frame(chunk: &MaskChunk) -> String {
    json!({
        "type": "update_mask_chunk",
        "chunk_index": chunk.chunk_index,
        "total_chunks": chunk.total_chunks,
        "start_index": chunk.start_index,
        "end_index": chunk.end_index,
        "data": chunk.data,
    })
    .to_string()
}

fn load_frame(name: &str) -> String {
    json!({
        "type": "load_scene",
        "scene_name": name,
        "point_count": 25,
        "objects": [{"name": "grid", "id": 1}],
    })
    .to_string()
}

fn shown(session: &SceneSessionController<MockHost>, object: ObjectId) -> Mesh {
    session.host().shown(object).unwrap().clone()
}

#[test]
fn load_scene_is_acknowledged() {
    let mut s = controller(SessionConfig::default());
    s.handle_text(&load_frame("bunny"), Instant::now()).unwrap();
    assert_eq!(s.host().loaded_scenes, vec!["bunny".to_owned()]);
    assert_eq!(
        s.host().sent,
        vec![OutboundMessage::SceneLoaded {
            scene_name: "bunny".into(),
            point_count: 25
        }]
    );
    assert_eq!(s.scene().unwrap().scene_name, "bunny");
}

#[test]
fn failed_load_keeps_previous_scene_and_sends_no_ack() {
    let mut s = controller(SessionConfig::default());
    let now = Instant::now();
    s.handle_text(&load_frame("first"), now).unwrap();
    s.host_mut().fail_scene_load = true;
    let err = s.handle_text(&load_frame("second"), now).unwrap_err();
    assert!(matches!(err, SessionError::Host(_)));
    assert_eq!(s.scene().unwrap().scene_name, "first");
    assert_eq!(s.host().sent.len(), 1);
    assert!(s.notices().iter().any(|n| n.source == NoticeSource::Scene));
}

#[test]
fn paint_reports_nearest_vertex_to_server() {
    let mut s = controller(SessionConfig::default());
    let out = s.trigger(&hit(GRID, 2.1, 0.0, 1.0), false, Instant::now()).unwrap();
    assert_eq!(
        out,
        PaintOutcome::Painted {
            nearest: 7,
            painted: 1,
            label: 0
        }
    );
    assert_eq!(
        s.host().sent,
        vec![OutboundMessage::Click {
            click_type: ClickType::Object,
            point_index: 7,
            object_id: 1
        }]
    );
    let mesh = shown(&s, GRID);
    assert_eq!(mesh.colors().unwrap()[7], Rgba::RED);
    assert_eq!(mesh.colors().unwrap()[8], Rgba::WHITE);
}

#[test]
fn search_distance_is_inclusive() {
    let mut s = controller(SessionConfig::default());
    let now = Instant::now();
    let miss = s.trigger(&hit(GRID, 2.0, 0.6, 1.0), false, now).unwrap();
    assert_eq!(miss, PaintOutcome::NoVertexInRange);
    assert!(s.host().sent.is_empty());
    // The object is still tracked and shown with its working copy.
    assert!(s.tracker().is_tracked(GRID));

    let edge = s.trigger(&hit(GRID, 2.0, 0.5, 1.0), false, now).unwrap();
    assert!(matches!(edge, PaintOutcome::Painted { nearest: 7, .. }));
}

#[test]
fn hit_uses_object_transform() {
    let mut s = controller(SessionConfig::default());
    let ray = RayHit {
        object: GRID,
        point: Vec3::new(12.0, 0.0, 1.0),
        local_to_world: Mat4::translation(10.0, 0.0, 0.0),
    };
    let out = s.trigger(&ray, false, Instant::now()).unwrap();
    assert!(matches!(out, PaintOutcome::Painted { nearest: 7, .. }));
}

#[test]
fn background_paint_sends_background_click() {
    let mut s = controller(SessionConfig::default());
    s.trigger(&hit(GRID, 0.0, 0.0, 0.0), true, Instant::now()).unwrap();
    assert_eq!(
        s.host().sent,
        vec![OutboundMessage::Click {
            click_type: ClickType::Background,
            point_index: 0,
            object_id: 0
        }]
    );
    assert_eq!(s.mask(GRID).unwrap().get(0), Some(-1));
}

#[test]
fn cycle_label_wraps_and_drives_paint() {
    let mut s = controller(SessionConfig::default());
    for expected in [1, 2, 3, 4, 0, 1] {
        assert_eq!(s.cycle_label(), expected);
    }
    s.trigger(&hit(GRID, 0.0, 0.0, 0.0), false, Instant::now()).unwrap();
    assert_eq!(s.tracker().mask(GRID).unwrap().get(0), Some(1));
    assert!(s.select_label(5).is_err());
}

#[test]
fn streamed_mask_recolors_only_on_completion() {
    let mut s = controller(SessionConfig::default());
    let now = Instant::now();
    s.trigger(&hit(GRID, 0.0, 0.0, 0.0), false, now).unwrap();

    let mut values = vec![-1; 25];
    values[10..15].fill(2);
    values[20] = 4;
    let chunks = common::split(&values, 10);
    assert_eq!(chunks.len(), 3);

    s.handle_text(&chunk_frame(&chunks[2]), now).unwrap();
    s.handle_text(&chunk_frame(&chunks[0]), now).unwrap();
    assert_eq!(
        s.stream_state(),
        AssemblerState::Receiving {
            expected: 3,
            received: 2
        }
    );
    assert_eq!(s.tracker().mask(GRID).unwrap().get(20), Some(4));
    assert_eq!(shown(&s, GRID).colors().unwrap()[20], Rgba::WHITE);

    s.handle_text(&chunk_frame(&chunks[1]), now).unwrap();
    assert_eq!(s.stream_state(), AssemblerState::Idle);
    assert_eq!(s.tracker().mask(GRID).unwrap().as_slice(), &values[..]);
    let colors = shown(&s, GRID).colors().unwrap().to_vec();
    assert_eq!(colors[12], Rgba::BLUE);
    assert_eq!(colors[20], Rgba::CYAN);
    // Background entries keep their painted color.
    assert_eq!(colors[0], Rgba::RED);
}

#[test]
fn stream_stays_on_object_it_started_on() {
    let mut s = controller(SessionConfig::default());
    let now = Instant::now();
    s.trigger(&hit(GRID, 0.0, 0.0, 0.0), false, now).unwrap();

    let mut values = vec![-1; 25];
    values[..10].fill(1);
    values[24] = 0;
    let chunks = common::split(&values, 10);
    s.handle_text(&chunk_frame(&chunks[0]), now).unwrap();
    assert_eq!(s.stream_target(), Some(GRID));

    // The user moves on to another object while the stream is in flight.
    s.trigger(&hit(QUAD, 0.0, 0.0, 0.0), false, now).unwrap();
    assert_eq!(s.tracker().active(), Some(QUAD));
    s.handle_text(&chunk_frame(&chunks[1]), now).unwrap();
    s.handle_text(&chunk_frame(&chunks[2]), now).unwrap();

    assert_eq!(s.stream_state(), AssemblerState::Idle);
    assert_eq!(s.stream_target(), None);
    assert_eq!(s.tracker().mask(GRID).unwrap().as_slice(), &values[..]);
    assert_eq!(s.tracker().mask(QUAD).unwrap().as_slice(), &[0, -1, -1, -1]);
    let grid_colors = shown(&s, GRID).colors().unwrap().to_vec();
    assert_eq!(grid_colors[0], Rgba::GREEN);
    assert_eq!(grid_colors[24], Rgba::RED);
    assert_eq!(shown(&s, QUAD).colors().unwrap()[1], Rgba::WHITE);
}

#[test]
fn stream_target_is_released_on_timeout_and_load() {
    let mut s = controller(SessionConfig::default());
    let t0 = Instant::now();
    s.trigger(&hit(GRID, 0.0, 0.0, 0.0), false, t0).unwrap();
    let chunks = common::split(&[0; 25], 10);

    s.handle_text(&chunk_frame(&chunks[0]), t0).unwrap();
    assert_eq!(s.stream_target(), Some(GRID));
    s.tick(t0 + Duration::from_secs(31)).unwrap();
    assert_eq!(s.stream_target(), None);

    s.handle_text(&chunk_frame(&chunks[0]), t0).unwrap();
    assert_eq!(s.stream_target(), Some(GRID));
    s.handle_text(&load_frame("next"), t0).unwrap();
    assert_eq!(s.stream_target(), None);
    assert_eq!(s.stream_state(), AssemblerState::Idle);
}

#[test]
fn chunks_without_a_labeled_object_are_not_applied() {
    let mut s = controller(SessionConfig::default());
    let chunks = common::split(&[0, 0, 0, 0], 2);
    s.handle_text(&chunk_frame(&chunks[0]), Instant::now()).unwrap();
    assert_eq!(
        s.stream_state(),
        AssemblerState::Receiving {
            expected: 2,
            received: 1
        }
    );
    assert!(s.host().presented.is_empty());
}

#[test]
fn stream_timeout_raises_notice() {
    let mut s = controller(SessionConfig::default());
    let t0 = Instant::now();
    let chunks = common::split(&[0, 0, 0, 0], 2);
    s.handle_text(&chunk_frame(&chunks[0]), t0).unwrap();
    assert!(s.tick(t0 + Duration::from_secs(30)).is_none());
    let timeout = s.tick(t0 + Duration::from_secs(31)).unwrap();
    assert_eq!(timeout.received, 1);
    assert!(s
        .notices()
        .iter()
        .any(|n| n.source == NoticeSource::Stream && n.kind == NoticeKind::Warn));
}

#[test]
fn malformed_frames_are_rejected() {
    let mut s = controller(SessionConfig::default());
    let now = Instant::now();
    assert!(matches!(
        s.handle_text("not json", now),
        Err(SessionError::Proto(_))
    ));
    assert!(matches!(
        s.handle_text(r#"{"type":"teleport"}"#, now),
        Err(SessionError::Proto(_))
    ));
    assert!(s.host().sent.is_empty());
}

#[test]
fn server_error_becomes_notice() {
    let mut s = controller(SessionConfig::default());
    s.handle_text(r#"{"type":"error","message":"model crashed"}"#, Instant::now())
        .unwrap();
    let notice = s.notices().iter().next().unwrap();
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.body.as_deref(), Some("model crashed"));
}

#[test]
fn closed_transport_does_not_undo_paint() {
    let mut s = controller(SessionConfig::default());
    s.host_mut().transport_closed = true;
    let out = s.trigger(&hit(GRID, 0.0, 0.0, 0.0), false, Instant::now()).unwrap();
    assert!(matches!(out, PaintOutcome::Painted { .. }));
    assert_eq!(s.tracker().mask(GRID).unwrap().get(0), Some(0));
    assert!(s.notices().iter().any(|n| n.title == "Server unreachable"));
    assert!(s.request_next_scene(Instant::now()).is_err());
}

#[test]
fn next_scene_is_sent() {
    let mut s = controller(SessionConfig::default());
    s.request_next_scene(Instant::now()).unwrap();
    assert_eq!(s.host().sent, vec![OutboundMessage::NextScene]);
}

#[test]
fn new_selection_resets_when_configured() {
    let mut config = SessionConfig::default();
    config.paint.reset_colors_on_new_selection = true;
    let mut s = controller(config);
    let now = Instant::now();
    s.trigger(&hit(GRID, 0.0, 0.0, 0.0), false, now).unwrap();
    s.trigger(&hit(QUAD, 1.0, 0.0, 1.0), false, now).unwrap();
    assert!(!s.tracker().is_tracked(GRID));
    assert!(shown(&s, GRID).colors().is_none());
    assert_eq!(s.tracker().active(), Some(QUAD));
}

#[test]
fn selections_accumulate_by_default() {
    let mut s = controller(SessionConfig::default());
    let now = Instant::now();
    s.trigger(&hit(GRID, 0.0, 0.0, 0.0), false, now).unwrap();
    s.trigger(&hit(QUAD, 1.0, 0.0, 1.0), false, now).unwrap();
    assert!(s.tracker().is_tracked(GRID));
    assert_eq!(s.tracker().active(), Some(QUAD));
}

fn label_quad(s: &mut SceneSessionController<MockHost>, values: &[i32]) {
    let now = Instant::now();
    s.trigger(&hit(QUAD, 0.0, 0.0, 0.0), false, now).unwrap();
    for chunk in common::split(values, values.len()) {
        s.handle_text(&chunk_frame(&chunk), now).unwrap();
    }
}

#[test]
fn detach_requires_complete_triangles() {
    let mut s = controller(SessionConfig::default());
    label_quad(&mut s, &[0, 0, 0, 1]);

    let report = s.detach(QUAD, Instant::now()).unwrap();
    assert_eq!(report.spawned.len(), 1);
    assert_eq!(report.empty_labels, vec![1]);
    assert_eq!(report.removed_triangles, 1);

    let detached = &s.host().detached[&report.spawned[0]];
    assert_eq!(detached.label, 0);
    assert_eq!(detached.tint, Rgba::RED);
    assert!(detached.grabbable);
    assert_eq!(detached.mesh.vertex_count(), 3);
    assert_eq!(detached.mesh.triangles(), &[[0, 1, 2]]);
    assert_eq!(detached.mesh.uvs().unwrap()[1], [1.0, 0.0]);
    assert!(detached.mesh.normals().is_some());

    let residual = shown(&s, QUAD);
    assert_eq!(residual.vertex_count(), 4);
    assert_eq!(residual.triangles(), &[[1, 2, 3]]);
    assert!(s
        .notices()
        .iter()
        .any(|n| n.title == "No complete triangles found"));
}

#[test]
fn detach_with_nothing_labeled_changes_nothing() {
    let mut s = controller(SessionConfig::default());
    label_quad(&mut s, &[-1, -1, -1, -1]);
    let before = shown(&s, QUAD);
    let report = s.detach(QUAD, Instant::now()).unwrap();
    assert!(report.spawned.is_empty());
    assert_eq!(shown(&s, QUAD), before);
}

#[test]
fn second_detach_does_not_report_detached_labels() {
    let mut s = controller(SessionConfig::default());
    label_quad(&mut s, &[0, 0, 0, 0]);
    let now = Instant::now();
    assert_eq!(s.detach(QUAD, now).unwrap().spawned.len(), 1);

    let again = s.detach(QUAD, now).unwrap();
    assert!(again.spawned.is_empty());
    assert!(again.empty_labels.is_empty());
    assert!(!s
        .notices()
        .iter()
        .any(|n| n.title == "No complete triangles found"));
    assert_eq!(s.detached().len(), 1);
}

#[test]
fn detach_unlabeled_object_is_refused() {
    let mut s = controller(SessionConfig::default());
    let err = s.detach(GRID, Instant::now()).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Extract(ExtractError::NotLabeled(_))
    ));
}

#[test]
fn load_scene_clears_detached_and_restores_meshes() {
    let mut s = controller(SessionConfig::default());
    label_quad(&mut s, &[0, 0, 0, 0]);
    let report = s.detach(QUAD, Instant::now()).unwrap();
    assert_eq!(report.removed_triangles, 2);
    assert_eq!(s.detached().len(), 1);

    s.handle_text(&load_frame("next"), Instant::now()).unwrap();
    assert!(s.detached().is_empty());
    assert_eq!(s.host().destroyed, report.spawned);
    assert!(s.host().detached.is_empty());
    assert!(!s.tracker().is_tracked(QUAD));
    assert_eq!(shown(&s, QUAD), common::quad());
}

#[test]
fn restore_returns_original_mesh() {
    let mut s = controller(SessionConfig::default());
    s.trigger(&hit(GRID, 0.0, 0.0, 0.0), false, Instant::now()).unwrap();
    assert!(s.restore(GRID));
    assert_eq!(shown(&s, GRID), common::grid(5));
    assert!(!s.restore(GRID));
}
