// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Replays a segmentation session transcript without a headset.
//!
//! Server frames and user actions are read from a JSON-lines file and fed to
//! the session controller against procedural grid meshes. Messages the client
//! would send are written to stdout, one JSON object per line, followed by a
//! summary line.

mod host;
mod script;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vrseg_config_fs::FsConfigStore;
use vrseg_core::{
    ObjectId, RayHit, SceneSessionController, SessionConfig, SessionConfigStore, SessionError,
};
use vrseg_mesh::{Mat4, Vec3};

use crate::host::ReplayHost;
use crate::script::{parse_step, Action, Step};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a segmentation session transcript headlessly")]
struct Args {
    /// JSON-lines transcript of server frames and user actions
    transcript: PathBuf,
    /// Vertices per side of the procedural grid used for every scene object
    #[arg(long, default_value_t = 16)]
    grid: u32,
    /// Config directory (defaults to the platform config dir)
    #[arg(long)]
    config_dir: Option<PathBuf>,
    /// Stop at the first line the session rejects
    #[arg(long)]
    strict: bool,
}

fn load_config(dir: Option<&PathBuf>) -> Result<SessionConfig> {
    let store = match dir {
        Some(dir) => FsConfigStore::at(dir),
        None => FsConfigStore::user(),
    }
    .context("opening config store")?;
    let dir = store.dir().to_path_buf();
    let (config, origin) = SessionConfigStore::new(store)
        .load_or_init()
        .context("loading session config")?;
    info!(dir = %dir.display(), ?origin, "session config ready");
    Ok(config)
}

fn run_action<W: Write>(
    session: &mut SceneSessionController<ReplayHost<W>>,
    action: Action,
    now: Instant,
) -> Result<(), SessionError> {
    match action {
        Action::Paint {
            object,
            point,
            background,
        } => {
            let hit = RayHit {
                object: ObjectId(object),
                point: Vec3::from(point),
                local_to_world: Mat4::identity(),
            };
            let outcome = session.trigger(&hit, background, now)?;
            info!(?outcome, "paint");
        }
        Action::CycleLabel => {
            session.cycle_label();
        }
        Action::SelectLabel { index } => session.select_label(index)?,
        Action::Detach { object } => {
            let report = session.detach(ObjectId(object), now)?;
            info!(
                spawned = report.spawned.len(),
                removed = report.removed_triangles,
                "detach"
            );
        }
        Action::ClearDetached => {
            session.clear_detached();
        }
        Action::Restore { object } => {
            session.restore(ObjectId(object));
        }
        Action::NextScene => session.request_next_scene(now)?,
        Action::Wait { .. } => {}
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = load_config(args.config_dir.as_ref())?;
    let file = File::open(&args.transcript)
        .with_context(|| format!("opening {}", args.transcript.display()))?;

    let host = ReplayHost::new(io::stdout().lock(), args.grid);
    let mut session = SceneSessionController::new(host, config);
    let start = Instant::now();
    let mut elapsed = Duration::ZERO;
    let mut rejected = 0usize;

    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line.context("reading transcript")?;
        let lineno = n + 1;
        let step = match parse_step(&line) {
            Ok(Some(step)) => step,
            Ok(None) => continue,
            Err(err) if !args.strict => {
                warn!(line = lineno, error = %err, "skipping line");
                rejected += 1;
                continue;
            }
            Err(err) => return Err(err.context(format!("line {lineno}"))),
        };
        if let Step::Local(Action::Wait { secs }) = &step {
            elapsed += Duration::try_from_secs_f32(*secs).unwrap_or_default();
        }
        let now = start + elapsed;
        let result = match step {
            Step::Server(text) => session.handle_text(&text, now),
            Step::Local(action) => run_action(&mut session, action, now),
        };
        if let Err(err) = result {
            if args.strict {
                bail!("line {lineno}: {err}");
            }
            warn!(line = lineno, error = %err, "session rejected line");
            rejected += 1;
        }
        session.tick(now);
    }

    let objects: Vec<_> = session
        .host()
        .objects()
        .map(|id| {
            let labeled = session
                .tracker()
                .mask(id)
                .map_or(0, |m| m.labeled_count());
            json!({ "object": id.0, "labeled_vertices": labeled })
        })
        .collect();
    let summary = json!({
        "summary": {
            "scene": session.scene().map(|s| s.scene_name.clone()),
            "objects": objects,
            "detached": session.host().detached_count(),
            "presents": session.host().presents(),
            "notices": session.notices().len(),
            "headline": session
                .notices()
                .headline(start + elapsed)
                .map(|n| n.title.clone()),
            "rejected_lines": rejected,
        }
    });
    let out = session.host_mut().out_mut();
    writeln!(out, "{summary}")?;
    out.flush()?;
    Ok(())
}
