// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reassembly of a label mask streamed as independently applicable chunks.
//!
//! Chunks may arrive in any order and may be duplicated. Every accepted chunk
//! yields a [`MaskUpdate`] immediately; the assembler only tracks which
//! indices of the current stream have been seen so it can report completion
//! once and abandon streams that go quiet. It owns no clock: callers pass
//! `now` in.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use vrseg_proto::{MaskChunk, ProtoError};

use crate::mask::VertexLabelMask;

/// Decoded chunk contents, ready to write into a mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskUpdate {
    /// Index of the chunk this came from.
    pub chunk_index: u32,
    /// First vertex index covered.
    pub start_index: usize,
    /// One past the last vertex index covered.
    pub end_index: usize,
    /// Mask values (already shifted from wire encoding).
    pub values: Vec<i32>,
}

impl MaskUpdate {
    /// Writes this update into `mask`, clamped to the mask and payload.
    pub fn apply_to(&self, mask: &mut VertexLabelMask) -> usize {
        mask.apply_range(self.start_index, self.end_index, &self.values)
    }
}

/// What the assembler did with one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutcome {
    /// Data to apply to the target mask.
    pub update: MaskUpdate,
    /// This chunk opened a new stream.
    pub started: bool,
    /// This chunk index had already been seen in the current stream.
    pub duplicate: bool,
    /// This chunk completed the stream; the assembler is idle again.
    pub completed: bool,
}

/// Reported when a stream is abandoned for inactivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamTimeout {
    /// Chunks the stream announced.
    pub expected: u32,
    /// Distinct chunks received before giving up.
    pub received: usize,
    /// Time since the last chunk.
    pub idle_for: Duration,
}

/// Observable assembler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    /// No stream in flight.
    Idle,
    /// A stream is in flight.
    Receiving {
        /// Chunks announced by the stream.
        expected: u32,
        /// Distinct chunk indices received so far.
        received: usize,
    },
}

#[derive(Debug)]
struct ActiveStream {
    expected: u32,
    received: BTreeSet<u32>,
    last_activity: Instant,
}

/// Tracks one mask stream at a time.
#[derive(Debug)]
pub struct MaskChunkAssembler {
    timeout: Duration,
    stream: Option<ActiveStream>,
}

impl MaskChunkAssembler {
    /// Creates an idle assembler that abandons streams after `timeout` of silence.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            stream: None,
        }
    }

    /// Inactivity limit.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Current state.
    pub fn state(&self) -> AssemblerState {
        match &self.stream {
            None => AssemblerState::Idle,
            Some(s) => AssemblerState::Receiving {
                expected: s.expected,
                received: s.received.len(),
            },
        }
    }

    /// Whether a stream is in flight.
    pub fn is_receiving(&self) -> bool {
        self.stream.is_some()
    }

    /// Drops any in-flight stream without reporting it.
    pub fn reset(&mut self) {
        if let Some(s) = self.stream.take() {
            debug!(expected = s.expected, received = s.received.len(), "mask stream discarded");
        }
    }

    /// Accepts one chunk.
    ///
    /// Chunk 0 starts a new stream unless the current stream has not seen
    /// chunk 0 yet and announces the same total, in which case it joins. Any
    /// other chunk joins the current stream, or opens one if idle. Only
    /// indices below the stream's total count toward completion. Chunks with
    /// an impossible header or an undecodable payload are rejected and leave
    /// the state untouched.
    pub fn accept(&mut self, chunk: &MaskChunk, now: Instant) -> Result<ChunkOutcome, ProtoError> {
        chunk.check_header()?;
        let values = chunk.mask_values()?;

        let joins = self.stream.as_ref().is_some_and(|s| {
            chunk.chunk_index != 0
                || (!s.received.contains(&0) && s.expected == chunk.total_chunks)
        });
        if !joins {
            if let Some(old) = self.stream.take() {
                warn!(
                    expected = old.expected,
                    received = old.received.len(),
                    "mask stream superseded by a new stream"
                );
            }
            info!(total_chunks = chunk.total_chunks, "mask stream started");
        }
        let stream = self.stream.get_or_insert_with(|| ActiveStream {
            expected: chunk.total_chunks,
            received: BTreeSet::new(),
            last_activity: now,
        });
        if chunk.total_chunks != stream.expected {
            debug!(
                expected = stream.expected,
                announced = chunk.total_chunks,
                "chunk disagrees with stream total; keeping first total"
            );
        }

        // A joined chunk may announce a larger total than the stream; its
        // range is still applied but it cannot count toward completion.
        let counted = chunk.chunk_index < stream.expected;
        if !counted {
            debug!(
                chunk = chunk.chunk_index,
                expected = stream.expected,
                "chunk index outside stream; not counted"
            );
        }
        let duplicate = counted && !stream.received.insert(chunk.chunk_index);
        stream.last_activity = now;
        let received = stream.received.len();
        let expected = stream.expected;
        debug!(
            chunk = chunk.chunk_index,
            start = chunk.start_index,
            end = chunk.end_index,
            received,
            expected,
            duplicate,
            "mask chunk accepted"
        );

        let completed = counted && !duplicate && received >= expected as usize;
        if completed {
            info!(total_chunks = expected, "mask stream complete");
            self.stream = None;
        }

        Ok(ChunkOutcome {
            update: MaskUpdate {
                chunk_index: chunk.chunk_index,
                start_index: chunk.start_index as usize,
                end_index: chunk.end_index as usize,
                values,
            },
            started: !joins,
            duplicate,
            completed,
        })
    }

    /// Abandons the current stream if it has been silent for longer than the timeout.
    ///
    /// Data already applied from the abandoned stream is not rolled back.
    pub fn tick(&mut self, now: Instant) -> Option<StreamTimeout> {
        let stream = self.stream.as_ref()?;
        let idle_for = now.saturating_duration_since(stream.last_activity);
        if idle_for <= self.timeout {
            return None;
        }
        let timed_out = StreamTimeout {
            expected: stream.expected,
            received: stream.received.len(),
            idle_for,
        };
        warn!(
            expected = timed_out.expected,
            received = timed_out.received,
            idle_secs = idle_for.as_secs_f32(),
            "mask stream timed out"
        );
        self.stream = None;
        Some(timed_out)
    }
}
