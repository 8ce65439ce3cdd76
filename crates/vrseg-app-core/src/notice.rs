// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Diagnostics shown to the headset user.
//!
//! Notices are keyed on their source and title: raising the same notice while
//! it is still live refreshes it and counts the repeat instead of stacking a
//! copy. A timeout or send-failure storm therefore occupies one slot.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Notice severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeKind {
    /// Informational note.
    Info,
    /// Something the user may want to act on.
    Warn,
    /// An operation failed.
    Error,
}

/// Subsystem that raised a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSource {
    /// Relayed from, or about reaching, the segmentation server.
    Server,
    /// Mask chunk streaming.
    Stream,
    /// Submesh detachment.
    Detach,
    /// Scene loading.
    Scene,
}

/// One live notice.
#[derive(Debug, Clone)]
pub struct Notice {
    /// Severity of the most recent raise.
    pub kind: NoticeKind,
    /// Origin.
    pub source: NoticeSource,
    /// Short title line.
    pub title: String,
    /// Detail from the most recent raise.
    pub body: Option<String>,
    /// Times this notice was raised again while live.
    pub repeats: u32,
    /// Last time it was raised.
    pub raised: Instant,
    /// When it stops being shown.
    pub expires: Instant,
}

impl Notice {
    /// Whether the notice is still shown at `now`.
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires
    }
}

/// Bounded set of live notices.
///
/// When full, the oldest non-error notice is evicted first so errors outlast
/// warnings.
#[derive(Debug)]
pub struct NoticeService {
    queue: VecDeque<Notice>,
    max: usize,
}

impl NoticeService {
    /// Creates a service holding at most `max` notices.
    pub fn new(max: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max: max.max(1),
        }
    }

    /// Raises a notice. Returns `false` when it refreshed a live notice with
    /// the same source and title.
    pub fn push(
        &mut self,
        kind: NoticeKind,
        source: NoticeSource,
        title: impl Into<String>,
        body: Option<String>,
        ttl: Duration,
        now: Instant,
    ) -> bool {
        let title = title.into();
        if let Some(live) = self
            .queue
            .iter_mut()
            .find(|n| n.source == source && n.title == title && n.is_live(now))
        {
            live.kind = kind;
            live.body = body;
            live.repeats = live.repeats.saturating_add(1);
            live.raised = now;
            live.expires = now + ttl;
            return false;
        }

        if self.queue.len() >= self.max {
            let victim = self
                .queue
                .iter()
                .position(|n| n.kind < NoticeKind::Error)
                .unwrap_or(0);
            self.queue.remove(victim);
        }
        self.queue.push_back(Notice {
            kind,
            source,
            title,
            body,
            repeats: 0,
            raised: now,
            expires: now + ttl,
        });
        true
    }

    /// Drops notices that are no longer live. Returns how many were dropped.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.queue.len();
        self.queue.retain(|n| n.is_live(now));
        before - self.queue.len()
    }

    /// Number of held notices.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no notice is held.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Held notices, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.queue.iter()
    }

    /// Most severe live notice; the newest wins among equals.
    pub fn headline(&self, now: Instant) -> Option<&Notice> {
        self.queue
            .iter()
            .filter(|n| n.is_live(now))
            .max_by_key(|n| n.kind)
    }
}
