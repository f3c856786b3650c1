//! Deferred voice teardown.
//!
//! A fading voice keeps its nodes until the fade has run its course. Instead
//! of timers, the registry records one [`PendingRelease`] per fading voice in
//! a [`ReleaseQueue`] ordered by due time, and completes whatever is due on
//! each reconciliation pass.

use std::collections::VecDeque;
use std::time::Duration;

use herakoi_core::VoiceId;

/// A voice waiting for its fade to finish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingRelease {
    /// Voice to release.
    pub id: VoiceId,
    /// Clock time at which the release may run.
    pub due: Duration,
}

/// Pending releases ordered by due time.
///
/// Entries with equal due times keep insertion order.
#[derive(Clone, Debug, Default)]
pub struct ReleaseQueue {
    pending: VecDeque<PendingRelease>,
}

impl ReleaseQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `id` for release at `due`.
    pub fn push(&mut self, id: VoiceId, due: Duration) {
        let at = self.pending.partition_point(|p| p.due <= due);
        self.pending.insert(at, PendingRelease { id, due });
    }

    /// Pop the earliest entry if it is due at `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<PendingRelease> {
        if self.pending.front().is_some_and(|p| p.due <= now) {
            self.pending.pop_front()
        } else {
            None
        }
    }

    /// Remove and return every entry regardless of due time.
    pub fn drain(&mut self) -> Vec<PendingRelease> {
        self.pending.drain(..).collect()
    }

    /// Number of pending releases.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Whether `id` has a pending release.
    pub fn contains(&self, id: &VoiceId) -> bool {
        self.pending.iter().any(|p| &p.id == id)
    }

    /// Due time of `id`'s pending release.
    pub fn due_at(&self, id: &VoiceId) -> Option<Duration> {
        self.pending.iter().find(|p| &p.id == id).map(|p| p.due)
    }

    /// Due time of the earliest entry.
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.front().map(|p| p.due)
    }

    /// Pending releases in due order.
    pub fn iter(&self) -> impl Iterator<Item = &PendingRelease> {
        self.pending.iter()
    }
}
