//! In-memory suspicious-activity telemetry.
//!
//! A bounded FIFO ring buffer of fraud-signal events. Append beyond
//! capacity evicts the oldest entry. The buffer is process-local and
//! volatile: it resets on restart, which is a documented property of this
//! design, not an oversight — entries are advisory audit material, never
//! a source of truth for moderation decisions.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;
use uuid::Uuid;

use patron_core::constants::ACTIVITY_LOG_CAPACITY;
use patron_core::types::SignalKind;

/// One recorded fraud-signal event.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ActivityEntry {
    /// The actor the signal was observed for.
    pub user_id: Uuid,
    /// Which signal fired.
    pub kind: SignalKind,
    /// Free-form context captured with the event.
    pub metadata: serde_json::Value,
    /// When the event was recorded.
    pub at: DateTime<Utc>,
}

/// Bounded FIFO buffer of suspicious-activity entries.
///
/// Thread-safe; the engine shares one instance between the fraud policy
/// (writer) and operator queries (readers).
pub struct ActivityLog {
    entries: Mutex<VecDeque<ActivityEntry>>,
    capacity: usize,
}

impl ActivityLog {
    /// Create a log with the default capacity of 1000 entries.
    pub fn new() -> Self {
        Self::with_capacity(ACTIVITY_LOG_CAPACITY)
    }

    /// Create a log holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest when full. Returns the entry
    /// as recorded.
    pub fn record(
        &self,
        user_id: Uuid,
        kind: SignalKind,
        metadata: serde_json::Value,
    ) -> ActivityEntry {
        let entry = ActivityEntry {
            user_id,
            kind,
            metadata,
            at: Utc::now(),
        };

        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry.clone());
        debug!(%user_id, signal = %kind, held = entries.len(), "activity: event recorded");

        entry
    }

    /// Most-recent-first entries, optionally filtered by signal kind,
    /// capped at `limit`.
    pub fn query(&self, kind: Option<SignalKind>, limit: usize) -> Vec<ActivityEntry> {
        let entries = self.entries.lock();
        entries
            .iter()
            .rev()
            .filter(|e| kind.is_none_or(|k| e.kind == k))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Number of entries currently held for an actor.
    pub fn count_for(&self, user_id: Uuid) -> usize {
        self.entries.lock().iter().filter(|e| e.user_id == user_id).count()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Empty the buffer and return how many entries were removed.
    /// Operator-only and irreversible.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let removed = entries.len();
        entries.clear();
        debug!(removed, "activity: log cleared");
        removed
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}
