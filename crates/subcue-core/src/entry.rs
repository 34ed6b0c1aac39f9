//! Subtitle entries and the stores that hold them.
//!
//! An [`EntryStore`] is an ordered, randomly indexable collection of
//! time-bounded entries plus an auxiliary lookup of overlay entries keyed
//! by the id of the primary entry they accompany.
//!
//! Stores are expected to be sorted ascending by `begin_ms` with no two
//! entries overlapping. Nothing here enforces that; the director's search
//! routines simply assume it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Milliseconds on the playback timeline.
///
/// Signed so intermediate results of a backward seek can be clamped
/// instead of wrapping.
pub type Millis = i64;

/// One subtitle cue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: u32,
    pub begin_ms: Millis,
    pub end_ms: Millis,
    pub body: String,
}

impl Entry {
    pub fn new(id: u32, begin_ms: Millis, end_ms: Millis, body: impl Into<String>) -> Self {
        Self {
            id,
            begin_ms,
            end_ms,
            body: body.into(),
        }
    }

    /// Inclusive on both bounds.
    pub fn contains(&self, instant: Millis) -> bool {
        instant >= self.begin_ms && instant <= self.end_ms
    }

    pub fn duration_ms(&self) -> Millis {
        self.end_ms.saturating_sub(self.begin_ms).max(0)
    }
}

/// Read-only access to a session's entries.
pub trait EntryStore {
    /// Entry at ordinal position `index`, or `None` when out of range.
    fn get(&self, index: usize) -> Option<&Entry>;

    fn count(&self) -> usize;

    /// Overlay entry registered against the primary entry `id`.
    fn related_overlay(&self, id: u32) -> Option<&Entry>;

    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    fn first(&self) -> Option<&Entry> {
        self.get(0)
    }

    fn last(&self) -> Option<&Entry> {
        self.count().checked_sub(1).and_then(|i| self.get(i))
    }

    /// `(first begin, last end)`, or `(0, 0)` for an empty store.
    fn total_span(&self) -> (Millis, Millis) {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => (first.begin_ms, last.end_ms),
            _ => (0, 0),
        }
    }
}

/// Vec-backed store with an overlay map, as produced by [`crate::srt::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtitles {
    entries: Vec<Entry>,
    #[serde(default)]
    overlays: HashMap<u32, Entry>,
}

impl Subtitles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            overlays: HashMap::new(),
        }
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Register `overlay` against the primary entry `primary_id`.
    /// A later overlay for the same id replaces the earlier one.
    pub fn attach_overlay(&mut self, primary_id: u32, overlay: Entry) {
        self.overlays.insert(primary_id, overlay);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }
}

impl EntryStore for Subtitles {
    fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    fn count(&self) -> usize {
        self.entries.len()
    }

    fn related_overlay(&self, id: u32) -> Option<&Entry> {
        self.overlays.get(&id)
    }
}

impl EntryStore for Vec<Entry> {
    fn get(&self, index: usize) -> Option<&Entry> {
        self.as_slice().get(index)
    }

    fn count(&self) -> usize {
        self.len()
    }

    fn related_overlay(&self, _id: u32) -> Option<&Entry> {
        None
    }
}
