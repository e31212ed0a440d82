//! History collaborators
//!
//! The engine talks to history through two narrow traits:
//! - [`HistorySink`] receives `pushState`/`replaceState`-style writes
//! - [`LocationSource`] reports the current location
//!
//! Two implementations ship with the crate:
//! - [`MemoryHistory`] - an in-memory stack with back/forward traversal and a size limit
//! - [`NoopHistory`] - a fixed location that ignores writes, for headless use

use crate::location::Location;
use crate::{trace_log, NavigationDirection};
use std::collections::HashMap;

/// Receives history writes
///
/// Implementations must accept writes at any time, including when nothing is listening.
pub trait HistorySink {
    /// Add a new entry after the current one, discarding forward entries
    fn push_state(&mut self, meta: &HistoryState, title: &str, url: &str);

    /// Overwrite the current entry
    fn replace_state(&mut self, meta: &HistoryState, title: &str, url: &str);
}

/// Reports the current location
pub trait LocationSource {
    /// Snapshot of the current location
    fn location(&self) -> Location;
}

/// Opaque metadata passed along with a history write
///
/// The engine always writes an empty value; other writers may attach restoration hints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryState {
    /// Entries, keyed by name
    pub data: HashMap<String, String>,
}

impl HistoryState {
    /// Empty metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `value` under `key`
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), value.into());
    }

    /// Look up `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Check if no data is attached
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One slot of a [`MemoryHistory`]
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Location of this entry
    pub location: Location,
    /// Title passed with the write
    pub title: String,
    /// Metadata from the write, if any was attached
    pub state: Option<HistoryState>,
}

impl HistoryEntry {
    /// Entry for `location` with no title or metadata
    pub fn new(location: Location) -> Self {
        Self {
            location,
            title: String::new(),
            state: None,
        }
    }

    fn written(meta: &HistoryState, title: &str, url: &str) -> Self {
        Self {
            location: Location::from_url(url),
            title: title.to_string(),
            state: (!meta.is_empty()).then(|| meta.clone()),
        }
    }
}

/// Event produced by traversing a [`MemoryHistory`]
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEvent {
    /// Location before the traversal
    pub from: Location,
    /// Location after the traversal
    pub to: Location,
    /// Always [`NavigationDirection::Pop`] for back/forward
    pub direction: NavigationDirection,
}

/// In-memory navigation history stack
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<HistoryEntry>,
    /// Cursor into `entries`
    current: usize,
    /// Oldest entries are evicted past this many; 0 keeps everything
    max_size: usize,
}

impl MemoryHistory {
    const DEFAULT_MAX_SIZE: usize = 1000;

    /// Create a new history starting at `initial_url`
    pub fn new(initial_url: &str) -> Self {
        Self::with_max_size(initial_url, Self::DEFAULT_MAX_SIZE)
    }

    /// Create starting at `initial_url`, keeping at most `max_size` entries
    pub fn with_max_size(initial_url: &str, max_size: usize) -> Self {
        Self {
            entries: vec![HistoryEntry::new(Location::from_url(initial_url))],
            current: 0,
            max_size,
        }
    }

    /// Entry under the cursor
    pub fn current_entry(&self) -> &HistoryEntry {
        &self.entries[self.current]
    }

    /// Path and search of the entry under the cursor
    pub fn current_path(&self) -> String {
        self.current_entry().location.to_path()
    }

    /// Step the cursor one entry back
    ///
    /// Like a browser, this only moves the cursor. Tell the engine with
    /// [`SyncEngine::pop_state`](crate::SyncEngine::pop_state).
    pub fn back(&mut self) -> Option<HistoryEvent> {
        if !self.can_go_back() {
            return None;
        }
        let from = self.current_entry().location.clone();
        self.current -= 1;
        Some(self.traversed(from))
    }

    /// Step the cursor one entry forward
    pub fn forward(&mut self) -> Option<HistoryEvent> {
        if !self.can_go_forward() {
            return None;
        }
        let from = self.current_entry().location.clone();
        self.current += 1;
        Some(self.traversed(from))
    }

    fn traversed(&self, from: Location) -> HistoryEvent {
        HistoryEvent {
            from,
            to: self.current_entry().location.clone(),
            direction: NavigationDirection::Pop,
        }
    }

    /// Whether an older entry exists
    pub fn can_go_back(&self) -> bool {
        self.current > 0
    }

    /// Whether a newer entry exists
    pub fn can_go_forward(&self) -> bool {
        self.current + 1 < self.entries.len()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if history is empty (never true, kept for API symmetry with `len`)
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, oldest first
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Cursor position
    pub fn current_index(&self) -> usize {
        self.current
    }

    fn evict_oldest(&mut self) {
        if self.max_size == 0 {
            return;
        }
        let overflow = self.entries.len().saturating_sub(self.max_size);
        if overflow > 0 {
            self.entries.drain(..overflow);
            self.current = self.current.saturating_sub(overflow);
        }
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl HistorySink for MemoryHistory {
    fn push_state(&mut self, meta: &HistoryState, title: &str, url: &str) {
        trace_log!("memory history push '{}'", url);

        // forward entries are unreachable after a push
        self.entries.truncate(self.current + 1);
        self.entries.push(HistoryEntry::written(meta, title, url));
        self.current = self.entries.len() - 1;
        self.evict_oldest();
    }

    fn replace_state(&mut self, meta: &HistoryState, title: &str, url: &str) {
        trace_log!("memory history replace '{}'", url);
        self.entries[self.current] = HistoryEntry::written(meta, title, url);
    }
}

impl LocationSource for MemoryHistory {
    fn location(&self) -> Location {
        self.current_entry().location.clone()
    }
}

/// A history that never changes
///
/// Writes are accepted and dropped; the location stays whatever it was created with (or last
/// set to with [`NoopHistory::set_location`]).
#[derive(Debug, Clone, Default)]
pub struct NoopHistory {
    location: Location,
}

impl NoopHistory {
    /// Create with a fixed location
    pub fn new(url: &str) -> Self {
        Self {
            location: Location::from_url(url),
        }
    }

    /// Move the reported location, e.g. to simulate an external navigation
    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }
}

impl HistorySink for NoopHistory {
    fn push_state(&mut self, _meta: &HistoryState, _title: &str, url: &str) {
        trace_log!("noop history dropped push '{}'", url);
    }

    fn replace_state(&mut self, _meta: &HistoryState, _title: &str, url: &str) {
        trace_log!("noop history dropped replace '{}'", url);
    }
}

impl LocationSource for NoopHistory {
    fn location(&self) -> Location {
        self.location.clone()
    }
}
