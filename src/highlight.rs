use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::data::datatable::RowId;

/// Side channel tracking recently edited cells so the renderer can
/// flash them briefly. Not part of the data model: core operations
/// stay pure and this set never influences filtering, sorting, or
/// export.
#[derive(Debug, Clone)]
pub struct RecentEdits {
    entries: HashMap<(RowId, usize), Instant>,
    ttl: Duration,
}

impl RecentEdits {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            entries: HashMap::new(),
            ttl: Duration::from_millis(ttl_ms),
        }
    }

    pub fn mark(&mut self, row_id: RowId, column: usize) {
        self.entries.insert((row_id, column), Instant::now());
    }

    pub fn mark_all<I: IntoIterator<Item = (RowId, usize)>>(&mut self, cells: I) {
        let now = Instant::now();
        for cell in cells {
            self.entries.insert(cell, now);
        }
    }

    pub fn is_recent(&self, row_id: RowId, column: usize) -> bool {
        self.entries
            .get(&(row_id, column))
            .map(|t| t.elapsed() < self.ttl)
            .unwrap_or(false)
    }

    /// Drop expired entries. Called from the engine's `tick()`.
    pub fn sweep(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, t| t.elapsed() < ttl);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
