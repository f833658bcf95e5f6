//! Display positions of concurrently active meters.
//!
//! Nested loops each get a slot: the outermost meter holds position `0`,
//! an inner one `1`, and so on. A slot is released when its meter closes and
//! is reused by the next meter created.

use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

static GLOBAL: OnceLock<Arc<PositionRegistry>> = OnceLock::new();

/// Allocator of display positions.
#[derive(Debug, Default)]
pub struct PositionRegistry {
    taken: Mutex<BTreeSet<usize>>,
}

impl PositionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by meters that were not given one.
    pub fn global() -> Arc<PositionRegistry> {
        GLOBAL.get_or_init(|| Arc::new(PositionRegistry::new())).clone()
    }

    /// Takes the lowest free position.
    pub fn acquire(&self) -> usize {
        let mut taken = self.taken.lock();
        let pos = (0..).find(|p| !taken.contains(p)).unwrap_or(taken.len());
        taken.insert(pos);
        pos
    }

    /// Marks `pos` as taken. Returns `false` if it already was.
    pub fn claim(&self, pos: usize) -> bool {
        self.taken.lock().insert(pos)
    }

    /// Frees `pos`.
    pub fn release(&self, pos: usize) {
        self.taken.lock().remove(&pos);
    }

    /// Number of positions in use.
    pub fn active(&self) -> usize {
        self.taken.lock().len()
    }
}
